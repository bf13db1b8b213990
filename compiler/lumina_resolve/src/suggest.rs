//! Levenshtein-distance name suggestions for `UNKNOWN_IDENTIFIER`/
//! `UNKNOWN_TYPE` diagnostics (§4.3: "a Levenshtein ≤ 2 suggestion from the
//! visible symbol set").

/// Returns the closest name in `candidates` to `target` if its edit
/// distance is at most 2, else `None`.
pub fn suggest<'a>(target: &str, candidates: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .map(|c| (c, levenshtein(target, c)))
        .filter(|(_, d)| *d <= 2)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_close_match() {
        let candidates = ["double", "dooble", "triple"];
        assert_eq!(suggest("duoble", candidates.into_iter()), Some("dooble"));
    }

    #[test]
    fn no_match_beyond_distance_two() {
        let candidates = ["triple"];
        assert_eq!(suggest("x", candidates.into_iter()), None);
    }
}
