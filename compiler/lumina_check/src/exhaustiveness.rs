//! Pattern exhaustiveness (§4.5 "Pattern exhaustiveness", property #4).
//!
//! "A `MatchStmt`/`MatchExpr` on an enum must cover every variant or
//! include a wildcard; missing variants are listed in related info."
//! Checking is deliberately order-preserving: callers pass patterns in
//! source order and this module never reorders them, per the design note
//! in `spec.md` §9 ("pattern checking must be stable in source order").

use lumina_diagnostic::{match_not_exhaustive, Diagnostic};
use lumina_ir::ast::Pattern;
use lumina_ir::{Location, Symbol};
use lumina_resolve::SymbolTable;
use rustc_hash::FxHashSet;

/// Returns a `MATCH_NOT_EXHAUSTIVE` diagnostic if `patterns` (matched
/// against `enum_name`) neither contains a wildcard nor covers every
/// declared variant.
pub fn check_match_exhaustiveness(
    table: &SymbolTable,
    enum_name: Symbol,
    patterns: &[Pattern],
    location: Location,
) -> Option<Diagnostic> {
    if patterns.iter().any(Pattern::is_wildcard) {
        return None;
    }
    let info = table.get(enum_name)?;
    if info.variants.is_empty() {
        return None;
    }
    let covered: FxHashSet<Symbol> = patterns
        .iter()
        .filter_map(|p| match p {
            Pattern::Variant { variant, .. } => Some(*variant),
            Pattern::Wildcard { .. } => None,
        })
        .collect();
    let missing: Vec<String> = info
        .variants
        .iter()
        .filter(|v| !covered.contains(&v.name))
        .map(|v| v.name.to_string())
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(match_not_exhaustive(location, &missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;
    use lumina_resolve::hoist_declarations;

    fn table_for(src: &str) -> SymbolTable {
        let program = parse(src).unwrap();
        hoist_declarations("test.lm", &program.items).0
    }

    #[test]
    fn flags_missing_variant() {
        let table = table_for("enum Color { Red, Green, Blue }");
        let patterns = vec![
            Pattern::Variant { enum_name: None, variant: "Red".into(), bindings: vec![], location: Location::DUMMY },
            Pattern::Variant { enum_name: None, variant: "Green".into(), bindings: vec![], location: Location::DUMMY },
        ];
        let diag = check_match_exhaustiveness(&table, Symbol::intern("Color"), &patterns, Location::DUMMY).unwrap();
        assert!(diag.related_information[0].message.contains("Blue"));
    }

    #[test]
    fn wildcard_satisfies_exhaustiveness() {
        let table = table_for("enum Color { Red, Green, Blue }");
        let patterns = vec![
            Pattern::Variant { enum_name: None, variant: "Red".into(), bindings: vec![], location: Location::DUMMY },
            Pattern::Wildcard { location: Location::DUMMY },
        ];
        assert!(check_match_exhaustiveness(&table, Symbol::intern("Color"), &patterns, Location::DUMMY).is_none());
    }

    #[test]
    fn full_coverage_needs_no_wildcard() {
        let table = table_for("enum Color { Red, Green }");
        let patterns = vec![
            Pattern::Variant { enum_name: None, variant: "Red".into(), bindings: vec![], location: Location::DUMMY },
            Pattern::Variant { enum_name: None, variant: "Green".into(), bindings: vec![], location: Location::DUMMY },
        ];
        assert!(check_match_exhaustiveness(&table, Symbol::intern("Color"), &patterns, Location::DUMMY).is_none());
    }
}
