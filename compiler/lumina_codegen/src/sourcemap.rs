//! Source-map-v3 builder (§4.9).
//!
//! The encoder here is the mirror image of the Base64 VLQ *decoder* used
//! elsewhere in this pack for reading source maps back in: each segment's
//! fields are zig-zag-signed then packed 5 bits at a time into the same
//! alphabet, continuation bit set on every byte but the last.

use serde::Serialize;

const VLQ_BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq_value(value: i32, out: &mut String) {
    let mut value = if value < 0 { ((-value) << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = value & 0x1F;
        value >>= 5;
        if value > 0 {
            digit |= 0x20;
        }
        out.push(VLQ_BASE64_CHARS[digit as usize] as char);
        if value == 0 {
            break;
        }
    }
}

/// One `(generated position) -> (original position)` correspondence,
/// recorded at zero-based line/column as the emitter writes each token.
#[derive(Copy, Clone, Debug)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    pub source_line: u32,
    pub source_column: u32,
}

#[derive(Serialize)]
struct RawSourceMap {
    version: u32,
    sources: Vec<String>,
    names: Vec<String>,
    mappings: String,
    file: String,
}

/// Accumulates mappings in emission order and serializes them to the
/// standard source-map-v3 JSON object (§4.9: "the builder accumulates
/// `(generated line,col) -> (source line,col)` mappings and serializes a
/// standard source-map-v3 object").
#[derive(Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        SourceMapBuilder::default()
    }

    pub fn push(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    /// Serializes to the source-map-v3 JSON text. `source_name` and
    /// `output_name` become the map's single `sources` entry and `file`
    /// field respectively, since every Lumina module compiles to exactly
    /// one JS file.
    pub fn build(&self, source_name: &str, output_name: &str) -> String {
        let mut mappings = String::new();
        let mut prev_generated_line = 0u32;
        let mut prev_generated_column = 0i64;
        let mut prev_source_line = 0i64;
        let mut prev_source_column = 0i64;

        for mapping in &self.mappings {
            while prev_generated_line < mapping.generated_line {
                mappings.push(';');
                prev_generated_line += 1;
                prev_generated_column = 0;
            }
            if !mappings.is_empty() && !mappings.ends_with(';') {
                mappings.push(',');
            }

            let generated_column_delta = i64::from(mapping.generated_column) - prev_generated_column;
            encode_vlq_value(generated_column_delta as i32, &mut mappings);
            // Source-index field: always 0, there is exactly one source.
            encode_vlq_value(0, &mut mappings);
            let source_line_delta = i64::from(mapping.source_line) - prev_source_line;
            encode_vlq_value(source_line_delta as i32, &mut mappings);
            let source_column_delta = i64::from(mapping.source_column) - prev_source_column;
            encode_vlq_value(source_column_delta as i32, &mut mappings);

            prev_generated_column = i64::from(mapping.generated_column);
            prev_source_line = i64::from(mapping.source_line);
            prev_source_column = i64::from(mapping.source_column);
        }

        let raw = RawSourceMap {
            version: 3,
            sources: vec![source_name.to_string()],
            names: Vec::new(),
            mappings,
            file: output_name.to_string(),
        };
        serde_json::to_string(&raw).expect("source map JSON serialization cannot fail: no non-finite floats, no cyclic structures")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_known_vlq_values_matching_the_decoder_used_elsewhere() {
        let mut out = String::new();
        encode_vlq_value(0, &mut out);
        assert_eq!(out, "A");

        let mut out = String::new();
        encode_vlq_value(1, &mut out);
        assert_eq!(out, "C");

        let mut out = String::new();
        encode_vlq_value(-1, &mut out);
        assert_eq!(out, "D");

        let mut out = String::new();
        encode_vlq_value(32, &mut out);
        assert_eq!(out, "gC");
    }

    #[test]
    fn builds_a_well_formed_source_map_object() {
        let mut builder = SourceMapBuilder::new();
        builder.push(Mapping { generated_line: 0, generated_column: 0, source_line: 0, source_column: 0 });
        builder.push(Mapping { generated_line: 1, generated_column: 4, source_line: 2, source_column: 8 });
        let json = builder.build("main.lm", "main.js");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["version"], 3);
        assert_eq!(parsed["sources"][0], "main.lm");
        assert!(parsed["mappings"].as_str().unwrap().contains(';'));
    }
}
