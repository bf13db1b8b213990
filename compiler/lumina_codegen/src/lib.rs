//! JS code generator (C9, §4.9): lowers an `IrProgram` to ESM/CJS
//! JavaScript text plus an optional source-map-v3 payload.

mod cast;
mod emit;
mod runtime;
mod sourcemap;

pub use emit::{generate, CodegenOptions, CodegenOutput, Target};
pub use runtime::{RUNTIME_NAMES, RUNTIME_PACKAGE};
pub use sourcemap::{Mapping, SourceMapBuilder};

/// §8 property #7: "emitting the same IR twice yields byte-identical JS
/// and identical source maps." [`generate`] takes the program by
/// reference and never mutates `Emitter`'s inputs, so two calls over the
/// same lowered-and-optimized IR should be indistinguishable.
#[cfg(test)]
mod idempotence_proptests {
    use proptest::prelude::*;
    use proptest::prop_oneof;

    use lumina_canon::lower_program;
    use lumina_opt::optimize;
    use lumina_parse::parse;

    use crate::{generate, CodegenOptions, Target};

    fn small_program() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("fn main()->int { return 1+2; }".to_string()),
            Just("fn f()->int { return 3; } fn main()->int { return f()*2; }".to_string()),
            Just("fn main()->int { let x = 1; if x>0 { return x; } else { return 0; } }".to_string()),
            Just("fn main()->int { let x = 0; while x<3 { x = x+1; } return x; }".to_string()),
        ]
    }

    fn options() -> CodegenOptions {
        CodegenOptions { target: Target::Esm, source_map: true, no_runtime: false, source_name: "input.lm".into(), output_name: "input.js".into() }
    }

    proptest! {
        #[test]
        fn generating_the_same_ir_twice_is_byte_identical(src in small_program()) {
            let program = parse(&src).expect("generated source should always parse");
            let ir = lower_program(&program);
            let (optimized, diagnostics) = optimize(ir);
            prop_assert!(diagnostics.is_empty());

            let first = generate(&optimized, &options());
            let second = generate(&optimized, &options());
            prop_assert_eq!(first.js, second.js);
            prop_assert_eq!(first.source_map, second.source_map);
        }
    }
}
