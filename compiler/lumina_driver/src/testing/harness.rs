//! Compiles a source string end-to-end and hands back diagnostics plus
//! emitted JS, for assertion in integration tests. Grounded in the
//! teacher's `oric::testing::harness::eval_source`, adapted to this
//! pipeline's C1–C9 shape instead of lex→parse→typecheck→canon→eval.

use lumina_codegen::Target;
use lumina_module::{Lockfile, ModuleRegistry};

use crate::pipeline::{compile_source, CompileOptions, PipelineOutput};

/// Compiles `source` as a standalone file with an empty module registry
/// and lockfile (no imports resolve beyond the `@std` prelude).
pub fn compile(source: &str) -> PipelineOutput {
    compile_with_target(source, Target::Esm)
}

pub fn compile_with_target(source: &str, target: Target) -> PipelineOutput {
    let registry = ModuleRegistry::new();
    let lockfile = Lockfile::empty();
    let options = CompileOptions { target, ..CompileOptions::default() };
    compile_source(source, "test.lm", &registry, &lockfile, &options)
}

/// Compiles `source` and panics with the diagnostics if it didn't
/// succeed, returning the emitted JS. For tests asserting on generated
/// code rather than on diagnostics.
#[track_caller]
pub fn compile_js(source: &str) -> String {
    let output = compile(source);
    assert!(!output.has_errors(), "expected successful compile, got diagnostics: {:?}", output.diagnostics);
    output.js.expect("a successful compile always produces JS")
}

/// Compiles `source` and panics unless it produced at least one
/// error-severity diagnostic.
#[track_caller]
pub fn expect_error(source: &str) -> PipelineOutput {
    let output = compile(source);
    assert!(output.has_errors(), "expected a diagnostic, but compile succeeded: {:?}", output.js);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_js_returns_generated_source() {
        let js = compile_js("fn main()->int { return 1 + 2; }");
        assert!(js.contains("3") || js.contains("1") && js.contains("2"));
    }

    #[test]
    fn expect_error_on_a_bad_program_does_not_panic() {
        let output = expect_error("fn main()->int { return nope(); }");
        assert!(output.has_errors());
    }
}
