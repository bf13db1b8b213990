//! Symbol resolver (C3, §4.3).
//!
//! Two passes over a single module's [`LuminaProgram`]: hoisting every
//! top-level declaration into a flat [`SymbolTable`], then a per-function
//! scope walk that resolves identifiers, tracks definite assignment, and
//! reports shadowing/unused-binding diagnostics.

mod scope;
mod suggest;
mod symbol;

pub use scope::Resolver;
pub use suggest::suggest;
pub use symbol::{hoist_declarations, SymbolInfo, SymbolKind, SymbolTable};

use lumina_diagnostic::Diagnostic;
use lumina_ir::ast::{LuminaProgram, Stmt};
use lumina_ir::Symbol;
use lumina_module::ModuleExport;
use rustc_hash::FxHashMap;

/// Runs C3 over one module: hoists declarations, then walks every function
/// body for scope/assignment diagnostics. `module_bindings` is the per-file
/// map produced by `lumina_module::ModuleRegistry::resolve_imports`.
pub fn resolve(
    origin: &str,
    program: &LuminaProgram,
    module_bindings: &FxHashMap<Symbol, ModuleExport>,
) -> (SymbolTable, Vec<Diagnostic>) {
    let _span = tracing::debug_span!("resolve", origin).entered();
    let (table, mut diagnostics) = hoist_declarations(origin, &program.items);

    let mut resolver = Resolver::new(&table, module_bindings);
    for item in &program.items {
        match item {
            Stmt::FnDecl(f) => resolver.resolve_function(f),
            Stmt::ImplDecl(impl_decl) => {
                for method in &impl_decl.methods {
                    resolver.resolve_function(method);
                }
            }
            _ => {}
        }
    }
    diagnostics.extend(resolver.into_diagnostics());
    (table, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;

    #[test]
    fn resolves_a_whole_module_and_collects_diagnostics_from_both_passes() {
        let src = "fn f()->int { 1 } fn f()->int { 2 } fn main()->int { duoble(1) }";
        let program = parse(src).unwrap();
        let bindings = FxHashMap::default();
        let (table, diags) = resolve("test.lm", &program, &bindings);
        assert!(table.contains(Symbol::intern("f")));
        assert!(diags.iter().any(|d| d.message.contains("already declared")));
        assert!(diags.iter().any(|d| d.code == lumina_diagnostic::ErrorCode::UnknownIdentifier));
    }

    #[test]
    fn clean_module_resolves_without_errors() {
        let src = "fn inc(x:int)->int { x + 1 } fn main()->int { inc(1) }";
        let program = parse(src).unwrap();
        let bindings = FxHashMap::default();
        let (_table, diags) = resolve("test.lm", &program, &bindings);
        assert!(!diags.iter().any(|d| d.is_error()));
    }
}
