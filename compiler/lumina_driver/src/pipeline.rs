//! Pipeline orchestration (§2, §5): wires C1–C9 together for one source
//! file.
//!
//! `spec.md` §2's data-flow line is the literal call order below: "source
//! text → C1 → AST → C2 (bindings) → C3 (symbols) → C4 (inference side-
//! table) → C5 ... → C6 → specialized AST → C7 → IR → C8 → IR′ → C9 → JS +
//! source map." §7 "Propagation" governs the one branch point: once C1–C5
//! have produced an error-severity diagnostic, C6–C9 are skipped, since
//! running monomorphization/codegen over a program C5 already rejected
//! would either panic or emit nonsense JS.

use lumina_codegen::{CodegenOptions, CodegenOutput, Target};
use lumina_diagnostic::Diagnostic;
use lumina_ir::ast::{ImportKind, LuminaProgram, Stmt, TypeExpr};
use lumina_ir::Symbol;
use lumina_module::{Lockfile, ModuleExport, ModuleRegistry};
use rustc_hash::FxHashMap;

/// Per-invocation compiler configuration (`SPEC_FULL.md` §11.3): threaded
/// explicitly through the pipeline rather than held as global state.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub target: Target,
    pub source_map: bool,
    pub no_runtime: bool,
    pub source_name: String,
    pub output_name: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            target: Target::Esm,
            source_map: false,
            no_runtime: false,
            source_name: "input.lm".to_string(),
            output_name: "output.js".to_string(),
        }
    }
}

/// Everything a caller needs out of running the full pipeline once.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub js: Option<String>,
    pub source_map: Option<String>,
    /// The file's own export set, derived from its public top-level
    /// declarations — what a host registers back into the
    /// [`lumina_module::ModuleRegistry`] for dependents (§3.5).
    pub exports: FxHashMap<lumina_ir::Symbol, ModuleExport>,
}

impl PipelineOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Runs C1–C9 over `source`, resolving imports against `registry`/
/// `lockfile`. This is the single-file unit of work §5 describes as
/// sequential; a multi-file project fans this out per file (see
/// [`crate::project::analyze_project`]) with no ordering guarantee
/// between files.
pub fn compile_source(
    source: &str,
    origin: &str,
    registry: &ModuleRegistry,
    lockfile: &Lockfile,
    options: &CompileOptions,
) -> PipelineOutput {
    let _span = tracing::info_span!("compile_source", origin).entered();
    let mut diagnostics = Vec::new();

    // C1: parse.
    let program = match lumina_parse::parse(source) {
        Ok(p) => p,
        Err(e) => {
            diagnostics.push(e.to_diagnostic());
            return PipelineOutput { diagnostics, ..Default::default() };
        }
    };

    // C2: module graph.
    let imports: Vec<_> = program
        .items
        .iter()
        .filter_map(|item| match item {
            Stmt::Import(import) => Some(import.clone()),
            _ => None,
        })
        .collect();
    let (module_bindings, module_diagnostics) = registry.resolve_imports(lockfile, &imports);
    diagnostics.extend(module_diagnostics);

    // C3: symbol/name resolution.
    let (table, resolve_diagnostics) = lumina_resolve::resolve(origin, &program, &module_bindings);
    diagnostics.extend(resolve_diagnostics);

    // C4: HM inference.
    let mut infer_engine = lumina_types::InferEngine::new();
    let inference = infer_engine.infer_program(&program);
    diagnostics.extend(inference.diagnostics.clone());

    // C5: semantic/flow checker.
    diagnostics.extend(lumina_check::check_program(&program, &table, &module_bindings));

    let exports = public_exports(&program, &table);

    // §7: "If any diagnostic has severity = error, later phases (C6–C9)
    // may be skipped to avoid emitting invalid code." We always skip —
    // the host decides whether to surface the diagnostics-only result.
    if diagnostics.iter().any(Diagnostic::is_error) {
        return PipelineOutput { diagnostics, js: None, source_map: None, exports };
    }

    // C6: monomorphization.
    let mono = lumina_mono::monomorphize(&program, inference);

    // C7: AST -> IR lowering.
    let ir = lumina_canon::lower_program(&mono.program);

    // C8: IR optimization.
    let (ir, opt_diagnostics) = lumina_opt::optimize(ir);
    diagnostics.extend(opt_diagnostics);
    if diagnostics.iter().any(Diagnostic::is_error) {
        // §4.8 step 8: a validation failure is a compiler bug; still hand
        // back diagnostics, never emit JS built on IR that failed its own
        // validator.
        return PipelineOutput { diagnostics, js: None, source_map: None, exports };
    }

    // C9: JS code generation.
    let codegen_options = CodegenOptions {
        target: options.target,
        source_map: options.source_map,
        no_runtime: options.no_runtime,
        source_name: options.source_name.clone(),
        output_name: options.output_name.clone(),
    };
    let CodegenOutput { js, source_map } = lumina_codegen::generate(&ir, &codegen_options);

    PipelineOutput { diagnostics, js: Some(js), source_map, exports }
}

/// Derives the export set a dependent file would see when importing
/// `origin` (§3.5): every `public` function becomes a `Function` export,
/// every `public` type/struct/enum a `Type` export.
fn public_exports(program: &LuminaProgram, table: &lumina_resolve::SymbolTable) -> FxHashMap<lumina_ir::Symbol, ModuleExport> {
    let mut exports = FxHashMap::default();
    for item in &program.items {
        match item {
            Stmt::FnDecl(f) if f.visibility == lumina_ir::ast::Visibility::Public => {
                if let Some(info) = table.get(f.name) {
                    exports.insert(
                        f.name,
                        ModuleExport::Function {
                            param_types: info.params.iter().map(|p| type_expr_name(&p.ty)).collect(),
                            param_names: info.params.iter().map(|p| p.name).collect(),
                            return_type: info.declared_type.as_ref().map_or(Symbol::intern("any"), type_expr_name),
                        },
                    );
                }
            }
            Stmt::StructDecl(s) if s.visibility == lumina_ir::ast::Visibility::Public => {
                exports.insert(s.name, ModuleExport::Type);
            }
            Stmt::EnumDecl(e) if e.visibility == lumina_ir::ast::Visibility::Public => {
                exports.insert(e.name, ModuleExport::Type);
            }
            Stmt::TypeDecl(t) if t.visibility == lumina_ir::ast::Visibility::Public => {
                exports.insert(t.name, ModuleExport::Type);
            }
            _ => {}
        }
    }
    exports
}

/// The bare name a type expression denotes, for the coarse `ModuleExport`
/// shape (§3.5) which only records names, not full structural types — the
/// runtime ABI of §6.4 is untyped at this boundary regardless.
fn type_expr_name(ty: &TypeExpr) -> Symbol {
    match ty {
        TypeExpr::Name { name, .. } => *name,
        TypeExpr::ConstArg { .. } | TypeExpr::Hole(_) => Symbol::intern("any"),
    }
}

/// Elaborates `import * as NS`/`import { a as b }` bindings into the flat
/// symbol each local name denotes, mirroring §4.2's contract without
/// duplicating `ModuleRegistry::resolve_imports`'s own bookkeeping — kept
/// here only for callers (the CLI's `--explain`-adjacent debug output)
/// that want the alias list without re-deriving it from `ImportKind`.
pub fn import_aliases(program: &LuminaProgram) -> Vec<lumina_ir::Symbol> {
    let mut aliases = Vec::new();
    for item in &program.items {
        if let Stmt::Import(import) = item {
            match &import.kind {
                ImportKind::Namespace { alias } => aliases.push(*alias),
                ImportKind::Named { items } => {
                    for (name, alias) in items {
                        aliases.push(alias.unwrap_or(*name));
                    }
                }
            }
        }
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(src: &str) -> PipelineOutput {
        let registry = ModuleRegistry::new();
        let lockfile = Lockfile::empty();
        compile_source(src, "test.lm", &registry, &lockfile, &CompileOptions::default())
    }

    #[test]
    fn pipe_and_generics_emit_js_with_no_diagnostics() {
        let out = compile(
            "fn double<T>(x:T,f:fn(T)->T)->T { f(x) } fn inc(x:int)->int { x+1 } fn main()->int { return 3 |> double(inc); }",
        );
        assert!(!out.has_errors(), "{:?}", out.diagnostics);
        assert!(out.js.is_some());
    }

    #[test]
    fn non_exhaustive_match_stops_before_codegen() {
        let out = compile("enum Color { Red, Green, Blue } fn main()->int { let c = Color.Red; match c { Red => 0, Green => 1 } }");
        assert!(out.has_errors());
        assert!(out.js.is_none());
    }

    #[test]
    fn const_generic_calls_monomorphize_away() {
        let out = compile("fn zeros<T, const N: usize>(x:T)->T { x } fn main()->int { let a = zeros<i32,3>(1); let b = zeros<i32,5>(2); 0 }");
        assert!(!out.has_errors(), "{:?}", out.diagnostics);
        let js = out.js.unwrap();
        assert!(js.contains("zeros_i32_3"));
        assert!(js.contains("zeros_i32_5"));
    }

    #[test]
    fn public_function_is_exported() {
        let registry = ModuleRegistry::new();
        let lockfile = Lockfile::empty();
        let out = compile_source(
            "pub fn inc(x:int)->int { x+1 } fn main()->int { inc(1) }",
            "test.lm",
            &registry,
            &lockfile,
            &CompileOptions::default(),
        );
        assert!(out.exports.contains_key(&lumina_ir::Symbol::intern("inc")));
    }
}
