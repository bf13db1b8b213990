//! Scope tree and definite-assignment tracking for a single function body
//! (§3.2 "Lifecycle", §4.3 step 2).
//!
//! Per the design note in `SPEC_FULL.md`/`spec.md` §9 ("Shadowed import
//! diagnostics require tracking namespace bindings separately from
//! variable bindings"), a [`Scope`] keeps module-namespace bindings in
//! their own table rather than merging them into the variable bindings.

use lumina_diagnostic::{shadowed_binding, shadowed_import, unknown_identifier, Diagnostic};
use lumina_ir::ast::*;
use lumina_ir::{Location, Symbol};
use lumina_module::ModuleExport;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::suggest::suggest;
use crate::symbol::SymbolTable;

#[derive(Clone, Debug)]
struct Binding {
    declared_at: Location,
    mutable: bool,
    read: bool,
}

#[derive(Default)]
struct Scope {
    bindings: FxHashMap<Symbol, Binding>,
    /// Module-namespace bindings introduced by `import * as NS`, tracked
    /// apart from `bindings` so a later local `let NS = ...` can be
    /// recognised as shadowing an *import* specifically.
    namespaces: FxHashSet<Symbol>,
    assigned: FxHashSet<Symbol>,
}

pub struct Resolver<'a> {
    table: &'a SymbolTable,
    module_bindings: &'a FxHashMap<Symbol, ModuleExport>,
    scopes: Vec<Scope>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a SymbolTable, module_bindings: &'a FxHashMap<Symbol, ModuleExport>) -> Self {
        let mut root = Scope::default();
        for (name, export) in module_bindings {
            if matches!(export, ModuleExport::Module { .. }) {
                root.namespaces.insert(*name);
            }
        }
        Resolver { table, module_bindings, scopes: vec![root], diagnostics: Vec::new() }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop_scope(&mut self) {
        let scope = self.scopes.pop().expect("scope stack must not underflow");
        for (name, binding) in &scope.bindings {
            if !binding.read && !name.as_str().starts_with('_') {
                self.diagnostics.push(Diagnostic::warning(
                    lumina_diagnostic::ErrorCode::Lint,
                    binding.declared_at,
                    format!("unused binding `{name}`"),
                ));
            }
        }
    }

    fn declare(&mut self, name: Symbol, location: Location, mutable: bool) {
        // Shadowing an outer variable binding is a warning; redeclaring in
        // the *same* scope is a hard redefinition error (property #2).
        if let Some(existing) = self.scopes.last().unwrap().bindings.get(&name) {
            self.diagnostics.push(
                Diagnostic::error(lumina_diagnostic::ErrorCode::TypeError, location, format!("`{name}` is already declared in this scope"))
                    .with_related(lumina_diagnostic::RelatedInfo::new(existing.declared_at, "previous declaration here")),
            );
        } else if let Some(outer) = self.find_binding(name) {
            self.diagnostics.push(shadowed_binding(location, outer, name.as_str()));
        } else if self.namespace_visible(name) {
            self.diagnostics.push(shadowed_import(location, name.as_str()));
        }
        let scope = self.scopes.last_mut().unwrap();
        scope.bindings.insert(name, Binding { declared_at: location, mutable, read: false });
        scope.assigned.insert(name);
    }

    fn find_binding(&self, name: Symbol) -> Option<Location> {
        self.scopes.iter().rev().find_map(|s| s.bindings.get(&name)).map(|b| b.declared_at)
    }

    fn namespace_visible(&self, name: Symbol) -> bool {
        self.scopes.iter().any(|s| s.namespaces.contains(&name))
    }

    fn mark_read(&mut self, name: Symbol, location: Location) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(binding) = scope.bindings.get_mut(&name) {
                binding.read = true;
                return;
            }
            if scope.namespaces.contains(&name) {
                return;
            }
        }
        if self.table.contains(name) || self.module_bindings.contains_key(&name) {
            return;
        }
        let mut candidates: Vec<&str> = self.table.names().map(Symbol::as_str).collect();
        candidates.extend(self.module_bindings.keys().map(|s| s.as_str()));
        for scope in &self.scopes {
            candidates.extend(scope.bindings.keys().map(|s| s.as_str()));
            candidates.extend(scope.namespaces.iter().map(|s| s.as_str()));
        }
        let suggestion = suggest(name.as_str(), candidates.into_iter());
        self.diagnostics.push(unknown_identifier(location, name.as_str(), suggestion));
    }

    fn is_assigned(&self, name: Symbol) -> bool {
        self.scopes.iter().rev().any(|s| s.assigned.contains(&name))
    }

    fn is_mutable(&self, name: Symbol) -> Option<bool> {
        self.scopes.iter().rev().find_map(|s| s.bindings.get(&name)).map(|b| b.mutable)
    }

    pub fn resolve_function(&mut self, f: &FnDecl) {
        self.push_scope();
        for p in &f.params {
            self.declare(p.name, p.location, p.is_ref);
            // A `ref` parameter forwards writes to the caller; for
            // purposes of local mutability it behaves as if declared `mut`.
        }
        self.resolve_block(&f.body);
        self.pop_scope();
    }

    fn resolve_block(&mut self, block: &Block) {
        self.push_scope();
        for stmt in &block.stmts {
            self.resolve_stmt(stmt);
        }
        self.pop_scope();
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(l) => {
                self.resolve_expr(&l.value);
                self.declare(l.name, l.location, l.mutable);
            }
            Stmt::Assign(a) => {
                self.resolve_expr(&a.value);
                if let Expr::Identifier { name, location } = &a.target {
                    if !self.is_assigned(*name) {
                        self.diagnostics.push(Diagnostic::error(
                            lumina_diagnostic::ErrorCode::TypeError,
                            *location,
                            format!("use of `{name}` before it is assigned"),
                        ));
                    } else if self.is_mutable(*name) == Some(false) {
                        self.diagnostics.push(Diagnostic::error(
                            lumina_diagnostic::ErrorCode::TypeError,
                            *location,
                            format!("cannot assign to immutable binding `{name}`"),
                        ));
                    }
                    self.mark_read(*name, *location);
                } else {
                    self.resolve_expr(&a.target);
                }
            }
            Stmt::Return(r) => {
                if let Some(v) = &r.value {
                    self.resolve_expr(v);
                }
            }
            Stmt::ExprStmt(e) => self.resolve_expr(&e.expr),
            Stmt::Block(b) => self.resolve_block(b),
            Stmt::If(i) => {
                self.resolve_expr(&i.cond);
                self.resolve_block(&i.then_branch);
                if let Some(e) = &i.else_branch {
                    self.resolve_stmt(e);
                }
            }
            Stmt::While(w) => {
                self.resolve_expr(&w.cond);
                self.resolve_block(&w.body);
            }
            Stmt::MatchStmt(m) => {
                self.resolve_expr(&m.scrutinee);
                for arm in &m.arms {
                    self.push_scope();
                    if let Pattern::Variant { bindings, location, .. } = &arm.pattern {
                        for b in bindings {
                            self.declare(*b, *location, false);
                        }
                    }
                    for s in &arm.body.stmts {
                        self.resolve_stmt(s);
                    }
                    self.pop_scope();
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

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } | Expr::Error { .. } => {}
            Expr::Identifier { name, location } => self.mark_read(*name, *location),
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Call { qualifier, callee, args, .. } => {
                if let Some(q) = qualifier {
                    self.mark_read(*q, expr.location());
                } else {
                    self.mark_read(*callee, expr.location());
                }
                for a in args {
                    self.resolve_expr(a);
                }
            }
            Expr::Member { object, .. } => self.resolve_expr(object),
            Expr::Index { object, index, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(index);
            }
            Expr::StructLiteral { fields, .. } => {
                for f in fields {
                    self.resolve_expr(&f.value);
                }
            }
            Expr::Enum { args, .. } => {
                for a in args {
                    self.resolve_expr(a);
                }
            }
            Expr::Match { scrutinee, arms, .. } => {
                self.resolve_expr(scrutinee);
                for arm in arms {
                    self.push_scope();
                    if let Pattern::Variant { bindings, location, .. } = &arm.pattern {
                        for b in bindings {
                            self.declare(*b, *location, false);
                        }
                    }
                    self.resolve_expr(&arm.body);
                    self.pop_scope();
                }
            }
            Expr::Is { scrutinee, .. } => self.resolve_expr(scrutinee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::hoist_declarations;
    use lumina_parse::parse;

    fn resolve(src: &str) -> Vec<Diagnostic> {
        let program = parse(src).unwrap();
        let (table, _) = hoist_declarations("test.lm", &program.items);
        let bindings = FxHashMap::default();
        let mut resolver = Resolver::new(&table, &bindings);
        for item in &program.items {
            if let Stmt::FnDecl(f) = item {
                resolver.resolve_function(f);
            }
        }
        resolver.into_diagnostics()
    }

    #[test]
    fn unknown_identifier_is_flagged_with_suggestion() {
        let diags = resolve("fn inc(x:int)->int { x + 1 } fn main()->int { inc(1); duoble(1) }");
        assert!(diags.iter().any(|d| d.code == lumina_diagnostic::ErrorCode::UnknownIdentifier));
    }

    #[test]
    fn shadowing_is_a_warning_not_redefinition() {
        let diags = resolve("fn main()->int { let x = 1; if true { let x = 2; x } else { 0 } }");
        assert!(diags.iter().any(|d| d.code == lumina_diagnostic::ErrorCode::ShadowedBinding));
        assert!(!diags.iter().any(|d| d.severity == lumina_diagnostic::Severity::Error && d.message.contains("already declared")));
    }

    #[test]
    fn redeclaration_in_same_scope_is_an_error() {
        let diags = resolve("fn main()->int { let x = 1; let x = 2; x }");
        assert!(diags.iter().any(|d| d.message.contains("already declared")));
    }

    #[test]
    fn unused_binding_is_a_lint() {
        let diags = resolve("fn main()->int { let unused = 1; 0 }");
        assert!(diags.iter().any(|d| d.code == lumina_diagnostic::ErrorCode::Lint));
    }

    #[test]
    fn underscore_prefixed_binding_is_exempt_from_unused_lint() {
        let diags = resolve("fn main()->int { let _unused = 1; 0 }");
        assert!(!diags.iter().any(|d| d.code == lumina_diagnostic::ErrorCode::Lint));
    }

    #[test]
    fn assigning_to_immutable_binding_is_an_error() {
        let diags = resolve("fn main()->int { let x = 1; x = 2; x }");
        assert!(diags.iter().any(|d| d.message.contains("immutable")));
    }

    #[test]
    fn assigning_to_mut_binding_is_fine() {
        let diags = resolve("fn main()->int { let mut x = 1; x = 2; x }");
        assert!(!diags.iter().any(|d| d.message.contains("immutable")));
    }
}
