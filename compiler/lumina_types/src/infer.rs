//! Constraint generation and solving (§4.4 "HM inference").
//!
//! Walks the AST once, generating a fresh type variable per hole or
//! missing annotation and a fresh instantiation per use of a `Scheme`,
//! unifying as it goes. Produces the four side-tables C5 consumes
//! (`letTypes`, `fnReturns`, `fnByName`, `fnParams`) plus `inferredCalls`,
//! which `lumina_mono` (C6) reads to decide what to specialize.

use lumina_diagnostic::{bound_mismatch, Diagnostic};
use lumina_ir::ast::*;
use lumina_ir::{Location, Symbol};
use rustc_hash::FxHashMap;

use crate::registry;
use crate::subst::Substitution;
use crate::ty::{Type, VarId};
use crate::unify::{unify, UnifyError};

/// Output of running C4 over one module (§4.4 "Output").
#[derive(Default)]
pub struct InferenceResult {
    pub let_types: FxHashMap<String, Type>,
    pub fn_returns: FxHashMap<Symbol, Type>,
    pub fn_by_name: FxHashMap<Symbol, Type>,
    pub fn_params: FxHashMap<Symbol, Vec<Type>>,
    /// Per-call-site concrete type arguments, keyed by the call expression's
    /// location key — read by the monomorphizer (C6).
    pub inferred_calls: FxHashMap<String, Vec<Type>>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Scope {
    bindings: FxHashMap<Symbol, Type>,
}

pub struct InferEngine {
    subst: Substitution,
    next_var: VarId,
    scopes: Vec<Scope>,
    global_fns: FxHashMap<Symbol, Type>,
    result: InferenceResult,
}

impl InferEngine {
    pub fn new() -> Self {
        InferEngine {
            subst: Substitution::default(),
            next_var: 0,
            scopes: vec![Scope { bindings: FxHashMap::default() }],
            global_fns: FxHashMap::default(),
            result: InferenceResult::default(),
        }
    }

    fn fresh(&mut self) -> Type {
        let id = self.next_var;
        self.next_var += 1;
        Type::Var(id)
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope { bindings: FxHashMap::default() });
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn bind_local(&mut self, name: Symbol, ty: Type) {
        self.scopes.last_mut().unwrap().bindings.insert(name, ty);
    }

    fn lookup_local(&self, name: Symbol) -> Option<Type> {
        self.scopes.iter().rev().find_map(|s| s.bindings.get(&name).cloned())
    }

    fn unify_report(&mut self, expected: &Type, found: &Type, location: Location) {
        if let Err(e) = unify(&mut self.subst, expected, found, location) {
            self.result.diagnostics.push(unify_error_to_diagnostic(e));
        }
    }

    /// Converts a surface `TypeExpr` into a `Type`, treating bare names that
    /// match a function's own generic parameters as rigid variables and
    /// every other bare name as a primitive/nullary ADT. `_` holes become
    /// fresh variables.
    fn lower_type_expr(&mut self, ty: &TypeExpr, rigid: &FxHashMap<Symbol, VarId>) -> Type {
        match ty {
            TypeExpr::Hole(_) => self.fresh(),
            TypeExpr::ConstArg { value, .. } => Type::Const(*value),
            TypeExpr::Name { name, args, .. } => {
                if let Some(&id) = rigid.get(name) {
                    return Type::Var(id);
                }
                if args.is_empty() {
                    Type::Primitive(*name)
                } else {
                    let params = args.iter().map(|a| self.lower_type_expr(a, rigid)).collect();
                    Type::Adt(*name, params)
                }
            }
        }
    }

    /// Builds the rigid-variable map for a `GenericParams` list, assigning
    /// one fresh `Var` per type parameter *and* per const-generic parameter
    /// (the latter unify only against `Type::Const` payloads, via the same
    /// `Var` machinery) to stand for its occurrences inside the signature
    /// before quantifying over them in a `Scheme`. Also returns the
    /// declaration-order list of the assigned ids — `rigid_vars` is mapped
    /// through an `FxHashMap`, whose iteration order is not declaration
    /// order, so callers that need to zip quantified vars positionally
    /// against a call site's explicit/const type arguments (§4.4 "const
    /// generic parameters") must use this ordered list, not `map.values()`.
    fn rigid_vars(&mut self, generics: &GenericParams) -> (FxHashMap<Symbol, VarId>, Vec<VarId>) {
        let mut map = FxHashMap::default();
        let mut order = Vec::with_capacity(generics.types.len() + generics.consts.len());
        for p in &generics.types {
            let v = self.next_var;
            self.next_var += 1;
            map.insert(p.name, v);
            order.push(v);
        }
        for p in &generics.consts {
            let v = self.next_var;
            self.next_var += 1;
            map.insert(p.name, v);
            order.push(v);
        }
        (map, order)
    }

    /// §4.3's hoisting pass runs before inference; this registers every
    /// top-level `FnDecl` as a scheme in the global function environment so
    /// mutual recursion and forward references both work.
    pub fn register_functions(&mut self, items: &[Stmt]) {
        for item in items {
            if let Stmt::FnDecl(f) = item {
                let (rigid, quantified) = self.rigid_vars(&f.generics);
                let param_types: Vec<Type> = f.params.iter().map(|p| self.lower_type_expr(&p.ty, &rigid)).collect();
                let return_type = match &f.return_type {
                    Some(t) => self.lower_type_expr(t, &rigid),
                    None => self.fresh(),
                };
                let fn_ty = Type::Function(param_types.clone(), Box::new(return_type.clone()));
                let bounds: Vec<Symbol> = f.generics.types.iter().flat_map(|p| p.bounds.iter().copied()).collect();
                let scheme = if quantified.is_empty() { fn_ty.clone() } else { Type::Scheme(quantified, bounds, Box::new(fn_ty.clone())) };
                self.global_fns.insert(f.name, scheme);
                self.result.fn_params.insert(f.name, param_types);
                self.result.fn_returns.insert(f.name, return_type);
            }
            if let Stmt::ImplDecl(impl_decl) = item {
                registry::register_impl(type_expr_name(&impl_decl.target), impl_decl.trait_name);
            }
        }
    }

    /// Instantiates a (possibly polymorphic) function type with fresh
    /// variables, returning the monomorphic type plus the concrete
    /// substitution used for each quantified variable — the latter feeds
    /// `inferredCalls`.
    fn instantiate(&mut self, scheme: &Type, explicit_args: &[Type], location: Location) -> (Type, Vec<Type>) {
        match scheme {
            Type::Scheme(vars, bounds, body) => {
                let mut fresh_subst = Substitution::default();
                let mut concrete = Vec::with_capacity(vars.len());
                for (i, &v) in vars.iter().enumerate() {
                    let replacement = explicit_args.get(i).cloned().unwrap_or_else(|| self.fresh());
                    fresh_subst.bind(v, replacement.clone());
                    concrete.push(replacement);
                }
                for bound in bounds {
                    for c in &concrete {
                        if let Type::Primitive(name) | Type::Adt(name, _) = c {
                            if !registry::satisfies(*name, *bound) {
                                self.result.diagnostics.push(bound_mismatch(location, &c.display(), &bound.to_string()));
                            }
                        }
                    }
                }
                (substitute_rigid(body, &fresh_subst), concrete)
            }
            other => (other.clone(), Vec::new()),
        }
    }

    pub fn infer_program(&mut self, program: &LuminaProgram) -> &mut InferenceResult {
        self.register_functions(&program.items);
        for item in &program.items {
            match item {
                Stmt::FnDecl(f) => self.infer_fn(f),
                Stmt::ImplDecl(impl_decl) => {
                    for method in &impl_decl.methods {
                        self.infer_fn(method);
                    }
                }
                _ => {}
            }
        }
        for (name, ty) in self.global_fns.clone() {
            self.result.fn_by_name.insert(name, ty);
        }
        &mut self.result
    }

    fn infer_fn(&mut self, f: &FnDecl) {
        let _span = tracing::debug_span!("infer_fn", name = %f.name).entered();
        self.push_scope();
        let (rigid, _) = self.rigid_vars(&f.generics);
        for p in &f.params {
            let ty = self.lower_type_expr(&p.ty, &rigid);
            self.bind_local(p.name, ty);
        }
        let expected_return = match &f.return_type {
            Some(t) => self.lower_type_expr(t, &rigid),
            None => self.result.fn_returns.get(&f.name).cloned().unwrap_or_else(|| self.fresh()),
        };
        let block_ty = self.infer_block(&f.body, Some(&expected_return));
        // A body whose last statement is an expression (no explicit
        // `return`) implicitly returns that expression's value.
        self.unify_report(&expected_return, &block_ty, f.location);
        self.pop_scope();
    }

    /// Infers every statement in `block`; `expected_return` is threaded
    /// through so bare trailing expressions and `return` statements both
    /// unify against the function's return type.
    fn infer_block(&mut self, block: &Block, expected_return: Option<&Type>) -> Type {
        self.push_scope();
        let mut tail = Type::unit();
        for (i, stmt) in block.stmts.iter().enumerate() {
            let is_last = i + 1 == block.stmts.len();
            tail = self.infer_stmt(stmt, expected_return, is_last);
        }
        self.pop_scope();
        tail
    }

    fn infer_stmt(&mut self, stmt: &Stmt, expected_return: Option<&Type>, is_tail: bool) -> Type {
        match stmt {
            Stmt::Let(l) => {
                let value_ty = self.infer_expr(&l.value);
                if let Some(annotation) = &l.ty {
                    let rigid = FxHashMap::default();
                    let ann_ty = self.lower_type_expr(annotation, &rigid);
                    self.unify_report(&ann_ty, &value_ty, l.location);
                }
                let resolved = self.subst.resolve(&value_ty);
                self.result.let_types.insert(l.location.key(), resolved.clone());
                let generalized = self.generalize(resolved);
                self.bind_local(l.name, generalized);
                Type::unit()
            }
            Stmt::Assign(a) => {
                let target_ty = self.infer_expr(&a.target);
                let value_ty = self.infer_expr(&a.value);
                self.unify_report(&target_ty, &value_ty, a.location);
                Type::unit()
            }
            Stmt::Return(r) => {
                let value_ty = match &r.value {
                    Some(v) => self.infer_expr(v),
                    None => Type::unit(),
                };
                if let Some(expected) = expected_return {
                    self.unify_report(expected, &value_ty, r.location);
                }
                value_ty
            }
            Stmt::ExprStmt(e) => {
                let ty = self.infer_expr(&e.expr);
                if is_tail {
                    ty
                } else {
                    Type::unit()
                }
            }
            Stmt::Block(b) => self.infer_block(b, expected_return),
            Stmt::If(i) => {
                let cond_ty = self.infer_expr(&i.cond);
                self.unify_report(&Type::Primitive(Symbol::intern("bool")), &cond_ty, i.cond.location());
                let then_ty = self.infer_block(&i.then_branch, expected_return);
                match &i.else_branch {
                    Some(else_stmt) => {
                        let else_ty = self.infer_stmt(else_stmt, expected_return, is_tail);
                        if is_tail {
                            self.unify_report(&then_ty, &else_ty, i.location);
                        }
                        then_ty
                    }
                    None => Type::unit(),
                }
            }
            Stmt::While(w) => {
                let cond_ty = self.infer_expr(&w.cond);
                self.unify_report(&Type::Primitive(Symbol::intern("bool")), &cond_ty, w.cond.location());
                self.infer_block(&w.body, expected_return);
                Type::unit()
            }
            Stmt::MatchStmt(m) => {
                let scrutinee_ty = self.infer_expr(&m.scrutinee);
                let mut arm_ty = None;
                for arm in &m.arms {
                    self.push_scope();
                    if let Pattern::Variant { bindings, .. } = &arm.pattern {
                        for b in bindings {
                            self.bind_local(*b, self.fresh_for_pattern());
                        }
                    }
                    let _ = &scrutinee_ty;
                    let this_ty = self.infer_block(&arm.body, expected_return);
                    if is_tail {
                        match &arm_ty {
                            None => arm_ty = Some(this_ty),
                            Some(expected) => self.unify_report(expected, &this_ty, arm.location),
                        }
                    }
                    self.pop_scope();
                }
                arm_ty.unwrap_or_else(Type::unit)
            }
            Stmt::TypeDecl(_)
            | Stmt::StructDecl(_)
            | Stmt::EnumDecl(_)
            | Stmt::TraitDecl(_)
            | Stmt::ImplDecl(_)
            | Stmt::FnDecl(_)
            | Stmt::Import(_)
            | Stmt::ErrorNode { .. } => Type::unit(),
        }
    }

    fn fresh_for_pattern(&mut self) -> Type {
        self.fresh()
    }

    /// §4.4 "Generalization": quantify over variables free in `ty` but not
    /// free anywhere still live in the enclosing scopes.
    fn generalize(&self, ty: Type) -> Type {
        let mut free_in_ty = rustc_hash::FxHashSet::default();
        ty.free_vars(&mut free_in_ty);
        if free_in_ty.is_empty() {
            return ty;
        }
        let mut free_in_env = rustc_hash::FxHashSet::default();
        for scope in &self.scopes {
            for bound in scope.bindings.values() {
                bound.free_vars(&mut free_in_env);
            }
        }
        let quantified: Vec<VarId> = free_in_ty.difference(&free_in_env).copied().collect();
        if quantified.is_empty() {
            ty
        } else {
            Type::Scheme(quantified, Vec::new(), Box::new(ty))
        }
    }

    fn infer_expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Number { .. } => Type::Primitive(Symbol::intern("int")),
            Expr::String { .. } => Type::Primitive(Symbol::intern("string")),
            Expr::Boolean { .. } => Type::Primitive(Symbol::intern("bool")),
            Expr::Identifier { name, location } => {
                if let Some(ty) = self.lookup_local(*name) {
                    return ty;
                }
                if let Some(scheme) = self.global_fns.get(name).cloned() {
                    let (ty, _) = self.instantiate(&scheme, &[], *location);
                    return ty;
                }
                self.fresh()
            }
            Expr::Binary { op, left, right, location } => self.infer_binary(op, left, right, *location),
            Expr::Call { qualifier, callee, type_args, args, location } => {
                self.infer_call(qualifier.as_ref(), *callee, type_args, args, *location)
            }
            Expr::Member { object, .. } => {
                self.infer_expr(object);
                self.fresh()
            }
            Expr::Index { object, index, .. } => {
                self.infer_expr(object);
                self.infer_expr(index);
                self.fresh()
            }
            Expr::StructLiteral { name, fields, .. } => {
                for f in fields {
                    self.infer_expr(&f.value);
                }
                Type::Adt(*name, Vec::new())
            }
            Expr::Enum { enum_name, variant, args, .. } => {
                for a in args {
                    self.infer_expr(a);
                }
                Type::Adt(enum_name.unwrap_or(*variant), Vec::new())
            }
            Expr::Match { scrutinee, arms, location } => {
                self.infer_expr(scrutinee);
                let mut result_ty = None;
                for arm in arms {
                    self.push_scope();
                    if let Pattern::Variant { bindings, .. } = &arm.pattern {
                        for b in bindings {
                            self.bind_local(*b, self.fresh_for_pattern());
                        }
                    }
                    let arm_ty = self.infer_expr(&arm.body);
                    match &result_ty {
                        None => result_ty = Some(arm_ty),
                        Some(expected) => self.unify_report(expected, &arm_ty, *location),
                    }
                    self.pop_scope();
                }
                result_ty.unwrap_or_else(Type::unit)
            }
            Expr::Is { scrutinee, .. } => {
                self.infer_expr(scrutinee);
                Type::Primitive(Symbol::intern("bool"))
            }
            Expr::Error { .. } => Type::any(),
        }
    }

    /// §4.4 "Pipe": `a |> f(args...)` elaborates to `f(a, args...)`.
    fn infer_binary(&mut self, op: &BinaryOp, left: &Expr, right: &Expr, location: Location) -> Type {
        if matches!(op, BinaryOp::Pipe) {
            if let Expr::Call { qualifier, callee, type_args, args, location: call_loc } = right {
                let mut piped_args = Vec::with_capacity(args.len() + 1);
                piped_args.push(left.clone());
                piped_args.extend(args.iter().cloned());
                return self.infer_call(qualifier.as_ref(), *callee, type_args, &piped_args, *call_loc);
            }
            self.infer_expr(left);
            return self.infer_expr(right);
        }
        let left_ty = self.infer_expr(left);
        let right_ty = self.infer_expr(right);
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                self.unify_report(&left_ty, &right_ty, location);
                left_ty
            }
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.unify_report(&left_ty, &right_ty, location);
                Type::Primitive(Symbol::intern("bool"))
            }
            BinaryOp::And | BinaryOp::Or => {
                let bool_ty = Type::Primitive(Symbol::intern("bool"));
                self.unify_report(&bool_ty, &left_ty, location);
                self.unify_report(&bool_ty, &right_ty, location);
                bool_ty
            }
            BinaryOp::Pipe => unreachable!("handled above"),
        }
    }

    fn infer_call(&mut self, qualifier: Option<&Symbol>, callee: Symbol, type_args: &[TypeExpr], args: &[Expr], location: Location) -> Type {
        // Module-qualified calls (`io.print(...)`) are resolved against the
        // module registry by C3/C5, not here; C4 only needs a type for the
        // call's result, so an unresolved qualifier falls back to `any`.
        if qualifier.is_some() {
            for a in args {
                self.infer_expr(a);
            }
            return self.fresh();
        }
        let arg_types: Vec<Type> = args.iter().map(|a| self.infer_expr(a)).collect();
        let explicit: Vec<Type> = type_args.iter().map(|t| self.lower_type_expr(t, &FxHashMap::default())).collect();

        let Some(scheme) = self.lookup_local(callee).or_else(|| self.global_fns.get(&callee).cloned()) else {
            return self.fresh();
        };
        let (instantiated, concrete) = self.instantiate(&scheme, &explicit, location);
        let Type::Function(param_types, ret) = instantiated else {
            return self.fresh();
        };
        if param_types.len() != arg_types.len() {
            self.result.diagnostics.push(lumina_diagnostic::argument_type_mismatch(
                location,
                &format!("{} arguments", param_types.len()),
                &format!("{} arguments", arg_types.len()),
            ));
        } else {
            for (expected, actual) in param_types.iter().zip(arg_types.iter()) {
                self.unify_report(expected, actual, location);
            }
        }
        if !concrete.is_empty() {
            let resolved: Vec<Type> = concrete.iter().map(|c| self.subst.resolve(c)).collect();
            self.result.inferred_calls.insert(location.key(), resolved);
        }
        *ret
    }
}

impl Default for InferEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Replaces every `Var(id)` in `ty` that `fresh_subst` binds, leaving
/// unbound variables (non-quantified, still-open vars from the enclosing
/// inference) untouched.
fn substitute_rigid(ty: &Type, fresh_subst: &Substitution) -> Type {
    match ty {
        Type::Var(_) => fresh_subst.resolve(ty),
        Type::Adt(name, params) => Type::Adt(*name, params.iter().map(|p| substitute_rigid(p, fresh_subst)).collect()),
        Type::Function(params, ret) => {
            Type::Function(params.iter().map(|p| substitute_rigid(p, fresh_subst)).collect(), Box::new(substitute_rigid(ret, fresh_subst)))
        }
        Type::Scheme(vars, bounds, body) => Type::Scheme(vars.clone(), bounds.clone(), Box::new(substitute_rigid(body, fresh_subst))),
        Type::Primitive(_) | Type::Const(_) => ty.clone(),
    }
}

fn type_expr_name(ty: &TypeExpr) -> Symbol {
    match ty {
        TypeExpr::Name { name, .. } => *name,
        TypeExpr::ConstArg { .. } | TypeExpr::Hole(_) => Symbol::intern("_"),
    }
}

fn unify_error_to_diagnostic(err: UnifyError) -> Diagnostic {
    use lumina_diagnostic::ErrorCode;
    match err {
        UnifyError::Mismatch { expected, found, location } => {
            Diagnostic::error(ErrorCode::TypeError, location, format!("expected `{}`, found `{}`", expected.display(), found.display()))
        }
        UnifyError::InfiniteType { var, containing, location } => Diagnostic::error(
            ErrorCode::TypeError,
            location,
            format!("infinite type: `?{var}` occurs in `{}`", containing.display()),
        ),
        UnifyError::ArityMismatch { expected, found, kind, location } => Diagnostic::error(
            ErrorCode::TypeError,
            location,
            format!("expected {expected} {kind:?} arguments, found {found}"),
        ),
        UnifyError::ConstMismatch { expected, found, location } => {
            Diagnostic::error(ErrorCode::TypeError, location, format!("expected const generic value `{expected}`, found `{found}`"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;

    fn infer(src: &str) -> InferenceResult {
        let program = parse(src).unwrap();
        let mut engine = InferEngine::new();
        engine.infer_program(&program);
        engine.result
    }

    #[test]
    fn infers_simple_function_return_type() {
        let result = infer("fn inc(x:int)->int { return x+1; }");
        let ret = result.fn_returns.get(&Symbol::intern("inc")).unwrap();
        assert_eq!(ret.display(), "int");
    }

    #[test]
    fn mismatched_argument_type_is_diagnosed() {
        let result = infer("fn inc(x:int)->int { return x+1; } fn main()->int { return inc(\"oops\"); }");
        assert!(result.diagnostics.iter().any(|d| d.is_error()));
    }

    #[test]
    fn generic_call_records_inferred_type_args_for_monomorphization() {
        let result = infer("fn id<T>(x:T)->T { x } fn main()->int { let a = id(1); 0 }");
        assert_eq!(result.inferred_calls.len(), 1);
        let concrete = result.inferred_calls.values().next().unwrap();
        assert_eq!(concrete[0].display(), "int");
    }

    #[test]
    fn const_generic_call_resolves_to_literal_value() {
        let result = infer("fn zeros<T, const N: usize>(x:T)->T { x } fn main()->int { let a = zeros<i32,3>(1); 0 }");
        let concrete = result.inferred_calls.values().next().unwrap();
        assert_eq!(concrete[1].display(), "3");
    }
}

/// §8 property #3: "for any program, running inference twice yields
/// identical assignments in `letTypes`/`fnReturns`/`fnByName`/`fnParams`
/// and identical diagnostics." `InferEngine` carries no process-global
/// state (fresh `VarId`s start at 0 per engine), so two independent runs
/// over the same AST should produce byte-for-byte identical side tables.
#[cfg(test)]
mod determinism_proptests {
    use proptest::prelude::*;
    use proptest::prop_oneof;

    use super::{InferEngine, InferenceResult};
    use lumina_parse::parse;

    fn small_program() -> impl Strategy<Value = String> {
        let body = prop_oneof![
            Just("return x+1;".to_string()),
            Just("return x-1;".to_string()),
            Just("return x*2;".to_string()),
            Just("let y = x+1; return y;".to_string()),
        ];
        let call_arg = prop_oneof![Just("1".to_string()), Just("2".to_string()), Just("3".to_string())];
        (body, call_arg).prop_map(|(body, arg)| format!("fn f(x:int)->int {{ {body} }} fn main()->int {{ return f({arg}); }}"))
    }

    fn infer_twice(src: &str) -> (InferenceResult, InferenceResult) {
        let program = parse(src).expect("generated source should always parse");
        let mut first_engine = InferEngine::new();
        first_engine.infer_program(&program);
        let mut second_engine = InferEngine::new();
        second_engine.infer_program(&program);
        (first_engine.result, second_engine.result)
    }

    fn same_result(a: &InferenceResult, b: &InferenceResult) -> bool {
        a.let_types == b.let_types
            && a.fn_returns == b.fn_returns
            && a.fn_by_name == b.fn_by_name
            && a.fn_params == b.fn_params
            && a.diagnostics == b.diagnostics
    }

    proptest! {
        #[test]
        fn inference_is_deterministic_across_runs(src in small_program()) {
            let (first, second) = infer_twice(&src);
            prop_assert!(same_result(&first, &second));
        }
    }
}
