//! Monomorphizer (C6, §4.6).
//!
//! Reads the HM `inferredCalls` table produced by `lumina_types` (C4): for
//! each call to a generic function, the concrete type arguments (including
//! const-generic integer arguments). For each unique instantiation, clones
//! the `FnDecl` with parameters substituted, renaming it
//! `name_arg1_arg2_…`. Rewrites call sites to reference the specialized
//! name and drops the original — in this language a generic function can
//! never be called without a fully concrete instantiation at the call
//! site (there is no dynamic dispatch), so after rewriting every call site
//! the original always has zero remaining uses. Specialization is keyed
//! by the specialized name itself, which is already a canonical string
//! form of the substitution, giving idempotence for free.

use lumina_ir::ast::*;
use lumina_ir::{LuminaProgram, Symbol};
use lumina_types::infer::InferenceResult;
use lumina_types::Type;
use rustc_hash::FxHashMap;

/// Output of running C6 over one module.
pub struct MonoResult {
    pub program: LuminaProgram,
    /// Original generic name -> every specialized name generated for it,
    /// for diagnostics/logging in the driver.
    pub specializations: FxHashMap<Symbol, Vec<Symbol>>,
}

/// Runs monomorphization over `program` using the call-site type
/// arguments recorded in `inference.inferred_calls`.
pub fn monomorphize(program: &LuminaProgram, inference: &InferenceResult) -> MonoResult {
    let _span = tracing::debug_span!("monomorphize").entered();
    let generics = collect_generic_fns(program);
    if generics.is_empty() {
        return MonoResult { program: program.clone(), specializations: FxHashMap::default() };
    }

    let mut call_site_specialization: FxHashMap<String, Symbol> = FxHashMap::default();
    let mut requested: FxHashMap<Symbol, (Symbol, Vec<Type>)> = FxHashMap::default();
    for item in &program.items {
        collect_calls_stmt(item, &generics, inference, &mut call_site_specialization, &mut requested);
    }

    let mut specializations: FxHashMap<Symbol, Vec<Symbol>> = FxHashMap::default();
    let mut new_fns: Vec<Stmt> = Vec::with_capacity(requested.len());
    for (specialized_name, (callee, concrete)) in &requested {
        let decl = generics[callee];
        new_fns.push(Stmt::FnDecl(specialize_fn_decl(decl, concrete, *specialized_name, &call_site_specialization)));
        specializations.entry(*callee).or_default().push(*specialized_name);
    }

    let empty_subst = FxHashMap::default();
    let ctx = RewriteCtx { call_site_specialization: &call_site_specialization, type_subst: &empty_subst };
    let mut items: Vec<Stmt> = program
        .items
        .iter()
        .filter(|item| !is_dropped_generic(item, &generics))
        .map(|item| rewrite_item(item, &ctx))
        .collect();
    items.extend(new_fns);

    MonoResult { program: LuminaProgram { items }, specializations }
}

fn collect_generic_fns(program: &LuminaProgram) -> FxHashMap<Symbol, &FnDecl> {
    let mut map = FxHashMap::default();
    for item in &program.items {
        if let Stmt::FnDecl(f) = item {
            if !f.generics.is_empty() {
                map.insert(f.name, f);
            }
        }
    }
    map
}

fn is_dropped_generic(item: &Stmt, generics: &FxHashMap<Symbol, &FnDecl>) -> bool {
    matches!(item, Stmt::FnDecl(f) if generics.contains_key(&f.name))
}

/// Replaces non-ASCII-alphanumeric characters with `_` so a type's display
/// form is safe to splice into an identifier (`List<int>` -> `List_int_`).
fn sanitize_fragment(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

/// §4.6: "renaming it `name_arg1_arg2_…`" — also the canonical
/// substitution-form key used to deduplicate instantiations.
fn specialize_name(callee: Symbol, concrete: &[Type]) -> Symbol {
    let mut parts = vec![callee.to_string()];
    parts.extend(concrete.iter().map(|t| sanitize_fragment(&t.display())));
    Symbol::intern(&parts.join("_"))
}

fn collect_calls_stmt(
    stmt: &Stmt,
    generics: &FxHashMap<Symbol, &FnDecl>,
    inference: &InferenceResult,
    call_sites: &mut FxHashMap<String, Symbol>,
    requested: &mut FxHashMap<Symbol, (Symbol, Vec<Type>)>,
) {
    match stmt {
        Stmt::Let(l) => collect_calls_expr(&l.value, generics, inference, call_sites, requested),
        Stmt::Assign(a) => {
            collect_calls_expr(&a.target, generics, inference, call_sites, requested);
            collect_calls_expr(&a.value, generics, inference, call_sites, requested);
        }
        Stmt::Return(r) => {
            if let Some(v) = &r.value {
                collect_calls_expr(v, generics, inference, call_sites, requested);
            }
        }
        Stmt::ExprStmt(e) => collect_calls_expr(&e.expr, generics, inference, call_sites, requested),
        Stmt::Block(b) => {
            for s in &b.stmts {
                collect_calls_stmt(s, generics, inference, call_sites, requested);
            }
        }
        Stmt::If(i) => {
            collect_calls_expr(&i.cond, generics, inference, call_sites, requested);
            for s in &i.then_branch.stmts {
                collect_calls_stmt(s, generics, inference, call_sites, requested);
            }
            if let Some(else_stmt) = &i.else_branch {
                collect_calls_stmt(else_stmt, generics, inference, call_sites, requested);
            }
        }
        Stmt::While(w) => {
            collect_calls_expr(&w.cond, generics, inference, call_sites, requested);
            for s in &w.body.stmts {
                collect_calls_stmt(s, generics, inference, call_sites, requested);
            }
        }
        Stmt::MatchStmt(m) => {
            collect_calls_expr(&m.scrutinee, generics, inference, call_sites, requested);
            for arm in &m.arms {
                for s in &arm.body.stmts {
                    collect_calls_stmt(s, generics, inference, call_sites, requested);
                }
            }
        }
        Stmt::FnDecl(f) => {
            for s in &f.body.stmts {
                collect_calls_stmt(s, generics, inference, call_sites, requested);
            }
        }
        Stmt::ImplDecl(impl_decl) => {
            for method in &impl_decl.methods {
                for s in &method.body.stmts {
                    collect_calls_stmt(s, generics, inference, call_sites, requested);
                }
            }
        }
        Stmt::TypeDecl(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TraitDecl(_) | Stmt::Import(_) | Stmt::ErrorNode { .. } => {}
    }
}

fn collect_calls_expr(
    expr: &Expr,
    generics: &FxHashMap<Symbol, &FnDecl>,
    inference: &InferenceResult,
    call_sites: &mut FxHashMap<String, Symbol>,
    requested: &mut FxHashMap<Symbol, (Symbol, Vec<Type>)>,
) {
    match expr {
        Expr::Binary { left, right, .. } => {
            collect_calls_expr(left, generics, inference, call_sites, requested);
            collect_calls_expr(right, generics, inference, call_sites, requested);
        }
        Expr::Call { qualifier, callee, args, location, .. } => {
            for a in args {
                collect_calls_expr(a, generics, inference, call_sites, requested);
            }
            if qualifier.is_none() && generics.contains_key(callee) {
                if let Some(concrete) = inference.inferred_calls.get(&location.key()) {
                    let specialized_name = specialize_name(*callee, concrete);
                    call_sites.insert(location.key(), specialized_name);
                    requested.entry(specialized_name).or_insert_with(|| (*callee, concrete.clone()));
                }
            }
        }
        Expr::Member { object, .. } => collect_calls_expr(object, generics, inference, call_sites, requested),
        Expr::Index { object, index, .. } => {
            collect_calls_expr(object, generics, inference, call_sites, requested);
            collect_calls_expr(index, generics, inference, call_sites, requested);
        }
        Expr::StructLiteral { fields, .. } => {
            for f in fields {
                collect_calls_expr(&f.value, generics, inference, call_sites, requested);
            }
        }
        Expr::Enum { args, .. } => {
            for a in args {
                collect_calls_expr(a, generics, inference, call_sites, requested);
            }
        }
        Expr::Match { scrutinee, arms, .. } => {
            collect_calls_expr(scrutinee, generics, inference, call_sites, requested);
            for arm in arms {
                collect_calls_expr(&arm.body, generics, inference, call_sites, requested);
            }
        }
        Expr::Is { scrutinee, .. } => collect_calls_expr(scrutinee, generics, inference, call_sites, requested),
        Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } | Expr::Identifier { .. } | Expr::Error { .. } => {}
    }
}

fn type_to_type_expr(ty: &Type) -> TypeExpr {
    match ty {
        Type::Primitive(name) => TypeExpr::Name { name: *name, args: Vec::new(), location: lumina_ir::Location::DUMMY },
        Type::Adt(name, params) => {
            TypeExpr::Name { name: *name, args: params.iter().map(type_to_type_expr).collect(), location: lumina_ir::Location::DUMMY }
        }
        Type::Const(value) => TypeExpr::ConstArg { value: *value, location: lumina_ir::Location::DUMMY },
        // Unresolved variables and higher-order function types as a
        // generic/const argument are not exercised by the surface
        // language's call sites; fall back to `any` rather than fail.
        Type::Var(_) | Type::Function(_, _) | Type::Scheme(_, _, _) => {
            TypeExpr::Name { name: Symbol::intern("any"), args: Vec::new(), location: lumina_ir::Location::DUMMY }
        }
    }
}

/// Zips this declaration's type params then const params (declaration
/// order, matching the corresponding ordering fix in `lumina_types`'s
/// `rigid_vars`) against the concrete type arguments inferred at the call
/// site.
fn build_type_subst(decl: &FnDecl, concrete: &[Type]) -> FxHashMap<Symbol, TypeExpr> {
    let names = decl.generics.types.iter().map(|p| p.name).chain(decl.generics.consts.iter().map(|p| p.name));
    names.zip(concrete.iter()).map(|(name, t)| (name, type_to_type_expr(t))).collect()
}

struct RewriteCtx<'a> {
    call_site_specialization: &'a FxHashMap<String, Symbol>,
    type_subst: &'a FxHashMap<Symbol, TypeExpr>,
}

fn rewrite_type_expr(ty: &TypeExpr, ctx: &RewriteCtx) -> TypeExpr {
    match ty {
        TypeExpr::Name { name, args, location } => {
            if args.is_empty() {
                if let Some(replacement) = ctx.type_subst.get(name) {
                    return replacement.clone();
                }
            }
            TypeExpr::Name { name: *name, args: args.iter().map(|a| rewrite_type_expr(a, ctx)).collect(), location: *location }
        }
        TypeExpr::ConstArg { .. } | TypeExpr::Hole(_) => ty.clone(),
    }
}

fn specialize_fn_decl(decl: &FnDecl, concrete: &[Type], name: Symbol, call_site_specialization: &FxHashMap<String, Symbol>) -> FnDecl {
    let subst = build_type_subst(decl, concrete);
    let ctx = RewriteCtx { call_site_specialization, type_subst: &subst };
    FnDecl {
        name,
        generics: GenericParams::default(),
        params: decl
            .params
            .iter()
            .map(|p| Param { name: p.name, ty: rewrite_type_expr(&p.ty, &ctx), is_ref: p.is_ref, location: p.location })
            .collect(),
        return_type: decl.return_type.as_ref().map(|t| rewrite_type_expr(t, &ctx)),
        body: rewrite_block(&decl.body, &ctx),
        visibility: decl.visibility,
        extern_: decl.extern_,
        location: decl.location,
    }
}

fn rewrite_item(item: &Stmt, ctx: &RewriteCtx) -> Stmt {
    match item {
        Stmt::FnDecl(f) => Stmt::FnDecl(FnDecl { body: rewrite_block(&f.body, ctx), ..f.clone() }),
        Stmt::ImplDecl(impl_decl) => Stmt::ImplDecl(ImplDecl {
            methods: impl_decl.methods.iter().map(|m| FnDecl { body: rewrite_block(&m.body, ctx), ..m.clone() }).collect(),
            ..impl_decl.clone()
        }),
        Stmt::Let(_) | Stmt::Assign(_) | Stmt::Return(_) | Stmt::ExprStmt(_) | Stmt::Block(_) | Stmt::If(_) | Stmt::While(_) | Stmt::MatchStmt(_) => {
            rewrite_stmt(item, ctx)
        }
        Stmt::TypeDecl(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TraitDecl(_) | Stmt::Import(_) | Stmt::ErrorNode { .. } => item.clone(),
    }
}

fn rewrite_block(block: &Block, ctx: &RewriteCtx) -> Block {
    Block { stmts: block.stmts.iter().map(|s| rewrite_stmt(s, ctx)).collect(), location: block.location }
}

fn rewrite_stmt(stmt: &Stmt, ctx: &RewriteCtx) -> Stmt {
    match stmt {
        Stmt::Let(l) => Stmt::Let(Let {
            name: l.name,
            mutable: l.mutable,
            ty: l.ty.as_ref().map(|t| rewrite_type_expr(t, ctx)),
            value: rewrite_expr(&l.value, ctx),
            location: l.location,
        }),
        Stmt::Assign(a) => Stmt::Assign(Assign { target: rewrite_expr(&a.target, ctx), value: rewrite_expr(&a.value, ctx), location: a.location }),
        Stmt::Return(r) => Stmt::Return(Return { value: r.value.as_ref().map(|v| rewrite_expr(v, ctx)), location: r.location }),
        Stmt::ExprStmt(e) => Stmt::ExprStmt(ExprStmt { expr: rewrite_expr(&e.expr, ctx), location: e.location }),
        Stmt::Block(b) => Stmt::Block(rewrite_block(b, ctx)),
        Stmt::If(i) => Stmt::If(If {
            cond: rewrite_expr(&i.cond, ctx),
            then_branch: rewrite_block(&i.then_branch, ctx),
            else_branch: i.else_branch.as_ref().map(|e| Box::new(rewrite_stmt(e, ctx))),
            location: i.location,
        }),
        Stmt::While(w) => Stmt::While(While { cond: rewrite_expr(&w.cond, ctx), body: rewrite_block(&w.body, ctx), location: w.location }),
        Stmt::MatchStmt(m) => Stmt::MatchStmt(MatchStmt {
            scrutinee: rewrite_expr(&m.scrutinee, ctx),
            arms: m
                .arms
                .iter()
                .map(|a| MatchStmtArm { pattern: a.pattern.clone(), body: rewrite_block(&a.body, ctx), location: a.location })
                .collect(),
            location: m.location,
        }),
        Stmt::FnDecl(_) | Stmt::ImplDecl(_) | Stmt::TypeDecl(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TraitDecl(_) | Stmt::Import(_) | Stmt::ErrorNode { .. } => {
            stmt.clone()
        }
    }
}

fn rewrite_expr(expr: &Expr, ctx: &RewriteCtx) -> Expr {
    match expr {
        Expr::Binary { op, left, right, location } => {
            Expr::Binary { op: op.clone(), left: Box::new(rewrite_expr(left, ctx)), right: Box::new(rewrite_expr(right, ctx)), location: *location }
        }
        Expr::Call { qualifier, callee, type_args, args, location } => {
            let rewritten_args = args.iter().map(|a| rewrite_expr(a, ctx)).collect();
            if qualifier.is_none() {
                if let Some(specialized) = ctx.call_site_specialization.get(&location.key()) {
                    return Expr::Call { qualifier: None, callee: *specialized, type_args: Vec::new(), args: rewritten_args, location: *location };
                }
            }
            Expr::Call {
                qualifier: *qualifier,
                callee: *callee,
                type_args: type_args.iter().map(|t| rewrite_type_expr(t, ctx)).collect(),
                args: rewritten_args,
                location: *location,
            }
        }
        Expr::Member { object, member, location } => Expr::Member { object: Box::new(rewrite_expr(object, ctx)), member: *member, location: *location },
        Expr::Index { object, index, location } => {
            Expr::Index { object: Box::new(rewrite_expr(object, ctx)), index: Box::new(rewrite_expr(index, ctx)), location: *location }
        }
        Expr::StructLiteral { name, fields, location } => Expr::StructLiteral {
            name: *name,
            fields: fields.iter().map(|f| StructField { name: f.name, value: Box::new(rewrite_expr(&f.value, ctx)) }).collect(),
            location: *location,
        },
        Expr::Enum { enum_name, variant, args, location } => {
            Expr::Enum { enum_name: *enum_name, variant: *variant, args: args.iter().map(|a| rewrite_expr(a, ctx)).collect(), location: *location }
        }
        Expr::Match { scrutinee, arms, location } => Expr::Match {
            scrutinee: Box::new(rewrite_expr(scrutinee, ctx)),
            arms: arms.iter().map(|a| MatchArm { pattern: a.pattern.clone(), body: Box::new(rewrite_expr(&a.body, ctx)), location: a.location }).collect(),
            location: *location,
        },
        Expr::Is { scrutinee, enum_name, variant, location } => {
            Expr::Is { scrutinee: Box::new(rewrite_expr(scrutinee, ctx)), enum_name: *enum_name, variant: *variant, location: *location }
        }
        Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } | Expr::Identifier { .. } | Expr::Error { .. } => expr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;
    use lumina_types::InferEngine;

    fn mono(src: &str) -> MonoResult {
        let program = parse(src).unwrap();
        let mut engine = InferEngine::new();
        let inference = engine.infer_program(&program);
        monomorphize(&program, inference)
    }

    fn fn_names(program: &LuminaProgram) -> Vec<String> {
        program.items.iter().filter_map(|i| if let Stmt::FnDecl(f) = i { Some(f.name.to_string()) } else { None }).collect()
    }

    #[test]
    fn s1_pipe_and_generics_specializes_double_int() {
        let result = mono(
            "fn double<T>(x:T,f:fn(T)->T)->T { f(x) } fn inc(x:int)->int { x+1 } fn main()->int { return 3 |> double(inc); }",
        );
        let names = fn_names(&result.program);
        assert!(names.contains(&"double_int".to_string()), "names: {names:?}");
        assert!(!names.contains(&"double".to_string()));
    }

    #[test]
    fn s5_const_generic_specializes_distinct_instantiations() {
        let result = mono(
            "fn zeros<T, const N: usize>(x:T)->T { x } \
             fn main()->int { let a = zeros<i32,3>(1); let b = zeros<i32,5>(2); 0 }",
        );
        let names = fn_names(&result.program);
        assert!(names.contains(&"zeros_i32_3".to_string()), "names: {names:?}");
        assert!(names.contains(&"zeros_i32_5".to_string()), "names: {names:?}");
        assert!(!names.contains(&"zeros".to_string()));
    }

    #[test]
    fn non_generic_program_is_returned_unchanged_in_shape() {
        let result = mono("fn inc(x:int)->int { x + 1 } fn main()->int { inc(1) }");
        assert_eq!(fn_names(&result.program), vec!["inc".to_string(), "main".to_string()]);
    }
}
