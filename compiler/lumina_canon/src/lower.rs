//! The structural AST → IR rewrite itself (§4.7).

use lumina_ir::ast::{self, BinaryOp, Block, Expr, FnDecl, LuminaProgram, MatchArm, Pattern, Stmt};
use lumina_ir::ir::{CastType, IrExpr, IrFunction, IrMatchArm, IrProgram, IrStmt};
use lumina_ir::{Location, Symbol};

/// Lowers a whole compilation unit. Function declarations (including
/// `impl` methods, flattened to mangled top-level functions) become
/// [`IrFunction`]s; every other top-level statement becomes part of
/// `top_level`; type-only declarations (`TypeDecl`, `StructDecl`,
/// `EnumDecl`, `TraitDecl`, `Import`) have no runtime representation and
/// are dropped.
pub fn lower_program(program: &LuminaProgram) -> IrProgram {
    let mut functions = Vec::new();
    let mut top_level = Vec::new();

    for item in &program.items {
        match item {
            Stmt::FnDecl(f) => functions.push(lower_fn(f.name, f)),
            Stmt::ImplDecl(impl_decl) => {
                let target = target_name(&impl_decl.target);
                for method in &impl_decl.methods {
                    let mangled = Symbol::intern(&format!("{target}_{}", method.name));
                    functions.push(lower_fn(mangled, method));
                }
            }
            Stmt::TypeDecl(_) | Stmt::StructDecl(_) | Stmt::EnumDecl(_) | Stmt::TraitDecl(_) | Stmt::Import(_) => {}
            Stmt::ErrorNode { .. } => {}
            _ => top_level.extend(lower_stmt(item)),
        }
    }

    IrProgram { functions, top_level, ssa: false }
}

fn target_name(ty: &ast::TypeExpr) -> Symbol {
    match ty {
        ast::TypeExpr::Name { name, .. } => *name,
        ast::TypeExpr::ConstArg { .. } | ast::TypeExpr::Hole(_) => Symbol::intern("_"),
    }
}

fn lower_fn(name: Symbol, f: &FnDecl) -> IrFunction {
    IrFunction { name, params: f.params.iter().map(|p| p.name).collect(), body: lower_block(&f.body), location: f.location }
}

fn lower_block(block: &Block) -> Vec<IrStmt> {
    block.stmts.iter().flat_map(lower_stmt).collect()
}

/// Lowers one statement into zero or more `IrStmt`s. Returns a `Vec`
/// rather than a single node because a `Block` flattens into its parent's
/// statement list (IR has no nested-block statement) and a statement-level
/// `match` expands into a hoisted temporary plus an `If` chain.
fn lower_stmt(stmt: &Stmt) -> Vec<IrStmt> {
    match stmt {
        Stmt::Let(l) => vec![IrStmt::Let { name: l.name, value: lower_expr(&l.value), location: l.location }],
        Stmt::Assign(a) => vec![IrStmt::Assign { target: lower_expr(&a.target), value: lower_expr(&a.value), location: a.location }],
        Stmt::Return(r) => vec![IrStmt::Return { value: r.value.as_ref().map(lower_expr), location: r.location }],
        Stmt::ExprStmt(e) => vec![IrStmt::ExprStmt { expr: lower_expr(&e.expr), location: e.location }],
        Stmt::Block(b) => lower_block(b),
        Stmt::If(i) => vec![IrStmt::If {
            cond: lower_expr(&i.cond),
            then_branch: lower_block(&i.then_branch),
            else_branch: i.else_branch.as_deref().map(lower_stmt).unwrap_or_default(),
            location: i.location,
        }],
        Stmt::While(w) => vec![IrStmt::While { cond: lower_expr(&w.cond), body: lower_block(&w.body), location: w.location }],
        Stmt::MatchStmt(m) => lower_match_stmt(m),
        Stmt::TypeDecl(_)
        | Stmt::StructDecl(_)
        | Stmt::EnumDecl(_)
        | Stmt::TraitDecl(_)
        | Stmt::ImplDecl(_)
        | Stmt::FnDecl(_)
        | Stmt::Import(_)
        | Stmt::ErrorNode { .. } => Vec::new(),
    }
}

/// §4.7: statement-position `match` has no direct IR counterpart — `lumina_ir`
/// only models `MatchExpr` at the expression level, reserved for C9's
/// ternary/IIFE lowering of a match used as a *value*. A match used as a
/// *statement* (every arm a `Block`, no result consumed) desugars here into
/// `let tmp = scrutinee; if (tmp.tag === "A") { ...a } else if (tmp.tag ===
/// "B") { ...b } else { ...wildcard }`, which is exactly how C9 would emit
/// it anyway, just one phase earlier.
fn lower_match_stmt(m: &ast::MatchStmt) -> Vec<IrStmt> {
    let tmp = fresh_temp(m.location);
    let scrutinee = lower_expr(&m.scrutinee);
    let mut stmts = vec![IrStmt::Let { name: tmp, value: scrutinee, location: m.location }];
    stmts.extend(build_if_chain(tmp, &m.arms, 0));
    stmts
}

fn build_if_chain(tmp: Symbol, arms: &[ast::MatchStmtArm], idx: usize) -> Vec<IrStmt> {
    let Some(arm) = arms.get(idx) else { return Vec::new() };
    match &arm.pattern {
        Pattern::Wildcard { .. } => arm_prelude(tmp, &arm.pattern, arm.location).into_iter().chain(lower_block(&arm.body)).collect(),
        Pattern::Variant { variant, location, .. } => {
            let cond = tag_eq(tmp, *variant, *location);
            let then_branch = arm_prelude(tmp, &arm.pattern, arm.location).into_iter().chain(lower_block(&arm.body)).collect();
            let else_branch = build_if_chain(tmp, arms, idx + 1);
            vec![IrStmt::If { cond, then_branch, else_branch, location: arm.location }]
        }
    }
}

/// Binds a variant pattern's payload names to `tmp.values[i]` ahead of the
/// arm body, mirroring how `Enum { tag, values }` is destructured at
/// runtime (§4.9 "Enums").
fn arm_prelude(tmp: Symbol, pattern: &Pattern, location: Location) -> Vec<IrStmt> {
    let Pattern::Variant { bindings, .. } = pattern else { return Vec::new() };
    bindings
        .iter()
        .enumerate()
        .map(|(i, name)| IrStmt::Let { name: *name, value: values_index(tmp, i, location), location })
        .collect()
}

fn values_index(tmp: Symbol, i: usize, location: Location) -> IrExpr {
    IrExpr::Index {
        object: Box::new(IrExpr::Member { object: Box::new(IrExpr::Identifier { name: tmp, location }), member: Symbol::intern("values"), location }),
        index: Box::new(IrExpr::Number { value: i as f64, location }),
        location,
    }
}

fn tag_eq(tmp: Symbol, variant: Symbol, location: Location) -> IrExpr {
    IrExpr::Binary {
        op: BinaryOp::Eq,
        left: Box::new(IrExpr::Member { object: Box::new(IrExpr::Identifier { name: tmp, location }), member: Symbol::intern("tag"), location }),
        right: Box::new(IrExpr::String { value: variant.to_string(), location }),
        location,
    }
}

fn lower_expr(expr: &Expr) -> IrExpr {
    match expr {
        Expr::Number { value, location } => IrExpr::Number { value: *value, location: *location },
        Expr::String { value, location } => IrExpr::String { value: value.clone(), location: *location },
        Expr::Boolean { value, location } => IrExpr::Boolean { value: *value, location: *location },
        Expr::Identifier { name, location } => IrExpr::Identifier { name: *name, location: *location },
        Expr::Binary { op: BinaryOp::Pipe, left, right, location } => lower_pipe(left, right, *location),
        Expr::Binary { op, left, right, location } => {
            IrExpr::Binary { op: op.clone(), left: Box::new(lower_expr(left)), right: Box::new(lower_expr(right)), location: *location }
        }
        Expr::Call { qualifier, callee, args, location, .. } => lower_call(qualifier.as_ref(), *callee, args, *location),
        Expr::Member { object, member, location } => IrExpr::Member { object: Box::new(lower_expr(object)), member: *member, location: *location },
        Expr::Index { object, index, location } => {
            IrExpr::Index { object: Box::new(lower_expr(object)), index: Box::new(lower_expr(index)), location: *location }
        }
        Expr::StructLiteral { name, fields, location } => IrExpr::StructLiteral {
            name: *name,
            fields: fields.iter().map(|f| (f.name, lower_expr(&f.value))).collect(),
            location: *location,
        },
        Expr::Enum { variant, args, location, .. } => {
            IrExpr::Enum { tag: *variant, values: args.iter().map(lower_expr).collect(), location: *location }
        }
        Expr::Match { scrutinee, arms, location } => {
            IrExpr::Match { value: Box::new(lower_expr(scrutinee)), arms: arms.iter().map(lower_match_arm).collect(), location: *location }
        }
        Expr::Is { scrutinee, variant, location, .. } => lower_is(scrutinee, *variant, *location),
        Expr::Error { location } => IrExpr::Identifier { name: Symbol::intern("undefined"), location: *location },
    }
}

fn lower_match_arm(arm: &MatchArm) -> IrMatchArm {
    let (variant, bindings) = match &arm.pattern {
        Pattern::Variant { variant, bindings, .. } => (Some(*variant), bindings.clone()),
        Pattern::Wildcard { .. } => (None, Vec::new()),
    };
    IrMatchArm { variant, bindings, body: Box::new(lower_expr(&arm.body)), location: arm.location }
}

/// `x is Variant` denotes the same runtime tag test a match arm performs;
/// lowered eagerly here rather than deferred to C9 so both forms share one
/// code path downstream.
fn lower_is(scrutinee: &Expr, variant: Symbol, location: Location) -> IrExpr {
    IrExpr::Binary {
        op: BinaryOp::Eq,
        left: Box::new(IrExpr::Member { object: Box::new(lower_expr(scrutinee)), member: Symbol::intern("tag"), location }),
        right: Box::new(IrExpr::String { value: variant.to_string(), location }),
        location,
    }
}

/// §4.4/§4.7: `a |> f(args...)` elaborates to `f(a, args...)`. Inference
/// (C4) already type-checks the desugared form; this is the point the spec
/// names for actually rewriting the tree.
fn lower_pipe(left: &Expr, right: &Expr, location: Location) -> IrExpr {
    match right {
        Expr::Call { qualifier, callee, args, .. } => {
            let mut lowered_args = Vec::with_capacity(args.len() + 1);
            lowered_args.push(lower_expr(left));
            lowered_args.extend(args.iter().map(lower_expr));
            IrExpr::Call { callee: Box::new(callee_expr(qualifier.as_ref(), *callee, location)), args: lowered_args, location }
        }
        // A malformed pipe RHS is only reachable on input C5 has already
        // diagnosed; fall back to the right-hand side alone rather than
        // panicking.
        other => lower_expr(other),
    }
}

fn callee_expr(qualifier: Option<&Symbol>, callee: Symbol, location: Location) -> IrExpr {
    match qualifier {
        Some(q) => {
            IrExpr::Member { object: Box::new(IrExpr::Identifier { name: *q, location }), member: callee, location }
        }
        None => IrExpr::Identifier { name: callee, location },
    }
}

fn lower_call(qualifier: Option<&Symbol>, callee: Symbol, args: &[Expr], location: Location) -> IrExpr {
    IrExpr::Call { callee: Box::new(callee_expr(qualifier, callee, location)), args: args.iter().map(lower_expr).collect(), location }
}

/// Cast helper retained for completeness of the `CastType` surface (§4.9);
/// surface syntax for numeric casts is a qualified call (`i32.cast(x)` in
/// this grammar) resolved by C5/C4 before lowering, so this crate only
/// needs to know how to build the node once a target is known. Exposed for
/// `lumina_codegen` and any future cast-call desugaring in this crate.
pub fn cast(expr: IrExpr, target_type: CastType, location: Location) -> IrExpr {
    IrExpr::Cast { expr: Box::new(expr), target_type, location }
}

static TEMP_COUNTER: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);

/// SSA-shaped temp name (`/_\d+$/`, per `IrProgram::ssa`'s doc comment) for
/// a scrutinee hoisted out of statement position.
fn fresh_temp(_location: Location) -> Symbol {
    let id = TEMP_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    Symbol::intern(&format!("_match_{id}"))
}
