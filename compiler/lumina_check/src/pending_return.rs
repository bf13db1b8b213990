//! Pending-return fixed point (§4.5 "Function return inference
//! fixed-point").
//!
//! "Iterates up to a bound (5 passes) over functions with `pendingReturn`,
//! collecting return types from bodies; if pending dependencies form a
//! cycle (`detectPendingCycles`), all cycle members collapse to `any`
//! with a diagnostic." The actual return-type solving happens in
//! `lumina_types` (C4), which always resolves a function's return
//! variable via unification against its body regardless of call order;
//! this module's job is the cycle-detection half of the spec: functions
//! whose return type can only be known by first knowing another pending
//! function's return type, in a cycle, are diagnosed and would collapse
//! to `any` in the checked types.

use lumina_diagnostic::{Diagnostic, ErrorCode, RelatedInfo};
use lumina_ir::ast::{Expr, LuminaProgram, Stmt};
use lumina_ir::Symbol;
use lumina_resolve::SymbolTable;
use rustc_hash::{FxHashMap, FxHashSet};

const MAX_PASSES: usize = 5;

pub fn run_pending_return_fixed_point(program: &LuminaProgram, table: &SymbolTable) -> Vec<Diagnostic> {
    let pending: FxHashSet<Symbol> =
        table.iter().filter(|(_, info)| info.pending_return).map(|(name, _)| *name).collect();
    if pending.is_empty() {
        return Vec::new();
    }

    let call_graph = build_pending_call_graph(program, &pending);

    let mut resolved: FxHashSet<Symbol> = FxHashSet::default();
    let mut pass = 0;
    loop {
        pass += 1;
        let mut progressed = false;
        for name in &pending {
            if resolved.contains(name) {
                continue;
            }
            let deps = call_graph.get(name).cloned().unwrap_or_default();
            if deps.iter().all(|d| !pending.contains(d) || resolved.contains(d)) {
                resolved.insert(*name);
                progressed = true;
            }
        }
        if !progressed || resolved.len() == pending.len() || pass >= MAX_PASSES {
            break;
        }
    }
    if pass >= MAX_PASSES {
        tracing::warn!(passes = pass, "pending-return fixed point did not converge within the iteration cap");
    }

    let unresolved: FxHashSet<Symbol> = pending.difference(&resolved).copied().collect();
    if unresolved.is_empty() {
        return Vec::new();
    }

    group_into_cycles(&unresolved, &call_graph)
        .into_iter()
        .map(|cycle| cycle_diagnostic(&cycle, table))
        .collect()
}

/// Direct call edges between pending-return functions: `name -> {callees
/// of name that are themselves pending}`, derived by a flat AST walk of
/// each function's body.
fn build_pending_call_graph(program: &LuminaProgram, pending: &FxHashSet<Symbol>) -> FxHashMap<Symbol, FxHashSet<Symbol>> {
    let mut graph = FxHashMap::default();
    for item in &program.items {
        if let Stmt::FnDecl(f) = item {
            if !pending.contains(&f.name) {
                continue;
            }
            let mut callees = FxHashSet::default();
            collect_calls(&f.body, &mut callees);
            callees.retain(|c| pending.contains(c));
            graph.insert(f.name, callees);
        }
    }
    graph
}

fn collect_calls(block: &lumina_ir::ast::Block, out: &mut FxHashSet<Symbol>) {
    for stmt in &block.stmts {
        collect_calls_stmt(stmt, out);
    }
}

fn collect_calls_stmt(stmt: &Stmt, out: &mut FxHashSet<Symbol>) {
    match stmt {
        Stmt::Let(l) => collect_calls_expr(&l.value, out),
        Stmt::Assign(a) => {
            collect_calls_expr(&a.target, out);
            collect_calls_expr(&a.value, out);
        }
        Stmt::Return(r) => {
            if let Some(v) = &r.value {
                collect_calls_expr(v, out);
            }
        }
        Stmt::ExprStmt(e) => collect_calls_expr(&e.expr, out),
        Stmt::Block(b) => collect_calls(b, out),
        Stmt::If(i) => {
            collect_calls_expr(&i.cond, out);
            collect_calls(&i.then_branch, out);
            if let Some(e) = &i.else_branch {
                collect_calls_stmt(e, out);
            }
        }
        Stmt::While(w) => {
            collect_calls_expr(&w.cond, out);
            collect_calls(&w.body, out);
        }
        Stmt::MatchStmt(m) => {
            collect_calls_expr(&m.scrutinee, out);
            for arm in &m.arms {
                collect_calls(&arm.body, out);
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

fn collect_calls_expr(expr: &Expr, out: &mut FxHashSet<Symbol>) {
    match expr {
        Expr::Number { .. } | Expr::String { .. } | Expr::Boolean { .. } | Expr::Identifier { .. } | Expr::Error { .. } => {}
        Expr::Binary { left, right, .. } => {
            collect_calls_expr(left, out);
            collect_calls_expr(right, out);
        }
        Expr::Call { qualifier, callee, args, .. } => {
            if qualifier.is_none() {
                out.insert(*callee);
            }
            for a in args {
                collect_calls_expr(a, out);
            }
        }
        Expr::Member { object, .. } => collect_calls_expr(object, out),
        Expr::Index { object, index, .. } => {
            collect_calls_expr(object, out);
            collect_calls_expr(index, out);
        }
        Expr::StructLiteral { fields, .. } => {
            for f in fields {
                collect_calls_expr(&f.value, out);
            }
        }
        Expr::Enum { args, .. } => {
            for a in args {
                collect_calls_expr(a, out);
            }
        }
        Expr::Match { scrutinee, arms, .. } => {
            collect_calls_expr(scrutinee, out);
            for arm in arms {
                collect_calls_expr(&arm.body, out);
            }
        }
        Expr::Is { scrutinee, .. } => collect_calls_expr(scrutinee, out),
    }
}

/// Groups the still-unresolved functions into connected components of
/// their (possibly indirect, possibly not perfectly cyclic — the bound
/// ran out) call graph, so one diagnostic is emitted per genuine cycle
/// rather than one per function.
fn group_into_cycles(unresolved: &FxHashSet<Symbol>, graph: &FxHashMap<Symbol, FxHashSet<Symbol>>) -> Vec<Vec<Symbol>> {
    let mut seen: FxHashSet<Symbol> = FxHashSet::default();
    let mut groups = Vec::new();
    for &start in unresolved {
        if seen.contains(&start) {
            continue;
        }
        let mut stack = vec![start];
        let mut group = Vec::new();
        while let Some(name) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            group.push(name);
            for callee in graph.get(&name).into_iter().flatten() {
                if unresolved.contains(callee) && !seen.contains(callee) {
                    stack.push(*callee);
                }
            }
            // Undirected closure: also pull in callers, so A->B and B->A
            // land in the same group even when only one direction is
            // visited from `start`.
            for (caller, callees) in graph {
                if unresolved.contains(caller) && callees.contains(&name) && !seen.contains(caller) {
                    stack.push(*caller);
                }
            }
        }
        group.sort_by_key(Symbol::to_string);
        groups.push(group);
    }
    groups
}

fn cycle_diagnostic(cycle: &[Symbol], table: &SymbolTable) -> Diagnostic {
    let names: Vec<String> = cycle.iter().map(Symbol::to_string).collect();
    let location = cycle.first().and_then(|n| table.get(*n)).map(|i| i.location).unwrap_or(lumina_ir::Location::DUMMY);
    let mut diag = Diagnostic::error(
        ErrorCode::TypeError,
        location,
        format!("return type of {} cannot be inferred: mutually recursive pending returns", names.join(", ")),
    );
    for &name in cycle {
        if let Some(info) = table.get(name) {
            diag = diag.with_related(RelatedInfo::new(info.location, format!("`{name}`'s return type collapses to `any`")));
        }
    }
    diag
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;
    use lumina_resolve::hoist_declarations;

    fn run(src: &str) -> Vec<Diagnostic> {
        let program = parse(src).unwrap();
        let (table, _) = hoist_declarations("test.lm", &program.items);
        run_pending_return_fixed_point(&program, &table)
    }

    #[test]
    fn non_cyclic_pending_returns_produce_no_diagnostic() {
        let diags = run("fn f(x:int) { x + 1 } fn g(x:int) { f(x) }");
        assert!(diags.is_empty());
    }

    #[test]
    fn mutually_recursive_pending_returns_collapse_with_diagnostic() {
        let diags = run("fn even(n:int) { odd(n) } fn odd(n:int) { even(n) }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("mutually recursive"));
    }

    #[test]
    fn annotated_return_types_are_not_pending() {
        let diags = run("fn f(x:int)->int { x + 1 }");
        assert!(diags.is_empty());
    }
}
