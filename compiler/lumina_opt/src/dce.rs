//! Dead-store elimination (§4.8 step 6).
//!
//! A function-local `Let`/`Phi` binding whose name is never read anywhere
//! later in the function is dropped — but only when its right-hand side is
//! provably free of side effects (`IrExpr::is_side_effect_free`), since
//! dropping `let _ = log(x);` would silently delete an observable effect.
//! Top-level `Let`s are never touched: §4.8 carves them out explicitly
//! because a module's top-level bindings can be imported and read by other
//! modules the optimizer never sees.

use lumina_ir::ir::{IrExpr, IrStmt};
use lumina_ir::Symbol;
use rustc_hash::FxHashSet;

/// Runs to a fixpoint: removing one dead `Let` can make an earlier `Let`
/// (the one that only fed the now-removed statement) dead in turn.
pub fn eliminate_dead_stores(mut stmts: Vec<IrStmt>) -> Vec<IrStmt> {
    loop {
        let used = collect_reads(&stmts);
        let before = stmts.len();
        stmts = stmts
            .into_iter()
            .filter(|stmt| !is_dead_store(stmt, &used))
            .map(recurse_into_branches)
            .collect();
        if stmts.len() == before {
            return stmts;
        }
    }
}

fn recurse_into_branches(stmt: IrStmt) -> IrStmt {
    match stmt {
        IrStmt::If { cond, then_branch, else_branch, location } => {
            IrStmt::If { cond, then_branch: eliminate_dead_stores(then_branch), else_branch: eliminate_dead_stores(else_branch), location }
        }
        IrStmt::While { cond, body, location } => IrStmt::While { cond, body: eliminate_dead_stores(body), location },
        other => other,
    }
}

fn is_dead_store(stmt: &IrStmt, used: &FxHashSet<Symbol>) -> bool {
    match stmt {
        IrStmt::Let { name, value, .. } => !used.contains(name) && value.is_side_effect_free(),
        IrStmt::Phi { name, condition, then_value, else_value, .. } => {
            !used.contains(name) && condition.is_side_effect_free() && then_value.is_side_effect_free() && else_value.is_side_effect_free()
        }
        _ => false,
    }
}

fn collect_reads(stmts: &[IrStmt]) -> FxHashSet<Symbol> {
    let mut used = FxHashSet::default();
    for stmt in stmts {
        collect_reads_stmt(stmt, &mut used);
    }
    used
}

fn collect_reads_stmt(stmt: &IrStmt, used: &mut FxHashSet<Symbol>) {
    match stmt {
        IrStmt::Let { value, .. } => collect_reads_expr(value, used),
        IrStmt::Phi { condition, then_value, else_value, .. } => {
            collect_reads_expr(condition, used);
            collect_reads_expr(then_value, used);
            collect_reads_expr(else_value, used);
        }
        IrStmt::Return { value, .. } => {
            if let Some(value) = value {
                collect_reads_expr(value, used);
            }
        }
        IrStmt::ExprStmt { expr, .. } => collect_reads_expr(expr, used),
        IrStmt::If { cond, then_branch, else_branch, .. } => {
            collect_reads_expr(cond, used);
            for s in then_branch {
                collect_reads_stmt(s, used);
            }
            for s in else_branch {
                collect_reads_stmt(s, used);
            }
        }
        IrStmt::While { cond, body, .. } => {
            collect_reads_expr(cond, used);
            for s in body {
                collect_reads_stmt(s, used);
            }
        }
        IrStmt::Assign { target, value, .. } => {
            // The target of `obj.field = value` reads `obj`; a plain
            // `name = value` target does not count as a read of `name`.
            if !matches!(target, IrExpr::Identifier { .. }) {
                collect_reads_expr(target, used);
            }
            collect_reads_expr(value, used);
        }
        IrStmt::Noop { .. } => {}
    }
}

fn collect_reads_expr(expr: &IrExpr, used: &mut FxHashSet<Symbol>) {
    match expr {
        IrExpr::Identifier { name, .. } => {
            used.insert(*name);
        }
        IrExpr::Binary { left, right, .. } => {
            collect_reads_expr(left, used);
            collect_reads_expr(right, used);
        }
        IrExpr::Cast { expr, .. } => collect_reads_expr(expr, used),
        IrExpr::Call { callee, args, .. } => {
            collect_reads_expr(callee, used);
            for arg in args {
                collect_reads_expr(arg, used);
            }
        }
        IrExpr::Member { object, .. } => collect_reads_expr(object, used),
        IrExpr::Index { object, index, .. } => {
            collect_reads_expr(object, used);
            collect_reads_expr(index, used);
        }
        IrExpr::Enum { values, .. } => {
            for v in values {
                collect_reads_expr(v, used);
            }
        }
        IrExpr::Match { value, arms, .. } => {
            collect_reads_expr(value, used);
            for arm in arms {
                collect_reads_expr(&arm.body, used);
            }
        }
        IrExpr::StructLiteral { fields, .. } => {
            for (_, v) in fields {
                collect_reads_expr(v, used);
            }
        }
        IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Location;

    fn ident(s: &str) -> IrExpr {
        IrExpr::Identifier { name: Symbol::intern(s), location: Location::DUMMY }
    }

    fn num(v: f64) -> IrExpr {
        IrExpr::Number { value: v, location: Location::DUMMY }
    }

    #[test]
    fn drops_an_unread_side_effect_free_let() {
        let stmts = vec![
            IrStmt::Let { name: Symbol::intern("x"), value: num(1.0), location: Location::DUMMY },
            IrStmt::Return { value: Some(num(2.0)), location: Location::DUMMY },
        ];
        let result = eliminate_dead_stores(stmts);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn keeps_a_let_whose_rhs_has_a_call() {
        let stmts = vec![
            IrStmt::Let {
                name: Symbol::intern("x"),
                value: IrExpr::Call { callee: Box::new(ident("log")), args: vec![], location: Location::DUMMY },
                location: Location::DUMMY,
            },
            IrStmt::Return { value: Some(num(2.0)), location: Location::DUMMY },
        ];
        let result = eliminate_dead_stores(stmts);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn keeps_a_let_whose_name_is_later_read() {
        let stmts = vec![
            IrStmt::Let { name: Symbol::intern("x"), value: num(1.0), location: Location::DUMMY },
            IrStmt::Return { value: Some(ident("x")), location: Location::DUMMY },
        ];
        let result = eliminate_dead_stores(stmts);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn removes_a_chain_of_lets_that_only_fed_each_other() {
        let stmts = vec![
            IrStmt::Let { name: Symbol::intern("a"), value: num(1.0), location: Location::DUMMY },
            IrStmt::Let { name: Symbol::intern("b"), value: ident("a"), location: Location::DUMMY },
            IrStmt::Return { value: Some(num(0.0)), location: Location::DUMMY },
        ];
        let result = eliminate_dead_stores(stmts);
        assert_eq!(result.len(), 1);
    }
}
