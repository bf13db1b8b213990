//! Constant propagation, constant folding, and algebraic simplification
//! (§4.8 steps 1-3).

use lumina_ir::ast::BinaryOp;
use lumina_ir::ir::{IrExpr, IrStmt};
use lumina_ir::Symbol;
use rustc_hash::FxHashMap;

#[derive(Clone, Debug, PartialEq)]
enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Literal {
    fn into_expr(self, location: lumina_ir::Location) -> IrExpr {
        match self {
            Literal::Number(value) => IrExpr::Number { value, location },
            Literal::String(value) => IrExpr::String { value, location },
            Literal::Boolean(value) => IrExpr::Boolean { value, location },
        }
    }

    fn from_expr(expr: &IrExpr) -> Option<Literal> {
        match expr {
            IrExpr::Number { value, .. } => Some(Literal::Number(*value)),
            IrExpr::String { value, .. } => Some(Literal::String(value.clone())),
            IrExpr::Boolean { value, .. } => Some(Literal::Boolean(*value)),
            _ => None,
        }
    }
}

/// Runs constant propagation + folding + algebraic simplification over one
/// straight-line statement list. A local `name -> literal` map is
/// populated by `Let`s whose RHS is a literal (§4.8 step 1) and
/// invalidated the moment that name is reassigned or redeclared with a
/// non-literal value, matching the spec's "invalidated by reassignments."
pub fn fold_stmts(stmts: Vec<IrStmt>) -> Vec<IrStmt> {
    let mut known = FxHashMap::default();
    stmts.into_iter().map(|stmt| fold_stmt(stmt, &mut known)).collect()
}

fn fold_stmt(stmt: IrStmt, known: &mut FxHashMap<Symbol, Literal>) -> IrStmt {
    match stmt {
        IrStmt::Let { name, value, location } => {
            let value = fold_expr(value, known);
            match Literal::from_expr(&value) {
                Some(lit) => {
                    known.insert(name, lit);
                }
                None => {
                    known.remove(&name);
                }
            }
            IrStmt::Let { name, value, location }
        }
        IrStmt::Phi { name, condition, then_value, else_value, location } => {
            known.remove(&name);
            IrStmt::Phi {
                name,
                condition: Box::new(fold_expr(*condition, known)),
                then_value: Box::new(fold_expr(*then_value, known)),
                else_value: Box::new(fold_expr(*else_value, known)),
                location,
            }
        }
        IrStmt::Return { value, location } => IrStmt::Return { value: value.map(|v| fold_expr(v, known)), location },
        IrStmt::ExprStmt { expr, location } => IrStmt::ExprStmt { expr: fold_expr(expr, known), location },
        IrStmt::If { cond, then_branch, else_branch, location } => IrStmt::If {
            cond: fold_expr(cond, known),
            then_branch: fold_branch(then_branch, known),
            else_branch: fold_branch(else_branch, known),
            location,
        },
        IrStmt::While { cond, body, location } => {
            let cond = fold_expr(cond, known);
            IrStmt::While { cond, body: fold_branch(body, known), location }
        }
        IrStmt::Assign { target, value, location } => {
            // An assignment to a plain identifier invalidates whatever was
            // known about it; assignment through a member/index doesn't
            // touch the constant map at all.
            if let IrExpr::Identifier { name, .. } = &target {
                known.remove(name);
            }
            IrStmt::Assign { target: fold_expr(target, known), value: fold_expr(value, known), location }
        }
        IrStmt::Noop { location } => IrStmt::Noop { location },
    }
}

/// Branches get their own constant map copy: a binding made conditionally
/// must not leak as "known" past the branch that made it, since the other
/// branch (or skipping the branch) might not have run.
fn fold_branch(stmts: Vec<IrStmt>, known: &FxHashMap<Symbol, Literal>) -> Vec<IrStmt> {
    let mut inner = known.clone();
    stmts.into_iter().map(|s| fold_stmt(s, &mut inner)).collect()
}

fn fold_expr(expr: IrExpr, known: &FxHashMap<Symbol, Literal>) -> IrExpr {
    match expr {
        IrExpr::Identifier { name, location } => match known.get(&name) {
            Some(lit) => lit.clone().into_expr(location),
            None => IrExpr::Identifier { name, location },
        },
        IrExpr::Binary { op, left, right, location } => {
            let left = fold_expr(*left, known);
            let right = fold_expr(*right, known);
            fold_binary(op, left, right, location)
        }
        IrExpr::Cast { expr, target_type, location } => IrExpr::Cast { expr: Box::new(fold_expr(*expr, known)), target_type, location },
        IrExpr::Call { callee, args, location } => {
            IrExpr::Call { callee: Box::new(fold_expr(*callee, known)), args: args.into_iter().map(|a| fold_expr(a, known)).collect(), location }
        }
        IrExpr::Member { object, member, location } => IrExpr::Member { object: Box::new(fold_expr(*object, known)), member, location },
        IrExpr::Index { object, index, location } => {
            IrExpr::Index { object: Box::new(fold_expr(*object, known)), index: Box::new(fold_expr(*index, known)), location }
        }
        IrExpr::Enum { tag, values, location } => IrExpr::Enum { tag, values: values.into_iter().map(|v| fold_expr(v, known)).collect(), location },
        IrExpr::Match { value, arms, location } => IrExpr::Match {
            value: Box::new(fold_expr(*value, known)),
            arms: arms
                .into_iter()
                .map(|arm| lumina_ir::ir::IrMatchArm { body: Box::new(fold_expr(*arm.body, known)), ..arm })
                .collect(),
            location,
        },
        IrExpr::StructLiteral { name, fields, location } => {
            IrExpr::StructLiteral { name, fields: fields.into_iter().map(|(n, v)| (n, fold_expr(v, known))).collect(), location }
        }
        IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } => expr,
    }
}

/// §4.8 step 2 (folding literal operands) fused with step 3 (algebraic
/// identities over a literal/variable mix), since both only ever fire once
/// the operands have already been reduced as far as constant propagation
/// can take them.
fn fold_binary(op: BinaryOp, left: IrExpr, right: IrExpr, location: lumina_ir::Location) -> IrExpr {
    if let (Some(l), Some(r)) = (Literal::from_expr(&left), Literal::from_expr(&right)) {
        if let Some(folded) = fold_literal_pair(&op, &l, &r) {
            return folded.into_expr(location);
        }
    }
    if let Some(simplified) = algebraic_identity(&op, &left, &right) {
        return simplified;
    }
    IrExpr::Binary { op, left: Box::new(left), right: Box::new(right), location }
}

fn fold_literal_pair(op: &BinaryOp, l: &Literal, r: &Literal) -> Option<Literal> {
    match (l, r) {
        (Literal::Number(a), Literal::Number(b)) => fold_numeric(op, *a, *b),
        // String `+` is concatenation; it must never fall into the numeric
        // fold path above (§4.9 "Strings ... string×string concatenation
        // never falls into numeric fold" — the same rule applies one phase
        // earlier, at constant-folding time).
        (Literal::String(a), Literal::String(b)) if matches!(op, BinaryOp::Add) => Some(Literal::String(format!("{a}{b}"))),
        (Literal::String(a), Literal::String(b)) => fold_string_compare(op, a, b),
        (Literal::Boolean(a), Literal::Boolean(b)) => fold_bool(op, *a, *b),
        _ => None,
    }
}

fn fold_numeric(op: &BinaryOp, a: f64, b: f64) -> Option<Literal> {
    match op {
        BinaryOp::Add => Some(Literal::Number(a + b)),
        BinaryOp::Sub => Some(Literal::Number(a - b)),
        BinaryOp::Mul => Some(Literal::Number(a * b)),
        BinaryOp::Div if b != 0.0 => Some(Literal::Number(a / b)),
        BinaryOp::Div => None,
        BinaryOp::Mod if b != 0.0 => Some(Literal::Number(a % b)),
        BinaryOp::Mod => None,
        BinaryOp::Eq => Some(Literal::Boolean(a == b)),
        BinaryOp::Ne => Some(Literal::Boolean(a != b)),
        BinaryOp::Lt => Some(Literal::Boolean(a < b)),
        BinaryOp::Le => Some(Literal::Boolean(a <= b)),
        BinaryOp::Gt => Some(Literal::Boolean(a > b)),
        BinaryOp::Ge => Some(Literal::Boolean(a >= b)),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Pipe => None,
    }
}

fn fold_string_compare(op: &BinaryOp, a: &str, b: &str) -> Option<Literal> {
    match op {
        BinaryOp::Eq => Some(Literal::Boolean(a == b)),
        BinaryOp::Ne => Some(Literal::Boolean(a != b)),
        _ => None,
    }
}

fn fold_bool(op: &BinaryOp, a: bool, b: bool) -> Option<Literal> {
    match op {
        BinaryOp::And => Some(Literal::Boolean(a && b)),
        BinaryOp::Or => Some(Literal::Boolean(a || b)),
        BinaryOp::Eq => Some(Literal::Boolean(a == b)),
        BinaryOp::Ne => Some(Literal::Boolean(a != b)),
        _ => None,
    }
}

/// §4.8 step 3: `x+0`, `0+x`, `x-0`, `x*1`, `1*x`, `x*0`, `0*x`, `x/1`.
/// Only fires when exactly one side is the identity literal and the other
/// is not itself a literal (the all-literal case is already handled by
/// `fold_literal_pair` above).
fn algebraic_identity(op: &BinaryOp, left: &IrExpr, right: &IrExpr) -> Option<IrExpr> {
    let left_zero = is_number(left, 0.0);
    let right_zero = is_number(right, 0.0);
    let left_one = is_number(left, 1.0);
    let right_one = is_number(right, 1.0);
    match op {
        BinaryOp::Add if right_zero => Some(left.clone()),
        BinaryOp::Add if left_zero => Some(right.clone()),
        BinaryOp::Sub if right_zero => Some(left.clone()),
        BinaryOp::Mul if right_one => Some(left.clone()),
        BinaryOp::Mul if left_one => Some(right.clone()),
        BinaryOp::Mul if right_zero || left_zero => Some(IrExpr::Number { value: 0.0, location: left.location() }),
        BinaryOp::Div if right_one => Some(left.clone()),
        _ => None,
    }
}

fn is_number(expr: &IrExpr, value: f64) -> bool {
    matches!(expr, IrExpr::Number { value: v, .. } if *v == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Location;

    fn num(v: f64) -> IrExpr {
        IrExpr::Number { value: v, location: Location::DUMMY }
    }

    #[test]
    fn folds_numeric_addition() {
        let expr = fold_expr(
            IrExpr::Binary { op: BinaryOp::Add, left: Box::new(num(1.0)), right: Box::new(num(2.0)), location: Location::DUMMY },
            &FxHashMap::default(),
        );
        assert_eq!(expr, num(3.0));
    }

    #[test]
    fn string_addition_concatenates_rather_than_numeric_folds() {
        let a = IrExpr::String { value: "a".into(), location: Location::DUMMY };
        let b = IrExpr::String { value: "b".into(), location: Location::DUMMY };
        let expr = fold_expr(IrExpr::Binary { op: BinaryOp::Add, left: Box::new(a), right: Box::new(b), location: Location::DUMMY }, &FxHashMap::default());
        assert_eq!(expr, IrExpr::String { value: "ab".into(), location: Location::DUMMY });
    }

    #[test]
    fn algebraic_identity_x_plus_zero_simplifies_to_x() {
        let x = IrExpr::Identifier { name: Symbol::intern("x"), location: Location::DUMMY };
        let expr = fold_expr(
            IrExpr::Binary { op: BinaryOp::Add, left: Box::new(x.clone()), right: Box::new(num(0.0)), location: Location::DUMMY },
            &FxHashMap::default(),
        );
        assert_eq!(expr, x);
    }

    #[test]
    fn division_by_zero_is_not_folded() {
        let expr = fold_expr(
            IrExpr::Binary { op: BinaryOp::Div, left: Box::new(num(1.0)), right: Box::new(num(0.0)), location: Location::DUMMY },
            &FxHashMap::default(),
        );
        assert!(matches!(expr, IrExpr::Binary { .. }));
    }

    #[test]
    fn propagates_a_let_bound_literal_into_later_use() {
        let stmts = vec![
            IrStmt::Let { name: Symbol::intern("x"), value: num(5.0), location: Location::DUMMY },
            IrStmt::Return {
                value: Some(IrExpr::Identifier { name: Symbol::intern("x"), location: Location::DUMMY }),
                location: Location::DUMMY,
            },
        ];
        let folded = fold_stmts(stmts);
        assert_eq!(folded[1], IrStmt::Return { value: Some(num(5.0)), location: Location::DUMMY });
    }

    #[test]
    fn reassignment_invalidates_the_known_literal() {
        let x = Symbol::intern("x");
        let stmts = vec![
            IrStmt::Let { name: x, value: num(5.0), location: Location::DUMMY },
            IrStmt::Assign { target: IrExpr::Identifier { name: x, location: Location::DUMMY }, value: num(6.0), location: Location::DUMMY },
            IrStmt::Return { value: Some(IrExpr::Identifier { name: x, location: Location::DUMMY }), location: Location::DUMMY },
        ];
        let folded = fold_stmts(stmts);
        // `x` was reassigned to a non-constant-propagated identifier
        // target; the map still records 6.0 was *assigned*, but since
        // `Assign`'s own fold only removes (doesn't re-add) we should not
        // see a stale `5.0` leak through.
        assert_ne!(folded[2], IrStmt::Return { value: Some(num(5.0)), location: Location::DUMMY });
    }
}
