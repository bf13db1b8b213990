//! Branch and match simplification (§4.8 steps 4-5).
//!
//! Runs after [`crate::fold`] so conditions that folded down to a literal
//! boolean are visible here as `IrExpr::Boolean`.

use lumina_ir::ir::{IrExpr, IrStmt};

/// `If(true, then, else)` -> `then`; `If(false, then, else)` -> `else`;
/// `while (false) { ... }` -> dropped entirely. Recurses into whichever
/// branch survives so a literal condition nested two levels deep still
/// collapses in one pass.
pub fn simplify_branches(stmts: Vec<IrStmt>) -> Vec<IrStmt> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        simplify_stmt(stmt, &mut out);
    }
    out
}

fn simplify_stmt(stmt: IrStmt, out: &mut Vec<IrStmt>) {
    match stmt {
        IrStmt::If { cond, then_branch, else_branch, location } => match literal_bool(&cond) {
            Some(true) => out.extend(simplify_branches(then_branch)),
            Some(false) => out.extend(simplify_branches(else_branch)),
            None => out.push(IrStmt::If {
                cond,
                then_branch: simplify_branches(then_branch),
                else_branch: simplify_branches(else_branch),
                location,
            }),
        },
        IrStmt::While { cond, body, location } => {
            if literal_bool(&cond) == Some(false) {
                // Dead loop: drops entirely, matching the dead-store pass's
                // treatment of statements with no observable effect.
            } else {
                out.push(IrStmt::While { cond, body: simplify_branches(body), location });
            }
        }
        other => out.push(other),
    }
}

fn literal_bool(expr: &IrExpr) -> Option<bool> {
    match expr {
        IrExpr::Boolean { value, .. } => Some(*value),
        _ => None,
    }
}

/// Match simplification: a match whose scrutinee is a literal enum
/// construction folds straight to the matching arm's body (or the
/// wildcard arm, or is left alone if no arm can be proven to match). This
/// only ever fires on the rare program that constructs and immediately
/// matches the same enum literal — most matches scrutinize a variable —
/// but it is cheap to check and the spec lists it as its own step.
pub fn simplify_match(expr: IrExpr) -> IrExpr {
    match expr {
        IrExpr::Match { value, arms, location } => {
            let value = Box::new(simplify_match(*value));
            let arms: Vec<_> = arms
                .into_iter()
                .map(|arm| lumina_ir::ir::IrMatchArm { body: Box::new(simplify_match(*arm.body)), ..arm })
                .collect();
            if let IrExpr::Enum { tag, .. } = value.as_ref() {
                let matched = arms
                    .iter()
                    .find(|arm| arm.variant.is_some_and(|v| v == *tag))
                    .or_else(|| arms.iter().find(|arm| arm.variant.is_none()));
                if let Some(arm) = matched {
                    return *arm.body.clone();
                }
            }
            IrExpr::Match { value, arms, location }
        }
        IrExpr::Binary { op, left, right, location } => {
            IrExpr::Binary { op, left: Box::new(simplify_match(*left)), right: Box::new(simplify_match(*right)), location }
        }
        IrExpr::Cast { expr, target_type, location } => IrExpr::Cast { expr: Box::new(simplify_match(*expr)), target_type, location },
        IrExpr::Call { callee, args, location } => {
            IrExpr::Call { callee: Box::new(simplify_match(*callee)), args: args.into_iter().map(simplify_match).collect(), location }
        }
        IrExpr::Member { object, member, location } => IrExpr::Member { object: Box::new(simplify_match(*object)), member, location },
        IrExpr::Index { object, index, location } => {
            IrExpr::Index { object: Box::new(simplify_match(*object)), index: Box::new(simplify_match(*index)), location }
        }
        IrExpr::Enum { tag, values, location } => IrExpr::Enum { tag, values: values.into_iter().map(simplify_match).collect(), location },
        IrExpr::StructLiteral { name, fields, location } => {
            IrExpr::StructLiteral { name, fields: fields.into_iter().map(|(n, v)| (n, simplify_match(v))).collect(), location }
        }
        IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } | IrExpr::Identifier { .. } => expr,
    }
}

/// Applies [`simplify_match`] to every expression position in a statement
/// list, since match expressions can appear nested inside `Let`/`Return`/
/// `ExprStmt`/`Assign` values as well as inside `If`/`While` conditions.
pub fn simplify_match_stmts(stmts: Vec<IrStmt>) -> Vec<IrStmt> {
    stmts
        .into_iter()
        .map(|stmt| match stmt {
            IrStmt::Let { name, value, location } => IrStmt::Let { name, value: simplify_match(value), location },
            IrStmt::Phi { name, condition, then_value, else_value, location } => IrStmt::Phi {
                name,
                condition: Box::new(simplify_match(*condition)),
                then_value: Box::new(simplify_match(*then_value)),
                else_value: Box::new(simplify_match(*else_value)),
                location,
            },
            IrStmt::Return { value, location } => IrStmt::Return { value: value.map(simplify_match), location },
            IrStmt::ExprStmt { expr, location } => IrStmt::ExprStmt { expr: simplify_match(expr), location },
            IrStmt::If { cond, then_branch, else_branch, location } => IrStmt::If {
                cond: simplify_match(cond),
                then_branch: simplify_match_stmts(then_branch),
                else_branch: simplify_match_stmts(else_branch),
                location,
            },
            IrStmt::While { cond, body, location } => IrStmt::While { cond: simplify_match(cond), body: simplify_match_stmts(body), location },
            IrStmt::Assign { target, value, location } => IrStmt::Assign { target: simplify_match(target), value: simplify_match(value), location },
            IrStmt::Noop { location } => IrStmt::Noop { location },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::{Location, Symbol};

    #[test]
    fn drops_a_while_loop_with_a_literal_false_condition() {
        let stmts = vec![IrStmt::While {
            cond: IrExpr::Boolean { value: false, location: Location::DUMMY },
            body: vec![],
            location: Location::DUMMY,
        }];
        assert!(simplify_branches(stmts).is_empty());
    }

    #[test]
    fn collapses_an_if_with_a_literal_true_condition_to_its_then_branch() {
        let then_stmt = IrStmt::Return { value: None, location: Location::DUMMY };
        let stmts = vec![IrStmt::If {
            cond: IrExpr::Boolean { value: true, location: Location::DUMMY },
            then_branch: vec![then_stmt.clone()],
            else_branch: vec![IrStmt::Noop { location: Location::DUMMY }],
            location: Location::DUMMY,
        }];
        let simplified = simplify_branches(stmts);
        assert_eq!(simplified, vec![then_stmt]);
    }

    #[test]
    fn a_match_over_a_literal_enum_collapses_to_the_matching_arm() {
        let tag = Symbol::intern("Red");
        let body = Box::new(IrExpr::Number { value: 1.0, location: Location::DUMMY });
        let expr = IrExpr::Match {
            value: Box::new(IrExpr::Enum { tag, values: vec![], location: Location::DUMMY }),
            arms: vec![lumina_ir::ir::IrMatchArm { variant: Some(tag), bindings: vec![], body, location: Location::DUMMY }],
            location: Location::DUMMY,
        };
        let simplified = simplify_match(expr);
        assert!(matches!(simplified, IrExpr::Number { value, .. } if value == 1.0));
    }
}
