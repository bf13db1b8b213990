//! IR validation (§4.8 step 8): the last pass the optimizer runs, checking
//! invariants that should be impossible for a well-formed lowering/earlier
//! optimizer pass to violate. A failure here is always
//! [`ErrorCode::InternalIrInvalid`] — a compiler-bug class, reported as a
//! diagnostic rather than a panic so a driver can surface it without
//! taking the whole process down (§7).

use lumina_diagnostic::{Diagnostic, ErrorCode};
use lumina_ir::ir::{IrExpr, IrFunction, IrMatchArm, IrProgram, IrStmt};
use lumina_ir::Location;
use rustc_hash::FxHashSet;

pub fn validate(program: &IrProgram) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen_names = FxHashSet::default();
    for function in &program.functions {
        if !seen_names.insert(function.name) {
            diagnostics.push(invalid(function.location, format!("duplicate top-level function `{}`", function.name.as_str())));
        }
        validate_function(function, &mut diagnostics);
    }
    diagnostics
}

fn invalid(location: Location, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(ErrorCode::InternalIrInvalid, location, message)
}

fn validate_function(function: &IrFunction, diagnostics: &mut Vec<Diagnostic>) {
    if function.body.is_empty() {
        diagnostics.push(invalid(function.location, format!("function `{}` lowered to an empty body", function.name.as_str())));
        return;
    }
    for stmt in &function.body {
        validate_stmt(stmt, diagnostics);
    }
}

fn validate_stmt(stmt: &IrStmt, diagnostics: &mut Vec<Diagnostic>) {
    match stmt {
        IrStmt::Let { value, .. } => validate_expr(value, diagnostics),
        IrStmt::Phi { condition, then_value, else_value, .. } => {
            validate_expr(condition, diagnostics);
            validate_expr(then_value, diagnostics);
            validate_expr(else_value, diagnostics);
        }
        IrStmt::Return { value, .. } => {
            if let Some(value) = value {
                validate_expr(value, diagnostics);
            }
        }
        IrStmt::ExprStmt { expr, .. } => validate_expr(expr, diagnostics),
        IrStmt::If { cond, then_branch, else_branch, location } => {
            validate_expr(cond, diagnostics);
            if then_branch.is_empty() && else_branch.is_empty() {
                diagnostics.push(invalid(*location, "an `if` with both branches empty should have been simplified away"));
            }
            for s in then_branch {
                validate_stmt(s, diagnostics);
            }
            for s in else_branch {
                validate_stmt(s, diagnostics);
            }
        }
        IrStmt::While { cond, body, .. } => {
            validate_expr(cond, diagnostics);
            for s in body {
                validate_stmt(s, diagnostics);
            }
        }
        IrStmt::Assign { target, value, location } => {
            if !matches!(target, IrExpr::Identifier { .. } | IrExpr::Member { .. } | IrExpr::Index { .. }) {
                diagnostics.push(invalid(*location, "assignment target is not an lvalue shape (identifier, member, or index)"));
            }
            validate_expr(target, diagnostics);
            validate_expr(value, diagnostics);
        }
        IrStmt::Noop { .. } => {}
    }
}

fn validate_expr(expr: &IrExpr, diagnostics: &mut Vec<Diagnostic>) {
    match expr {
        IrExpr::Match { value, arms, location } => {
            validate_expr(value, diagnostics);
            if arms.is_empty() {
                diagnostics.push(invalid(*location, "match expression lowered with zero arms"));
            }
            for arm in arms {
                validate_arm(arm, diagnostics);
            }
        }
        IrExpr::Binary { left, right, .. } => {
            validate_expr(left, diagnostics);
            validate_expr(right, diagnostics);
        }
        IrExpr::Cast { expr, .. } => validate_expr(expr, diagnostics),
        IrExpr::Call { callee, args, .. } => {
            validate_expr(callee, diagnostics);
            for arg in args {
                validate_expr(arg, diagnostics);
            }
        }
        IrExpr::Member { object, .. } => validate_expr(object, diagnostics),
        IrExpr::Index { object, index, .. } => {
            validate_expr(object, diagnostics);
            validate_expr(index, diagnostics);
        }
        IrExpr::Enum { values, .. } => {
            for v in values {
                validate_expr(v, diagnostics);
            }
        }
        IrExpr::StructLiteral { fields, location } => {
            if fields.is_empty() {
                diagnostics.push(invalid(*location, "struct literal lowered with zero fields"));
            }
            for (_, v) in fields {
                validate_expr(v, diagnostics);
            }
        }
        IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } | IrExpr::Identifier { .. } => {}
    }
}

fn validate_arm(arm: &IrMatchArm, diagnostics: &mut Vec<Diagnostic>) {
    if arm.variant.is_none() && !arm.bindings.is_empty() {
        diagnostics.push(invalid(arm.location, "a wildcard match arm should never carry variant bindings"));
    }
    validate_expr(&arm.body, diagnostics);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Symbol;

    #[test]
    fn flags_a_function_lowered_with_an_empty_body() {
        let program = IrProgram {
            functions: vec![IrFunction { name: Symbol::intern("f"), params: vec![], body: vec![], location: Location::DUMMY }],
            top_level: vec![],
            ssa: false,
        };
        let diagnostics = validate(&program);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, ErrorCode::InternalIrInvalid);
    }

    #[test]
    fn flags_duplicate_top_level_function_names() {
        let f = |name| IrFunction {
            name: Symbol::intern(name),
            params: vec![],
            body: vec![IrStmt::Return { value: None, location: Location::DUMMY }],
            location: Location::DUMMY,
        };
        let program = IrProgram { functions: vec![f("main"), f("main")], top_level: vec![], ssa: false };
        let diagnostics = validate(&program);
        assert!(diagnostics.iter().any(|d| d.message.contains("duplicate")));
    }

    #[test]
    fn accepts_a_well_formed_program() {
        let program = IrProgram {
            functions: vec![IrFunction {
                name: Symbol::intern("main"),
                params: vec![],
                body: vec![IrStmt::Return { value: Some(IrExpr::Number { value: 0.0, location: Location::DUMMY }), location: Location::DUMMY }],
                location: Location::DUMMY,
            }],
            top_level: vec![],
            ssa: false,
        };
        assert!(validate(&program).is_empty());
    }
}
