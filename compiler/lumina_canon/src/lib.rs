//! AST → IR lowering (C7, §4.7).
//!
//! "Pure structural rewrite with no fresh type decisions." Runs after the
//! monomorphizer (C6) has already specialized every generic call site, so
//! by the time a program reaches here every name is concrete. This crate:
//!
//! - drops the purely compile-time declarations (`TypeDecl`, `StructDecl`,
//!   `EnumDecl`, `TraitDecl`, `Import`) that have no runtime representation
//!   once monomorphization and checking have consumed them,
//! - flattens nested `Block`s into their parent statement list, since IR
//!   has no `Block` statement node,
//! - expands the pipe operator (`a |> f(args...)` becomes `f(a, args...)`)
//!   at the one point the spec names for it,
//! - desugars `Expr::Is` into the tag comparison it denotes at runtime,
//! - desugars statement-position `match` into a temporary binding plus a
//!   chain of `If`s (IR has no statement-level match node — only the
//!   expression-level `MatchExpr` the spec documents for C9's IIFE/ternary
//!   lowering), and
//! - keeps every originating [`Location`] so C9's source-map builder has
//!   something to build from.

mod lower;

pub use lower::lower_program;

#[cfg(test)]
mod tests {
    use lumina_ir::ir::{IrExpr, IrStmt};
    use lumina_parse::parse;

    use super::lower_program;

    #[test]
    fn drops_type_level_declarations() {
        let program = parse("struct Foo { x: int } fn main()->int { 0 }").unwrap();
        let ir = lower_program(&program);
        assert_eq!(ir.functions.len(), 1);
        assert_eq!(ir.functions[0].name.as_str(), "main");
    }

    #[test]
    fn flattens_nested_blocks() {
        let program = parse("fn main()->int { { let x = 1; } return 0; }").unwrap();
        let ir = lower_program(&program);
        // The inner block's `let` and the outer `return` land in the same
        // flat statement list, not nested inside a `Block` IR node (which
        // doesn't exist).
        assert_eq!(ir.functions[0].body.len(), 2);
        assert!(matches!(ir.functions[0].body[0], IrStmt::Let { .. }));
        assert!(matches!(ir.functions[0].body[1], IrStmt::Return { .. }));
    }

    #[test]
    fn pipe_desugars_into_a_direct_call() {
        let program = parse("fn inc(x:int)->int { x+1 } fn main()->int { return 3 |> inc(); }").unwrap();
        let ir = lower_program(&program);
        let main = &ir.functions[1];
        let IrStmt::Return { value: Some(IrExpr::Call { callee, args, .. }), .. } = &main.body[0] else {
            panic!("expected a return of a call, got {:?}", main.body[0]);
        };
        assert!(matches!(**callee, IrExpr::Identifier { .. }));
        assert_eq!(args.len(), 1);
        assert!(matches!(args[0], IrExpr::Number { value, .. } if value == 3.0));
    }

    #[test]
    fn enum_construction_lowers_to_tagged_values() {
        let program =
            parse("enum Color { Red, Green(int) } fn main()->Color { return Color.Green(1); }").unwrap();
        let ir = lower_program(&program);
        let IrStmt::Return { value: Some(IrExpr::Enum { tag, values, .. }), .. } = &ir.functions[0].body[0] else {
            panic!("expected a return of an enum literal");
        };
        assert_eq!(tag.as_str(), "Green");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn is_expression_lowers_to_a_tag_comparison() {
        let program = parse(
            "enum Color { Red, Green } fn main()->bool { let c = Color.Red; return c is Red; }",
        )
        .unwrap();
        let ir = lower_program(&program);
        let IrStmt::Return { value: Some(IrExpr::Binary { op, left, right, .. }), .. } = &ir.functions[0].body[1]
        else {
            panic!("expected a return of a binary comparison");
        };
        assert_eq!(*op, lumina_ir::ast::BinaryOp::Eq);
        assert!(matches!(**left, IrExpr::Member { .. }));
        assert!(matches!(**right, IrExpr::String { .. }));
    }

    #[test]
    fn statement_match_desugars_to_a_temp_and_if_chain() {
        let program = parse(
            "enum Color { Red, Green } fn main()->int { match Color.Red { Red => { return 1; } Green => { return 2; } } return 0; }",
        )
        .unwrap();
        let ir = lower_program(&program);
        let body = &ir.functions[0].body;
        assert!(matches!(body[0], IrStmt::Let { .. }), "expected a hoisted scrutinee temp, got {:?}", body[0]);
        assert!(matches!(body[1], IrStmt::If { .. }), "expected an if-chain, got {:?}", body[1]);
    }

    #[test]
    fn match_expression_lowers_to_the_explicit_match_node() {
        let program = parse(
            "enum Color { Red, Green } fn main()->int { let c = Color.Red; return match c { Red => 1, Green => 2 }; }",
        )
        .unwrap();
        let ir = lower_program(&program);
        let IrStmt::Return { value: Some(IrExpr::Match { arms, .. }), .. } = &ir.functions[0].body[1] else {
            panic!("expected a return of a match expression");
        };
        assert_eq!(arms.len(), 2);
    }

    #[test]
    fn impl_methods_lower_to_mangled_top_level_functions() {
        let program = parse(
            "trait Greet { fn hello()->int; } struct Foo { x: int } impl Greet for Foo { fn hello()->int { 1 } }",
        )
        .unwrap();
        let ir = lower_program(&program);
        assert_eq!(ir.functions.len(), 1);
        assert_eq!(ir.functions[0].name.as_str(), "Foo_hello");
    }

    #[test]
    fn top_level_lets_survive_lowering() {
        let program = parse("let x = 1; fn main()->int { 0 }").unwrap();
        let ir = lower_program(&program);
        assert_eq!(ir.top_level.len(), 1);
        assert!(matches!(ir.top_level[0], IrStmt::Let { .. }));
    }
}
