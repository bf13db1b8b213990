//! Abstract syntax tree, produced by `lumina_parse` (C1) and consumed up
//! through `lumina_canon` (C7) — see `spec.md` §3.1.

pub mod expr;
pub mod pattern;
pub mod stmt;
pub mod ty;

pub use expr::{BinaryOp, Expr, MatchArm, StructField};
pub use pattern::Pattern;
pub use stmt::{
    Assign, Block, EnumDecl, EnumVariant, ExprStmt, FieldDecl, FnDecl, If, ImplDecl, Import,
    ImportKind, Let, MatchStmt, MatchStmtArm, Param, Return, Stmt, StructDecl, TraitDecl,
    TraitMethod, TypeDecl, Visibility, While,
};
pub use ty::{ConstParam, GenericParams, TypeExpr, TypeHole, TypeParam};

/// A whole parsed compilation unit (`spec.md` §4.1: "Yields a
/// `LuminaProgram`").
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LuminaProgram {
    pub items: Vec<Stmt>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Location;

    #[test]
    fn type_decl_rejects_extern_with_fields() {
        let decl = TypeDecl {
            name: "Foo".into(),
            generics: GenericParams::default(),
            alias: None,
            fields: vec![FieldDecl {
                name: "x".into(),
                ty: TypeExpr::Name { name: "int".into(), args: vec![], location: Location::DUMMY },
                location: Location::DUMMY,
            }],
            extern_: true,
            visibility: Visibility::Public,
            location: Location::DUMMY,
        };
        assert!(!decl.validate());
    }
}
