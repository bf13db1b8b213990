//! Statement and item AST nodes (§3.1).

use crate::ast::expr::Expr;
use crate::ast::pattern::Pattern;
use crate::ast::ty::{GenericParams, TypeExpr};
use crate::interner::Symbol;
use crate::span::Location;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub is_ref: bool,
    pub location: Location,
}

/// `Function.body` is always a [`Block`] — one of the invariants of §3.1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FnDecl {
    pub name: Symbol,
    pub generics: GenericParams,
    pub params: Vec<Param>,
    /// `None` means the declaration omitted a return annotation; C3 marks
    /// the symbol `pendingReturn = true` in that case (§4.3).
    pub return_type: Option<TypeExpr>,
    pub body: Block,
    pub visibility: Visibility,
    pub extern_: bool,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub location: Location,
}

/// A `type` declaration. May be a plain alias (`alias` set), a struct-like
/// inline record (`fields` non-empty), or an opaque `extern` type. The
/// invariant "a `TypeDecl` cannot be both extern and define fields" is
/// enforced by [`TypeDecl::validate`], called by the parser adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: Symbol,
    pub generics: GenericParams,
    pub alias: Option<TypeExpr>,
    pub fields: Vec<FieldDecl>,
    pub extern_: bool,
    pub visibility: Visibility,
    pub location: Location,
}

impl TypeDecl {
    /// Returns `false` if the extern/fields invariant is violated; the
    /// parser adapter turns a failing declaration into an `ErrorNode` plus
    /// a diagnostic rather than constructing an inconsistent `TypeDecl`.
    pub fn validate(&self) -> bool {
        !(self.extern_ && !self.fields.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDecl {
    pub name: Symbol,
    pub generics: GenericParams,
    pub fields: Vec<FieldDecl>,
    pub visibility: Visibility,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: Symbol,
    pub params: Vec<TypeExpr>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: Symbol,
    pub generics: GenericParams,
    pub variants: Vec<EnumVariant>,
    pub visibility: Visibility,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraitMethod {
    pub name: Symbol,
    pub params: Vec<TypeExpr>,
    pub return_type: Option<TypeExpr>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraitDecl {
    pub name: Symbol,
    pub methods: Vec<TraitMethod>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplDecl {
    pub trait_name: Symbol,
    pub target: TypeExpr,
    pub methods: Vec<FnDecl>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Let {
    pub name: Symbol,
    pub mutable: bool,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assign {
    pub target: Expr,
    pub value: Expr,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Return {
    pub value: Option<Expr>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub location: Location,
}

/// An `else` clause is either another block or an `else if` (itself an
/// `If` statement), threaded through as a boxed statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct If {
    pub cond: Expr,
    pub then_branch: Block,
    pub else_branch: Option<Box<Stmt>>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct While {
    pub cond: Expr,
    pub body: Block,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchStmtArm {
    pub pattern: Pattern,
    pub body: Block,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchStmt {
    pub scrutinee: Expr,
    pub arms: Vec<MatchStmtArm>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// `import * as NS from "spec"` binds `NS -> module`.
    Namespace { alias: Symbol },
    /// `import { a as b, c } from "spec"` binds each item, optionally
    /// renamed.
    Named { items: Vec<(Symbol, Option<Symbol>)> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    pub specifier: String,
    pub kind: ImportKind,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    TypeDecl(TypeDecl),
    StructDecl(StructDecl),
    EnumDecl(EnumDecl),
    TraitDecl(TraitDecl),
    ImplDecl(ImplDecl),
    FnDecl(FnDecl),
    Let(Let),
    Assign(Assign),
    Return(Return),
    ExprStmt(ExprStmt),
    Block(Block),
    If(If),
    While(While),
    MatchStmt(MatchStmt),
    Import(Import),
    ErrorNode { location: Location },
}

impl Stmt {
    pub fn location(&self) -> Location {
        match self {
            Stmt::TypeDecl(d) => d.location,
            Stmt::StructDecl(d) => d.location,
            Stmt::EnumDecl(d) => d.location,
            Stmt::TraitDecl(d) => d.location,
            Stmt::ImplDecl(d) => d.location,
            Stmt::FnDecl(d) => d.location,
            Stmt::Let(d) => d.location,
            Stmt::Assign(d) => d.location,
            Stmt::Return(d) => d.location,
            Stmt::ExprStmt(d) => d.location,
            Stmt::Block(d) => d.location,
            Stmt::If(d) => d.location,
            Stmt::While(d) => d.location,
            Stmt::MatchStmt(d) => d.location,
            Stmt::Import(d) => d.location,
            Stmt::ErrorNode { location } => *location,
        }
    }
}
