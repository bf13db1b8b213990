//! Expression AST nodes (§3.1).

use crate::ast::pattern::Pattern;
use crate::ast::ty::TypeExpr;
use crate::interner::Symbol;
use crate::span::Location;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// `a |> f(args...)`, elaborated at inference time (§4.4) into
    /// `f(a, args...)`. Kept as a binary form through parsing and lowering
    /// so that source-order and source-map fidelity are preserved until
    /// the point the spec says it is desugared.
    Pipe,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Box<Expr>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    pub name: Symbol,
    pub value: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Number { value: f64, location: Location },
    String { value: String, location: Location },
    Boolean { value: bool, location: Location },
    Identifier { name: Symbol, location: Location },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: Location,
    },

    /// A call, optionally qualified as `enumName.variant(...)`, with
    /// optional explicit type arguments (`f::<int>(x)` surface form,
    /// `f<int>(x)` in the grammar the spec documents).
    Call {
        qualifier: Option<Symbol>,
        callee: Symbol,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
        location: Location,
    },

    Member {
        object: Box<Expr>,
        member: Symbol,
        location: Location,
    },

    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        location: Location,
    },

    StructLiteral {
        name: Symbol,
        fields: Vec<StructField>,
        location: Location,
    },

    /// `EnumName.Variant(args...)` constructed as a value, distinct from a
    /// qualified `Call` to keep enum construction and module/function calls
    /// syntactically distinguishable until C5 resolves the qualifier
    /// (§4.5: "Module-namespace resolution precedes enum-variant
    /// fallback").
    Enum {
        enum_name: Option<Symbol>,
        variant: Symbol,
        args: Vec<Expr>,
        location: Location,
    },

    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
        location: Location,
    },

    /// `x is Variant`, a runtime variant test usable both as a boolean
    /// expression and as a narrowing condition (§4.5 "Narrowing").
    Is {
        scrutinee: Box<Expr>,
        enum_name: Option<Symbol>,
        variant: Symbol,
        location: Location,
    },

    Error { location: Location },
}

impl Expr {
    pub fn location(&self) -> Location {
        match self {
            Expr::Number { location, .. }
            | Expr::String { location, .. }
            | Expr::Boolean { location, .. }
            | Expr::Identifier { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Call { location, .. }
            | Expr::Member { location, .. }
            | Expr::Index { location, .. }
            | Expr::StructLiteral { location, .. }
            | Expr::Enum { location, .. }
            | Expr::Match { location, .. }
            | Expr::Is { location, .. }
            | Expr::Error { location } => *location,
        }
    }
}
