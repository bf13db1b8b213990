//! Intermediate representation (§3.4), produced by `lumina_canon` (C7),
//! rewritten by `lumina_opt` (C8), and consumed by `lumina_codegen` (C9).
//!
//! IR is a narrower tree than the AST: no generics, no type holes, no
//! pipe operator (already desugared), and an explicit `Phi` node for
//! SSA-hoisted branch merges. Every node keeps its originating
//! [`Location`] so source maps (§4.9) can be built straight from IR.

use crate::ast::BinaryOp;
use crate::interner::Symbol;
use crate::span::Location;

/// Numeric cast target, driving §4.9's cast lowering rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CastType {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrProgram {
    pub functions: Vec<IrFunction>,
    pub top_level: Vec<IrStmt>,
    /// Set when lowering assigned SSA-style names (`_0`, `_1`, ...) to
    /// `Let`s; drives §4.9's hoisting pass.
    pub ssa: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrFunction {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub body: Vec<IrStmt>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IrMatchArm {
    /// `None` marks the wildcard arm.
    pub variant: Option<Symbol>,
    pub bindings: Vec<Symbol>,
    pub body: Box<IrExpr>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub enum IrExpr {
    Number { value: f64, location: Location },
    String { value: String, location: Location },
    Boolean { value: bool, location: Location },
    Identifier { name: Symbol, location: Location },
    Binary { op: BinaryOp, left: Box<IrExpr>, right: Box<IrExpr>, location: Location },
    Cast { expr: Box<IrExpr>, target_type: CastType, location: Location },
    Call { callee: Box<IrExpr>, args: Vec<IrExpr>, location: Location },
    Member { object: Box<IrExpr>, member: Symbol, location: Location },
    Index { object: Box<IrExpr>, index: Box<IrExpr>, location: Location },
    Enum { tag: Symbol, values: Vec<IrExpr>, location: Location },
    Match { value: Box<IrExpr>, arms: Vec<IrMatchArm>, location: Location },
    StructLiteral { name: Symbol, fields: Vec<(Symbol, IrExpr)>, location: Location },
}

impl IrExpr {
    pub fn location(&self) -> Location {
        match self {
            IrExpr::Number { location, .. }
            | IrExpr::String { location, .. }
            | IrExpr::Boolean { location, .. }
            | IrExpr::Identifier { location, .. }
            | IrExpr::Binary { location, .. }
            | IrExpr::Cast { location, .. }
            | IrExpr::Call { location, .. }
            | IrExpr::Member { location, .. }
            | IrExpr::Index { location, .. }
            | IrExpr::Enum { location, .. }
            | IrExpr::Match { location, .. }
            | IrExpr::StructLiteral { location, .. } => *location,
        }
    }

    /// True for RHS shapes the dead-store pass (§4.8 step 6) considers
    /// free of observable side effects.
    pub fn is_side_effect_free(&self) -> bool {
        match self {
            IrExpr::Call { .. } => false,
            IrExpr::Binary { left, right, .. } => left.is_side_effect_free() && right.is_side_effect_free(),
            IrExpr::Cast { expr, .. } => expr.is_side_effect_free(),
            IrExpr::Member { object, .. } => object.is_side_effect_free(),
            IrExpr::Index { object, index, .. } => object.is_side_effect_free() && index.is_side_effect_free(),
            IrExpr::Enum { values, .. } => values.iter().all(IrExpr::is_side_effect_free),
            IrExpr::StructLiteral { fields, .. } => fields.iter().all(|(_, v)| v.is_side_effect_free()),
            IrExpr::Match { value, arms, .. } => {
                value.is_side_effect_free() && arms.iter().all(|a| a.body.is_side_effect_free())
            }
            IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } | IrExpr::Identifier { .. } => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum IrStmt {
    Let { name: Symbol, value: IrExpr, location: Location },
    /// SSA merge point: `name = condition ? then_value : else_value`
    /// conceptually; §4.9 hoists the `Let` that declares `name` when
    /// `ssa = true`.
    Phi {
        name: Symbol,
        condition: Box<IrExpr>,
        then_value: Box<IrExpr>,
        else_value: Box<IrExpr>,
        location: Location,
    },
    Return { value: Option<IrExpr>, location: Location },
    ExprStmt { expr: IrExpr, location: Location },
    If {
        cond: IrExpr,
        then_branch: Vec<IrStmt>,
        else_branch: Vec<IrStmt>,
        location: Location,
    },
    While { cond: IrExpr, body: Vec<IrStmt>, location: Location },
    Assign { target: IrExpr, value: IrExpr, location: Location },
    /// Elidable marker left behind by lowering/optimization; downstream
    /// passes may drop it freely.
    Noop { location: Location },
}

impl IrStmt {
    pub fn location(&self) -> Location {
        match self {
            IrStmt::Let { location, .. }
            | IrStmt::Phi { location, .. }
            | IrStmt::Return { location, .. }
            | IrStmt::ExprStmt { location, .. }
            | IrStmt::If { location, .. }
            | IrStmt::While { location, .. }
            | IrStmt::Assign { location, .. }
            | IrStmt::Noop { location } => *location,
        }
    }

    /// The name this statement binds, if any — used by dead-store
    /// elimination (§4.8 step 6).
    pub fn bound_name(&self) -> Option<Symbol> {
        match self {
            IrStmt::Let { name, .. } | IrStmt::Phi { name, .. } => Some(*name),
            _ => None,
        }
    }
}
