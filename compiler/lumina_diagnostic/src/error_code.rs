//! Well-known diagnostic codes (§6.3).

use std::fmt;

/// A diagnostic's stable, automation-friendly code.
///
/// `spec.md` §6.3 enumerates these by literal name; unlike the teacher's
/// `E####` phase-prefixed scheme we keep the spec's exact spellings so that
/// a consumer matching on `"MATCH_NOT_EXHAUSTIVE"` etc. keeps working.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorCode {
    /// Argument type mismatch at a call site.
    Lum001,
    UnknownIdentifier,
    UnknownType,
    UnknownFunction,
    UnknownMember,
    UnresolvedMember,
    UnknownQualifier,
    QualifierMismatch,
    BoundMismatch,
    RefLvalueRequired,
    RefMutRequired,
    ShadowedBinding,
    ShadowedImport,
    MatchNotExhaustive,
    RecursiveStruct,
    TypeError,
    Lint,
    Pkg001,
    Pkg002,
    Pkg003,
    /// IR validation failure (§4.8 step 8) — always a compiler bug, never
    /// user-triggerable.
    InternalIrInvalid,
    /// Syntactic failure raised by C1 (§4.1).
    SyntaxError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Lum001 => "LUM-001",
            ErrorCode::UnknownIdentifier => "UNKNOWN_IDENTIFIER",
            ErrorCode::UnknownType => "UNKNOWN_TYPE",
            ErrorCode::UnknownFunction => "UNKNOWN_FUNCTION",
            ErrorCode::UnknownMember => "UNKNOWN_MEMBER",
            ErrorCode::UnresolvedMember => "UNRESOLVED_MEMBER",
            ErrorCode::UnknownQualifier => "UNKNOWN_QUALIFIER",
            ErrorCode::QualifierMismatch => "QUALIFIER_MISMATCH",
            ErrorCode::BoundMismatch => "BOUND_MISMATCH",
            ErrorCode::RefLvalueRequired => "REF_LVALUE_REQUIRED",
            ErrorCode::RefMutRequired => "REF_MUT_REQUIRED",
            ErrorCode::ShadowedBinding => "SHADOWED_BINDING",
            ErrorCode::ShadowedImport => "SHADOWED_IMPORT",
            ErrorCode::MatchNotExhaustive => "MATCH_NOT_EXHAUSTIVE",
            ErrorCode::RecursiveStruct => "RECURSIVE_STRUCT",
            ErrorCode::TypeError => "TYPE_ERROR",
            ErrorCode::Lint => "LINT",
            ErrorCode::Pkg001 => "PKG-001",
            ErrorCode::Pkg002 => "PKG-002",
            ErrorCode::Pkg003 => "PKG-003",
            ErrorCode::InternalIrInvalid => "INTERNAL_IR_INVALID",
            ErrorCode::SyntaxError => "SYNTAX_ERROR",
        }
    }

    /// Long-form explanation, surfaced by the `--explain` CLI command
    /// (§12, grounded on `oric::commands::explain`).
    pub const fn explain(self) -> &'static str {
        match self {
            ErrorCode::Lum001 => "An argument's type is not assignable to the parameter's expected type, even after substituting the call site's type-parameter bindings.",
            ErrorCode::UnknownIdentifier => "No symbol with this name is visible in the current scope. A suggestion is offered when a visible name is within edit-distance 2.",
            ErrorCode::UnknownType => "No type with this name is declared or imported.",
            ErrorCode::UnknownFunction => "No function with this name is declared, imported, or a module member of the qualifier used.",
            ErrorCode::UnknownMember => "The named field or method does not exist on the struct/enum in question.",
            ErrorCode::UnresolvedMember => "A member access could not be resolved because its object's type itself failed to resolve.",
            ErrorCode::UnknownQualifier => "The name before `.` is neither an imported module namespace nor a declared enum.",
            ErrorCode::QualifierMismatch => "A qualified call's qualifier resolved to a module, but the referenced enum variant/function does not exist on it.",
            ErrorCode::BoundMismatch => "A generic argument does not satisfy one of the trait bounds declared on the corresponding type parameter.",
            ErrorCode::RefLvalueRequired => "A `ref` parameter was passed a non-lvalue expression.",
            ErrorCode::RefMutRequired => "A `ref` parameter was passed an immutable binding.",
            ErrorCode::ShadowedBinding => "A new binding hides an existing one in an enclosing scope.",
            ErrorCode::ShadowedImport => "A local binding hides an imported namespace.",
            ErrorCode::MatchNotExhaustive => "A match over an enum does not cover every variant and has no wildcard arm.",
            ErrorCode::RecursiveStruct => "A struct field recursively contains the struct itself without an indirection wrapper (Option/Box/Ref).",
            ErrorCode::TypeError => "A general type mismatch not covered by a more specific code.",
            ErrorCode::Lint => "A non-fatal style or hygiene observation (unused binding, etc.).",
            ErrorCode::Pkg001 => "An import specifier names a package that is not present in the project lockfile.",
            ErrorCode::Pkg002 => "The project lockfile could not be parsed.",
            ErrorCode::Pkg003 => "An import names a subpath export that the resolved package does not provide.",
            ErrorCode::InternalIrInvalid => "A compiler-internal invariant was violated while validating lowered/optimized IR. This is a compiler bug, not a user error.",
            ErrorCode::SyntaxError => "The source text could not be parsed.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
