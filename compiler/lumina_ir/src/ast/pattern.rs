//! Match-arm patterns (§3.1, §4.5 exhaustiveness).

use crate::interner::Symbol;
use crate::span::Location;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// `Variant(a, b)` or `Enum.Variant(a, b)`.
    Variant {
        enum_name: Option<Symbol>,
        variant: Symbol,
        bindings: Vec<Symbol>,
        location: Location,
    },
    /// `_`, matches anything and satisfies exhaustiveness unconditionally.
    Wildcard { location: Location },
}

impl Pattern {
    pub fn location(&self) -> Location {
        match self {
            Pattern::Variant { location, .. } => *location,
            Pattern::Wildcard { location } => *location,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard { .. })
    }
}
