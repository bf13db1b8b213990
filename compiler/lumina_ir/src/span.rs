//! Source locations.
//!
//! Every AST and IR node carries a [`Location`]; `Location::DUMMY` is used
//! for synthesized nodes (e.g. monomorphized clones) that have no direct
//! source text.

use std::fmt;

/// A single point in source text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32, offset: u32) -> Self {
        Position { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A start/end source span, per `spec.md` §3.1: `Location { start, end: {
/// line, column, offset } }`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub const DUMMY: Location = Location {
        start: Position { line: 0, column: 0, offset: 0 },
        end: Position { line: 0, column: 0, offset: 0 },
    };

    pub const fn new(start: Position, end: Position) -> Self {
        Location { start, end }
    }

    pub fn merge(self, other: Location) -> Location {
        let start = if self.start.offset <= other.start.offset { self.start } else { other.start };
        let end = if self.end.offset >= other.end.offset { self.end } else { other.end };
        Location::new(start, end)
    }

    /// Stable key used to index per-expression side tables (§4.4: "keyed by
    /// source location (`line:column:offset`)").
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.start.line, self.start.column, self.start.offset)
    }

    pub fn is_dummy(&self) -> bool {
        *self == Location::DUMMY
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
