use lumina_diagnostic::{Diagnostic, ErrorCode};
use lumina_ir::Location;

/// Raised by the parser adapter on syntactic failure (§4.1). The PEG
/// grammar compiler the adapter wraps is treated as a black box that
/// either yields an AST or fails with exactly this shape; our hand-written
/// recursive-descent core (standing in for that external grammar, per
/// §6.1) preserves the same contract.
#[derive(Clone, Debug, PartialEq)]
pub struct LuminaSyntaxError {
    pub location: Location,
    pub expected: Vec<String>,
    pub found: String,
    /// The raw input slice around the failure, for diagnostic rendering.
    pub input_slice: String,
}

impl std::fmt::Display for LuminaSyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {}, found {} at {}",
            self.expected.join(" or "),
            self.found,
            self.location
        )
    }
}

impl std::error::Error for LuminaSyntaxError {}

impl LuminaSyntaxError {
    /// Adapts this syntactic failure into the common [`Diagnostic`] shape
    /// consumed by the host (§6.3).
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(ErrorCode::SyntaxError, self.location, self.to_string())
    }
}
