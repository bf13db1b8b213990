//! Per-file diagnostic collector (§5, §7: "each phase records diagnostics
//! on a per-file collector and never aborts").

use crate::diagnostic::{Diagnostic, Severity};
use crate::guarantee::ErrorGuaranteed;

#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error-severity diagnostic and return proof that it was
    /// recorded.
    pub fn emit_error(&mut self, diagnostic: Diagnostic) -> ErrorGuaranteed {
        debug_assert_eq!(diagnostic.severity, Severity::Error);
        self.diagnostics.push(diagnostic);
        ErrorGuaranteed::new()
    }

    /// Record a diagnostic of any severity.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics sorted by document order of the failing node, per §5's
    /// ordering guarantee ("within a file, diagnostics are emitted in
    /// document order of the failing node").
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.diagnostics.sort_by_key(|d| (d.location.start.offset, d.location.end.offset));
        self.diagnostics
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::argument_type_mismatch;
    use crate::ErrorCode;
    use lumina_ir::{Location, Position};

    fn loc(offset: u32) -> Location {
        Location::new(Position::new(1, offset, offset), Position::new(1, offset + 1, offset + 1))
    }

    #[test]
    fn sorts_by_document_order() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(argument_type_mismatch(loc(10), "int", "str"));
        collector.emit(argument_type_mismatch(loc(2), "int", "str"));
        let sorted = collector.into_sorted();
        assert_eq!(sorted[0].location.start.offset, 2);
        assert_eq!(sorted[1].location.start.offset, 10);
        assert_eq!(sorted[0].code, ErrorCode::Lum001);
    }

    #[test]
    fn emit_error_yields_guaranteed_and_counts() {
        let mut collector = DiagnosticCollector::new();
        let _g = collector.emit_error(argument_type_mismatch(loc(0), "int", "str"));
        assert!(collector.has_errors());
        assert_eq!(collector.len(), 1);
    }
}
