//! Diagnostic system for the Lumina compiler (§6.3, §7).
//!
//! Two layers, per `SPEC_FULL.md` §11.2: a handful of `thiserror`-derived
//! leaf error types live in the crates that own true I/O boundaries
//! (`lumina_module`, `lumina_driver`); everything user-triggerable from
//! compiling Lumina source is a [`Diagnostic`] collected in a
//! [`DiagnosticCollector`], never a panic.

mod diagnostic;
mod error_code;
mod guarantee;
pub mod queue;

pub use diagnostic::{
    argument_type_mismatch, bound_mismatch, match_not_exhaustive, recursive_struct, ref_lvalue_required,
    ref_mut_required, shadowed_binding, shadowed_import, unknown_identifier, unknown_type, Applicability,
    Diagnostic, RelatedInfo, Severity, Suggestion,
};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::DiagnosticCollector;
