use std::fmt;

use lumina_ir::Location;

use crate::ErrorCode;

/// `spec.md` §6.3: `{ code, severity ∈ {error, warning, info}, ... }`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// One entry of `relatedInformation` (§6.3).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct RelatedInfo {
    pub location: Location,
    pub message: String,
}

impl RelatedInfo {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        RelatedInfo { location, message: message.into() }
    }
}

/// Confidence level for a structured fix (§12), grounded in the teacher's
/// `Applicability`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Applicability {
    MachineApplicable,
    MaybeIncorrect,
    #[default]
    Unspecified,
}

/// A structured, span-addressed fix suggestion (§12).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Suggestion {
    pub message: String,
    pub span: Location,
    pub replacement: String,
    pub applicability: Applicability,
}

/// A diagnostic, matching the wire shape of `spec.md` §6.3 plus the
/// structured-suggestion extension of §12.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[must_use = "diagnostics should be reported via a DiagnosticCollector, not dropped"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub source: &'static str,
    pub location: Location,
    pub related_information: Vec<RelatedInfo>,
    pub suggestions: Vec<Suggestion>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, severity: Severity, location: Location, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            severity,
            message: message.into(),
            source: "lumina",
            location,
            related_information: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn error(code: ErrorCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, location, message)
    }

    pub fn warning(code: ErrorCode, location: Location, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, location, message)
    }

    #[must_use]
    pub fn with_related(mut self, related: RelatedInfo) -> Self {
        self.related_information.push(related);
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// -- constructors for the well-known diagnostics named throughout the spec --

pub fn unknown_identifier(location: Location, name: &str, suggestion: Option<&str>) -> Diagnostic {
    let mut d = Diagnostic::error(ErrorCode::UnknownIdentifier, location, format!("unknown identifier `{name}`"));
    if let Some(s) = suggestion {
        d.suggestions.push(Suggestion {
            message: format!("did you mean `{s}`?"),
            span: location,
            replacement: s.to_string(),
            applicability: Applicability::MaybeIncorrect,
        });
    }
    d
}

pub fn unknown_type(location: Location, name: &str, suggestion: Option<&str>) -> Diagnostic {
    let mut d = Diagnostic::error(ErrorCode::UnknownType, location, format!("unknown type `{name}`"));
    if let Some(s) = suggestion {
        d.suggestions.push(Suggestion {
            message: format!("did you mean `{s}`?"),
            span: location,
            replacement: s.to_string(),
            applicability: Applicability::MaybeIncorrect,
        });
    }
    d
}

pub fn argument_type_mismatch(location: Location, expected: &str, actual: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::Lum001, location, format!("expected argument of type `{expected}`, found `{actual}`"))
}

pub fn bound_mismatch(location: Location, ty: &str, bound: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::BoundMismatch, location, format!("type `{ty}` does not satisfy bound `{bound}`"))
        .with_related(RelatedInfo::new(location, format!("expected an impl of `{bound}` for `{ty}`")))
}

pub fn match_not_exhaustive(location: Location, missing: &[String]) -> Diagnostic {
    Diagnostic::error(ErrorCode::MatchNotExhaustive, location, "match is not exhaustive").with_related(
        RelatedInfo::new(location, format!("Missing variants: {}", missing.join(", "))),
    )
}

pub fn recursive_struct(location: Location, struct_name: &str, field_name: &str) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::RecursiveStruct,
        location,
        format!("struct `{struct_name}` recursively contains itself through field `{field_name}`"),
    )
    .with_related(RelatedInfo::new(
        location,
        format!("wrap the field in `Option<{struct_name}>`, `Box<{struct_name}>`, or `Ref<{struct_name}>`"),
    ))
}

pub fn shadowed_binding(location: Location, outer: Location, name: &str) -> Diagnostic {
    Diagnostic::warning(ErrorCode::ShadowedBinding, location, format!("binding `{name}` shadows an outer declaration"))
        .with_related(RelatedInfo::new(outer, "outer declaration here".to_string()))
}

pub fn shadowed_import(location: Location, name: &str) -> Diagnostic {
    Diagnostic::warning(ErrorCode::ShadowedImport, location, format!("local binding `{name}` shadows an imported namespace"))
}

pub fn ref_lvalue_required(location: Location) -> Diagnostic {
    Diagnostic::error(ErrorCode::RefLvalueRequired, location, "a `ref` parameter requires an lvalue argument")
}

pub fn ref_mut_required(location: Location, name: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::RefMutRequired, location, format!("`{name}` must be declared `mut` to pass it by `ref`"))
}
