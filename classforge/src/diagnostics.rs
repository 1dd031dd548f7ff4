//! Warnings and recovered errors collected during a generation run
//!
//! A run never stops at the first problem: field- and relationship-level
//! problems are recovered locally and class-level failures skip the class.
//! Everything that was recovered ends up here.

use serde::Serialize;

use crate::error::{DanglingReferenceError, ParseError};

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed class block, field line or relationship line
    ParseError,
    /// Relationship endpoint names an unknown class; the relationship was dropped
    DanglingReference,
    /// Unrecognised field type, canonicalised to `string`
    UnknownType,
    /// A field, constraint or relationship was dropped; its class was kept
    InvalidDeclaration,
    /// A backend failed to render an artifact; the class was skipped
    EmissionError,
}

/// A single recorded problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}", severity)?;
        if let Some(class) = &self.class {
            write!(f, " [{}]", class)?;
        }
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind: DiagnosticKind::ParseError,
            class: err.class.clone(),
            line: Some(err.line),
            message: err.message.clone(),
        }
    }
}

impl From<&DanglingReferenceError> for Diagnostic {
    fn from(err: &DanglingReferenceError) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind: DiagnosticKind::DanglingReference,
            class: Some(err.left.clone()),
            line: Some(err.line),
            message: err.to_string(),
        }
    }
}

/// Ordered collection of diagnostics for one run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Record an unrecognised field type
    pub fn unknown_type(&mut self, class: &str, field: &str, raw_type: &str) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            kind: DiagnosticKind::UnknownType,
            class: Some(class.to_string()),
            line: None,
            message: format!(
                "unknown type '{}' for field '{}', using string",
                raw_type, field
            ),
        });
    }

    /// Record a declaration dropped during resolution
    pub fn invalid_declaration(&mut self, class: &str, line: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Warning,
            kind: DiagnosticKind::InvalidDeclaration,
            class: Some(class.to_string()),
            line,
            message: message.into(),
        });
    }

    /// Record a backend failure for a class
    pub fn emission_error(&mut self, class: &str, message: impl Into<String>) {
        self.push(Diagnostic {
            severity: Severity::Error,
            kind: DiagnosticKind::EmissionError,
            class: Some(class.to_string()),
            line: None,
            message: message.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of diagnostics of the given kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
