//! Non-fatal findings collected while walking and planning.
//!
//! Shapes that cannot be classified are turned into data (Unknown or
//! Unsupported nodes) so the walk terminates; every such degradation is
//! recorded here so nothing is dropped silently.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// An exported struct field was omitted because its type degraded.
    DroppedField,
    /// A type shape could not be classified.
    UnsupportedShape,
    /// A named type reference had no definition available to any provider.
    UnresolvedType,
    /// Two different definitions canonicalized to one qualified name.
    NameCollision,
    /// A struct field could not be paired with a field of the peer type.
    UnmatchedField,
    /// A versioned type has no counterpart in the internal package.
    MissingCounterpart,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DroppedField => "dropped-field",
            DiagnosticKind::UnsupportedShape => "unsupported-shape",
            DiagnosticKind::UnresolvedType => "unresolved-type",
            DiagnosticKind::NameCollision => "name-collision",
            DiagnosticKind::UnmatchedField => "unmatched-field",
            DiagnosticKind::MissingCounterpart => "missing-counterpart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// What the finding is about, usually a qualified name.
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.subject, self.message)
    }
}

/// Ordered collection of diagnostics. Each entry is logged when recorded.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
