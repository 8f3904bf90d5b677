//! Import Diagnostics
//!
//! Recoverable problems found while parsing or building are collected here
//! instead of aborting the import. Only a bad file header is fatal; every
//! other problem ends up as a `Diagnostic` next to the partial result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of a collected import problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// File is not a PADS-Logic / PADS-PowerLogic export
    Format,
    /// A count-prefixed block ended before its declared record count
    Desync,
    /// Decal pin list and gate pin list disagree in length
    Mapping,
    /// A decal, part type or placement name was declared twice
    Duplicate,
    /// A placement or net refers to something that does not exist
    Reference,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Format => "FORMAT_ERROR",
            DiagnosticKind::Desync => "DESYNC_ERROR",
            DiagnosticKind::Mapping => "MAPPING_ERROR",
            DiagnosticKind::Duplicate => "DUPLICATE_ERROR",
            DiagnosticKind::Reference => "REFERENCE_ERROR",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single collected problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// 1-based source line, when the problem can be tied to one
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.kind, line, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Ordered collection of diagnostics for one import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem and log it.
    pub fn push(&mut self, kind: DiagnosticKind, line: Option<usize>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            line,
            message: message.into(),
        };
        tracing::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn at(&mut self, kind: DiagnosticKind, line: usize, message: impl Into<String>) {
        self.push(kind, Some(line), message);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind() {
        let mut diags = Diagnostics::new();
        diags.at(DiagnosticKind::Desync, 12, "short pin list");
        diags.push(DiagnosticKind::Reference, None, "unknown part U9");
        diags.at(DiagnosticKind::Desync, 40, "stray line");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::Desync), 2);
        assert!(diags.has(DiagnosticKind::Reference));
        assert!(!diags.has(DiagnosticKind::Mapping));
    }

    #[test]
    fn test_display_includes_line() {
        let d = Diagnostic {
            kind: DiagnosticKind::Duplicate,
            line: Some(7),
            message: "decal RES declared twice".to_string(),
        };
        assert_eq!(d.to_string(), "DUPLICATE_ERROR (line 7): decal RES declared twice");
    }
}
