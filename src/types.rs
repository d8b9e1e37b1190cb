//! Diagnostic types for the KQL language service

use serde::{Deserialize, Serialize};

/// A zero-based line/column position; columns count characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-based)
    pub line: usize,
    /// Column number (0-based, character position)
    pub column: usize,
}

impl Position {
    /// Create a position
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range between two positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Range {
    /// Range covering `start..end` columns on a single line
    #[must_use]
    pub fn on_line(line: usize, start: usize, end: usize) -> Self {
        Self {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }
}

/// All diagnostics computed for one version of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticSet {
    /// Document version the diagnostics were computed for
    pub version: i32,
    /// Diagnostics in document order
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSet {
    /// Create a set for `version`
    #[must_use]
    pub fn new(version: i32, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            version,
            diagnostics,
        }
    }

    /// Check if there are no diagnostics
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Get all diagnostics
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get only warning diagnostics
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }
}

/// A diagnostic produced by the scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Source range the diagnostic applies to
    pub range: Range,
    /// The diagnostic message
    pub message: String,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Diagnostic code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Spelling suggestions, best first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Check if this is a warning
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == DiagnosticSeverity::Warning
    }
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DiagnosticSeverity {
    /// A likely mistake, such as an unknown name
    Warning,
    /// A style hint that does not affect validity
    Information,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "Warning"),
            Self::Information => write!(f, "Information"),
        }
    }
}
