//! Non-fatal diagnostics collected during a patch run.
//!
//! A [`DiagnosticSink`] is created per run and passed explicitly to every
//! transform step. Entries are append-only and keep emission order.

use serde::Serialize;
use tracing::warn;

/// Target platform a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ios => f.write_str("ios"),
            Self::Android => f.write_str("android"),
        }
    }
}

/// Class of soft failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// An anchor, brace pair, or named block could not be located.
    StructuralNotFound,
    /// The file is not in a dialect this crate patches.
    UnsupportedFileDialect,
    /// The fragment was placed by a low-confidence fallback and should be
    /// reviewed.
    Fallback,
}

/// A single recorded soft failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub platform: Platform,
    pub kind: DiagnosticKind,
    /// Identifies the step that emitted it, e.g. `lifecycle-method`.
    pub code: String,
    pub message: String,
}

/// Append-only diagnostic collection.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log.
    pub fn push(
        &mut self,
        platform: Platform,
        kind: DiagnosticKind,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            platform,
            kind,
            code: code.into(),
            message: message.into(),
        };
        warn!(
            platform = %diagnostic.platform,
            code = %diagnostic.code,
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    /// Shorthand for [`DiagnosticKind::StructuralNotFound`].
    pub fn not_found(
        &mut self,
        platform: Platform,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(platform, DiagnosticKind::StructuralNotFound, code, message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Whether any diagnostic carries `code`.
    pub fn contains_code(&self, code: &str) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
