//! Error types for the native-patcher crate.
//!
//! Only hard failures live here. Anchors that cannot be found and files in an
//! unsupported dialect are soft failures and are reported through
//! [`crate::diagnostics::DiagnosticSink`] instead.

use std::path::PathBuf;

/// Patcher error types.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// A file the run was asked to patch does not exist.
    #[error("target file not found: {path} ({hint})")]
    MissingTargetFile { path: PathBuf, hint: String },

    /// I/O error with context.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is structurally valid JSON but unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An anchor pattern failed to compile.
    #[error("invalid anchor pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl PatchError {
    /// Returns true for the one failure mode that aborts a single file.
    pub const fn is_missing_target(&self) -> bool {
        matches!(self, Self::MissingTargetFile { .. })
    }
}

/// Convenience result type for patcher operations.
pub type PatchResult<T> = Result<T, PatchError>;
