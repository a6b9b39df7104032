//! `native-patcher` — idempotent patcher for generated native project files.
//!
//! Injects an SDK integration into the native sources, build scripts and
//! resource files of a generated mobile project. Every edit is anchored on
//! surrounding text, checked for presence first, and applied at most once,
//! so running the patcher again over its own output changes nothing.
//!
//! # Layout
//!
//! - [`patch`] — the text engine: brace matching, anchor chains, fragment
//!   injection, block editing, resource upserts
//! - [`pipeline`] — ordered step chains, one per file class
//! - [`runner`] — reads, patches and writes each configured file once
//! - [`diagnostics`] — soft failures collected during a run
//! - [`config`] / [`profile`] — run configuration and the injected payload
//!
//! ```text
//! config ─→ runner ─→ FileStore::read ─→ TransformPipeline ─→ FileStore::write
//!                                              │
//!                                       DiagnosticSink
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod patch;
pub mod pipeline;
pub mod profile;
pub mod runner;
pub mod store;
pub mod util;

pub use config::PatcherConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, Platform};
pub use error::{PatchError, PatchResult};
pub use runner::{run, RunOptions, RunReport};
pub use store::{DiskStore, FileStore};
