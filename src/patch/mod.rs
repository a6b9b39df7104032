//! Anchor-driven, idempotent text patching engine.
//!
//! There is no parser for the target languages. Structure is recovered with
//! brace-depth scanning, insertion points come from ordered recognizer
//! chains, and "already applied" is a literal substring test. That is enough
//! for machine-generated, consistently formatted native project files.
//!
//! # Layers
//!
//! 1. [`brace`] — matching closing brace by depth counting
//! 2. [`anchor`] — recognizers and the first-match-wins resolver
//! 3. [`inject`] — detect-or-insert of fragments at an anchor
//! 4. [`block`] — find-or-create of named nested blocks and their fields
//! 5. [`resources`] — upsert-by-name for key/value resource files
//!
//! [`diff`] renders what a run would change.

pub mod anchor;
pub mod block;
pub mod brace;
pub mod diff;
pub mod inject;
pub mod resources;

pub use anchor::{resolve, Anchor, AnchorKind, Recognizer};
pub use block::{ensure_block_with_field, ensure_nested_field, BlockEdit, BlockOutcome, BlockSpec};
pub use brace::match_brace;
pub use inject::{inject, Fragment, Injection, Outcome};
pub use resources::{upsert, ResourceEntry};
