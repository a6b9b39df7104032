//! Per-file transform pipelines.
//!
//! A [`TransformPipeline`] is a fixed, ordered list of [`Step`]s for one
//! file class. Each step takes the whole buffer and returns the whole
//! buffer. A step that cannot find its anchor records a diagnostic and hands
//! the buffer on unchanged, so later steps always run.
//!
//! # File classes
//!
//! - [`app_delegate`] — iOS application delegate (native source)
//! - [`build_script`] — Android app build script
//! - [`main_application`] — Android application entry point
//! - [`resource_file`] — string resources and property lists

pub mod app_delegate;
pub mod build_script;
pub mod main_application;
pub mod resource_file;
pub mod steps;

use tracing::{debug, info};

use crate::diagnostics::{DiagnosticSink, Platform};

/// Kind of file a pipeline patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    NativeSource,
    BuildScript,
    ApplicationEntry,
    Resource,
}

/// One named transform over a whole buffer.
pub trait Step {
    /// Stable identifier, also used as the diagnostic code.
    fn name(&self) -> &'static str;

    /// Transform `buffer`. Must not fail: unresolvable cases are recorded in
    /// `sink` and the buffer is returned as received.
    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String;
}

/// Ordered step chain for one file class.
pub struct TransformPipeline {
    class: FileClass,
    platform: Platform,
    steps: Vec<Box<dyn Step>>,
}

impl std::fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPipeline")
            .field("class", &self.class)
            .field("platform", &self.platform)
            .field("steps", &self.step_names())
            .finish()
    }
}

impl TransformPipeline {
    pub fn new(class: FileClass, platform: Platform) -> Self {
        Self {
            class,
            platform,
            steps: Vec::new(),
        }
    }

    /// Append a step; steps run in insertion order.
    #[must_use]
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub const fn class(&self) -> FileClass {
        self.class
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Thread `buffer` through every step in order.
    pub fn run(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        self.steps.iter().fold(buffer, |buffer, step| {
            let before = sink.len();
            let len = buffer.len();
            let out = step.apply(buffer, sink);
            debug!(
                step = step.name(),
                bytes_before = len,
                bytes_after = out.len(),
                diagnostics = sink.len() - before,
                "step finished"
            );
            out
        })
    }
}

/// Run `pipeline` and log whether the buffer changed.
pub fn run_logged(pipeline: &TransformPipeline, buffer: String, sink: &mut DiagnosticSink) -> String {
    let original_len = buffer.len();
    let out = pipeline.run(buffer, sink);
    info!(
        class = ?pipeline.class(),
        platform = %pipeline.platform(),
        original_len,
        patched_len = out.len(),
        "pipeline finished"
    );
    out
}
