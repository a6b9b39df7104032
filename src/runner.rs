//! Per-file orchestration.
//!
//! Each target file is read once, threaded through its pipeline and written
//! once, only when the result differs. A hard failure on one file is
//! recorded and the remaining files are still processed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AndroidConfig, IosConfig, PatcherConfig};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Platform};
use crate::error::PatchResult;
use crate::patch::diff::unified_diff;
use crate::pipeline::{self, app_delegate, build_script, main_application, resource_file, TransformPipeline};
use crate::store::FileStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute changes and diffs without writing anything.
    pub dry_run: bool,
}

/// Outcome for one successfully processed file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub platform: Platform,
    pub changed: bool,
    /// Unified diff of the change, filled in dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// A file that could not be processed at all.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub platform: Platform,
    pub missing_target: bool,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.changed)
    }
}

struct Target {
    path: PathBuf,
    pipeline: TransformPipeline,
}

/// Patch every file enabled by `config`.
///
/// Errors are returned only for an invalid integration profile; per-file
/// failures are reported in [`RunReport::failures`].
pub fn run(config: &PatcherConfig, store: &impl FileStore, options: RunOptions) -> PatchResult<RunReport> {
    let mut sink = DiagnosticSink::new();
    let mut targets = Vec::new();

    if let Some(ios) = &config.ios {
        targets.extend(ios_targets(config, ios)?);
    }
    if let Some(android) = &config.android {
        targets.extend(android_targets(config, android, store, &mut sink)?);
    }

    let mut report = RunReport::default();
    for target in targets {
        let platform = target.pipeline.platform();
        match patch_file(store, &target, options, &mut sink) {
            Ok(file) => report.files.push(file),
            Err(err) => {
                warn!(path = %target.path.display(), error = %err, "file not patched");
                report.failures.push(FileFailure {
                    path: target.path,
                    platform,
                    missing_target: err.is_missing_target(),
                    error: err.to_string(),
                });
            }
        }
    }

    report.diagnostics = sink.into_vec();
    info!(
        files = report.files.len(),
        changed = report.changed_files().count(),
        failures = report.failures.len(),
        diagnostics = report.diagnostics.len(),
        "run finished"
    );
    Ok(report)
}

fn ios_targets(config: &PatcherConfig, ios: &IosConfig) -> PatchResult<Vec<Target>> {
    let profile = &config.profile;
    let mut targets = vec![Target {
        path: ios.app_delegate_path(),
        pipeline: app_delegate::pipeline(profile)?,
    }];

    let entries = resource_file::entries(profile, ios.deployment_key.as_deref(), ios.server_url.as_deref());
    match ios.info_plist_path() {
        Some(path) if !entries.is_empty() => targets.push(Target {
            path,
            pipeline: resource_file::plist_pipeline(entries),
        }),
        Some(_) => {}
        None => warn!("no Info.plist location configured; iOS resource keys not written"),
    }
    Ok(targets)
}

fn android_targets(
    config: &PatcherConfig,
    android: &AndroidConfig,
    store: &impl FileStore,
    sink: &mut DiagnosticSink,
) -> PatchResult<Vec<Target>> {
    let profile = &config.profile;
    let mut targets = Vec::new();

    let entries = resource_file::entries(
        profile,
        android.deployment_key.as_deref(),
        android.server_url.as_deref(),
    );
    if !entries.is_empty() {
        targets.push(Target {
            path: android.strings_path(),
            pipeline: resource_file::strings_pipeline(entries),
        });
    }

    targets.push(Target {
        path: android.main_application_path(),
        pipeline: main_application::pipeline(profile, &android.package)?,
    });

    let groovy = android.build_script_path();
    let kotlin = android.build_script_kts_path();
    let build_script = if !store.exists(&groovy) && store.exists(&kotlin) {
        kotlin
    } else {
        groovy
    };
    if build_script::check_dialect(&build_script, sink) {
        targets.push(Target {
            path: build_script,
            pipeline: build_script::pipeline(profile)?,
        });
    }

    Ok(targets)
}

fn patch_file(
    store: &impl FileStore,
    target: &Target,
    options: RunOptions,
    sink: &mut DiagnosticSink,
) -> PatchResult<FileReport> {
    let original = store.read(&target.path)?;
    let patched = pipeline::run_logged(&target.pipeline, original.clone(), sink);
    let changed = patched != original;

    let diff = if options.dry_run && changed {
        Some(unified_diff(&display_name(&target.path), &original, &patched))
    } else {
        None
    };
    if changed && !options.dry_run {
        store.write(&target.path, &patched)?;
        info!(path = %target.path.display(), "file patched");
    }

    Ok(FileReport {
        path: target.path.clone(),
        platform: target.pipeline.platform(),
        changed,
        diff,
    })
}

fn display_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
