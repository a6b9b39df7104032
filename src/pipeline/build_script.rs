//! Android app build script (Groovy `build.gradle`).

use std::path::Path;

use super::steps::{AppendLineStep, NestedFieldStep, SimpleFieldStep};
use super::{FileClass, TransformPipeline};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Platform};
use crate::error::PatchResult;
use crate::patch::block::SimpleBlockField;
use crate::profile::IntegrationProfile;

/// Only the Groovy dialect is patched. Kotlin script build files are
/// reported and left alone.
pub fn check_dialect(path: &Path, sink: &mut DiagnosticSink) -> bool {
    let kotlin_script = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".kts"));
    if kotlin_script {
        sink.push(
            Platform::Android,
            DiagnosticKind::UnsupportedFileDialect,
            "build-script-dialect",
            format!("{} is a Kotlin script; build script changes skipped", path.display()),
        );
    }
    !kotlin_script
}

pub fn pipeline(profile: &IntegrationProfile) -> PatchResult<TransformPipeline> {
    let apply = AppendLineStep {
        code: "apply-line",
        line: profile.gradle_apply_line.clone(),
    };

    let build_types = NestedFieldStep {
        platform: Platform::Android,
        code: "android-block",
        scope: "android".to_owned(),
        parent: "buildTypes".to_owned(),
        fields: profile
            .gradle_build_type_fields
            .iter()
            .map(|f| (f.block.clone(), f.field.clone()))
            .collect(),
    };

    let simple = SimpleFieldStep {
        platform: Platform::Android,
        code: "react-block",
        field: SimpleBlockField::new(
            profile.gradle_simple_block.clone(),
            &profile.gradle_simple_key,
            profile.gradle_simple_field.clone(),
        )?,
        after: Some("android".to_owned()),
    };

    Ok(TransformPipeline::new(FileClass::BuildScript, Platform::Android)
        .step(apply)
        .step(build_types)
        .step(simple))
}
