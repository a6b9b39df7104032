//! Android application entry point (`MainApplication.kt`).
//!
//! Four steps in order: imports, SDK start-up call in `onCreate`, package
//! registration in `getPackages`, and the bundle file accessor on the
//! React Native host object.

use regex::Regex;
use tracing::debug;

use super::steps::{ImportStep, InsertStep};
use super::{FileClass, Step, TransformPipeline};
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Platform};
use crate::error::PatchResult;
use crate::patch::anchor::{self, AnchorKind, Recognizer};
use crate::patch::inject::{self, Fragment, Outcome};
use crate::profile::IntegrationProfile;

const ON_CREATE: &str = r"override\s+fun\s+onCreate\(\)";
const GET_PACKAGES: &str = r"override\s+fun\s+getPackages\(\)";
const IMMUTABLE_PACKAGES: &str = r"val\s+packages\s*=\s*PackageList\(this\)\.packages";
const MUTABLE_PACKAGES: &str = r"va[lr]\s+packages\s*:\s*MutableList<ReactPackage>\s*=";
const RETURN_PACKAGES: &str = r"^[ \t]*return\s+packages\b";
const HOST_OBJECT: &str = r"object\s*:\s*DefaultReactNativeHost\b";

/// Build the main application pipeline for `package`.
pub fn pipeline(profile: &IntegrationProfile, package: &str) -> PatchResult<TransformPipeline> {
    let imports = ImportStep {
        platform: Platform::Android,
        code: "android-imports",
        lines: profile.android_imports_for(package),
        alternates: Vec::new(),
        dialect_lines: None,
        chain: vec![
            Recognizer::last_line_with_prefix("last-import", AnchorKind::LastImportLine, &["import "]),
            Recognizer::first_line_with_prefix("package", AnchorKind::PackageDeclaration, &["package "]),
            Recognizer::file_start("file-start"),
        ],
    };

    let on_create = InsertStep {
        platform: Platform::Android,
        code: "lifecycle-method",
        fragment: Fragment::new("start-up call", profile.android_init_call.clone())
            .with_markers([profile.android_init_marker.clone()])
            .within(Regex::new(ON_CREATE)?),
        required_scope: Some((Regex::new(ON_CREATE)?, "onCreate()")),
        chain: vec![
            Recognizer::after_line("soloader-init", AnchorKind::StatementLine, r"SoLoader\.init\(this,.*\)")?
                .within(ON_CREATE)?,
            Recognizer::after_line("super-on-create", AnchorKind::SuperCallLine, r"super\.onCreate\(\)")?
                .within(ON_CREATE)?,
            Recognizer::scope_start("on-create-header", ON_CREATE)?,
        ],
        scope_end: None,
        low_confidence: vec!["on-create-header"],
        fallback_code: Some("lifecycle-placement"),
    };

    let packages = PackageRegistration {
        fragment: Fragment::new("package registration", profile.android_package_registration.clone())
            .with_markers([profile.android_package_marker.clone()]),
        mutable_declaration: profile.android_mutable_packages.clone(),
        immutable: Regex::new(IMMUTABLE_PACKAGES)?,
        mutable: Regex::new(MUTABLE_PACKAGES)?,
        get_packages: Regex::new(GET_PACKAGES)?,
        return_line: Recognizer::before_line("return-packages", AnchorKind::StatementLine, RETURN_PACKAGES)?
            .within(GET_PACKAGES)?,
    };

    let accessor = InsertStep {
        platform: Platform::Android,
        code: "js-bundle-accessor",
        fragment: Fragment::new("getJSBundleFile()", profile.android_bundle_accessor.clone())
            .with_markers([profile.android_bundle_accessor_marker.clone()])
            .with_blank_line_before(),
        required_scope: None,
        chain: vec![
            Recognizer::after_line(
                "is-hermes-enabled",
                AnchorKind::MemberDeclaration,
                r"override\s+val\s+isHermesEnabled\s*:\s*Boolean\s*=.*$",
            )?,
            Recognizer::after_line(
                "is-new-arch-enabled",
                AnchorKind::MemberDeclaration,
                r"override\s+val\s+isNewArchEnabled\s*:\s*Boolean\s*=.*$",
            )?,
            Recognizer::after_line(
                "get-use-developer-support",
                AnchorKind::MemberDeclaration,
                r"override\s+fun\s+getUseDeveloperSupport\(\)\s*:\s*Boolean\s*=.*$",
            )?,
            Recognizer::after_line(
                "get-js-main-module-name",
                AnchorKind::MemberDeclaration,
                r"override\s+fun\s+getJSMainModuleName\(\)\s*:\s*String\s*=.*$",
            )?,
            Recognizer::after_scope("get-packages-end", GET_PACKAGES)?,
        ],
        scope_end: Some(Recognizer::scope_end("host-object-end", HOST_OBJECT)?),
        low_confidence: Vec::new(),
        fallback_code: None,
    };

    Ok(TransformPipeline::new(FileClass::ApplicationEntry, Platform::Android)
        .step(imports)
        .step(on_create)
        .step(packages)
        .step(accessor))
}

/// Register the SDK package in `getPackages`, making the list mutable first.
#[derive(Debug)]
struct PackageRegistration {
    fragment: Fragment,
    mutable_declaration: String,
    immutable: Regex,
    mutable: Regex,
    get_packages: Regex,
    return_line: Recognizer,
}

impl PackageRegistration {
    /// Scope of `getPackages`, or the whole buffer when it has none.
    fn declaration_region<'a>(&self, buffer: &'a str) -> &'a str {
        anchor::find_scope(buffer, &self.get_packages).map_or(buffer, |scope| &buffer[scope.inner()])
    }
}

impl Step for PackageRegistration {
    fn name(&self) -> &'static str {
        "packages-registration"
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        if self.return_line.recognize(&buffer).is_none() {
            if !self.fragment.is_present(&buffer) {
                sink.not_found(
                    Platform::Android,
                    "packages-return",
                    "'return packages' not found in getPackages(); package registration skipped",
                );
            }
            return buffer;
        }

        let region = self.declaration_region(&buffer);
        let immutable = self.immutable.is_match(region);
        let mutable = self.mutable.is_match(region);
        let buffer = if immutable {
            let result = inject::replace_statement(buffer, &self.immutable, &self.mutable_declaration);
            debug!(outcome = ?result.outcome, "packages list declaration");
            result.buffer
        } else {
            if !mutable && !self.fragment.is_present(&buffer) {
                sink.push(
                    Platform::Android,
                    DiagnosticKind::Fallback,
                    "packages-declaration",
                    "packages list declaration not recognized; registration added before 'return packages', check that the list is mutable",
                );
            }
            buffer
        };

        // Offsets moved if the declaration was rewritten.
        let anchor = self.return_line.recognize(&buffer);
        let result = inject::inject(buffer, &self.fragment, anchor, None);
        if result.outcome == Outcome::AnchorNotFound {
            sink.not_found(
                Platform::Android,
                "packages-return",
                "'return packages' not found in getPackages(); package registration skipped",
            );
        }
        result.buffer
    }
}
