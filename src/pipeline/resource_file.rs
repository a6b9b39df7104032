//! Key/value resource files: Android `strings.xml` and the iOS `Info.plist`.

use super::steps::{Markup, ResourceStep};
use super::{FileClass, TransformPipeline};
use crate::diagnostics::Platform;
use crate::patch::resources::{self, ResourceEntry};
use crate::profile::IntegrationProfile;

/// Entries for the configured deployment key and server URL. Absent values
/// are left out rather than written empty.
pub fn entries(profile: &IntegrationProfile, deployment_key: Option<&str>, server_url: Option<&str>) -> Vec<ResourceEntry> {
    let mut list = Vec::new();
    if let Some(key) = deployment_key.filter(|k| !k.is_empty()) {
        resources::upsert(&mut list, ResourceEntry::new(profile.deployment_key_name.clone(), key));
    }
    if let Some(url) = server_url.filter(|u| !u.is_empty()) {
        resources::upsert(&mut list, ResourceEntry::new(profile.server_url_name.clone(), url));
    }
    list
}

pub fn strings_pipeline(entries: Vec<ResourceEntry>) -> TransformPipeline {
    TransformPipeline::new(FileClass::Resource, Platform::Android).step(ResourceStep {
        platform: Platform::Android,
        code: "strings-xml",
        markup: Markup::StringsXml,
        entries,
    })
}

pub fn plist_pipeline(entries: Vec<ResourceEntry>) -> TransformPipeline {
    TransformPipeline::new(FileClass::Resource, Platform::Ios).step(ResourceStep {
        platform: Platform::Ios,
        code: "info-plist",
        markup: Markup::PropertyList,
        entries,
    })
}
