//! Integration payload: the vendor-specific text the pipelines inject.
//!
//! Nothing in here is interpreted by the engine beyond presence checks. The
//! defaults describe an over-the-air JS bundle update SDK; every field can be
//! overridden from the configuration file.

use serde::Deserialize;

/// All injected fragments and resource key names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrationProfile {
    /// Import line added to the iOS application delegate.
    pub ios_import: String,
    /// Import line used when the delegate is Objective-C.
    pub ios_import_objc: String,
    /// Any of these present means the iOS import is already there.
    pub ios_import_markers: Vec<String>,
    /// Swift replacement for the bundle URL override.
    pub ios_bundle_url_swift: String,
    /// Objective-C replacement for the bundle URL method.
    pub ios_bundle_url_objc: String,

    /// Imports for the Android main application. `{package}` is replaced
    /// with the application package name.
    pub android_imports: Vec<String>,
    /// Statement block run during application start-up.
    pub android_init_call: String,
    pub android_init_marker: String,
    /// Statement block that registers the SDK package in `getPackages`.
    pub android_package_registration: String,
    pub android_package_marker: String,
    /// Declaration that makes the packages list mutable.
    pub android_mutable_packages: String,
    /// Accessor override returning the bundle file location.
    pub android_bundle_accessor: String,
    pub android_bundle_accessor_marker: String,

    /// Line applied at the end of the app build script.
    pub gradle_apply_line: String,
    /// `(block, field)` pairs placed inside `android { buildTypes { ... } }`.
    pub gradle_build_type_fields: Vec<BuildTypeField>,
    /// Block, key and full assignment of the simple block field.
    pub gradle_simple_block: String,
    pub gradle_simple_key: String,
    pub gradle_simple_field: String,

    /// Resource key names for the deployment key and server URL.
    pub deployment_key_name: String,
    pub server_url_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildTypeField {
    pub block: String,
    pub field: String,
}

impl IntegrationProfile {
    /// Android imports with `{package}` substituted.
    pub fn android_imports_for(&self, package: &str) -> Vec<String> {
        self.android_imports
            .iter()
            .map(|line| line.replace("{package}", package))
            .collect()
    }
}

impl Default for IntegrationProfile {
    fn default() -> Self {
        Self {
            ios_import: "import CodePush".to_owned(),
            ios_import_objc: "#import <CodePush/CodePush.h>".to_owned(),
            ios_import_markers: vec![
                "import CodePush".to_owned(),
                "#import <CodePush/CodePush.h>".to_owned(),
            ],
            ios_bundle_url_swift: IOS_BUNDLE_URL_SWIFT.to_owned(),
            ios_bundle_url_objc: IOS_BUNDLE_URL_OBJC.to_owned(),

            android_imports: vec![
                "import com.microsoft.codepush.react.CodePush".to_owned(),
                "import {package}.R".to_owned(),
                "import android.util.Log".to_owned(),
            ],
            android_init_call: ANDROID_INIT_CALL.to_owned(),
            android_init_marker: "CodePush.getInstance(deploymentKey, this, isDebugMode)".to_owned(),
            android_package_registration: ANDROID_PACKAGE_REGISTRATION.to_owned(),
            android_package_marker: "CodePush.getInstance(deploymentKey, this@MainApplication, isDebugMode)"
                .to_owned(),
            android_mutable_packages:
                "val packages: MutableList<ReactPackage> = PackageList(this).packages.toMutableList()"
                    .to_owned(),
            android_bundle_accessor: ANDROID_BUNDLE_ACCESSOR.to_owned(),
            android_bundle_accessor_marker: "override fun getJSBundleFile(): String".to_owned(),

            gradle_apply_line: "apply from: \"../../node_modules/@code-push-next/react-native-code-push/android/codepush.gradle\"".to_owned(),
            gradle_build_type_fields: vec![
                BuildTypeField {
                    block: "debug".to_owned(),
                    field: r#"buildConfigField "boolean", "DEBUG", "true""#.to_owned(),
                },
                BuildTypeField {
                    block: "release".to_owned(),
                    field: r#"buildConfigField "boolean", "DEBUG", "false""#.to_owned(),
                },
            ],
            gradle_simple_block: "react".to_owned(),
            gradle_simple_key: "bundleAssetName".to_owned(),
            gradle_simple_field: r#"bundleAssetName = "main.jsbundle""#.to_owned(),

            deployment_key_name: "CodePushDeploymentKey".to_owned(),
            server_url_name: "CodePushServerURL".to_owned(),
        }
    }
}

const IOS_BUNDLE_URL_SWIFT: &str = r#"override func bundleURL() -> URL? {
#if DEBUG
  return RCTBundleURLProvider.sharedSettings().jsBundleURL(forBundleRoot: ".expo/.virtual-metro-entry")
#else
  return CodePush.bundleURL()
#endif
}"#;

const IOS_BUNDLE_URL_OBJC: &str = r#"- (NSURL *)bundleURL
{
#if DEBUG
  return [[RCTBundleURLProvider sharedSettings] jsBundleURLForBundleRoot:@".expo/.virtual-metro-entry"];
#else
  return [CodePush bundleURL];
#endif
}"#;

const ANDROID_INIT_CALL: &str = r#"try {
    Log.d("CodePushDebug", "Attempting to pre-initialize CodePush in onCreate...")
    val deploymentKey = getString(R.string.CodePushDeploymentKey)
    val isDebugMode = BuildConfig.DEBUG
    CodePush.getInstance(deploymentKey, this, isDebugMode)
} catch (e: Exception) {
    Log.e("CodePushDebug", "Error pre-initializing CodePush in onCreate: " + e.message, e)
}"#;

const ANDROID_PACKAGE_REGISTRATION: &str = r#"try {
    val deploymentKey = getString(R.string.CodePushDeploymentKey)
    val isDebugMode = BuildConfig.DEBUG
    val codePushInstance = CodePush.getInstance(deploymentKey, this@MainApplication, isDebugMode)
    if (packages.none { it.javaClass.name == codePushInstance.javaClass.name }) {
        packages.add(codePushInstance)
    }
} catch (e: Exception) {
    Log.e("CodePushDebug", "Error adding CodePush to packages in getPackages: " + e.message, e)
}"#;

const ANDROID_BUNDLE_ACCESSOR: &str = r"override fun getJSBundleFile(): String {
    return CodePush.getJSBundleFile()
}";
