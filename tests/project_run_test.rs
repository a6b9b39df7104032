//! End-to-end runs over a generated project tree on disk.

use std::fs;
use std::path::Path;

use native_patcher::{run, DiagnosticKind, DiskStore, PatcherConfig, RunOptions};

const APP_DELEGATE: &str = "import Expo
import React

@UIApplicationMain
public class AppDelegate: ExpoAppDelegate {
  override func bundleURL() -> URL? {
    return Bundle.main.url(forResource: \"main\", withExtension: \"jsbundle\")
  }
}
";

const INFO_PLIST: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<plist version=\"1.0\">
<dict>
\t<key>CFBundleName</key>
\t<string>Demo</string>
</dict>
</plist>
";

const MAIN_APPLICATION: &str = "package com.example.demo

import android.app.Application
import com.facebook.react.PackageList
import com.facebook.react.ReactPackage
import com.facebook.react.defaults.DefaultReactNativeHost

class MainApplication : Application(), ReactApplication {
  override val reactNativeHost: ReactNativeHost = object : DefaultReactNativeHost(this) {
    override fun getPackages(): List<ReactPackage> {
      val packages = PackageList(this).packages
      return packages
    }

    override fun getJSMainModuleName(): String = \"index\"
  }

  override fun onCreate() {
    super.onCreate()
  }
}
";

const BUILD_GRADLE: &str = "android {
    namespace 'com.example.demo'
}
";

const STRINGS: &str = "<resources>
  <string name=\"app_name\">Demo</string>
</resources>
";

const CONFIG: &str = r#"{
    "ios": { "deploymentKey": "ios-key", "serverUrl": "https://updates.example.com", "projectName": "Demo" },
    "android": { "deploymentKey": "android-key", "package": "com.example.demo" }
}"#;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
    fs::write(path, text).expect("write fixture");
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).expect("read")
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(root, "ios/Demo/AppDelegate.swift", APP_DELEGATE);
    write(root, "ios/Demo/Info.plist", INFO_PLIST);
    write(root, "android/app/src/main/java/com/example/demo/MainApplication.kt", MAIN_APPLICATION);
    write(root, "android/app/build.gradle", BUILD_GRADLE);
    write(root, "android/app/src/main/res/values/strings.xml", STRINGS);
    dir
}

#[test]
fn test_full_project_run() {
    let dir = project();
    let config = PatcherConfig::from_json(CONFIG).expect("valid config");
    let store = DiskStore::new(dir.path());

    let report = run(&config, &store, RunOptions::default()).expect("run");
    assert!(!report.has_failures(), "failures: {:?}", report.failures);
    assert_eq!(report.files.len(), 5);
    assert!(report.files.iter().all(|f| f.changed));
    assert!(report.diagnostics.is_empty(), "diagnostics: {:?}", report.diagnostics);

    let root = dir.path();
    assert!(read(root, "ios/Demo/AppDelegate.swift").contains("return CodePush.bundleURL()"));
    assert!(read(root, "ios/Demo/Info.plist")
        .contains("\t<key>CodePushDeploymentKey</key>\n\t<string>ios-key</string>\n"));
    let kotlin = read(root, "android/app/src/main/java/com/example/demo/MainApplication.kt");
    assert!(kotlin.contains("packages.add(codePushInstance)"));
    assert!(kotlin.contains("override fun getJSBundleFile(): String"));
    assert!(read(root, "android/app/build.gradle").contains("react {\n    bundleAssetName = \"main.jsbundle\"\n}\n"));
    assert!(read(root, "android/app/src/main/res/values/strings.xml")
        .contains("<string name=\"CodePushDeploymentKey\" translatable=\"false\">android-key</string>"));
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = project();
    let config = PatcherConfig::from_json(CONFIG).expect("valid config");
    let store = DiskStore::new(dir.path());

    run(&config, &store, RunOptions::default()).expect("first run");
    let snapshot = read(dir.path(), "android/app/build.gradle");
    let report = run(&config, &store, RunOptions::default()).expect("second run");

    assert!(report.files.iter().all(|f| !f.changed));
    assert_eq!(read(dir.path(), "android/app/build.gradle"), snapshot);
}

#[test]
fn test_dry_run_leaves_files_alone() {
    let dir = project();
    let config = PatcherConfig::from_json(CONFIG).expect("valid config");
    let store = DiskStore::new(dir.path());

    let report = run(&config, &store, RunOptions { dry_run: true }).expect("run");
    assert_eq!(read(dir.path(), "android/app/build.gradle"), BUILD_GRADLE);
    assert!(report.files.iter().all(|f| f.diff.is_some()));
}

#[test]
fn test_missing_native_project_is_reported() {
    let dir = project();
    fs::remove_dir_all(dir.path().join("ios")).expect("remove ios");
    let config = PatcherConfig::from_json(CONFIG).expect("valid config");
    let store = DiskStore::new(dir.path());

    let report = run(&config, &store, RunOptions::default()).expect("run");
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.missing_target));
    assert_eq!(report.files.len(), 3);
}

#[test]
fn test_missing_lifecycle_method_only_reports_that() {
    let dir = project();
    let without_on_create = MAIN_APPLICATION
        .replace("\n  override fun onCreate() {\n    super.onCreate()\n  }\n", "");
    write(
        dir.path(),
        "android/app/src/main/java/com/example/demo/MainApplication.kt",
        &without_on_create,
    );
    let config = PatcherConfig::from_json(CONFIG).expect("valid config");
    let store = DiskStore::new(dir.path());

    let report = run(&config, &store, RunOptions::default()).expect("run");
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].code, "lifecycle-method");
    assert_eq!(report.diagnostics[0].kind, DiagnosticKind::StructuralNotFound);

    let kotlin = read(dir.path(), "android/app/src/main/java/com/example/demo/MainApplication.kt");
    assert!(kotlin.contains("import com.microsoft.codepush.react.CodePush"));
    assert!(kotlin.contains("packages.add(codePushInstance)"));
    assert!(kotlin.contains("override fun getJSBundleFile(): String"));
}
