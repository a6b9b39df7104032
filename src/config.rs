//! Run configuration loaded from a JSON file.
//!
//! A missing `ios` or `android` section disables that platform. Deployment
//! keys not given in the file are read from the environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{PatchError, PatchResult};
use crate::profile::IntegrationProfile;

pub const IOS_KEY_ENV: &str = "IOS_CODEPUSH_DEPLOYMENT_KEY";
pub const ANDROID_KEY_ENV: &str = "ANDROID_CODEPUSH_DEPLOYMENT_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatcherConfig {
    pub ios: Option<IosConfig>,
    pub android: Option<AndroidConfig>,
    #[serde(default)]
    pub profile: IntegrationProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IosConfig {
    pub deployment_key: Option<String>,
    pub server_url: Option<String>,
    /// Directory name under `ios/` holding the app sources.
    pub project_name: Option<String>,
    /// Explicit application delegate path, relative to the project root.
    pub app_delegate: Option<PathBuf>,
    pub info_plist: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub deployment_key: Option<String>,
    pub server_url: Option<String>,
    /// Application package, e.g. `com.example.app`.
    pub package: String,
    /// Native Android project directory, relative to the project root.
    #[serde(default = "default_android_root")]
    pub project_root: PathBuf,
}

fn default_android_root() -> PathBuf {
    PathBuf::from("android")
}

impl PatcherConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> PatchResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json(&text)?;
        config.fill_keys_from_env();
        Ok(config)
    }

    pub fn from_json(text: &str) -> PatchResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PatchResult<()> {
        if let Some(android) = &self.android {
            let valid = !android.package.is_empty()
                && android
                    .package
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_'));
            if !valid {
                return Err(PatchError::Config(format!(
                    "android.package is not a valid package name: {:?}",
                    android.package
                )));
            }
        }
        if let Some(ios) = &self.ios {
            if ios.project_name.is_none() && ios.app_delegate.is_none() {
                return Err(PatchError::Config(
                    "ios requires either projectName or appDelegate".to_owned(),
                ));
            }
        }
        Ok(())
    }

    /// Fill missing deployment keys from the environment, warning when a
    /// platform still has none.
    pub fn fill_keys_from_env(&mut self) {
        self.fill_keys_with(|name| std::env::var(name).ok());
    }

    fn fill_keys_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ios) = &mut self.ios {
            if ios.deployment_key.is_none() {
                ios.deployment_key = lookup(IOS_KEY_ENV);
            }
            if ios.deployment_key.is_none() {
                warn!("{IOS_KEY_ENV} is not set; the iOS deployment key will not be written");
            }
        }
        if let Some(android) = &mut self.android {
            if android.deployment_key.is_none() {
                android.deployment_key = lookup(ANDROID_KEY_ENV);
            }
            if android.deployment_key.is_none() {
                warn!("{ANDROID_KEY_ENV} is not set; the Android deployment key will not be written");
            }
        }
    }
}

impl IosConfig {
    pub fn app_delegate_path(&self) -> PathBuf {
        self.app_delegate.clone().unwrap_or_else(|| {
            Path::new("ios")
                .join(self.project_name.as_deref().unwrap_or_default())
                .join("AppDelegate.swift")
        })
    }

    /// Property list path, if one can be determined.
    pub fn info_plist_path(&self) -> Option<PathBuf> {
        self.info_plist.clone().or_else(|| {
            self.project_name
                .as_ref()
                .map(|name| Path::new("ios").join(name).join("Info.plist"))
        })
    }
}

impl AndroidConfig {
    /// Package name as a nested directory path: `a.b.c` → `a/b/c`.
    pub fn package_dir(&self) -> PathBuf {
        self.package.split('.').collect()
    }

    pub fn main_application_path(&self) -> PathBuf {
        self.project_root
            .join("app/src/main/java")
            .join(self.package_dir())
            .join("MainApplication.kt")
    }

    pub fn build_script_path(&self) -> PathBuf {
        self.project_root.join("app/build.gradle")
    }

    /// Kotlin-script variant of the build script.
    pub fn build_script_kts_path(&self) -> PathBuf {
        self.project_root.join("app/build.gradle.kts")
    }

    pub fn strings_path(&self) -> PathBuf {
        self.project_root.join("app/src/main/res/values/strings.xml")
    }
}
