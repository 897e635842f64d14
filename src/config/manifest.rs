// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Project manifests
//!
//! Library name and version come from `package.json` when one exists, so
//! artifacts keep the names downstream consumers already depend on. An
//! optional `assetflow.toml` overrides layout paths and watcher tuning.

use crate::errors::{AssetflowError, AssetflowResult};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// The subset of `package.json` the build cares about.
#[derive(Debug, Clone, Deserialize)]
struct PackageManifest {
    name: Option<String>,
    version: Option<String>,
}

/// Identity of the library being built, stamped into banners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    /// Short commit hash, when the project root is a git checkout
    pub commit: Option<String>,
    /// Build date, stamped into the banner
    pub built_on: NaiveDate,
}

impl ProjectInfo {
    /// Read the project identity from `root`.
    ///
    /// Falls back to the directory name and `0.0.0` when no manifest is
    /// present, so scratch directories still build.
    pub async fn detect(root: &Path) -> AssetflowResult<Self> {
        let manifest_path = root.join("package.json");
        let manifest = match std::fs::read_to_string(&manifest_path) {
            Ok(raw) => {
                serde_json::from_str::<PackageManifest>(&raw).map_err(|e| {
                    AssetflowError::ManifestParse {
                        path: manifest_path.clone(),
                        message: e.to_string(),
                    }
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no package.json at {}", manifest_path.display());
                PackageManifest {
                    name: None,
                    version: None,
                }
            }
            Err(e) => return Err(AssetflowError::file_read(&manifest_path, e)),
        };

        let name = manifest
            .name
            .unwrap_or_else(|| directory_name(root))
            .trim_start_matches('@')
            .replace('/', "-");
        let version = manifest.version.unwrap_or_else(|| "0.0.0".to_string());

        Ok(Self {
            name,
            version,
            commit: detect_commit(root).await,
            built_on: Local::now().date_naive(),
        })
    }
}

fn directory_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "library".to_string())
}

/// Ask git for the short commit hash. Absent git, or a root that is not a
/// checkout, just means no commit in the banner.
async fn detect_commit(root: &Path) -> Option<String> {
    let git = which::which("git").ok()?;
    let output = tokio::process::Command::new(git)
        .arg("-C")
        .arg(root)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if hash.is_empty() {
        None
    } else {
        Some(hash)
    }
}

// ─────────────────────────────────────────────────────────────────────────
// assetflow.toml
// ─────────────────────────────────────────────────────────────────────────

/// Optional project-level configuration. Every field falls back to the
/// conventional layout when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub project: ProjectOverrides,
    #[serde(default)]
    pub paths: PathOverrides,
    #[serde(default)]
    pub watch: WatchOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectOverrides {
    pub name: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathOverrides {
    pub scripts: Option<String>,
    pub script_entry: Option<String>,
    pub styles: Option<String>,
    pub style_entry: Option<String>,
    pub images: Option<String>,
    pub dist: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchOverrides {
    /// Quiet window in milliseconds before a rebuild fires
    pub debounce_ms: Option<u64>,
}

impl FileConfig {
    pub const FILE_NAME: &'static str = "assetflow.toml";

    /// Load `assetflow.toml` from `root`, or defaults when there is none.
    pub fn load(root: &Path) -> AssetflowResult<Self> {
        let path = root.join(Self::FILE_NAME);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(AssetflowError::file_read(&path, e)),
        };
        toml::from_str(&raw).map_err(|e| AssetflowError::ConfigParse {
            path,
            message: e.to_string(),
        })
    }

    /// Apply name/version overrides on top of a detected identity.
    pub fn apply_to(&self, mut project: ProjectInfo) -> ProjectInfo {
        if let Some(name) = &self.project.name {
            project.name = name.clone();
        }
        if let Some(version) = &self.project.version {
            project.version = version.clone();
        }
        project
    }
}
