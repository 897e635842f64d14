// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Script bundler backed by the external `esbuild` binary.
//!
//! The bundle is read from esbuild's stdout rather than written by esbuild
//! itself, so publishing stays under the task's control.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::{Bundler, ESBUILD};
use crate::config::TransformOptions;
use crate::errors::{AssetflowError, AssetflowResult};

pub struct EsbuildBundler;

impl EsbuildBundler {
    fn build_command(binary: &Path, entry: &Path, options: &TransformOptions) -> Command {
        let mut cmd = Command::new(binary);
        cmd.arg(entry)
            .arg("--bundle")
            .arg(format!("--target={}", options.target))
            .arg("--log-level=warning")
            .arg("--color=false");
        if options.source_map {
            cmd.arg("--sourcemap=inline");
        }
        cmd
    }
}

#[async_trait]
impl Bundler for EsbuildBundler {
    async fn bundle(
        &self,
        entry: &Path,
        options: &TransformOptions,
    ) -> AssetflowResult<String> {
        if !entry.exists() {
            return Err(AssetflowError::FileNotFound {
                path: entry.to_path_buf(),
                help: Some(
                    "Create the script entry point or override paths.script_entry"
                        .to_string(),
                ),
            });
        }
        let binary =
            which::which(ESBUILD).map_err(|_| AssetflowError::tool_not_found(ESBUILD))?;

        let output = Self::build_command(&binary, entry, options)
            .output()
            .await
            .map_err(|e| AssetflowError::ToolFailed {
                tool: ESBUILD.to_string(),
                message: e.to_string(),
                help: Some("Ensure esbuild is installed and executable".to_string()),
            })?;

        if !output.status.success() {
            return Err(AssetflowError::BundleFailed {
                entry: entry.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn required_tool(&self) -> Option<&'static str> {
        Some(ESBUILD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(options: &TransformOptions) -> Vec<String> {
        let cmd = EsbuildBundler::build_command(
            Path::new("esbuild"),
            Path::new("src/js/index.js"),
            options,
        );
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_release_command_has_no_source_map() {
        let args = args_for(&TransformOptions {
            source_map: false,
            target: "es2015".to_string(),
        });

        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--target=es2015".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--sourcemap")));
    }

    #[test]
    fn test_debug_command_inlines_source_map() {
        let args = args_for(&TransformOptions {
            source_map: true,
            target: "es2015".to_string(),
        });

        assert!(args.contains(&"--sourcemap=inline".to_string()));
    }
}
