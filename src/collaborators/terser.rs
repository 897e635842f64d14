// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Minifier backed by the external `terser` binary.
//!
//! Source is piped through stdin and the result read from stdout. The
//! option block maps onto terser's flags; named optimization exclusions
//! become `name=false` entries in the compress flag, so compression stays
//! on while the excluded pass stays off.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{Minifier, TERSER};
use crate::config::MinifyOptions;
use crate::errors::{AssetflowError, AssetflowResult};

pub struct TerserMinifier;

impl TerserMinifier {
    fn build_args(options: &MinifyOptions) -> Vec<String> {
        let mut args = Vec::new();
        if options.mangle {
            args.push("--mangle".to_string());
        }
        if options.compress {
            args.push("--compress".to_string());
            if !options.optimization_exclusions.is_empty() {
                // BTreeSet iteration keeps the flag deterministic.
                let disabled: Vec<String> = options
                    .optimization_exclusions
                    .iter()
                    .map(|name| format!("{name}=false"))
                    .collect();
                args.push(disabled.join(","));
            }
        }
        if options.beautify {
            args.push("--format".to_string());
            args.push("beautify=true".to_string());
        }
        if options.source_map {
            args.push("--source-map".to_string());
            let mut spec = Vec::new();
            if options.include_sources {
                spec.push("includeSources=true");
            }
            spec.push("url=inline");
            args.push(spec.join(","));
        }
        args
    }
}

#[async_trait]
impl Minifier for TerserMinifier {
    async fn minify(&self, source: &str, options: &MinifyOptions) -> AssetflowResult<String> {
        let binary =
            which::which(TERSER).map_err(|_| AssetflowError::tool_not_found(TERSER))?;

        let mut child = Command::new(binary)
            .args(Self::build_args(options))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AssetflowError::ToolFailed {
                tool: TERSER.to_string(),
                message: e.to_string(),
                help: Some("Ensure terser is installed and executable".to_string()),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| AssetflowError::ToolFailed {
            tool: TERSER.to_string(),
            message: "could not open stdin".to_string(),
            help: None,
        })?;
        stdin
            .write_all(source.as_bytes())
            .await
            .map_err(|e| AssetflowError::ToolFailed {
                tool: TERSER.to_string(),
                message: e.to_string(),
                help: None,
            })?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AssetflowError::ToolFailed {
                tool: TERSER.to_string(),
                message: e.to_string(),
                help: None,
            })?;

        if !output.status.success() {
            return Err(AssetflowError::MinifyFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn required_tool(&self) -> Option<&'static str> {
        Some(TERSER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn release_options() -> MinifyOptions {
        MinifyOptions {
            mangle: true,
            compress: true,
            beautify: false,
            source_map: false,
            include_sources: false,
            optimization_exclusions: BTreeSet::from(["merge_vars".to_string()]),
            banner: String::new(),
        }
    }

    fn debug_options() -> MinifyOptions {
        MinifyOptions {
            mangle: false,
            compress: false,
            beautify: true,
            source_map: true,
            include_sources: true,
            optimization_exclusions: BTreeSet::new(),
            banner: String::new(),
        }
    }

    #[test]
    fn test_release_flags_keep_excluded_pass_off() {
        let args = TerserMinifier::build_args(&release_options());
        assert_eq!(args, ["--mangle", "--compress", "merge_vars=false"]);
    }

    #[test]
    fn test_debug_flags_beautify_with_inline_map() {
        let args = TerserMinifier::build_args(&debug_options());
        assert_eq!(
            args,
            [
                "--format",
                "beautify=true",
                "--source-map",
                "includeSources=true,url=inline",
            ]
        );
    }

    #[test]
    fn test_compress_without_exclusions_is_bare() {
        let mut options = release_options();
        options.optimization_exclusions.clear();
        let args = TerserMinifier::build_args(&options);
        assert_eq!(args, ["--mangle", "--compress"]);
    }
}
