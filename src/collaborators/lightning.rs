// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! CSS post-processing backed by the in-process `lightningcss` crate.
//!
//! The compiled stylesheet is parsed, lowered for the supported browser
//! floors (vendor prefixes included) and reprinted. Reprinting discards
//! the compiler's formatting, so the printer's minify switch has to track
//! the build mode or a release build would come back expanded.

use async_trait::async_trait;
use lightningcss::stylesheet::{
    MinifyOptions as CssMinifyOptions, ParserOptions, PrinterOptions, StyleSheet,
};
use lightningcss::targets::{Browsers, Targets};
use tracing::debug;

use super::PostProcessor;
use crate::config::PostProcessOptions;
use crate::errors::{AssetflowError, AssetflowResult};

/// Versions are encoded as `major << 16 | minor << 8 | patch`.
const fn version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor << 8)
}

/// Browser floors the player stylesheets are authored against.
fn supported_browsers() -> Browsers {
    Browsers {
        android: Some(version(67, 0)),
        chrome: Some(version(60, 0)),
        edge: Some(version(16, 0)),
        firefox: Some(version(60, 0)),
        ie: Some(version(11, 0)),
        ios_saf: Some(version(10, 3)),
        opera: Some(version(50, 0)),
        safari: Some(version(11, 0)),
        samsung: Some(version(8, 0)),
        ..Browsers::default()
    }
}

pub struct LightningPostProcessor {
    targets: Browsers,
}

impl LightningPostProcessor {
    pub fn new() -> Self {
        Self {
            targets: supported_browsers(),
        }
    }
}

impl Default for LightningPostProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostProcessor for LightningPostProcessor {
    async fn process(&self, css: &str, options: &PostProcessOptions) -> AssetflowResult<String> {
        if options.source_map {
            debug!("prefixer does not carry source maps through; emitting plain css");
        }

        let targets = Targets::from(self.targets);
        let mut stylesheet = StyleSheet::parse(css, ParserOptions::default()).map_err(|e| {
            AssetflowError::PostProcessFailed {
                message: e.to_string(),
            }
        })?;
        stylesheet
            .minify(CssMinifyOptions {
                targets,
                ..CssMinifyOptions::default()
            })
            .map_err(|e| AssetflowError::PostProcessFailed {
                message: e.to_string(),
            })?;
        let output = stylesheet
            .to_css(PrinterOptions {
                minify: options.minify,
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| AssetflowError::PostProcessFailed {
                message: e.to_string(),
            })?;
        Ok(output.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> PostProcessOptions {
        PostProcessOptions {
            source_map: false,
            minify: false,
        }
    }

    #[tokio::test]
    async fn test_adds_vendor_prefixes_for_floor_browsers() {
        let css = ".controls {\n  user-select: none;\n}\n";
        let out = LightningPostProcessor::new()
            .process(css, &plain())
            .await
            .unwrap();
        assert!(out.contains("-webkit-user-select"));
        assert!(out.contains("user-select"));
    }

    #[tokio::test]
    async fn test_expanded_print_stays_readable() {
        let css = ".player {\n  margin: 8px;\n}\n";
        let out = LightningPostProcessor::new()
            .process(css, &plain())
            .await
            .unwrap();
        assert!(out.contains(".player {"));
    }

    #[tokio::test]
    async fn test_minified_print_collapses_rules() {
        let css = ".player {\n  margin: 8px;\n}\n";
        let out = LightningPostProcessor::new()
            .process(
                css,
                &PostProcessOptions {
                    source_map: false,
                    minify: true,
                },
            )
            .await
            .unwrap();
        assert!(out.contains(".player{margin:8px}"));
    }

    #[tokio::test]
    async fn test_unparseable_css_is_rejected() {
        let err = LightningPostProcessor::new()
            .process(".player { margin: }", &plain())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetflowError::PostProcessFailed { .. }));
    }
}
