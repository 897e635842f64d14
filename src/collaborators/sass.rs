// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Sass compiler backed by the in-process `grass` crate.
//!
//! Compilation is synchronous CPU work, so it runs on the blocking pool
//! rather than a runtime worker. Imports resolve relative to the entry
//! file, which is why the whole style tree feeds the fingerprint while
//! only the entry is handed to the compiler.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::StyleCompiler;
use crate::config::{OutputStyle, StyleOptions};
use crate::errors::{AssetflowError, AssetflowResult};

pub struct GrassCompiler;

#[async_trait]
impl StyleCompiler for GrassCompiler {
    async fn compile(&self, entry: &Path, options: &StyleOptions) -> AssetflowResult<String> {
        if !entry.exists() {
            return Err(AssetflowError::FileNotFound {
                path: entry.to_path_buf(),
                help: Some(
                    "Create the style entry point or override paths.style_entry".to_string(),
                ),
            });
        }
        if options.source_map || options.source_comments {
            debug!("grass emits neither source maps nor source comments; skipping those options");
        }

        let style = match options.output_style {
            OutputStyle::Expanded => grass::OutputStyle::Expanded,
            OutputStyle::Compressed => grass::OutputStyle::Compressed,
        };
        let path = entry.to_path_buf();
        let compiled = tokio::task::spawn_blocking(move || {
            let opts = grass::Options::default().style(style);
            grass::from_path(&path, &opts).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| AssetflowError::Io {
            message: e.to_string(),
        })?;

        compiled.map_err(|message| AssetflowError::StyleCompileFailed {
            entry: entry.to_path_buf(),
            message,
        })
    }
}
