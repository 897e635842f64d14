// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Static asset copier.
//!
//! Mirrors a source tree into the distribution directory file by file.
//! Each file lands atomically, so a watcher rebuild that overlaps a read
//! never exposes a half-copied asset.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::AssetCopier;
use crate::errors::{AssetflowError, AssetflowResult};
use crate::utils::fs::{copy_atomic, expand_globs};

pub struct GlobCopier;

#[async_trait]
impl AssetCopier for GlobCopier {
    async fn copy_tree(&self, src: &Path, dest: &Path) -> AssetflowResult<Vec<PathBuf>> {
        let pattern = format!("{}/**/*", src.display());
        let files = expand_globs(&[pattern])?;
        if files.is_empty() {
            // A project without static assets is fine; there is nothing to mirror.
            debug!(src = %src.display(), "no static assets found");
            return Ok(Vec::new());
        }

        let mut copied = Vec::with_capacity(files.len());
        for file in files {
            let rel = file
                .strip_prefix(src)
                .map_err(|e| AssetflowError::Io {
                    message: e.to_string(),
                })?;
            let target = dest.join(rel);
            copy_atomic(&file, &target).await?;
            copied.push(target);
        }
        Ok(copied)
    }
}
