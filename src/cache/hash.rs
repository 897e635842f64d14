// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Task fingerprints
//!
//! A fingerprint covers everything that determines a task's output: the
//! contents of every input file, the declared output paths and the full set
//! of derived option blocks. Changing the mode, the banner or a single
//! source byte yields a different fingerprint.

use crate::config::BuildContext;
use crate::errors::{AssetflowError, AssetflowResult};
use crate::registry::Task;
use crate::utils::fs::expand_globs;

/// Computes fingerprints against one fixed build context.
pub struct Fingerprinter {
    context_digest: String,
}

impl Fingerprinter {
    pub fn new(ctx: &BuildContext) -> Self {
        let options = serde_json::to_string(&(
            &ctx.mode,
            &ctx.transform,
            &ctx.minify,
            &ctx.style,
            &ctx.post_process,
        ))
        .unwrap_or_default();
        Self {
            context_digest: blake3::hash(options.as_bytes()).to_hex().to_string(),
        }
    }

    /// Fingerprint of `task` as its inputs stand right now.
    pub fn fingerprint(&self, task: &Task) -> AssetflowResult<String> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.context_digest.as_bytes());
        hasher.update(task.name.as_bytes());

        for path in expand_globs(&task.inputs)? {
            hasher.update(path.to_string_lossy().as_bytes());
            let contents =
                std::fs::read(&path).map_err(|e| AssetflowError::file_read(&path, e))?;
            hasher.update(blake3::hash(&contents).as_bytes());
        }
        for output in &task.outputs {
            hasher.update(output.to_string_lossy().as_bytes());
        }

        Ok(hasher.finalize().to_hex().to_string())
    }
}
