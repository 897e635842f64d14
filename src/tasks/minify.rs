// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

use async_trait::async_trait;
use std::sync::Arc;
use tokio::fs;

use crate::collaborators::Minifier;
use crate::config::BuildContext;
use crate::errors::{AssetflowError, AssetflowResult};
use crate::registry::{ActionOutcome, TaskAction};
use crate::utils::fs::publish_atomic;

/// Compresses the bundle into `dist/<name>.min.js` and stamps the identity
/// banner on the first line. The banner goes on after minification so no
/// compression pass can strip it.
pub struct MinifyAction {
    minifier: Arc<dyn Minifier>,
}

impl MinifyAction {
    pub fn new(minifier: Arc<dyn Minifier>) -> Self {
        Self { minifier }
    }
}

#[async_trait]
impl TaskAction for MinifyAction {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome> {
        let bundle = ctx.bundle_path();
        let source = match fs::read_to_string(&bundle).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetflowError::FileNotFound {
                    path: bundle,
                    help: Some("The bundle task produces this file; run it first".to_string()),
                });
            }
            Err(e) => return Err(AssetflowError::file_read(&bundle, e)),
        };

        let minified = self.minifier.minify(&source, &ctx.minify).await?;
        let stamped = format!("{}\n{}", ctx.minify.banner, minified);
        let dest = ctx.minified_path();
        publish_atomic(&dest, stamped.as_bytes()).await?;
        Ok(ActionOutcome::published(vec![dest]))
    }
}
