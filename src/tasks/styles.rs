// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

use async_trait::async_trait;
use std::sync::Arc;
use tokio::fs;

use crate::collaborators::{PostProcessor, StyleCompiler};
use crate::config::BuildContext;
use crate::errors::{AssetflowError, AssetflowResult};
use crate::registry::{ActionOutcome, TaskAction};
use crate::utils::fs::publish_atomic;

/// Compiles the style tree into `dist/<name>.css`.
pub struct CompileStylesAction {
    compiler: Arc<dyn StyleCompiler>,
}

impl CompileStylesAction {
    pub fn new(compiler: Arc<dyn StyleCompiler>) -> Self {
        Self { compiler }
    }
}

#[async_trait]
impl TaskAction for CompileStylesAction {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome> {
        let css = self
            .compiler
            .compile(&ctx.layout.style_entry, &ctx.style)
            .await?;
        let dest = ctx.stylesheet_path();
        publish_atomic(&dest, css.as_bytes()).await?;
        Ok(ActionOutcome::published(vec![dest]))
    }
}

/// Rewrites `dist/<name>.css` in place with vendor prefixes for the
/// supported browsers.
pub struct AutoprefixAction {
    post_processor: Arc<dyn PostProcessor>,
}

impl AutoprefixAction {
    pub fn new(post_processor: Arc<dyn PostProcessor>) -> Self {
        Self { post_processor }
    }
}

#[async_trait]
impl TaskAction for AutoprefixAction {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome> {
        let path = ctx.stylesheet_path();
        let css = match fs::read_to_string(&path).await {
            Ok(css) => css,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssetflowError::FileNotFound {
                    path,
                    help: Some(
                        "The compile-styles task produces this file; run it first".to_string(),
                    ),
                });
            }
            Err(e) => return Err(AssetflowError::file_read(&path, e)),
        };

        let processed = self.post_processor.process(&css, &ctx.post_process).await?;
        publish_atomic(&path, processed.as_bytes()).await?;
        Ok(ActionOutcome::published(vec![path]))
    }
}
