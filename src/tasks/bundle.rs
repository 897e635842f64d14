// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

use async_trait::async_trait;
use std::sync::Arc;

use crate::collaborators::Bundler;
use crate::config::BuildContext;
use crate::errors::AssetflowResult;
use crate::registry::{ActionOutcome, TaskAction};
use crate::utils::fs::publish_atomic;

/// Bundles the script entry point and everything it imports into a single
/// module at `dist/<name>.js`.
pub struct BundleAction {
    bundler: Arc<dyn Bundler>,
}

impl BundleAction {
    pub fn new(bundler: Arc<dyn Bundler>) -> Self {
        Self { bundler }
    }
}

#[async_trait]
impl TaskAction for BundleAction {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome> {
        let bundled = self
            .bundler
            .bundle(&ctx.layout.script_entry, &ctx.transform)
            .await?;
        let dest = ctx.bundle_path();
        publish_atomic(&dest, bundled.as_bytes()).await?;
        Ok(ActionOutcome::published(vec![dest]))
    }
}
