// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

use async_trait::async_trait;

use crate::config::BuildContext;
use crate::errors::AssetflowResult;
use crate::registry::{ActionOutcome, TaskAction};
use crate::utils::fs::clean_dir;

/// Removes the distribution directory so a following build starts from
/// nothing. Stale artifacts from renamed projects would otherwise linger.
pub struct CleanAction;

#[async_trait]
impl TaskAction for CleanAction {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome> {
        clean_dir(&ctx.layout.dist_root).await?;
        Ok(ActionOutcome::empty())
    }
}
