// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

use async_trait::async_trait;
use std::sync::Arc;

use crate::collaborators::AssetCopier;
use crate::config::BuildContext;
use crate::errors::AssetflowResult;
use crate::registry::{ActionOutcome, TaskAction};

/// Mirrors the image sources into `dist/images/`.
pub struct CopyImagesAction {
    copier: Arc<dyn AssetCopier>,
}

impl CopyImagesAction {
    pub fn new(copier: Arc<dyn AssetCopier>) -> Self {
        Self { copier }
    }
}

#[async_trait]
impl TaskAction for CopyImagesAction {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome> {
        let copied = self
            .copier
            .copy_tree(&ctx.layout.images_root, &ctx.images_dest())
            .await?;
        let noun = if copied.len() == 1 { "file" } else { "files" };
        let summary = format!("copied {} {noun}", copied.len());
        Ok(ActionOutcome::published(copied).with_summary(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{manifest, Mode, ProjectInfo, ProjectLayout};
    use chrono::NaiveDate;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct ScriptedCopier(Vec<&'static str>);

    #[async_trait]
    impl AssetCopier for ScriptedCopier {
        async fn copy_tree(
            &self,
            _src: &Path,
            dest: &Path,
        ) -> AssetflowResult<Vec<PathBuf>> {
            Ok(self.0.iter().map(|name| dest.join(name)).collect())
        }
    }

    fn make_ctx(root: &Path) -> BuildContext {
        let layout = ProjectLayout::resolve(root, &manifest::PathOverrides::default());
        let project = ProjectInfo {
            name: "player".to_string(),
            version: "1.2.3".to_string(),
            commit: None,
            built_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        };
        BuildContext::new(Mode::Release, layout, project)
    }

    #[tokio::test]
    async fn test_summary_counts_copied_files() {
        let dir = TempDir::new().unwrap();
        let ctx = make_ctx(dir.path());

        let action = CopyImagesAction::new(Arc::new(ScriptedCopier(vec![
            "logo.svg",
            "icons/play.svg",
        ])));
        let outcome = action.run(&ctx).await.unwrap();

        assert_eq!(outcome.summary.as_deref(), Some("copied 2 files"));
        assert_eq!(
            outcome.outputs,
            [
                ctx.images_dest().join("logo.svg"),
                ctx.images_dest().join("icons/play.svg"),
            ]
        );
    }

    #[tokio::test]
    async fn test_single_file_summary_is_singular() {
        let dir = TempDir::new().unwrap();
        let ctx = make_ctx(dir.path());

        let action = CopyImagesAction::new(Arc::new(ScriptedCopier(vec!["logo.svg"])));
        let outcome = action.run(&ctx).await.unwrap();
        assert_eq!(outcome.summary.as_deref(), Some("copied 1 file"));
    }
}
