// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Built-in tasks and pipelines
//!
//! The registry mirrors the artifact flow of a front-end library build:
//! scripts are bundled then minified, styles are compiled then prefixed,
//! images are mirrored as-is. `build` runs all three strands; `clean`
//! stands alone so a cached rebuild never starts from an empty tree.

pub mod bundle;
pub mod clean;
pub mod images;
pub mod minify;
pub mod styles;

pub use bundle::BundleAction;
pub use clean::CleanAction;
pub use images::CopyImagesAction;
pub use minify::MinifyAction;
pub use styles::{AutoprefixAction, CompileStylesAction};

use std::sync::Arc;

use crate::collaborators::Toolchain;
use crate::config::BuildContext;
use crate::errors::AssetflowResult;
use crate::registry::{Task, TaskRegistry};

/// The standard task set, wired to `tools` and laid out per `ctx`. Tool
/// requirements come from the collaborators themselves, so a stubbed
/// toolchain needs nothing on `PATH`.
pub fn default_registry(
    ctx: &BuildContext,
    tools: &Toolchain,
) -> AssetflowResult<TaskRegistry> {
    let mut registry = TaskRegistry::new();

    registry.register(
        Task::new("clean", Arc::new(CleanAction))
            .describe("remove the distribution directory")
            .uncacheable(),
    )?;

    let mut task = Task::new("bundle", Arc::new(BundleAction::new(Arc::clone(&tools.bundler))))
        .describe("bundle script sources into a single module")
        .reads(ctx.layout.script_sources())
        .writes(ctx.bundle_path());
    if let Some(tool) = tools.bundler.required_tool() {
        task = task.needs_tool(tool);
    }
    registry.register(task)?;

    let mut task = Task::new("minify", Arc::new(MinifyAction::new(Arc::clone(&tools.minifier))))
        .describe("compress the bundle and stamp the release banner")
        .reads(ctx.layout.script_sources())
        .writes(ctx.minified_path())
        .after("bundle");
    if let Some(tool) = tools.minifier.required_tool() {
        task = task.needs_tool(tool);
    }
    registry.register(task)?;

    registry.register(
        Task::new(
            "compile-styles",
            Arc::new(CompileStylesAction::new(Arc::clone(&tools.styles))),
        )
        .describe("compile the style tree to css")
        .reads(ctx.layout.style_sources())
        .writes(ctx.stylesheet_path()),
    )?;

    registry.register(
        Task::new(
            "autoprefix",
            Arc::new(AutoprefixAction::new(Arc::clone(&tools.post_processor))),
        )
        .describe("add vendor prefixes for the supported browsers")
        .reads(ctx.layout.style_sources())
        .writes(ctx.stylesheet_path())
        .after("compile-styles"),
    )?;

    registry.register(
        Task::new(
            "copy-images",
            Arc::new(CopyImagesAction::new(Arc::clone(&tools.copier))),
        )
        .describe("mirror image sources into the distribution")
        .reads(ctx.layout.image_sources())
        .writes(ctx.images_dest()),
    )?;

    registry.register_pipeline(
        "build-js",
        "bundle and minify the scripts",
        vec!["bundle".to_string(), "minify".to_string()],
    )?;
    registry.register_pipeline(
        "build-css",
        "compile and prefix the styles",
        vec!["compile-styles".to_string(), "autoprefix".to_string()],
    )?;
    registry.register_pipeline(
        "build",
        "produce every distributable artifact",
        vec![
            "build-js".to_string(),
            "build-css".to_string(),
            "copy-images".to_string(),
        ],
    )?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        copier::GlobCopier, Bundler, Minifier, PostProcessor, StyleCompiler,
    };
    use crate::config::{
        manifest, MinifyOptions, Mode, PostProcessOptions, ProjectInfo, ProjectLayout,
        StyleOptions, TransformOptions,
    };
    use crate::pipeline::{ExecutionOptions, TaskExecutor, TaskGraph, TaskStatus};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct StubBundler;

    #[async_trait]
    impl Bundler for StubBundler {
        async fn bundle(
            &self,
            entry: &Path,
            _options: &TransformOptions,
        ) -> AssetflowResult<String> {
            let source = std::fs::read_to_string(entry).unwrap();
            Ok(format!("(function () {{\n{source}}})();\n"))
        }
    }

    struct StubMinifier;

    #[async_trait]
    impl Minifier for StubMinifier {
        async fn minify(
            &self,
            source: &str,
            _options: &MinifyOptions,
        ) -> AssetflowResult<String> {
            Ok(source.split_whitespace().collect::<Vec<_>>().join(" "))
        }
    }

    struct StubStyles;

    #[async_trait]
    impl StyleCompiler for StubStyles {
        async fn compile(
            &self,
            entry: &Path,
            _options: &StyleOptions,
        ) -> AssetflowResult<String> {
            Ok(std::fs::read_to_string(entry).unwrap())
        }
    }

    struct StubPost;

    #[async_trait]
    impl PostProcessor for StubPost {
        async fn process(
            &self,
            css: &str,
            _options: &PostProcessOptions,
        ) -> AssetflowResult<String> {
            Ok(css.replace("user-select", "-webkit-user-select"))
        }
    }

    struct RecordingBundler {
        seen: Mutex<Option<TransformOptions>>,
    }

    #[async_trait]
    impl Bundler for RecordingBundler {
        async fn bundle(
            &self,
            entry: &Path,
            options: &TransformOptions,
        ) -> AssetflowResult<String> {
            *self.seen.lock().unwrap() = Some(options.clone());
            Ok(std::fs::read_to_string(entry).unwrap())
        }
    }

    struct RecordingMinifier {
        seen: Mutex<Option<MinifyOptions>>,
    }

    #[async_trait]
    impl Minifier for RecordingMinifier {
        async fn minify(
            &self,
            source: &str,
            options: &MinifyOptions,
        ) -> AssetflowResult<String> {
            *self.seen.lock().unwrap() = Some(options.clone());
            Ok(source.to_string())
        }
    }

    fn stub_toolchain() -> Toolchain {
        Toolchain {
            bundler: Arc::new(StubBundler),
            minifier: Arc::new(StubMinifier),
            styles: Arc::new(StubStyles),
            post_processor: Arc::new(StubPost),
            copier: Arc::new(GlobCopier),
        }
    }

    fn make_ctx_in(mode: Mode, root: &Path) -> BuildContext {
        let layout = ProjectLayout::resolve(root, &manifest::PathOverrides::default());
        let project = ProjectInfo {
            name: "player".to_string(),
            version: "1.2.3".to_string(),
            commit: None,
            built_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        };
        BuildContext::new(mode, layout, project)
    }

    fn make_ctx(root: &Path) -> BuildContext {
        make_ctx_in(Mode::Release, root)
    }

    fn scaffold_project(root: &Path) {
        fs::create_dir_all(root.join("src").join("js")).unwrap();
        fs::write(root.join("src").join("js").join("index.js"), "var player = 1;\n").unwrap();
        fs::create_dir_all(root.join("src").join("scss")).unwrap();
        fs::write(
            root.join("src").join("scss").join("main.scss"),
            ".player { user-select: none; }\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("src").join("images")).unwrap();
        fs::write(root.join("src").join("images").join("logo.svg"), "<svg/>").unwrap();
    }

    fn artifact_bytes(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let dist = root.join("dist");
        let mut files: Vec<PathBuf> = walk(&dist);
        files.sort();
        files
            .into_iter()
            .map(|p| {
                let bytes = fs::read(&p).unwrap();
                (p, bytes)
            })
            .collect()
    }

    fn walk(dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                files.extend(walk(&path));
            } else {
                files.push(path);
            }
        }
        files
    }

    #[test]
    fn test_build_schedule_follows_declaration_order() {
        let dir = TempDir::new().unwrap();
        let ctx = make_ctx(dir.path());
        let registry = default_registry(&ctx, &stub_toolchain()).unwrap();

        let graph = TaskGraph::build(&registry).unwrap();
        assert_eq!(
            graph.resolve("build").unwrap(),
            ["bundle", "minify", "compile-styles", "autoprefix", "copy-images"]
        );
        assert_eq!(graph.resolve("build-js").unwrap(), ["bundle", "minify"]);
        assert_eq!(
            graph.resolve("build-css").unwrap(),
            ["compile-styles", "autoprefix"]
        );
        assert_eq!(graph.resolve("clean").unwrap(), ["clean"]);
    }

    #[tokio::test]
    async fn test_full_build_produces_every_artifact() {
        let dir = TempDir::new().unwrap();
        scaffold_project(dir.path());
        let ctx = make_ctx(dir.path());
        let registry = default_registry(&ctx, &stub_toolchain()).unwrap();
        let schedule = TaskGraph::build(&registry).unwrap().resolve("build").unwrap();

        let mut executor = TaskExecutor::new(
            &registry,
            Arc::new(ctx.clone()),
            ExecutionOptions {
                use_cache: false,
                ..Default::default()
            },
        );
        let report = executor.run("build", &schedule).await.unwrap();
        assert!(report.succeeded());

        let dist = dir.path().join("dist");
        let bundled = fs::read_to_string(dist.join("player.js")).unwrap();
        assert!(bundled.contains("var player = 1;"));

        let minified = fs::read_to_string(dist.join("player.min.js")).unwrap();
        let mut lines = minified.lines();
        assert_eq!(lines.next(), Some("/*! player 2026-01-15 1.2.3 */"));
        assert_eq!(
            lines.next(),
            Some("(function () { var player = 1; })();")
        );

        let css = fs::read_to_string(dist.join("player.css")).unwrap();
        assert!(css.contains("-webkit-user-select"));

        assert_eq!(
            fs::read_to_string(dist.join("images").join("logo.svg")).unwrap(),
            "<svg/>"
        );
    }

    #[tokio::test]
    async fn test_rebuild_is_byte_identical_and_cached() {
        let dir = TempDir::new().unwrap();
        scaffold_project(dir.path());
        let ctx = Arc::new(make_ctx(dir.path()));
        let registry = default_registry(&ctx, &stub_toolchain()).unwrap();
        let schedule = TaskGraph::build(&registry).unwrap().resolve("build").unwrap();

        let mut first =
            TaskExecutor::new(&registry, Arc::clone(&ctx), ExecutionOptions::default());
        assert!(first.run("build", &schedule).await.unwrap().succeeded());
        let before = artifact_bytes(dir.path());

        let mut second =
            TaskExecutor::new(&registry, Arc::clone(&ctx), ExecutionOptions::default());
        let report = second.run("build", &schedule).await.unwrap();
        assert!(report
            .results
            .iter()
            .all(|r| r.status == TaskStatus::Cached));
        assert_eq!(artifact_bytes(dir.path()), before);

        // Without the cache the tasks rerun, and still land on the same bytes.
        let mut third = TaskExecutor::new(
            &registry,
            Arc::clone(&ctx),
            ExecutionOptions {
                use_cache: false,
                ..Default::default()
            },
        );
        assert!(third.run("build", &schedule).await.unwrap().succeeded());
        assert_eq!(artifact_bytes(dir.path()), before);
    }

    #[tokio::test]
    async fn test_script_edit_reruns_only_the_script_strand() {
        let dir = TempDir::new().unwrap();
        scaffold_project(dir.path());
        let ctx = Arc::new(make_ctx(dir.path()));
        let registry = default_registry(&ctx, &stub_toolchain()).unwrap();
        let schedule = TaskGraph::build(&registry).unwrap().resolve("build").unwrap();

        let mut first =
            TaskExecutor::new(&registry, Arc::clone(&ctx), ExecutionOptions::default());
        assert!(first.run("build", &schedule).await.unwrap().succeeded());

        fs::write(
            dir.path().join("src").join("js").join("index.js"),
            "var player = 2;\n",
        )
        .unwrap();

        let mut second =
            TaskExecutor::new(&registry, Arc::clone(&ctx), ExecutionOptions::default());
        let report = second.run("build", &schedule).await.unwrap();
        let status_of = |name: &str| {
            report
                .results
                .iter()
                .find(|r| r.task == name)
                .unwrap()
                .status
        };
        assert_eq!(status_of("bundle"), TaskStatus::Success);
        assert_eq!(status_of("minify"), TaskStatus::Success);
        assert_eq!(status_of("compile-styles"), TaskStatus::Cached);
        assert_eq!(status_of("autoprefix"), TaskStatus::Cached);
        assert_eq!(status_of("copy-images"), TaskStatus::Cached);

        let minified = fs::read_to_string(dir.path().join("dist").join("player.min.js")).unwrap();
        assert!(minified.contains("var player = 2;"));
    }

    #[test]
    fn test_registry_validates_cleanly() {
        let dir = TempDir::new().unwrap();
        let ctx = make_ctx(dir.path());
        let registry = default_registry(&ctx, &stub_toolchain()).unwrap();
        registry.validate().unwrap();

        let names: Vec<&str> = registry.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            ["clean", "bundle", "minify", "compile-styles", "autoprefix", "copy-images"]
        );
        let pipelines: Vec<&str> = registry
            .pipelines()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(pipelines, ["build-js", "build-css", "build"]);
        // The stubs run in-process, so nothing needs a preflight lookup.
        assert!(registry.tasks().iter().all(|t| t.requires_tool.is_none()));
    }

    #[test]
    fn test_default_tools_require_the_external_binaries() {
        let dir = TempDir::new().unwrap();
        let ctx = make_ctx(dir.path());
        let registry = default_registry(&ctx, &Toolchain::with_default_tools()).unwrap();

        let tool_of = |name: &str| registry.task(name).unwrap().requires_tool.clone();
        assert_eq!(tool_of("bundle").as_deref(), Some("esbuild"));
        assert_eq!(tool_of("minify").as_deref(), Some("terser"));
        assert_eq!(tool_of("compile-styles"), None);
        assert_eq!(tool_of("autoprefix"), None);
        assert_eq!(tool_of("copy-images"), None);
    }

    #[tokio::test]
    async fn test_context_options_reach_the_collaborators() {
        let dir = TempDir::new().unwrap();
        scaffold_project(dir.path());

        let (transform, minify) = options_seen_in_mode(Mode::Release, dir.path()).await;
        assert!(!transform.source_map);
        assert!(minify.mangle);
        assert!(minify.compress);
        assert!(minify.excludes("merge_vars"));
        assert!(!minify.source_map);
        assert!(!minify.beautify);

        let (transform, minify) = options_seen_in_mode(Mode::Debug, dir.path()).await;
        assert!(transform.source_map);
        assert!(!minify.mangle);
        assert!(!minify.compress);
        assert!(minify.beautify);
        assert!(minify.source_map);
        assert!(minify.include_sources);
    }

    /// Runs `build-js` with recording collaborators and returns the option
    /// blocks they were handed.
    async fn options_seen_in_mode(
        mode: Mode,
        root: &Path,
    ) -> (TransformOptions, MinifyOptions) {
        let ctx = Arc::new(make_ctx_in(mode, root));
        let bundler = Arc::new(RecordingBundler {
            seen: Mutex::new(None),
        });
        let minifier = Arc::new(RecordingMinifier {
            seen: Mutex::new(None),
        });
        let tools = Toolchain {
            bundler: Arc::clone(&bundler) as Arc<dyn Bundler>,
            minifier: Arc::clone(&minifier) as Arc<dyn Minifier>,
            styles: Arc::new(StubStyles),
            post_processor: Arc::new(StubPost),
            copier: Arc::new(GlobCopier),
        };
        let registry = default_registry(&ctx, &tools).unwrap();
        let schedule = TaskGraph::build(&registry)
            .unwrap()
            .resolve("build-js")
            .unwrap();

        let mut executor = TaskExecutor::new(
            &registry,
            Arc::clone(&ctx),
            ExecutionOptions {
                use_cache: false,
                ..Default::default()
            },
        );
        assert!(executor.run("build-js", &schedule).await.unwrap().succeeded());

        let transform = bundler.seen.lock().unwrap().clone().unwrap();
        let minify = minifier.seen.lock().unwrap().clone().unwrap();
        (transform, minify)
    }
}
