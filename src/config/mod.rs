// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Build configuration
//!
//! A [`BuildContext`] is assembled once at startup and shared read-only by
//! every task. Switching between debug and release never reaches into task
//! code; the two modes differ only in the option blocks derived here.

pub mod manifest;
pub mod options;

pub use manifest::{FileConfig, ProjectInfo};
pub use options::{
    MinifyOptions, OutputStyle, PostProcessOptions, StyleOptions, TransformOptions,
};

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Syntax target for bundled scripts.
pub const SCRIPT_TARGET: &str = "es2015";

/// Indent width for expanded stylesheet output.
const STYLE_INDENT: usize = 3;

/// Build mode. Selects one of two fixed option derivations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Readable artifacts with source maps, for local iteration
    Debug,
    /// Minified artifacts without source maps, for publishing
    Release,
}

impl Mode {
    pub fn is_debug(self) -> bool {
        matches!(self, Mode::Debug)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Debug => write!(f, "debug"),
            Mode::Release => write!(f, "release"),
        }
    }
}

/// Where sources live and where artifacts land, as absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub scripts_root: PathBuf,
    pub script_entry: PathBuf,
    pub styles_root: PathBuf,
    pub style_entry: PathBuf,
    pub images_root: PathBuf,
    pub dist_root: PathBuf,
    /// Internal state directory (fingerprints), never watched
    pub stamp_dir: PathBuf,
}

impl ProjectLayout {
    /// Conventional layout under `root`, with `assetflow.toml` overrides
    /// applied. Entry points follow their section root unless overridden
    /// explicitly.
    pub fn resolve(root: &Path, overrides: &manifest::PathOverrides) -> Self {
        let join = |p: &str| root.join(p);

        let scripts_root = overrides
            .scripts
            .as_deref()
            .map(join)
            .unwrap_or_else(|| root.join("src").join("js"));
        let script_entry = overrides
            .script_entry
            .as_deref()
            .map(join)
            .unwrap_or_else(|| scripts_root.join("index.js"));
        let styles_root = overrides
            .styles
            .as_deref()
            .map(join)
            .unwrap_or_else(|| root.join("src").join("scss"));
        let style_entry = overrides
            .style_entry
            .as_deref()
            .map(join)
            .unwrap_or_else(|| styles_root.join("main.scss"));
        let images_root = overrides
            .images
            .as_deref()
            .map(join)
            .unwrap_or_else(|| root.join("src").join("images"));
        let dist_root = overrides
            .dist
            .as_deref()
            .map(join)
            .unwrap_or_else(|| root.join("dist"));

        Self {
            root: root.to_path_buf(),
            scripts_root,
            script_entry,
            styles_root,
            style_entry,
            images_root,
            dist_root,
            stamp_dir: root.join(".assetflow"),
        }
    }

    /// Glob matching every script source.
    pub fn script_sources(&self) -> String {
        glob_under(&self.scripts_root, "**/*.js")
    }

    /// Glob matching every stylesheet source.
    pub fn style_sources(&self) -> String {
        glob_under(&self.styles_root, "**/*.scss")
    }

    /// Glob matching every image source.
    pub fn image_sources(&self) -> String {
        glob_under(&self.images_root, "**/*")
    }

    /// Manifest files that feed the build context itself. Edits to these
    /// invalidate everything.
    pub fn manifest_files(&self) -> Vec<PathBuf> {
        vec![
            self.root.join("package.json"),
            self.root.join(FileConfig::FILE_NAME),
        ]
    }

    pub fn fingerprint_path(&self) -> PathBuf {
        self.stamp_dir.join("fingerprints.json")
    }
}

fn glob_under(root: &Path, suffix: &str) -> String {
    format!("{}/{}", root.to_string_lossy().trim_end_matches('/'), suffix)
}

/// Everything a task is allowed to read: mode, layout, project identity and
/// the option blocks for each collaborator. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub mode: Mode,
    pub layout: ProjectLayout,
    pub project: ProjectInfo,
    pub transform: TransformOptions,
    pub minify: MinifyOptions,
    pub style: StyleOptions,
    pub post_process: PostProcessOptions,
}

impl BuildContext {
    /// Derive every option block from the mode. This is the only place in
    /// the codebase that inspects the mode for behavior; a new mode-sensitive
    /// knob belongs here, not in a task.
    pub fn new(mode: Mode, layout: ProjectLayout, project: ProjectInfo) -> Self {
        let banner = banner(&project);

        let (transform, minify, style, post_process) = match mode {
            Mode::Release => (
                TransformOptions {
                    source_map: false,
                    target: SCRIPT_TARGET.to_string(),
                },
                MinifyOptions {
                    mangle: true,
                    compress: true,
                    beautify: false,
                    source_map: false,
                    include_sources: false,
                    // merge_vars reuses variable names aggressively and has
                    // produced broken runtime behavior in bundled output, so
                    // it stays off even though release enables every other
                    // compression pass.
                    optimization_exclusions: BTreeSet::from(["merge_vars".to_string()]),
                    banner,
                },
                StyleOptions {
                    output_style: OutputStyle::Compressed,
                    source_map: false,
                    source_comments: false,
                    indent_width: STYLE_INDENT,
                },
                PostProcessOptions {
                    source_map: false,
                    minify: true,
                },
            ),
            Mode::Debug => (
                TransformOptions {
                    source_map: true,
                    target: SCRIPT_TARGET.to_string(),
                },
                MinifyOptions {
                    mangle: false,
                    compress: false,
                    beautify: true,
                    source_map: true,
                    include_sources: true,
                    optimization_exclusions: BTreeSet::new(),
                    banner,
                },
                StyleOptions {
                    output_style: OutputStyle::Expanded,
                    source_map: true,
                    source_comments: true,
                    indent_width: STYLE_INDENT,
                },
                PostProcessOptions {
                    source_map: true,
                    minify: false,
                },
            ),
        };

        Self {
            mode,
            layout,
            project,
            transform,
            minify,
            style,
            post_process,
        }
    }

    /// `dist/<name>.js`, the readable bundle.
    pub fn bundle_path(&self) -> PathBuf {
        self.layout
            .dist_root
            .join(format!("{}.js", self.project.name))
    }

    /// `dist/<name>.min.js`, the distributable script.
    pub fn minified_path(&self) -> PathBuf {
        self.layout
            .dist_root
            .join(format!("{}.min.js", self.project.name))
    }

    /// `dist/<name>.css`, the distributable stylesheet.
    pub fn stylesheet_path(&self) -> PathBuf {
        self.layout
            .dist_root
            .join(format!("{}.css", self.project.name))
    }

    /// `dist/images/`, mirror of the image sources.
    pub fn images_dest(&self) -> PathBuf {
        self.layout.dist_root.join("images")
    }
}

/// Identity comment stamped onto distributable artifacts, e.g.
/// `/*! video-player 2026-01-15 1.2.3 (4f9c2aa) */`.
fn banner(project: &ProjectInfo) -> String {
    let date = project.built_on.format("%Y-%m-%d");
    match &project.commit {
        Some(commit) => format!(
            "/*! {} {} {} ({}) */",
            project.name, date, project.version, commit
        ),
        None => format!("/*! {} {} {} */", project.name, date, project.version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_project() -> ProjectInfo {
        ProjectInfo {
            name: "player".to_string(),
            version: "1.2.3".to_string(),
            commit: Some("4f9c2aa".to_string()),
            built_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        }
    }

    fn make_layout() -> ProjectLayout {
        ProjectLayout::resolve(
            Path::new("/work/player"),
            &manifest::PathOverrides::default(),
        )
    }

    fn make_context(mode: Mode) -> BuildContext {
        BuildContext::new(mode, make_layout(), make_project())
    }

    #[test]
    fn test_release_enables_minification_without_maps() {
        let ctx = make_context(Mode::Release);

        assert!(ctx.minify.mangle);
        assert!(ctx.minify.compress);
        assert!(!ctx.minify.beautify);
        assert!(!ctx.minify.source_map);
        assert!(!ctx.transform.source_map);
        assert!(!ctx.post_process.source_map);
        assert!(ctx.post_process.minify);
        assert_eq!(ctx.style.output_style, OutputStyle::Compressed);
    }

    #[test]
    fn test_release_keeps_merge_vars_disabled() {
        let ctx = make_context(Mode::Release);
        assert!(ctx.minify.excludes("merge_vars"));
    }

    #[test]
    fn test_debug_keeps_output_readable() {
        let ctx = make_context(Mode::Debug);

        assert!(!ctx.minify.mangle);
        assert!(!ctx.minify.compress);
        assert!(ctx.minify.beautify);
        assert!(ctx.minify.source_map);
        assert!(ctx.minify.include_sources);
        assert!(ctx.transform.source_map);
        assert!(ctx.style.source_map);
        assert!(ctx.style.source_comments);
        assert!(!ctx.post_process.minify);
        assert_eq!(ctx.style.output_style, OutputStyle::Expanded);
        assert!(ctx.minify.optimization_exclusions.is_empty());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(make_context(Mode::Release), make_context(Mode::Release));
        assert_eq!(make_context(Mode::Debug), make_context(Mode::Debug));
    }

    #[test]
    fn test_artifact_paths_use_project_name() {
        let ctx = make_context(Mode::Release);

        assert_eq!(ctx.bundle_path(), Path::new("/work/player/dist/player.js"));
        assert_eq!(
            ctx.minified_path(),
            Path::new("/work/player/dist/player.min.js")
        );
        assert_eq!(
            ctx.stylesheet_path(),
            Path::new("/work/player/dist/player.css")
        );
        assert_eq!(ctx.images_dest(), Path::new("/work/player/dist/images"));
    }

    #[test]
    fn test_banner_includes_identity() {
        let ctx = make_context(Mode::Release);
        assert_eq!(ctx.minify.banner, "/*! player 2026-01-15 1.2.3 (4f9c2aa) */");

        let mut project = make_project();
        project.commit = None;
        let ctx = BuildContext::new(Mode::Release, make_layout(), project);
        assert_eq!(ctx.minify.banner, "/*! player 2026-01-15 1.2.3 */");
    }

    #[test]
    fn test_layout_defaults() {
        let layout = make_layout();

        assert_eq!(layout.script_entry, Path::new("/work/player/src/js/index.js"));
        assert_eq!(
            layout.style_entry,
            Path::new("/work/player/src/scss/main.scss")
        );
        assert_eq!(layout.script_sources(), "/work/player/src/js/**/*.js");
        assert_eq!(layout.style_sources(), "/work/player/src/scss/**/*.scss");
        assert_eq!(
            layout.fingerprint_path(),
            Path::new("/work/player/.assetflow/fingerprints.json")
        );
    }

    #[test]
    fn test_layout_entry_follows_overridden_root() {
        let overrides = manifest::PathOverrides {
            scripts: Some("lib/js".to_string()),
            ..Default::default()
        };
        let layout = ProjectLayout::resolve(Path::new("/work/player"), &overrides);

        assert_eq!(layout.scripts_root, Path::new("/work/player/lib/js"));
        assert_eq!(layout.script_entry, Path::new("/work/player/lib/js/index.js"));
    }
}
