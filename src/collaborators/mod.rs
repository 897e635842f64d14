// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! External collaborators
//!
//! The five tools the build orchestrates, behind narrow async traits so
//! tasks never know whether a collaborator shells out to a binary or runs
//! in-process. Tests substitute recording stubs; production code uses
//! [`Toolchain::with_default_tools`].

pub mod copier;
pub mod esbuild;
pub mod lightning;
pub mod sass;
pub mod terser;

pub use copier::GlobCopier;
pub use esbuild::EsbuildBundler;
pub use lightning::LightningPostProcessor;
pub use sass::GrassCompiler;
pub use terser::TerserMinifier;

use crate::config::{MinifyOptions, PostProcessOptions, StyleOptions, TransformOptions};
use crate::errors::AssetflowResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Program name of the external script bundler.
pub const ESBUILD: &str = "esbuild";

/// Program name of the external minifier.
pub const TERSER: &str = "terser";

/// Bundles the module graph rooted at an entry file into one script.
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn bundle(&self, entry: &Path, options: &TransformOptions)
        -> AssetflowResult<String>;

    /// External binary this bundler shells out to, if any. Schedules naming
    /// a task wired to it are refused before any task runs when the binary
    /// is not on `PATH`.
    fn required_tool(&self) -> Option<&'static str> {
        None
    }
}

/// Minifies (or, in debug, beautifies) a bundled script.
#[async_trait]
pub trait Minifier: Send + Sync {
    async fn minify(&self, source: &str, options: &MinifyOptions)
        -> AssetflowResult<String>;

    /// External binary this minifier shells out to, if any.
    fn required_tool(&self) -> Option<&'static str> {
        None
    }
}

/// Compiles a stylesheet entry into CSS.
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    async fn compile(&self, entry: &Path, options: &StyleOptions)
        -> AssetflowResult<String>;
}

/// Rewrites compiled CSS for the supported browser set.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    async fn process(&self, css: &str, options: &PostProcessOptions)
        -> AssetflowResult<String>;
}

/// Mirrors a source tree into a destination directory.
#[async_trait]
pub trait AssetCopier: Send + Sync {
    async fn copy_tree(
        &self,
        src_root: &Path,
        dest_root: &Path,
    ) -> AssetflowResult<Vec<PathBuf>>;
}

/// The collaborator set a run is wired with.
#[derive(Clone)]
pub struct Toolchain {
    pub bundler: Arc<dyn Bundler>,
    pub minifier: Arc<dyn Minifier>,
    pub styles: Arc<dyn StyleCompiler>,
    pub post_processor: Arc<dyn PostProcessor>,
    pub copier: Arc<dyn AssetCopier>,
}

impl Toolchain {
    /// The production wiring: esbuild and terser as external binaries,
    /// Sass compilation and CSS post-processing in-process, plus the glob
    /// copier. Binary discovery happens per run, so constructing the
    /// toolchain never fails on a machine missing a tool it will not use.
    pub fn with_default_tools() -> Self {
        Self {
            bundler: Arc::new(EsbuildBundler),
            minifier: Arc::new(TerserMinifier),
            styles: Arc::new(GrassCompiler),
            post_processor: Arc::new(LightningPostProcessor::new()),
            copier: Arc::new(GlobCopier),
        }
    }
}
