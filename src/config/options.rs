// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Per-collaborator option blocks
//!
//! All mode-dependent behavior lives in these declarative blocks, derived
//! once per run by [`BuildContext::new`](crate::config::BuildContext::new).
//! Tasks read their block and never branch on the mode themselves.

use serde::Serialize;
use std::collections::BTreeSet;

/// Options handed to the script bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformOptions {
    /// Emit an inline source map with the bundle
    pub source_map: bool,
    /// Syntax target for down-leveling (e.g. "es2015")
    pub target: String,
}

/// Options handed to the minifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinifyOptions {
    /// Shorten identifier names
    pub mangle: bool,
    /// Run the compression passes (dead-code elimination etc.)
    pub compress: bool,
    /// Re-indent the output for readability
    pub beautify: bool,
    /// Emit a source map
    pub source_map: bool,
    /// Embed the original sources in the source map
    pub include_sources: bool,
    /// Compression passes disabled by name even when `compress` is on
    pub optimization_exclusions: BTreeSet<String>,
    /// Comment prepended verbatim to the minified artifact
    pub banner: String,
}

impl MinifyOptions {
    /// True if the named compression pass must stay disabled.
    pub fn excludes(&self, optimization: &str) -> bool {
        self.optimization_exclusions.contains(optimization)
    }
}

/// Stylesheet output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputStyle {
    /// Human-readable, one declaration per line
    Expanded,
    /// Whitespace stripped
    Compressed,
}

/// Options handed to the stylesheet compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleOptions {
    pub output_style: OutputStyle,
    pub source_map: bool,
    /// Annotate output with the originating selector locations
    pub source_comments: bool,
    /// Indent width for expanded output
    pub indent_width: usize,
}

/// Options handed to the CSS post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostProcessOptions {
    pub source_map: bool,
    /// Print compact output. The post-processor reprints the stylesheet, so
    /// this must track the compiler's output style or release CSS would come
    /// back expanded.
    pub minify: bool,
}
