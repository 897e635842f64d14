// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Error types for the build orchestrator
//!
//! Configuration errors (bad registry or pipeline definitions) are detected
//! before any task runs; execution errors carry the failing task's name with
//! the collaborator's original error attached as the cause.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for assetflow operations
pub type AssetflowResult<T> = Result<T, AssetflowError>;

/// Main error type for assetflow
#[derive(Error, Debug, Diagnostic)]
pub enum AssetflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Registry / Pipeline Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Task '{task}' is already registered")]
    #[diagnostic(
        code(assetflow::duplicate_task),
        help("Task names are unique; rename one of the declarations")
    )]
    DuplicateTask { task: String },

    #[error("Pipeline '{name}' collides with an existing pipeline or task")]
    #[diagnostic(
        code(assetflow::duplicate_pipeline),
        help("Pipelines and tasks share one namespace; pick an unused name")
    )]
    DuplicatePipeline { name: String },

    #[error("Pipeline '{pipeline}' has no members")]
    #[diagnostic(code(assetflow::empty_pipeline))]
    EmptyPipeline { pipeline: String },

    #[error("'{referenced_by}' references unknown task '{task}'")]
    #[diagnostic(
        code(assetflow::unknown_task),
        help("Check that '{task}' is registered before it is referenced")
    )]
    UnknownTask { task: String, referenced_by: String },

    #[error("Unknown pipeline or task '{pipeline}'")]
    #[diagnostic(
        code(assetflow::unknown_pipeline),
        help("Run with --list to see the registered pipelines and tasks")
    )]
    UnknownPipeline { pipeline: String },

    #[error("Circular dependency: {}", path.join(" -> "))]
    #[diagnostic(
        code(assetflow::circular_dependency),
        help("Review the depends_on declarations to remove the cycle")
    )]
    CircularDependency { path: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Task '{task}' failed")]
    #[diagnostic(code(assetflow::task_failed))]
    TaskFailed {
        task: String,
        #[source]
        source: Box<AssetflowError>,
    },

    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(assetflow::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    #[error("Tool '{tool}' failed: {message}")]
    #[diagnostic(code(assetflow::tool_failed))]
    ToolFailed {
        tool: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Bundling '{}' failed: {message}", entry.display())]
    #[diagnostic(code(assetflow::bundle_failed))]
    BundleFailed { entry: PathBuf, message: String },

    #[error("Minification failed: {message}")]
    #[diagnostic(code(assetflow::minify_failed))]
    MinifyFailed { message: String },

    #[error("Compiling stylesheet '{}' failed: {message}", entry.display())]
    #[diagnostic(code(assetflow::style_compile_failed))]
    StyleCompileFailed { entry: PathBuf, message: String },

    #[error("CSS post-processing failed: {message}")]
    #[diagnostic(code(assetflow::post_process_failed))]
    PostProcessFailed { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Manifest / Config Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to parse manifest '{}': {message}", path.display())]
    #[diagnostic(
        code(assetflow::manifest_parse),
        help("The library manifest must be valid JSON with string name/version fields")
    )]
    ManifestParse { path: PathBuf, message: String },

    #[error("Failed to parse config '{}': {message}", path.display())]
    #[diagnostic(code(assetflow::config_parse))]
    ConfigParse { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("File not found: {}", path.display())]
    #[diagnostic(code(assetflow::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read '{}': {error}", path.display())]
    #[diagnostic(code(assetflow::file_read_error))]
    FileRead { path: PathBuf, error: String },

    #[error("Failed to write '{}': {error}", path.display())]
    #[diagnostic(code(assetflow::file_write_error))]
    FileWrite { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Watch / Cache / IO Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Watch error: {message}")]
    #[diagnostic(code(assetflow::watch_error))]
    Watch { message: String },

    #[error("Fingerprint cache error: {message}")]
    #[diagnostic(code(assetflow::cache_error))]
    Cache { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(assetflow::io_error))]
    Io { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(assetflow::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for AssetflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<notify::Error> for AssetflowError {
    fn from(e: notify::Error) -> Self {
        Self::Watch { message: e.to_string() }
    }
}

impl From<glob::PatternError> for AssetflowError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl AssetflowError {
    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        let suggestion = match tool {
            "esbuild" => "Install esbuild: https://esbuild.github.io/getting-started/".to_string(),
            "terser" => "Install terser: npm install --global terser".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion,
        }
    }

    /// Wrap a collaborator error with the failing task's name
    pub fn task_failed(task: &str, source: AssetflowError) -> Self {
        Self::TaskFailed {
            task: task.to_string(),
            source: Box::new(source),
        }
    }

    /// Create a file read error
    pub fn file_read(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create a file write error
    pub fn file_write(path: impl Into<PathBuf>, error: impl std::fmt::Display) -> Self {
        Self::FileWrite {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// True for errors that indicate a broken registry or pipeline
    /// definition rather than a failed build step.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTask { .. }
                | Self::DuplicatePipeline { .. }
                | Self::EmptyPipeline { .. }
                | Self::UnknownTask { .. }
                | Self::UnknownPipeline { .. }
                | Self::CircularDependency { .. }
        )
    }
}
