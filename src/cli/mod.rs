// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! CLI definitions and handlers
//!
//! One positional argument selects the pipeline (or bare task) to run;
//! `develop` is special-cased into the watch loop. Everything a handler
//! needs for a run is assembled once into a [`Session`].

pub mod run;
pub mod watch;

use clap::Parser;
use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::Toolchain;
use crate::config::{BuildContext, FileConfig, Mode, ProjectInfo, ProjectLayout};
use crate::errors::AssetflowResult;
use crate::pipeline::RunReport;
use crate::registry::TaskRegistry;
use crate::tasks::default_registry;
use crate::watch::DEFAULT_DEBOUNCE_MS;

/// Asset build orchestrator
///
/// Compile a front-end library's scripts, styles and images into
/// distributable artifacts.
#[derive(Parser, Debug)]
#[clap(
    name = "assetflow",
    version,
    about = "Asset build orchestrator: bundle, minify, compile and watch",
    long_about = None,
    after_help = "Examples:\n\
        assetflow                       Release build of every artifact\n\
        assetflow build --debug         Readable artifacts with source maps\n\
        assetflow build-js              Only the script strand\n\
        assetflow clean                 Remove the distribution directory\n\
        assetflow develop               Debug build, then rebuild on change\n\n\
        See 'assetflow --list' for every registered pipeline and task."
)]
pub struct Cli {
    /// Pipeline or task to run ('develop' watches for changes)
    #[clap(default_value = "build", value_name = "PIPELINE")]
    pub pipeline: String,

    /// Build readable artifacts with source maps instead of minified output
    #[clap(long)]
    pub debug: bool,

    /// Run up to N independent tasks concurrently
    #[clap(short, long, value_name = "N", default_value = "1")]
    pub jobs: usize,

    /// Skip the fingerprint cache and run every task
    #[clap(long)]
    pub no_cache: bool,

    /// Print the resolved schedule without executing it
    #[clap(long)]
    pub dry_run: bool,

    /// List registered pipelines and tasks, then exit
    #[clap(long)]
    pub list: bool,

    /// Enable verbose output
    #[clap(short, long)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

impl Cli {
    /// Mode selected by the flags. `develop` always builds debug artifacts,
    /// whatever the flag says; a watch loop serving minified output helps
    /// nobody.
    pub fn mode(&self) -> Mode {
        if self.debug || self.pipeline == "develop" {
            Mode::Debug
        } else {
            Mode::Release
        }
    }
}

/// Everything one invocation works against: the immutable context and the
/// validated registry. Constructing a session runs every startup check, so
/// a bad definition aborts here, before any task can run.
pub struct Session {
    pub ctx: Arc<BuildContext>,
    pub registry: TaskRegistry,
    /// Quiet window for the watch loop
    pub debounce: Duration,
}

impl Session {
    /// Assemble a session for the current directory.
    pub async fn prepare(mode: Mode) -> AssetflowResult<Self> {
        let root = std::env::current_dir()?;
        let file_config = FileConfig::load(&root)?;
        let project = file_config.apply_to(ProjectInfo::detect(&root).await?);
        let layout = ProjectLayout::resolve(&root, &file_config.paths);
        let ctx = Arc::new(BuildContext::new(mode, layout, project));

        let registry = default_registry(&ctx, &Toolchain::with_default_tools())?;
        registry.validate()?;

        let debounce = Duration::from_millis(
            file_config.watch.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
        );
        Ok(Self {
            ctx,
            registry,
            debounce,
        })
    }
}

/// Under `--verbose`, list the artifacts a successful run left behind.
pub(crate) fn print_artifacts(report: &RunReport) {
    let outputs: Vec<_> = report
        .results
        .iter()
        .flat_map(|r| r.outputs.iter())
        .collect();
    if outputs.is_empty() {
        return;
    }
    println!();
    println!("{}:", "Artifacts".bold());
    for output in outputs {
        println!("  - {}", output.display());
    }
}

/// Handle `--list`: print every registered task and pipeline.
pub async fn list(mode: Mode) -> Result<()> {
    let session = Session::prepare(mode).await?;

    println!();
    println!("{}:", "Tasks".bold());
    for task in session.registry.tasks() {
        let tool = task
            .requires_tool
            .as_deref()
            .map(|t| format!("  [needs {t}]").dimmed().to_string())
            .unwrap_or_default();
        println!("  {:<16} {}{tool}", task.name.cyan(), task.description);
    }

    println!();
    println!("{}:", "Pipelines".bold());
    for pipeline in session.registry.pipelines() {
        println!(
            "  {:<16} {}  {}",
            pipeline.name.cyan(),
            pipeline.description,
            format!("({})", pipeline.members.join(", ")).dimmed()
        );
    }
    println!(
        "  {:<16} {}  {}",
        "develop".cyan(),
        "debug build, then rebuild on change",
        "(build + watch)".dimmed()
    );
    println!();
    Ok(())
}
