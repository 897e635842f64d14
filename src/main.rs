// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! assetflow - Asset Build Orchestrator
//!
//! Compile a front-end library's scripts, styles and images into
//! distributable artifacts, once or on every change.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assetflow::cli::Cli;
use assetflow::pipeline::{Discipline, ExecutionOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    if cli.list {
        return assetflow::cli::list(cli.mode()).await;
    }

    let options = ExecutionOptions {
        discipline: if cli.jobs > 1 {
            Discipline::Parallel { jobs: cli.jobs }
        } else {
            Discipline::Sequential
        },
        use_cache: !cli.no_cache,
        dry_run: cli.dry_run,
    };

    match cli.pipeline.as_str() {
        "develop" => assetflow::cli::watch::run(options, cli.verbose).await,
        _ => {
            let mode = cli.mode();
            assetflow::cli::run::run(cli.pipeline, mode, options, cli.verbose).await
        }
    }
}
