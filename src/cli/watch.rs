// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Develop command - debug build once, then rebuild on change

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::{print_artifacts, Session};
use crate::config::Mode;
use crate::pipeline::{ExecutionOptions, TaskExecutor, TaskGraph};
use crate::watch::{ChangeWatcher, StopSignal};

/// Run the develop loop until Ctrl+C.
pub async fn run(options: ExecutionOptions, verbose: bool) -> Result<()> {
    let session = Session::prepare(Mode::Debug).await?;

    println!("{}", "Starting develop mode...".bold());
    println!(
        "Watching {} (debounce: {}ms)",
        session.ctx.layout.root.display(),
        session.debounce.as_millis()
    );
    println!("Press {} to exit.", "Ctrl+C".cyan());
    println!();

    // Resolution errors here are startup configuration errors and abort;
    // once the loop is running, failures only log and the watch continues.
    let graph = TaskGraph::build(&session.registry)?;
    let schedule = graph.resolve("build")?;
    initial_build(&session, &schedule, &options, verbose).await;

    let stop = StopSignal::new();
    let handler = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handler.stop();
        }
    });

    let mut watcher = ChangeWatcher::new(
        &session.registry,
        Arc::clone(&session.ctx),
        options,
        session.debounce,
        stop,
    )?;
    watcher.run().await?;

    println!("{}", "Develop mode stopped.".bold());
    Ok(())
}

async fn initial_build(
    session: &Session,
    schedule: &[String],
    options: &ExecutionOptions,
    verbose: bool,
) {
    println!("{}", "Initial build".cyan().bold());
    let mut executor = TaskExecutor::new(
        &session.registry,
        Arc::clone(&session.ctx),
        options.clone(),
    );
    match executor.run("build", schedule).await {
        Ok(report) if report.succeeded() => {
            if verbose {
                print_artifacts(&report);
            }
        }
        Ok(report) => {
            if let Some(failed) = report.failure() {
                eprintln!(
                    "  {} initial build failed at {}; fix and save to retry",
                    "✗".red(),
                    failed.task.bold()
                );
            }
        }
        Err(e) => {
            eprintln!("  {} initial build did not start: {e}", "✗".red());
        }
    }
    println!();
}
