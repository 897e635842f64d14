// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Run command - resolve one pipeline and execute it

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::{print_artifacts, Session};
use crate::config::Mode;
use crate::pipeline::{ExecutionOptions, TaskExecutor, TaskGraph};
use crate::utils::format_duration;

/// Run one pipeline (or bare task) to completion. The process exit code
/// reports the first failure; its diagnostic keeps the original cause.
pub async fn run(
    target: String,
    mode: Mode,
    options: ExecutionOptions,
    verbose: bool,
) -> Result<()> {
    let session = Session::prepare(mode).await?;

    let graph = TaskGraph::build(&session.registry)?;
    let schedule = graph.resolve(&target)?;

    println!();
    println!(
        "{}: {} {}",
        "Pipeline".bold(),
        target.bold(),
        format!(
            "({} mode, {} task{})",
            session.ctx.mode,
            schedule.len(),
            if schedule.len() == 1 { "" } else { "s" }
        )
        .dimmed()
    );
    println!("{}", "═".repeat(50));

    let mut executor =
        TaskExecutor::new(&session.registry, Arc::clone(&session.ctx), options.clone());
    let mut report = executor.run(&target, &schedule).await?;

    if options.dry_run {
        println!();
        println!("{}", "Dry run; nothing was executed.".dimmed());
        return Ok(());
    }

    println!();
    if report.succeeded() {
        println!(
            "{}",
            format!(
                "Build completed in {} ({})",
                format_duration(report.duration),
                report.tally()
            )
            .green()
        );
        if verbose {
            print_artifacts(&report);
        }
        Ok(())
    } else {
        println!(
            "{}",
            format!("Build failed after {}", format_duration(report.duration)).red()
        );
        let error = report
            .results
            .iter_mut()
            .find_map(|r| r.error.take())
            .ok_or_else(|| miette::miette!("Build failed without a recorded error"))?;
        Err(error.into())
    }
}
