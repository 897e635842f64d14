// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Task execution
//!
//! Runs a resolved schedule under one of two disciplines. Sequential runs
//! tasks one by one in schedule order. Parallel keeps up to `jobs` tasks in
//! flight and starts a task only once its dependencies have finished. Either
//! way a failure stops new work: tasks already running finish, everything
//! not yet started is reported as skipped.

use crate::cache::FingerprintCache;
use crate::config::BuildContext;
use crate::errors::{AssetflowError, AssetflowResult};
use crate::registry::{Task, TaskRegistry};
use crate::utils::format_duration;
use colored::Colorize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// How a schedule is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// One task at a time, in schedule order
    Sequential,
    /// Up to `jobs` dependency-free tasks at a time
    Parallel { jobs: usize },
}

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub discipline: Discipline,
    /// Consult and update the fingerprint cache
    pub use_cache: bool,
    /// Print the schedule without running anything
    pub dry_run: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            discipline: Discipline::Sequential,
            use_cache: true,
            dry_run: false,
        }
    }
}

/// Terminal state of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failure,
    /// Not started because an upstream task failed, or a dry run
    Skipped,
    /// Inputs unchanged since the last recorded success
    Cached,
}

/// What happened to one scheduled task.
#[derive(Debug)]
pub struct TaskResult {
    pub task: String,
    pub status: TaskStatus,
    pub duration: Duration,
    /// Artifacts in place after this task (published now, or already
    /// present for a cache hit)
    pub outputs: Vec<std::path::PathBuf>,
    pub summary: Option<String>,
    /// Present only for failures, with the causing error attached
    pub error: Option<AssetflowError>,
}

impl TaskResult {
    fn finished(task: &str, status: TaskStatus, duration: Duration) -> Self {
        Self {
            task: task.to_string(),
            status,
            duration,
            outputs: Vec::new(),
            summary: None,
            error: None,
        }
    }
}

/// Outcome of a whole schedule, in schedule order.
#[derive(Debug)]
pub struct RunReport {
    /// The pipeline or task the schedule was resolved from
    pub pipeline: String,
    pub results: Vec<TaskResult>,
    pub duration: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        !self
            .results
            .iter()
            .any(|r| r.status == TaskStatus::Failure)
    }

    pub fn failure(&self) -> Option<&TaskResult> {
        self.results
            .iter()
            .find(|r| r.status == TaskStatus::Failure)
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Compact tally for the closing console line, e.g. `3 run, 2 cached`.
    pub fn tally(&self) -> String {
        let mut parts = vec![format!("{} run", self.count(TaskStatus::Success))];
        let cached = self.count(TaskStatus::Cached);
        if cached > 0 {
            parts.push(format!("{cached} cached"));
        }
        let skipped = self.count(TaskStatus::Skipped);
        if skipped > 0 {
            parts.push(format!("{skipped} skipped"));
        }
        parts.join(", ")
    }
}

/// Drives one schedule to completion against a shared context.
pub struct TaskExecutor<'r> {
    registry: &'r TaskRegistry,
    ctx: Arc<BuildContext>,
    cache: Option<FingerprintCache>,
    options: ExecutionOptions,
}

impl<'r> TaskExecutor<'r> {
    pub fn new(
        registry: &'r TaskRegistry,
        ctx: Arc<BuildContext>,
        options: ExecutionOptions,
    ) -> Self {
        let cache = options.use_cache.then(|| FingerprintCache::load(&ctx));
        Self {
            registry,
            ctx,
            cache,
            options,
        }
    }

    /// Run `schedule` to completion. Fails early, before any task runs, when
    /// a required tool is missing; task failures are reported in the result.
    /// `target` is the pipeline or task the schedule was resolved from and
    /// only labels the report.
    pub async fn run(
        &mut self,
        target: &str,
        schedule: &[String],
    ) -> AssetflowResult<RunReport> {
        let started = Instant::now();
        if self.options.dry_run {
            return Ok(self.plan_only(target, schedule, started));
        }
        self.check_tools(schedule)?;

        let results = match self.options.discipline {
            Discipline::Sequential => self.run_sequential(schedule).await?,
            Discipline::Parallel { jobs } => self.run_parallel(schedule, jobs).await?,
        };

        if let Some(cache) = &mut self.cache {
            if let Err(e) = cache.persist().await {
                warn!("failed to persist fingerprints: {e}");
            }
        }

        Ok(RunReport {
            pipeline: target.to_string(),
            results,
            duration: started.elapsed(),
        })
    }

    /// Verify every external tool the schedule needs before starting work.
    fn check_tools(&self, schedule: &[String]) -> AssetflowResult<()> {
        let mut seen = HashSet::new();
        for name in schedule {
            let task = self.lookup(name)?;
            if let Some(tool) = &task.requires_tool {
                if seen.insert(tool.as_str()) {
                    which::which(tool)
                        .map_err(|_| AssetflowError::tool_not_found(tool))?;
                    debug!("found tool {tool}");
                }
            }
        }
        Ok(())
    }

    fn plan_only(&self, target: &str, schedule: &[String], started: Instant) -> RunReport {
        let mut results = Vec::with_capacity(schedule.len());
        for name in schedule {
            println!("  {} would run {}", "→".blue(), name.bold());
            results.push(TaskResult::finished(
                name,
                TaskStatus::Skipped,
                Duration::ZERO,
            ));
        }
        RunReport {
            pipeline: target.to_string(),
            results,
            duration: started.elapsed(),
        }
    }

    async fn run_sequential(
        &mut self,
        schedule: &[String],
    ) -> AssetflowResult<Vec<TaskResult>> {
        let mut results = Vec::with_capacity(schedule.len());
        let mut halted = false;

        for name in schedule {
            let task = self.lookup(name)?;

            if halted {
                let result =
                    TaskResult::finished(name, TaskStatus::Skipped, Duration::ZERO);
                announce(&result);
                results.push(result);
                continue;
            }

            if self.is_cached(task) {
                let mut result =
                    TaskResult::finished(name, TaskStatus::Cached, Duration::ZERO);
                result.outputs = task.outputs.clone();
                announce(&result);
                results.push(result);
                continue;
            }

            let started = Instant::now();
            let outcome = task.action.run(&self.ctx).await;
            let duration = started.elapsed();

            let result = match outcome {
                Ok(outcome) => {
                    self.record(task);
                    TaskResult {
                        task: name.clone(),
                        status: TaskStatus::Success,
                        duration,
                        outputs: outcome.outputs,
                        summary: outcome.summary,
                        error: None,
                    }
                }
                Err(source) => {
                    halted = true;
                    self.unrecord(name);
                    TaskResult {
                        task: name.clone(),
                        status: TaskStatus::Failure,
                        duration,
                        outputs: Vec::new(),
                        summary: None,
                        error: Some(AssetflowError::task_failed(name, source)),
                    }
                }
            };
            announce(&result);
            results.push(result);
        }
        Ok(results)
    }

    async fn run_parallel(
        &mut self,
        schedule: &[String],
        jobs: usize,
    ) -> AssetflowResult<Vec<TaskResult>> {
        let jobs = jobs.max(1);
        let scheduled: HashSet<&str> = schedule.iter().map(String::as_str).collect();

        // Dependency bookkeeping restricted to this schedule.
        let mut deps_left: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for name in schedule {
            let task = self.lookup(name)?;
            let in_schedule = task
                .depends_on
                .iter()
                .filter(|d| scheduled.contains(d.as_str()))
                .count();
            deps_left.insert(name.as_str(), in_schedule);
            for dep in &task.depends_on {
                if scheduled.contains(dep.as_str()) {
                    dependents.entry(dep.as_str()).or_default().push(name);
                }
            }
        }

        let mut started: HashSet<&str> = HashSet::new();
        let mut finished: HashMap<String, TaskResult> = HashMap::new();
        let mut in_flight: JoinSet<(String, AssetflowResult<crate::registry::ActionOutcome>, Duration)> =
            JoinSet::new();
        let mut halted = false;

        loop {
            // Start everything that is ready, up to the job limit.
            while !halted && in_flight.len() < jobs {
                let Some(name) = next_ready(schedule, &deps_left, &started, &finished)
                else {
                    break;
                };
                started.insert(name);
                let task = self.lookup(name)?;

                if self.is_cached(task) {
                    let mut result =
                        TaskResult::finished(name, TaskStatus::Cached, Duration::ZERO);
                    result.outputs = task.outputs.clone();
                    announce(&result);
                    finished.insert(name.to_string(), result);
                    release_dependents(name, &dependents, &mut deps_left);
                    continue;
                }

                let action = Arc::clone(&task.action);
                let ctx = Arc::clone(&self.ctx);
                let task_name = name.to_string();
                in_flight.spawn(async move {
                    let started = Instant::now();
                    let outcome = action.run(&ctx).await;
                    (task_name, outcome, started.elapsed())
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let (name, outcome, duration) = joined.map_err(|e| AssetflowError::Io {
                message: format!("worker for a build task panicked: {e}"),
            })?;

            let result = match outcome {
                Ok(outcome) => {
                    if let Some(task) = self.registry.task(&name) {
                        self.record(task);
                    }
                    release_dependents(name.as_str(), &dependents, &mut deps_left);
                    TaskResult {
                        task: name.clone(),
                        status: TaskStatus::Success,
                        duration,
                        outputs: outcome.outputs,
                        summary: outcome.summary,
                        error: None,
                    }
                }
                Err(source) => {
                    halted = true;
                    self.unrecord(&name);
                    TaskResult {
                        task: name.clone(),
                        status: TaskStatus::Failure,
                        duration,
                        outputs: Vec::new(),
                        summary: None,
                        error: Some(AssetflowError::task_failed(&name, source)),
                    }
                }
            };
            announce(&result);
            finished.insert(name, result);
        }

        // Everything not finished was blocked by a failure.
        let mut results = Vec::with_capacity(schedule.len());
        for name in schedule {
            match finished.remove(name.as_str()) {
                Some(result) => results.push(result),
                None => {
                    let result =
                        TaskResult::finished(name, TaskStatus::Skipped, Duration::ZERO);
                    announce(&result);
                    results.push(result);
                }
            }
        }
        Ok(results)
    }

    fn lookup(&self, name: &str) -> AssetflowResult<&'r Task> {
        self.registry
            .task(name)
            .ok_or_else(|| AssetflowError::UnknownTask {
                task: name.to_string(),
                referenced_by: "the resolved schedule".to_string(),
            })
    }

    fn is_cached(&self, task: &Task) -> bool {
        task.cacheable
            && self
                .cache
                .as_ref()
                .is_some_and(|cache| cache.is_fresh(task))
    }

    fn record(&mut self, task: &Task) {
        if !task.cacheable {
            return;
        }
        if let Some(cache) = &mut self.cache {
            if let Err(e) = cache.record(task) {
                warn!("failed to fingerprint {}: {e}", task.name);
            }
        }
    }

    /// A failed task must not look fresh on the next run.
    fn unrecord(&mut self, task: &str) {
        if let Some(cache) = &mut self.cache {
            cache.forget(task);
        }
    }
}

/// First task in schedule order that has not started and has no pending
/// dependencies. Scanning the schedule keeps starts deterministic.
fn next_ready<'a>(
    schedule: &'a [String],
    deps_left: &HashMap<&str, usize>,
    started: &HashSet<&str>,
    finished: &HashMap<String, TaskResult>,
) -> Option<&'a str> {
    schedule
        .iter()
        .map(String::as_str)
        .find(|name| {
            !started.contains(name)
                && !finished.contains_key(*name)
                && deps_left.get(name).copied().unwrap_or(0) == 0
        })
}

fn release_dependents<'a>(
    name: &str,
    dependents: &HashMap<&str, Vec<&'a str>>,
    deps_left: &mut HashMap<&'a str, usize>,
) {
    if let Some(deps) = dependents.get(name) {
        for dependent in deps {
            if let Some(left) = deps_left.get_mut(dependent) {
                *left = left.saturating_sub(1);
            }
        }
    }
}

fn announce(result: &TaskResult) {
    let duration = format_duration(result.duration);
    match result.status {
        TaskStatus::Success => {
            let summary = result
                .summary
                .as_deref()
                .map(|s| format!(" {}", s.dimmed()))
                .unwrap_or_default();
            println!(
                "  {} {} {}{summary}",
                "✓".green(),
                result.task,
                format!("({duration})").dimmed()
            );
        }
        TaskStatus::Failure => {
            println!(
                "  {} {} {}",
                "✗".red(),
                result.task,
                format!("({duration})").dimmed()
            );
        }
        TaskStatus::Cached => {
            println!(
                "  {} {} {}",
                "•".blue(),
                result.task,
                "(cached)".dimmed()
            );
        }
        TaskStatus::Skipped => {
            println!(
                "  {} {} {}",
                "○".dimmed(),
                result.task.dimmed(),
                "(skipped)".dimmed()
            );
        }
    }
}
