// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Change watcher
//!
//! Turns bursts of filesystem events into minimal rebuilds. The first
//! event anchors a fixed debounce window; everything arriving inside the
//! window joins one batch. When the window closes the changed paths are
//! mapped to the pipelines that own the matching tasks, and one executor
//! run covers the whole batch.
//!
//! The loop is driven by [`ChangeEvent`]s, so tests inject events and
//! poll directly; [`ChangeWatcher::run`] wires `notify` to the same path
//! for production. Task failures and resolution problems are logged and
//! the watcher returns to idle; only startup configuration errors escape.

use colored::Colorize;
use notify::{RecursiveMode, Watcher as _};
use std::collections::HashSet;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::cache::FingerprintCache;
use crate::config::BuildContext;
use crate::errors::AssetflowResult;
use crate::pipeline::{ExecutionOptions, RunReport, TaskExecutor, TaskGraph};
use crate::registry::TaskRegistry;
use crate::utils::format_duration;
use crate::utils::spinner::create_spinner;

/// Window length when the project does not override `watch.debounce_ms`.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Cooperative shutdown flag. Cloned into signal handlers; the watcher
/// observes it between states, so an in-flight run always completes.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Default)]
struct StopInner {
    stopped: AtomicBool,
    wake: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.wake.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Resolve once [`stop`](Self::stop) has been called.
    pub async fn wait(&self) {
        loop {
            // Register interest before checking the flag so a concurrent
            // stop() cannot slip between the check and the await.
            let notified = self.inner.wake.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

/// One observed filesystem change.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub at: Instant,
}

impl ChangeEvent {
    pub fn now(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            at: Instant::now(),
        }
    }
}

enum DebounceState {
    Idle,
    Pending { anchor: Instant, paths: Vec<PathBuf> },
}

/// Fixed window anchored at the first event of a burst. Later events join
/// the batch but never extend the window.
struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    fn absorb(&mut self, event: ChangeEvent) {
        match &mut self.state {
            DebounceState::Idle => {
                self.state = DebounceState::Pending {
                    anchor: event.at,
                    paths: vec![event.path],
                };
            }
            DebounceState::Pending { paths, .. } => {
                if !paths.contains(&event.path) {
                    paths.push(event.path);
                }
            }
        }
    }

    fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { anchor, .. } => Some(*anchor + self.window),
        }
    }

    /// Close and return the batch if the window has elapsed at `now`.
    fn close_due(&mut self, now: Instant) -> Option<Vec<PathBuf>> {
        let due = matches!(
            &self.state,
            DebounceState::Pending { anchor, .. } if now >= *anchor + self.window
        );
        if !due {
            return None;
        }
        match mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Pending { paths, .. } => Some(paths),
            DebounceState::Idle => None,
        }
    }
}

struct TaskRule {
    patterns: Vec<glob::Pattern>,
    pipeline: String,
}

/// Precomputed path-to-pipeline mapping for one registry.
struct WatchMap {
    rules: Vec<TaskRule>,
    manifest_files: Vec<PathBuf>,
    manifest_target: Option<String>,
    ignored_roots: Vec<PathBuf>,
    /// Pipeline name and its resolved task set, in declaration order.
    pipeline_sets: Vec<(String, HashSet<String>)>,
}

impl WatchMap {
    fn new(registry: &TaskRegistry, ctx: &BuildContext) -> AssetflowResult<Self> {
        let graph = TaskGraph::build(registry)?;
        let mut pipeline_sets = Vec::new();
        for pipeline in registry.pipelines() {
            let schedule = graph.resolve(&pipeline.name)?;
            pipeline_sets.push((pipeline.name.clone(), schedule.into_iter().collect()));
        }

        let mut rules = Vec::new();
        for task in registry.tasks() {
            if task.inputs.is_empty() {
                continue;
            }
            let Some(pipeline) = owning_pipeline(&task.name, &pipeline_sets) else {
                continue;
            };
            let mut patterns = Vec::with_capacity(task.inputs.len());
            for input in &task.inputs {
                patterns.push(glob::Pattern::new(input)?);
            }
            rules.push(TaskRule { patterns, pipeline });
        }

        // Edits to the manifests change the whole build context, so they
        // map to the full build when one is registered.
        let manifest_target = registry.pipeline("build").map(|p| p.name.clone());

        Ok(Self {
            rules,
            manifest_files: ctx.layout.manifest_files(),
            manifest_target,
            ignored_roots: vec![ctx.layout.dist_root.clone(), ctx.layout.stamp_dir.clone()],
            pipeline_sets,
        })
    }

    /// Artifacts we write must never feed back into the watcher.
    fn is_ignored(&self, path: &Path) -> bool {
        self.ignored_roots.iter().any(|root| path.starts_with(root))
    }

    fn touches_manifest(&self, paths: &[PathBuf]) -> bool {
        paths
            .iter()
            .any(|p| self.manifest_files.iter().any(|m| m == p))
    }

    /// Map a closed batch to the minimal set of pipelines to rerun, in
    /// pipeline declaration order.
    fn pipelines_for(&self, paths: &[PathBuf]) -> Vec<String> {
        let mut affected: HashSet<&str> = HashSet::new();
        for path in paths {
            if self.is_ignored(path) {
                continue;
            }
            if self.manifest_files.iter().any(|m| m == path) {
                if let Some(target) = &self.manifest_target {
                    affected.insert(target);
                }
                continue;
            }
            for rule in &self.rules {
                if rule.patterns.iter().any(|p| p.matches_path(path)) {
                    affected.insert(&rule.pipeline);
                }
            }
        }

        // Drop every affected pipeline already covered by a larger affected
        // one; of two identical task sets the first declared survives.
        let mut minimal = Vec::new();
        for (i, (name, set)) in self.pipeline_sets.iter().enumerate() {
            if !affected.contains(name.as_str()) {
                continue;
            }
            let subsumed = self.pipeline_sets.iter().enumerate().any(|(j, (other, other_set))| {
                j != i
                    && affected.contains(other.as_str())
                    && set.is_subset(other_set)
                    && (other_set.len() > set.len() || j < i)
            });
            if !subsumed {
                minimal.push(name.clone());
            }
        }
        minimal
    }
}

/// Smallest registered pipeline whose resolved task set contains `task`;
/// declaration order breaks ties.
fn owning_pipeline(task: &str, pipeline_sets: &[(String, HashSet<String>)]) -> Option<String> {
    pipeline_sets
        .iter()
        .enumerate()
        .filter(|(_, (_, set))| set.contains(task))
        .min_by_key(|(i, (_, set))| (set.len(), *i))
        .map(|(_, (name, _))| name.clone())
}

/// Long-running rebuild loop over a registry and a fixed context.
pub struct ChangeWatcher<'r> {
    registry: &'r TaskRegistry,
    ctx: Arc<BuildContext>,
    options: ExecutionOptions,
    debouncer: Debouncer,
    map: WatchMap,
    stop: StopSignal,
}

impl<'r> ChangeWatcher<'r> {
    pub fn new(
        registry: &'r TaskRegistry,
        ctx: Arc<BuildContext>,
        options: ExecutionOptions,
        debounce: Duration,
        stop: StopSignal,
    ) -> AssetflowResult<Self> {
        let map = WatchMap::new(registry, &ctx)?;
        Ok(Self {
            registry,
            ctx,
            options,
            debouncer: Debouncer::new(debounce),
            map,
            stop,
        })
    }

    /// Feed one change into the current window. Paths under the
    /// destination or fingerprint directories are dropped here, so our own
    /// artifact writes never open a window.
    pub fn note(&mut self, event: ChangeEvent) {
        if self.map.is_ignored(&event.path) {
            return;
        }
        debug!("change: {}", event.path.display());
        self.debouncer.absorb(event);
    }

    /// Close the window if it has elapsed at `now` and run the rebuild it
    /// calls for. Returns the report when a build actually ran. Resolution
    /// and execution problems are logged, not escalated; the watcher goes
    /// back to idle either way.
    pub async fn poll(&mut self, now: Instant) -> Option<RunReport> {
        let batch = self.debouncer.close_due(now)?;
        let targets = self.map.pipelines_for(&batch);
        if targets.is_empty() {
            debug!("change batch matched no pipeline");
            return None;
        }

        for path in &batch {
            info!("changed: {}", path.display());
        }
        let label = targets.join(", ");
        let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
        let graph = match TaskGraph::build(self.registry) {
            Ok(graph) => graph,
            Err(e) => {
                warn!("cannot resolve rebuild of {label}: {e}");
                return None;
            }
        };
        let schedule = match graph.resolve_many(&refs) {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!("cannot resolve rebuild of {label}: {e}");
                return None;
            }
        };

        // A manifest edit maps to the full build; fingerprints recorded
        // before the edit would turn that build into a row of cache hits.
        if self.options.use_cache && self.map.touches_manifest(&batch) {
            let mut cache = FingerprintCache::load(&self.ctx);
            cache.forget_all();
            if let Err(e) = cache.persist().await {
                warn!("failed to clear fingerprints: {e}");
            }
        }

        println!("\n{} {}", "Rebuilding".cyan().bold(), label.bold());
        let mut executor =
            TaskExecutor::new(self.registry, Arc::clone(&self.ctx), self.options.clone());
        match executor.run(&label, &schedule).await {
            Ok(report) => {
                if report.succeeded() {
                    println!(
                        "  {} rebuilt {label} in {} ({})",
                        "✓".green(),
                        format_duration(report.duration),
                        report.tally()
                    );
                } else if let Some(failed) = report.failure() {
                    warn!("rebuild of {label} failed at {}", failed.task);
                }
                Some(report)
            }
            Err(e) => {
                warn!("rebuild of {label} did not start: {e}");
                None
            }
        }
    }

    /// Watch the project root until the stop signal fires.
    pub async fn run(&mut self) -> AssetflowResult<()> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut backend =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        let at = Instant::now();
                        for path in event.paths {
                            let _ = tx.send(ChangeEvent { path, at });
                        }
                    }
                    Err(e) => warn!("watch backend error: {e}"),
                }
            })?;
        backend.watch(&self.ctx.layout.root, RecursiveMode::Recursive)?;
        info!(
            "watching {} (debounce {}ms)",
            self.ctx.layout.root.display(),
            self.debouncer.window.as_millis()
        );

        let stop = self.stop.clone();
        let mut spinner = Some(create_spinner("Watching for changes"));
        loop {
            if stop.is_stopped() {
                break;
            }
            let deadline = self.debouncer.deadline();
            let sleep_target =
                tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));
            tokio::select! {
                _ = stop.wait() => break,
                received = rx.recv() => match received {
                    Some(event) => self.note(event),
                    None => break,
                },
                _ = tokio::time::sleep_until(sleep_target), if deadline.is_some() => {
                    if let Some(bar) = spinner.take() {
                        bar.finish_and_clear();
                    }
                    self.poll(Instant::now()).await;
                    spinner = Some(create_spinner("Watching for changes"));
                }
            }
        }
        if let Some(bar) = spinner.take() {
            bar.finish_and_clear();
        }
        info!("watcher stopped");
        Ok(())
    }
}
