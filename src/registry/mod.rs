// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Task registry
//!
//! Tasks and pipelines share one namespace, are registered once at startup
//! and never change afterwards. Registration rejects duplicates immediately;
//! [`TaskRegistry::validate`] then checks that every reference points at
//! something registered. Cycle detection happens when the dependency graph
//! is built, before anything runs.

use crate::config::BuildContext;
use crate::errors::{AssetflowError, AssetflowResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// What a finished action reports back to the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Artifacts the action published
    pub outputs: Vec<PathBuf>,
    /// One-line summary for the console, e.g. `copied 12 files`
    pub summary: Option<String>,
}

impl ActionOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn published(outputs: Vec<PathBuf>) -> Self {
        Self {
            outputs,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// The work a task performs. Implementations hold their collaborator and
/// read everything else from the shared context.
#[async_trait]
pub trait TaskAction: Send + Sync {
    async fn run(&self, ctx: &BuildContext) -> AssetflowResult<ActionOutcome>;
}

/// A named unit of work plus the metadata the orchestrator needs to
/// schedule, cache and watch it.
#[derive(Clone)]
pub struct Task {
    pub name: String,
    pub description: String,
    /// Globs selecting the files this task reads
    pub inputs: Vec<String>,
    /// Files this task writes when it succeeds
    pub outputs: Vec<PathBuf>,
    /// Tasks that must have succeeded in the same run before this one starts
    pub depends_on: Vec<String>,
    /// External binary that must be discoverable before this task can run
    pub requires_tool: Option<String>,
    /// Whether an unchanged fingerprint lets the run be skipped
    pub cacheable: bool,
    pub action: Arc<dyn TaskAction>,
}

impl Task {
    pub fn new(name: impl Into<String>, action: Arc<dyn TaskAction>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            depends_on: Vec::new(),
            requires_tool: None,
            cacheable: true,
            action,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn reads(mut self, pattern: impl Into<String>) -> Self {
        self.inputs.push(pattern.into());
        self
    }

    pub fn writes(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn after(mut self, task: impl Into<String>) -> Self {
        self.depends_on.push(task.into());
        self
    }

    pub fn needs_tool(mut self, tool: impl Into<String>) -> Self {
        self.requires_tool = Some(tool.into());
        self
    }

    /// Always runs, regardless of fingerprints. For tasks whose effect is
    /// removal rather than production.
    pub fn uncacheable(mut self) -> Self {
        self.cacheable = false;
        self
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("depends_on", &self.depends_on)
            .field("requires_tool", &self.requires_tool)
            .field("cacheable", &self.cacheable)
            .finish()
    }
}

/// An ordered list of members, each naming a task or another pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
    pub description: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

/// All registered tasks and pipelines, in declaration order.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    task_index: HashMap<String, usize>,
    pipelines: Vec<Pipeline>,
    pipeline_index: HashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Fails without modifying the registry if the name is
    /// already taken by a task or a pipeline.
    pub fn register(&mut self, task: Task) -> AssetflowResult<()> {
        if self.contains(&task.name) {
            return Err(AssetflowError::DuplicateTask {
                task: task.name.clone(),
            });
        }
        self.task_index.insert(task.name.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Register a pipeline. Members are validated later so pipelines can be
    /// declared in any order relative to their tasks.
    pub fn register_pipeline(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        members: Vec<String>,
    ) -> AssetflowResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(AssetflowError::DuplicatePipeline { name });
        }
        if members.is_empty() {
            return Err(AssetflowError::EmptyPipeline { pipeline: name });
        }
        self.pipeline_index
            .insert(name.clone(), self.pipelines.len());
        self.pipelines.push(Pipeline {
            name,
            description: description.into(),
            members,
        });
        Ok(())
    }

    /// Run every startup check once: task dependencies must name tasks,
    /// pipeline members must name tasks or pipelines, and the dependency
    /// graph must be acyclic.
    pub fn validate(&self) -> AssetflowResult<()> {
        for task in &self.tasks {
            for dep in &task.depends_on {
                if !self.task_index.contains_key(dep) {
                    return Err(AssetflowError::UnknownTask {
                        task: dep.clone(),
                        referenced_by: task.name.clone(),
                    });
                }
            }
        }
        for pipeline in &self.pipelines {
            for member in &pipeline.members {
                if !self.contains(member) {
                    return Err(AssetflowError::UnknownTask {
                        task: member.clone(),
                        referenced_by: pipeline.name.clone(),
                    });
                }
            }
        }
        self.detect_cycles()
    }

    /// Transitive dependency closure of one task, in declaration order. The
    /// task itself is not included.
    pub fn resolve_dependencies(&self, name: &str) -> AssetflowResult<Vec<String>> {
        let Some(&start) = self.task_index.get(name) else {
            return Err(AssetflowError::UnknownPipeline {
                pipeline: name.to_string(),
            });
        };

        let mut closure: Vec<usize> = Vec::new();
        let mut pending = vec![start];
        let mut seen = vec![false; self.tasks.len()];
        seen[start] = true;
        while let Some(idx) = pending.pop() {
            for dep in &self.tasks[idx].depends_on {
                let Some(&dep_idx) = self.task_index.get(dep) else {
                    return Err(AssetflowError::UnknownTask {
                        task: dep.clone(),
                        referenced_by: self.tasks[idx].name.clone(),
                    });
                };
                if !seen[dep_idx] {
                    seen[dep_idx] = true;
                    closure.push(dep_idx);
                    pending.push(dep_idx);
                }
            }
        }
        self.check_cycle_from(start)?;

        closure.sort_unstable();
        Ok(closure
            .into_iter()
            .map(|i| self.tasks[i].name.clone())
            .collect())
    }

    /// Three-state depth-first search over every task. Iterative, so a
    /// pathological dependency chain cannot overflow the stack; the reported
    /// path walks the cycle once and closes on the repeated task.
    fn detect_cycles(&self) -> AssetflowResult<()> {
        let mut state = vec![VisitState::Unvisited; self.tasks.len()];
        for start in 0..self.tasks.len() {
            if state[start] == VisitState::Unvisited {
                self.dfs_from(start, &mut state)?;
            }
        }
        Ok(())
    }

    fn check_cycle_from(&self, start: usize) -> AssetflowResult<()> {
        let mut state = vec![VisitState::Unvisited; self.tasks.len()];
        self.dfs_from(start, &mut state)
    }

    fn dfs_from(&self, start: usize, state: &mut [VisitState]) -> AssetflowResult<()> {
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        state[start] = VisitState::InProgress;

        while let Some(frame) = stack.last_mut() {
            let (idx, cursor) = (frame.0, frame.1);
            let deps = &self.tasks[idx].depends_on;
            if cursor >= deps.len() {
                state[idx] = VisitState::Done;
                stack.pop();
                continue;
            }
            frame.1 += 1;

            // A dangling name here means validate() was skipped; report it
            // rather than panic.
            let Some(&dep_idx) = self.task_index.get(&deps[cursor]) else {
                return Err(AssetflowError::UnknownTask {
                    task: deps[cursor].clone(),
                    referenced_by: self.tasks[idx].name.clone(),
                });
            };
            match state[dep_idx] {
                VisitState::Unvisited => {
                    state[dep_idx] = VisitState::InProgress;
                    stack.push((dep_idx, 0));
                }
                VisitState::InProgress => {
                    let from = stack
                        .iter()
                        .position(|&(i, _)| i == dep_idx)
                        .unwrap_or(0);
                    let mut path: Vec<String> = stack[from..]
                        .iter()
                        .map(|&(i, _)| self.tasks[i].name.clone())
                        .collect();
                    path.push(self.tasks[dep_idx].name.clone());
                    return Err(AssetflowError::CircularDependency { path });
                }
                VisitState::Done => {}
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.task_index.contains_key(name) || self.pipeline_index.contains_key(name)
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.task_index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn pipeline(&self, name: &str) -> Option<&Pipeline> {
        self.pipeline_index.get(name).map(|&i| &self.pipelines[i])
    }

    /// Position of a task in declaration order. Used to break scheduling
    /// ties deterministically.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.task_index.get(name).copied()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.pipelines.is_empty()
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks)
            .field("pipelines", &self.pipelines)
            .finish()
    }
}
