// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Schedule resolution
//!
//! A [`TaskGraph`] is built once over every registered task; construction
//! runs the registry's startup checks, so dangling references and cycles
//! surface before anything executes. Resolving a target expands pipelines
//! into their member tasks, pulls in transitive dependencies and orders the
//! result topologically. Ties between independent tasks go to declaration
//! order, so a schedule is reproducible run to run.

use crate::errors::{AssetflowError, AssetflowResult};
use crate::registry::TaskRegistry;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::debug;

/// Dependency graph over all registered tasks. Edges run from a dependency
/// to its dependent, so topological order is execution order. Node insertion
/// follows declaration order, which makes `NodeIndex` double as the
/// tie-break key.
#[derive(Debug)]
pub struct TaskGraph<'r> {
    registry: &'r TaskRegistry,
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl<'r> TaskGraph<'r> {
    pub fn build(registry: &'r TaskRegistry) -> AssetflowResult<Self> {
        registry.validate()?;

        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for task in registry.tasks() {
            let idx = graph.add_node(task.name.clone());
            nodes.insert(task.name.clone(), idx);
        }
        for task in registry.tasks() {
            for dep in &task.depends_on {
                graph.add_edge(nodes[dep], nodes[&task.name], ());
            }
        }

        Ok(Self {
            registry,
            graph,
            nodes,
        })
    }

    /// Resolve one target into an ordered schedule of task names.
    pub fn resolve(&self, target: &str) -> AssetflowResult<Vec<String>> {
        self.resolve_many(&[target])
    }

    /// Resolve several targets into one deduplicated schedule. A task shared
    /// by two targets appears once.
    pub fn resolve_many(&self, targets: &[&str]) -> AssetflowResult<Vec<String>> {
        let mut seeds = Vec::new();
        let mut seen = HashSet::new();
        for target in targets {
            self.expand_into(target, &mut seeds, &mut seen, &mut Vec::new())?;
        }

        let mut needed: HashSet<NodeIndex> = HashSet::new();
        for seed in &seeds {
            needed.insert(self.nodes[seed]);
            for dep in self.registry.resolve_dependencies(seed)? {
                needed.insert(self.nodes[&dep]);
            }
        }

        let order = self.kahn_order(&needed);
        debug!(schedule = ?order, "resolved {:?}", targets);
        Ok(order)
    }

    /// Expand a name into task seeds. Pipelines recurse member by member
    /// with a stack guard against pipelines that include themselves.
    fn expand_into(
        &self,
        name: &str,
        out: &mut Vec<String>,
        seen: &mut HashSet<String>,
        expanding: &mut Vec<String>,
    ) -> AssetflowResult<()> {
        if self.registry.task(name).is_some() {
            if seen.insert(name.to_string()) {
                out.push(name.to_string());
            }
            return Ok(());
        }
        let Some(pipeline) = self.registry.pipeline(name) else {
            return Err(AssetflowError::UnknownPipeline {
                pipeline: name.to_string(),
            });
        };
        if let Some(pos) = expanding.iter().position(|n| n == name) {
            let mut path = expanding[pos..].to_vec();
            path.push(name.to_string());
            return Err(AssetflowError::CircularDependency { path });
        }
        expanding.push(name.to_string());
        for member in &pipeline.members {
            self.expand_into(member, out, seen, expanding)?;
        }
        expanding.pop();
        Ok(())
    }

    /// Kahn's algorithm restricted to `needed`. The ready set is a min-heap
    /// of node indices, so among unordered tasks the earliest-declared one
    /// is scheduled first.
    fn kahn_order(&self, needed: &HashSet<NodeIndex>) -> Vec<String> {
        let mut indegree: HashMap<NodeIndex, usize> = needed
            .iter()
            .map(|&idx| {
                let pending = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .filter(|dep| needed.contains(dep))
                    .count();
                (idx, pending)
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = indegree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&idx, _)| Reverse(idx))
            .collect();

        let mut order = Vec::with_capacity(needed.len());
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(self.graph[idx].clone());
            for dependent in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(deg) = indegree.get_mut(&dependent) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse(dependent));
                    }
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::make_task;

    fn make_registry(tasks: &[(&str, &[&str])]) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for (name, deps) in tasks {
            registry.register(make_task(name, deps)).unwrap();
        }
        registry
    }

    #[test]
    fn test_order_respects_dependencies() {
        let registry = make_registry(&[
            ("minify", &["bundle"]),
            ("bundle", &[]),
            ("autoprefix", &["compile-styles"]),
            ("compile-styles", &[]),
        ]);
        let graph = TaskGraph::build(&registry).unwrap();

        let order = graph.resolve_many(&["minify", "autoprefix"]).unwrap();

        let pos = |n: &str| order.iter().position(|t| t == n).unwrap();
        assert!(pos("bundle") < pos("minify"));
        assert!(pos("compile-styles") < pos("autoprefix"));
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_independent_tasks_run_in_declaration_order() {
        let registry = make_registry(&[("alpha", &[]), ("beta", &[]), ("gamma", &[])]);
        let graph = TaskGraph::build(&registry).unwrap();

        // Member order in the target does not outrank declaration order.
        let order = graph.resolve_many(&["gamma", "alpha", "beta"]).unwrap();
        assert_eq!(order, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_bare_task_pulls_transitive_dependencies() {
        let registry = make_registry(&[
            ("fetch", &[]),
            ("parse", &["fetch"]),
            ("render", &["parse"]),
        ]);
        let graph = TaskGraph::build(&registry).unwrap();

        let order = graph.resolve("render").unwrap();
        assert_eq!(order, ["fetch", "parse", "render"]);
    }

    #[test]
    fn test_pipelines_expand_recursively_and_deduplicate() {
        let mut registry = make_registry(&[
            ("bundle", &[]),
            ("minify", &["bundle"]),
            ("compile-styles", &[]),
            ("copy-images", &[]),
        ]);
        registry
            .register_pipeline(
                "build-js",
                "",
                vec!["bundle".to_string(), "minify".to_string()],
            )
            .unwrap();
        registry
            .register_pipeline(
                "build",
                "",
                vec![
                    "build-js".to_string(),
                    "compile-styles".to_string(),
                    "copy-images".to_string(),
                    // repeated member, must not schedule twice
                    "bundle".to_string(),
                ],
            )
            .unwrap();
        let graph = TaskGraph::build(&registry).unwrap();

        let order = graph.resolve("build").unwrap();
        assert_eq!(order, ["bundle", "minify", "compile-styles", "copy-images"]);
    }

    #[test]
    fn test_cycle_rejected_at_build_time() {
        let mut registry = make_registry(&[("a", &["b"]), ("b", &["a"]), ("lone", &[])]);
        registry
            .register_pipeline("safe", "", vec!["lone".to_string()])
            .unwrap();

        // The cycle does not touch "safe", but the graph still refuses to build.
        let err = TaskGraph::build(&registry).unwrap_err();
        assert!(matches!(err, AssetflowError::CircularDependency { .. }));
    }

    #[test]
    fn test_self_including_pipeline_is_rejected() {
        let mut registry = make_registry(&[("bundle", &[])]);
        registry
            .register_pipeline("outer", "", vec!["bundle".to_string(), "inner".to_string()])
            .unwrap();
        registry
            .register_pipeline("inner", "", vec!["outer".to_string()])
            .unwrap();
        let graph = TaskGraph::build(&registry).unwrap();

        let err = graph.resolve("outer").unwrap_err();
        let AssetflowError::CircularDependency { path } = err else {
            panic!("expected cycle error, got {err:?}");
        };
        assert_eq!(path.first(), path.last());
        assert!(path.contains(&"inner".to_string()));
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let registry = make_registry(&[("bundle", &[])]);
        let graph = TaskGraph::build(&registry).unwrap();

        let err = graph.resolve("deploy").unwrap_err();
        assert!(matches!(
            err,
            AssetflowError::UnknownPipeline { pipeline } if pipeline == "deploy"
        ));
    }
}
