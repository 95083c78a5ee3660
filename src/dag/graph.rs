//! DependencyGraph - `depends` edges between backends of one batch
//!
//! Edges point from a backend to the backends it waits for. Names outside
//! the batch are dropped, matching the runner, which does not wait on them.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::BackendSet;
use crate::error::{BotsError, Result};

pub struct DependencyGraph {
    /// Batch members in request order
    nodes: Vec<String>,
    /// name → in-batch dependencies
    waits_for: FxHashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Graph over every configured backend
    pub fn from_backends(backends: &BackendSet) -> Self {
        Self::for_batch(backends, &backends.names())
    }

    /// Graph over the requested names only
    pub fn for_batch(backends: &BackendSet, batch: &[String]) -> Self {
        let members: FxHashSet<&str> = batch.iter().map(String::as_str).collect();
        let mut nodes = Vec::with_capacity(batch.len());
        let mut waits_for: FxHashMap<String, Vec<String>> = FxHashMap::default();

        for name in batch {
            if waits_for.contains_key(name) {
                continue;
            }
            let deps: Vec<String> = backends
                .get(name)
                .map(|backend| {
                    backend
                        .depends()
                        .iter()
                        .filter(|dep| members.contains(dep.as_str()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            nodes.push(name.clone());
            waits_for.insert(name.clone(), deps);
        }

        Self { nodes, waits_for }
    }

    pub fn dependencies(&self, name: &str) -> &[String] {
        self.waits_for.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Backends with no in-batch dependencies
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|name| self.dependencies(name).is_empty())
            .map(String::as_str)
            .collect()
    }

    /// Three-color DFS; the error names the cycle as `a → b → a`
    pub fn detect_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs<'a>(
            node: &'a str,
            graph: &'a DependencyGraph,
            colors: &mut FxHashMap<&'a str, Color>,
            stack: &mut Vec<&'a str>,
        ) -> std::result::Result<(), String> {
            colors.insert(node, Color::Gray);
            stack.push(node);

            for dep in graph.dependencies(node) {
                match colors.get(dep.as_str()).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        let start = stack.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                        let cycle = stack[start..].join(" → ");
                        return Err(format!("{} → {}", cycle, dep));
                    }
                    Color::White => dfs(dep, graph, colors, stack)?,
                    Color::Black => {}
                }
            }

            stack.pop();
            colors.insert(node, Color::Black);
            Ok(())
        }

        let mut colors: FxHashMap<&str, Color> = self
            .nodes
            .iter()
            .map(|name| (name.as_str(), Color::White))
            .collect();
        let mut stack = Vec::new();

        for name in &self.nodes {
            if colors.get(name.as_str()) == Some(&Color::White) {
                dfs(name, self, &mut colors, &mut stack)
                    .map_err(|cycle| BotsError::DependencyCycle { cycle })?;
            }
        }
        Ok(())
    }
}

/// `(backend, missing)` pairs where `depends` names an unconfigured backend
pub fn dangling_dependencies(backends: &BackendSet) -> Vec<(String, String)> {
    backends
        .iter()
        .flat_map(|backend| {
            backend
                .depends()
                .iter()
                .filter(|dep| !backends.contains(dep))
                .map(|dep| (backend.name().to_string(), dep.clone()))
                .collect::<Vec<_>>()
        })
        .collect()
}
