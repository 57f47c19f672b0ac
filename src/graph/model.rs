// src/graph/model.rs
//! The module dependency graph.
//!
//! Keys are absolute file paths. Every edge is stored twice (`imports` on the
//! source, `importers` on the target) and every endpoint has a node, so the
//! graph never holds a dangling reference.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// One source file in the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Node {
    pub(crate) imports: BTreeSet<PathBuf>,
    pub(crate) importers: BTreeSet<PathBuf>,
    /// Subset of `imports` reached only from function/method bodies.
    pub(crate) deferred_imports: BTreeSet<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) import_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) importer_count: Option<usize>,
}

impl Node {
    #[must_use]
    pub fn imports(&self) -> &BTreeSet<PathBuf> {
        &self.imports
    }

    #[must_use]
    pub fn importers(&self) -> &BTreeSet<PathBuf> {
        &self.importers
    }

    #[must_use]
    pub fn deferred_imports(&self) -> &BTreeSet<PathBuf> {
        &self.deferred_imports
    }

    /// Cached fan-out; `None` until the graph is finalized.
    #[must_use]
    pub fn import_count(&self) -> Option<usize> {
        self.import_count
    }

    /// Cached fan-in; `None` until the graph is finalized.
    #[must_use]
    pub fn importer_count(&self) -> Option<usize> {
        self.importer_count
    }

    /// Number of importers: the cached count, or the live set on an
    /// unfinalized graph.
    #[must_use]
    pub fn fan_in(&self) -> usize {
        self.importer_count.unwrap_or(self.importers.len())
    }

    #[must_use]
    pub fn fan_out(&self) -> usize {
        self.import_count.unwrap_or(self.imports.len())
    }

    /// Imports executed at module load time.
    pub fn load_time_imports(&self) -> impl Iterator<Item = &PathBuf> {
        self.imports.iter().filter(|p| !self.deferred_imports.contains(*p))
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.import_count == Some(self.imports.len())
            && self.importer_count == Some(self.importers.len())
    }
}

/// File counts gathered while building; skipped files are not graph nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<PathBuf, Node>,
    /// Files loaded through dynamic import calls (not edges).
    pub(crate) dynamic_targets: BTreeSet<PathBuf>,
    pub(crate) stats: BuildStats,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(source, target, deferred)` triples.
    pub fn from_edges<I, P>(edges: I) -> Self
    where
        I: IntoIterator<Item = (P, P, bool)>,
        P: Into<PathBuf>,
    {
        let mut graph = Self::new();
        for (from, to, deferred) in edges {
            graph.add_edge(from.into(), to.into(), deferred);
        }
        graph
    }

    /// Returns the node for `path`, creating an empty one if needed.
    pub fn ensure_node(&mut self, path: &Path) -> &mut Node {
        self.nodes.entry(path.to_path_buf()).or_default()
    }

    /// Adds `from -> to` in both directions.
    ///
    /// An edge stays deferred only while every occurrence seen so far was
    /// deferred; one top-level occurrence makes it a load-time edge.
    pub fn add_edge(&mut self, from: PathBuf, to: PathBuf, deferred: bool) {
        let target = self.ensure_node(&to);
        target.importers.insert(from.clone());
        target.importer_count = None;

        let node = self.ensure_node(&from);
        let seen_at_load_time =
            node.imports.contains(&to) && !node.deferred_imports.contains(&to);

        if deferred {
            if !seen_at_load_time {
                node.deferred_imports.insert(to.clone());
            }
        } else {
            node.deferred_imports.remove(&to);
        }
        node.imports.insert(to);
        node.import_count = None;
    }

    pub fn add_dynamic_target(&mut self, path: PathBuf) {
        self.dynamic_targets.insert(path);
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Node> {
        self.nodes.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Node)> {
        self.nodes.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.nodes.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of `imports` edges, deferred ones included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.imports.len()).sum()
    }

    #[must_use]
    pub fn dynamic_targets(&self) -> &BTreeSet<PathBuf> {
        &self.dynamic_targets
    }

    #[must_use]
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.nodes.values().all(Node::is_finalized)
    }

    /// `b ∈ imports(a)` exactly when `a ∈ importers(b)`.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let forward = self.nodes.iter().all(|(a, node)| {
            node.imports
                .iter()
                .all(|b| self.nodes.get(b).is_some_and(|t| t.importers.contains(a)))
        });
        let backward = self.nodes.iter().all(|(b, node)| {
            node.importers
                .iter()
                .all(|a| self.nodes.get(a).is_some_and(|s| s.imports.contains(b)))
        });
        forward && backward
    }

    /// References (from any node set) to paths that have no node.
    #[must_use]
    pub fn dangling_refs(&self) -> Vec<(PathBuf, PathBuf)> {
        let mut out = Vec::new();
        for (path, node) in &self.nodes {
            let refs = node
                .imports
                .iter()
                .chain(&node.importers)
                .chain(&node.deferred_imports);
            for r in refs {
                if !self.nodes.contains_key(r) {
                    out.push((path.clone(), r.clone()));
                }
            }
        }
        out
    }
}
