// src/graph/finalize.rs
use crate::config::Exclusions;
use crate::graph::model::Graph;
use tracing::debug;

/// Drops excluded nodes, scrubs every reference to them, then caches the
/// per-node counts. Finalizing a finalized graph with the same exclusions
/// returns it unchanged.
#[must_use]
pub fn finalize(mut graph: Graph, exclusions: &Exclusions) -> Graph {
    if !exclusions.is_empty() {
        let before = graph.nodes.len();
        graph.nodes.retain(|path, _| !exclusions.is_excluded(path));
        for node in graph.nodes.values_mut() {
            node.imports.retain(|p| !exclusions.is_excluded(p));
            node.importers.retain(|p| !exclusions.is_excluded(p));
            node.deferred_imports.retain(|p| !exclusions.is_excluded(p));
        }
        graph.dynamic_targets.retain(|p| !exclusions.is_excluded(p));

        let removed = before - graph.nodes.len();
        if removed > 0 {
            debug!(removed, "excluded files dropped from graph");
        }
    }

    for node in graph.nodes.values_mut() {
        node.import_count = Some(node.imports.len());
        node.importer_count = Some(node.importers.len());
    }
    graph
}
