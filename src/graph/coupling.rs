// src/graph/coupling.rs
//! Afferent and efferent coupling for single files.

use crate::graph::model::Graph;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Coupling metrics for a single file node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CouplingScore {
    /// Afferent coupling: files that depend on this file.
    pub fan_in: usize,
    /// Efferent coupling: files this file depends on.
    pub fan_out: usize,
    /// `fan_out / (fan_in + fan_out)`, 0 for an isolated file.
    pub instability: f64,
    pub imports: Vec<PathBuf>,
    pub importers: Vec<PathBuf>,
}

impl CouplingScore {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(fan_in: usize, fan_out: usize) -> Self {
        let total = fan_in + fan_out;
        let instability = if total == 0 { 0.0 } else { fan_out as f64 / total as f64 };
        Self { fan_in, fan_out, instability, ..Self::default() }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.fan_in + self.fan_out
    }
}

/// Coupling for `path`; cached counts are used when the graph is finalized.
/// A path absent from the graph scores zero everywhere.
#[must_use]
pub fn coupling_score(graph: &Graph, path: &Path) -> CouplingScore {
    let Some(node) = graph.get(path) else {
        return CouplingScore::default();
    };
    let fan_in = node.fan_in();
    let fan_out = node.fan_out();
    CouplingScore {
        imports: node.imports().iter().cloned().collect(),
        importers: node.importers().iter().cloned().collect(),
        ..CouplingScore::new(fan_in, fan_out)
    }
}

/// Files whose `fan_in + fan_out` exceeds `min_total`, most coupled first.
#[must_use]
pub fn most_coupled(graph: &Graph, min_total: usize) -> Vec<(PathBuf, CouplingScore)> {
    let mut out: Vec<(PathBuf, CouplingScore)> = graph
        .paths()
        .map(|p| (p.clone(), coupling_score(graph, p)))
        .filter(|(_, score)| score.total() > min_total)
        .collect();
    out.sort_by(|a, b| b.1.total().cmp(&a.1.total()).then_with(|| a.0.cmp(&b.0)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Exclusions;
    use crate::graph::finalize::finalize;

    fn hub_graph() -> Graph {
        finalize(
            Graph::from_edges([
                ("a.py", "hub.py", false),
                ("b.py", "hub.py", false),
                ("c.py", "hub.py", false),
                ("hub.py", "types.py", false),
            ]),
            &Exclusions::default(),
        )
    }

    #[test]
    fn test_hub_scores() {
        let hub = coupling_score(&hub_graph(), Path::new("hub.py"));
        assert_eq!(hub.fan_in, 3);
        assert_eq!(hub.fan_out, 1);
        assert!((hub.instability - 0.25).abs() < f64::EPSILON);
        assert_eq!(hub.imports, [PathBuf::from("types.py")]);
        assert_eq!(hub.importers.len(), 3);
    }

    #[test]
    fn test_unknown_path_is_zero() {
        let score = coupling_score(&hub_graph(), Path::new("missing.py"));
        assert_eq!(score, CouplingScore::default());
        assert!(score.instability.abs() < f64::EPSILON);
    }

    #[test]
    fn test_leaf_is_fully_unstable() {
        let a = coupling_score(&hub_graph(), Path::new("a.py"));
        assert!((a.instability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_most_coupled_orders_by_total() {
        let ranked = most_coupled(&hub_graph(), 1);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, PathBuf::from("hub.py"));
        assert_eq!(most_coupled(&hub_graph(), 0).len(), 5);
    }
}
