// src/graph/cycles.rs
//! Import cycle detection.
//!
//! Tarjan's strongly-connected-components algorithm with an explicit work
//! stack, so deep import chains cannot overflow the call stack. Every SCC
//! with two or more files is a cycle; self-imports are not.

use crate::graph::model::Graph;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One strongly connected component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Sorted member files.
    pub files: Vec<PathBuf>,
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Largest first; ties by member list.
    pub cycles: Vec<Cycle>,
    /// Edges traversed (the potential for this check).
    pub total_edges: usize,
}

const UNVISITED: usize = usize::MAX;

/// Detects import cycles. With `skip_deferred`, function-local imports are
/// left out because they cannot fail at module load time.
#[must_use]
pub fn detect_cycles(graph: &Graph, skip_deferred: bool) -> CycleReport {
    let paths: Vec<&PathBuf> = graph.paths().collect();
    let index_of: HashMap<&Path, usize> =
        paths.iter().enumerate().map(|(i, p)| (p.as_path(), i)).collect();

    let adjacency: Vec<Vec<usize>> = graph
        .iter()
        .map(|(_, node)| {
            node.imports()
                .iter()
                .filter(|t| !(skip_deferred && node.deferred_imports().contains(*t)))
                .filter_map(|t| index_of.get(t.as_path()).copied())
                .collect()
        })
        .collect();
    let total_edges = adjacency.iter().map(Vec::len).sum();

    let mut cycles: Vec<Cycle> = tarjan(&adjacency)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut files: Vec<PathBuf> = scc.into_iter().map(|i| paths[i].clone()).collect();
            files.sort();
            Cycle { length: files.len(), files }
        })
        .collect();
    cycles.sort_by(|a, b| b.length.cmp(&a.length).then_with(|| a.files.cmp(&b.files)));

    debug!(cycles = cycles.len(), total_edges, skip_deferred, "cycle detection done");
    CycleReport { cycles, total_edges }
}

struct TarjanState {
    index: Vec<usize>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    counter: usize,
    components: Vec<Vec<usize>>,
}

impl TarjanState {
    fn new(n: usize) -> Self {
        Self {
            index: vec![UNVISITED; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            counter: 0,
            components: Vec::new(),
        }
    }

    fn visit(&mut self, v: usize) {
        self.index[v] = self.counter;
        self.lowlink[v] = self.counter;
        self.counter += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }

    fn pop_component(&mut self, root: usize) {
        let mut component = Vec::new();
        while let Some(w) = self.stack.pop() {
            self.on_stack[w] = false;
            component.push(w);
            if w == root {
                break;
            }
        }
        self.components.push(component);
    }
}

#[allow(clippy::indexing_slicing)] // All indices come from 0..adjacency.len()
fn tarjan(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut st = TarjanState::new(adjacency.len());
    // (node, position of the next edge to explore)
    let mut work: Vec<(usize, usize)> = Vec::new();

    for start in 0..adjacency.len() {
        if st.index[start] != UNVISITED {
            continue;
        }
        st.visit(start);
        work.push((start, 0));

        while let Some(&(v, pos)) = work.last() {
            if let Some(&w) = adjacency[v].get(pos) {
                if let Some(frame) = work.last_mut() {
                    frame.1 += 1;
                }
                if st.index[w] == UNVISITED {
                    st.visit(w);
                    work.push((w, 0));
                } else if st.on_stack[w] {
                    st.lowlink[v] = st.lowlink[v].min(st.index[w]);
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                st.lowlink[parent] = st.lowlink[parent].min(st.lowlink[v]);
            }
            if st.lowlink[v] == st.index[v] {
                st.pop_component(v);
            }
        }
    }
    st.components
}
