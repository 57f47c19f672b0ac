// src/graph/builder.rs
//! Builds the dependency graph for one front-end.
//!
//! Files are parsed and resolved in parallel; the results are folded into the
//! graph on one thread, in input order, so the output is deterministic.

use crate::graph::imports::{ImportKind, SkipReason};
use crate::graph::model::{BuildStats, Graph};
use crate::graph::resolver::{ImportResolver, ResolveContext};
use crate::text::read_source;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Resolved imports of one file.
#[derive(Debug, Default)]
struct FileImports {
    edges: Vec<(PathBuf, bool)>,
    dynamic: Vec<PathBuf>,
}

/// Parses every file and adds the resolved edges to a fresh graph.
///
/// Files that cannot be read or parsed are counted in
/// [`BuildStats::files_skipped`] and get no node unless another file imports them.
pub fn build<R>(frontend: &R, ctx: &ResolveContext, files: &[PathBuf]) -> Graph
where
    R: ImportResolver + ?Sized,
{
    let parsed: Vec<Result<FileImports, SkipReason>> = files
        .par_iter()
        .map(|path| parse_file(frontend, ctx, path))
        .collect();

    let mut graph = Graph::new();
    let mut stats = BuildStats::default();

    for (path, outcome) in files.iter().zip(parsed) {
        stats.files_scanned += 1;
        match outcome {
            Ok(file) => {
                graph.ensure_node(path);
                for (target, deferred) in file.edges {
                    graph.add_edge(path.clone(), target, deferred);
                }
                for target in file.dynamic {
                    graph.add_dynamic_target(target);
                }
            }
            Err(reason) => {
                debug!(path = %path.display(), %reason, "skipping file");
                stats.files_skipped += 1;
            }
        }
    }
    graph.stats = stats;

    info!(
        frontend = frontend.name(),
        nodes = graph.len(),
        edges = graph.edge_count(),
        skipped = stats.files_skipped,
        "graph built"
    );
    graph
}

fn parse_file<R>(frontend: &R, ctx: &ResolveContext, path: &Path) -> Result<FileImports, SkipReason>
where
    R: ImportResolver + ?Sized,
{
    let source = read_source(path).ok_or(SkipReason::Unreadable)?;
    let raws = frontend.extract(path, &source)?;

    let mut out = FileImports::default();
    for raw in &raws {
        let targets = frontend.resolve(ctx, path, raw);
        if targets.is_empty() {
            trace!(path = %path.display(), spec = %raw.spec, line = raw.line, "unresolved import");
            continue;
        }
        match raw.kind {
            ImportKind::Dynamic => out.dynamic.extend(targets),
            ImportKind::Static | ImportKind::ReExport => {
                out.edges.extend(targets.into_iter().map(|t| (t, raw.deferred)));
            }
        }
    }
    Ok(out)
}
