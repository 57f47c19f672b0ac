// src/graph/facade.rs
//! Re-export facade detection.
//!
//! A facade is a file whose body only forwards other modules and that few
//! files import: indirection left behind after a refactor. Packages whose
//! init file and every sibling are facades are reported as directories.

use crate::graph::model::Graph;
use crate::graph::resolver::ImportResolver;
use crate::text::{count_loc, read_source};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacadeKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacadeCandidate {
    pub path: PathBuf,
    pub kind: FacadeKind,
    pub loc: usize,
    pub importer_count: usize,
    pub re_exported_targets: Vec<String>,
    /// Files in the package, directories only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacadeReport {
    /// Files before directories, fewest importers first, largest first.
    pub entries: Vec<FacadeCandidate>,
    /// Graph files examined (the potential for this check).
    pub total_checked: usize,
}

/// Flags facade files with at most `max_importers` importers, then facade
/// packages for front-ends that have a package-init file.
pub fn detect_facades<R>(graph: &Graph, frontend: &R, max_importers: usize) -> FacadeReport
where
    R: ImportResolver + ?Sized,
{
    let paths: Vec<&PathBuf> = graph.paths().collect();
    let mut entries: Vec<FacadeCandidate> = paths
        .par_iter()
        .filter_map(|path| file_facade(graph, frontend, path, max_importers))
        .collect();

    if let Some(init) = frontend.package_init() {
        let dirs = directory_facades(graph, &entries, init, max_importers);
        entries.extend(dirs);
    }

    entries.sort_by(|a, b| {
        (a.kind, a.importer_count, Reverse(a.loc), &a.path)
            .cmp(&(b.kind, b.importer_count, Reverse(b.loc), &b.path))
    });

    debug!(facades = entries.len(), checked = paths.len(), "facade detection done");
    FacadeReport { entries, total_checked: paths.len() }
}

fn file_facade<R>(graph: &Graph, frontend: &R, path: &Path, max_importers: usize) -> Option<FacadeCandidate>
where
    R: ImportResolver + ?Sized,
{
    let node = graph.get(path)?;
    let importer_count = node.fan_in();
    if importer_count > max_importers {
        return None;
    }
    let source = read_source(path)?;
    let targets = frontend.facade_targets(&source)?;
    Some(FacadeCandidate {
        path: path.to_path_buf(),
        kind: FacadeKind::File,
        loc: count_loc(&source),
        importer_count,
        re_exported_targets: targets,
        file_count: None,
    })
}

/// A package is a facade directory when its init file and every sibling are
/// facades. An init file alone is an ordinary package, not a facade.
fn directory_facades(
    graph: &Graph,
    files: &[FacadeCandidate],
    init_name: &str,
    max_importers: usize,
) -> Vec<FacadeCandidate> {
    let facades: BTreeMap<&Path, &FacadeCandidate> =
        files.iter().map(|c| (c.path.as_path(), c)).collect();

    let mut by_dir: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
    for path in graph.paths() {
        if let Some(dir) = path.parent() {
            by_dir.entry(dir).or_default().push(path.as_path());
        }
    }

    let mut out = Vec::new();
    for (dir, members) in by_dir {
        let init = dir.join(init_name);
        let Some(init_entry) = facades.get(init.as_path()) else {
            continue;
        };
        let siblings: Vec<&Path> = members.iter().copied().filter(|m| *m != init.as_path()).collect();
        if siblings.is_empty() || !siblings.iter().all(|s| facades.contains_key(s)) {
            continue;
        }
        if init_entry.importer_count > max_importers {
            continue;
        }

        let member_entries: Vec<&FacadeCandidate> =
            members.iter().filter_map(|m| facades.get(m).copied()).collect();
        let targets: BTreeSet<&String> =
            member_entries.iter().flat_map(|e| &e.re_exported_targets).collect();

        out.push(FacadeCandidate {
            path: dir.to_path_buf(),
            kind: FacadeKind::Directory,
            loc: member_entries.iter().map(|e| e.loc).sum(),
            importer_count: init_entry.importer_count,
            re_exported_targets: targets.into_iter().cloned().collect(),
            file_count: Some(members.len()),
        });
    }
    out
}
