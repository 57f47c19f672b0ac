// src/coverage/mapping.rs
//! Import-based test mapping, barrel expansion and transitive reach.

use super::TestConventions;
use crate::graph::model::Graph;
use crate::graph::resolver::{ImportResolver, ResolveContext};
use crate::text::read_source;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Production file → test files that cover it directly.
pub type DirectMap = BTreeMap<PathBuf, BTreeSet<PathBuf>>;

/// Dotted module name → production file, for fuzzy test import lookup.
#[derive(Debug, Default)]
pub struct ModuleIndex {
    by_module: HashMap<String, PathBuf>,
}

impl ModuleIndex {
    /// Full names (relative to each root in order) win over package names,
    /// which win over bare final segments. Within a tier the first file in
    /// sorted order wins.
    #[must_use]
    pub fn build(production: &BTreeSet<PathBuf>, roots: &[&Path]) -> Self {
        let mut full: Vec<(String, &PathBuf)> = Vec::new();
        for root in roots {
            for prod in production {
                if let Ok(rel) = prod.strip_prefix(root) {
                    full.push((module_name(rel), prod));
                }
            }
        }

        let mut by_module = HashMap::new();
        for (name, prod) in &full {
            by_module.entry(name.clone()).or_insert_with(|| (*prod).clone());
        }
        for (name, prod) in &full {
            if let Some(package) = name.strip_suffix(".__init__") {
                by_module.entry(package.to_string()).or_insert_with(|| (*prod).clone());
            }
        }
        for (name, prod) in &full {
            let name = name.strip_suffix(".__init__").unwrap_or(name);
            if let Some(last) = name.rsplit('.').next().filter(|l| !l.is_empty()) {
                by_module.entry(last.to_string()).or_insert_with(|| (*prod).clone());
            }
        }
        Self { by_module }
    }

    /// Tries the key, then ever shorter dotted prefixes of it.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&PathBuf> {
        let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
        (1..=parts.len())
            .rev()
            .find_map(|i| self.by_module.get(&parts[..i].join(".")))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_module.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_module.is_empty()
    }
}

/// `pkg/sub/mod.py` → `pkg.sub.mod`.
fn module_name(rel: &Path) -> String {
    let text = rel.to_string_lossy().replace('\\', "/");
    let stem = match text.rsplit_once('.') {
        Some((stem, _)) if !stem.ends_with('/') && !stem.is_empty() => stem,
        _ => text.as_str(),
    };
    stem.replace('/', ".")
}

/// Maps tests to the production files they import. Tests in the graph use
/// its edges; tests outside it are parsed and resolved against `prod_ctx`,
/// falling back to the module index.
pub fn import_based<F>(
    graph: &Graph,
    frontend: &F,
    prod_ctx: &ResolveContext,
    production: &BTreeSet<PathBuf>,
    tests: &BTreeSet<PathBuf>,
) -> DirectMap
where
    F: ImportResolver + TestConventions + ?Sized,
{
    let roots = [prod_ctx.project_root(), prod_ctx.scan_root()];
    let index = ModuleIndex::build(production, &roots);
    debug!(modules = index.len(), tests = tests.len(), "module index built");

    let found: Vec<(PathBuf, Vec<PathBuf>)> = tests
        .par_iter()
        .map(|test| {
            let targets = match graph.get(test) {
                Some(node) => node
                    .imports()
                    .iter()
                    .filter(|p| production.contains(*p))
                    .cloned()
                    .collect(),
                None => external_test_targets(frontend, prod_ctx, &index, test),
            };
            (test.clone(), targets)
        })
        .collect();

    let mut direct = DirectMap::new();
    for (test, targets) in found {
        for target in targets {
            direct.entry(target).or_default().insert(test.clone());
        }
    }
    direct
}

fn external_test_targets<F>(
    frontend: &F,
    prod_ctx: &ResolveContext,
    index: &ModuleIndex,
    test: &Path,
) -> Vec<PathBuf>
where
    F: ImportResolver + TestConventions + ?Sized,
{
    let Some(source) = read_source(test) else {
        return Vec::new();
    };
    frontend
        .test_import_specs(&source)
        .iter()
        .filter_map(|spec| {
            frontend
                .resolve_spec(prod_ctx, test, spec)
                .or_else(|| index.lookup(&frontend.module_key(spec)).cloned())
        })
        .collect()
}

/// Adds the one-hop re-export targets of directly tested barrel files.
/// Barrels reached this way are not expanded again.
pub fn expand_barrels<F>(direct: &mut DirectMap, frontend: &F, prod_ctx: &ResolveContext)
where
    F: ImportResolver + TestConventions + ?Sized,
{
    let barrels: Vec<(PathBuf, BTreeSet<PathBuf>)> = direct
        .iter()
        .filter(|(path, _)| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| frontend.barrel_basenames().contains(&n))
        })
        .map(|(p, t)| (p.clone(), t.clone()))
        .collect();

    for (barrel, tests) in barrels {
        let Some(source) = read_source(&barrel) else {
            continue;
        };
        for spec in frontend.reexport_specs(&source) {
            if let Some(target) = frontend.resolve_spec(prod_ctx, &barrel, &spec) {
                direct.entry(target).or_default().extend(tests.iter().cloned());
            }
        }
    }
}

/// Production files reachable from the directly tested set through
/// production-only imports, excluding the directly tested files themselves.
#[must_use]
pub fn transitive(graph: &Graph, direct: &DirectMap, production: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    let mut visited: BTreeSet<&Path> = direct.keys().map(PathBuf::as_path).collect();
    let mut queue: VecDeque<&Path> = visited.iter().copied().collect();

    while let Some(current) = queue.pop_front() {
        let Some(node) = graph.get(current) else {
            continue;
        };
        for import in node.imports() {
            if production.contains(import) && visited.insert(import.as_path()) {
                queue.push_back(import.as_path());
            }
        }
    }

    visited
        .into_iter()
        .filter(|p| !direct.contains_key(*p))
        .map(Path::to_path_buf)
        .collect()
}
