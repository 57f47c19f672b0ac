use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::zones::Zone;

/// On-disk shape of `slopgraph.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopGraphToml {
    pub graph: GraphSection,
    pub facade: FacadeSection,
    pub coverage: CoverageSection,
    pub typescript: TsSection,
    /// Manual zone overrides keyed by project-relative path.
    pub zones: BTreeMap<String, Zone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    /// Substring patterns; matching files are dropped during finalization.
    pub exclude: Vec<String>,
    /// Ignore function-local imports when searching for cycles.
    pub skip_deferred: bool,
    /// Directory names never descended into by the enumerator.
    pub prune_dirs: Vec<String>,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            skip_deferred: true,
            prune_dirs: default_prune_dirs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeSection {
    pub max_importers: usize,
}

impl Default for FacadeSection {
    fn default() -> Self {
        Self { max_importers: default_facade_max_importers() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageSection {
    /// Test directories outside the scan root, relative to the project root.
    pub test_roots: Vec<String>,
    pub critical_importers: usize,
    /// Production files shorter than this are left out of coverage.
    pub min_loc: usize,
}

impl Default for CoverageSection {
    fn default() -> Self {
        Self {
            test_roots: vec!["tests".to_string()],
            critical_importers: default_critical_importers(),
            min_loc: default_min_loc(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TsSection {
    /// Alias prefix -> directory relative to the project root, e.g. `"@/" = "src/"`.
    pub aliases: BTreeMap<String, String>,
}

pub(crate) const fn default_facade_max_importers() -> usize { 2 }
pub(crate) const fn default_critical_importers() -> usize { 10 }
pub(crate) const fn default_min_loc() -> usize { 10 }

pub(crate) fn default_prune_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "__pycache__",
        ".venv",
        "venv",
        ".env",
        "dist",
        "build",
        ".next",
        ".nuxt",
        ".output",
        ".tox",
        ".mypy_cache",
        ".pytest_cache",
        ".ruff_cache",
        "target",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}
