// src/engine.rs
//! Scan pipeline: enumerate → build → finalize → detectors.
//!
//! One graph per front-end. The detectors are read-only over the finalized
//! graph and run concurrently.

use crate::config::ScanConfig;
use crate::coverage::{detect_test_coverage, TestCoverageResult};
use crate::discovery::find_files;
use crate::error::Result;
use crate::graph::model::{BuildStats, Graph};
use crate::graph::resolver::{FrontEnd, Registry, ResolveContext};
use crate::graph::{build, detect_cycles, detect_facades, finalize, CycleReport, FacadeReport};
use crate::zones::{Zone, ZoneClassifier, ZoneMap};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Findings for one language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageReport {
    pub language: String,
    pub stats: BuildStats,
    pub nodes: usize,
    pub edges: usize,
    pub cycles: CycleReport,
    pub facades: FacadeReport,
    pub coverage: TestCoverageResult,
    /// The finalized graph, for follow-up queries such as coupling.
    #[serde(skip)]
    pub graph: Graph,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    /// In front-end registration order.
    pub languages: Vec<LanguageReport>,
}

impl ScanReport {
    #[must_use]
    pub fn language(&self, name: &str) -> Option<&LanguageReport> {
        self.languages.iter().find(|l| l.language == name)
    }

    /// Pretty JSON; identical for identical trees.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serializing scan report")
    }
}

#[derive(Debug)]
pub struct Engine {
    config: ScanConfig,
    registry: Registry,
}

impl Engine {
    /// Engine with the built-in front-ends.
    ///
    /// # Errors
    /// Returns error if the config or the registry is invalid.
    pub fn new(config: ScanConfig) -> Result<Self> {
        Self::with_registry(config, Registry::builtin())
    }

    /// Validates both inputs before any file is read.
    ///
    /// # Errors
    /// Returns `GraphError::Contract` for a broken front-end and
    /// `GraphError::Config`/`MalformedExclusion` for a bad config.
    pub fn with_registry(config: ScanConfig, registry: Registry) -> Result<Self> {
        config.validate()?;
        registry.validate()?;
        Ok(Self { config, registry })
    }

    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Scans `root` with every front-end that finds files there.
    ///
    /// # Errors
    /// Returns error if `root` or the project root cannot be resolved.
    pub fn scan(&self, root: &Path) -> anyhow::Result<ScanReport> {
        let scan_root = root
            .canonicalize()
            .with_context(|| format!("resolving scan root {}", root.display()))?;
        let project_root = self
            .config
            .project_root
            .canonicalize()
            .with_context(|| format!("resolving project root {}", self.config.project_root.display()))?;
        let config = ScanConfig { project_root, ..self.config.clone() };

        let languages: Vec<LanguageReport> = self
            .registry
            .iter()
            .filter_map(|frontend| scan_language(&config, frontend, &scan_root))
            .collect();

        info!(root = %scan_root.display(), languages = languages.len(), "scan complete");
        Ok(ScanReport { languages })
    }
}

fn scan_language(config: &ScanConfig, frontend: &dyn FrontEnd, scan_root: &Path) -> Option<LanguageReport> {
    let found = find_files(scan_root, frontend.extensions(), &config.prune_dirs);
    if found.is_empty() {
        debug!(frontend = frontend.name(), "no files");
        return None;
    }
    let extra_tests = extra_test_files(config, frontend, scan_root);

    let all: Vec<PathBuf> = found.iter().chain(&extra_tests).cloned().collect();
    let zones = ZoneMap::build(&all, frontend.zone_rules(), &config.zone_overrides, |p| {
        config.relative(p)
    });
    debug!(
        frontend = frontend.name(),
        zoned = zones.len(),
        extra_tests = extra_tests.len(),
        "files classified"
    );

    let files: Vec<PathBuf> = found
        .into_iter()
        .filter(|f| !matches!(zones.zone_of(f), Zone::Generated | Zone::Vendor))
        .collect();

    let ctx = ResolveContext::new(scan_root, &config.project_root, files.iter().cloned())
        .with_aliases(&frontend.path_aliases(config));

    let graph = finalize(build(frontend, &ctx, &files), &config.exclusions);

    let (cycles, (facades, coverage)) = rayon::join(
        || detect_cycles(&graph, config.skip_deferred),
        || {
            rayon::join(
                || detect_facades(&graph, frontend, config.facade_max_importers),
                || {
                    detect_test_coverage(
                        &graph,
                        frontend,
                        &zones,
                        &ctx,
                        &extra_tests,
                        config.coverage_options(),
                    )
                },
            )
        },
    );

    Some(LanguageReport {
        language: frontend.name().to_string(),
        stats: graph.stats(),
        nodes: graph.len(),
        edges: graph.edge_count(),
        cycles,
        facades,
        coverage,
        graph,
    })
}

/// Test files under configured test roots that the scan itself does not reach.
fn extra_test_files(config: &ScanConfig, frontend: &dyn FrontEnd, scan_root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for test_root in &config.test_roots {
        let dir = config.project_root.join(test_root);
        if !dir.is_dir() || dir.starts_with(scan_root) {
            continue;
        }
        out.extend(
            find_files(&dir, frontend.extensions(), &config.prune_dirs)
                .into_iter()
                .filter(|f| !config.exclusions.is_excluded(f)),
        );
    }
    out.sort();
    out.dedup();
    out
}
