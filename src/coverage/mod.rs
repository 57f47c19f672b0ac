// src/coverage/mod.rs
//! Test coverage mapper.
//!
//! Partitions scorable production files into directly tested, transitively
//! tested and untested:
//! 1. tests that import a production file test it directly
//! 2. naming conventions add more direct pairs
//! 3. directly tested barrels pass their tests one hop down
//! 4. a BFS over production-only imports finds the transitive set
//!
//! Mapping runs over every production file; only scorable ones (long enough
//! and holding runtime logic) are reported.

pub mod mapping;
pub mod naming;
pub mod quality;

use self::mapping::DirectMap;
use self::quality::{QualityPatterns, TestQuality};
use crate::config::types::{default_critical_importers, default_min_loc};
use crate::graph::model::Graph;
use crate::graph::resolver::{ImportResolver, ResolveContext};
use crate::text::{count_loc, read_source};
use crate::zones::{Zone, ZoneClassifier};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cap on a single file's contribution to the LOC-weighted potential.
pub const MAX_LOC_WEIGHT: f64 = 50.0;

/// Per-language knowledge about test files.
pub trait TestConventions: Send + Sync {
    fn strip_comments(&self, source: &str) -> String;

    fn quality_patterns(&self) -> &QualityPatterns;

    /// Import specs found in a test file that is not part of the graph.
    fn test_import_specs(&self, source: &str) -> Vec<String>;

    /// Dotted key for the fuzzy module index.
    fn module_key(&self, spec: &str) -> String;

    /// Exact production paths a test file is named after, best first.
    fn naming_candidates(&self, test_path: &Path) -> Vec<PathBuf>;

    /// Production basename for a test basename, `None` if it carries no marker.
    fn strip_test_markers(&self, basename: &str) -> Option<String>;

    /// Whether a production file holds runtime logic worth a dedicated test.
    fn has_testable_logic(&self, _path: &Path, _source: &str) -> bool {
        true
    }

    /// Basenames of index files whose re-exports inherit their tests.
    fn barrel_basenames(&self) -> &'static [&'static str] {
        &[]
    }

    fn reexport_specs(&self, _source: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Thresholds for one coverage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageOptions {
    /// Importer count at which an entry is flagged critical.
    pub critical_importers: usize,
    /// Production files shorter than this are not scored.
    pub min_loc: usize,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            critical_importers: default_critical_importers(),
            min_loc: default_min_loc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageEntry {
    pub loc: usize,
    pub importer_count: usize,
    /// Importer count at or above the configured critical threshold.
    pub critical: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestCoverageResult {
    pub directly_tested: BTreeMap<PathBuf, CoverageEntry>,
    pub transitively_tested: BTreeMap<PathBuf, CoverageEntry>,
    pub untested: BTreeMap<PathBuf, CoverageEntry>,
    /// Directly tested file → the tests that import or name it.
    pub direct_tests: BTreeMap<PathBuf, Vec<PathBuf>>,
    pub test_quality: BTreeMap<PathBuf, TestQuality>,
    /// Scorable production files considered.
    pub potential: usize,
    /// `Σ min(√loc, 50)` over the scorable files, rounded.
    pub loc_weighted_potential: usize,
}

impl TestCoverageResult {
    #[must_use]
    pub fn tested_count(&self) -> usize {
        self.directly_tested.len() + self.transitively_tested.len()
    }
}

/// Maps tests to the production files of a finalized graph.
///
/// `extra_tests` are test files outside the scanned root (not graph nodes);
/// they are parsed and resolved against the production set.
pub fn detect_test_coverage<F>(
    graph: &Graph,
    frontend: &F,
    zones: &dyn ZoneClassifier,
    ctx: &ResolveContext,
    extra_tests: &[PathBuf],
    options: CoverageOptions,
) -> TestCoverageResult
where
    F: ImportResolver + TestConventions + ?Sized,
{
    let mut production = BTreeSet::new();
    let mut tests = BTreeSet::new();
    for path in graph.paths() {
        match zones.zone_of(path) {
            zone if zone.is_production() => {
                production.insert(path.clone());
            }
            Zone::Test => {
                tests.insert(path.clone());
            }
            _ => {}
        }
    }
    tests.extend(extra_tests.iter().cloned());

    let scorable = scorable_files(frontend, &production, options.min_loc);
    let critical = options.critical_importers;

    if tests.is_empty() {
        debug!(scorable = scorable.len(), "no test files; everything untested");
        return TestCoverageResult {
            untested: entries_for(graph, scorable.keys(), &scorable, critical),
            potential: scorable.len(),
            loc_weighted_potential: loc_weighted_potential(&scorable),
            ..TestCoverageResult::default()
        };
    }

    let prod_ctx = ctx.restricted_to(production.iter().cloned());
    let mut direct = mapping::import_based(graph, frontend, &prod_ctx, &production, &tests);
    for (prod, test) in naming::naming_based(frontend, &production, &tests) {
        direct.entry(prod).or_default().insert(test);
    }
    mapping::expand_barrels(&mut direct, frontend, &prod_ctx);
    direct.retain(|path, _| production.contains(path));

    let transitive = mapping::transitive(graph, &direct, &production);
    let untested: Vec<&PathBuf> = scorable
        .keys()
        .filter(|p| !direct.contains_key(*p) && !transitive.contains(*p))
        .collect();

    let directly_tested = entries_for(graph, direct.keys(), &scorable, critical);
    let transitively_tested = entries_for(graph, &transitive, &scorable, critical);
    debug!(
        production = production.len(),
        scorable = scorable.len(),
        tests = tests.len(),
        direct = directly_tested.len(),
        transitive = transitively_tested.len(),
        untested = untested.len(),
        "coverage mapping done"
    );

    TestCoverageResult {
        directly_tested,
        transitively_tested,
        untested: entries_for(graph, untested, &scorable, critical),
        direct_tests: attribution(direct, &scorable),
        test_quality: quality::analyze_files(frontend, &tests),
        potential: scorable.len(),
        loc_weighted_potential: loc_weighted_potential(&scorable),
    }
}

/// Production files with at least `min_loc` lines and testable logic,
/// with their line counts. Unreadable files count as zero lines.
fn scorable_files<F>(
    frontend: &F,
    production: &BTreeSet<PathBuf>,
    min_loc: usize,
) -> BTreeMap<PathBuf, usize>
where
    F: TestConventions + ?Sized,
{
    production
        .par_iter()
        .filter_map(|path| {
            let source = read_source(path).unwrap_or_default();
            let loc = count_loc(&source);
            let scorable = loc >= min_loc && frontend.has_testable_logic(path, &source);
            scorable.then(|| (path.clone(), loc))
        })
        .collect()
}

/// Entries for the scorable members of `paths`.
fn entries_for<'a, I>(
    graph: &Graph,
    paths: I,
    scorable: &BTreeMap<PathBuf, usize>,
    critical_importers: usize,
) -> BTreeMap<PathBuf, CoverageEntry>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    paths
        .into_iter()
        .filter_map(|path| {
            let loc = *scorable.get(path)?;
            let importer_count = graph.get(path).map_or(0, |n| n.fan_in());
            let entry = CoverageEntry {
                loc,
                importer_count,
                critical: importer_count >= critical_importers,
            };
            Some((path.clone(), entry))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn loc_weighted_potential(scorable: &BTreeMap<PathBuf, usize>) -> usize {
    let total: f64 = scorable
        .values()
        .map(|&loc| (loc as f64).sqrt().min(MAX_LOC_WEIGHT))
        .sum();
    total.round() as usize
}

fn attribution(direct: DirectMap, scorable: &BTreeMap<PathBuf, usize>) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    direct
        .into_iter()
        .filter(|(prod, _)| scorable.contains_key(prod))
        .map(|(prod, tests)| (prod, tests.into_iter().collect()))
        .collect()
}
