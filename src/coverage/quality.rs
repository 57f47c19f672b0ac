// src/coverage/quality.rs
//! Test file quality: assertion, mock and snapshot density per test function.

use super::TestConventions;
use crate::error::{GraphError, Result};
use crate::text::read_source;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Line patterns a front-end uses to grade its test files.
#[derive(Debug, Clone)]
pub struct QualityPatterns {
    assertions: Vec<Regex>,
    mocks: Vec<Regex>,
    snapshots: Vec<Regex>,
    test_functions: Regex,
}

impl QualityPatterns {
    /// `test_function` is compiled multi-line so `^` anchors at each line.
    ///
    /// # Errors
    /// Returns `GraphError::Regex` if any pattern is invalid.
    pub fn compile(
        assertions: &[&str],
        mocks: &[&str],
        snapshots: &[&str],
        test_function: &str,
    ) -> Result<Self> {
        Ok(Self {
            assertions: compile_all(assertions)?,
            mocks: compile_all(mocks)?,
            snapshots: compile_all(snapshots)?,
            test_functions: Regex::new(&format!("(?m){test_function}"))?,
        })
    }
}

fn compile_all(patterns: &[&str]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| Regex::new(p).map_err(GraphError::from)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLabel {
    NoTests,
    AssertionFree,
    OverMocked,
    SnapshotHeavy,
    Smoke,
    Thorough,
    Adequate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestQuality {
    pub assertion_count: usize,
    pub mock_count: usize,
    pub snapshot_count: usize,
    pub test_case_count: usize,
    pub quality_label: QualityLabel,
}

/// First matching rule wins.
#[must_use]
pub fn classify(assertions: usize, mocks: usize, snapshots: usize, test_functions: usize) -> QualityLabel {
    if test_functions == 0 {
        QualityLabel::NoTests
    } else if assertions == 0 {
        QualityLabel::AssertionFree
    } else if mocks > assertions {
        QualityLabel::OverMocked
    } else if snapshots > 0 && snapshots * 2 > assertions {
        QualityLabel::SnapshotHeavy
    } else if assertions < test_functions {
        QualityLabel::Smoke
    } else if assertions >= test_functions * 3 {
        QualityLabel::Thorough
    } else {
        QualityLabel::Adequate
    }
}

/// Grades comment-stripped test source. Each line counts at most once per
/// category, however many patterns it matches.
#[must_use]
pub fn analyze(stripped: &str, patterns: &QualityPatterns) -> TestQuality {
    let count = |set: &[Regex]| {
        stripped
            .lines()
            .filter(|line| set.iter().any(|re| re.is_match(line)))
            .count()
    };
    let assertions = count(&patterns.assertions);
    let mocks = count(&patterns.mocks);
    let snapshots = count(&patterns.snapshots);
    let test_functions = patterns.test_functions.find_iter(stripped).count();

    TestQuality {
        assertion_count: assertions,
        mock_count: mocks,
        snapshot_count: snapshots,
        test_case_count: test_functions,
        quality_label: classify(assertions, mocks, snapshots, test_functions),
    }
}

/// Grades every readable test file; unreadable ones get no record.
pub fn analyze_files<F>(frontend: &F, tests: &BTreeSet<PathBuf>) -> BTreeMap<PathBuf, TestQuality>
where
    F: TestConventions + ?Sized,
{
    let patterns = frontend.quality_patterns();
    tests
        .par_iter()
        .filter_map(|path| {
            let source = read_source(path)?;
            let stripped = frontend.strip_comments(&source);
            Some((path.clone(), analyze(&stripped, patterns)))
        })
        .collect()
}
