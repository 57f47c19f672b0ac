// src/coverage/naming.rs
//! Naming-convention mapping: `test_x.py` tests `x.py`, `x.test.ts` tests `x.ts`.

use super::TestConventions;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::PathBuf;

/// `(production file, test file)` pairs found by name.
///
/// Exact sibling/parent candidates win; otherwise every production file
/// with the stripped basename matches.
pub fn naming_based<F>(
    frontend: &F,
    production: &BTreeSet<PathBuf>,
    tests: &BTreeSet<PathBuf>,
) -> Vec<(PathBuf, PathBuf)>
where
    F: TestConventions + ?Sized,
{
    let mut by_basename: BTreeMap<&OsStr, Vec<&PathBuf>> = BTreeMap::new();
    for prod in production {
        if let Some(name) = prod.file_name() {
            by_basename.entry(name).or_default().push(prod);
        }
    }

    let mut pairs = Vec::new();
    for test in tests {
        if let Some(hit) = frontend
            .naming_candidates(test)
            .into_iter()
            .find(|c| production.contains(c))
        {
            pairs.push((hit, test.clone()));
            continue;
        }

        let source_name = test
            .file_name()
            .and_then(OsStr::to_str)
            .and_then(|b| frontend.strip_test_markers(b));
        let Some(source_name) = source_name else {
            continue;
        };
        if let Some(matches) = by_basename.get(OsStr::new(&source_name)) {
            pairs.extend(matches.iter().map(|p| ((*p).clone(), test.clone())));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::resolver::{PythonFrontEnd, TypeScriptFrontEnd};

    fn set(paths: &[&str]) -> BTreeSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn exact_candidate_beats_fuzzy() {
        let prod = set(&["/r/pkg/models.py", "/r/other/models.py"]);
        let tests = set(&["/r/pkg/tests/test_models.py"]);
        let pairs = naming_based(&PythonFrontEnd, &prod, &tests);
        assert_eq!(pairs, [(PathBuf::from("/r/pkg/models.py"), PathBuf::from("/r/pkg/tests/test_models.py"))]);
    }

    #[test]
    fn fuzzy_basename_matches_all() {
        let prod = set(&["/r/a/models.py", "/r/b/models.py", "/r/b/views.py"]);
        let tests = set(&["/r/tests/unit/test_models.py"]);
        let pairs = naming_based(&PythonFrontEnd, &prod, &tests);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn ts_spec_and_tests_dir() {
        let prod = set(&["/p/src/format.ts", "/p/src/Button.tsx"]);
        let tests = set(&["/p/src/__tests__/format.ts", "/p/src/Button.spec.tsx"]);
        let pairs = naming_based(&TypeScriptFrontEnd, &prod, &tests);
        let targets: BTreeSet<PathBuf> = pairs.into_iter().map(|(p, _)| p).collect();
        assert_eq!(targets, prod);
    }
}
