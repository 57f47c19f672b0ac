// tests/unit_coverage.rs
//! Test coverage mapping: direct, naming, barrels, transitive, quality,
//! and which production files are scored at all.

use slopgraph::config::Exclusions;
use slopgraph::coverage::quality::QualityLabel;
use slopgraph::coverage::{detect_test_coverage, CoverageOptions, TestCoverageResult};
use slopgraph::discovery::find_files;
use slopgraph::graph::resolver::{FrontEnd, ImportResolver, PythonFrontEnd, TypeScriptFrontEnd};
use slopgraph::graph::{build, finalize, ResolveContext};
use slopgraph::zones::ZoneMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn project(files: &[(&str, String)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    (dir, root)
}

/// `n` two-line Python functions `f0..fn`.
fn logic(n: usize) -> String {
    (0..n).map(|i| format!("def f{i}():\n    return {i}\n")).collect()
}

/// `n` three-line exported TypeScript functions `f0..fn`.
fn ts_logic(n: usize) -> String {
    (0..n).map(|i| format!("export function f{i}() {{\n  return {i};\n}}\n")).collect()
}

fn coverage_with<F: FrontEnd>(
    frontend: &F,
    project_root: &Path,
    scan_root: &Path,
    extra_tests: &[PathBuf],
    options: CoverageOptions,
) -> TestCoverageResult {
    let found = find_files(scan_root, frontend.extensions(), &[]);
    let all: Vec<PathBuf> = found.iter().chain(extra_tests).cloned().collect();
    let zones = ZoneMap::build(&all, frontend.zone_rules(), &BTreeMap::new(), |p| {
        p.strip_prefix(project_root).unwrap_or(p).to_string_lossy().replace('\\', "/")
    });
    let ctx = ResolveContext::new(scan_root, project_root, found.iter().cloned());
    let graph = finalize(build(frontend, &ctx, &found), &Exclusions::default());
    detect_test_coverage(&graph, frontend, &zones, &ctx, extra_tests, options)
}

fn coverage<F: FrontEnd>(
    frontend: &F,
    project_root: &Path,
    scan_root: &Path,
    extra_tests: &[PathBuf],
) -> TestCoverageResult {
    coverage_with(frontend, project_root, scan_root, extra_tests, CoverageOptions::default())
}

fn keys<V>(map: &BTreeMap<PathBuf, V>) -> BTreeSet<PathBuf> {
    map.keys().cloned().collect()
}

#[test]
fn test_direct_import_and_untested_sibling() {
    let users: Vec<String> = (1..11).map(|i| format!("u{i}.py")).collect();
    let mut files = vec![
        ("a.py", logic(25)),
        ("b.py", logic(10)),
        ("u0.py", "import a\nimport b\n".to_string()),
        (
            "tests/test_a.py",
            "from a import f0\n\ndef test_a():\n    assert f0() == 0\n".to_string(),
        ),
    ];
    for name in &users {
        files.push((name.as_str(), "import a\n".to_string()));
    }
    let (_dir, root) = project(&files);

    let result = coverage(&PythonFrontEnd, &root, &root, &[]);

    let a_entry = result.directly_tested.get(&root.join("a.py")).unwrap();
    assert_eq!(a_entry.loc, 50);
    assert_eq!(a_entry.importer_count, 12);
    assert!(a_entry.critical);

    let b_entry = result.untested.get(&root.join("b.py")).unwrap();
    assert_eq!(b_entry.loc, 20);
    assert_eq!(b_entry.importer_count, 1);
    assert!(!b_entry.critical);

    // the one-line importers are too short to score
    assert!(!result.untested.contains_key(&root.join("u0.py")));
    assert_eq!(result.potential, 2);
    assert_eq!(result.tested_count(), 1);
    // round(√50 + √20)
    assert_eq!(result.loc_weighted_potential, 12);
    assert_eq!(
        result.direct_tests.get(&root.join("a.py")),
        Some(&vec![root.join("tests/test_a.py")])
    );

    let quality = result.test_quality.get(&root.join("tests/test_a.py")).unwrap();
    assert_eq!(quality.test_case_count, 1);
    assert_eq!(quality.assertion_count, 1);
    assert_eq!(quality.quality_label, QualityLabel::Adequate);
}

#[test]
fn test_trivial_files_are_not_scored() {
    let (_dir, root) = project(&[
        ("app/__init__.py", String::new()),
        ("app/constants.py", "LIMIT = 10\nNAMES = ['a', 'b']\n".to_string()),
        ("app/logic.py", format!("from app.constants import LIMIT\n{}", logic(15))),
        (
            "tests/test_logic.py",
            "from app.logic import f1\n\ndef test_f1():\n    assert f1() == 1\n".to_string(),
        ),
    ]);
    let result = coverage(&PythonFrontEnd, &root, &root, &[]);

    let logic_py = root.join("app/logic.py");
    assert_eq!(keys(&result.directly_tested), BTreeSet::from([logic_py.clone()]));
    for trivial in ["app/__init__.py", "app/constants.py"] {
        let path = root.join(trivial);
        assert!(!result.transitively_tested.contains_key(&path), "{trivial}");
        assert!(!result.untested.contains_key(&path), "{trivial}");
        assert!(!result.direct_tests.contains_key(&path), "{trivial}");
    }
    assert_eq!(result.potential, 1);
    assert_eq!(result.directly_tested[&logic_py].loc, 31);
    // round(√31)
    assert_eq!(result.loc_weighted_potential, 6);

    let strict = CoverageOptions { min_loc: 40, ..CoverageOptions::default() };
    let result = coverage_with(&PythonFrontEnd, &root, &root, &[], strict);
    assert_eq!(result.potential, 0);
    assert!(result.directly_tested.is_empty());
    assert_eq!(result.loc_weighted_potential, 0);
}

#[test]
fn test_transitive_is_disjoint_from_direct() {
    let (_dir, root) = project(&[
        ("app/__init__.py", String::new()),
        ("app/core.py", format!("from app import util\n{}", logic(5))),
        ("app/util.py", format!("from app import helpers\n{}", logic(5))),
        ("app/helpers.py", logic(5)),
        ("app/orphan.py", logic(5)),
        (
            "tests/test_core.py",
            "from app.core import f0\n\ndef test_run():\n    f0()\n".to_string(),
        ),
    ]);
    let result = coverage(&PythonFrontEnd, &root, &root, &[]);

    let direct = keys(&result.directly_tested);
    let transitive = keys(&result.transitively_tested);
    let untested = keys(&result.untested);

    assert!(direct.contains(&root.join("app/core.py")));
    assert!(transitive.contains(&root.join("app/util.py")));
    assert!(transitive.contains(&root.join("app/helpers.py")));
    assert!(untested.contains(&root.join("app/orphan.py")));
    assert!(direct.is_disjoint(&transitive));
    assert!(direct.is_disjoint(&untested));
    assert!(transitive.is_disjoint(&untested));
    assert_eq!(direct.len() + transitive.len() + untested.len(), result.potential);
    assert_eq!(result.potential, 4);
    assert_eq!(result.tested_count(), 3);

    let quality = result.test_quality.get(&root.join("tests/test_core.py")).unwrap();
    assert_eq!(quality.quality_label, QualityLabel::AssertionFree);
}

#[test]
fn test_naming_convention_without_import() {
    let (_dir, root) = project(&[
        ("pkg/models.py", format!("class User:\n    pass\n{}", logic(5))),
        ("pkg/tests/test_models.py", "def test_user():\n    assert True\n".to_string()),
    ]);
    let result = coverage(&PythonFrontEnd, &root, &root, &[]);
    assert!(result.directly_tested.contains_key(&root.join("pkg/models.py")));
}

#[test]
fn test_barrel_expansion_is_single_hop() {
    let (_dir, root) = project(&[
        ("src/index.ts", "export * from './inner';\nexport * from './feature';\n".to_string()),
        ("src/inner/index.ts", "export * from '../real';\n".to_string()),
        ("src/feature.ts", ts_logic(4)),
        ("src/real.ts", ts_logic(4)),
        (
            "src/index.test.ts",
            "import { f0 } from './index';\nit('works', () => { expect(f0()).toBe(0); });\n".to_string(),
        ),
    ]);
    let result = coverage(&TypeScriptFrontEnd, &root, &root, &[]);

    // barrels carry no logic of their own and are never scored
    assert!(!result.directly_tested.contains_key(&root.join("src/index.ts")));
    assert!(!result.directly_tested.contains_key(&root.join("src/inner/index.ts")));
    assert!(result.directly_tested.contains_key(&root.join("src/feature.ts")));
    assert!(!result.directly_tested.contains_key(&root.join("src/real.ts")));
    assert!(result.transitively_tested.contains_key(&root.join("src/real.ts")));
    assert_eq!(
        result.direct_tests.get(&root.join("src/feature.ts")),
        Some(&vec![root.join("src/index.test.ts")])
    );
    assert_eq!(result.potential, 2);
}

#[test]
fn test_external_tests_use_fuzzy_module_lookup() {
    let (_dir, root) = project(&[
        ("src/app/core.py", format!("def run():\n    return 1\n{}", logic(5))),
        ("src/app/extra.py", format!("def more():\n    return 2\n{}", logic(5))),
        ("src/app/other.py", logic(5)),
        (
            "tests/test_integration.py",
            "from core import run\nfrom app.extra import more\n\ndef test_all():\n    assert run() == 1\n    assert more() == 2\n".to_string(),
        ),
    ]);
    let scan_root = root.join("src");
    let extra = vec![root.join("tests/test_integration.py")];
    let result = coverage(&PythonFrontEnd, &root, &scan_root, &extra);

    assert!(result.directly_tested.contains_key(&root.join("src/app/core.py")));
    assert!(result.directly_tested.contains_key(&root.join("src/app/extra.py")));
    assert!(result.untested.contains_key(&root.join("src/app/other.py")));
    assert!(result.test_quality.contains_key(&root.join("tests/test_integration.py")));
}

#[test]
fn test_no_tests_means_everything_untested() {
    let (_dir, root) = project(&[
        ("a.py", format!("import b\n{}", logic(5))),
        ("b.py", logic(5)),
        ("c.py", "X = 1\n".to_string()),
    ]);
    let result = coverage(&PythonFrontEnd, &root, &root, &[]);
    assert!(result.directly_tested.is_empty());
    assert!(result.transitively_tested.is_empty());
    assert_eq!(keys(&result.untested), BTreeSet::from([root.join("a.py"), root.join("b.py")]));
    assert!(result.test_quality.is_empty());
    assert_eq!(result.potential, 2);
    assert_eq!(result.tested_count(), 0);
    // round(√11 + √10)
    assert_eq!(result.loc_weighted_potential, 6);
}

#[test]
fn test_ts_quality_counts_once_per_line() {
    let button = concat!(
        "import { useState } from 'react';\n",
        "\n",
        "export type Variant = 'primary' | 'ghost';\n",
        "\n",
        "export const Button = ({ label }: { label: string }) => {\n",
        "  const [pressed, setPressed] = useState(false);\n",
        "  const onClick = () => {\n",
        "    setPressed(!pressed);\n",
        "  };\n",
        "  return <button onClick={onClick}>{label}</button>;\n",
        "};\n",
    );
    let (_dir, root) = project(&[
        ("src/Button.tsx", button.to_string()),
        (
            "src/Button.test.tsx",
            concat!(
                "import { Button } from './Button';\n",
                "// expect(commented).toBe(1);\n",
                "test('renders', () => {\n",
                "  expect(screen.getByRole('button')).toBeVisible();\n",
                "  expect(container).toMatchSnapshot();\n",
                "});\n",
            )
            .to_string(),
        ),
    ]);
    let result = coverage(&TypeScriptFrontEnd, &root, &root, &[]);
    let quality = result.test_quality.get(&root.join("src/Button.test.tsx")).unwrap();
    assert_eq!(quality.test_case_count, 1);
    assert_eq!(quality.assertion_count, 2);
    assert_eq!(quality.snapshot_count, 1);
    assert_eq!(quality.quality_label, QualityLabel::Adequate);
    assert!(result.directly_tested.contains_key(&root.join("src/Button.tsx")));
}
