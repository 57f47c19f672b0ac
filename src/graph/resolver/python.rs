// src/graph/resolver/python.rs
//! Python front-end: one module per file, packages marked by `__init__.py`.

use super::{with_suffix, ImportResolver, ResolveContext};
use crate::coverage::quality::QualityPatterns;
use crate::coverage::TestConventions;
use crate::graph::imports::{self, dotted_text, RawImport, SkipReason};
use crate::lang::Lang;
use crate::text::strip_hash_comments;
use crate::zones::{Zone, ZoneRule};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const INIT: &str = "__init__.py";

const PY_ZONE_RULES: &[ZoneRule] = &[
    ZoneRule { zone: Zone::Generated, patterns: &["/migrations/", "_pb2.py", "_pb2_grpc.py"] },
    ZoneRule { zone: Zone::Test, patterns: &["test_", "_test.py", "conftest.py", "/factories/"] },
    ZoneRule {
        zone: Zone::Config,
        patterns: &[
            "setup.py", "setup.cfg", "pyproject.toml", "manage.py", "wsgi.py", "asgi.py",
            "settings.py", "config.py",
        ],
    },
    ZoneRule { zone: Zone::Script, patterns: &["__main__.py"] },
];

static PY_QUALITY: LazyLock<QualityPatterns> = LazyLock::new(|| {
    QualityPatterns::compile(
        &[
            r"^\s*assert\s+",
            r"self\.assert\w+\(",
            r"pytest\.raises\(",
            r"\.assert_called",
            r"\.assert_not_called",
        ],
        &[r"@(?:mock\.)?patch", r"Mock\(\)", r"MagicMock\(\)", r"mocker\.", r"monkeypatch\."],
        &[],
        r"^\s*(?:async\s+)?def\s+(test_\w+)\s*\(",
    )
    .unwrap_or_else(|e| panic!("Invalid quality pattern: {e}"))
});

static PY_TEST_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:from\s+([\w.]+)\s+import\s+\(?\s*(\w+)|import\s+([\w.]+))")
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

static PY_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:async\s+)?def\s+").unwrap_or_else(|_| panic!("Invalid Regex"))
});

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonFrontEnd;

impl ImportResolver for PythonFrontEnd {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }

    fn extract(&self, _path: &Path, source: &str) -> Result<Vec<RawImport>, SkipReason> {
        imports::extract_python(source)
    }

    fn resolve(&self, ctx: &ResolveContext, file: &Path, import: &RawImport) -> Vec<PathBuf> {
        let spec = import.spec.as_str();
        if import.names.is_empty() {
            return self.resolve_spec(ctx, file, spec).into_iter().collect();
        }

        if is_dots_only(spec) {
            // Each name may be a sibling submodule or a symbol from the package init.
            let submodules: Vec<PathBuf> = import
                .names
                .iter()
                .filter_map(|name| self.resolve_spec(ctx, file, &format!("{spec}{name}")))
                .collect();
            if submodules.is_empty() {
                return self.resolve_spec(ctx, file, spec).into_iter().collect();
            }
            return submodules;
        }

        // Namespace packages have no init file but their submodules still resolve.
        let mut out: Vec<PathBuf> = self.resolve_spec(ctx, file, spec).into_iter().collect();
        for name in &import.names {
            if let Some(sub) = self.resolve_spec(ctx, file, &format!("{spec}.{name}")) {
                out.push(sub);
            }
        }
        out
    }

    fn resolve_spec(&self, ctx: &ResolveContext, file: &Path, spec: &str) -> Option<PathBuf> {
        if spec.starts_with('.') {
            return resolve_relative(ctx, file, spec);
        }
        let parts: Vec<&str> = spec.split('.').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return None;
        }
        ctx.roots().into_iter().find_map(|root| {
            let mut base = root.to_path_buf();
            base.extend(&parts);
            resolve_base(ctx, &base)
        })
    }

    fn zone_rules(&self) -> &'static [ZoneRule] {
        PY_ZONE_RULES
    }

    fn facade_targets(&self, source: &str) -> Option<Vec<String>> {
        facade_targets(source)
    }

    fn package_init(&self) -> Option<&'static str> {
        Some(INIT)
    }
}

fn is_dots_only(spec: &str) -> bool {
    !spec.is_empty() && spec.chars().all(|c| c == '.')
}

/// One leading dot is the importing file's package; each extra dot goes up.
fn resolve_relative(ctx: &ResolveContext, file: &Path, spec: &str) -> Option<PathBuf> {
    let dots = spec.chars().take_while(|c| *c == '.').count();
    let mut base = file.parent()?.to_path_buf();
    for _ in 1..dots {
        base = base.parent()?.to_path_buf();
    }
    let rest = &spec[dots..];
    if rest.is_empty() {
        return ctx.accept(&base.join(INIT));
    }
    base.extend(rest.split('.').filter(|p| !p.is_empty()));
    resolve_base(ctx, &base)
}

fn resolve_base(ctx: &ResolveContext, base: &Path) -> Option<PathBuf> {
    ctx.first_known([with_suffix(base, ".py"), base.join(INIT)])
}

/// Module-level statements allowed in a facade: imports, a leading
/// docstring, `__all__` and comments. At least one import is required.
fn facade_targets(source: &str) -> Option<Vec<String>> {
    let tree = Lang::Python.parse(source)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }
    let bytes = source.as_bytes();
    let mut targets = Vec::new();
    let mut first = true;
    let mut cursor = root.walk();

    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "comment" => continue,
            "import_statement" => {
                let mut names = child.walk();
                targets.extend(
                    child
                        .children_by_field_name("name", &mut names)
                        .filter_map(|n| dotted_text(n, bytes)),
                );
            }
            "import_from_statement" => {
                let module = child.child_by_field_name("module_name")?;
                targets.push(module.utf8_text(bytes).ok()?.split_whitespace().collect());
            }
            "future_import_statement" => {}
            "expression_statement" if first && is_docstring(child) => {}
            "expression_statement" if is_all_assignment(child, bytes) => {}
            _ => return None,
        }
        first = false;
    }

    (!targets.is_empty()).then_some(targets)
}

fn is_docstring(stmt: tree_sitter::Node) -> bool {
    stmt.named_child_count() == 1
        && stmt
            .named_child(0)
            .is_some_and(|n| matches!(n.kind(), "string" | "concatenated_string"))
}

fn is_all_assignment(stmt: tree_sitter::Node, bytes: &[u8]) -> bool {
    let Some(expr) = stmt.named_child(0) else {
        return false;
    };
    if !matches!(expr.kind(), "assignment" | "augmented_assignment") {
        return false;
    }
    expr.child_by_field_name("left")
        .and_then(|l| l.utf8_text(bytes).ok())
        .is_some_and(|name| name == "__all__")
}

impl TestConventions for PythonFrontEnd {
    fn strip_comments(&self, source: &str) -> String {
        strip_hash_comments(source)
    }

    fn quality_patterns(&self) -> &QualityPatterns {
        &PY_QUALITY
    }

    /// `from a.b import c` yields `a.b` and `a.b.c`; `import a.b` yields `a.b`.
    fn test_import_specs(&self, source: &str) -> Vec<String> {
        let mut specs = Vec::new();
        for caps in PY_TEST_IMPORT_RE.captures_iter(source) {
            if let Some(module) = caps.get(1) {
                let module = module.as_str();
                specs.push(module.to_string());
                if let Some(name) = caps.get(2) {
                    let sep = if module.ends_with('.') { "" } else { "." };
                    specs.push(format!("{module}{sep}{}", name.as_str()));
                }
            } else if let Some(module) = caps.get(3) {
                specs.push(module.as_str().to_string());
            }
        }
        specs
    }

    fn module_key(&self, spec: &str) -> String {
        spec.trim_start_matches('.').to_string()
    }

    /// Any function or method definition.
    fn has_testable_logic(&self, _path: &Path, source: &str) -> bool {
        PY_DEF_RE.is_match(source)
    }

    fn naming_candidates(&self, test_path: &Path) -> Vec<PathBuf> {
        let Some(basename) = test_path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let Some(source_name) = self.strip_test_markers(basename) else {
            return Vec::new();
        };
        sibling_and_parent(test_path, &source_name)
    }

    fn strip_test_markers(&self, basename: &str) -> Option<String> {
        if let Some(rest) = basename.strip_prefix("test_") {
            return (rest.len() > ".py".len()).then(|| rest.to_string());
        }
        let stem = basename.strip_suffix("_test.py")?;
        (!stem.is_empty()).then(|| format!("{stem}.py"))
    }
}

/// `dir/name` then `dir/../name`.
pub(crate) fn sibling_and_parent(test_path: &Path, name: &str) -> Vec<PathBuf> {
    let Some(dir) = test_path.parent() else {
        return Vec::new();
    };
    let mut out = vec![dir.join(name)];
    if let Some(parent) = dir.parent() {
        out.push(parent.join(name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(files: &[&str]) -> ResolveContext {
        ResolveContext::new(
            Path::new("/r"),
            Path::new("/r"),
            files.iter().map(PathBuf::from),
        )
    }

    fn import(spec: &str, names: &[&str]) -> RawImport {
        RawImport {
            spec: spec.to_string(),
            names: names.iter().map(|n| (*n).to_string()).collect(),
            line: 1,
            deferred: false,
            kind: imports::ImportKind::Static,
        }
    }

    #[test]
    fn relative_specs_walk_up() {
        let c = ctx(&["/r/pkg/__init__.py", "/r/pkg/core/models.py", "/r/pkg/api/views.py"]);
        let fe = PythonFrontEnd;
        let views = Path::new("/r/pkg/api/views.py");
        assert_eq!(
            fe.resolve_spec(&c, views, "..core.models"),
            Some(PathBuf::from("/r/pkg/core/models.py"))
        );
        assert_eq!(fe.resolve_spec(&c, views, ".."), Some(PathBuf::from("/r/pkg/__init__.py")));
        assert_eq!(fe.resolve_spec(&c, views, "."), None);
    }

    #[test]
    fn absolute_prefers_scan_root_then_project_root() {
        let c = ResolveContext::new(
            Path::new("/r/src"),
            Path::new("/r"),
            [PathBuf::from("/r/src/app.py"), PathBuf::from("/r/tools/gen.py")],
        );
        let fe = PythonFrontEnd;
        let from = Path::new("/r/src/main.py");
        assert_eq!(fe.resolve_spec(&c, from, "app"), Some(PathBuf::from("/r/src/app.py")));
        assert_eq!(fe.resolve_spec(&c, from, "tools.gen"), Some(PathBuf::from("/r/tools/gen.py")));
        assert_eq!(fe.resolve_spec(&c, from, "os"), None);
    }

    #[test]
    fn dots_only_resolves_each_name() {
        let c = ctx(&["/r/pkg/__init__.py", "/r/pkg/a.py", "/r/pkg/b.py", "/r/pkg/main.py"]);
        let fe = PythonFrontEnd;
        let main = Path::new("/r/pkg/main.py");

        let both = fe.resolve(&c, main, &import(".", &["a", "b"]));
        assert_eq!(both, [PathBuf::from("/r/pkg/a.py"), PathBuf::from("/r/pkg/b.py")]);

        let symbol = fe.resolve(&c, main, &import(".", &["helper"]));
        assert_eq!(symbol, [PathBuf::from("/r/pkg/__init__.py")]);
    }

    #[test]
    fn from_import_adds_submodules() {
        let c = ctx(&["/r/pkg/__init__.py", "/r/pkg/sub.py", "/r/main.py"]);
        let got = PythonFrontEnd.resolve(&c, Path::new("/r/main.py"), &import("pkg", &["sub", "thing"]));
        assert_eq!(got, [PathBuf::from("/r/pkg/__init__.py"), PathBuf::from("/r/pkg/sub.py")]);
    }

    #[test]
    fn facade_bodies() {
        let facade = "\"\"\"Public API.\"\"\"\n# re-exports\nfrom .core import A\nfrom .util import b\n__all__ = [\"A\", \"b\"]\n";
        assert_eq!(facade_targets(facade), Some(vec![".core".to_string(), ".util".to_string()]));
        assert_eq!(facade_targets("from .a import x\nx()\n"), None);
        assert_eq!(facade_targets("\"\"\"Only a docstring.\"\"\"\n"), None);
        assert_eq!(facade_targets("import os\n\"\"\"late string\"\"\"\n"), None);
        assert_eq!(facade_targets("from .a import (\n"), None);
    }

    #[test]
    fn test_naming() {
        let fe = PythonFrontEnd;
        assert_eq!(fe.strip_test_markers("test_models.py").as_deref(), Some("models.py"));
        assert_eq!(fe.strip_test_markers("models_test.py").as_deref(), Some("models.py"));
        assert_eq!(fe.strip_test_markers("conftest.py"), None);
        assert_eq!(
            fe.naming_candidates(Path::new("/r/pkg/tests/test_models.py")),
            [PathBuf::from("/r/pkg/tests/models.py"), PathBuf::from("/r/pkg/models.py")]
        );
    }

    #[test]
    fn test_import_specs_include_imported_names() {
        let specs = PythonFrontEnd.test_import_specs("from app.core import engine\nimport app.util\n");
        assert_eq!(specs, ["app.core", "app.core.engine", "app.util"]);
    }

    #[test]
    fn test_logic_needs_a_def() {
        let fe = PythonFrontEnd;
        let path = Path::new("/r/app/m.py");
        assert!(fe.has_testable_logic(path, "class A:\n    async def run(self):\n        pass\n"));
        assert!(fe.has_testable_logic(path, "def f():\n    return 1\n"));
        assert!(!fe.has_testable_logic(path, "LIMIT = 10\nNAMES = ['a', 'b']\n"));
        assert!(!fe.has_testable_logic(path, "from .core import undefined_name\n"));
    }
}
