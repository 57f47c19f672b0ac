// src/graph/resolver/typescript.rs
//! TypeScript front-end: ES modules, relative and alias specifiers,
//! extension and `index` probing.

use super::python::sibling_and_parent;
use super::{normalize, with_suffix, ImportResolver, ResolveContext};
use crate::config::ScanConfig;
use crate::coverage::quality::QualityPatterns;
use crate::coverage::TestConventions;
use crate::graph::imports::{self, RawImport, SkipReason};
use crate::graph::tsconfig;
use crate::lang::Lang;
use crate::text::strip_c_comments;
use crate::zones::{Zone, ZoneRule};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const TS_ZONE_RULES: &[ZoneRule] = &[
    ZoneRule { zone: Zone::Generated, patterns: &[".d.ts", "/migrations/"] },
    ZoneRule {
        zone: Zone::Test,
        patterns: &["/__tests__/", ".test.", ".spec.", ".stories.", "/__mocks__/", "setupTests."],
    },
    ZoneRule {
        zone: Zone::Config,
        patterns: &[
            "vite.config", "tailwind.config", "postcss.config", "tsconfig", "eslint", "prettier",
            "jest.config", "vitest.config", "next.config", "webpack.config",
        ],
    },
];

const BARRELS: &[&str] = &["index.ts", "index.tsx"];

static TS_QUALITY: LazyLock<QualityPatterns> = LazyLock::new(|| {
    QualityPatterns::compile(
        &[
            r"expect\(",
            r"assert\.",
            r"\.should\.",
            r"\b(?:getBy|findBy|getAllBy|findAllBy)\w+\(",
            r"\bwaitFor\(",
            r"\.toBeInTheDocument\(",
            r"\.toBeVisible\(",
            r"\.toHaveTextContent\(",
            r"\.toHaveAttribute\(",
        ],
        &[r"jest\.mock\(", r"jest\.spyOn\(", r"vi\.mock\(", r"vi\.spyOn\(", r"sinon\."],
        &[r"toMatchSnapshot", r"toMatchInlineSnapshot"],
        r#"\b(?:it|test)\s*\(\s*['"`]"#,
    )
    .unwrap_or_else(|e| panic!("Invalid quality pattern: {e}"))
});

static REEXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"export\s+(?:type\s+)?(?:\{[^}]*\}|\*(?:\s+as\s+[\w$]+)?)\s+from\s+['"]([^'"]+)['"]"#)
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

static TEST_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:(?:from|import)\s+|require\(\s*)['"]([^'"]+)['"]"#)
        .unwrap_or_else(|_| panic!("Invalid Regex"))
});

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptFrontEnd;

impl ImportResolver for TypeScriptFrontEnd {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx"]
    }

    fn extract(&self, path: &Path, source: &str) -> Result<Vec<RawImport>, SkipReason> {
        let lang = Lang::from_path(path).ok_or(SkipReason::Unsupported)?;
        Ok(imports::extract_typescript(lang, source))
    }

    fn resolve(&self, ctx: &ResolveContext, file: &Path, import: &RawImport) -> Vec<PathBuf> {
        self.resolve_spec(ctx, file, &import.spec).into_iter().collect()
    }

    /// Relative specs resolve against the importing file, everything else
    /// must match an alias; bare package names are external.
    fn resolve_spec(&self, ctx: &ResolveContext, file: &Path, spec: &str) -> Option<PathBuf> {
        let target = if spec.starts_with('.') {
            file.parent()?.join(spec)
        } else {
            ctx.expand_alias(spec)?
        };
        ctx.first_known(candidates(&normalize(&target)))
    }

    fn path_aliases(&self, config: &ScanConfig) -> BTreeMap<String, String> {
        let mut aliases = tsconfig::load_aliases(&config.project_root);
        aliases.extend(config.ts_aliases.clone());
        aliases
    }

    fn zone_rules(&self) -> &'static [ZoneRule] {
        TS_ZONE_RULES
    }

    fn facade_targets(&self, source: &str) -> Option<Vec<String>> {
        facade_targets(source)
    }
}

/// Probe order for a specifier target.
fn candidates(target: &Path) -> Vec<PathBuf> {
    let ext = target.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "ts" | "tsx" => vec![target.to_path_buf()],
        "js" | "mjs" | "cjs" => {
            // ESM sources import `./x.js` while the file on disk is `x.ts`.
            let stem = target.with_extension("");
            vec![
                with_suffix(&stem, ".ts"),
                with_suffix(&stem, ".tsx"),
                stem.join("index.ts"),
                stem.join("index.tsx"),
                target.to_path_buf(),
            ]
        }
        _ => vec![
            target.to_path_buf(),
            with_suffix(target, ".ts"),
            with_suffix(target, ".tsx"),
            target.join("index.ts"),
            target.join("index.tsx"),
        ],
    }
}

/// Every statement must be `export ... from '...'`.
fn facade_targets(source: &str) -> Option<Vec<String>> {
    let stripped = strip_c_comments(source);
    let targets: Vec<String> = REEXPORT_RE
        .captures_iter(&stripped)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    if targets.is_empty() {
        return None;
    }
    let rest = REEXPORT_RE.replace_all(&stripped, "");
    rest.chars()
        .all(|c| c.is_whitespace() || c == ';')
        .then_some(targets)
}

/// False for declaration files and for files made only of imports,
/// re-exports and type declarations. Unparseable files count as logic.
fn has_runtime_logic(path: &Path, source: &str) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name.ends_with(".d.ts") {
        return false;
    }
    let Some(tree) = Lang::from_path(path).and_then(|lang| lang.parse(source)) else {
        return true;
    };
    let root = tree.root_node();
    let mut cursor = root.walk();
    let has_logic = root.named_children(&mut cursor).any(|child| !is_type_or_reexport(child));
    has_logic
}

fn is_type_or_reexport(stmt: tree_sitter::Node) -> bool {
    match stmt.kind() {
        "comment" | "import_statement" | "interface_declaration" | "type_alias_declaration" => true,
        "export_statement" => match stmt.child_by_field_name("declaration") {
            Some(decl) => matches!(decl.kind(), "interface_declaration" | "type_alias_declaration"),
            // `export { a } from './a'`, `export * from`, `export { a }`
            None => stmt.child_by_field_name("value").is_none(),
        },
        _ => false,
    }
}

impl TestConventions for TypeScriptFrontEnd {
    fn strip_comments(&self, source: &str) -> String {
        strip_c_comments(source)
    }

    fn quality_patterns(&self) -> &QualityPatterns {
        &TS_QUALITY
    }

    fn test_import_specs(&self, source: &str) -> Vec<String> {
        TEST_IMPORT_RE
            .captures_iter(source)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    fn has_testable_logic(&self, path: &Path, source: &str) -> bool {
        has_runtime_logic(path, source)
    }

    /// `./utils/format` → `utils.format`.
    fn module_key(&self, spec: &str) -> String {
        spec.trim_start_matches(['.', '/']).replace('/', ".")
    }

    fn naming_candidates(&self, test_path: &Path) -> Vec<PathBuf> {
        let Some(basename) = test_path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let mut out = self
            .strip_test_markers(basename)
            .map(|source| sibling_and_parent(test_path, &source))
            .unwrap_or_default();

        let dir = test_path.parent();
        if dir.and_then(Path::file_name).is_some_and(|d| d == "__tests__") {
            if let Some(parent) = dir.and_then(Path::parent) {
                out.push(parent.join(basename));
            }
        }
        out
    }

    fn strip_test_markers(&self, basename: &str) -> Option<String> {
        [".test.", ".spec."]
            .iter()
            .find(|m| basename.contains(*m))
            .map(|m| basename.replacen(m, ".", 1))
    }

    fn barrel_basenames(&self) -> &'static [&'static str] {
        BARRELS
    }

    fn reexport_specs(&self, source: &str) -> Vec<String> {
        let stripped = strip_c_comments(source);
        REEXPORT_RE
            .captures_iter(&stripped)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(files: &[&str]) -> ResolveContext {
        let mut aliases = BTreeMap::new();
        aliases.insert("@/".to_string(), "src/".to_string());
        ResolveContext::new(Path::new("/p"), Path::new("/p"), files.iter().map(PathBuf::from))
            .with_aliases(&aliases)
    }

    #[test]
    fn relative_and_index_probing() {
        let c = ctx(&["/p/src/a.ts", "/p/src/ui/index.tsx", "/p/src/ui/button.tsx"]);
        let fe = TypeScriptFrontEnd;
        let from = Path::new("/p/src/app/main.ts");
        assert_eq!(fe.resolve_spec(&c, from, "../a"), Some(PathBuf::from("/p/src/a.ts")));
        assert_eq!(fe.resolve_spec(&c, from, "../ui"), Some(PathBuf::from("/p/src/ui/index.tsx")));
        assert_eq!(fe.resolve_spec(&c, from, "@/ui/button"), Some(PathBuf::from("/p/src/ui/button.tsx")));
        assert_eq!(fe.resolve_spec(&c, from, "react"), None);
    }

    #[test]
    fn js_specifiers_map_to_ts_sources() {
        let c = ctx(&["/p/src/util.ts", "/p/src/lib/index.ts"]);
        let fe = TypeScriptFrontEnd;
        let from = Path::new("/p/src/main.ts");
        assert_eq!(fe.resolve_spec(&c, from, "./util.js"), Some(PathBuf::from("/p/src/util.ts")));
        assert_eq!(fe.resolve_spec(&c, from, "./lib.mjs"), Some(PathBuf::from("/p/src/lib/index.ts")));
    }

    #[test]
    fn facade_lines() {
        let barrel = "// public surface\nexport * from './x';\nexport { Y } from './y';\nexport type { Z } from \"./z\";\n";
        assert_eq!(
            facade_targets(barrel),
            Some(vec!["./x".to_string(), "./y".to_string(), "./z".to_string()])
        );
        assert!(facade_targets("export * from './x'; export { Y } from './y';").is_some());
        assert!(facade_targets("export {\n  A,\n  B,\n} from './ab';\n").is_some());
        assert_eq!(facade_targets("export * from './x';\nexport const n = 1;\n"), None);
        assert_eq!(facade_targets("import { a } from './a';\nexport { a };\n"), None);
        assert_eq!(facade_targets("// nothing here\n"), None);
    }

    #[test]
    fn test_naming() {
        let fe = TypeScriptFrontEnd;
        assert_eq!(fe.strip_test_markers("Button.test.tsx").as_deref(), Some("Button.tsx"));
        assert_eq!(fe.strip_test_markers("api.spec.ts").as_deref(), Some("api.ts"));
        assert_eq!(fe.strip_test_markers("api.ts"), None);
        assert_eq!(
            fe.naming_candidates(Path::new("/p/src/__tests__/format.ts")),
            [PathBuf::from("/p/src/format.ts")]
        );
        assert_eq!(fe.module_key("./utils/format"), "utils.format");
    }

    #[test]
    fn test_imports_include_require() {
        let specs = TypeScriptFrontEnd
            .test_import_specs("import { a } from '../src/a';\nconst b = require(\"./b\");\n");
        assert_eq!(specs, ["../src/a", "./b"]);
    }

    #[test]
    fn test_types_and_barrels_hold_no_logic() {
        let fe = TypeScriptFrontEnd;
        let ts = Path::new("/p/src/model.ts");
        let types = "import { Id } from './id';\n// shapes\nexport interface User { id: Id }\nexport type Role = 'a' | 'b';\ntype Local = string;\n";
        assert!(!fe.has_testable_logic(ts, types));
        assert!(!fe.has_testable_logic(Path::new("/p/src/index.ts"), "export * from './a';\nexport { b } from './b';\n"));
        assert!(!fe.has_testable_logic(Path::new("/p/src/env.d.ts"), "export function f(): void;\n"));
        assert!(fe.has_testable_logic(ts, "export type Role = 'a';\nexport const roles: Role[] = ['a'];\n"));
        assert!(fe.has_testable_logic(ts, "export default function main() { return 1; }\n"));
        assert!(fe.has_testable_logic(Path::new("/p/src/App.tsx"), "export const App = () => <div />;\n"));
    }
}
