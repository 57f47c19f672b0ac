// src/graph/imports.rs
use crate::lang::Lang;
use crate::text::line_indent;
use std::fmt;
use std::path::Path;
use tree_sitter::Node;

/// How an import statement loads its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import x`, `from x import y`, `import ... from '...'`, `require('...')`.
    Static,
    /// `export ... from '...'`.
    ReExport,
    /// `importlib.import_module("...")`, `import('...')`. Not an edge.
    Dynamic,
}

/// One import as written in source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// Module spec: `pkg.mod`, `..pkg`, `./x`, `@/lib/y`.
    pub spec: String,
    /// Names after `import` in a Python from-import; empty otherwise.
    pub names: Vec<String>,
    /// 1-based line of the statement.
    pub line: usize,
    /// Statement's first line is indented (function-local import).
    pub deferred: bool,
    pub kind: ImportKind,
}

/// Why a file contributed nothing to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unreadable,
    Unsupported,
    Syntax,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unreadable => "unreadable or not UTF-8",
            Self::Unsupported => "no grammar for extension",
            Self::Syntax => "syntax error",
        };
        f.write_str(text)
    }
}

/// Extracts raw imports from the given file content.
///
/// # Errors
/// Returns `SkipReason::Unsupported` for unknown extensions and
/// `SkipReason::Syntax` when a Python file does not parse cleanly.
pub fn extract(path: &Path, content: &str) -> Result<Vec<RawImport>, SkipReason> {
    match Lang::from_path(path) {
        Some(Lang::Python) => extract_python(content),
        Some(lang) => Ok(extract_typescript(lang, content)),
        None => Err(SkipReason::Unsupported),
    }
}

/// Python imports. A file with any parse error is rejected whole.
///
/// # Errors
/// Returns `SkipReason::Syntax` if the tree contains errors.
pub fn extract_python(source: &str) -> Result<Vec<RawImport>, SkipReason> {
    let tree = Lang::Python.parse(source).ok_or(SkipReason::Syntax)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(SkipReason::Syntax);
    }

    let bytes = source.as_bytes();
    let mut out = Vec::new();
    walk(root, |node| match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                if let Some(spec) = dotted_text(name, bytes) {
                    out.push(raw(source, node, spec, Vec::new(), ImportKind::Static));
                }
            }
            false
        }
        "import_from_statement" => {
            let Some(spec) = node
                .child_by_field_name("module_name")
                .and_then(|m| m.utf8_text(bytes).ok())
                .map(|t| t.split_whitespace().collect::<String>())
            else {
                return false;
            };
            let mut cursor = node.walk();
            let names = node
                .children_by_field_name("name", &mut cursor)
                .filter_map(|n| dotted_text(n, bytes))
                .collect();
            out.push(raw(source, node, spec, names, ImportKind::Static));
            false
        }
        "future_import_statement" => false,
        "call" => {
            if let Some(spec) = importlib_target(node, bytes) {
                out.push(raw(source, node, spec, Vec::new(), ImportKind::Dynamic));
            }
            true
        }
        _ => true,
    });
    Ok(out)
}

/// TypeScript/TSX imports. Tolerates partial parses.
#[must_use]
pub fn extract_typescript(lang: Lang, source: &str) -> Vec<RawImport> {
    let Some(tree) = lang.parse(source) else {
        return Vec::new();
    };
    let bytes = source.as_bytes();
    let mut out = Vec::new();
    walk(tree.root_node(), |node| match node.kind() {
        "import_statement" => {
            let src = node.child_by_field_name("source").or_else(|| require_clause_source(node));
            if let Some(spec) = src.and_then(|s| string_value(s, bytes)) {
                out.push(raw(source, node, spec, Vec::new(), ImportKind::Static));
            }
            false
        }
        "export_statement" => match node.child_by_field_name("source") {
            Some(src) => {
                if let Some(spec) = string_value(src, bytes) {
                    out.push(raw(source, node, spec, Vec::new(), ImportKind::ReExport));
                }
                false
            }
            None => true,
        },
        "call_expression" => {
            if let Some((spec, kind)) = call_target(node, bytes) {
                out.push(raw(source, node, spec, Vec::new(), kind));
            }
            true
        }
        _ => true,
    });
    out
}

/// Pre-order walk without recursion; `visit` returns whether to descend.
fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        if visit(cursor.node()) && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn raw(source: &str, node: Node, spec: String, names: Vec<String>, kind: ImportKind) -> RawImport {
    let row = node.start_position().row;
    RawImport {
        spec,
        names,
        line: row + 1,
        deferred: line_indent(source, row) > 0,
        kind,
    }
}

/// Text of a `dotted_name`, or of the `name` inside an `aliased_import`.
pub(crate) fn dotted_text(node: Node, bytes: &[u8]) -> Option<String> {
    let target = if node.kind() == "aliased_import" {
        node.child_by_field_name("name")?
    } else {
        node
    };
    let text = target.utf8_text(bytes).ok()?;
    Some(text.split_whitespace().collect())
}

/// `importlib.import_module("x")` → `x`.
fn importlib_target(call: Node, bytes: &[u8]) -> Option<String> {
    let func = call.child_by_field_name("function")?;
    if func.kind() != "attribute" {
        return None;
    }
    let object = func.child_by_field_name("object")?.utf8_text(bytes).ok()?;
    let attr = func.child_by_field_name("attribute")?.utf8_text(bytes).ok()?;
    if object != "importlib" || attr != "import_module" {
        return None;
    }
    first_string_arg(call, bytes)
}

/// `require('x')` → static, `import('x')` → dynamic.
fn call_target(call: Node, bytes: &[u8]) -> Option<(String, ImportKind)> {
    let func = call.child_by_field_name("function")?;
    let kind = match func.kind() {
        "import" => ImportKind::Dynamic,
        "identifier" if func.utf8_text(bytes).ok()? == "require" => ImportKind::Static,
        _ => return None,
    };
    Some((first_string_arg(call, bytes)?, kind))
}

fn first_string_arg(call: Node, bytes: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }
    string_value(first, bytes)
}

/// `import x = require('y')`.
fn require_clause_source(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let clause = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "import_require_clause")?;
    clause.child_by_field_name("source")
}

fn string_value(node: Node, bytes: &[u8]) -> Option<String> {
    let text = clean_text(node.utf8_text(bytes).ok()?);
    (!text.is_empty() && !text.contains('{')).then_some(text)
}

fn clean_text(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}
