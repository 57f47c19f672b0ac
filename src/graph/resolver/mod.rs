// src/graph/resolver/mod.rs
//! Import resolution: the per-language [`ImportResolver`] contract plus the
//! path machinery both front-ends share.
//!
//! A resolved target is always a member of the context's known file set, so
//! the builder never creates a node for a file that was not enumerated.

pub mod python;
pub mod registry;
pub mod typescript;

pub use self::python::PythonFrontEnd;
pub use self::registry::{FrontEnd, Registry};
pub use self::typescript::TypeScriptFrontEnd;

use crate::config::ScanConfig;
use crate::graph::imports::{RawImport, SkipReason};
use crate::zones::ZoneRule;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// What a language front-end must provide to build the graph and to let the
/// facade detector inspect file bodies.
pub trait ImportResolver: Send + Sync {
    /// Stable identifier used in reports and config (`python`).
    fn name(&self) -> &'static str;

    /// File extensions without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parses one file's import statements.
    ///
    /// # Errors
    /// Returns the reason the file cannot contribute edges.
    fn extract(&self, path: &Path, source: &str) -> Result<Vec<RawImport>, SkipReason>;

    /// Resolves one import of `file` to zero or more known files.
    fn resolve(&self, ctx: &ResolveContext, file: &Path, import: &RawImport) -> Vec<PathBuf>;

    /// Resolves a single module spec as written in `file`.
    fn resolve_spec(&self, ctx: &ResolveContext, file: &Path, spec: &str) -> Option<PathBuf>;

    /// Alias prefix → project-relative directory.
    fn path_aliases(&self, _config: &ScanConfig) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Zone rules checked before the common ones.
    fn zone_rules(&self) -> &'static [ZoneRule];

    /// Specs re-exported by a file made only of imports/re-exports,
    /// or `None` if the body does anything else.
    fn facade_targets(&self, source: &str) -> Option<Vec<String>>;

    /// File name that makes a directory a package, if the language has one.
    fn package_init(&self) -> Option<&'static str> {
        None
    }
}

/// Read-only resolution state shared by every parse worker.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    scan_root: PathBuf,
    project_root: PathBuf,
    known: HashSet<PathBuf>,
    /// Longest prefix first.
    aliases: Vec<(String, PathBuf)>,
}

impl ResolveContext {
    pub fn new<I>(scan_root: &Path, project_root: &Path, files: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            scan_root: scan_root.to_path_buf(),
            project_root: project_root.to_path_buf(),
            known: files.into_iter().collect(),
            aliases: Vec::new(),
        }
    }

    /// Installs alias prefixes; targets are relative to the project root.
    #[must_use]
    pub fn with_aliases(mut self, aliases: &BTreeMap<String, String>) -> Self {
        let mut list: Vec<(String, PathBuf)> = aliases
            .iter()
            .filter(|(prefix, _)| !prefix.is_empty())
            .map(|(prefix, dir)| (prefix.clone(), self.project_root.join(dir)))
            .collect();
        list.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        self.aliases = list;
        self
    }

    /// Same roots and aliases, different known file set.
    #[must_use]
    pub fn restricted_to<I>(&self, files: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self {
            scan_root: self.scan_root.clone(),
            project_root: self.project_root.clone(),
            known: files.into_iter().collect(),
            aliases: self.aliases.clone(),
        }
    }

    #[must_use]
    pub fn scan_root(&self) -> &Path {
        &self.scan_root
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Scan root then project root, without duplicates.
    #[must_use]
    pub fn roots(&self) -> Vec<&Path> {
        let mut roots = vec![self.scan_root.as_path()];
        if self.project_root != self.scan_root {
            roots.push(self.project_root.as_path());
        }
        roots
    }

    /// The known file a candidate path denotes, if any.
    #[must_use]
    pub fn accept(&self, candidate: &Path) -> Option<PathBuf> {
        let lexical = normalize(candidate);
        if self.known.contains(&lexical) {
            return Some(lexical);
        }
        let canonical = std::fs::canonicalize(&lexical).ok()?;
        self.known.contains(&canonical).then_some(canonical)
    }

    /// First candidate that is a known file.
    pub fn first_known<I>(&self, candidates: I) -> Option<PathBuf>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        candidates.into_iter().find_map(|c| self.accept(&c))
    }

    /// Expands the longest matching alias prefix.
    #[must_use]
    pub fn expand_alias(&self, spec: &str) -> Option<PathBuf> {
        self.aliases.iter().find_map(|(prefix, dir)| {
            let rest = spec.strip_prefix(prefix.as_str())?;
            Some(if rest.is_empty() { dir.clone() } else { dir.join(rest) })
        })
    }
}

/// Lexically resolves `.` and `..` components.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `base` with `suffix` appended to its final component (`a/b` + `.py`).
#[must_use]
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut text = base.as_os_str().to_os_string();
    text.push(suffix);
    PathBuf::from(text)
}
