// src/graph/tsconfig.rs
//! Parser for tsconfig.json / jsconfig.json path mappings.
//!
//! Only the prefix form of `compilerOptions.paths` is kept: `"@/*": ["./src/*"]`
//! becomes `"@/" → "src/"`. The first target of each alias wins.

use crate::text::strip_c_comments;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Files tried in priority order.
pub const CONFIG_FILES: &[&str] = &["tsconfig.json", "tsconfig.app.json", "jsconfig.json"];

/// Aliases used when no config declares `paths`.
pub const FALLBACK_ALIASES: &[(&str, &str)] = &[("@/", "src/"), ("~/", "src/")];

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap_or_else(|_| panic!("Invalid Regex")));

/// Resolved path mapping configuration from tsconfig.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TsConfig {
    pub base_url: Option<String>,
    pub paths: BTreeMap<String, Vec<String>>,
    pub extends: Option<String>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
    extends: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
}

impl TsConfig {
    /// Parses tsconfig text; comments and trailing commas are tolerated.
    #[must_use]
    pub fn parse_content(content: &str) -> Option<Self> {
        let clean = strip_c_comments(content);
        let clean = TRAILING_COMMA_RE.replace_all(&clean, "$1");
        let raw: RawConfig = serde_json::from_str(&clean).ok()?;
        let extends = raw.extends.and_then(|v| v.as_str().map(str::to_string));
        let (base_url, paths) = raw
            .compiler_options
            .map(|o| (o.base_url, o.paths.unwrap_or_default()))
            .unwrap_or_default();
        Some(Self { base_url, paths, extends })
    }

    fn parse_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let parsed = Self::parse_content(&content);
        if parsed.is_none() {
            warn!(path = %path.display(), "unparseable TypeScript config, ignoring");
        }
        parsed
    }

    /// Alias prefix → directory, relative to `config_dir`'s position under
    /// `project_root`. `None` when the config declares no usable `paths`.
    #[must_use]
    pub fn alias_prefixes(&self, config_dir: &Path, project_root: &Path) -> Option<BTreeMap<String, String>> {
        let base_url = self.base_url.as_deref().unwrap_or(".");
        let mut out = BTreeMap::new();
        for (alias, targets) in &self.paths {
            let Some(target) = targets.first() else {
                continue;
            };
            let prefix = alias.strip_suffix('*').unwrap_or(alias);
            let target = target.strip_suffix('*').unwrap_or(target);
            let dir = config_dir.join(base_url).join(target.trim_start_matches("./"));
            out.insert(prefix.to_string(), project_relative(&dir, project_root, target.ends_with('/')));
        }
        (!out.is_empty()).then_some(out)
    }
}

/// Loads alias prefixes for a project, falling back to `@/` and `~/` → `src/`.
#[must_use]
pub fn load_aliases(project_root: &Path) -> BTreeMap<String, String> {
    for name in CONFIG_FILES {
        let path = project_root.join(name);
        if !path.is_file() {
            continue;
        }
        let Some(config) = TsConfig::parse_file(&path) else {
            continue;
        };
        if let Some(aliases) = config.alias_prefixes(project_root, project_root) {
            return aliases;
        }
        if let Some(aliases) = extended_aliases(&config, project_root) {
            return aliases;
        }
        break;
    }
    debug!("no tsconfig paths, using fallback aliases");
    fallback_aliases()
}

/// One level of relative `extends`; package extends (`@tsconfig/...`) are skipped.
fn extended_aliases(config: &TsConfig, project_root: &Path) -> Option<BTreeMap<String, String>> {
    let extends = config.extends.as_deref()?;
    if extends.starts_with('@') {
        return None;
    }
    let parent = crate::graph::resolver::normalize(&project_root.join(extends));
    let parent = if parent.is_file() {
        parent
    } else {
        let mut with_ext = parent.into_os_string();
        with_ext.push(".json");
        PathBuf::from(with_ext)
    };
    let parent_dir = parent.parent()?.to_path_buf();
    TsConfig::parse_file(&parent)?.alias_prefixes(&parent_dir, project_root)
}

#[must_use]
pub fn fallback_aliases() -> BTreeMap<String, String> {
    FALLBACK_ALIASES
        .iter()
        .map(|(p, d)| ((*p).to_string(), (*d).to_string()))
        .collect()
}

fn project_relative(dir: &Path, project_root: &Path, trailing_slash: bool) -> String {
    let dir = crate::graph::resolver::normalize(dir);
    let rel = dir.strip_prefix(project_root).unwrap_or(&dir);
    let mut text = rel.to_string_lossy().replace('\\', "/");
    if trailing_slash && !text.is_empty() && !text.ends_with('/') {
        text.push('/');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tolerates_comments_and_trailing_commas() {
        let input = r#"{ // comment
            "compilerOptions": {
                "baseUrl": ".", /* inline */
                "paths": { "@/*": ["./src/*"], },
            },
        }"#;
        let cfg = TsConfig::parse_content(input);
        assert!(cfg.is_some_and(|c| c.paths.contains_key("@/*")));
    }

    #[test]
    fn test_prefixes_compose_base_url() {
        let cfg = TsConfig::parse_content(
            r##"{"compilerOptions": {"baseUrl": "web", "paths": {"@ui/*": ["components/*", "x/*"], "#lib": ["lib/index.ts"]}}}"##,
        )
        .unwrap_or_default();
        let aliases = cfg.alias_prefixes(Path::new("/p"), Path::new("/p")).unwrap_or_default();
        assert_eq!(aliases.get("@ui/").map(String::as_str), Some("web/components/"));
        assert_eq!(aliases.get("#lib").map(String::as_str), Some("web/lib/index.ts"));
    }

    #[test]
    fn test_no_paths_means_none() {
        let cfg = TsConfig::parse_content(r#"{"compilerOptions": {"strict": true}}"#).unwrap_or_default();
        assert!(cfg.alias_prefixes(Path::new("/p"), Path::new("/p")).is_none());
    }

    #[test]
    fn test_fallback() {
        let f = fallback_aliases();
        assert_eq!(f.get("@/").map(String::as_str), Some("src/"));
        assert_eq!(f.get("~/").map(String::as_str), Some("src/"));
    }
}
