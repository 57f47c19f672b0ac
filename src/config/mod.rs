// src/config/mod.rs
//! Scan configuration.
//!
//! Everything that used to be process-wide state (exclusions, alias maps,
//! thresholds) lives on [`ScanConfig`] and is passed explicitly into the
//! builder, the finalizer and every detector.

pub mod types;

pub use self::types::{CoverageSection, FacadeSection, GraphSection, SlopGraphToml, TsSection};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::coverage::CoverageOptions;
use crate::error::{GraphError, Result};
use crate::zones::Zone;

/// Name of the optional per-project config file.
pub const CONFIG_FILE: &str = "slopgraph.toml";

/// Validated set of substring exclusion patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    patterns: Vec<String>,
}

impl Exclusions {
    /// Builds an exclusion set, rejecting patterns that would match every path.
    ///
    /// # Errors
    /// Returns `GraphError::MalformedExclusion` for blank patterns or patterns
    /// made only of separators/dots.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for raw in patterns {
            let pattern: String = raw.into();
            validate_pattern(&pattern)?;
            if !out.contains(&pattern) {
                out.push(pattern);
            }
        }
        out.sort();
        Ok(Self { patterns: out })
    }

    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.patterns.iter().any(|p| text.contains(p.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(GraphError::MalformedExclusion {
            pattern: pattern.to_string(),
            reason: "blank pattern matches every path",
        });
    }
    if pattern.chars().all(|c| matches!(c, '/' | '\\' | '.')) {
        return Err(GraphError::MalformedExclusion {
            pattern: pattern.to_string(),
            reason: "separator-only pattern matches every path",
        });
    }
    Ok(())
}

/// Runtime configuration for one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub project_root: PathBuf,
    pub exclusions: Exclusions,
    pub skip_deferred: bool,
    pub prune_dirs: Vec<String>,
    pub facade_max_importers: usize,
    pub test_roots: Vec<PathBuf>,
    pub critical_importers: usize,
    pub min_loc: usize,
    pub ts_aliases: BTreeMap<String, String>,
    pub zone_overrides: BTreeMap<String, Zone>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_toml(PathBuf::from("."), SlopGraphToml::default())
    }
}

impl ScanConfig {
    /// Default configuration rooted at `project_root`.
    #[must_use]
    pub fn for_root(project_root: &Path) -> Self {
        Self::from_toml(project_root.to_path_buf(), SlopGraphToml::default())
    }

    /// Loads `slopgraph.toml` from the project root when present.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read, parsed or validated.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::for_root(project_root));
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(project_root, &content)
            .with_context(|| format!("loading {}", path.display()))
    }

    /// Parses config text for the given project root and validates it.
    ///
    /// # Errors
    /// Returns error on malformed TOML or invalid values.
    pub fn parse(project_root: &Path, content: &str) -> Result<Self> {
        let raw: SlopGraphToml = toml::from_str(content)?;
        let exclusions = Exclusions::new(raw.graph.exclude.iter().cloned())?;
        let mut config = Self::from_toml(project_root.to_path_buf(), raw);
        config.exclusions = exclusions;
        config.validate()?;
        Ok(config)
    }

    fn from_toml(project_root: PathBuf, raw: SlopGraphToml) -> Self {
        Self {
            project_root,
            exclusions: Exclusions::default(),
            skip_deferred: raw.graph.skip_deferred,
            prune_dirs: raw.graph.prune_dirs,
            facade_max_importers: raw.facade.max_importers,
            test_roots: raw.coverage.test_roots.into_iter().map(PathBuf::from).collect(),
            critical_importers: raw.coverage.critical_importers,
            min_loc: raw.coverage.min_loc,
            ts_aliases: raw.typescript.aliases,
            zone_overrides: raw.zones,
        }
    }

    /// Replaces the exclusion list.
    ///
    /// # Errors
    /// Returns error if any pattern is malformed.
    pub fn with_exclusions<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = Exclusions::new(patterns)?;
        Ok(self)
    }

    /// Validates cross-field constraints.
    ///
    /// # Errors
    /// Returns `GraphError::Config` when a value cannot be honoured.
    pub fn validate(&self) -> Result<()> {
        if self.critical_importers == 0 {
            return Err(GraphError::Config(
                "coverage.critical_importers must be at least 1".into(),
            ));
        }
        if let Some(bad) = self.ts_aliases.keys().find(|k| k.is_empty()) {
            return Err(GraphError::Config(format!(
                "typescript alias prefix {bad:?} is empty"
            )));
        }
        for pattern in self.exclusions.patterns() {
            validate_pattern(pattern)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn coverage_options(&self) -> CoverageOptions {
        CoverageOptions {
            critical_importers: self.critical_importers,
            min_loc: self.min_loc,
        }
    }

    /// Path relative to the project root, with forward slashes.
    #[must_use]
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.project_root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_exclusion_is_rejected() {
        assert!(matches!(
            Exclusions::new(["  "]),
            Err(GraphError::MalformedExclusion { .. })
        ));
        assert!(Exclusions::new(["/"]).is_err());
        assert!(Exclusions::new(["legacy/"]).is_ok());
    }

    #[test]
    fn exclusions_match_substrings() {
        let ex = Exclusions::new(["legacy/", "_pb2.py"]).unwrap_or_default();
        assert!(ex.is_excluded(Path::new("/repo/legacy/a.py")));
        assert!(ex.is_excluded(Path::new("/repo/api_pb2.py")));
        assert!(!ex.is_excluded(Path::new("/repo/src/a.py")));
    }

    #[test]
    fn parse_reads_sections() {
        let toml = r##"
[graph]
exclude = ["legacy/"]
skip_deferred = false

[facade]
max_importers = 4

[coverage]
min_loc = 25

[typescript]
aliases = { "#/" = "lib/" }

[zones]
"src/gen.py" = "generated"
"##;
        let cfg = ScanConfig::parse(Path::new("/repo"), toml).unwrap_or_default();
        assert!(!cfg.skip_deferred);
        assert_eq!(cfg.facade_max_importers, 4);
        assert_eq!(cfg.coverage_options().min_loc, 25);
        assert_eq!(cfg.coverage_options().critical_importers, 10);
        assert_eq!(cfg.exclusions.patterns(), ["legacy/".to_string()]);
        assert_eq!(cfg.ts_aliases.get("#/").map(String::as_str), Some("lib/"));
        assert_eq!(cfg.zone_overrides.get("src/gen.py"), Some(&Zone::Generated));
    }

    #[test]
    fn parse_rejects_bad_exclusion() {
        let toml = "[graph]\nexclude = [\"\"]\n";
        assert!(ScanConfig::parse(Path::new("/repo"), toml).is_err());
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ScanConfig::default();
        assert!(cfg.skip_deferred);
        assert_eq!(cfg.facade_max_importers, 2);
        assert_eq!(cfg.critical_importers, 10);
        assert_eq!(cfg.coverage_options().min_loc, 10);
        assert!(cfg.prune_dirs.iter().any(|d| d == "node_modules"));
    }
}
