// src/zones.rs
//! Zone classification: what a file is *for* (production, test, config...).
//!
//! The coverage mapper only needs the [`ZoneClassifier`] predicate. [`ZoneMap`]
//! is the default implementation: ordered path-pattern rules, first match
//! wins, with per-path overrides checked before any rule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File intent zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Production,
    Test,
    Config,
    Generated,
    Script,
    Vendor,
}

impl Zone {
    /// Production and script files are the ones coverage is measured for.
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production | Self::Script)
    }
}

/// A zone plus the path patterns that select it.
///
/// Pattern shapes:
/// - `/dir/`   substring of the slash-padded relative path
/// - `.ext`    contained in the basename (`.d.ts`, `.test.`)
/// - `prefix_` basename starts with
/// - `_suffix` basename ends with
/// - `name.py` exact basename
/// - anything else: substring of the relative path
#[derive(Debug, Clone, Copy)]
pub struct ZoneRule {
    pub zone: Zone,
    pub patterns: &'static [&'static str],
}

pub const COMMON_ZONE_RULES: &[ZoneRule] = &[
    ZoneRule { zone: Zone::Vendor, patterns: &["/vendor/", "/third_party/", "/vendored/"] },
    ZoneRule { zone: Zone::Generated, patterns: &["/generated/", "/__generated__/"] },
    ZoneRule { zone: Zone::Test, patterns: &["/tests/", "/test/", "/fixtures/"] },
    ZoneRule { zone: Zone::Script, patterns: &["/scripts/", "/bin/"] },
];

/// Anything that can answer "which zone is this file in".
pub trait ZoneClassifier: Sync {
    fn zone_of(&self, path: &Path) -> Zone;
}

#[must_use]
pub fn match_pattern(rel_path: &str, pattern: &str) -> bool {
    let basename = rel_path.rsplit('/').next().unwrap_or(rel_path);

    if pattern.len() > 1 && pattern.starts_with('/') && pattern.ends_with('/') {
        return format!("/{rel_path}/").contains(pattern);
    }
    if pattern.starts_with('.') {
        return basename.contains(pattern);
    }
    if pattern.ends_with('_') {
        return basename.starts_with(pattern);
    }
    if pattern.starts_with('_') {
        return basename.ends_with(pattern);
    }
    if !pattern.contains('/') && has_short_extension(pattern) {
        return basename == pattern;
    }
    rel_path.contains(pattern)
}

fn has_short_extension(pattern: &str) -> bool {
    pattern.rsplit_once('.').is_some_and(|(_, ext)| {
        !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
    })
}

/// Classifies a project-relative path. Overrides win over rules; the first
/// matching rule wins over later ones; unmatched paths are production.
#[must_use]
pub fn classify(rel_path: &str, rules: &[ZoneRule], overrides: &BTreeMap<String, Zone>) -> Zone {
    if let Some(zone) = overrides.get(rel_path) {
        return *zone;
    }
    rules
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| match_pattern(rel_path, p)))
        .map_or(Zone::Production, |rule| rule.zone)
}

/// Cached zone classification for one scan's file set.
#[derive(Debug, Clone, Default)]
pub struct ZoneMap {
    map: BTreeMap<PathBuf, Zone>,
}

impl ZoneMap {
    /// Classifies `files` using language rules followed by the common rules.
    /// `relative` converts an absolute path to the form patterns match against.
    pub fn build<F>(
        files: &[PathBuf],
        lang_rules: &[ZoneRule],
        overrides: &BTreeMap<String, Zone>,
        relative: F,
    ) -> Self
    where
        F: Fn(&Path) -> String,
    {
        let rules: Vec<ZoneRule> = lang_rules.iter().chain(COMMON_ZONE_RULES).copied().collect();
        let map = files
            .iter()
            .map(|f| (f.clone(), classify(&relative(f), &rules, overrides)))
            .collect();
        Self { map }
    }

    /// Builds a map from explicit assignments.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, Zone)>,
    {
        Self { map: pairs.into_iter().collect() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl ZoneClassifier for ZoneMap {
    fn zone_of(&self, path: &Path) -> Zone {
        self.map.get(path).copied().unwrap_or(Zone::Production)
    }
}
