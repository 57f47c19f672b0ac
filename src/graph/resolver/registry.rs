// src/graph/resolver/registry.rs
//! Static table of language front-ends, validated before any file is read.

use super::{ImportResolver, PythonFrontEnd, TypeScriptFrontEnd};
use crate::coverage::TestConventions;
use crate::error::{GraphError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A complete language front-end: graph resolution plus test conventions.
pub trait FrontEnd: ImportResolver + TestConventions {}

impl<T: ImportResolver + TestConventions> FrontEnd for T {}

type Factory = fn() -> Box<dyn FrontEnd>;

const BUILTIN: &[Factory] = &[python, typescript];

fn python() -> Box<dyn FrontEnd> {
    Box::new(PythonFrontEnd)
}

fn typescript() -> Box<dyn FrontEnd> {
    Box::new(TypeScriptFrontEnd)
}

pub struct Registry {
    frontends: Vec<Box<dyn FrontEnd>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Registry {
    /// Python and TypeScript, in that order.
    #[must_use]
    pub fn builtin() -> Self {
        Self { frontends: BUILTIN.iter().map(|make| make()).collect() }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { frontends: Vec::new() }
    }

    pub fn register(&mut self, frontend: Box<dyn FrontEnd>) {
        self.frontends.push(frontend);
    }

    /// Checks every front-end against the resolver contract.
    ///
    /// # Errors
    /// Returns `GraphError::Contract` naming the first violation found.
    pub fn validate(&self) -> Result<()> {
        let mut names: BTreeSet<&str> = BTreeSet::new();
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();

        for fe in &self.frontends {
            let name = fe.name();
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
                return Err(GraphError::contract(name, "name must be non-empty lowercase ASCII"));
            }
            if !names.insert(name) {
                return Err(GraphError::contract(name, "name registered twice"));
            }
            if fe.extensions().is_empty() {
                return Err(GraphError::contract(name, "no file extensions"));
            }
            for &ext in fe.extensions() {
                if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(GraphError::contract(name, format!("malformed extension {ext:?}")));
                }
                if let Some(other) = owners.insert(ext, name) {
                    return Err(GraphError::contract(
                        name,
                        format!("extension {ext:?} already claimed by '{other}'"),
                    ));
                }
            }
            if fe.zone_rules().iter().any(|r| r.patterns.iter().any(|p| p.is_empty())) {
                return Err(GraphError::contract(name, "empty zone pattern"));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn FrontEnd> {
        self.frontends.iter().map(|fe| fe.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.frontends.iter().map(|fe| fe.name())
    }

    /// # Errors
    /// Returns `GraphError::UnknownFrontEnd` if no front-end has that name.
    pub fn get(&self, name: &str) -> Result<&dyn FrontEnd> {
        self.iter()
            .find(|fe| fe.name() == name)
            .ok_or_else(|| GraphError::UnknownFrontEnd(name.to_string()))
    }

    /// Front-end owning the file's extension.
    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<&dyn FrontEnd> {
        let ext = path.extension()?.to_str()?;
        self.iter().find(|fe| fe.extensions().iter().any(|e| *e == ext))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frontends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frontends.is_empty()
    }
}
