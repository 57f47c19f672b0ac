// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed exclusion pattern {pattern:?}: {reason}")]
    MalformedExclusion { pattern: String, reason: &'static str },

    #[error("Front-end '{frontend}' violates the resolver contract: {violated}")]
    Contract { frontend: String, violated: String },

    #[error("No front-end registered for language '{0}'")]
    UnknownFrontEnd(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Walk error: {0}")]
    Walk(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    #[must_use]
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io { source, path: path.into() }
    }

    #[must_use]
    pub fn contract(frontend: &str, violated: impl Into<String>) -> Self {
        Self::Contract {
            frontend: frontend.to_string(),
            violated: violated.into(),
        }
    }
}

// Allow `?` on std::io::Error by converting to GraphError::Io with unknown path.
impl From<std::io::Error> for GraphError {
    fn from(source: std::io::Error) -> Self {
        GraphError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

// Gracefully convert WalkDir errors
impl From<walkdir::Error> for GraphError {
    fn from(e: walkdir::Error) -> Self {
        GraphError::Walk(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_message_names_frontend_and_violation() {
        let err = GraphError::contract("python", "no file extensions");
        let msg = err.to_string();
        assert!(msg.contains("python"));
        assert!(msg.contains("no file extensions"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = GraphError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "src/a.py",
        );
        assert!(err.to_string().contains("src/a.py"));
    }
}
