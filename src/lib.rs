pub mod config;
pub mod coverage;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod graph;
pub mod lang;
pub mod text;
pub mod zones;

pub use config::ScanConfig;
pub use engine::{Engine, LanguageReport, ScanReport};
pub use error::{GraphError, Result};
