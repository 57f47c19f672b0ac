// src/graph/mod.rs
//! Module dependency graph and the structural detectors that read it.

pub mod builder;
pub mod coupling;
pub mod cycles;
pub mod facade;
pub mod finalize;
pub mod imports;
pub mod model;
pub mod resolver;
pub mod tsconfig;

pub use builder::build;
pub use coupling::{coupling_score, most_coupled, CouplingScore};
pub use cycles::{detect_cycles, Cycle, CycleReport};
pub use facade::{detect_facades, FacadeCandidate, FacadeKind, FacadeReport};
pub use finalize::finalize;
pub use model::{BuildStats, Graph, Node};
pub use resolver::{FrontEnd, ImportResolver, Registry, ResolveContext};
