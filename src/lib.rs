//! Kiln - incremental build orchestrator for Maven multi-module projects
//!
//! Derives a version for every module from the git history of its inputs,
//! propagates those versions through the descriptors, and asks Maven to
//! build only the modules the local artifact store cannot already serve.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod maven;
pub mod phase;
pub mod repo;
pub mod scm;
pub mod select;
pub mod version;

pub use error::{KilnError, KilnResult};
