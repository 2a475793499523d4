//! Module descriptor (pom.xml) access
//!
//! Two halves with different tools for different jobs:
//!
//! - `pom` deserializes the handful of fields kiln queries (identity,
//!   version, packaging, sub-module list) with serde.
//! - `rewrite` streams a pom event-by-event to write computed versions
//!   back, preserving the untouched bytes of the file exactly.
//!
//! kiln never models the full POM schema; everything outside these two
//! paths is opaque text that passes through rewrites unchanged.

pub mod pom;
pub mod rewrite;

pub use pom::Pom;
pub use rewrite::propagate_versions;
