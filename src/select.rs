//! Build selection
//!
//! Splits the versioned artifacts into the set that must be built and the
//! set already served by the local repository. Only modules in the reactor
//! are eligible for the build set; a module on disk but not declared in the
//! root descriptor is reported but never scheduled.

use crate::artifact::Artifact;
use crate::repo::LocalRepo;
use std::collections::HashSet;
use std::path::PathBuf;

/// Outcome of the cache probe over all planned artifacts
#[derive(Debug)]
pub struct Partition {
    /// Uncached reactor members, in plan order
    pub build: Vec<Artifact>,
    /// Everything else: cache hits plus modules outside the reactor
    pub cached: Vec<Artifact>,
}

impl Partition {
    pub fn nothing_to_do(&self) -> bool {
        self.build.is_empty()
    }
}

/// Probe the store for every artifact and partition them. The probe runs
/// (and logs its verdict) for each artifact, reactor member or not.
pub fn partition(repo: &LocalRepo, all: Vec<Artifact>, reactor: &HashSet<PathBuf>) -> Partition {
    let mut build = Vec::new();
    let mut cached = Vec::new();
    for artifact in all {
        let hit = repo.is_cached(&artifact);
        if !hit && artifact.in_reactor(reactor) {
            build.push(artifact);
        } else {
            cached.push(artifact);
        }
    }
    Partition { build, cached }
}

/// Every reactor member, cached or not. This is the fallback build set when
/// the dependency resolve check finds the store lying about a cache hit.
pub fn reactor_members(all: &[Artifact], reactor: &HashSet<PathBuf>) -> Vec<Artifact> {
    all.iter()
        .filter(|artifact| artifact.in_reactor(reactor))
        .cloned()
        .collect()
}
