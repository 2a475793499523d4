//! Module identity and artifact model
//!
//! An `Artifact` is the versioned build-output identity of one module:
//! (group, name, version, packaging). Artifacts are computed fresh on each
//! run; the binary outputs themselves live in the local repository and are
//! written by Maven, never by kiln.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable module identity: Maven groupId + artifactId
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactId {
    pub group: String,
    pub name: String,
}

impl ArtifactId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Path segments for the local repository: dots in the group become
    /// directory separators
    pub fn group_segments(&self) -> Vec<&str> {
        self.group.split('.').collect()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// Artifact packaging as declared in the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    Jar,
    War,
    Pom,
    Other(String),
}

impl Packaging {
    /// Parse a descriptor packaging value; absent defaults to jar
    pub fn from_declared(value: Option<&str>) -> Self {
        match value {
            None | Some("jar") => Self::Jar,
            Some("war") => Self::War,
            Some("pom") => Self::Pom,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jar => write!(f, "jar"),
            Self::War => write!(f, "war"),
            Self::Pom => write!(f, "pom"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Role of a module in the project layout, assigned once during the graph
/// scan and carried through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleRole {
    /// A regular buildable module
    Ordinary,
    /// The shared parent module other modules inherit from
    Parent,
    /// The frontend asset module
    Frontend,
    /// The container module holding the individual themes
    Themes,
    /// One theme beneath the themes container
    Theme,
    /// The site module that aggregates everything
    Site,
    /// The synthetic root used only for version bookkeeping
    Aggregate,
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinary => write!(f, "ordinary"),
            Self::Parent => write!(f, "parent"),
            Self::Frontend => write!(f, "frontend"),
            Self::Themes => write!(f, "themes"),
            Self::Theme => write!(f, "theme"),
            Self::Site => write!(f, "site"),
            Self::Aggregate => write!(f, "aggregate"),
        }
    }
}

/// A module's computed build-output identity for this run
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: ArtifactId,
    pub version: String,
    pub packaging: Packaging,
    /// Directory owning the module descriptor; None for synthetic lookups
    pub source_path: Option<PathBuf>,
    pub role: ModuleRole,
}

impl Artifact {
    /// The `group:name` coordinate Maven's `-pl` flag accepts
    pub fn coordinate(&self) -> String {
        self.id.to_string()
    }

    /// Filename stem shared by all packaged outputs of this artifact
    pub fn file_prefix(&self) -> String {
        format!("{}-{}", self.id.name, self.version)
    }

    /// Whether this artifact can be built in the current checkout
    pub fn in_reactor(&self, reactor: &HashSet<PathBuf>) -> bool {
        match &self.source_path {
            Some(path) => reactor.contains(path),
            None => false,
        }
    }

    /// Module directory relative to the project root, when present
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.version)
    }
}
