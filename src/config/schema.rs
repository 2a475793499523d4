//! Configuration schema
//!
//! Configuration lives in `kiln.toml` at the project root. Every section
//! and field is optional; defaults match the conventional project layout.

use crate::graph::Layout;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which paths play the special module roles
    pub layout: Layout,

    /// Maven invocation settings
    pub maven: MavenConfig,

    /// Local artifact store settings
    pub repository: RepositoryConfig,

    /// Store garbage collection settings
    pub cache: CacheConfig,
}

/// Maven invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    /// Options passed to every Maven invocation
    pub options: Vec<String>,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            options: vec!["-B".to_string()],
        }
    }
}

/// Local artifact store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Store location; defaults to `~/.m2/repository`
    pub path: Option<PathBuf>,
}

/// Store garbage collection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Third-party store files untouched for this many days are stale
    pub stale_days: u32,
}

impl CacheConfig {
    /// The staleness cutoff implied by `stale_days`, measured from now
    pub fn stale_before(&self) -> DateTime<Utc> {
        Utc::now() - Duration::days(i64::from(self.stale_days))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_days: 30 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[layout]"));
        assert!(toml.contains("[cache]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.stale_days, 30);
        assert_eq!(config.layout.site, PathBuf::from("site"));
        assert_eq!(config.maven.options, ["-B"]);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [layout]
            site = "docs"

            [maven]
            options = ["-B", "-Plibrary"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.layout.site, PathBuf::from("docs"));
        assert_eq!(config.layout.themes, PathBuf::from("themes")); // default preserved
        assert_eq!(config.maven.options, ["-B", "-Plibrary"]);
    }

    #[test]
    fn stale_cutoff_is_in_the_past() {
        let cache = CacheConfig { stale_days: 30 };
        let cutoff = cache.stale_before();
        assert!(cutoff < Utc::now());
        assert!(cutoff > Utc::now() - Duration::days(31));
    }
}
