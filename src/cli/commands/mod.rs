//! CLI command implementations

pub mod build;
pub mod gc;
pub mod status;

pub use build::execute as build;
pub use gc::execute as gc;
pub use status::execute as status;

use crate::config::Config;
use crate::error::KilnResult;
use crate::maven::MavenCli;
use crate::repo::LocalRepo;
use crate::scm::GitCli;
use std::path::PathBuf;

/// Resolved invocation context shared by every command: the validated
/// project root, the loaded configuration, and the store override.
pub struct CommandContext {
    pub root: PathBuf,
    pub config: Config,
    pub repository: Option<PathBuf>,
}

impl CommandContext {
    pub fn scm(&self) -> GitCli {
        GitCli::new(&self.root)
    }

    /// Maven handle, with the command line overriding configured options
    pub fn maven(&self, options: Option<Vec<String>>) -> MavenCli {
        let options = options.unwrap_or_else(|| self.config.maven.options.clone());
        MavenCli::new(&self.root, options)
    }

    /// The local store: the --repository flag wins over kiln.toml, which
    /// wins over ~/.m2/repository
    pub fn repo(&self) -> KilnResult<LocalRepo> {
        if let Some(path) = &self.repository {
            return Ok(LocalRepo::at(path.clone()));
        }
        if let Some(path) = &self.config.repository.path {
            return Ok(LocalRepo::at(path.clone()));
        }
        LocalRepo::default_location()
    }
}
