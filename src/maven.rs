//! External build tool collaborator
//!
//! Wraps the `mvn` binary behind the `BuildTool` trait. kiln never compiles
//! anything itself: once the build set is known, Maven is invoked with an
//! explicit `-pl` module list and left to order and execute the build. The
//! site module is always built in a separate `verify` invocation.

use crate::artifact::Artifact;
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Abstract build tool interface
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Install every module in the build set except the site, then verify
    /// the site
    async fn install(
        &self,
        build: &[Artifact],
        site: &Artifact,
        skip_tests: bool,
    ) -> KilnResult<()>;

    /// Probe whether a module's declared dependencies resolve against the
    /// local repository. Any failure, including failing to start the tool,
    /// counts as an unresolvable probe.
    async fn resolve_dependencies(&self, artifact: &Artifact) -> bool;
}

/// The `-pl` selector for the install pass: every build coordinate except
/// the site, with the site explicitly excluded. None when the site is the
/// only module building.
fn install_module_list(build: &[Artifact], site: &Artifact) -> Option<String> {
    let others: Vec<String> = build
        .iter()
        .filter(|a| a.id != site.id)
        .map(|a| a.coordinate())
        .collect();
    if others.is_empty() {
        None
    } else {
        Some(format!("{},!{}", others.join(","), site.coordinate()))
    }
}

/// BuildTool implementation using the mvn binary
pub struct MavenCli {
    workdir: PathBuf,
    options: Vec<String>,
}

impl MavenCli {
    pub fn new(workdir: impl Into<PathBuf>, options: Vec<String>) -> Self {
        Self {
            workdir: workdir.into(),
            options,
        }
    }

    /// Run mvn with inherited stdio; the build log streams through
    async fn run(&self, args: &[String]) -> KilnResult<()> {
        let command_line = format!("mvn {}", args.join(" "));
        info!("Running: {}", command_line);

        let status = Command::new("mvn")
            .args(args)
            .current_dir(&self.workdir)
            .status()
            .await
            .map_err(|e| Self::spawn_error(&command_line, e))?;

        if !status.success() {
            return Err(KilnError::BuildFailed {
                command: command_line,
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    fn spawn_error(command: &str, source: io::Error) -> KilnError {
        if source.kind() == io::ErrorKind::NotFound {
            KilnError::MavenNotFound
        } else {
            KilnError::command_failed(command, source)
        }
    }
}

#[async_trait]
impl BuildTool for MavenCli {
    async fn install(
        &self,
        build: &[Artifact],
        site: &Artifact,
        skip_tests: bool,
    ) -> KilnResult<()> {
        let mut options = self.options.clone();
        if skip_tests {
            options.push("-Dmaven.test.skip=true".to_string());
        }

        if let Some(modules) = install_module_list(build, site) {
            let mut args = options.clone();
            args.extend([
                "install".to_string(),
                "-amd".to_string(),
                "-pl".to_string(),
                modules,
            ]);
            self.run(&args).await?;
        }

        let mut args = options;
        args.extend([
            "verify".to_string(),
            "-amd".to_string(),
            "-pl".to_string(),
            site.coordinate(),
        ]);
        self.run(&args).await
    }

    async fn resolve_dependencies(&self, artifact: &Artifact) -> bool {
        let coordinate = artifact.coordinate();
        debug!("Probing dependency resolution for {}", coordinate);

        let mut args = self.options.clone();
        args.extend([
            "dependency:resolve".to_string(),
            "-pl".to_string(),
            coordinate,
        ]);

        Command::new("mvn")
            .args(&args)
            .current_dir(&self.workdir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// BuildTool stub with a fixed probe answer, for unit tests
#[cfg(test)]
pub struct StubBuildTool {
    pub resolves: bool,
}

#[cfg(test)]
#[async_trait]
impl BuildTool for StubBuildTool {
    async fn install(
        &self,
        _build: &[Artifact],
        _site: &Artifact,
        _skip_tests: bool,
    ) -> KilnResult<()> {
        Ok(())
    }

    async fn resolve_dependencies(&self, _artifact: &Artifact) -> bool {
        self.resolves
    }
}
