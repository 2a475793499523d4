//! Source-control collaborator
//!
//! Implements the `Scm` trait by shelling out to git. Version derivation
//! needs two history queries per module (commit count and latest hash for a
//! path set) plus shallow-clone detection, since commit counts are only
//! meaningful against full history.

use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Abstract source-control interface
#[async_trait]
pub trait Scm: Send + Sync {
    /// Number of commits touching any path in the set
    async fn commit_count(&self, paths: &[PathBuf]) -> KilnResult<u64>;

    /// Full hash of the most recent commit touching the set; empty string
    /// when no commit matches
    async fn last_commit(&self, paths: &[PathBuf]) -> KilnResult<String>;

    /// Whether the checkout is a shallow clone
    async fn is_shallow(&self) -> KilnResult<bool>;

    /// Fetch the complete history for a shallow clone
    async fn deepen(&self) -> KilnResult<()>;
}

/// Scm implementation using the git binary
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Run a git query and return trimmed stdout
    async fn query(&self, args: &[&str], paths: &[PathBuf]) -> KilnResult<String> {
        let mut command = Command::new("git");
        command.args(args);
        if !paths.is_empty() {
            command.arg("--");
            command.args(paths);
        }
        command
            .current_dir(&self.workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Executing: git {} -- {:?}", args.join(" "), paths);
        let output = command
            .output()
            .await
            .map_err(|e| Self::spawn_error(args, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KilnError::command_exec(
                format!("git {}", args.join(" ")),
                stderr.trim(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn spawn_error(args: &[&str], source: io::Error) -> KilnError {
        if source.kind() == io::ErrorKind::NotFound {
            KilnError::GitNotFound
        } else {
            KilnError::command_failed(format!("git {}", args.join(" ")), source)
        }
    }
}

#[async_trait]
impl Scm for GitCli {
    async fn commit_count(&self, paths: &[PathBuf]) -> KilnResult<u64> {
        let raw = self.query(&["rev-list", "--count", "HEAD"], paths).await?;
        Ok(raw.parse().unwrap_or(0))
    }

    async fn last_commit(&self, paths: &[PathBuf]) -> KilnResult<String> {
        self.query(&["rev-list", "-1", "HEAD"], paths).await
    }

    async fn is_shallow(&self) -> KilnResult<bool> {
        let git_dir = self.query(&["rev-parse", "--git-dir"], &[]).await?;
        let mut marker = PathBuf::from(git_dir);
        if marker.is_relative() {
            marker = self.workdir.join(marker);
        }
        Ok(marker.join("shallow").exists())
    }

    async fn deepen(&self) -> KilnResult<()> {
        info!("Shallow clone detected, fetching full history");
        let status = Command::new("git")
            .args(["fetch", "--unshallow"])
            .current_dir(&self.workdir)
            .status()
            .await
            .map_err(|e| Self::spawn_error(&["fetch", "--unshallow"], e))?;

        if !status.success() {
            return Err(KilnError::command_exec(
                "git fetch --unshallow",
                format!("exit code {}", status.code().unwrap_or(-1)),
            ));
        }
        Ok(())
    }
}

/// In-memory Scm returning fixed answers, for unit tests
#[cfg(test)]
pub struct StubScm {
    count: u64,
    head: String,
}

#[cfg(test)]
impl StubScm {
    pub fn new(count: u64, head: &str) -> Self {
        Self {
            count,
            head: head.to_string(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Scm for StubScm {
    async fn commit_count(&self, _paths: &[PathBuf]) -> KilnResult<u64> {
        Ok(self.count)
    }

    async fn last_commit(&self, _paths: &[PathBuf]) -> KilnResult<String> {
        Ok(self.head.clone())
    }

    async fn is_shallow(&self) -> KilnResult<bool> {
        Ok(false)
    }

    async fn deepen(&self) -> KilnResult<()> {
        Ok(())
    }
}
