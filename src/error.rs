//! Error types for kiln
//!
//! All modules use `KilnResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kiln operations
pub type KilnResult<T> = Result<T, KilnError>;

/// All errors that can occur in kiln
#[derive(Error, Debug)]
pub enum KilnError {
    // Environment errors
    #[error("git not found on PATH. kiln derives module versions from git history.")]
    GitNotFound,

    #[error("mvn not found on PATH. Install Maven or put it on PATH.")]
    MavenNotFound,

    #[error("Could not determine the home directory for the local repository")]
    HomeDirNotFound,

    #[error("Not a module root: no pom.xml at {0}")]
    ProjectRootInvalid(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    // Descriptor errors
    #[error("Failed to parse descriptor {path}: {reason}")]
    DescriptorParse { path: PathBuf, reason: String },

    #[error("Failed to rewrite descriptor {path}: {reason}")]
    DescriptorRewrite { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command exited with an error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Build failed: {command} (exit code {code})")]
    BuildFailed { command: String, code: i32 },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl KilnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a descriptor parse error
    pub fn descriptor_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DescriptorParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a descriptor rewrite error
    pub fn descriptor_rewrite(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DescriptorRewrite {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::GitNotFound => Some("Install git, or run kiln from a CI image that has it"),
            Self::MavenNotFound => Some("Install Maven 3.x and make sure mvn is on PATH"),
            Self::ProjectRootInvalid(_) => {
                Some("Run kiln from the aggregate module root, or pass -C <dir>")
            }
            Self::InvalidDate { .. } => Some("Example: --stale-before 2026-07-01"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = KilnError::GitNotFound;
        assert!(err.to_string().contains("git not found"));
    }

    #[test]
    fn error_hint() {
        let err = KilnError::MavenNotFound;
        assert_eq!(
            err.hint(),
            Some("Install Maven 3.x and make sure mvn is on PATH")
        );
        assert!(KilnError::User("oops".into()).hint().is_none());
    }

    #[test]
    fn build_failed_carries_command() {
        let err = KilnError::BuildFailed {
            command: "mvn -B install".to_string(),
            code: 1,
        };
        let text = err.to_string();
        assert!(text.contains("mvn -B install"));
        assert!(text.contains("exit code 1"));
    }
}
