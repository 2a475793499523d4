//! CLI argument definitions using clap derive

use crate::error::KilnError;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Kiln - incremental build orchestrator for Maven multi-module projects
///
/// Derives a version for every module from the git history of its inputs,
/// rewrites the descriptors, and asks Maven to build only the modules the
/// local repository cannot already serve.
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub project: Option<PathBuf>,

    /// Configuration file path (defaults to kiln.toml at the project root)
    #[arg(long, global = true, env = "KILN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Local artifact store (defaults to ~/.m2/repository)
    #[arg(long, global = true)]
    pub repository: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Version every module, rewrite descriptors, build what the store
    /// cannot serve
    Build(BuildArgs),

    /// Show derived versions and cache status without building
    Status(StatusArgs),

    /// Remove superseded and stale artifacts from the local store
    Gc(GcArgs),
}

/// Version overrides shared by build and status
#[derive(Parser, Debug, Clone, Default)]
pub struct VersionFlags {
    /// Pull request id; gives the site a {major}.{minor}-PR{id} version.
    /// The CI convention of "false" (or empty) means no pull request.
    #[arg(long, env = "KILN_PULL_REQUEST")]
    pub pull_request: Option<String>,

    /// CI build number, appended to the derived site version as +{n}
    #[arg(long, env = "KILN_BUILD_NUMBER")]
    pub build_number: Option<String>,
}

impl VersionFlags {
    /// The active pull request id, normalizing the "false" sentinel away
    pub fn pull_request_id(&self) -> Option<&str> {
        match self.pull_request.as_deref() {
            None | Some("") | Some("false") => None,
            Some(id) => Some(id),
        }
    }

    pub fn build_number(&self) -> Option<&str> {
        self.build_number.as_deref().filter(|n| !n.is_empty())
    }
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub version: VersionFlags,

    /// Skip tests in every Maven invocation
    #[arg(long)]
    pub skip_tests: bool,

    /// Skip tests when building a pull request
    #[arg(long)]
    pub skip_tests_if_pr: bool,

    /// Maven options (space-separated), overriding the configured set
    #[arg(long, value_delimiter = ' ', allow_hyphen_values = true)]
    pub maven_options: Option<Vec<String>>,

    /// In the closing store sweep, remove third-party files untouched for
    /// this many days (default: from config)
    #[arg(long)]
    pub stale_days: Option<u32>,

    /// In the closing store sweep, remove third-party files last modified
    /// before this date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "stale_days", value_parser = parse_date)]
    pub stale_before: Option<DateTime<Utc>>,
}

impl BuildArgs {
    pub fn skip_tests(&self) -> bool {
        self.skip_tests || (self.skip_tests_if_pr && self.version.pull_request_id().is_some())
    }
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub version: VersionFlags,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the gc command
#[derive(Parser, Debug)]
pub struct GcArgs {
    /// Remove third-party files untouched for this many days
    /// (default: from config)
    #[arg(long)]
    pub stale_days: Option<u32>,

    /// Remove third-party files last modified before this date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "stale_days", value_parser = parse_date)]
    pub stale_before: Option<DateTime<Utc>>,

    /// Show what would be removed without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one module per line)
    Plain,
}

/// Parse a YYYY-MM-DD date as midnight UTC
fn parse_date(s: &str) -> Result<DateTime<Utc>, KilnError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| KilnError::InvalidDate {
            value: s.to_string(),
        })
}
