//! Status command - derived versions and cache status without building
//!
//! Runs the same scan and version derivation as the build command but
//! never touches a descriptor or the store.

use crate::artifact::{Artifact, ModuleRole};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::commands::{build, CommandContext};
use crate::error::KilnResult;
use crate::graph;
use crate::repo::LocalRepo;
use console::style;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Execute the status command
pub async fn execute(args: StatusArgs, ctx: &CommandContext) -> KilnResult<()> {
    let scm = ctx.scm();
    let repo = ctx.repo()?;
    let all =
        build::project_artifacts(&scm, &ctx.root, &ctx.config.layout, &args.version).await?;
    let reactor = graph::reactor(&ctx.root).await?;

    let rows = rows(&repo, &all, &reactor);
    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => print_plain(&rows),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ModuleStatus {
    module: String,
    role: ModuleRole,
    version: String,
    state: ModuleState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ModuleState {
    Cached,
    Build,
    OutsideReactor,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached => write!(f, "cached"),
            Self::Build => write!(f, "build"),
            Self::OutsideReactor => write!(f, "outside reactor"),
        }
    }
}

fn rows(repo: &LocalRepo, all: &[Artifact], reactor: &HashSet<PathBuf>) -> Vec<ModuleStatus> {
    all.iter()
        .map(|artifact| {
            let state = if !artifact.in_reactor(reactor) {
                ModuleState::OutsideReactor
            } else if repo.is_cached(artifact) {
                ModuleState::Cached
            } else {
                ModuleState::Build
            };
            ModuleStatus {
                module: artifact
                    .source_dir()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| artifact.coordinate()),
                role: artifact.role,
                version: artifact.version.clone(),
                state,
            }
        })
        .collect()
}

fn print_table(rows: &[ModuleStatus]) {
    println!(
        "{:<24} {:<10} {:<28} {:<16}",
        style("MODULE").bold(),
        style("ROLE").bold(),
        style("VERSION").bold(),
        style("STATE").bold()
    );
    println!("{}", "-".repeat(80));

    for row in rows {
        let state = match row.state {
            ModuleState::Cached => style("cached").green(),
            ModuleState::Build => style("build").yellow(),
            ModuleState::OutsideReactor => style("outside reactor").dim(),
        };
        println!(
            "{:<24} {:<10} {:<28} {:<16}",
            row.module, row.role, row.version, state
        );
    }

    println!();
    let to_build = rows
        .iter()
        .filter(|row| row.state == ModuleState::Build)
        .count();
    println!("{} of {} module(s) need building", to_build, rows.len());
}

fn print_json(rows: &[ModuleStatus]) -> KilnResult<()> {
    println!("{}", serde_json::to_string_pretty(rows)?);
    Ok(())
}

fn print_plain(rows: &[ModuleStatus]) {
    for row in rows {
        println!("{} {} {}", row.module, row.version, row.state);
    }
}
