//! Gc command - sweep the local artifact store
//!
//! The build command runs the same sweep after a successful install; this
//! command exists for housekeeping between builds, and for previewing a
//! sweep with --dry-run.

use crate::cli::args::{GcArgs, VersionFlags};
use crate::cli::commands::{build, CommandContext};
use crate::error::KilnResult;
use crate::repo::gc::{sweep, GcOptions};
use chrono::{DateTime, Duration, Utc};
use console::style;

/// Execute the gc command
pub async fn execute(args: GcArgs, ctx: &CommandContext) -> KilnResult<()> {
    let scm = ctx.scm();
    let repo = ctx.repo()?;

    // current versions decide which store files the project still owns
    let artifacts =
        build::project_artifacts(&scm, &ctx.root, &ctx.config.layout, &VersionFlags::default())
            .await?;

    let options = GcOptions {
        stale_before: stale_cutoff(args.stale_days, args.stale_before, ctx),
        dry_run: args.dry_run,
    };
    let summary = sweep(&repo, &artifacts, &options)?;

    if args.dry_run {
        println!(
            "Dry run - would remove {} file(s) and {} empty directories, reclaiming {}",
            summary.files_removed,
            summary.dirs_removed,
            format_bytes(summary.bytes_reclaimed)
        );
    } else {
        println!(
            "{} removed {} file(s) and {} empty directories, reclaiming {}",
            style("✓").green(),
            summary.files_removed,
            summary.dirs_removed,
            format_bytes(summary.bytes_reclaimed)
        );
    }
    Ok(())
}

/// The --stale-before date wins over --stale-days, which wins over the
/// configured default. Shared with the build command's closing sweep.
pub(crate) fn stale_cutoff(
    stale_days: Option<u32>,
    stale_before: Option<DateTime<Utc>>,
    ctx: &CommandContext,
) -> DateTime<Utc> {
    if let Some(instant) = stale_before {
        return instant;
    }
    match stale_days {
        Some(days) => Utc::now() - Duration::days(i64::from(days)),
        None => ctx.config.cache.stale_before(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
