//! Build command - version, rewrite, and build what the store cannot serve

use crate::artifact::{Artifact, ModuleRole};
use crate::cli::args::{BuildArgs, VersionFlags};
use crate::cli::commands::CommandContext;
use crate::cli::commands::gc::stale_cutoff;
use crate::descriptor::{self, Pom};
use crate::error::{KilnError, KilnResult};
use crate::graph::{self, Layout};
use crate::maven::BuildTool;
use crate::phase::Phase;
use crate::repo::gc::{sweep, GcOptions};
use crate::repo::{unpack, LocalRepo};
use crate::scm::Scm;
use crate::select::{self, Partition};
use crate::version;
use console::style;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Execute the build command
pub async fn execute(args: BuildArgs, ctx: &CommandContext) -> KilnResult<()> {
    let scm = ctx.scm();
    let tool = ctx.maven(args.maven_options.clone());
    let repo = ctx.repo()?;

    {
        // commit counts are only meaningful against full history
        let _phase = Phase::start("unshallow");
        if scm.is_shallow().await? {
            scm.deepen().await?;
        }
    }

    let all = {
        let _phase = Phase::start("versions");
        project_artifacts(&scm, &ctx.root, &ctx.config.layout, &args.version).await?
    };
    let reactor = graph::reactor(&ctx.root).await?;

    {
        let _phase = Phase::start("propagate");
        descriptor::propagate_versions(&ctx.root, &all).await?;
    }

    let partition = {
        let _phase = Phase::start("select");
        choose_build_set(&tool, &repo, &all, &reactor).await?
    };

    if partition.nothing_to_do() {
        println!("Nothing to do!");
        return Ok(());
    }

    {
        let _phase = Phase::start("unpack");
        unpack::unpack_cached(&ctx.root, &repo, &partition.cached).await?;
    }

    {
        let _phase = Phase::start("install");
        let site = site_artifact(&all)?;
        tool.install(&partition.build, site, args.skip_tests()).await?;
    }

    {
        let _phase = Phase::start("gc");
        let summary = sweep(
            &repo,
            &all,
            &GcOptions {
                stale_before: stale_cutoff(args.stale_days, args.stale_before, ctx),
                dry_run: false,
            },
        )?;
        info!(
            "store gc removed {} file(s) and {} directories",
            summary.files_removed, summary.dirs_removed
        );
    }

    println!(
        "{} built {} module(s), {} served from cache",
        style("✓").green(),
        partition.build.len(),
        partition.cached.len()
    );
    Ok(())
}

/// Scan the project and assign every module its derived version.
///
/// Entries without a descriptor are skipped; the site is the one module
/// that must have one, because its coordinate anchors the dependency probe
/// and the verify pass. The site alone takes the version overrides: a pull
/// request id replaces its version with {major}.{minor}-PR{id} built from
/// the declared (not derived) version, otherwise a CI build number is
/// appended to the derived one.
pub(crate) async fn project_artifacts(
    scm: &dyn Scm,
    root: &Path,
    layout: &Layout,
    flags: &VersionFlags,
) -> KilnResult<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for entry in graph::plan(root, layout).await? {
        let Some(pom) = Pom::read(root, &entry.path).await? else {
            if entry.role == ModuleRole::Site {
                return Err(KilnError::User(format!(
                    "site module '{}' has no descriptor",
                    entry.path.display()
                )));
            }
            debug!("Skipping {} (no descriptor)", entry.path.display());
            continue;
        };
        let mut artifact = pom.artifact(entry.path.clone(), entry.role);

        if entry.role == ModuleRole::Site {
            if let Some(id) = flags.pull_request_id() {
                artifact.version = version::pr_version(&artifact.version, id);
                artifacts.push(artifact);
                continue;
            }
        }

        artifact.version = version::derive(scm, &artifact.version, &entry.file_set).await?;

        if entry.role == ModuleRole::Site {
            if let Some(number) = flags.build_number() {
                artifact.version = version::with_build_number(&artifact.version, number);
            }
        }

        artifacts.push(artifact);
    }
    Ok(artifacts)
}

/// Partition the artifacts against the store, then double-check the store
/// is not lying: if the site module's dependencies fail to resolve, some
/// cached artifact is unusable and every reactor module gets scheduled.
/// The cached set keeps its first answer either way; those artifacts are
/// unpacked and then overwritten by the rebuild if one happens.
pub(crate) async fn choose_build_set(
    tool: &dyn BuildTool,
    repo: &LocalRepo,
    all: &[Artifact],
    reactor: &HashSet<PathBuf>,
) -> KilnResult<Partition> {
    let mut partition = select::partition(repo, all.to_vec(), reactor);
    let site = site_artifact(all)?;
    if !tool.resolve_dependencies(site).await {
        info!(
            "Dependencies of {} did not resolve, scheduling every reactor module",
            site.coordinate()
        );
        partition.build = select::reactor_members(all, reactor);
    }
    Ok(partition)
}

pub(crate) fn site_artifact(all: &[Artifact]) -> KilnResult<&Artifact> {
    all.iter()
        .find(|artifact| artifact.role == ModuleRole::Site)
        .ok_or_else(|| KilnError::User("project has no site module".to_string()))
}
