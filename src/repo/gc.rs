//! Store garbage collection
//!
//! Three passes over the local repository:
//!
//! 1. under the unversioned directory of each project artifact, every file
//!    outside the current versioned directory is a superseded build and is
//!    removed regardless of age;
//! 2. files not owned by any project artifact and not modified since the
//!    staleness cutoff are removed;
//! 3. directories left empty are collapsed, deepest first.
//!
//! Ownership checks are path-segment comparisons, so version `1.1` never
//! claims the files of version `1.10`. A filesystem failure mid-sweep is
//! fatal and propagates; continuing past a half-cleaned store is unsafe.

use crate::artifact::Artifact;
use crate::error::{KilnError, KilnResult};
use crate::repo::LocalRepo;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy)]
pub struct GcOptions {
    /// Files last modified before this instant are stale
    pub stale_before: DateTime<Utc>,
    /// Report what would be removed without touching the store
    pub dry_run: bool,
}

/// What a sweep removed, or would remove under dry-run
#[derive(Debug, Default, Clone, Copy)]
pub struct GcSummary {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub bytes_reclaimed: u64,
}

/// Sweep the store. A missing store is a no-op, not an error.
pub fn sweep(
    repo: &LocalRepo,
    artifacts: &[Artifact],
    options: &GcOptions,
) -> KilnResult<GcSummary> {
    info!(
        "removing store artifacts last modified before {}",
        options.stale_before.format("%Y-%m-%d %H:%M")
    );
    let mut sweeper = Sweeper {
        options,
        summary: GcSummary::default(),
        removed: HashSet::new(),
    };
    if !repo.root().exists() {
        info!("store {} does not exist, nothing to sweep", repo.root().display());
        return Ok(sweeper.summary);
    }

    for artifact in artifacts {
        let unversioned = repo.unversioned_dir(artifact);
        if !unversioned.exists() {
            continue;
        }
        let current = repo.versioned_dir(artifact);
        debug!("sweeping {}", unversioned.display());
        for entry in WalkDir::new(&unversioned) {
            let entry = entry.map_err(walk_error)?;
            if entry.file_type().is_dir() || entry.path().starts_with(&current) {
                continue;
            }
            sweeper.remove_file(entry.path(), "superseded project artifact")?;
        }
    }

    let owned: Vec<PathBuf> = artifacts
        .iter()
        .map(|artifact| repo.unversioned_dir(artifact))
        .collect();
    for entry in WalkDir::new(repo.root()) {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if owned.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(walk_error)?
            .modified()
            .map(DateTime::<Utc>::from)
            .map_err(|e| KilnError::io(format!("reading mtime of {}", path.display()), e))?;
        if modified > options.stale_before {
            continue;
        }
        sweeper.remove_file(path, "stale third-party artifact")?;
    }

    for entry in WalkDir::new(repo.root()).min_depth(1).contents_first(true) {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_dir() && sweeper.dir_would_be_empty(entry.path())? {
            sweeper.remove_dir(entry.path())?;
        }
    }

    Ok(sweeper.summary)
}

fn walk_error(e: walkdir::Error) -> KilnError {
    let context = match e.path() {
        Some(path) => format!("walking {}", path.display()),
        None => "walking the store".to_string(),
    };
    KilnError::io(context, e.into())
}

struct Sweeper<'a> {
    options: &'a GcOptions,
    summary: GcSummary,
    /// Paths removed so far, consulted so the directory pass can predict
    /// emptiness even under dry-run
    removed: HashSet<PathBuf>,
}

impl Sweeper<'_> {
    fn remove_file(&mut self, path: &Path, reason: &str) -> KilnResult<()> {
        let size = fs::metadata(path)
            .map_err(|e| KilnError::io(format!("reading size of {}", path.display()), e))?
            .len();
        if self.options.dry_run {
            info!("would remove {} ({reason})", path.display());
        } else {
            debug!("removing {} ({reason})", path.display());
            fs::remove_file(path)
                .map_err(|e| KilnError::io(format!("removing {}", path.display()), e))?;
        }
        self.removed.insert(path.to_path_buf());
        self.summary.files_removed += 1;
        self.summary.bytes_reclaimed += size;
        Ok(())
    }

    fn remove_dir(&mut self, path: &Path) -> KilnResult<()> {
        if self.options.dry_run {
            info!("would remove empty directory {}", path.display());
        } else {
            debug!("removing empty directory {}", path.display());
            fs::remove_dir(path)
                .map_err(|e| KilnError::io(format!("removing {}", path.display()), e))?;
        }
        self.removed.insert(path.to_path_buf());
        self.summary.dirs_removed += 1;
        Ok(())
    }

    fn dir_would_be_empty(&self, path: &Path) -> KilnResult<bool> {
        let entries = fs::read_dir(path)
            .map_err(|e| KilnError::io(format!("reading {}", path.display()), e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| KilnError::io(format!("reading {}", path.display()), e))?;
            if !self.removed.contains(&entry.path()) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactId, ModuleRole, Packaging};
    use chrono::Duration;
    use tempfile::TempDir;

    fn checkout(version: &str) -> Artifact {
        Artifact {
            id: ArtifactId::new("com.example.shop", "checkout"),
            version: version.to_string(),
            packaging: Packaging::Jar,
            source_path: Some(PathBuf::from("checkout")),
            role: ModuleRole::Ordinary,
        }
    }

    fn seed(store: &Path, relative: &str) -> PathBuf {
        let file = store.join(relative);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"payload").unwrap();
        file
    }

    fn keep_everything_else() -> GcOptions {
        GcOptions {
            stale_before: Utc::now() - Duration::hours(1),
            dry_run: false,
        }
    }

    #[test]
    fn superseded_versions_removed_without_claiming_prefix_siblings() {
        let store = TempDir::new().unwrap();
        let kept = seed(
            store.path(),
            "com/example/shop/checkout/1.1/checkout-1.1.jar",
        );
        let sibling = seed(
            store.path(),
            "com/example/shop/checkout/1.10/checkout-1.10.jar",
        );
        let old = seed(
            store.path(),
            "com/example/shop/checkout/0.9/checkout-0.9.jar",
        );

        let repo = LocalRepo::at(store.path());
        let summary = sweep(&repo, &[checkout("1.1")], &keep_everything_else()).unwrap();

        assert!(kept.exists());
        assert!(!sibling.exists());
        assert!(!old.exists());
        assert_eq!(summary.files_removed, 2);
        // their version directories collapse too
        assert!(!store.path().join("com/example/shop/checkout/1.10").exists());
        assert_eq!(summary.dirs_removed, 2);
    }

    #[test]
    fn third_party_files_removed_only_when_stale() {
        let store = TempDir::new().unwrap();
        let lib = seed(store.path(), "org/junit/junit/4.13.2/junit-4.13.2.jar");
        let repo = LocalRepo::at(store.path());
        let project = [checkout("1.1")];

        let kept = sweep(&repo, &project, &keep_everything_else()).unwrap();
        assert!(lib.exists());
        assert_eq!(kept.files_removed, 0);

        // cutoff in the future makes the just-written file stale
        let removed = sweep(
            &repo,
            &project,
            &GcOptions {
                stale_before: Utc::now() + Duration::hours(1),
                dry_run: false,
            },
        )
        .unwrap();
        assert!(!lib.exists());
        assert_eq!(removed.files_removed, 1);
        assert!(!store.path().join("org").exists());
    }

    #[test]
    fn project_files_survive_any_cutoff() {
        let store = TempDir::new().unwrap();
        let jar = seed(
            store.path(),
            "com/example/shop/checkout/1.1/checkout-1.1.jar",
        );
        let repo = LocalRepo::at(store.path());

        let summary = sweep(
            &repo,
            &[checkout("1.1")],
            &GcOptions {
                stale_before: Utc::now() + Duration::hours(1),
                dry_run: false,
            },
        )
        .unwrap();

        assert!(jar.exists());
        assert_eq!(summary.files_removed, 0);
    }

    #[test]
    fn missing_store_is_a_noop() {
        let store = TempDir::new().unwrap();
        let repo = LocalRepo::at(store.path().join("never-created"));

        let summary = sweep(&repo, &[checkout("1.1")], &keep_everything_else()).unwrap();

        assert_eq!(summary.files_removed, 0);
        assert_eq!(summary.dirs_removed, 0);
    }

    #[test]
    fn already_empty_directories_are_collapsed() {
        let store = TempDir::new().unwrap();
        fs::create_dir_all(store.path().join("com/abandoned/nested")).unwrap();
        let repo = LocalRepo::at(store.path());

        let summary = sweep(&repo, &[], &keep_everything_else()).unwrap();

        assert!(!store.path().join("com").exists());
        assert!(store.path().exists());
        assert_eq!(summary.dirs_removed, 3);
    }

    #[test]
    fn dry_run_counts_without_deleting() {
        let store = TempDir::new().unwrap();
        let superseded = seed(
            store.path(),
            "com/example/shop/checkout/0.9/checkout-0.9.jar",
        );
        let stale = seed(store.path(), "org/junit/junit/4.13.2/junit-4.13.2.jar");
        let repo = LocalRepo::at(store.path());

        let summary = sweep(
            &repo,
            &[checkout("1.1")],
            &GcOptions {
                stale_before: Utc::now() + Duration::hours(1),
                dry_run: true,
            },
        )
        .unwrap();

        assert!(superseded.exists());
        assert!(stale.exists());
        assert_eq!(summary.files_removed, 2);
        assert_eq!(summary.bytes_reclaimed, 14);
        // 0.9 and the whole org/ chain would collapse
        assert!(summary.dirs_removed >= 4);
    }
}
