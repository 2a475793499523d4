//! Unpacking cached artifacts into module target directories
//!
//! Integration tests in downstream modules expect upstream build output
//! under `<module>/target`, which only exists when the module was actually
//! built. For cache hits the archives from the store are expanded into the
//! places the build would have produced them.

use crate::artifact::Artifact;
use crate::error::{KilnError, KilnResult};
use crate::repo::LocalRepo;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Expand the archives of each cached artifact into its module's target
/// directory. Jars and classes-jars unpack into `target/classes`, wars into
/// `target/<name>-<version>`. An unzip only runs when this call created
/// the destination directory; an existing directory already holds output
/// from a build or an earlier unpack.
pub async fn unpack_cached(root: &Path, repo: &LocalRepo, artifacts: &[Artifact]) -> KilnResult<()> {
    for artifact in artifacts {
        let Some(module) = artifact.source_dir() else {
            continue;
        };
        debug!("unpacking {artifact}");
        let target = root.join(module).join("target");
        let classes_dir = target.join("classes");
        let war_dir = target.join(artifact.file_prefix());

        if let Some(jar) = repo.local_file(artifact, ".jar") {
            if ensure_created(&classes_dir)? {
                unzip(&jar, &classes_dir).await;
            }
        }
        if let Some(classes_jar) = repo.local_file(artifact, "-classes.jar") {
            if ensure_created(&classes_dir)? {
                unzip(&classes_jar, &classes_dir).await;
            }
        }
        if let Some(war) = repo.local_file(artifact, ".war") {
            if ensure_created(&war_dir)? {
                unzip(&war, &war_dir).await;
            }
        }
    }
    Ok(())
}

/// Create the directory if missing, reporting whether this call created it
fn ensure_created(path: &Path) -> KilnResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(path)
        .map_err(|e| KilnError::io(format!("creating {}", path.display()), e))?;
    Ok(true)
}

/// A failed unzip leaves the module without unpacked output but never
/// fails the pipeline; the build that follows may not need it.
async fn unzip(archive: &Path, dest: &Path) {
    info!("COMMAND: unzip -qo {} -d {}", archive.display(), dest.display());
    let status = Command::new("unzip")
        .arg("-qo")
        .arg(archive)
        .arg("-d")
        .arg(dest)
        .status()
        .await;
    match status {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("unzip {} exited with {status}", archive.display()),
        Err(e) => warn!("could not run unzip: {e}"),
    }
}
