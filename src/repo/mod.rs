//! Local artifact repository
//!
//! Models the on-disk Maven store (`~/.m2/repository` by default) as a
//! content-addressed cache keyed by artifact coordinate. Presence of any
//! artifact file for an exact version is a cache hit; content is never
//! inspected, the derived version string carries all the input state.

pub mod gc;
pub mod unpack;

use crate::artifact::Artifact;
use crate::error::{KilnError, KilnResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Artifact file suffixes the cache probe recognizes
pub const ARTIFACT_SUFFIXES: [&str; 4] = [".pom", ".war", ".jar", "-classes.jar"];

/// Handle on one local artifact store
#[derive(Debug, Clone)]
pub struct LocalRepo {
    root: PathBuf,
}

impl LocalRepo {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The conventional store under the user's home directory
    pub fn default_location() -> KilnResult<Self> {
        let home = dirs::home_dir().ok_or(KilnError::HomeDirNotFound)?;
        Ok(Self::at(home.join(".m2").join("repository")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every version of the artifact: group segments,
    /// then the artifact name
    pub fn unversioned_dir(&self, artifact: &Artifact) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in artifact.id.group_segments() {
            dir.push(segment);
        }
        dir.push(&artifact.id.name);
        dir
    }

    /// Directory holding exactly this version of the artifact
    pub fn versioned_dir(&self, artifact: &Artifact) -> PathBuf {
        self.unversioned_dir(artifact).join(&artifact.version)
    }

    /// Path of one artifact file, if present in the store
    pub fn local_file(&self, artifact: &Artifact, suffix: &str) -> Option<PathBuf> {
        let file = self
            .versioned_dir(artifact)
            .join(format!("{}{}", artifact.file_prefix(), suffix));
        file.exists().then_some(file)
    }

    /// Every artifact file present in the store for this exact version
    pub fn local_files(&self, artifact: &Artifact) -> Vec<PathBuf> {
        ARTIFACT_SUFFIXES
            .iter()
            .filter_map(|suffix| self.local_file(artifact, suffix))
            .collect()
    }

    /// Cache probe: a hit means at least one artifact file exists for this
    /// exact version. Logs the verdict for every artifact probed.
    pub fn is_cached(&self, artifact: &Artifact) -> bool {
        debug!("looking for cached {artifact}");
        let cached = !self.local_files(artifact).is_empty();
        if cached {
            info!("{artifact} [CACHED]");
        } else {
            info!("{artifact} [BUILD]");
        }
        cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactId, ModuleRole, Packaging};
    use tempfile::TempDir;

    fn artifact(version: &str) -> Artifact {
        Artifact {
            id: ArtifactId::new("com.example.shop", "checkout"),
            version: version.to_string(),
            packaging: Packaging::Jar,
            source_path: Some(PathBuf::from("checkout")),
            role: ModuleRole::Ordinary,
        }
    }

    fn seed(store: &Path, artifact: &Artifact, suffix: &str) -> PathBuf {
        let dir = store
            .join("com/example/shop/checkout")
            .join(&artifact.version);
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(format!("{}{}", artifact.file_prefix(), suffix));
        std::fs::write(&file, b"payload").unwrap();
        file
    }

    #[test]
    fn paths_follow_group_segments() {
        let repo = LocalRepo::at("/m2");
        let a = artifact("1.2.40-xabcdef");
        assert_eq!(
            repo.unversioned_dir(&a),
            Path::new("/m2/com/example/shop/checkout")
        );
        assert_eq!(
            repo.versioned_dir(&a),
            Path::new("/m2/com/example/shop/checkout/1.2.40-xabcdef")
        );
    }

    #[test]
    fn hit_on_any_recognized_suffix() {
        let store = TempDir::new().unwrap();
        let repo = LocalRepo::at(store.path());
        let a = artifact("1.2.40-xabcdef");

        assert!(!repo.is_cached(&a));

        let jar = seed(store.path(), &a, "-classes.jar");
        assert!(repo.is_cached(&a));
        assert_eq!(repo.local_files(&a), [jar]);
    }

    #[test]
    fn exact_version_only() {
        let store = TempDir::new().unwrap();
        let repo = LocalRepo::at(store.path());
        seed(store.path(), &artifact("1.2.39-x123456"), ".jar");

        // same artifact, one commit later
        assert!(!repo.is_cached(&artifact("1.2.40-xabcdef")));
    }

    #[test]
    fn unrecognized_suffixes_do_not_count() {
        let store = TempDir::new().unwrap();
        let repo = LocalRepo::at(store.path());
        let a = artifact("1.2.40-xabcdef");
        seed(store.path(), &a, ".jar.sha1");

        assert!(!repo.is_cached(&a));
    }
}
