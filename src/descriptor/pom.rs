//! Read-side descriptor accessor
//!
//! Deserializes the fields kiln needs from a pom.xml. Identity and version
//! fall back to the parent declaration when a module inherits them, and
//! packaging defaults to jar, mirroring how Maven itself resolves these.

use crate::artifact::{Artifact, ArtifactId, ModuleRole, Packaging};
use crate::error::{KilnError, KilnResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PomXml {
    #[serde(rename = "groupId")]
    group_id: Option<String>,
    #[serde(rename = "artifactId")]
    artifact_id: Option<String>,
    version: Option<String>,
    packaging: Option<String>,
    parent: Option<PomParent>,
    #[serde(default)]
    modules: PomModules,
}

#[derive(Debug, Deserialize)]
struct PomParent {
    #[serde(rename = "groupId")]
    group_id: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PomModules {
    #[serde(default, rename = "module")]
    module: Vec<String>,
}

/// A parsed module descriptor
#[derive(Debug)]
pub struct Pom {
    inner: PomXml,
}

impl Pom {
    /// Read `{root}/{module}/pom.xml`. Returns Ok(None) when the file does
    /// not exist; a module without a descriptor is legal.
    pub async fn read(root: &Path, module: &Path) -> KilnResult<Option<Self>> {
        let path = root.join(module).join("pom.xml");
        if !path.exists() {
            debug!("No descriptor at {}", path.display());
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| KilnError::io(format!("reading {}", path.display()), e))?;

        let inner: PomXml = quick_xml::de::from_str(&content)
            .map_err(|e| KilnError::descriptor_parse(&path, e.to_string()))?;

        Ok(Some(Self { inner }))
    }

    /// groupId, inherited from the parent declaration when absent
    pub fn group(&self) -> &str {
        self.inner
            .group_id
            .as_deref()
            .or_else(|| self.inner.parent.as_ref().and_then(|p| p.group_id.as_deref()))
            .unwrap_or("")
    }

    /// artifactId; no inheritance, a module always declares its own name
    pub fn name(&self) -> &str {
        self.inner.artifact_id.as_deref().unwrap_or("")
    }

    /// Declared version, inherited from the parent declaration when absent.
    /// Empty when neither declares one; the version parser treats that as
    /// major "0".
    pub fn declared_version(&self) -> &str {
        self.inner
            .version
            .as_deref()
            .or_else(|| self.inner.parent.as_ref().and_then(|p| p.version.as_deref()))
            .unwrap_or("")
    }

    pub fn packaging(&self) -> Packaging {
        Packaging::from_declared(self.inner.packaging.as_deref())
    }

    /// Declared sub-module paths, in declaration order
    pub fn modules(&self) -> &[String] {
        &self.inner.modules.module
    }

    /// Build the artifact identity for this descriptor, carrying the
    /// declared version. Version derivation replaces it later.
    pub fn artifact(&self, source_path: impl Into<PathBuf>, role: ModuleRole) -> Artifact {
        Artifact {
            id: ArtifactId::new(self.group(), self.name()),
            version: self.declared_version().to_string(),
            packaging: self.packaging(),
            source_path: Some(source_path.into()),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn parse(content: &str) -> Pom {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("m");
        std::fs::create_dir(&module).unwrap();
        std::fs::write(module.join("pom.xml"), content).unwrap();
        Pom::read(dir.path(), Path::new("m")).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn reads_declared_fields() {
        let pom = parse(
            r#"<project>
                <groupId>com.example</groupId>
                <artifactId>core</artifactId>
                <version>1.2.7</version>
                <packaging>war</packaging>
            </project>"#,
        )
        .await;

        assert_eq!(pom.group(), "com.example");
        assert_eq!(pom.name(), "core");
        assert_eq!(pom.declared_version(), "1.2.7");
        assert_eq!(pom.packaging(), Packaging::War);
    }

    #[tokio::test]
    async fn inherits_group_and_version_from_parent() {
        let pom = parse(
            r#"<project>
                <parent>
                    <groupId>com.example</groupId>
                    <artifactId>aggregate</artifactId>
                    <version>1.2</version>
                </parent>
                <artifactId>core</artifactId>
            </project>"#,
        )
        .await;

        assert_eq!(pom.group(), "com.example");
        assert_eq!(pom.name(), "core");
        assert_eq!(pom.declared_version(), "1.2");
        assert_eq!(pom.packaging(), Packaging::Jar);
    }

    #[tokio::test]
    async fn lists_submodules_in_order() {
        let pom = parse(
            r#"<project>
                <artifactId>aggregate</artifactId>
                <modules>
                    <module>parent</module>
                    <module>core</module>
                    <module>site</module>
                </modules>
            </project>"#,
        )
        .await;

        assert_eq!(pom.modules(), ["parent", "core", "site"]);
    }

    #[tokio::test]
    async fn missing_descriptor_is_none() {
        let dir = TempDir::new().unwrap();
        let pom = Pom::read(dir.path(), Path::new("ghost")).await.unwrap();
        assert!(pom.is_none());
    }

    #[tokio::test]
    async fn malformed_descriptor_is_an_error() {
        let dir = TempDir::new().unwrap();
        let module = dir.path().join("m");
        std::fs::create_dir(&module).unwrap();
        std::fs::write(module.join("pom.xml"), "<project><artifactId>").unwrap();

        let err = Pom::read(dir.path(), Path::new("m")).await.unwrap_err();
        assert!(matches!(err, KilnError::DescriptorParse { .. }));
    }

    #[tokio::test]
    async fn artifact_carries_declared_version() {
        let pom = parse(
            r#"<project>
                <groupId>com.example</groupId>
                <artifactId>core</artifactId>
                <version>1.2.7</version>
            </project>"#,
        )
        .await;

        let artifact = pom.artifact("core", ModuleRole::Ordinary);
        assert_eq!(artifact.id.to_string(), "com.example:core");
        assert_eq!(artifact.version, "1.2.7");
        assert_eq!(artifact.source_path.as_deref(), Some(Path::new("core")));
    }
}
