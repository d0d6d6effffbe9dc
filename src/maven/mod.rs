// src/maven/mod.rs

//! Local Maven repository layout
//!
//! ```text
//! <root>/org/example/foo/maven-metadata-local.xml
//! <root>/org/example/foo/1.2/foo-1.2.jar
//! <root>/org/example/foo/1.2/foo-1.2.pom
//! ```

pub mod deploy;
pub mod metadata;

use std::path::{Path, PathBuf};

pub use deploy::{DeployedArtifact, RepositoryDeployer};
pub use metadata::{MavenMetadata, merge_metadata};

/// Metadata file maintained next to the version directories
pub const METADATA_FILE: &str = "maven-metadata-local.xml";

/// `org.example` → `org/example`
pub fn group_path(group: &str) -> PathBuf {
    group.split('.').filter(|s| !s.is_empty()).collect()
}

/// Paths of one artifact inside a repository root
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    artifact_dir: PathBuf,
    artifact_id: String,
}

impl ArtifactLayout {
    pub fn new(root: &Path, group: &str, artifact_id: &str) -> Self {
        Self {
            artifact_dir: root.join(group_path(group)).join(artifact_id),
            artifact_id: artifact_id.to_string(),
        }
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.artifact_dir.join(version)
    }

    pub fn jar_path(&self, version: &str) -> PathBuf {
        self.version_dir(version)
            .join(format!("{}-{}.jar", self.artifact_id, version))
    }

    pub fn pom_path(&self, version: &str) -> PathBuf {
        self.version_dir(version)
            .join(format!("{}-{}.pom", self.artifact_id, version))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.artifact_dir.join(METADATA_FILE)
    }
}
