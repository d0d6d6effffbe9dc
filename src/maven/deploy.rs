// src/maven/deploy.rs

//! Writing artifacts into the local Maven repository

use super::{ArtifactLayout, merge_metadata};
use crate::error::{Error, Result};
use crate::events::{EventSink, SyncEvent};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use quick_xml::escape::escape;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Where a deployment ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedArtifact {
    pub group: String,
    pub artifact_id: String,
    pub version: String,
    pub jar_path: PathBuf,
    pub pom_path: PathBuf,
}

/// Minimal POM for a jar without a usable upstream POM
pub fn synthesized_pom(group: &str, artifact_id: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <description>POM was created from obs-to-maven</description>
</project>
"#,
        escape(group),
        escape(artifact_id),
        escape(version)
    )
}

/// Deploys jars under a repository root
#[derive(Debug, Clone)]
pub struct RepositoryDeployer {
    root: PathBuf,
}

impl RepositoryDeployer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a jar of `artifact_id` built at `file_time` is already deployed
    ///
    /// Any group is considered, since the group may come from a POM that is
    /// only read after the download.
    pub fn has_generation(&self, artifact_id: &str, file_time: u64) -> Result<bool> {
        if !self.root.is_dir() {
            return Ok(false);
        }

        for entry in WalkDir::new(&self.root).min_depth(3) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "jar") {
                continue;
            }
            let in_artifact_dir = path
                .parent()
                .and_then(Path::parent)
                .and_then(Path::file_name)
                .is_some_and(|name| name == artifact_id);
            if !in_artifact_dir {
                continue;
            }

            let mtime = FileTime::from_last_modification_time(&entry.metadata()?);
            debug!("{}: mtime {}", path.display(), mtime.unix_seconds());
            if u64::try_from(mtime.unix_seconds()).ok() == Some(file_time) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn deploy(
        &self,
        artifact_id: &str,
        jar: &Path,
        group: &str,
        version: &str,
        mtime: u64,
        events: &dyn EventSink,
    ) -> Result<DeployedArtifact> {
        self.deploy_at(artifact_id, jar, group, version, mtime, Utc::now(), events)
    }

    /// [`Self::deploy`] with an explicit `lastUpdated` time
    #[allow(clippy::too_many_arguments)]
    pub fn deploy_at(
        &self,
        artifact_id: &str,
        jar: &Path,
        group: &str,
        version: &str,
        mtime: u64,
        now: DateTime<Utc>,
        events: &dyn EventSink,
    ) -> Result<DeployedArtifact> {
        let mtime = i64::try_from(mtime)
            .map_err(|_| Error::ParseError(format!("{}: file time {} out of range", artifact_id, mtime)))?;
        let layout = ArtifactLayout::new(&self.root, group, artifact_id);
        let version_dir = layout.version_dir(version);
        fs::create_dir_all(&version_dir)
            .map_err(|e| Error::IoError(format!("Failed to create {}: {}", version_dir.display(), e)))?;

        let jar_path = layout.jar_path(version);
        debug!("deploying {} to {}", jar.display(), jar_path.display());
        fs::copy(jar, &jar_path)
            .map_err(|e| Error::IoError(format!("Failed to copy {} to {}: {}", jar.display(), jar_path.display(), e)))?;
        filetime::set_file_mtime(&jar_path, FileTime::from_unix_time(mtime, 0))
            .map_err(|e| Error::IoError(format!("Failed to set mtime on {}: {}", jar_path.display(), e)))?;

        let pom_path = layout.pom_path(version);
        fs::write(&pom_path, synthesized_pom(group, artifact_id, version))
            .map_err(|e| Error::IoError(format!("Failed to write {}: {}", pom_path.display(), e)))?;

        merge_metadata(&layout.metadata_path(), group, artifact_id, version, now, events)?;

        events.emit(SyncEvent::ArtifactDeployed {
            artifact: artifact_id.to_string(),
            group: group.to_string(),
            version: version.to_string(),
            path: jar_path.clone(),
        });

        Ok(DeployedArtifact {
            group: group.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            jar_path,
            pom_path,
        })
    }
}
