// src/maven/metadata.rs

//! `maven-metadata-local.xml` maintenance
//!
//! Existing files are read into [`MavenMetadata`] and rewritten with the new
//! version appended. A file that cannot be read back as metadata is
//! replaced by a fresh one listing only the version being deployed.

use crate::error::{Error, Result};
use crate::events::{EventSink, SyncEvent};
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Format of `lastUpdated`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Versions {
    #[serde(rename = "version", default)]
    pub version: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Versioning {
    #[serde(default)]
    pub release: Option<String>,
    pub versions: Versions,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

/// Repository metadata of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename = "metadata")]
pub struct MavenMetadata {
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub versioning: Versioning,
}

impl MavenMetadata {
    /// Metadata listing a single version
    pub fn new(group: &str, artifact_id: &str, version: &str, now: DateTime<Utc>) -> Self {
        Self {
            group_id: group.to_string(),
            artifact_id: artifact_id.to_string(),
            versioning: Versioning {
                release: Some(version.to_string()),
                versions: Versions {
                    version: vec![version.to_string()],
                },
                last_updated: now.format(TIMESTAMP_FORMAT).to_string(),
            },
        }
    }

    pub fn parse(xml: &str) -> std::result::Result<Self, String> {
        quick_xml::de::from_str(xml).map_err(|e| e.to_string())
    }

    /// Record a deployment of `version`
    pub fn add_version(&mut self, version: &str, now: DateTime<Utc>) {
        if !self.versioning.versions.version.iter().any(|v| v == version) {
            self.versioning.versions.version.push(version.to_string());
        }
        self.versioning.release = Some(version.to_string());
        self.versioning.last_updated = now.format(TIMESTAMP_FORMAT).to_string();
    }

    pub fn versions(&self) -> &[String] {
        &self.versioning.versions.version
    }

    pub fn to_xml(&self) -> String {
        let versions: String = self
            .versions()
            .iter()
            .map(|v| format!("      <version>{}</version>\n", escape(v.as_str())))
            .collect();
        let release = self
            .versioning
            .release
            .as_deref()
            .map(|r| format!("    <release>{}</release>\n", escape(r)))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://maven.apache.org/METADATA/1.1.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
          xsi:schemaLocation="http://maven.apache.org/METADATA/1.1.0 https://maven.apache.org/xsd/repository-metadata-1.1.0.xsd">
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <versioning>
{}    <versions>
{}    </versions>
    <lastUpdated>{}</lastUpdated>
  </versioning>
</metadata>
"#,
            escape(self.group_id.as_str()),
            escape(self.artifact_id.as_str()),
            release,
            versions,
            escape(self.versioning.last_updated.as_str()),
        )
    }
}

/// Add `version` to the metadata file at `path`, creating or repairing it
pub fn merge_metadata(
    path: &Path,
    group: &str,
    artifact_id: &str,
    version: &str,
    now: DateTime<Utc>,
    events: &dyn EventSink,
) -> Result<MavenMetadata> {
    let existing = if path.is_file() {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)));
        match content.map(|xml| MavenMetadata::parse(&xml)) {
            Ok(Ok(metadata)) => Some(metadata),
            Ok(Err(reason)) => {
                events.emit(SyncEvent::MetadataRegenerated {
                    path: path.to_path_buf(),
                    reason,
                });
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    let metadata = match existing {
        Some(mut metadata) => {
            metadata.add_version(version, now);
            metadata
        }
        None => MavenMetadata::new(group, artifact_id, version, now),
    };

    fs::write(path, metadata.to_xml())
        .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(metadata)
}
