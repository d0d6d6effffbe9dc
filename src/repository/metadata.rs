// src/repository/metadata.rs

//! Package and repository metadata types
//!
//! A [`PackageRecord`] is one `<package>` entry of a repository's
//! primary.xml. Records are only ever produced by [`PackageRecordBuilder`],
//! which refuses to build until every required field has been seen.

use crate::version::RpmVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a package entry could not become a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field} value '{value}'")]
    Invalid { field: &'static str, value: String },
}

/// A binary package published in a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    name: String,
    epoch: Option<u64>,
    version: String,
    release: String,
    arch: String,
    location: String,
    file_time: u64,
}

impl PackageRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Path of the binary relative to the repository root
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Build time of the binary file, seconds since the epoch
    pub fn file_time(&self) -> u64 {
        self.file_time
    }

    /// File name of the binary, e.g. `foo-1.0-1.1.noarch.rpm`
    pub fn file_name(&self) -> &str {
        self.location
            .rsplit('/')
            .next()
            .unwrap_or(&self.location)
    }

    pub fn evr(&self) -> RpmVersion {
        RpmVersion::new(self.epoch, self.version.clone(), self.release.clone())
    }

    /// Strictly newer than `other`; equal versions do not replace each other
    pub fn is_newer_than(&self, other: &PackageRecord) -> bool {
        self.evr() > other.evr()
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr(), self.arch)
    }
}

/// Accumulates the fields of a `<package>` entry while it is being parsed
#[derive(Debug, Default, Clone)]
pub struct PackageRecordBuilder {
    name: Option<String>,
    epoch: Option<String>,
    version: Option<String>,
    release: Option<String>,
    arch: Option<String>,
    location: Option<String>,
    file_time: Option<String>,
}

impl PackageRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn epoch(&mut self, epoch: impl Into<String>) -> &mut Self {
        self.epoch = Some(epoch.into());
        self
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    pub fn release(&mut self, release: impl Into<String>) -> &mut Self {
        self.release = Some(release.into());
        self
    }

    pub fn arch(&mut self, arch: impl Into<String>) -> &mut Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn location(&mut self, location: impl Into<String>) -> &mut Self {
        self.location = Some(location.into());
        self
    }

    pub fn file_time(&mut self, file_time: impl Into<String>) -> &mut Self {
        self.file_time = Some(file_time.into());
        self
    }

    /// Name seen so far, for diagnostics about a rejected entry
    pub fn name_hint(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Validate and build; nothing is produced for an incomplete entry
    pub fn build(&self) -> Result<PackageRecord, RecordError> {
        fn required(value: &Option<String>, field: &'static str) -> Result<String, RecordError> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(RecordError::Missing(field)),
            }
        }

        let name = required(&self.name, "name")?;
        let arch = required(&self.arch, "arch")?;
        let version = required(&self.version, "version/ver")?;
        let release = required(&self.release, "version/rel")?;
        let location = required(&self.location, "location/href")?;
        let file_time = required(&self.file_time, "time/file")?;

        // mtimes are signed seconds, so a file time must fit in an i64
        let file_time = file_time
            .parse::<u64>()
            .ok()
            .filter(|t| i64::try_from(*t).is_ok())
            .ok_or_else(|| RecordError::Invalid {
                field: "time/file",
                value: file_time.clone(),
            })?;

        let epoch = match self.epoch.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(e) => Some(e.parse::<u64>().map_err(|_| RecordError::Invalid {
                field: "version/epoch",
                value: e.to_string(),
            })?),
        };

        Ok(PackageRecord {
            name,
            epoch,
            version,
            release,
            arch,
            location,
            file_time,
        })
    }
}
