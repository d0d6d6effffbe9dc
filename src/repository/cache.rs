// src/repository/cache.rs

//! On-disk cache of reduced package indexes
//!
//! Layout: `<cache>/<repository>/<primary file name>.data`. The primary file
//! name carries the document checksum on OBS, so a new publish of the
//! repository gets a new cache key. Storing a fresh index removes every
//! other entry for the same repository.

use crate::error::{Error, Result};
use crate::repository::metadata::PackageRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bumped whenever the serialized layout of [`PackageRecord`] changes
const CACHE_FORMAT: u32 = 1;

const ENTRY_EXTENSION: &str = "data";

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    format: u32,
    packages: Vec<PackageRecord>,
}

/// Cache directory of a single repository
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(cache_root: &Path, repository: &str) -> Self {
        Self {
            dir: cache_root.join(repository),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a package list location such as `repodata/abc-primary.xml.gz`
    pub fn entry_path(&self, primary_location: &str) -> PathBuf {
        let file_name = primary_location
            .rsplit('/')
            .next()
            .unwrap_or(primary_location);
        self.dir.join(format!("{}.{}", file_name, ENTRY_EXTENSION))
    }

    /// Cached records for this package list, if any
    pub fn load(&self, primary_location: &str) -> Result<Option<Vec<PackageRecord>>> {
        let path = self.entry_path(primary_location);
        if !path.is_file() {
            debug!("No cached index at {}", path.display());
            return Ok(None);
        }

        let data = fs::read(&path)
            .map_err(|e| Error::CacheError(format!("Failed to read {}: {}", path.display(), e)))?;
        let file: CacheFile = serde_json::from_slice(&data)
            .map_err(|e| Error::CacheError(format!("Failed to decode {}: {}", path.display(), e)))?;

        if file.format != CACHE_FORMAT {
            debug!(
                "Ignoring cached index {} with format {}",
                path.display(),
                file.format
            );
            return Ok(None);
        }

        debug!("Loaded {} records from {}", file.packages.len(), path.display());
        Ok(Some(file.packages))
    }

    /// Replace whatever is cached for this repository with `packages`
    pub fn store<'a>(
        &self,
        primary_location: &str,
        packages: impl IntoIterator<Item = &'a PackageRecord>,
    ) -> Result<PathBuf> {
        let path = self.entry_path(primary_location);
        let cache_err =
            |action: &str, p: &Path, e: std::io::Error| Error::CacheError(format!("Failed to {} {}: {}", action, p.display(), e));

        fs::create_dir_all(&self.dir).map_err(|e| cache_err("create", &self.dir, e))?;
        self.clear().map_err(|e| cache_err("clear", &self.dir, e))?;

        let file = CacheFile {
            format: CACHE_FORMAT,
            packages: packages.into_iter().cloned().collect(),
        };
        let data = serde_json::to_vec(&file)
            .map_err(|e| Error::CacheError(format!("Failed to encode index: {}", e)))?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data).map_err(|e| cache_err("write", &temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| cache_err("rename", &temp_path, e))?;

        debug!("Cached {} records in {}", file.packages.len(), path.display());
        Ok(path)
    }

    /// Remove stale entries
    fn clear(&self) -> std::io::Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
