// src/packages/extract.rs

//! Pulling single entries out of downloaded RPMs
//!
//! Unpacking is delegated to the platform tools (`rpm2cpio | cpio`) through
//! the [`ArchiveBackend`] trait. [`ArchiveExtractor`] owns the scratch
//! directory handling: every extraction gets a fresh directory under the
//! run's work dir, removed again whether the extraction worked or not.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::debug;

/// A file listed in a package payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Absolute path inside the package, e.g. `/usr/share/java/foo.jar`
    pub path: String,
    /// Target when the entry is a symbolic link
    pub link_target: Option<String>,
}

impl ArchiveEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            link_target: None,
        }
    }

    pub fn link(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            link_target: Some(target.into()),
        }
    }

    pub fn is_link(&self) -> bool {
        self.link_target.is_some()
    }
}

/// Listing and unpacking of binary packages
pub trait ArchiveBackend: Send + Sync {
    /// Every file of the payload, with link targets
    fn list_entries(&self, package: &Path) -> Result<Vec<ArchiveEntry>>;

    /// Unpack `entry` below `scratch_dir`, keeping its path; returns the unpacked file
    fn extract_entry(&self, package: &Path, entry: &str, scratch_dir: &Path) -> Result<PathBuf>;
}

/// Spawn `program`, mapping a missing executable to [`Error::ToolNotFound`]
fn spawn(command: &mut Command, program: &str) -> Result<std::process::Child> {
    command.spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::ToolNotFound(format!("{} (is it installed?)", program))
        } else {
            Error::IoError(format!("Failed to run {}: {}", program, e))
        }
    })
}

/// Backend driving `rpm`, `rpm2cpio` and `cpio`
#[derive(Debug, Default, Clone, Copy)]
pub struct RpmCpioBackend;

impl RpmCpioBackend {
    const QUERY_FORMAT: &'static str = "[%{FILENAMES}\t%{FILELINKTOS}\n]";

    /// Parse `rpm -qp --queryformat` output in [`Self::QUERY_FORMAT`]
    pub fn parse_file_list(output: &str) -> Vec<ArchiveEntry> {
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| match line.split_once('\t') {
                Some((path, target)) if !target.trim().is_empty() => {
                    ArchiveEntry::link(path, target.trim())
                }
                Some((path, _)) => ArchiveEntry::file(path),
                None => ArchiveEntry::file(line),
            })
            .collect()
    }
}

impl ArchiveBackend for RpmCpioBackend {
    fn list_entries(&self, package: &Path) -> Result<Vec<ArchiveEntry>> {
        debug!("Listing files of {}", package.display());

        let child = spawn(
            Command::new("rpm")
                .arg("-qp")
                .args(["--queryformat", Self::QUERY_FORMAT])
                .arg(package)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped()),
            "rpm",
        )?;
        let output = child
            .wait_with_output()
            .map_err(|e| Error::IoError(format!("Failed to run rpm: {}", e)))?;

        if !output.status.success() {
            return Err(Error::ExtractionFailed {
                entry: package.display().to_string(),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Self::parse_file_list(&String::from_utf8_lossy(&output.stdout)))
    }

    fn extract_entry(&self, package: &Path, entry: &str, scratch_dir: &Path) -> Result<PathBuf> {
        let relative = entry.trim_start_matches('/');

        let mut rpm2cpio = spawn(
            Command::new("rpm2cpio")
                .arg(package)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped()),
            "rpm2cpio",
        )?;
        let payload = rpm2cpio.stdout.take().ok_or_else(|| {
            Error::IoError("rpm2cpio did not provide an output pipe".to_string())
        })?;

        let cpio = spawn(
            Command::new("cpio")
                .args(["-id", "--quiet"])
                .arg(format!("./{}", relative))
                .current_dir(scratch_dir)
                .stdin(payload)
                .stdout(Stdio::null())
                .stderr(Stdio::piped()),
            "cpio",
        );
        let cpio = match cpio {
            Ok(child) => child,
            Err(e) => {
                let _ = rpm2cpio.kill();
                let _ = rpm2cpio.wait();
                return Err(e);
            }
        };

        let cpio_output = cpio
            .wait_with_output()
            .map_err(|e| Error::IoError(format!("Failed to run cpio: {}", e)))?;
        let rpm2cpio_output = rpm2cpio
            .wait_with_output()
            .map_err(|e| Error::IoError(format!("Failed to run rpm2cpio: {}", e)))?;

        if !rpm2cpio_output.status.success() {
            return Err(Error::ExtractionFailed {
                entry: entry.to_string(),
                output: String::from_utf8_lossy(&rpm2cpio_output.stderr).trim().to_string(),
            });
        }
        if !cpio_output.status.success() {
            return Err(Error::ExtractionFailed {
                entry: entry.to_string(),
                output: String::from_utf8_lossy(&cpio_output.stderr).trim().to_string(),
            });
        }

        Ok(scratch_dir.join(relative))
    }
}

/// Extracts entries into caller-chosen destinations
#[derive(Clone)]
pub struct ArchiveExtractor {
    backend: Arc<dyn ArchiveBackend>,
    work_dir: PathBuf,
}

impl ArchiveExtractor {
    /// `work_dir` holds the per-call scratch directories; it must exist
    pub fn new(backend: Arc<dyn ArchiveBackend>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            work_dir: work_dir.into(),
        }
    }

    pub fn list(&self, package: &Path) -> Result<Vec<ArchiveEntry>> {
        self.backend.list_entries(package)
    }

    /// Copy the bytes of `entry` to `dest`
    pub fn extract(&self, package: &Path, entry: &str, dest: &Path) -> Result<PathBuf> {
        let scratch = tempfile::Builder::new()
            .prefix("extract-")
            .tempdir_in(&self.work_dir)
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to create scratch directory in {}: {}",
                    self.work_dir.display(),
                    e
                ))
            })?;

        let unpacked = self.backend.extract_entry(package, entry, scratch.path())?;
        if !unpacked.is_file() {
            return Err(Error::ExtractionFailed {
                entry: entry.to_string(),
                output: format!("{} is not part of {}", entry, package.display()),
            });
        }

        debug!("extracting {} to {}", entry, dest.display());
        fs::copy(&unpacked, dest).map_err(|e| {
            Error::IoError(format!("Failed to copy {} to {}: {}", entry, dest.display(), e))
        })?;

        Ok(dest.to_path_buf())
    }
}
