// src/repository/download.rs

//! Binary package download
//!
//! A package is streamed to `<dest_dir>/<file name>.part` and renamed into
//! place once complete, so an interrupted transfer never leaves a file that
//! looks like a finished download. The file then takes the record's build
//! time as its modification time; the skip check compares against it.

use crate::error::{Error, Result};
use crate::events::EventSink;
use crate::repository::client::{RetryPolicy, Transport, classify_io_error};
use crate::repository::metadata::PackageRecord;
use crate::repository::source::RepositorySource;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Downloads binaries, retrying only when the connection drops mid-transfer
pub struct BinaryFetcher {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl BinaryFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Download `record` from `source` into `dest_dir`
    pub fn fetch(
        &self,
        source: &RepositorySource,
        record: &PackageRecord,
        dest_dir: &Path,
        events: &dyn EventSink,
    ) -> Result<PathBuf> {
        let url = source.url_for(record.location());
        let dest_path = dest_dir.join(record.file_name());
        let operation = format!("Downloading {}", record.file_name());

        self.retry.run(
            &operation,
            events,
            |e| matches!(e, Error::ConnectionReset(_)),
            || self.download_once(&url, &dest_path),
        )?;

        if !dest_path.is_file() {
            return Err(Error::NotFoundError(format!(
                "Failed to download {}",
                record.file_name()
            )));
        }

        let mtime = i64::try_from(record.file_time()).map_err(|_| {
            Error::ParseError(format!("{}: file time {} out of range", record.file_name(), record.file_time()))
        })?;
        filetime::set_file_mtime(&dest_path, FileTime::from_unix_time(mtime, 0))
            .map_err(|e| Error::IoError(format!("Failed to set mtime on {}: {}", dest_path.display(), e)))?;

        debug!("Downloaded {} to {}", url, dest_path.display());
        Ok(dest_path)
    }

    fn download_once(&self, url: &str, dest_path: &Path) -> Result<()> {
        let mut body = self.transport.open(url)?;

        let part_path = part_path(dest_path);
        let result = (|| -> Result<()> {
            let file = File::create(&part_path).map_err(|e| {
                Error::IoError(format!("Failed to create {}: {}", part_path.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            copy_body(url, &mut body, &mut writer, &part_path)?;
            writer
                .flush()
                .map_err(|e| Error::IoError(format!("Failed to write {}: {}", part_path.display(), e)))
        })();

        match result {
            Ok(()) => {
                fs::rename(&part_path, dest_path)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&part_path);
                Err(e)
            }
        }
    }
}

/// Like `io::copy`, but read failures are network errors and write failures local ones
fn copy_body(url: &str, body: &mut dyn Read, writer: &mut dyn Write, path: &Path) -> Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(classify_io_error(url, &e)),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
        total += n as u64;
    }
}

fn part_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
