// src/repository/index.rs

//! Package index of a single repository
//!
//! The index keeps the latest record per package name, restricted to the
//! architectures a Java artifact can come from. It is loaded lazily the
//! first time an artifact from the repository is processed, then reused
//! for every later artifact of the run.

use crate::compression::{CompressionError, stream_decoder};
use crate::error::{Error, Result};
use crate::events::{EventSink, SyncEvent};
use crate::repository::cache::IndexCache;
use crate::repository::client::{RetryPolicy, Transport, classify_io_error};
use crate::repository::metadata::PackageRecord;
use crate::repository::parsers::{parse_primary, primary_location};
use crate::repository::source::RepositorySource;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::io::BufReader;
use std::sync::Arc;
use tracing::debug;

/// Architectures kept in the index
pub const SUPPORTED_ARCHES: &[&str] = &["x86_64", "noarch"];

/// Package file names containing one of these are never matched
pub const DEFAULT_DENYLIST: &[&str] = &["javadoc", "examples", "manual", "test", "demo"];

const REPOMD_PATH: &str = "repodata/repomd.xml";

/// Anchored pattern over package file names
///
/// A token ending with `-` is taken as is. Any other token gets `-[0-9]`
/// appended, so `foo` matches `foo-1.0-1.noarch.rpm` but not
/// `foo-bar-1.0-1.noarch.rpm`.
#[derive(Debug, Clone)]
pub struct PackagePattern {
    source: String,
    regex: Regex,
}

impl PackagePattern {
    pub fn new(token: &str) -> Result<Self> {
        let source = if token.ends_with('-') {
            token.to_string()
        } else {
            format!("{}-[0-9]", token)
        };
        let regex = Regex::new(&format!("^(?:{})", source))
            .map_err(|e| Error::ConfigError(format!("Invalid package pattern '{}': {}", token, e)))?;
        Ok(Self { source, regex })
    }

    pub fn is_match(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for PackagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Which indexed architectures an artifact may come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchFilter {
    /// Any indexed architecture
    Any,
    /// The named architecture, or noarch
    Only(String),
}

impl ArchFilter {
    /// Filter for a configured artifact arch; `noarch` places no restriction
    pub fn for_arch(arch: &str) -> Self {
        if arch == "noarch" {
            ArchFilter::Any
        } else {
            ArchFilter::Only(arch.to_string())
        }
    }

    pub fn accepts(&self, arch: &str) -> bool {
        match self {
            ArchFilter::Any => true,
            ArchFilter::Only(wanted) => arch == wanted || arch == "noarch",
        }
    }
}

/// Latest record per package name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    packages: BTreeMap<String, PackageRecord>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = PackageRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.offer(record);
        }
        set
    }

    /// Keep `record` if its name is new or it is strictly newer than the
    /// record held. Returns whether it was kept.
    pub fn offer(&mut self, record: PackageRecord) -> bool {
        match self.packages.get(record.name()) {
            Some(existing) if !record.is_newer_than(existing) => false,
            _ => {
                self.packages.insert(record.name().to_string(), record);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.packages.values()
    }

    /// The single record whose file name matches `pattern`
    pub fn locate(
        &self,
        pattern: &PackagePattern,
        arch: &ArchFilter,
        denylist: &[String],
    ) -> Result<&PackageRecord> {
        let matches: Vec<&PackageRecord> = self
            .iter()
            .filter(|r| arch.accepts(r.arch()))
            .filter(|r| !denylist.iter().any(|infix| r.file_name().contains(infix.as_str())))
            .filter(|r| pattern.is_match(r.file_name()))
            .collect();

        match matches.as_slice() {
            [record] => Ok(record),
            [] => Err(Error::NotFoundError(format!(
                "no file matching \"{}\"",
                pattern
            ))),
            _ => Err(Error::AmbiguousMatch {
                what: format!("Found more than one file matching \"{}\"", pattern),
                candidates: matches.iter().map(|r| r.file_name().to_string()).collect(),
            }),
        }
    }
}

/// Lazily loaded index of one repository
pub struct PackageIndex {
    source: RepositorySource,
    transport: Arc<dyn Transport>,
    cache: Option<IndexCache>,
    retry: RetryPolicy,
    packages: Option<PackageSet>,
}

impl PackageIndex {
    pub fn new(source: RepositorySource, transport: Arc<dyn Transport>) -> Self {
        Self {
            source,
            transport,
            cache: None,
            retry: RetryPolicy::default(),
            packages: None,
        }
    }

    /// Persist reduced indexes under `<cache_root>/<repository name>`
    pub fn with_cache(mut self, cache: IndexCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn source(&self) -> &RepositorySource {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.packages.is_some()
    }

    /// Load the index if this is the first use in the run
    pub fn ensure_loaded(&mut self, events: &dyn EventSink) -> Result<&PackageSet> {
        if self.packages.is_none() {
            let retry = self.retry;
            let operation = format!("Loading index of {}", self.source.name());
            let (set, from_cache) = retry.run(
                &operation,
                events,
                |e| e.is_transient() || matches!(e, Error::MetadataChanged(_)),
                || self.load_once(events),
            )?;

            events.emit(SyncEvent::IndexLoaded {
                repository: self.source.name().to_string(),
                packages: set.len(),
                from_cache,
            });
            self.packages = Some(set);
        }

        self.packages
            .as_ref()
            .ok_or_else(|| Error::NotFoundError(format!("index of {}", self.source.name())))
    }

    /// One attempt: resolve the package list, then read it from cache or network
    fn load_once(&self, events: &dyn EventSink) -> Result<(PackageSet, bool)> {
        let href = self.resolve_primary()?;

        if let Some(cache) = &self.cache {
            match cache.load(&href) {
                Ok(Some(records)) => return Ok((PackageSet::from_records(records), true)),
                Ok(None) => {}
                Err(e) => self.cache_unavailable(events, &e),
            }
        }

        let set = self.fetch_primary(&href, events)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&href, set.iter()) {
                self.cache_unavailable(events, &e);
            }
        }

        Ok((set, false))
    }

    fn cache_unavailable(&self, events: &dyn EventSink, e: &Error) {
        events.emit(SyncEvent::CacheUnavailable {
            repository: self.source.name().to_string(),
            message: e.to_string(),
        });
    }

    /// Location of the package list currently published by the repository
    fn resolve_primary(&self) -> Result<String> {
        let url = self.source.url_for(REPOMD_PATH);
        debug!("Parsing {}", url);
        let body = self.transport.open(&url)?;
        primary_location(BufReader::new(body))
    }

    fn fetch_primary(&self, href: &str, events: &dyn EventSink) -> Result<PackageSet> {
        let url = self.source.url_for(href);
        debug!("Parsing primary {}", url);

        // repomd.xml pointed here, so a 404 means a publish happened in between
        let body = self.transport.open(&url).map_err(|e| match e {
            Error::NotFoundError(_) => Error::MetadataChanged(url.clone()),
            other => other,
        })?;
        let reader = stream_decoder(body, href).map_err(|e| match e {
            CompressionError::Peek(io_err) => classify_io_error(&url, &io_err),
            other => Error::ParseError(format!("{}: {}", url, other)),
        })?;

        let mut set = PackageSet::new();
        parse_primary(reader, |entry| match entry {
            Ok(record) if SUPPORTED_ARCHES.contains(&record.arch()) => {
                set.offer(record);
            }
            Ok(_) => {}
            Err(rejected) => events.emit(SyncEvent::PackageRejected {
                repository: self.source.name().to_string(),
                reason: rejected.to_string(),
            }),
        })?;

        Ok(set)
    }
}
