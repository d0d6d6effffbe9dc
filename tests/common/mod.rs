// tests/common/mod.rs

//! Shared test utilities for integration tests.
//!
//! `FakeObs` serves repository metadata and binaries from memory and
//! doubles as the archive backend, so a whole run can be exercised
//! without network access or the rpm tools.

#![allow(dead_code)]

use obs_maven::packages::{ArchiveBackend, ArchiveEntry};
use obs_maven::repository::{Body, RetryPolicy, Transport};
use obs_maven::{Config, Error, Result, SyncRunner, SyncSettings};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use walkdir::WalkDir;

pub const BASE_URL: &str = "http://obs.test/repo";

/// A binary package published by the fake repository
#[derive(Debug, Clone)]
pub struct FakePackage {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub file_time: u64,
    pub files: Vec<(ArchiveEntry, Vec<u8>)>,
}

impl FakePackage {
    pub fn new(name: &str, version: &str, release: &str, file_time: u64) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            release: release.to_string(),
            arch: "noarch".to_string(),
            file_time,
            files: Vec::new(),
        }
    }

    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.push((ArchiveEntry::file(path), content.to_vec()));
        self
    }

    pub fn link(mut self, path: &str, target: &str) -> Self {
        self.files.push((ArchiveEntry::link(path, target), Vec::new()));
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}-{}.{}.rpm", self.name, self.version, self.release, self.arch)
    }

    fn location(&self) -> String {
        format!("{}/{}", self.arch, self.file_name())
    }

    fn primary_entry(&self) -> String {
        format!(
            r#"<package type="rpm"><name>{}</name><arch>{}</arch><version epoch="0" ver="{}" rel="{}"/><time file="{}" build="{}"/><location href="{}"/></package>"#,
            self.name,
            self.arch,
            self.version,
            self.release,
            self.file_time,
            self.file_time,
            self.location()
        )
    }
}

#[derive(Default)]
struct State {
    documents: HashMap<String, Vec<u8>>,
    packages: HashMap<String, FakePackage>,
    requests: Vec<String>,
    generation: u32,
}

/// In-memory OBS repository and rpm tooling
#[derive(Default)]
pub struct FakeObs {
    state: Mutex<State>,
}

impl FakeObs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace the published package set, as a new OBS publish would
    pub fn publish(&self, packages: &[FakePackage]) {
        let mut state = self.state.lock().unwrap();
        state.generation += 1;
        state.documents.clear();

        let primary_href = format!("repodata/{:04}-primary.xml.gz", state.generation);
        let repomd = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<repomd xmlns="http://linux.duke.edu/metadata/repo"><data type="primary"><location href="{}"/></data></repomd>"#,
            primary_href
        );
        let primary = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://linux.duke.edu/metadata/common" packages="{}">{}</metadata>"#,
            packages.len(),
            packages.iter().map(FakePackage::primary_entry).collect::<String>()
        );
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(primary.as_bytes()).unwrap();

        state
            .documents
            .insert(format!("{}/repodata/repomd.xml", BASE_URL), repomd.into_bytes());
        state
            .documents
            .insert(format!("{}/{}", BASE_URL, primary_href), encoder.finish().unwrap());
        for package in packages {
            state.documents.insert(
                format!("{}/{}", BASE_URL, package.location()),
                package.file_name().into_bytes(),
            );
            state.packages.insert(package.file_name(), package.clone());
        }
    }

    /// Number of requests for URLs ending with `suffix`
    pub fn requests_ending_with(&self, suffix: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.requests.iter().filter(|u| u.ends_with(suffix)).count()
    }

    fn package_for(&self, path: &Path) -> Result<FakePackage> {
        let content = fs::read_to_string(path)?;
        let state = self.state.lock().unwrap();
        state
            .packages
            .get(content.trim())
            .cloned()
            .ok_or_else(|| Error::ExtractionFailed {
                entry: path.display().to_string(),
                output: "not an rpm".to_string(),
            })
    }
}

impl Transport for FakeObs {
    fn open(&self, url: &str) -> Result<Body> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(url.to_string());
        match state.documents.get(url) {
            Some(data) => Ok(Box::new(Cursor::new(data.clone()))),
            None => Err(Error::NotFoundError(format!("HTTP 404 from {}", url))),
        }
    }
}

impl ArchiveBackend for FakeObs {
    fn list_entries(&self, package: &Path) -> Result<Vec<ArchiveEntry>> {
        Ok(self
            .package_for(package)?
            .files
            .into_iter()
            .map(|(entry, _)| entry)
            .collect())
    }

    fn extract_entry(&self, package: &Path, entry: &str, scratch_dir: &Path) -> Result<PathBuf> {
        let package = self.package_for(package)?;
        let (_, content) = package
            .files
            .iter()
            .find(|(e, _)| e.path == entry && !e.is_link())
            .ok_or_else(|| Error::ExtractionFailed {
                entry: entry.to_string(),
                output: "cpio: not found in archive".to_string(),
            })?;
        let path = scratch_dir.join(entry.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, content)?;
        Ok(path)
    }
}

/// Output, cache and work directories of one test
pub struct Workspace {
    pub out: TempDir,
    pub cache: TempDir,
    pub work: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            out: TempDir::new().unwrap(),
            cache: TempDir::new().unwrap(),
            work: TempDir::new().unwrap(),
        }
    }

    pub fn runner(&self, obs: &Arc<FakeObs>, config: &Config, parse_pom: bool) -> SyncRunner {
        SyncRunner::from_config(
            config,
            obs.clone(),
            obs.clone(),
            SyncSettings {
                out: self.out.path().to_path_buf(),
                cache_dir: Some(self.cache.path().to_path_buf()),
                work_dir: self.work.path().to_path_buf(),
                parse_pom,
                retry: RetryPolicy::immediate(3),
            },
        )
    }

    pub fn out(&self, relative: &str) -> PathBuf {
        self.out.path().join(relative)
    }
}

/// Configuration with a single custom-URL repository named `obs`
pub fn config(artifacts_yaml: &str) -> Config {
    Config::from_yaml(&format!(
        "repositories:\n  obs:\n    url: {}\nartifacts:\n{}",
        BASE_URL, artifacts_yaml
    ))
    .unwrap()
}

/// Every file under `root` with its contents and mtime seconds, keyed by relative path
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, (Vec<u8>, i64)> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let mtime = filetime::FileTime::from_last_modification_time(&entry.metadata().unwrap());
            (
                entry.path().strip_prefix(root).unwrap().to_path_buf(),
                (fs::read(entry.path()).unwrap(), mtime.unix_seconds()),
            )
        })
        .collect()
}
