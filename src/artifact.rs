// src/artifact.rs

//! Mirroring a single artifact
//!
//! ```text
//! MATCH → SKIP-CHECK → FETCH → EXTRACT → RESOLVE-VERSION → DEPLOY
//!              │
//!              └→ SKIPPED (a jar with the package's build time is deployed)
//! ```
//!
//! Every download and extraction happens in a scratch directory of the
//! run's work dir that is removed once the artifact is done.

use crate::error::{Error, Result};
use crate::events::{EventSink, SyncEvent};
use crate::maven::{DeployedArtifact, RepositoryDeployer};
use crate::packages::{ArchiveExtractor, Coordinates, DescriptorResolver, jar_version, select_jar};
use crate::repository::{ArchFilter, BinaryFetcher, DEFAULT_DENYLIST, PackageIndex, PackagePattern};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default artifact architecture
pub const DEFAULT_ARCH: &str = "noarch";

/// Default Maven group
pub const DEFAULT_GROUP: &str = "suse";

/// One artifact to mirror, as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub artifact_id: String,
    /// Package file name token, see [`PackagePattern`]
    pub package: String,
    /// Regular expression narrowing the jar path inside the package
    pub jar: Option<String>,
    pub arch: String,
    pub group: String,
    pub repository: String,
}

impl ArtifactSpec {
    /// Spec with defaults: package named after the artifact, noarch, default group
    pub fn new(artifact_id: impl Into<String>, repository: impl Into<String>) -> Self {
        let artifact_id = artifact_id.into();
        Self {
            package: artifact_id.clone(),
            artifact_id,
            jar: None,
            arch: DEFAULT_ARCH.to_string(),
            group: DEFAULT_GROUP.to_string(),
            repository: repository.into(),
        }
    }

    pub fn package_pattern(&self) -> Result<PackagePattern> {
        PackagePattern::new(&self.package)
    }

    pub fn arch_filter(&self) -> ArchFilter {
        ArchFilter::for_arch(&self.arch)
    }
}

/// Group and version an artifact is deployed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub group: String,
    pub version: String,
}

impl ResolvedVersion {
    /// POM values first, then the jar file name, then the package version
    pub fn resolve(
        pom: Option<&Coordinates>,
        configured_group: &str,
        jar_version: Option<&str>,
        package_version: &str,
    ) -> Self {
        Self {
            group: pom
                .map(|c| c.group.clone())
                .unwrap_or_else(|| configured_group.to_string()),
            version: pom
                .map(|c| c.version.clone())
                .or_else(|| jar_version.map(str::to_string))
                .unwrap_or_else(|| package_version.to_string()),
        }
    }
}

/// Run-wide pipeline settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Look for group and version in the package's POM files
    pub parse_pom: bool,
    /// Package file name infixes never matched
    pub denylist: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parse_pom: false,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What processing an artifact did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deployed(DeployedArtifact),
    /// Same package generation already deployed
    Skipped,
}

/// Processes artifacts one at a time
pub struct ArtifactPipeline {
    fetcher: BinaryFetcher,
    extractor: ArchiveExtractor,
    deployer: RepositoryDeployer,
    work_dir: PathBuf,
    options: PipelineOptions,
}

impl ArtifactPipeline {
    pub fn new(
        fetcher: BinaryFetcher,
        extractor: ArchiveExtractor,
        deployer: RepositoryDeployer,
        work_dir: impl Into<PathBuf>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            deployer,
            work_dir: work_dir.into(),
            options,
        }
    }

    pub fn process(
        &self,
        spec: &ArtifactSpec,
        index: &mut PackageIndex,
        events: &dyn EventSink,
    ) -> Result<Outcome> {
        info!("Processing artifact {}", spec.artifact_id);
        let artifact = spec.artifact_id.as_str();

        // MATCH
        let pattern = spec.package_pattern()?;
        let repository = index.source().name().to_string();
        let record = index
            .ensure_loaded(events)?
            .locate(&pattern, &spec.arch_filter(), &self.options.denylist)
            .map_err(|e| match e {
                Error::AmbiguousMatch { candidates, .. } => Error::AmbiguousMatch {
                    what: format!("Found more than one file for {}", artifact),
                    candidates,
                },
                Error::NotFoundError(_) => Error::NotFoundError(format!(
                    "Found no file matching \"{}\" for {} in {}",
                    pattern, artifact, repository
                )),
                other => other,
            })?
            .clone();
        events.emit(SyncEvent::PackageMatched {
            artifact: artifact.to_string(),
            file_name: record.file_name().to_string(),
        });

        // SKIP-CHECK
        if self.deployer.has_generation(artifact, record.file_time())? {
            events.emit(SyncEvent::ArtifactSkipped {
                artifact: artifact.to_string(),
                file_time: record.file_time(),
            });
            return Ok(Outcome::Skipped);
        }

        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", artifact))
            .tempdir_in(&self.work_dir)
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to create work directory in {}: {}",
                    self.work_dir.display(),
                    e
                ))
            })?;

        // FETCH
        info!("Downloading {}", record.file_name());
        let package = self
            .fetcher
            .fetch(index.source(), &record, scratch.path(), events)?;

        // EXTRACT
        let entries = self.extractor.list(&package)?;
        let jar_entry = select_jar(&entries, artifact, spec.jar.as_deref(), record.file_name())?;
        events.emit(SyncEvent::JarSelected {
            artifact: artifact.to_string(),
            entry: jar_entry.path.clone(),
        });

        let pom = if self.options.parse_pom {
            DescriptorResolver::new(&self.extractor).resolve(
                &package,
                &entries,
                artifact,
                scratch.path(),
                events,
            )?
        } else {
            None
        };

        let jar = scratch.path().join(file_name(&jar_entry.path));
        self.extractor.extract(&package, &jar_entry.path, &jar)?;

        // RESOLVE-VERSION
        let resolved = ResolvedVersion::resolve(
            pom.as_ref(),
            &spec.group,
            jar_version(artifact, &jar_entry.path).as_deref(),
            record.version(),
        );

        // DEPLOY
        let deployed = self.deployer.deploy(
            artifact,
            &jar,
            &resolved.group,
            &resolved.version,
            record.file_time(),
            events,
        )?;

        Ok(Outcome::Deployed(deployed))
    }
}

fn file_name(entry: &str) -> &Path {
    Path::new(entry.rsplit('/').next().unwrap_or(entry))
}
