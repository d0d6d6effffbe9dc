// src/sync.rs

//! Batch runs over the configured artifacts
//!
//! Artifacts are processed in configuration order. A failing artifact is
//! logged and counted; the remaining ones are still processed. Package
//! indexes are shared by all artifacts of the same repository.

use crate::artifact::{ArtifactPipeline, ArtifactSpec, Outcome, PipelineOptions};
use crate::config::Config;
use crate::events::EventSink;
use crate::maven::RepositoryDeployer;
use crate::packages::{ArchiveBackend, ArchiveExtractor};
use crate::repository::{BinaryFetcher, IndexCache, PackageIndex, RetryPolicy, Transport};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Where a run reads and writes
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Root of the Maven repository to populate
    pub out: PathBuf,
    /// Index cache root, caching disabled when `None`
    pub cache_dir: Option<PathBuf>,
    /// Existing directory for downloads and scratch space
    pub work_dir: PathBuf,
    pub parse_pom: bool,
    pub retry: RetryPolicy,
}

/// Counts of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub deployed: Vec<String>,
    pub skipped: Vec<String>,
    /// Artifact and error message
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Process exit status for this run
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

/// Runs the pipeline over a list of artifacts
pub struct SyncRunner {
    pipeline: ArtifactPipeline,
    indexes: BTreeMap<String, PackageIndex>,
}

impl SyncRunner {
    pub fn new(pipeline: ArtifactPipeline, indexes: BTreeMap<String, PackageIndex>) -> Self {
        Self { pipeline, indexes }
    }

    /// Wire up indexes, fetcher, extractor and deployer for `config`
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn Transport>,
        backend: Arc<dyn ArchiveBackend>,
        settings: SyncSettings,
    ) -> Self {
        let indexes = config
            .repositories
            .iter()
            .map(|(name, source)| {
                let mut index = PackageIndex::new(source.clone(), transport.clone()).with_retry(settings.retry);
                if let Some(cache_dir) = &settings.cache_dir {
                    index = index.with_cache(IndexCache::new(cache_dir, name));
                }
                (name.clone(), index)
            })
            .collect();

        let pipeline = ArtifactPipeline::new(
            BinaryFetcher::new(transport).with_retry(settings.retry),
            ArchiveExtractor::new(backend, settings.work_dir.clone()),
            RepositoryDeployer::new(settings.out),
            settings.work_dir,
            PipelineOptions {
                parse_pom: settings.parse_pom,
                denylist: config.denylist.clone(),
            },
        );

        Self::new(pipeline, indexes)
    }

    /// Process `artifacts`, restricted to the names in `only` when it is not empty
    pub fn run(&mut self, artifacts: &[ArtifactSpec], only: &[String], events: &dyn EventSink) -> RunSummary {
        let mut summary = RunSummary::default();

        for name in only {
            if !artifacts.iter().any(|a| &a.artifact_id == name) {
                error!("Artifact {} is not configured", name);
                summary
                    .failed
                    .push((name.clone(), "not configured".to_string()));
            }
        }

        let selected = artifacts
            .iter()
            .filter(|a| only.is_empty() || only.contains(&a.artifact_id));

        for spec in selected {
            let Some(index) = self.indexes.get_mut(&spec.repository) else {
                error!("Missing repository definition: {}", spec.repository);
                summary
                    .failed
                    .push((spec.artifact_id.clone(), format!("unknown repository {}", spec.repository)));
                continue;
            };

            match self.pipeline.process(spec, index, events) {
                Ok(Outcome::Deployed(_)) => summary.deployed.push(spec.artifact_id.clone()),
                Ok(Outcome::Skipped) => summary.skipped.push(spec.artifact_id.clone()),
                Err(e) => {
                    error!("Failed to process artifact {}: {}", spec.artifact_id, e);
                    summary.failed.push((spec.artifact_id.clone(), e.to_string()));
                }
            }
        }

        info!(
            "{} deployed, {} skipped, {} failed",
            summary.deployed.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_exit_code() {
        let mut summary = RunSummary::default();
        summary.skipped.push("foo".to_string());
        assert_eq!(summary.exit_code(), 0);

        summary.failed.push(("bar".to_string(), "boom".to_string()));
        assert!(!summary.is_success());
        assert_eq!(summary.exit_code(), 1);
    }
}
