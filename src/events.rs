// src/events.rs

//! Structured diagnostics emitted by the synchronization pipeline
//!
//! Components never log directly for the outcomes an operator cares about
//! (dropped records, cache fallbacks, retries, skips, metadata rewrites).
//! They report a [`SyncEvent`] to an [`EventSink`] passed in by the caller.
//!
//! Implementations:
//! - `LogEvents`: forwards every event to `tracing`
//! - `RecordingEvents`: keeps events in memory so tests can assert on them

use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// A diagnostic produced by one of the pipeline components
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A package entry in the package list lacked a required field
    PackageRejected { repository: String, reason: String },
    /// The package index for a repository is ready
    IndexLoaded {
        repository: String,
        packages: usize,
        from_cache: bool,
    },
    /// Reading or writing the index cache failed; processing continues without it
    CacheUnavailable { repository: String, message: String },
    /// An operation failed transiently and will be attempted again
    RetryScheduled {
        operation: String,
        attempt: u32,
        error: String,
    },
    /// A package was selected for an artifact
    PackageMatched { artifact: String, file_name: String },
    /// A deployed jar already carries the package's file time
    ArtifactSkipped { artifact: String, file_time: u64 },
    /// The jar entry chosen inside the package
    JarSelected { artifact: String, entry: String },
    /// Coordinates recovered from an embedded POM
    DescriptorResolved {
        artifact: String,
        group: String,
        version: String,
    },
    /// An embedded POM could not be read and was ignored
    DescriptorIgnored { entry: String, reason: String },
    /// An existing maven-metadata-local.xml was discarded and rewritten
    MetadataRegenerated { path: PathBuf, reason: String },
    /// The artifact was written into the Maven repository
    ArtifactDeployed {
        artifact: String,
        group: String,
        version: String,
        path: PathBuf,
    },
}

/// Receiver for pipeline diagnostics
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SyncEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEvents;

impl EventSink for LogEvents {
    fn emit(&self, event: SyncEvent) {
        match event {
            SyncEvent::PackageRejected { repository, reason } => {
                warn!("{}: ignoring package: {}", repository, reason);
            }
            SyncEvent::IndexLoaded {
                repository,
                packages,
                from_cache,
            } => {
                let source = if from_cache { "cache" } else { "repository" };
                info!("{}: {} packages loaded from {}", repository, packages, source);
            }
            SyncEvent::CacheUnavailable {
                repository,
                message,
            } => {
                warn!("{}: index cache unavailable: {}", repository, message);
            }
            SyncEvent::RetryScheduled {
                operation,
                attempt,
                error,
            } => {
                warn!("{} attempt {} failed: {}, retrying...", operation, attempt, error);
            }
            SyncEvent::PackageMatched {
                artifact,
                file_name,
            } => {
                debug!("{}: matched package {}", artifact, file_name);
            }
            SyncEvent::ArtifactSkipped {
                artifact,
                file_time,
            } => {
                info!("Skipping artifact {} (already deployed, mtime {})", artifact, file_time);
            }
            SyncEvent::JarSelected { artifact, entry } => {
                debug!("{}: extracting {}", artifact, entry);
            }
            SyncEvent::DescriptorResolved {
                artifact,
                group,
                version,
            } => {
                info!("Maven identifier is {}:{}:{}", group, artifact, version);
            }
            SyncEvent::DescriptorIgnored { entry, reason } => {
                debug!("Ignoring pom {}: {}", entry, reason);
            }
            SyncEvent::MetadataRegenerated { path, reason } => {
                warn!("Invalid metadata file {} ({}): creating a new one", path.display(), reason);
            }
            SyncEvent::ArtifactDeployed {
                artifact,
                group,
                version,
                path,
            } => {
                info!("Deployed {}:{}:{} to {}", group, artifact, version, path.display());
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Whether any recorded event satisfies `predicate`
    pub fn any(&self, predicate: impl Fn(&SyncEvent) -> bool) -> bool {
        self.events().iter().any(predicate)
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: SyncEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_events_keeps_order() {
        let sink = RecordingEvents::new();
        sink.emit(SyncEvent::ArtifactSkipped {
            artifact: "a".to_string(),
            file_time: 1,
        });
        sink.emit(SyncEvent::JarSelected {
            artifact: "a".to_string(),
            entry: "/usr/share/java/a.jar".to_string(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SyncEvent::ArtifactSkipped { .. }));
        assert!(sink.any(|e| matches!(e, SyncEvent::JarSelected { entry, .. } if entry.ends_with("a.jar"))));
    }
}
