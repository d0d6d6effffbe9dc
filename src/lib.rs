// src/lib.rs

//! obs-to-maven
//!
//! Mirrors jars shipped inside RPM packages of Open Build Service
//! repositories into a local Maven repository.
//!
//! # Architecture
//!
//! - `repository`: package index (repomd.xml → primary.xml), index cache, downloads
//! - `packages`: unpacking RPMs, jar selection, POM coordinates
//! - `maven`: repository layout, deployment, `maven-metadata-local.xml`
//! - `artifact`: the per-artifact pipeline
//! - `sync`: batch runs with per-artifact failure isolation
//!
//! Re-running against the same output is cheap: an artifact whose package
//! build time matches an already deployed jar is skipped before download.

pub mod artifact;
pub mod compression;
pub mod config;
mod error;
pub mod events;
pub mod maven;
pub mod packages;
pub mod repository;
pub mod sync;
pub mod version;

pub use artifact::{ArtifactPipeline, ArtifactSpec, Outcome, PipelineOptions, ResolvedVersion};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{EventSink, LogEvents, RecordingEvents, SyncEvent};
pub use sync::{RunSummary, SyncRunner, SyncSettings};
pub use version::RpmVersion;
