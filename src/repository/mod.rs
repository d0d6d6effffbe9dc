// src/repository/mod.rs

//! Remote RPM repositories
//!
//! This module provides functionality for:
//! - Addressing OBS project repositories and custom repository URLs
//! - Loading the package index (repomd.xml → primary.xml) with retries
//! - Caching reduced indexes on disk between runs
//! - Downloading binary packages with retry on connection resets

mod cache;
mod client;
mod download;
mod index;
mod metadata;
mod source;

pub mod parsers;

pub use cache::IndexCache;
pub use client::{Body, MAX_ATTEMPTS, RETRY_DELAY, RepositoryClient, RetryPolicy, Transport, classify_io_error};
pub use download::BinaryFetcher;
pub use index::{ArchFilter, DEFAULT_DENYLIST, PackageIndex, PackagePattern, PackageSet, SUPPORTED_ARCHES};
pub use metadata::{PackageRecord, PackageRecordBuilder, RecordError};
pub use source::{DEFAULT_BASE_URL, RepositorySource};
