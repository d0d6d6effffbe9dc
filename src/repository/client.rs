// src/repository/client.rs

//! HTTP access to OBS repositories
//!
//! Network access goes through the [`Transport`] trait so index loading and
//! binary downloads can be exercised against in-memory fixtures.
//! [`RepositoryClient`] is the reqwest-backed implementation. Retrying is
//! the caller's business and is expressed with a [`RetryPolicy`], since the
//! index and the binary fetcher retry on different error classes.

use crate::error::{Error, Result};
use crate::events::{EventSink, SyncEvent};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::io::{self, Read};
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (60 seconds, package lists can be large)
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum attempts for a retried operation, first try included
pub const MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Streaming response body
pub type Body = Box<dyn Read>;

/// Source of remote documents and binaries
///
/// Implementations map a missing resource (HTTP 404) to
/// [`Error::NotFoundError`], interrupted transfers to
/// [`Error::ConnectionReset`] and other transient failures to
/// [`Error::DownloadError`].
pub trait Transport: Send + Sync {
    /// Open a streaming reader over the resource at `url`
    fn open(&self, url: &str) -> Result<Body>;
}

/// Fixed-delay retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: MAX_ATTEMPTS,
            delay: RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy without any pause between attempts
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            delay: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails with an error `retryable` rejects,
    /// or the attempts are used up. The last error is returned as is.
    pub fn run<T>(
        &self,
        operation: &str,
        events: &dyn EventSink,
        retryable: impl Fn(&Error) -> bool,
        mut op: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts && retryable(&e) => {
                    events.emit(SyncEvent::RetryScheduled {
                        operation: operation.to_string(),
                        attempt,
                        error: e.to_string(),
                    });
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_reset_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

/// Whether an io::Error anywhere in the chain is a reset-class failure
fn chain_has_reset(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if is_reset_kind(io_err.kind()) {
                return true;
            }
            if let Some(inner) = io_err.get_ref() {
                if chain_has_reset(inner) {
                    return true;
                }
            }
        }
        current = e.source();
    }
    false
}

/// Classify an I/O failure raised while reading the response body of `url`
///
/// Only network streams, and decoders layered on them, are classified here.
/// reqwest surfaces body timeouts and other transfer failures as
/// `ErrorKind::Other`, so anything that is neither reset-class nor a
/// decoding failure counts as a transient download error. Local
/// filesystem failures stay [`Error::IoError`] at their call sites.
pub fn classify_io_error(url: &str, e: &io::Error) -> Error {
    if chain_has_reset(e) {
        Error::ConnectionReset(format!("{}: {}", url, e))
    } else if matches!(e.kind(), io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput) {
        Error::ParseError(format!("{}: {}", url, e))
    } else {
        Error::DownloadError(format!("{}: {}", url, e))
    }
}

fn classify_request_error(url: &str, e: reqwest::Error) -> Error {
    if chain_has_reset(&e) {
        Error::ConnectionReset(format!("Failed to fetch {}: {}", url, e))
    } else {
        Error::DownloadError(format!("Failed to fetch {}: {}", url, e))
    }
}

/// Blocking HTTP client for OBS download servers
pub struct RepositoryClient {
    client: Client,
}

impl RepositoryClient {
    /// Create a new repository client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("obs-to-maven/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Transport for RepositoryClient {
    fn open(&self, url: &str) -> Result<Body> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFoundError(format!("HTTP 404 from {}", url)));
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::DownloadError(format!("HTTP {} from {}", status, url)));
        }
        if !status.is_success() {
            return Err(Error::NotFoundError(format!("HTTP {} from {}", status, url)));
        }

        Ok(Box::new(response))
    }
}
