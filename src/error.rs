// src/error.rs

//! Error types for the synchronization pipeline

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while indexing, fetching, extracting or deploying
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A package, jar, descriptor or remote document does not exist
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// More than one candidate where exactly one was expected
    #[error("{what}:\n  {}", .candidates.join("\n  "))]
    AmbiguousMatch {
        what: String,
        candidates: Vec<String>,
    },

    /// Transient network failure (connect, timeout, HTTP 5xx)
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Connection reset or aborted mid-transfer
    #[error("Connection reset: {0}")]
    ConnectionReset(String),

    /// The package list referenced by repomd.xml vanished before it could be fetched
    #[error("Repository metadata changed while fetching {0}")]
    MetadataChanged(String),

    /// The unpack tooling exited with a failure status
    #[error("Failed to extract {entry}: {output}")]
    ExtractionFailed { entry: String, output: String },

    /// A required external program is not installed
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Malformed document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    IoError(String),

    /// Reading or writing the index cache failed
    #[error("Cache error: {0}")]
    CacheError(String),
}

impl Error {
    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::DownloadError(_) | Error::ConnectionReset(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_match_lists_candidates() {
        let err = Error::AmbiguousMatch {
            what: "Found more than one file for foo".to_string(),
            candidates: vec!["foo-1.0-1.noarch.rpm".to_string(), "foo-debug-1.0-1.noarch.rpm".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Found more than one file for foo"));
        assert!(msg.contains("\n  foo-1.0-1.noarch.rpm"));
        assert!(msg.contains("\n  foo-debug-1.0-1.noarch.rpm"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::DownloadError("timeout".into()).is_transient());
        assert!(Error::ConnectionReset("reset".into()).is_transient());
        assert!(!Error::NotFoundError("x".into()).is_transient());
        assert!(!Error::MetadataChanged("x".into()).is_transient());
    }
}
