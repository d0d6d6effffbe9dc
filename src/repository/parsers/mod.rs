// src/repository/parsers/mod.rs

//! Streaming parsers for rpm-md repository metadata
//!
//! - `repomd`: resolves `repodata/repomd.xml` to the primary package list
//! - `primary`: reduces the (large) primary.xml to package records
//!
//! Both are namespace-aware pull parsers over `quick_xml::NsReader`;
//! neither materializes the document.

pub mod primary;
pub mod repomd;

use crate::error::Error;
use crate::repository::client::classify_io_error;
use crate::repository::metadata::RecordError;
use quick_xml::events::BytesStart;
use std::fmt;

pub use primary::{COMMON_NS, parse_primary};
pub use repomd::{REPO_NS, primary_location};

/// A `<package>` entry that did not yield a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPackage {
    pub name: Option<String>,
    pub error: RecordError,
}

impl fmt::Display for RejectedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "package {}: {}", name, self.error),
            None => write!(f, "unnamed package: {}", self.error),
        }
    }
}

/// Map a parser failure; I/O errors from the underlying stream keep their transient class
pub(crate) fn xml_error(document: &str, e: quick_xml::Error) -> Error {
    match e {
        quick_xml::Error::Io(io_err) => classify_io_error(document, &io_err),
        other => Error::ParseError(format!("{}: {}", document, other)),
    }
}

/// Unescaped value of the attribute with local name `name`
pub(crate) fn attr_value(
    element: &BytesStart<'_>,
    name: &[u8],
    document: &str,
) -> Result<Option<String>, Error> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| xml_error(document, e.into()))?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| xml_error(document, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
