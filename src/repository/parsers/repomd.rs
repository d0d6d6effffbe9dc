// src/repository/parsers/repomd.rs

//! repomd.xml: the pointer to the current package list

use super::{attr_value, xml_error};
use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::io::BufRead;

pub const REPO_NS: &[u8] = b"http://linux.duke.edu/metadata/repo";

const DOCUMENT: &str = "repomd.xml";

/// Location (repository-relative) of the `primary` package list
pub fn primary_location<R: BufRead>(reader: R) -> Result<String> {
    let mut reader = NsReader::from_reader(reader);
    let mut buf = Vec::new();
    let mut in_primary = false;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| xml_error(DOCUMENT, e))?;
        let in_repo_ns = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == REPO_NS);

        match event {
            Event::Start(e) | Event::Empty(e) if in_repo_ns => match e.local_name().as_ref() {
                b"data" => {
                    in_primary = attr_value(&e, b"type", DOCUMENT)?.as_deref() == Some("primary");
                }
                b"location" if in_primary => {
                    if let Some(href) = attr_value(&e, b"href", DOCUMENT)? {
                        return Ok(href);
                    }
                }
                _ => {}
            },
            Event::End(e) if in_repo_ns && e.local_name().as_ref() == b"data" => {
                in_primary = false;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(Error::ParseError(format!(
        "{} does not reference a primary package list",
        DOCUMENT
    )))
}
