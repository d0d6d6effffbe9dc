// src/repository/parsers/primary.rs

//! primary.xml: the package list of an rpm-md repository
//!
//! The document lists every binary in the repository and can be tens of
//! megabytes once decompressed, so it is consumed as an event stream. Each
//! `<package>` is reduced into a [`PackageRecordBuilder`] and handed to the
//! caller as soon as its end tag is seen.

use super::{RejectedPackage, attr_value, xml_error};
use crate::error::Result;
use crate::repository::metadata::{PackageRecord, PackageRecordBuilder};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::io::BufRead;

pub const COMMON_NS: &[u8] = b"http://linux.duke.edu/metadata/common";

const DOCUMENT: &str = "primary.xml";

#[derive(Debug, Clone, Copy)]
enum TextField {
    Name,
    Arch,
}

/// Copy the attributes of `<version>`, `<time>` and `<location>` into `builder`
fn apply_attributes(builder: &mut PackageRecordBuilder, element: &BytesStart<'_>) -> Result<()> {
    match element.local_name().as_ref() {
        b"version" => {
            if let Some(epoch) = attr_value(element, b"epoch", DOCUMENT)? {
                builder.epoch(epoch);
            }
            if let Some(ver) = attr_value(element, b"ver", DOCUMENT)? {
                builder.version(ver);
            }
            if let Some(rel) = attr_value(element, b"rel", DOCUMENT)? {
                builder.release(rel);
            }
        }
        b"time" => {
            if let Some(file) = attr_value(element, b"file", DOCUMENT)? {
                builder.file_time(file);
            }
        }
        b"location" => {
            if let Some(href) = attr_value(element, b"href", DOCUMENT)? {
                builder.location(href);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Stream package entries out of a primary.xml document
///
/// `on_package` receives every `<package>` entry in document order, either
/// as a complete record or as a rejection. Returns the number of entries.
pub fn parse_primary<R: BufRead>(
    reader: R,
    mut on_package: impl FnMut(std::result::Result<PackageRecord, RejectedPackage>),
) -> Result<usize> {
    let mut reader = NsReader::from_reader(reader);
    let mut buf = Vec::new();

    let mut current: Option<PackageRecordBuilder> = None;
    let mut text_field: Option<TextField> = None;
    let mut text = String::new();
    let mut seen = 0usize;

    loop {
        let (ns, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| xml_error(DOCUMENT, e))?;
        let common = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == COMMON_NS);

        match event {
            Event::Start(e) if common => match e.local_name().as_ref() {
                b"package" => current = Some(PackageRecordBuilder::new()),
                b"name" if current.is_some() => {
                    text_field = Some(TextField::Name);
                    text.clear();
                }
                b"arch" if current.is_some() => {
                    text_field = Some(TextField::Arch);
                    text.clear();
                }
                _ => {
                    if let Some(builder) = current.as_mut() {
                        apply_attributes(builder, &e)?;
                    }
                }
            },
            Event::Empty(e) if common => {
                if let Some(builder) = current.as_mut() {
                    apply_attributes(builder, &e)?;
                }
            }
            Event::Text(t) if text_field.is_some() => {
                let unescaped = t.unescape().map_err(|e| xml_error(DOCUMENT, e))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) if text_field.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(e) if common => match e.local_name().as_ref() {
                b"package" => {
                    if let Some(builder) = current.take() {
                        seen += 1;
                        on_package(builder.build().map_err(|error| RejectedPackage {
                            name: builder.name_hint().map(str::to_string),
                            error,
                        }));
                    }
                    text_field = None;
                }
                b"name" | b"arch" => {
                    if let (Some(field), Some(builder)) = (text_field.take(), current.as_mut()) {
                        match field {
                            TextField::Name => builder.name(text.trim()),
                            TextField::Arch => builder.arch(text.trim()),
                        };
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(seen)
}
