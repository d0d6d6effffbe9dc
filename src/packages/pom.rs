// src/packages/pom.rs

//! Maven coordinates from POM files shipped inside packages
//!
//! Java packages usually install their POM under `/usr/share/maven-poms/`.
//! When one declares the artifact being processed, its `groupId` and
//! `version` (or those of its `<parent>`) take precedence over anything
//! guessed from file names.

use crate::error::{Error, Result};
use crate::events::{EventSink, SyncEvent};
use crate::packages::extract::{ArchiveEntry, ArchiveExtractor};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Conventional install location of POM files
pub const POM_DIR: &str = "/usr/share/maven-poms/";

/// Group and version recovered from a POM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group: String,
    pub version: String,
}

/// The fields of a POM relevant for deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomInfo {
    pub artifact_id: Option<String>,
    pub group_id: Option<String>,
    pub version: Option<String>,
    pub parent_group_id: Option<String>,
    pub parent_version: Option<String>,
}

impl PomInfo {
    pub fn group(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.parent_group_id.as_deref())
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().or(self.parent_version.as_deref())
    }
}

/// Empty values and unresolved property references count as absent
fn usable(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.contains("${") {
        None
    } else {
        Some(value.to_string())
    }
}

/// Read the coordinates of a POM document
///
/// Elements are matched by local name, so both plain and prefixed
/// (`<pom:project xmlns:pom=...>`) documents are understood.
pub fn parse_pom<R: BufRead>(reader: R) -> Result<PomInfo> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();
    let mut info = PomInfo::default();
    let mut saw_root = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::ParseError(format!("pom: {}", e)))?;
        match event {
            Event::Start(e) => {
                saw_root = true;
                path.push(e.local_name().as_ref().to_vec());
                text.clear();
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|e| Error::ParseError(format!("pom: {}", e)))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => {
                let value = usable(&text);
                let segments: Vec<&[u8]> = path.iter().map(Vec::as_slice).collect();
                match segments.as_slice() {
                    [_, b"artifactId"] => info.artifact_id = value,
                    [_, b"groupId"] => info.group_id = value,
                    [_, b"version"] => info.version = value,
                    [_, b"parent", b"groupId"] => info.parent_group_id = value,
                    [_, b"parent", b"version"] => info.parent_version = value,
                    _ => {}
                }
                path.pop();
                text.clear();
            }
            Event::Empty(_) => saw_root = true,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(Error::ParseError("pom: no root element".to_string()));
    }
    Ok(info)
}

/// POM entries worth looking at for `artifact_id`, most specific first
pub fn candidate_poms<'a>(entries: &'a [ArchiveEntry], artifact_id: &str) -> Vec<&'a ArchiveEntry> {
    let in_pom_dir = |e: &&ArchiveEntry| !e.is_link() && e.path.starts_with(POM_DIR) && e.path.ends_with(".pom");

    let named = Regex::new(&format!(r"{}\.pom$", regex::escape(artifact_id))).ok();
    let direct: Vec<&ArchiveEntry> = entries
        .iter()
        .filter(in_pom_dir)
        .filter(|e| named.as_ref().is_some_and(|re| re.is_match(&e.path)))
        .collect();
    if !direct.is_empty() {
        return direct;
    }

    debug!("No direct pom file found. Searching all poms available");
    entries.iter().filter(in_pom_dir).collect()
}

/// Looks up an artifact's coordinates in the POMs of a package
pub struct DescriptorResolver<'a> {
    extractor: &'a ArchiveExtractor,
}

impl<'a> DescriptorResolver<'a> {
    pub fn new(extractor: &'a ArchiveExtractor) -> Self {
        Self { extractor }
    }

    /// Coordinates from the first POM declaring `artifact_id`
    ///
    /// `None` when no POM declares the artifact, or when the one that does
    /// leaves group or version unresolved.
    pub fn resolve(
        &self,
        package: &Path,
        entries: &[ArchiveEntry],
        artifact_id: &str,
        dest_dir: &Path,
        events: &dyn EventSink,
    ) -> Result<Option<Coordinates>> {
        debug!("Searching pom for artifact {}", artifact_id);

        for entry in candidate_poms(entries, artifact_id) {
            let file_name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
            let dest = self.extractor.extract(package, &entry.path, &dest_dir.join(file_name))?;

            let info = match File::open(&dest)
                .map_err(Error::from)
                .and_then(|f| parse_pom(BufReader::new(f)))
            {
                Ok(info) => info,
                Err(e) => {
                    events.emit(SyncEvent::DescriptorIgnored {
                        entry: entry.path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if info.artifact_id.as_deref() != Some(artifact_id) {
                events.emit(SyncEvent::DescriptorIgnored {
                    entry: entry.path.clone(),
                    reason: format!(
                        "declares artifact {}",
                        info.artifact_id.as_deref().unwrap_or("(none)")
                    ),
                });
                continue;
            }

            return Ok(match (info.group(), info.version()) {
                (Some(group), Some(version)) => {
                    events.emit(SyncEvent::DescriptorResolved {
                        artifact: artifact_id.to_string(),
                        group: group.to_string(),
                        version: version.to_string(),
                    });
                    Some(Coordinates {
                        group: group.to_string(),
                        version: version.to_string(),
                    })
                }
                _ => None,
            });
        }

        Ok(None)
    }
}
