// src/packages/mod.rs

//! Working with downloaded RPM packages
//!
//! - `extract`: listing payload files and unpacking single entries
//! - `jar`: choosing the jar to publish
//! - `pom`: recovering Maven coordinates from bundled POM files

pub mod extract;
pub mod jar;
pub mod pom;

pub use extract::{ArchiveBackend, ArchiveEntry, ArchiveExtractor, RpmCpioBackend};
pub use jar::{jar_version, select_jar};
pub use pom::{Coordinates, DescriptorResolver, PomInfo, parse_pom};
