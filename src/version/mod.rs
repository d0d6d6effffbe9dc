// src/version/mod.rs

//! RPM version ordering
//!
//! Packages in a repository feed are deduplicated by keeping the highest
//! (epoch, version, release) per name, so this ordering decides which
//! binary ends up in the Maven repository. It follows `rpmvercmp` from
//! librpm, including the `~` (pre-release) and `^` (post-release) rules.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// A parsed RPM version with epoch, version, and release components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RpmVersion {
    /// Missing epoch orders below every explicit epoch, including 0
    pub epoch: Option<u64>,
    pub version: String,
    pub release: String,
}

impl RpmVersion {
    pub fn new(epoch: Option<u64>, version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            epoch,
            version: version.into(),
            release: release.into(),
        }
    }

    /// Parse an RPM version string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2.3" → epoch=None, version="1.2.3", release=""
    /// - "2:1.2.3-4.el8" → epoch=Some(2), version="1.2.3", release="4.el8"
    pub fn parse(s: &str) -> Result<Self> {
        let (epoch, rest) = match s.split_once(':') {
            Some(("", rest)) => (None, rest),
            Some((e, rest)) => {
                let epoch = e.parse::<u64>().map_err(|err| {
                    Error::ParseError(format!("Invalid epoch in version '{}': {}", s, err))
                })?;
                (Some(epoch), rest)
            }
            None => (None, s),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) => (v, r),
            None => (rest, ""),
        };

        if version.is_empty() {
            return Err(Error::ParseError(format!(
                "Empty version component in '{}'",
                s
            )));
        }

        Ok(Self::new(epoch, version, release))
    }

    /// Compare two RPM versions: epoch numerically, then version and release with rpmvercmp
    pub fn compare(&self, other: &RpmVersion) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| rpmvercmp(&self.version, &other.version))
            .then_with(|| rpmvercmp(&self.release, &other.release))
    }
}

impl fmt::Display for RpmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(epoch) = self.epoch {
            write!(f, "{}:", epoch)?;
        }
        write!(f, "{}", self.version)?;
        if !self.release.is_empty() {
            write!(f, "-{}", self.release)?;
        }
        Ok(())
    }
}

impl Ord for RpmVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for RpmVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn is_separator(c: u8) -> bool {
    !c.is_ascii_alphanumeric() && c != b'~' && c != b'^'
}

/// Segmented version comparison with librpm semantics
///
/// Both strings are split into alternating runs of digits and letters;
/// anything else only separates runs. Numeric runs compare as numbers,
/// letter runs compare bytewise, and a numeric run is newer than a letter
/// run at the same position.
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let one = a.as_bytes();
    let two = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);

    while i < one.len() || j < two.len() {
        while i < one.len() && is_separator(one[i]) {
            i += 1;
        }
        while j < two.len() && is_separator(two[j]) {
            j += 1;
        }

        // Tilde sorts before everything, even the end of the string
        let tilde_one = one.get(i) == Some(&b'~');
        let tilde_two = two.get(j) == Some(&b'~');
        if tilde_one || tilde_two {
            if !tilde_one {
                return Ordering::Greater;
            }
            if !tilde_two {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        // Caret sorts after the end of the string but before any other segment
        let caret_one = one.get(i) == Some(&b'^');
        let caret_two = two.get(j) == Some(&b'^');
        if caret_one || caret_two {
            if i >= one.len() {
                return Ordering::Less;
            }
            if j >= two.len() {
                return Ordering::Greater;
            }
            if !caret_one {
                return Ordering::Greater;
            }
            if !caret_two {
                return Ordering::Less;
            }
            i += 1;
            j += 1;
            continue;
        }

        if i >= one.len() || j >= two.len() {
            break;
        }

        let start_one = i;
        let start_two = j;
        let numeric = one[i].is_ascii_digit();
        if numeric {
            while i < one.len() && one[i].is_ascii_digit() {
                i += 1;
            }
            while j < two.len() && two[j].is_ascii_digit() {
                j += 1;
            }
        } else {
            while i < one.len() && one[i].is_ascii_alphabetic() {
                i += 1;
            }
            while j < two.len() && two[j].is_ascii_alphabetic() {
                j += 1;
            }
        }

        let seg_one = &one[start_one..i];
        let seg_two = &two[start_two..j];

        // Segments of different kinds: the numeric one is newer
        if seg_two.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let trimmed_one = trim_leading_zeros(seg_one);
            let trimmed_two = trim_leading_zeros(seg_two);
            trimmed_one
                .len()
                .cmp(&trimmed_two.len())
                .then_with(|| trimmed_one.cmp(trimmed_two))
        } else {
            seg_one.cmp(seg_two)
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }

    let rest_one = i < one.len();
    let rest_two = j < two.len();
    match (rest_one, rest_two) {
        (false, false) => Ordering::Equal,
        (true, _) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

fn trim_leading_zeros(segment: &[u8]) -> &[u8] {
    let first = segment
        .iter()
        .position(|&c| c != b'0')
        .unwrap_or(segment.len());
    &segment[first..]
}
