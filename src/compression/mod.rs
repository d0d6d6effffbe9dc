// src/compression/mod.rs
//! Streaming decompression for repository metadata
//!
//! OBS publishes the package list compressed (gzip today, xz or zstd on
//! some instances). The format is taken from the leading magic bytes;
//! every supported format has one, so a stream without magic is read as
//! is. The file extension only serves as a hint for diagnostics, and a
//! mislabelled document still decodes.

use std::io::{self, BufRead, BufReader, Read};
use thiserror::Error;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to create {format} decoder: {source}")]
    DecoderCreation {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to read compressed stream: {0}")]
    Peek(#[source] io::Error),
}

/// Supported compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// No compression (raw data)
    None,
    /// Gzip compression (.gz)
    Gzip,
    /// XZ/LZMA compression (.xz)
    Xz,
    /// Zstandard compression (.zst)
    Zstd,
}

impl CompressionFormat {
    /// Detect compression format from file extension
    ///
    /// # Examples
    /// ```
    /// use obs_maven::compression::CompressionFormat;
    ///
    /// assert_eq!(CompressionFormat::from_extension("primary.xml.gz"), CompressionFormat::Gzip);
    /// assert_eq!(CompressionFormat::from_extension("primary.xml.zst"), CompressionFormat::Zstd);
    /// assert_eq!(CompressionFormat::from_extension("primary.xml"), CompressionFormat::None);
    /// ```
    pub fn from_extension(path: &str) -> Self {
        if path.ends_with(".gz") || path.ends_with(".tgz") {
            Self::Gzip
        } else if path.ends_with(".xz") {
            Self::Xz
        } else if path.ends_with(".zst") || path.ends_with(".zstd") {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - XZ: `fd 37 7a 58 5a 00` (FD + "7zXZ" + NUL)
    /// - Zstd: `28 b5 2f fd`
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if data.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
            Self::Xz
        } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create a decompressing reader for the given format
pub fn create_decoder<'a, R: BufRead + 'a>(
    reader: R,
    format: CompressionFormat,
) -> Result<Box<dyn BufRead + 'a>, CompressionError> {
    match format {
        CompressionFormat::None => Ok(Box::new(reader)),
        CompressionFormat::Gzip => Ok(Box::new(BufReader::new(flate2::bufread::GzDecoder::new(
            reader,
        )))),
        CompressionFormat::Xz => Ok(Box::new(BufReader::new(xz2::bufread::XzDecoder::new(
            reader,
        )))),
        CompressionFormat::Zstd => {
            let decoder = zstd::Decoder::with_buffer(reader).map_err(|e| {
                CompressionError::DecoderCreation {
                    format: "zstd",
                    source: e,
                }
            })?;
            Ok(Box::new(BufReader::new(decoder)))
        }
    }
}

/// Wrap a stream in the decoder matching its leading bytes
///
/// `name_hint` is only compared against the detected format for a debug
/// message. Nothing beyond the internal read buffer is held in memory.
pub fn stream_decoder<'a, R: Read + 'a>(
    reader: R,
    name_hint: &str,
) -> Result<Box<dyn BufRead + 'a>, CompressionError> {
    let mut reader = BufReader::new(reader);
    let detected = CompressionFormat::from_magic_bytes(reader.fill_buf().map_err(CompressionError::Peek)?);
    let hinted = CompressionFormat::from_extension(name_hint);

    if hinted != detected {
        tracing::debug!("{} is labelled {} but looks like {}", name_hint, hinted, detected);
    }

    create_decoder(reader, detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CompressionFormat::from_extension("primary.xml.gz"), CompressionFormat::Gzip);
        assert_eq!(CompressionFormat::from_extension("primary.xml.xz"), CompressionFormat::Xz);
        assert_eq!(CompressionFormat::from_extension("primary.xml.zst"), CompressionFormat::Zstd);
        assert_eq!(CompressionFormat::from_extension("primary.xml"), CompressionFormat::None);
    }

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            CompressionFormat::from_magic_bytes(&[0x1f, 0x8b, 0x08, 0x00]),
            CompressionFormat::Gzip
        );
        assert_eq!(
            CompressionFormat::from_magic_bytes(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]),
            CompressionFormat::Xz
        );
        assert_eq!(
            CompressionFormat::from_magic_bytes(&[0x28, 0xb5, 0x2f, 0xfd]),
            CompressionFormat::Zstd
        );
        assert_eq!(CompressionFormat::from_magic_bytes(b"<?xml"), CompressionFormat::None);
        assert_eq!(CompressionFormat::from_magic_bytes(&[0x1f]), CompressionFormat::None);
    }

    #[test]
    fn test_stream_decoder_gzip() {
        let data = gzip(b"<metadata/>");
        let mut out = String::new();
        stream_decoder(&data[..], "repodata/abc-primary.xml.gz")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "<metadata/>");
    }

    #[test]
    fn test_stream_decoder_trusts_magic_over_name() {
        let mut out = String::new();
        stream_decoder(&b"<metadata/>"[..], "repodata/abc-primary.xml.gz")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "<metadata/>");

        let data = gzip(b"plain");
        let mut out = String::new();
        stream_decoder(&data[..], "primary.xml")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "plain");
    }
}
