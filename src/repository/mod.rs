// src/repository/mod.rs

//! Available package sets
//!
//! This module provides functionality for:
//! - Detecting metadata format and compression from a file name
//! - Decompressing gzip and zstd metadata
//! - Loading packages and obsoletes from local repository metadata

pub mod parsers;

pub use parsers::{MetadataParser, RepositoryMetadata};

use crate::error::{Error, Result};
use crate::packages::{PackageRef, PackageSource};
use flate2::read::GzDecoder;
use parsers::fedora::PrimaryXmlParser;
use parsers::json::PackageListParser;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compression applied to a metadata file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

/// Metadata document kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    PrimaryXml,
    PackageList,
}

/// Work out format and compression from a file name
///
/// `primary.xml.gz` → (PrimaryXml, Gzip), `list.json` → (PackageList, None).
/// Anything that is not `.json` is treated as primary.xml.
pub fn detect_format(path: &Path) -> (MetadataFormat, Compression) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let (stem, compression) = if let Some(stem) = file_name.strip_suffix(".gz") {
        (stem, Compression::Gzip)
    } else if let Some(stem) = file_name.strip_suffix(".zst") {
        (stem, Compression::Zstd)
    } else {
        (file_name.as_str(), Compression::None)
    };

    let format = if stem.ends_with(".json") {
        MetadataFormat::PackageList
    } else {
        MetadataFormat::PrimaryXml
    };

    (format, compression)
}

/// Decompress metadata bytes into text
pub fn decompress(bytes: &[u8], compression: Compression) -> Result<String> {
    match compression {
        Compression::None => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in metadata: {}", e))),
        Compression::Gzip => {
            debug!("Decompressing gzip-compressed metadata");
            let mut gz = GzDecoder::new(bytes);
            let mut decompressed = String::new();
            gz.read_to_string(&mut decompressed)
                .map_err(|e| Error::ParseError(format!("Failed to decompress gzip metadata: {}", e)))?;
            Ok(decompressed)
        }
        Compression::Zstd => {
            debug!("Decompressing zstd-compressed metadata");
            let decompressed_bytes = zstd::decode_all(bytes)
                .map_err(|e| Error::ParseError(format!("Failed to decompress zstd metadata: {}", e)))?;
            String::from_utf8(decompressed_bytes)
                .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in metadata: {}", e)))
        }
    }
}

/// Read and parse one metadata file
pub fn load_metadata(path: &Path) -> Result<RepositoryMetadata> {
    let (format, compression) = detect_format(path);
    debug!("Loading {} as {:?} ({:?})", path.display(), format, compression);

    let bytes = fs::read(path)?;
    let content = decompress(&bytes, compression)?;

    let metadata = match format {
        MetadataFormat::PrimaryXml => PrimaryXmlParser::new().parse(&content)?,
        MetadataFormat::PackageList => PackageListParser::new().parse(&content)?,
    };

    info!(
        "Loaded {} package(s) from {}",
        metadata.packages.len(),
        path.display()
    );
    Ok(metadata)
}

/// Read and combine several metadata files, in order
pub fn load_all(paths: &[PathBuf]) -> Result<RepositoryMetadata> {
    let mut combined = RepositoryMetadata::default();
    for path in paths {
        combined.merge(load_metadata(path)?);
    }
    Ok(combined)
}

/// A metadata file used as a package source
#[derive(Debug, Clone)]
pub struct MetadataFile {
    path: PathBuf,
}

impl MetadataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageSource for MetadataFile {
    fn packages(&self) -> Result<Vec<PackageRef>> {
        Ok(load_metadata(&self.path)?.packages)
    }

    fn describe(&self) -> String {
        format!("metadata file {}", self.path.display())
    }
}
