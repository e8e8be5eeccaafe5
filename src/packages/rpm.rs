// src/packages/rpm.rs

//! RPM header reader
//!
//! Reads the identity of binary `.rpm` files so they can be recorded in the
//! installed database or offered as available packages.

use crate::error::{Error, Result};
use crate::packages::traits::PackageSource;
use crate::packages::PackageRef;
use rpm::Package;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Identity of a binary RPM read from its header
#[derive(Debug, Clone)]
pub struct RpmPackage {
    package: PackageRef,
    source_rpm: String,
}

impl RpmPackage {
    /// Parse the header of the RPM at `path`
    pub fn parse(path: &Path) -> Result<Self> {
        debug!("Reading RPM header: {}", path.display());

        let file = File::open(path)?;
        let mut buf_reader = BufReader::new(file);

        let pkg = Package::parse(&mut buf_reader)
            .map_err(|e| Error::ParseError(format!("Failed to parse RPM {}: {}", path.display(), e)))?;

        let name = pkg
            .metadata
            .get_name()
            .map_err(|e| Error::ParseError(format!("Failed to get package name: {}", e)))?;

        // Binary packages record the source they were built from
        let source_rpm = pkg.metadata.get_source_rpm().map_err(|_| {
            Error::InvalidPackageRef(format!("{} is a source package", path.display()))
        })?;

        let version = pkg
            .metadata
            .get_version()
            .map_err(|e| Error::ParseError(format!("Failed to get package version: {}", e)))?;
        let release = pkg
            .metadata
            .get_release()
            .map_err(|e| Error::ParseError(format!("Failed to get package release: {}", e)))?;
        let arch = pkg
            .metadata
            .get_arch()
            .map_err(|e| Error::ParseError(format!("Failed to get package arch: {}", e)))?;
        let epoch = pkg.metadata.get_epoch().ok().map(|e| e.to_string());

        let package = PackageRef::new(name, arch, epoch.as_deref(), version, release)?;
        debug!("Read {} (from {})", package, source_rpm);

        Ok(Self {
            package,
            source_rpm: source_rpm.to_string(),
        })
    }

    /// The package identity
    pub fn package_ref(&self) -> &PackageRef {
        &self.package
    }

    /// Source RPM this binary was built from
    pub fn source_rpm(&self) -> &str {
        &self.source_rpm
    }
}

/// A set of `.rpm` files used as a package source
#[derive(Debug, Clone, Default)]
pub struct RpmFiles {
    paths: Vec<PathBuf>,
}

impl RpmFiles {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Collect every `*.rpm` file directly inside `dir`, sorted by path
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "rpm") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl PackageSource for RpmFiles {
    /// Read every header; unreadable and source packages are skipped
    fn packages(&self) -> Result<Vec<PackageRef>> {
        let mut packages = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            match RpmPackage::parse(path) {
                Ok(rpm) => packages.push(rpm.package),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(packages)
    }

    fn describe(&self) -> String {
        format!("{} RPM file(s)", self.paths.len())
    }
}
