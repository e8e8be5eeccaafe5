// src/packages/traits.rs

//! Common traits for package list sources

use crate::error::Result;
use crate::packages::PackageRef;

/// Anything that can produce a flat list of package references
///
/// Installed databases, directories of RPM files and repository metadata
/// all feed the resolver through this interface. Duplicates are allowed.
pub trait PackageSource {
    /// Load the packages this source describes
    fn packages(&self) -> Result<Vec<PackageRef>>;

    /// Human readable description used in log messages
    fn describe(&self) -> String;
}
