// src/repository/parsers/mod.rs

//! Repository metadata parsers
//!
//! This module provides parsers for the metadata formats an available
//! package set can be read from:
//! - Fedora/RPM: primary.xml (packages plus their obsoletes)
//! - JSON: a plain list of package references

pub mod fedora;
pub mod json;

use crate::error::Result;
use crate::packages::PackageRef;
use crate::resolver::ObsoletesTable;

/// Repository metadata parser trait
pub trait MetadataParser {
    /// Parse already-decompressed metadata text
    fn parse(&self, content: &str) -> Result<RepositoryMetadata>;
}

/// What a repository offers: its packages and their obsoletes
#[derive(Debug, Clone, Default)]
pub struct RepositoryMetadata {
    pub packages: Vec<PackageRef>,
    pub obsoletes: ObsoletesTable,
}

impl RepositoryMetadata {
    /// Append another repository's contents
    pub fn merge(&mut self, other: RepositoryMetadata) {
        self.packages.extend(other.packages);
        self.obsoletes.extend(other.obsoletes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ObsoleteSpec;

    #[test]
    fn test_merge_keeps_duplicates() {
        let pkg: PackageRef = "foo-1.0-1.x86_64".parse().unwrap();

        let mut first = RepositoryMetadata {
            packages: vec![pkg.clone()],
            obsoletes: ObsoletesTable::new(),
        };
        let mut second = RepositoryMetadata {
            packages: vec![pkg.clone()],
            obsoletes: ObsoletesTable::new(),
        };
        second
            .obsoletes
            .add(pkg.clone(), vec![ObsoleteSpec::parse("bar").unwrap()]);

        first.merge(second);
        assert_eq!(first.packages.len(), 2);
        assert_eq!(first.obsoletes.len(), 1);
    }
}
