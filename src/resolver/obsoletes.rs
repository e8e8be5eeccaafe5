// src/resolver/obsoletes.rs

//! Obsoletion relation and its evaluation against the installed set

use super::index::PackageIndex;
use super::ObsoleteMapping;
use crate::error::{Error, Result};
use crate::packages::PackageRef;
use crate::version::{VersionComparator, VersionConstraint};
use std::fmt;
use tracing::debug;

/// One `Obsoletes:` entry: a package name plus an optional version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsoleteSpec {
    pub name: String,
    pub constraint: VersionConstraint,
}

impl ObsoleteSpec {
    pub fn new(name: &str, constraint: VersionConstraint) -> Self {
        Self {
            name: name.to_string(),
            constraint,
        }
    }

    /// Parse `name [op evr]`, e.g. `"bar < 1.1"` or `"bar"`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = match s.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (s, ""),
        };

        if name.is_empty() {
            return Err(Error::ParseError(format!("Empty obsoletes entry: '{}'", s)));
        }

        Ok(Self::new(name, VersionConstraint::parse(rest)?))
    }
}

impl fmt::Display for ObsoleteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.constraint {
            VersionConstraint::Any => write!(f, "{}", self.name),
            ref constraint => write!(f, "{} {}", self.name, constraint),
        }
    }
}

/// Available packages and what each declares obsolete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObsoletesTable {
    entries: Vec<(PackageRef, Vec<ObsoleteSpec>)>,
}

impl ObsoletesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `obsoleter` obsoletes everything matching `specs`
    pub fn add(&mut self, obsoleter: PackageRef, specs: Vec<ObsoleteSpec>) {
        if !specs.is_empty() {
            self.entries.push((obsoleter, specs));
        }
    }

    /// Merge another table's entries after this one's
    pub fn extend(&mut self, other: ObsoletesTable) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageRef, &[ObsoleteSpec])> {
        self.entries
            .iter()
            .map(|(obsoleter, specs)| (obsoleter, specs.as_slice()))
    }

    /// Number of obsoleting packages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map installed packages to the available packages obsoleting them
///
/// Only obsoleters on a `compatible` arch, and only the newest build of
/// each obsoleting (name, arch), are considered. A package never obsoletes
/// its own name.
pub(crate) fn compute<C>(
    table: &ObsoletesTable,
    installed: &PackageIndex,
    compatible: &[String],
    comparator: &C,
) -> Result<ObsoleteMapping>
where
    C: VersionComparator + ?Sized,
{
    let mut obsoletes = ObsoleteMapping::default();
    if table.is_empty() {
        return Ok(obsoletes);
    }

    let obsoleters = PackageIndex::build(table.iter().map(|(obsoleter, _)| obsoleter))
        .retain_arches(|arch| compatible.iter().any(|c| c == arch));
    let newest =
        obsoleters.map_groups(|_, _, evrs| Ok(vec![super::select_newest(comparator, evrs)?.clone()]))?;

    for (obsoleter, specs) in table.iter() {
        let is_newest = newest
            .get(obsoleter.name(), obsoleter.arch())
            .is_some_and(|evrs| evrs.contains(&obsoleter.evr()));
        if !is_newest {
            continue;
        }

        for spec in specs {
            if spec.name == obsoleter.name() {
                continue;
            }
            for (arch, evr) in installed.arches_for(&spec.name).unwrap_or_default() {
                if spec.constraint.satisfied_by(evr, comparator) {
                    debug!("{} obsoletes {}.{} ({})", obsoleter, spec.name, arch, spec);
                    obsoletes.record(PackageRef::from_evr(&spec.name, arch, evr)?, obsoleter.clone());
                }
            }
        }
    }

    Ok(obsoletes.condensed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{Evr, RpmVersionComparator};

    fn pkg(nevra: &str) -> PackageRef {
        nevra.parse().unwrap()
    }

    fn compatible() -> Vec<String> {
        ["x86_64", "i686", "noarch"].iter().map(|s| s.to_string()).collect()
    }

    fn run(table: &ObsoletesTable, installed: &[PackageRef]) -> ObsoleteMapping {
        let index = PackageIndex::build(installed);
        compute(table, &index, &compatible(), &RpmVersionComparator).unwrap()
    }

    #[test]
    fn test_spec_parse() {
        let spec = ObsoleteSpec::parse("bar < 1.1").unwrap();
        assert_eq!(spec.name, "bar");
        assert_eq!(spec.constraint, VersionConstraint::LessThan(Evr::parse("1.1").unwrap()));
        assert_eq!(spec.to_string(), "bar < 1.1");

        let bare = ObsoleteSpec::parse("bar").unwrap();
        assert_eq!(bare.constraint, VersionConstraint::Any);
        assert_eq!(bare.to_string(), "bar");

        assert!(ObsoleteSpec::parse("   ").is_err());
    }

    #[test]
    fn test_versioned_obsoletes() {
        let mut table = ObsoletesTable::new();
        table.add(pkg("foo-2.0-1.x86_64"), vec![ObsoleteSpec::parse("bar < 1.1").unwrap()]);

        let old = pkg("bar-1.0-1.x86_64");
        let mapping = run(&table, &[old.clone()]);
        assert_eq!(mapping.get(&old).unwrap(), &[pkg("foo-2.0-1.x86_64")]);

        // Out of range: not obsoleted
        let mapping = run(&table, &[pkg("bar-1.2-1.x86_64")]);
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_incompatible_obsoleter_ignored() {
        let mut table = ObsoletesTable::new();
        table.add(pkg("foo-2.0-1.ppc64"), vec![ObsoleteSpec::parse("bar").unwrap()]);
        assert!(run(&table, &[pkg("bar-1.0-1.x86_64")]).is_empty());
    }

    #[test]
    fn test_only_newest_obsoleter_counts() {
        let mut table = ObsoletesTable::new();
        table.add(pkg("foo-1.0-1.x86_64"), vec![ObsoleteSpec::parse("bar").unwrap()]);
        table.add(pkg("foo-2.0-1.x86_64"), vec![ObsoleteSpec::parse("bar").unwrap()]);

        let old = pkg("bar-1.0-1.x86_64");
        let mapping = run(&table, &[old.clone()]);
        assert_eq!(mapping.get(&old).unwrap(), &[pkg("foo-2.0-1.x86_64")]);
    }

    #[test]
    fn test_self_obsoletes_ignored() {
        let mut table = ObsoletesTable::new();
        table.add(pkg("bar-2.0-1.x86_64"), vec![ObsoleteSpec::parse("bar < 2.0").unwrap()]);
        assert!(run(&table, &[pkg("bar-1.0-1.x86_64")]).is_empty());
    }

    #[test]
    fn test_empty_spec_list_not_recorded() {
        let mut table = ObsoletesTable::new();
        table.add(pkg("foo-2.0-1.x86_64"), Vec::new());
        assert!(table.is_empty());
    }
}
