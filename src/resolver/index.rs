// src/resolver/index.rs

//! Name/architecture lookup tables over flat package lists

use crate::error::Result;
use crate::packages::PackageRef;
use crate::version::Evr;
use std::collections::BTreeMap;

/// Packages grouped by (name, arch), plus a per-name view of every arch
///
/// Groups keep input order and tolerate duplicate tuples. An index is
/// never edited in place; filtering produces a new index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIndex {
    by_arch: BTreeMap<(String, String), Vec<Evr>>,
    by_name: BTreeMap<String, Vec<(String, Evr)>>,
}

impl PackageIndex {
    /// Build both lookup tables from a package list
    pub fn build<'a, I>(packages: I) -> Self
    where
        I: IntoIterator<Item = &'a PackageRef>,
    {
        let mut index = Self::default();
        for pkg in packages {
            index.insert(pkg.name(), pkg.arch(), pkg.evr());
        }
        index
    }

    fn insert(&mut self, name: &str, arch: &str, evr: Evr) {
        self.by_arch
            .entry((name.to_string(), arch.to_string()))
            .or_default()
            .push(evr.clone());
        self.by_name
            .entry(name.to_string())
            .or_default()
            .push((arch.to_string(), evr));
    }

    /// Every EVR recorded for exactly (name, arch)
    pub fn get(&self, name: &str, arch: &str) -> Option<&[Evr]> {
        self.by_arch
            .get(&(name.to_string(), arch.to_string()))
            .map(Vec::as_slice)
    }

    /// Every (arch, EVR) recorded for `name`, across architectures
    pub fn arches_for(&self, name: &str) -> Option<&[(String, Evr)]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    /// Distinct architectures `name` appears under, in first-seen order
    pub fn distinct_arches(&self, name: &str) -> Vec<&str> {
        let mut arches: Vec<&str> = Vec::new();
        for (arch, _) in self.arches_for(name).unwrap_or_default() {
            if !arches.contains(&arch.as_str()) {
                arches.push(arch);
            }
        }
        arches
    }

    pub fn contains(&self, name: &str, arch: &str) -> bool {
        self.get(name, arch).is_some()
    }

    /// Iterate the (name, arch) groups in key order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &str, &[Evr])> {
        self.by_arch
            .iter()
            .map(|((name, arch), evrs)| (name.as_str(), arch.as_str(), evrs.as_slice()))
    }

    /// Number of (name, arch) groups
    pub fn len(&self) -> usize {
        self.by_arch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_arch.is_empty()
    }

    /// New index restricted to architectures accepted by `keep`
    ///
    /// (name, arch) groups with a rejected arch are dropped whole; per-name
    /// entries are filtered one by one, and a name left with no entries
    /// disappears from the per-name view.
    pub fn retain_arches<F>(&self, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let by_arch = self
            .by_arch
            .iter()
            .filter(|((_, arch), _)| keep(arch))
            .map(|(key, evrs)| (key.clone(), evrs.clone()))
            .collect();

        let by_name = self
            .by_name
            .iter()
            .map(|(name, entries)| {
                let kept: Vec<_> = entries
                    .iter()
                    .filter(|(arch, _)| keep(arch))
                    .cloned()
                    .collect();
                (name.clone(), kept)
            })
            .filter(|(_, entries)| !entries.is_empty())
            .collect();

        Self { by_arch, by_name }
    }

    /// New index whose (name, arch) groups are replaced by `f`'s result
    ///
    /// Groups for which `f` returns an empty list are removed. The per-name
    /// view is carried over unchanged.
    pub(crate) fn map_groups<F>(&self, mut f: F) -> Result<Self>
    where
        F: FnMut(&str, &str, &[Evr]) -> Result<Vec<Evr>>,
    {
        let mut by_arch = BTreeMap::new();
        for ((name, arch), evrs) in &self.by_arch {
            let kept = f(name, arch, evrs)?;
            if !kept.is_empty() {
                by_arch.insert((name.clone(), arch.clone()), kept);
            }
        }

        Ok(Self {
            by_arch,
            by_name: self.by_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, arch: &str, version: &str) -> PackageRef {
        PackageRef::new(name, arch, None, version, "1").unwrap()
    }

    #[test]
    fn test_empty_input_yields_empty_index() {
        let index = PackageIndex::build(&Vec::<PackageRef>::new());
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert!(index.arches_for("foo").is_none());
    }

    #[test]
    fn test_groups_by_name_and_arch() {
        let pkgs = vec![
            pkg("foo", "x86_64", "1.0"),
            pkg("foo", "i686", "1.0"),
            pkg("foo", "x86_64", "2.0"),
            pkg("bar", "noarch", "3.0"),
        ];
        let index = PackageIndex::build(&pkgs);

        assert_eq!(index.len(), 3);
        let foo64 = index.get("foo", "x86_64").unwrap();
        assert_eq!(foo64.len(), 2);
        assert_eq!(foo64[0].version, "1.0");
        assert_eq!(foo64[1].version, "2.0");

        let foo_all = index.arches_for("foo").unwrap();
        assert_eq!(foo_all.len(), 3);
        assert_eq!(index.distinct_arches("foo"), vec!["x86_64", "i686"]);
        assert!(index.contains("bar", "noarch"));
        assert!(!index.contains("bar", "x86_64"));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let pkgs = vec![pkg("foo", "x86_64", "1.0"), pkg("foo", "x86_64", "1.0")];
        let index = PackageIndex::build(&pkgs);
        assert_eq!(index.get("foo", "x86_64").unwrap().len(), 2);
        assert_eq!(index.distinct_arches("foo"), vec!["x86_64"]);
    }

    #[test]
    fn test_retain_arches_builds_new_index() {
        let pkgs = vec![
            pkg("foo", "x86_64", "1.0"),
            pkg("foo", "ppc64", "1.0"),
            pkg("bar", "ppc64", "1.0"),
        ];
        let index = PackageIndex::build(&pkgs);
        let filtered = index.retain_arches(|arch| arch != "ppc64");

        assert!(filtered.contains("foo", "x86_64"));
        assert!(!filtered.contains("foo", "ppc64"));
        assert_eq!(filtered.arches_for("foo").unwrap().len(), 1);
        assert!(filtered.arches_for("bar").is_none());

        // Source index untouched
        assert!(index.contains("foo", "ppc64"));
        assert_eq!(index.arches_for("foo").unwrap().len(), 2);
    }

    #[test]
    fn test_map_groups_drops_emptied_groups() {
        let pkgs = vec![pkg("foo", "x86_64", "1.0"), pkg("bar", "x86_64", "1.0")];
        let index = PackageIndex::build(&pkgs);
        let mapped = index
            .map_groups(|name, _, evrs| {
                Ok(if name == "foo" { Vec::new() } else { evrs.to_vec() })
            })
            .unwrap();

        assert!(!mapped.contains("foo", "x86_64"));
        assert!(mapped.contains("bar", "x86_64"));
        assert!(mapped.arches_for("foo").is_some());
    }
}
