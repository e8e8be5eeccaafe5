// src/resolver/mod.rs

//! Update resolution
//!
//! Given the installed and available package lists, decide which available
//! packages update an installed one. Names with a single architecture on
//! each side are matched directly; names spread over several architectures
//! (multilib) are matched per architecture family so that a 32-bit compat
//! package is never "updated" by its 64-bit sibling.

mod index;
mod obsoletes;
mod view;

pub use index::PackageIndex;
pub use obsoletes::{ObsoleteSpec, ObsoletesTable};
pub use view::{PackageMapping, Problem, Resolution};

use crate::arch::{ArchTable, ArchitecturePolicy};
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::packages::PackageRef;
use crate::version::{Evr, RpmVersionComparator, VersionComparator};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Installed package → available packages that update it
pub type UpdateMapping = PackageMapping;

/// Installed package → available packages that obsolete it
pub type ObsoleteMapping = PackageMapping;

/// Pick the newest EVR from a non-empty list
///
/// Ties keep the first candidate seen, so the result is stable for a
/// given input order.
pub fn select_newest<'e, C>(comparator: &C, evrs: &'e [Evr]) -> Result<&'e Evr>
where
    C: VersionComparator + ?Sized,
{
    let (first, rest) = evrs.split_first().ok_or(Error::EmptyCandidateSet)?;
    Ok(rest.iter().fold(first, |newest, evr| {
        if comparator.is_newer(evr, newest) {
            evr
        } else {
            newest
        }
    }))
}

/// Computes updates and obsoletes for one installed/available pair of lists
///
/// The inputs are fixed at construction. Every call to `resolve` builds
/// its own indexes and returns a fresh `Resolution`.
pub struct UpdateResolver<C = RpmVersionComparator, P = ArchTable> {
    installed: Vec<PackageRef>,
    available: Vec<PackageRef>,
    obsoletes: ObsoletesTable,
    platform_arch: String,
    exact_arch: bool,
    comparator: C,
    policy: P,
}

impl UpdateResolver {
    /// Create a resolver using RPM version rules and the default arch table
    pub fn new(installed: Vec<PackageRef>, available: Vec<PackageRef>, platform_arch: &str) -> Self {
        Self::with_capabilities(
            installed,
            available,
            platform_arch,
            RpmVersionComparator,
            ArchTable::new(),
        )
    }

    /// Create a resolver from a configuration
    pub fn from_config(
        installed: Vec<PackageRef>,
        available: Vec<PackageRef>,
        config: &ResolverConfig,
    ) -> Self {
        Self::new(installed, available, &config.platform_arch()).with_config(config)
    }
}

impl<C, P> UpdateResolver<C, P>
where
    C: VersionComparator,
    P: ArchitecturePolicy,
{
    /// Create a resolver with injected comparison and architecture capabilities
    pub fn with_capabilities(
        installed: Vec<PackageRef>,
        available: Vec<PackageRef>,
        platform_arch: &str,
        comparator: C,
        policy: P,
    ) -> Self {
        Self {
            installed,
            available,
            obsoletes: ObsoletesTable::default(),
            platform_arch: platform_arch.to_string(),
            exact_arch: true,
            comparator,
            policy,
        }
    }

    /// Require identical architectures between installed and updating packages
    pub fn exact_arch(mut self, exact_arch: bool) -> Self {
        self.exact_arch = exact_arch;
        self
    }

    /// Apply the matching policy from a configuration
    pub fn with_config(self, config: &ResolverConfig) -> Self {
        self.exact_arch(config.exact_arch)
    }

    /// Supply the obsoletion relation used by `resolve`
    pub fn with_obsoletes(mut self, obsoletes: ObsoletesTable) -> Self {
        self.obsoletes = obsoletes;
        self
    }

    pub fn platform_arch(&self) -> &str {
        &self.platform_arch
    }

    pub fn is_exact_arch(&self) -> bool {
        self.exact_arch
    }

    /// Pick the newest EVR using this resolver's comparator
    pub fn select_newest<'e>(&self, evrs: &'e [Evr]) -> Result<&'e Evr> {
        select_newest(&self.comparator, evrs)
    }

    /// Compute the update and obsolete mappings
    pub fn resolve(&self) -> Result<Resolution> {
        let compatible = self.policy.compatible_arches(&self.platform_arch);
        debug!(
            "Resolving for {} (compatible: {})",
            self.platform_arch,
            compatible.join(", ")
        );

        let installed = PackageIndex::build(&self.installed);
        let all_available = PackageIndex::build(&self.available);

        // A package that cannot run here cannot update anything
        let available = all_available.retain_arches(|arch| compatible.iter().any(|c| c == arch));
        debug!(
            "Dropped {} incompatible available group(s)",
            all_available.len() - available.len()
        );

        let updates = self.compute_updates(&installed, &available)?;
        let obsoletes =
            obsoletes::compute(&self.obsoletes, &installed, &compatible, &self.comparator)?;

        info!(
            "Found {} package(s) with updates and {} obsoleted package(s)",
            updates.len(),
            obsoletes.len()
        );

        Ok(Resolution::new(updates, obsoletes))
    }

    fn compute_updates(
        &self,
        installed: &PackageIndex,
        available: &PackageIndex,
    ) -> Result<UpdateMapping> {
        // Only the newest build of each (name, arch) is ever a candidate
        let newest = available.map_groups(|_, _, evrs| Ok(vec![self.select_newest(evrs)?.clone()]))?;

        // Drop candidates that are not newer than what is already installed
        let candidates = newest.map_groups(|name, arch, evrs| match installed.get(name, arch) {
            Some(installed_evrs) => {
                let installed_newest = self.select_newest(installed_evrs)?;
                Ok(evrs
                    .iter()
                    .filter(|evr| self.comparator.is_newer(evr, installed_newest))
                    .cloned()
                    .collect())
            }
            None => Ok(evrs.to_vec()),
        })?;

        let mut simple: Vec<(&str, &str)> = Vec::new();
        let mut complex: BTreeSet<&str> = BTreeSet::new();

        for (name, arch, _) in candidates.groups() {
            if complex.contains(name) {
                continue;
            }

            let installed_arches = installed.distinct_arches(name);
            if installed_arches.is_empty() {
                continue;
            }
            let available_arches = available.distinct_arches(name);

            if installed_arches.len() > 1 || available_arches.len() > 1 {
                debug!("Putting {} in complex update list", name);
                complex.insert(name);
            } else {
                debug!("Putting {}.{} in simple update list", name, arch);
                simple.push((name, arch));
            }
        }

        let mut updates = UpdateMapping::default();

        for (name, arch) in simple {
            self.match_simple(name, arch, installed, &candidates, &mut updates)?;
        }

        let arch_lists = self.arch_lists();
        for name in complex {
            for arch_list in &arch_lists {
                self.match_complex(name, arch_list, installed, available, &mut updates)?;
            }
        }

        Ok(updates.condensed())
    }

    fn match_simple(
        &self,
        name: &str,
        arch: &str,
        installed: &PackageIndex,
        candidates: &PackageIndex,
        updates: &mut UpdateMapping,
    ) -> Result<()> {
        let candidate = self.select_newest(candidates.get(name, arch).unwrap_or_default())?;

        let installed_arch = if self.exact_arch {
            arch
        } else {
            // A simple name has exactly one installed architecture
            match installed.distinct_arches(name).first() {
                Some(&installed_arch) => installed_arch,
                None => return Ok(()),
            }
        };

        let Some(installed_evrs) = installed.get(name, installed_arch) else {
            return Ok(());
        };
        let installed_newest = self.select_newest(installed_evrs)?;

        if self.comparator.is_newer(candidate, installed_newest) {
            updates.record(
                PackageRef::from_evr(name, installed_arch, installed_newest)?,
                PackageRef::from_evr(name, arch, candidate)?,
            );
        }

        Ok(())
    }

    fn match_complex(
        &self,
        name: &str,
        arch_list: &[String],
        installed: &PackageIndex,
        available: &PackageIndex,
        updates: &mut UpdateMapping,
    ) -> Result<()> {
        let highest_installed = PackageIndex::build(&self.highest_in_arches(
            name,
            arch_list,
            installed.arches_for(name).unwrap_or_default(),
        )?);
        let highest_available = PackageIndex::build(&self.highest_in_arches(
            name,
            arch_list,
            available.arches_for(name).unwrap_or_default(),
        )?);

        if self.exact_arch {
            for (_, arch, installed_evrs) in highest_installed.groups() {
                let Some(available_evrs) = highest_available.get(name, arch) else {
                    continue;
                };
                let installed_evr = self.select_newest(installed_evrs)?;
                let available_evr = self.select_newest(available_evrs)?;

                if self.comparator.is_newer(available_evr, installed_evr) {
                    updates.record(
                        PackageRef::from_evr(name, arch, installed_evr)?,
                        PackageRef::from_evr(name, arch, available_evr)?,
                    );
                }
            }
            return Ok(());
        }

        // Arch contest: one representative per side
        let installed_arches = highest_installed.distinct_arches(name);
        let available_arches = highest_available.distinct_arches(name);
        let best_installed = self.policy.best_arch(&installed_arches, &self.platform_arch);
        let best_available = self.policy.best_arch(&available_arches, &self.platform_arch);

        let (Some(installed_arch), Some(available_arch)) = (best_installed, best_available) else {
            debug!("No best architecture for {} in [{}]", name, arch_list.join(", "));
            return Ok(());
        };

        let (Some(installed_evrs), Some(available_evrs)) = (
            highest_installed.get(name, &installed_arch),
            highest_available.get(name, &available_arch),
        ) else {
            return Ok(());
        };
        let installed_evr = self.select_newest(installed_evrs)?;
        let available_evr = self.select_newest(available_evrs)?;

        if self.comparator.is_newer(available_evr, installed_evr) {
            updates.record(
                PackageRef::from_evr(name, &installed_arch, installed_evr)?,
                PackageRef::from_evr(name, &available_arch, available_evr)?,
            );
        }

        Ok(())
    }

    /// Packages of `name` restricted to `arch_list` that share the highest EVR
    fn highest_in_arches(
        &self,
        name: &str,
        arch_list: &[String],
        entries: &[(String, Evr)],
    ) -> Result<Vec<PackageRef>> {
        let matching: Vec<&(String, Evr)> = entries
            .iter()
            .filter(|(arch, _)| arch_list.contains(arch))
            .collect();

        if matching.is_empty() {
            return Ok(Vec::new());
        }

        let evrs: Vec<Evr> = matching.iter().map(|(_, evr)| evr.clone()).collect();
        let highest = self.select_newest(&evrs)?;

        matching
            .into_iter()
            .filter(|(_, evr)| self.comparator.compare(evr, highest) == Ordering::Equal)
            .map(|(arch, evr)| PackageRef::from_evr(name, arch, evr))
            .collect()
    }

    /// Architecture families matched independently for multilib names
    ///
    /// On a multilib platform the primary family (native arches not shared
    /// with the companion) and the companion family are kept apart.
    /// Otherwise there is a single family: every compatible arch.
    fn arch_lists(&self) -> Vec<Vec<String>> {
        let compatible = self.policy.compatible_arches(&self.platform_arch);

        match self.policy.multilib_companion(&self.platform_arch) {
            Some(companion) => {
                let secondary = self.policy.compatible_arches(&companion);
                let primary = compatible
                    .into_iter()
                    .filter(|arch| !secondary.contains(arch))
                    .collect();
                vec![primary, secondary]
            }
            None => vec![compatible],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, arch: &str, version: &str, release: &str) -> PackageRef {
        PackageRef::new(name, arch, Some("0"), version, release).unwrap()
    }

    fn evr(s: &str) -> Evr {
        Evr::parse(s).unwrap()
    }

    #[test]
    fn test_select_newest_empty_fails() {
        let result = select_newest(&RpmVersionComparator, &[]);
        assert!(matches!(result, Err(Error::EmptyCandidateSet)));
    }

    #[test]
    fn test_select_newest_single_and_multiple() {
        let one = [evr("1.0-1")];
        assert_eq!(select_newest(&RpmVersionComparator, &one).unwrap(), &one[0]);

        let many = [evr("1.0-1"), evr("1:0.5-1"), evr("2.0-1")];
        assert_eq!(
            select_newest(&RpmVersionComparator, &many).unwrap(),
            &evr("1:0.5-1")
        );
    }

    #[test]
    fn test_select_newest_ties_keep_first_seen() {
        // Equal under the comparator but structurally different
        let tied = [evr("1.0-1"), evr("0:1.0-1"), evr("1.00-1")];
        for _ in 0..3 {
            let newest = select_newest(&RpmVersionComparator, &tied).unwrap();
            assert!(std::ptr::eq(newest, &tied[0]));
        }
    }

    #[test]
    fn test_arch_lists_multilib_platform() {
        let resolver = UpdateResolver::new(vec![], vec![], "x86_64");
        let lists = resolver.arch_lists();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0], vec!["x86_64"]);
        assert_eq!(lists[1], vec!["athlon", "i686", "i586", "i486", "i386", "noarch"]);
    }

    #[test]
    fn test_arch_lists_plain_platform() {
        let resolver = UpdateResolver::new(vec![], vec![], "i686");
        let lists = resolver.arch_lists();
        assert_eq!(lists, vec![vec!["i686", "i586", "i486", "i386", "noarch"]]);
    }

    #[test]
    fn test_highest_in_arches_returns_all_tied_arches() {
        let resolver = UpdateResolver::new(vec![], vec![], "x86_64");
        let entries = vec![
            ("i686".to_string(), evr("0:1.0-1")),
            ("i586".to_string(), evr("0:1.0-1")),
            ("i386".to_string(), evr("0:0.9-1")),
            ("x86_64".to_string(), evr("0:5.0-1")),
        ];
        let list: Vec<String> = ["i686", "i586", "i386"].iter().map(|s| s.to_string()).collect();

        let highest = resolver.highest_in_arches("foo", &list, &entries).unwrap();
        let arches: Vec<&str> = highest.iter().map(|p| p.arch()).collect();
        assert_eq!(arches, vec!["i686", "i586"]);
        assert!(highest.iter().all(|p| p.version() == "1.0"));
    }

    #[test]
    fn test_resolver_defaults() {
        let resolver = UpdateResolver::new(vec![], vec![], "x86_64");
        assert!(resolver.is_exact_arch());
        assert_eq!(resolver.platform_arch(), "x86_64");
        assert!(!resolver.exact_arch(false).is_exact_arch());
    }

    #[test]
    fn test_empty_inputs_resolve_to_nothing() {
        let resolution = UpdateResolver::new(vec![], vec![], "x86_64").resolve().unwrap();
        assert!(resolution.updates().is_empty());
        assert!(resolution.obsoletes().is_empty());
        assert!(resolution.problems().is_empty());
    }

    #[test]
    fn test_uninstalled_names_are_ignored() {
        let available = vec![pkg("new-thing", "x86_64", "1.0", "1")];
        let resolution = UpdateResolver::new(vec![], available, "x86_64").resolve().unwrap();
        assert!(resolution.updates().is_empty());
    }

    #[test]
    fn test_simple_update() {
        let installed = vec![pkg("bar", "x86_64", "1.0", "1")];
        let available = vec![pkg("bar", "x86_64", "1.1", "1")];
        let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
            .resolve()
            .unwrap();

        let pairs = resolution.list_updates(None, None);
        assert_eq!(pairs, vec![(&available[0], &installed[0])]);
    }

    #[test]
    fn test_newest_available_build_is_chosen() {
        let installed = vec![pkg("bar", "x86_64", "1.0", "1")];
        let available = vec![
            pkg("bar", "x86_64", "1.1", "1"),
            pkg("bar", "x86_64", "1.3", "1"),
            pkg("bar", "x86_64", "1.2", "1"),
        ];
        let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
            .resolve()
            .unwrap();

        assert_eq!(
            resolution.updates().get(&installed[0]).unwrap(),
            &[available[1].clone()]
        );
    }

    #[test]
    fn test_older_or_equal_available_is_not_an_update() {
        let installed = vec![pkg("bar", "x86_64", "2.0", "1")];
        let available = vec![pkg("bar", "x86_64", "2.0", "1"), pkg("bar", "x86_64", "1.5", "1")];
        let resolution = UpdateResolver::new(installed, available, "x86_64").resolve().unwrap();
        assert!(resolution.updates().is_empty());
    }

    #[test]
    fn test_incompatible_arch_never_updates() {
        let installed = vec![pkg("bar", "x86_64", "1.0", "1")];
        let available = vec![pkg("bar", "ppc64", "9.0", "1")];
        let resolution = UpdateResolver::new(installed, available, "x86_64")
            .exact_arch(false)
            .resolve()
            .unwrap();
        assert!(resolution.updates().is_empty());
    }

    #[test]
    fn test_simple_exact_arch_requires_matching_arch() {
        let installed = vec![pkg("bar", "i686", "1.0", "1")];
        let available = vec![pkg("bar", "x86_64", "2.0", "1")];
        let resolution = UpdateResolver::new(installed, available, "x86_64").resolve().unwrap();
        assert!(resolution.updates().is_empty());
    }

    #[test]
    fn test_simple_any_arch_crosses_architectures() {
        let installed = vec![pkg("bar", "i686", "1.0", "1")];
        let available = vec![pkg("bar", "x86_64", "2.0", "1")];
        let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
            .exact_arch(false)
            .resolve()
            .unwrap();

        assert_eq!(
            resolution.updates().get(&installed[0]).unwrap(),
            &[available[0].clone()]
        );
    }

    #[test]
    fn test_simple_uses_newest_installed() {
        let installed = vec![
            pkg("kernel", "x86_64", "6.1", "1"),
            pkg("kernel", "x86_64", "6.5", "1"),
        ];
        let available = vec![pkg("kernel", "x86_64", "6.8", "1")];
        let resolution = UpdateResolver::new(installed.clone(), available, "x86_64")
            .resolve()
            .unwrap();

        assert!(resolution.updates().get(&installed[1]).is_some());
        assert!(resolution.updates().get(&installed[0]).is_none());
    }

    #[test]
    fn test_multilib_exact_arch_updates_each_arch() {
        let installed = vec![
            pkg("glibc", "x86_64", "2.38", "1"),
            pkg("glibc", "i686", "2.38", "1"),
        ];
        let available = vec![
            pkg("glibc", "x86_64", "2.39", "1"),
            pkg("glibc", "i686", "2.39", "1"),
        ];
        let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
            .resolve()
            .unwrap();

        assert_eq!(resolution.updates().len(), 2);
        assert_eq!(
            resolution.updates().get(&installed[0]).unwrap(),
            &[available[0].clone()]
        );
        assert_eq!(
            resolution.updates().get(&installed[1]).unwrap(),
            &[available[1].clone()]
        );
    }

    #[test]
    fn test_multilib_compat_arch_not_updated_by_native() {
        // Only the 64-bit build has an update; the i686 copy stays put
        let installed = vec![
            pkg("glibc", "x86_64", "2.38", "1"),
            pkg("glibc", "i686", "2.38", "1"),
        ];
        let available = vec![pkg("glibc", "x86_64", "2.39", "1")];

        for exact in [true, false] {
            let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
                .exact_arch(exact)
                .resolve()
                .unwrap();
            assert_eq!(resolution.updates().len(), 1);
            assert!(resolution.updates().get(&installed[0]).is_some());
            assert!(resolution.updates().get(&installed[1]).is_none());
        }
    }

    #[test]
    fn test_multilib_same_family_exact_arch() {
        let installed = vec![pkg("foo", "i686", "1.0", "1"), pkg("foo", "i586", "1.0", "1")];
        let available = vec![pkg("foo", "i686", "2.0", "1")];
        let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
            .resolve()
            .unwrap();

        assert_eq!(resolution.updates().len(), 1);
        assert_eq!(
            resolution.updates().get(&installed[0]).unwrap(),
            &[available[0].clone()]
        );
        assert!(resolution.updates().get(&installed[1]).is_none());
    }

    #[test]
    fn test_multilib_any_arch_picks_best_representatives() {
        let installed = vec![pkg("foo", "i586", "1.0", "1"), pkg("foo", "i686", "1.0", "1")];
        let available = vec![pkg("foo", "i386", "2.0", "1"), pkg("foo", "i686", "2.0", "1")];
        let resolution = UpdateResolver::new(installed.clone(), available.clone(), "x86_64")
            .exact_arch(false)
            .resolve()
            .unwrap();

        assert_eq!(resolution.updates().len(), 1);
        assert_eq!(
            resolution.updates().get(&installed[1]).unwrap(),
            &[available[1].clone()]
        );
    }

    #[test]
    fn test_complex_name_ignores_lower_installed_arch() {
        // Only the arches sharing the highest installed EVR are matched
        let installed = vec![pkg("foo", "i686", "1.0", "1"), pkg("foo", "i586", "0.5", "1")];
        let available = vec![pkg("foo", "i586", "0.9", "1"), pkg("foo", "i686", "0.9", "1")];
        let resolution = UpdateResolver::new(installed, available, "i686").resolve().unwrap();
        assert!(resolution.updates().is_empty());
    }

    #[test]
    fn test_every_update_is_strictly_newer() {
        let installed = vec![
            pkg("a", "x86_64", "1.0", "1"),
            pkg("b", "x86_64", "1.0", "1"),
            pkg("b", "i686", "1.0", "1"),
            pkg("c", "noarch", "3.0", "1"),
        ];
        let available = vec![
            pkg("a", "x86_64", "1.0", "2"),
            pkg("b", "x86_64", "0.9", "1"),
            pkg("b", "i686", "1.1", "1"),
            pkg("c", "noarch", "2.0", "1"),
        ];
        let resolution = UpdateResolver::new(installed, available, "x86_64").resolve().unwrap();

        assert_eq!(resolution.updates().len(), 2);
        for (installed, updates) in resolution.updates().iter() {
            for update in updates {
                assert!(RpmVersionComparator.is_newer(&update.evr(), &installed.evr()));
            }
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let installed = vec![
            pkg("glibc", "x86_64", "2.38", "1"),
            pkg("glibc", "i686", "2.38", "1"),
            pkg("bash", "x86_64", "5.1", "1"),
        ];
        let available = vec![
            pkg("glibc", "x86_64", "2.39", "1"),
            pkg("glibc", "i686", "2.39", "1"),
            pkg("bash", "x86_64", "5.2", "1"),
            pkg("bash", "x86_64", "5.2", "1"),
        ];
        let resolver = UpdateResolver::new(installed, available, "x86_64");
        let first = resolver.resolve().unwrap();
        let second = resolver.resolve().unwrap();
        assert_eq!(first.updates(), second.updates());
    }

    #[test]
    fn test_duplicate_inputs_do_not_duplicate_updates() {
        let installed = vec![pkg("bar", "x86_64", "1.0", "1"), pkg("bar", "x86_64", "1.0", "1")];
        let available = vec![pkg("bar", "x86_64", "1.1", "1"), pkg("bar", "x86_64", "1.1", "1")];
        let resolution = UpdateResolver::new(installed.clone(), available, "x86_64")
            .resolve()
            .unwrap();
        assert_eq!(resolution.updates().get(&installed[0]).unwrap().len(), 1);
    }

    #[test]
    fn test_injected_policy() {
        let table = ArchTable::from_edges(&[("archA", "archB"), ("archB", "noarch")], &[]);
        let installed = vec![pkg("foo", "archA", "1.0", "1"), pkg("foo", "archB", "1.0", "1")];
        let available = vec![pkg("foo", "archA", "2.0", "1")];

        let resolution = UpdateResolver::with_capabilities(
            installed.clone(),
            available.clone(),
            "archA",
            RpmVersionComparator,
            table,
        )
        .resolve()
        .unwrap();

        assert_eq!(resolution.list_updates(None, None), vec![(&available[0], &installed[0])]);
    }

    #[test]
    fn test_from_config() {
        let config = ResolverConfig {
            exact_arch: false,
            arch: Some("aarch64".to_string()),
        };
        let resolver = UpdateResolver::from_config(vec![], vec![], &config);
        assert_eq!(resolver.platform_arch(), "aarch64");
        assert!(!resolver.is_exact_arch());
    }
}
