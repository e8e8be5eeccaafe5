// src/arch/mod.rs

//! Architecture compatibility policy
//!
//! The resolver never decides on its own which architectures can run on a
//! platform. It asks an `ArchitecturePolicy`, which callers inject, so that
//! tests can pin arbitrary platforms. `ArchTable` is the default policy
//! built from the usual RPM architecture chains.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Capability answering architecture questions for a platform
pub trait ArchitecturePolicy {
    /// Architectures that can run on `platform_arch`, best match first
    fn compatible_arches(&self, platform_arch: &str) -> Vec<String>;

    /// The secondary architecture family of a multilib platform, if any
    fn multilib_companion(&self, platform_arch: &str) -> Option<String>;

    /// Pick the candidate closest to `platform_arch`
    ///
    /// Returns `None` when no candidate can run on the platform.
    fn best_arch(&self, candidates: &[&str], platform_arch: &str) -> Option<String> {
        let compatible = self.compatible_arches(platform_arch);
        candidates
            .iter()
            .filter_map(|arch| {
                compatible
                    .iter()
                    .position(|c| c == arch)
                    .map(|score| (score, *arch))
            })
            .min_by_key(|(score, _)| *score)
            .map(|(_, arch)| arch.to_string())
    }
}

/// Child → parent edges of the architecture compatibility chains
const ARCH_PARENTS: &[(&str, &str)] = &[
    // amd64
    ("x86_64", "athlon"),
    ("amd64", "x86_64"),
    ("ia32e", "x86_64"),
    // x86
    ("athlon", "i686"),
    ("i686", "i586"),
    ("i586", "i486"),
    ("i486", "i386"),
    ("i386", "noarch"),
    // arm
    ("aarch64", "noarch"),
    ("armv7hl", "armv7l"),
    ("armv7l", "armv6l"),
    ("armv6l", "armv5tel"),
    ("armv5tel", "noarch"),
    // ppc
    ("ppc64le", "noarch"),
    ("ppc64iseries", "ppc64"),
    ("ppc64pseries", "ppc64"),
    ("ppc64", "ppc"),
    ("ppc", "noarch"),
    // s390
    ("s390x", "s390"),
    ("s390", "noarch"),
    // sparc
    ("sparc64", "sparcv9"),
    ("sparcv9", "sparcv8"),
    ("sparcv8", "sparc"),
    ("sparc", "noarch"),
    // ia64
    ("ia64", "noarch"),
    // riscv
    ("riscv64", "noarch"),
];

/// Multilib platforms and the head of their 32-bit compat chain
const MULTILIB_COMPANIONS: &[(&str, &str)] = &[
    ("x86_64", "athlon"),
    ("amd64", "athlon"),
    ("ia32e", "athlon"),
    ("ppc64", "ppc"),
    ("ppc64iseries", "ppc"),
    ("ppc64pseries", "ppc"),
    ("s390x", "s390"),
    ("sparc64", "sparcv9"),
];

/// Table-driven architecture policy
#[derive(Debug, Clone)]
pub struct ArchTable {
    parents: HashMap<String, String>,
    companions: HashMap<String, String>,
}

impl ArchTable {
    /// Create the default table covering the common RPM architectures
    pub fn new() -> Self {
        Self::from_edges(ARCH_PARENTS, MULTILIB_COMPANIONS)
    }

    /// Build a table from explicit parent edges and multilib companions
    pub fn from_edges(parents: &[(&str, &str)], companions: &[(&str, &str)]) -> Self {
        Self {
            parents: parents
                .iter()
                .map(|(c, p)| (c.to_string(), p.to_string()))
                .collect(),
            companions: companions
                .iter()
                .map(|(a, c)| (a.to_string(), c.to_string()))
                .collect(),
        }
    }

    /// Whether the table knows `arch` at all
    pub fn is_known(&self, arch: &str) -> bool {
        arch == "noarch" || self.parents.contains_key(arch)
    }

    /// Validate that `arch` is known, for use on user-supplied platforms
    pub fn require_known(&self, arch: &str) -> Result<()> {
        if self.is_known(arch) {
            Ok(())
        } else {
            Err(Error::UnknownArch(arch.to_string()))
        }
    }

    /// Canonical architecture of the running machine
    pub fn canonical_arch() -> String {
        match std::env::consts::ARCH {
            "x86" => "i686".to_string(),
            "arm" => "armv7hl".to_string(),
            "powerpc" => "ppc".to_string(),
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le".to_string(),
            "powerpc64" => "ppc64".to_string(),
            other => other.to_string(),
        }
    }
}

impl Default for ArchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchitecturePolicy for ArchTable {
    fn compatible_arches(&self, platform_arch: &str) -> Vec<String> {
        let mut arches = vec![platform_arch.to_string()];
        let mut current = platform_arch;

        while let Some(parent) = self.parents.get(current) {
            // Guard against a malformed table looping back on itself
            if arches.iter().any(|a| a == parent) {
                break;
            }
            arches.push(parent.clone());
            current = parent.as_str();
        }

        if !arches.iter().any(|a| a == "noarch") {
            arches.push("noarch".to_string());
        }

        arches
    }

    fn multilib_companion(&self, platform_arch: &str) -> Option<String> {
        self.companions.get(platform_arch).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatible_arches_x86_64() {
        let table = ArchTable::new();
        assert_eq!(
            table.compatible_arches("x86_64"),
            vec!["x86_64", "athlon", "i686", "i586", "i486", "i386", "noarch"]
        );
    }

    #[test]
    fn test_compatible_arches_unknown_platform() {
        let table = ArchTable::new();
        assert_eq!(table.compatible_arches("mips"), vec!["mips", "noarch"]);
        assert!(table.require_known("mips").is_err());
        assert!(table.require_known("noarch").is_ok());
    }

    #[test]
    fn test_compatible_arches_noarch_only_once() {
        let table = ArchTable::new();
        assert_eq!(table.compatible_arches("noarch"), vec!["noarch"]);
        assert_eq!(table.compatible_arches("aarch64"), vec!["aarch64", "noarch"]);
    }

    #[test]
    fn test_multilib_companion() {
        let table = ArchTable::new();
        assert_eq!(table.multilib_companion("x86_64").as_deref(), Some("athlon"));
        assert_eq!(table.multilib_companion("s390x").as_deref(), Some("s390"));
        assert_eq!(table.multilib_companion("i686"), None);
        assert_eq!(table.multilib_companion("aarch64"), None);
    }

    #[test]
    fn test_best_arch_prefers_closest() {
        let table = ArchTable::new();
        assert_eq!(
            table.best_arch(&["i386", "x86_64", "i686"], "x86_64").as_deref(),
            Some("x86_64")
        );
        assert_eq!(
            table.best_arch(&["i386", "i686", "noarch"], "x86_64").as_deref(),
            Some("i686")
        );
    }

    #[test]
    fn test_best_arch_none_when_incompatible() {
        let table = ArchTable::new();
        assert_eq!(table.best_arch(&["ppc64", "s390x"], "x86_64"), None);
        assert_eq!(table.best_arch(&[], "x86_64"), None);
    }

    #[test]
    fn test_custom_table() {
        let table = ArchTable::from_edges(&[("archA", "archB"), ("archB", "noarch")], &[]);
        assert_eq!(table.compatible_arches("archA"), vec!["archA", "archB", "noarch"]);
        assert!(table.is_known("archB"));
    }
}
