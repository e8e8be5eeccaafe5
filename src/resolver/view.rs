// src/resolver/view.rs

//! Read-only views over a finished resolution

use crate::packages::PackageRef;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Installed package → candidate packages, in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMapping {
    entries: BTreeMap<PackageRef, Vec<PackageRef>>,
}

impl PackageMapping {
    /// Add `candidate` under `installed`
    pub(crate) fn record(&mut self, installed: PackageRef, candidate: PackageRef) {
        self.entries.entry(installed).or_default().push(candidate);
    }

    /// Remove exact duplicate candidates within each key, keeping order
    pub(crate) fn condensed(self) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|(installed, candidates)| {
                let mut unique: Vec<PackageRef> = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    if !unique.contains(&candidate) {
                        unique.push(candidate);
                    }
                }
                (installed, unique)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, installed: &PackageRef) -> Option<&[PackageRef]> {
        self.entries.get(installed).map(Vec::as_slice)
    }

    pub fn contains(&self, installed: &PackageRef) -> bool {
        self.entries.contains_key(installed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageRef, &[PackageRef])> {
        self.entries
            .iter()
            .map(|(installed, candidates)| (installed, candidates.as_slice()))
    }

    /// Number of installed packages with at least one candidate
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten to (candidate, installed) pairs filtered on the candidate
    fn pairs(&self, name: Option<&str>, arch: Option<&str>) -> Vec<(&PackageRef, &PackageRef)> {
        self.entries
            .iter()
            .flat_map(|(installed, candidates)| {
                candidates.iter().map(move |candidate| (candidate, installed))
            })
            .filter(|(candidate, _)| name.is_none_or(|n| candidate.name() == n))
            .filter(|(candidate, _)| arch.is_none_or(|a| candidate.arch() == a))
            .collect()
    }

    /// Distinct candidates, filtered like `pairs`
    fn candidates(&self, name: Option<&str>, arch: Option<&str>) -> Vec<&PackageRef> {
        let mut unique: Vec<&PackageRef> = Vec::new();
        for (candidate, _) in self.pairs(name, arch) {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        unique
    }
}

/// A situation the caller has to settle before acting on a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// Both an update and an obsoleting package exist
    ObsoletedAndUpdated {
        installed: PackageRef,
        updates: Vec<PackageRef>,
        obsoleted_by: Vec<PackageRef>,
    },
    /// More than one package obsoletes the same installed package
    MultipleObsoletes {
        installed: PackageRef,
        obsoleted_by: Vec<PackageRef>,
    },
    /// More than one update remains for the same installed package
    MultipleUpdates {
        installed: PackageRef,
        updates: Vec<PackageRef>,
    },
}

fn join(packages: &[PackageRef]) -> String {
    packages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::ObsoletedAndUpdated {
                installed,
                updates,
                obsoleted_by,
            } => write!(
                f,
                "{} is updated by {} and obsoleted by {}",
                installed,
                join(updates),
                join(obsoleted_by)
            ),
            Problem::MultipleObsoletes {
                installed,
                obsoleted_by,
            } => write!(f, "{} is obsoleted by several packages: {}", installed, join(obsoleted_by)),
            Problem::MultipleUpdates { installed, updates } => {
                write!(f, "{} has several updates: {}", installed, join(updates))
            }
        }
    }
}

/// Outcome of one resolution run
///
/// Immutable once built; a new run produces a new value, so any number of
/// readers may share one (it is `Send + Sync`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    updates: PackageMapping,
    obsoletes: PackageMapping,
}

impl Resolution {
    pub(crate) fn new(updates: PackageMapping, obsoletes: PackageMapping) -> Self {
        Self { updates, obsoletes }
    }

    pub fn updates(&self) -> &PackageMapping {
        &self.updates
    }

    pub fn obsoletes(&self) -> &PackageMapping {
        &self.obsoletes
    }

    /// (available, installed) update pairs, optionally filtered on the
    /// available package's name and/or architecture
    pub fn list_updates(&self, name: Option<&str>, arch: Option<&str>) -> Vec<(&PackageRef, &PackageRef)> {
        self.updates.pairs(name, arch)
    }

    /// The updating packages alone
    pub fn update_packages(&self, name: Option<&str>, arch: Option<&str>) -> Vec<&PackageRef> {
        self.updates.candidates(name, arch)
    }

    /// (obsoleting, installed) pairs, filtered like `list_updates`
    pub fn list_obsoletes(&self, name: Option<&str>, arch: Option<&str>) -> Vec<(&PackageRef, &PackageRef)> {
        self.obsoletes.pairs(name, arch)
    }

    /// The obsoleting packages alone
    pub fn obsoleting_packages(&self, name: Option<&str>, arch: Option<&str>) -> Vec<&PackageRef> {
        self.obsoletes.candidates(name, arch)
    }

    /// Installed packages whose outcome is ambiguous
    pub fn problems(&self) -> Vec<Problem> {
        let mut problems = Vec::new();

        for (installed, obsoleted_by) in self.obsoletes.iter() {
            if let Some(updates) = self.updates.get(installed) {
                problems.push(Problem::ObsoletedAndUpdated {
                    installed: installed.clone(),
                    updates: updates.to_vec(),
                    obsoleted_by: obsoleted_by.to_vec(),
                });
            }
            if obsoleted_by.len() > 1 {
                problems.push(Problem::MultipleObsoletes {
                    installed: installed.clone(),
                    obsoleted_by: obsoleted_by.to_vec(),
                });
            }
        }

        for (installed, updates) in self.updates.iter() {
            if updates.len() > 1 {
                problems.push(Problem::MultipleUpdates {
                    installed: installed.clone(),
                    updates: updates.to_vec(),
                });
            }
        }

        problems
    }
}
