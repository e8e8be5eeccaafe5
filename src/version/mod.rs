// src/version/mod.rs

//! Epoch:version-release handling for RPM-style packages
//!
//! This module provides the `Evr` value, the `VersionComparator` capability
//! the resolver consumes, an RPM segment-by-segment comparator, and version
//! constraints as they appear in obsoletes metadata.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The orderable portion of a package identity
///
/// An absent epoch compares like epoch `0`. An empty release is only
/// meaningful inside version constraints, where it means "any release".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evr {
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
}

impl Evr {
    pub fn new(epoch: Option<&str>, version: &str, release: &str) -> Self {
        Self {
            epoch: epoch.map(str::to_string),
            version: version.to_string(),
            release: release.to_string(),
        }
    }

    /// Parse an epoch:version-release string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2.3" → epoch=None, version="1.2.3", release=""
    /// - "2:1.2.3-4.el8" → epoch=Some("2"), version="1.2.3", release="4.el8"
    /// - ":1.0-1" → epoch=None (empty epoch is treated as absent)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) => (e, r),
            None => ("", s),
        };

        if !epoch.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidVersion(format!(
                "Non-numeric epoch in '{}'",
                s
            )));
        }

        let (version, release) = match rest.split_once('-') {
            Some((v, r)) => (v, r),
            None => (rest, ""),
        };

        if version.is_empty() {
            return Err(Error::InvalidVersion(format!(
                "Empty version component in '{}'",
                s
            )));
        }

        Ok(Self {
            epoch: (!epoch.is_empty()).then(|| epoch.to_string()),
            version: version.to_string(),
            release: release.to_string(),
        })
    }

    /// Epoch as compared: absent epochs sort as `0`
    pub fn epoch_or_zero(&self) -> &str {
        self.epoch.as_deref().unwrap_or("0")
    }

    /// Copy of this EVR with the release cleared
    fn without_release(&self) -> Self {
        Self {
            epoch: self.epoch.clone(),
            version: self.version.clone(),
            release: String::new(),
        }
    }
}

impl fmt::Display for Evr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref epoch) = self.epoch {
            write!(f, "{}:", epoch)?;
        }
        write!(f, "{}", self.version)?;
        if !self.release.is_empty() {
            write!(f, "-{}", self.release)?;
        }
        Ok(())
    }
}

/// Total ordering over epoch/version/release triples
///
/// Implementations must order by epoch first, then version, then release.
pub trait VersionComparator {
    fn compare(&self, a: &Evr, b: &Evr) -> Ordering;

    /// True when `a` is strictly newer than `b`
    fn is_newer(&self, a: &Evr, b: &Evr) -> bool {
        self.compare(a, b) == Ordering::Greater
    }
}

/// RPM's comparison rules (the `rpmvercmp` algorithm applied per field)
#[derive(Debug, Clone, Copy, Default)]
pub struct RpmVersionComparator;

impl VersionComparator for RpmVersionComparator {
    fn compare(&self, a: &Evr, b: &Evr) -> Ordering {
        rpmvercmp(a.epoch_or_zero(), b.epoch_or_zero())
            .then_with(|| rpmvercmp(&a.version, &b.version))
            .then_with(|| rpmvercmp(&a.release, &b.release))
    }
}

/// Compare two version (or release) strings segment by segment
///
/// Digits compare numerically, letters lexically, and a numeric segment
/// is always newer than an alphabetic one. `~` sorts before anything,
/// including the end of the string; `^` sorts after the end of the string
/// but before any other segment.
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut one = a.as_bytes();
    let mut two = b.as_bytes();

    while !one.is_empty() || !two.is_empty() {
        one = skip_separators(one);
        two = skip_separators(two);

        if one.first() == Some(&b'~') || two.first() == Some(&b'~') {
            if one.first() != Some(&b'~') {
                return Ordering::Greater;
            }
            if two.first() != Some(&b'~') {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        if one.first() == Some(&b'^') || two.first() == Some(&b'^') {
            if one.is_empty() {
                return Ordering::Less;
            }
            if two.is_empty() {
                return Ordering::Greater;
            }
            if one[0] != b'^' {
                return Ordering::Greater;
            }
            if two[0] != b'^' {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one[0].is_ascii_digit();
        let (seg1, rest1) = split_segment(one, numeric);
        let (seg2, rest2) = split_segment(two, numeric);

        if seg2.is_empty() {
            // Segment types differ; numbers are newer than letters
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let seg1 = trim_leading_zeros(seg1);
            let seg2 = trim_leading_zeros(seg2);
            seg1.len().cmp(&seg2.len()).then_with(|| seg1.cmp(seg2))
        } else {
            seg1.cmp(seg2)
        };

        if ord != Ordering::Equal {
            return ord;
        }

        one = rest1;
        two = rest2;
    }

    match (one.is_empty(), two.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, _) => Ordering::Greater,
    }
}

fn skip_separators(s: &[u8]) -> &[u8] {
    let skip = s
        .iter()
        .take_while(|&&c| !c.is_ascii_alphanumeric() && c != b'~' && c != b'^')
        .count();
    &s[skip..]
}

fn split_segment(s: &[u8], numeric: bool) -> (&[u8], &[u8]) {
    let len = s
        .iter()
        .take_while(|c| {
            if numeric {
                c.is_ascii_digit()
            } else {
                c.is_ascii_alphabetic()
            }
        })
        .count();
    s.split_at(len)
}

fn trim_leading_zeros(s: &[u8]) -> &[u8] {
    let zeros = s.iter().take_while(|&&c| c == b'0').count();
    &s[zeros..]
}

/// Version constraint as found in obsoletes (and other relation) metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// Any version is acceptable
    Any,
    Equal(Evr),
    LessThan(Evr),
    LessOrEqual(Evr),
    GreaterThan(Evr),
    GreaterOrEqual(Evr),
}

impl VersionConstraint {
    /// Parse a textual constraint
    ///
    /// Examples:
    /// - ">= 1.2-3" → GreaterOrEqual(1.2-3)
    /// - "< 2:1.0" → LessThan(2:1.0)
    /// - "1.5" → Equal(1.5)
    /// - "" or "*" → Any
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(VersionConstraint::Any);
        }

        if let Some(rest) = s.strip_prefix(">=") {
            Ok(VersionConstraint::GreaterOrEqual(Evr::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix("<=") {
            Ok(VersionConstraint::LessOrEqual(Evr::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('>') {
            Ok(VersionConstraint::GreaterThan(Evr::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('<') {
            Ok(VersionConstraint::LessThan(Evr::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('=') {
            Ok(VersionConstraint::Equal(Evr::parse(rest)?))
        } else {
            Ok(VersionConstraint::Equal(Evr::parse(s)?))
        }
    }

    /// Build a constraint from repodata `flags` (EQ, LT, LE, GT, GE)
    pub fn from_flags(flags: Option<&str>, evr: Option<Evr>) -> Result<Self> {
        let (flags, evr) = match (flags, evr) {
            (None, _) | (_, None) => return Ok(VersionConstraint::Any),
            (Some(flags), Some(evr)) => (flags, evr),
        };

        match flags {
            "EQ" => Ok(VersionConstraint::Equal(evr)),
            "LT" => Ok(VersionConstraint::LessThan(evr)),
            "LE" => Ok(VersionConstraint::LessOrEqual(evr)),
            "GT" => Ok(VersionConstraint::GreaterThan(evr)),
            "GE" => Ok(VersionConstraint::GreaterOrEqual(evr)),
            other => Err(Error::ParseError(format!(
                "Unknown version flags: {}",
                other
            ))),
        }
    }

    /// Check whether `evr` satisfies this constraint under `comparator`
    ///
    /// A constraint EVR with no release matches every release of its version.
    pub fn satisfied_by<C: VersionComparator + ?Sized>(&self, evr: &Evr, comparator: &C) -> bool {
        let target = match self {
            VersionConstraint::Any => return true,
            VersionConstraint::Equal(v)
            | VersionConstraint::LessThan(v)
            | VersionConstraint::LessOrEqual(v)
            | VersionConstraint::GreaterThan(v)
            | VersionConstraint::GreaterOrEqual(v) => v,
        };

        let ord = if target.release.is_empty() {
            comparator.compare(&evr.without_release(), target)
        } else {
            comparator.compare(evr, target)
        };

        match self {
            VersionConstraint::Any => true,
            VersionConstraint::Equal(_) => ord == Ordering::Equal,
            VersionConstraint::LessThan(_) => ord == Ordering::Less,
            VersionConstraint::LessOrEqual(_) => ord != Ordering::Greater,
            VersionConstraint::GreaterThan(_) => ord == Ordering::Greater,
            VersionConstraint::GreaterOrEqual(_) => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Any => write!(f, "*"),
            VersionConstraint::Equal(v) => write!(f, "= {}", v),
            VersionConstraint::LessThan(v) => write!(f, "< {}", v),
            VersionConstraint::LessOrEqual(v) => write!(f, "<= {}", v),
            VersionConstraint::GreaterThan(v) => write!(f, "> {}", v),
            VersionConstraint::GreaterOrEqual(v) => write!(f, ">= {}", v),
        }
    }
}
