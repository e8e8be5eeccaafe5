// src/packages/nevra.rs

//! Package identity (name, epoch, version, release, architecture)

use crate::error::{Error, Result};
use crate::version::Evr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Immutable reference to one package build
///
/// Identity is the full 5-tuple. Construction rejects records without a
/// name or architecture, including records arriving through serde.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPackageRef")]
pub struct PackageRef {
    name: String,
    arch: String,
    epoch: Option<String>,
    version: String,
    release: String,
}

/// Unvalidated wire form of `PackageRef`
#[derive(Deserialize)]
struct RawPackageRef {
    name: String,
    arch: String,
    #[serde(default)]
    epoch: Option<String>,
    version: String,
    release: String,
}

impl TryFrom<RawPackageRef> for PackageRef {
    type Error = Error;

    fn try_from(raw: RawPackageRef) -> Result<Self> {
        PackageRef::new(
            &raw.name,
            &raw.arch,
            raw.epoch.as_deref(),
            &raw.version,
            &raw.release,
        )
    }
}

impl PackageRef {
    /// Create a package reference, rejecting a missing name or architecture
    pub fn new(
        name: &str,
        arch: &str,
        epoch: Option<&str>,
        version: &str,
        release: &str,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidPackageRef(format!(
                "missing name (arch '{}', version '{}-{}')",
                arch, version, release
            )));
        }
        if arch.trim().is_empty() {
            return Err(Error::InvalidPackageRef(format!(
                "missing architecture for '{}'",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            arch: arch.to_string(),
            epoch: epoch.map(str::to_string),
            version: version.to_string(),
            release: release.to_string(),
        })
    }

    /// Create a package reference from a name, an arch and an EVR
    pub fn from_evr(name: &str, arch: &str, evr: &Evr) -> Result<Self> {
        Self::new(name, arch, evr.epoch.as_deref(), &evr.version, &evr.release)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn epoch(&self) -> Option<&str> {
        self.epoch.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    /// The orderable epoch/version/release portion
    pub fn evr(&self) -> Evr {
        Evr {
            epoch: self.epoch.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-", self.name)?;
        if let Some(ref epoch) = self.epoch {
            write!(f, "{}:", epoch)?;
        }
        write!(f, "{}-{}.{}", self.version, self.release, self.arch)
    }
}

impl FromStr for PackageRef {
    type Err = Error;

    /// Parse `name-[epoch:]version-release.arch`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPackageRef(format!("not a NEVRA string: '{}'", s));

        let (nevr, arch) = s.trim().rsplit_once('.').ok_or_else(invalid)?;
        let (nev, release) = nevr.rsplit_once('-').ok_or_else(invalid)?;
        let (name, ev) = nev.rsplit_once('-').ok_or_else(invalid)?;

        let (epoch, version) = match ev.split_once(':') {
            Some((e, v)) => (Some(e), v),
            None => (None, ev),
        };

        if version.is_empty() || release.is_empty() {
            return Err(invalid());
        }

        Self::new(name, arch, epoch, version, release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_missing_name_or_arch() {
        assert!(matches!(
            PackageRef::new("", "x86_64", None, "1.0", "1"),
            Err(Error::InvalidPackageRef(_))
        ));
        assert!(matches!(
            PackageRef::new("bash", " ", None, "1.0", "1"),
            Err(Error::InvalidPackageRef(_))
        ));
    }

    #[test]
    fn test_parse_nevra() {
        let pkg: PackageRef = "perl-Text-CharWidth-1:0.04-52.fc40.x86_64".parse().unwrap();
        assert_eq!(pkg.name(), "perl-Text-CharWidth");
        assert_eq!(pkg.epoch(), Some("1"));
        assert_eq!(pkg.version(), "0.04");
        assert_eq!(pkg.release(), "52.fc40");
        assert_eq!(pkg.arch(), "x86_64");
    }

    #[test]
    fn test_parse_nevra_without_epoch() {
        let pkg: PackageRef = "bash-5.2.26-3.fc40.noarch".parse().unwrap();
        assert_eq!(pkg.name(), "bash");
        assert_eq!(pkg.epoch(), None);
        assert_eq!(pkg.to_string(), "bash-5.2.26-3.fc40.noarch");
    }

    #[test]
    fn test_parse_nevra_rejects_garbage() {
        assert!("bash".parse::<PackageRef>().is_err());
        assert!("bash-5.2.x86_64".parse::<PackageRef>().is_err());
        assert!("-1.0-1.x86_64".parse::<PackageRef>().is_err());
    }

    #[test]
    fn test_display_with_epoch() {
        let pkg = PackageRef::new("foo", "i686", Some("2"), "1.0", "3").unwrap();
        assert_eq!(pkg.to_string(), "foo-2:1.0-3.i686");
        assert_eq!(pkg.evr().to_string(), "2:1.0-3");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PackageRef = serde_json::from_str(
            r#"{"name":"foo","arch":"x86_64","version":"1.0","release":"1"}"#,
        )
        .unwrap();
        assert_eq!(ok.epoch(), None);

        let bad = serde_json::from_str::<PackageRef>(
            r#"{"name":"foo","arch":"","version":"1.0","release":"1"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialize_roundtrip_fields() {
        let pkg = PackageRef::new("foo", "x86_64", Some("1"), "2.0", "3").unwrap();
        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(json["name"], "foo");
        assert_eq!(json["epoch"], "1");
        assert_eq!(json["arch"], "x86_64");
    }
}
