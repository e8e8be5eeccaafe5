// src/repository/parsers/fedora.rs

//! Fedora/RPM repository metadata parser
//!
//! Parses Fedora-style primary.xml files. Each `<package>` yields one
//! available package; its `<rpm:obsoletes>` entries feed the obsoletes
//! table. Source packages are skipped.

use super::{MetadataParser, RepositoryMetadata};
use crate::error::{Error, Result};
use crate::packages::PackageRef;
use crate::resolver::ObsoleteSpec;
use crate::version::{Evr, VersionConstraint};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

/// primary.xml parser
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryXmlParser;

impl PrimaryXmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataParser for PrimaryXmlParser {
    fn parse(&self, xml_content: &str) -> Result<RepositoryMetadata> {
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);

        let mut metadata = RepositoryMetadata::default();
        let mut buf = Vec::new();

        // Current package being built
        let mut current_package: Option<PackageBuilder> = None;
        let mut current_tag = String::new();
        let mut in_obsoletes = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let tag_name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();

                    match tag_name.as_str() {
                        "package" => current_package = Some(PackageBuilder::default()),
                        "obsoletes" => in_obsoletes = true,
                        _ => {}
                    }
                    current_tag = tag_name;
                }
                Ok(Event::Empty(e)) => {
                    if let Some(ref mut pkg) = current_package {
                        match e.local_name().as_ref() {
                            b"version" => {
                                let attrs = attributes(&e);
                                pkg.epoch = attrs.epoch;
                                pkg.ver = attrs.ver;
                                pkg.rel = attrs.rel;
                            }
                            b"entry" if in_obsoletes => pkg.obsoletes.push(attributes(&e)),
                            _ => {}
                        }
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(ref mut pkg) = current_package {
                        let text = e.unescape().unwrap_or_default().to_string();
                        match current_tag.as_str() {
                            "name" => pkg.name = Some(text),
                            "arch" => pkg.arch = Some(text),
                            _ => {}
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    match e.local_name().as_ref() {
                        b"package" => {
                            if let Some(builder) = current_package.take() {
                                builder.finish(&mut metadata);
                            }
                        }
                        b"obsoletes" => in_obsoletes = false,
                        _ => {}
                    }
                    current_tag.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::ParseError(format!(
                        "Failed to parse primary.xml at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        debug!(
            "Parsed {} package(s), {} with obsoletes",
            metadata.packages.len(),
            metadata.obsoletes.len()
        );
        Ok(metadata)
    }
}

/// Attributes shared by `<version>` and `<rpm:entry>` elements
#[derive(Debug, Default)]
struct EntryAttributes {
    name: Option<String>,
    flags: Option<String>,
    epoch: Option<String>,
    ver: Option<String>,
    rel: Option<String>,
}

fn attributes(e: &BytesStart<'_>) -> EntryAttributes {
    let mut attrs = EntryAttributes::default();
    for attr in e.attributes().filter_map(|a| a.ok()) {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"name" => attrs.name = Some(value),
            b"flags" => attrs.flags = Some(value),
            b"epoch" => attrs.epoch = Some(value),
            b"ver" => attrs.ver = Some(value),
            b"rel" => attrs.rel = Some(value),
            _ => {}
        }
    }
    attrs
}

impl EntryAttributes {
    fn to_obsolete_spec(&self) -> Result<ObsoleteSpec> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| Error::ParseError("Obsoletes entry without a name".to_string()))?;
        let evr = self
            .ver
            .as_deref()
            .map(|ver| Evr::new(self.epoch.as_deref(), ver, self.rel.as_deref().unwrap_or("")));
        let constraint = VersionConstraint::from_flags(self.flags.as_deref(), evr)?;
        Ok(ObsoleteSpec::new(name, constraint))
    }
}

/// Collects one `<package>` element's fields
#[derive(Debug, Default)]
struct PackageBuilder {
    name: Option<String>,
    arch: Option<String>,
    epoch: Option<String>,
    ver: Option<String>,
    rel: Option<String>,
    obsoletes: Vec<EntryAttributes>,
}

impl PackageBuilder {
    fn build(&self) -> Result<PackageRef> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| Error::ParseError("Missing package name".to_string()))?;
        let arch = self
            .arch
            .as_deref()
            .ok_or_else(|| Error::ParseError(format!("Missing arch for {}", name)))?;
        let ver = self
            .ver
            .as_deref()
            .ok_or_else(|| Error::ParseError(format!("Missing version for {}", name)))?;
        let rel = self
            .rel
            .as_deref()
            .ok_or_else(|| Error::ParseError(format!("Missing release for {}", name)))?;

        PackageRef::new(name, arch, self.epoch.as_deref(), ver, rel)
    }

    /// Add the package (and its obsoletes) to `metadata`, or log why not
    fn finish(self, metadata: &mut RepositoryMetadata) {
        if matches!(self.arch.as_deref(), Some("src" | "nosrc")) {
            return;
        }

        let pkg = match self.build() {
            Ok(pkg) => pkg,
            Err(e) => {
                warn!("Skipping package entry: {}", e);
                return;
            }
        };

        let mut specs = Vec::with_capacity(self.obsoletes.len());
        for entry in &self.obsoletes {
            match entry.to_obsolete_spec() {
                Ok(spec) => specs.push(spec),
                Err(e) => warn!("Ignoring obsoletes entry of {}: {}", pkg, e),
            }
        }

        metadata.obsoletes.add(pkg.clone(), specs);
        metadata.packages.push(pkg);
    }
}
