// src/repository/parsers/json.rs

//! JSON package list parser
//!
//! Accepts an array whose items are either NEVRA strings or objects with
//! `name`, `arch`, `epoch`, `version` and `release` fields. JSON lists
//! carry no obsoletes.

use super::{MetadataParser, RepositoryMetadata};
use crate::error::Result;
use crate::packages::PackageRef;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum ListItem {
    Nevra(String),
    Record(PackageRef),
}

/// Parser for JSON package lists
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageListParser;

impl PackageListParser {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataParser for PackageListParser {
    fn parse(&self, content: &str) -> Result<RepositoryMetadata> {
        let items: Vec<ListItem> = serde_json::from_str(content)?;
        let packages = items
            .into_iter()
            .map(|item| match item {
                ListItem::Nevra(nevra) => nevra.parse(),
                ListItem::Record(pkg) => Ok(pkg),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RepositoryMetadata {
            packages,
            ..Default::default()
        })
    }
}
