// src/config.rs

//! Resolver configuration
//!
//! Stored as JSON. Every field is optional in the file; missing fields take
//! their defaults.

use crate::arch::ArchTable;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Only let an update replace a package of the same architecture
    pub exact_arch: bool,
    /// Platform architecture; the running machine's when unset
    pub arch: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            exact_arch: true,
            arch: None,
        }
    }
}

impl ResolverConfig {
    /// Read a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading resolver config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The platform architecture to resolve for
    pub fn platform_arch(&self) -> String {
        self.arch.clone().unwrap_or_else(ArchTable::canonical_arch)
    }
}
