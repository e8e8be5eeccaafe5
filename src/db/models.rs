// src/db/models.rs

//! Data models for installed packages
//!
//! Structs mapping to database rows, with the CRUD operations the CLI and
//! the resolver inputs need.

use crate::error::Result;
use crate::packages::PackageRef;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, name, epoch, version, release, arch, source_rpm, installed_at";

/// One installed package build
#[derive(Debug, Clone)]
pub struct InstalledPackage {
    pub id: Option<i64>,
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub source_rpm: Option<String>,
    pub installed_at: Option<String>,
}

impl InstalledPackage {
    /// Create an unsaved record for `pkg`
    pub fn from_package_ref(pkg: &PackageRef) -> Self {
        Self {
            id: None,
            name: pkg.name().to_string(),
            epoch: pkg.epoch().map(str::to_string),
            version: pkg.version().to_string(),
            release: pkg.release().to_string(),
            arch: pkg.arch().to_string(),
            source_rpm: None,
            installed_at: None,
        }
    }

    /// The package identity this record stands for
    pub fn to_package_ref(&self) -> Result<PackageRef> {
        PackageRef::new(
            &self.name,
            &self.arch,
            self.epoch.as_deref(),
            &self.version,
            &self.release,
        )
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO installed_packages (name, epoch, version, release, arch, source_rpm)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &self.name,
                &self.epoch,
                &self.version,
                &self.release,
                &self.arch,
                &self.source_rpm,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find the record for exactly `pkg`
    pub fn find(conn: &Connection, pkg: &PackageRef) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM installed_packages
             WHERE name = ?1 AND IFNULL(epoch, '') = ?2 AND version = ?3 AND release = ?4 AND arch = ?5",
            COLUMNS
        ))?;

        let found = stmt
            .query_row(
                params![
                    pkg.name(),
                    pkg.epoch().unwrap_or(""),
                    pkg.version(),
                    pkg.release(),
                    pkg.arch()
                ],
                Self::from_row,
            )
            .optional()?;

        Ok(found)
    }

    /// Find installed packages by name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM installed_packages WHERE name = ?1 ORDER BY arch, id",
            COLUMNS
        ))?;

        let packages = stmt
            .query_map([name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// List all installed packages
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM installed_packages ORDER BY name, arch, id",
            COLUMNS
        ))?;

        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(packages)
    }

    /// Delete an installed package by ID
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM installed_packages WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Convert a database row to an InstalledPackage
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            epoch: row.get(2)?,
            version: row.get(3)?,
            release: row.get(4)?,
            arch: row.get(5)?,
            source_rpm: row.get(6)?,
            installed_at: row.get(7)?,
        })
    }
}
