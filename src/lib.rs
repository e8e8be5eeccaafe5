// src/lib.rs

//! Conary update resolution
//!
//! Decides which available RPM packages update, or obsolete, the packages
//! installed on a system.
//!
//! # Architecture
//!
//! - Package identities are NEVRA values (`packages::PackageRef`)
//! - Versions compare with RPM's rules (`version`)
//! - Architecture compatibility and multilib pairing come from `arch`
//! - `resolver::UpdateResolver` produces an immutable `resolver::Resolution`
//! - Installed packages live in SQLite (`db`); available packages come from
//!   repository metadata or `.rpm` files (`repository`, `packages::rpm`)

pub mod arch;
pub mod config;
pub mod db;
mod error;
pub mod packages;
pub mod repository;
pub mod resolver;
pub mod version;

pub use error::{Error, Result};
