// src/error.rs

use thiserror::Error;

/// Core error types for conary-updates
#[derive(Error, Debug)]
pub enum Error {
    /// Newest-version selection was asked to pick from nothing
    #[error("Cannot select the newest version from an empty candidate set")]
    EmptyCandidateSet,

    /// A package record without a name or architecture
    #[error("Invalid package reference: {0}")]
    InvalidPackageRef(String),

    /// An unparseable epoch:version-release string
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Architecture not known to the architecture table
    #[error("Unknown architecture: {0}")]
    UnknownArch(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Metadata parsing errors
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Database initialization error
    #[error("Failed to initialize database: {0}")]
    InitError(String),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),
}

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
