// src/packages/mod.rs

//! Package identities and the sources they are read from
//!
//! `PackageRef` is the NEVRA value the resolver works on. Each input
//! format implements the `PackageSource` trait.

pub mod nevra;
pub mod rpm;
pub mod traits;

pub use nevra::PackageRef;
pub use traits::PackageSource;
