//! pgxguard-common — Shared types, errors, and scoring primitives used across all
//! PGxGuard crates.

pub mod confidence;
pub mod error;
pub mod profile;

// Re-export commonly used types
pub use error::{PgxError, Result};
pub use profile::{GeneCall, GenomicProfile, Phenotype, Severity, Variant};
