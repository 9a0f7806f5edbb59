//! Vigil: file integrity monitoring.
//!
//! Snapshot file contents under a path into a baseline of BLAKE3 (or SHA-256)
//! digests, then classify every file as unmodified, modified, new or
//! unreadable on later checks.

pub mod cli;
pub mod core;
pub mod logging;
pub mod tripwire;

pub use crate::core::config::Config;
pub use crate::core::error::{Result, VigilError};
pub use crate::core::store::BaselineStore;
pub use crate::core::types::{Baseline, Classification, DigestRecord, Verdict};
pub use crate::tripwire::hasher::HashAlgorithm;
pub use crate::tripwire::reconcile::Engine;
