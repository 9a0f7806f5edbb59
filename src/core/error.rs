//! VG-009: Error taxonomy for baseline operations.
//!
//! Structural failures (missing or corrupt baseline, bad target) abort a whole
//! operation. `Unreadable` is the one per-file failure: walks record it as a
//! classification and keep going, only `update` surfaces it as an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VigilError {
    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("cannot read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("no baseline at {}; run `vigil init <path>` first", store.display())]
    BaselineMissing { store: PathBuf },

    #[error("corrupt baseline {}: {reason}", store.display())]
    CorruptBaseline { store: PathBuf, reason: String },

    #[error("invalid target {}: {reason}", path.display())]
    InvalidTarget { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, VigilError>;

impl VigilError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
