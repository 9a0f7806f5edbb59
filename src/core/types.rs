//! VG-001: Baseline records, per-file classifications, and operation reports.
//!
//! Reports are plain data: the engine produces them, the CLI renders them as
//! text or JSON.

use crate::tripwire::hasher::{HashAlgorithm, Unreadable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Baseline
// ============================================================================

/// One known-good file: canonical path and content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub path: String,
    pub digest: String,
}

/// The last known good state: at most one digest per path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Baseline {
    algorithm: HashAlgorithm,
    records: BTreeMap<String, String>,
}

impl Baseline {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            records: BTreeMap::new(),
        }
    }

    pub(crate) fn from_records(
        algorithm: HashAlgorithm,
        records: BTreeMap<String, String>,
    ) -> Self {
        Self { algorithm, records }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored digest for `path`, if tracked.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.records.get(path).map(String::as_str)
    }

    /// Insert or replace exactly one record. Returns the replaced digest.
    pub fn upsert(&mut self, path: impl Into<String>, digest: impl Into<String>) -> Option<String> {
        self.records.insert(path.into(), digest.into())
    }

    /// Records in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.records
            .iter()
            .map(|(p, d)| (p.as_str(), d.as_str()))
    }

    pub fn records(&self) -> Vec<DigestRecord> {
        self.iter()
            .map(|(path, digest)| DigestRecord {
                path: path.to_string(),
                digest: digest.to_string(),
            })
            .collect()
    }

    /// Tracked paths equal to or beneath `root`.
    pub fn paths_under<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = &'a str> {
        self.records
            .keys()
            .map(String::as_str)
            .filter(move |p| Path::new(p).starts_with(root))
    }

    pub(crate) fn as_map(&self) -> &BTreeMap<String, String> {
        &self.records
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Outcome of comparing one file against the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    Unmodified,
    Modified { expected: String, actual: String },
    /// On disk, not in the baseline.
    New { actual: String },
    /// Could not be hashed; a blind spot, not a verdict input.
    Unreadable { reason: String },
}

impl Classification {
    /// Counts against the aggregate verdict.
    pub fn is_deviation(&self) -> bool {
        matches!(self, Self::Modified { .. } | Self::New { .. })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmodified => write!(f, "UNMODIFIED"),
            Self::Modified { .. } => write!(f, "MODIFIED"),
            Self::New { .. } => write!(f, "NEW"),
            Self::Unreadable { .. } => write!(f, "UNREADABLE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: String,
    #[serde(flatten)]
    pub classification: Classification,
}

/// Aggregate result of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    Deviated,
}

impl Verdict {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        if outcomes.iter().any(|o| o.classification.is_deviation()) {
            Self::Deviated
        } else {
            Self::Clean
        }
    }

    pub fn is_clean(self) -> bool {
        self == Self::Clean
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "CLEAN"),
            Self::Deviated => write!(f, "DEVIATED"),
        }
    }
}

/// A directory entry the walk did not hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: String,
}

impl SkippedEntry {
    pub fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string_lossy().into_owned(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub root: String,
    pub store: PathBuf,
    pub algorithm: HashAlgorithm,
    pub recorded: Vec<DigestRecord>,
    pub unreadable: Vec<Unreadable>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub root: String,
    pub algorithm: HashAlgorithm,
    pub verdict: Verdict,
    pub outcomes: Vec<FileOutcome>,
    /// Baseline paths beneath the target that were not found on disk.
    pub missing: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl VerifyReport {
    pub fn count(&self, pred: impl Fn(&Classification) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| pred(&o.classification))
            .count()
    }

    pub fn unreadable_count(&self) -> usize {
        self.count(|c| matches!(c, Classification::Unreadable { .. }))
    }

    pub fn classification_of(&self, path: &str) -> Option<&Classification> {
        self.outcomes
            .iter()
            .find(|o| o.path == path)
            .map(|o| &o.classification)
    }

    /// Anything that leaves the check incomplete: unreadable files or missing records.
    pub fn has_blind_spots(&self) -> bool {
        self.unreadable_count() > 0 || !self.missing.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub record: DigestRecord,
    pub previous: Option<String>,
    pub store: PathBuf,
}
