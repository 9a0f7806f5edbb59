//! VG-003: Baseline persistence: load, validate, save (atomic).

use super::error::{Result, VigilError};
use super::types::Baseline;
use crate::tripwire::hasher::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SCHEMA: &str = "1.0";

/// On-disk shape of a baseline.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BaselineFile {
    schema: String,
    #[serde(default)]
    generator: Option<String>,
    algorithm: HashAlgorithm,
    #[serde(default)]
    records: BTreeMap<String, String>,
}

/// Sole reader and writer of one baseline file.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Load the baseline. Returns None if the store file doesn't exist.
    pub fn load_existing(&self) -> Result<Option<Baseline>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(self.corrupt(format!("not UTF-8: {}", e)));
            }
            Err(e) => return Err(VigilError::io(&self.path, e)),
        };
        self.parse(&content).map(Some)
    }

    /// Load the baseline, empty if none has been saved yet.
    pub fn load(&self) -> Result<Baseline> {
        Ok(self.load_existing()?.unwrap_or_default())
    }

    fn parse(&self, content: &str) -> Result<Baseline> {
        let file: BaselineFile =
            serde_yaml_ng::from_str(content).map_err(|e| self.corrupt(e.to_string()))?;
        if file.schema != SCHEMA {
            return Err(self.corrupt(format!(
                "unsupported schema \"{}\" (expected \"{}\")",
                file.schema, SCHEMA
            )));
        }
        for (path, digest) in &file.records {
            if !file.algorithm.is_valid_digest(digest) {
                return Err(self.corrupt(format!(
                    "record {} has invalid {} digest \"{}\"",
                    path, file.algorithm, digest
                )));
            }
        }
        Ok(Baseline::from_records(file.algorithm, file.records))
    }

    /// Save the full record set atomically (write to temp, then rename).
    pub fn save(&self, baseline: &Baseline) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VigilError::io(parent, e))?;
        }

        let file = BaselineFile {
            schema: SCHEMA.to_string(),
            generator: Some(format!("vigil {}", env!("CARGO_PKG_VERSION"))),
            algorithm: baseline.algorithm(),
            records: baseline.as_map().clone(),
        };
        let yaml = serde_yaml_ng::to_string(&file)
            .map_err(|e| VigilError::io(&self.path, std::io::Error::other(e)))?;

        let tmp_path = self.tmp_path();
        if let Err(e) = std::fs::write(&tmp_path, &yaml) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(VigilError::io(&tmp_path, e));
        }
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(VigilError::io(&self.path, e));
        }

        tracing::debug!(store = %self.path.display(), records = baseline.len(), "baseline saved");
        Ok(())
    }

    fn corrupt(&self, reason: String) -> VigilError {
        VigilError::CorruptBaseline {
            store: self.path.clone(),
            reason,
        }
    }
}
