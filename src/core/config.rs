//! VG-004: Run configuration: optional `vigil.yaml` plus command-line overrides.
//!
//! Precedence is flag > config file > built-in default.
//!
//! Exclude patterns are unanchored: a path is excluded when any trailing run
//! of its components matches, so `archive/**` excludes `/logs/archive/x.log`
//! whether the walk starts at `/logs` or at `/logs/archive`.
//!
//! ```yaml
//! store: state/vigil.lock.yaml   # relative to this file
//! algorithm: sha256
//! exclude: ["*.gz", "archive/**"]
//! jobs: 4
//! ```

use super::error::{Result, VigilError};
use crate::tripwire::hasher::HashAlgorithm;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "vigil.yaml";
pub const DEFAULT_STORE_FILE: &str = "vigil.lock.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    store: Option<PathBuf>,
    #[serde(default)]
    algorithm: Option<HashAlgorithm>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    jobs: Option<usize>,
}

/// Values given on the command line; `None` defers to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store: Option<PathBuf>,
    pub algorithm: Option<HashAlgorithm>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Baseline store file.
    pub store: PathBuf,
    /// Algorithm for new baselines. Existing baselines keep their own.
    pub algorithm: HashAlgorithm,
    /// Unanchored globs, see [`Config::is_excluded`].
    pub exclude: Vec<glob::Pattern>,
    /// Hashing worker count; `None` lets rayon decide.
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE_FILE),
            algorithm: HashAlgorithm::default(),
            exclude: Vec::new(),
            jobs: None,
        }
    }
}

impl Config {
    /// Resolve configuration. An explicitly named config file must exist;
    /// the default one is optional.
    pub fn resolve(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let (path, required) = match config_path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let file = match std::fs::read_to_string(&path) {
            Ok(content) => Some(parse_config_file(&path, &content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => None,
            Err(e) => {
                return Err(VigilError::Config {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(&path, file)?;
        }
        config.apply_overrides(overrides);

        if config.jobs == Some(0) {
            return Err(VigilError::Config {
                path,
                reason: "jobs must be at least 1".to_string(),
            });
        }

        tracing::debug!(
            store = %config.store.display(),
            algorithm = %config.algorithm,
            excludes = config.exclude.len(),
            "configuration resolved"
        );
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path, file: ConfigFile) -> Result<()> {
        if let Some(store) = file.store {
            self.store = match path.parent() {
                Some(dir) if store.is_relative() => dir.join(store),
                _ => store,
            };
        }
        if let Some(algorithm) = file.algorithm {
            self.algorithm = algorithm;
        }
        if file.jobs.is_some() {
            self.jobs = file.jobs;
        }
        self.exclude = file
            .exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| VigilError::Config {
                    path: path.to_path_buf(),
                    reason: format!("bad exclude pattern \"{}\": {}", p, e),
                })
            })
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn apply_overrides(&mut self, o: Overrides) {
        if let Some(store) = o.store {
            self.store = store;
        }
        if let Some(algorithm) = o.algorithm {
            self.algorithm = algorithm;
        }
        if o.jobs.is_some() {
            self.jobs = o.jobs;
        }
    }

    /// True if any trailing run of `path`'s components matches an exclude pattern.
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let parts: Vec<Component<'_>> = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        (0..parts.len()).any(|i| {
            let tail: PathBuf = parts[i..].iter().collect();
            self.exclude.iter().any(|p| p.matches_path(&tail))
        })
    }
}

fn parse_config_file(path: &Path, content: &str) -> Result<ConfigFile> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml_ng::from_str(content).map_err(|e| VigilError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
