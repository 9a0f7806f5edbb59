//! VG-002: Streaming content digests for baseline records.

use crate::core::error::VigilError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

const STREAM_BUF_SIZE: usize = 65536;

/// Hash function used for every record of one baseline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// A file that could not be hashed. Not fatal to a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unreadable {
    pub path: PathBuf,
    pub reason: String,
}

impl Unreadable {
    fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl From<Unreadable> for VigilError {
    fn from(u: Unreadable) -> Self {
        VigilError::Unreadable {
            path: u.path,
            reason: u.reason,
        }
    }
}

impl HashAlgorithm {
    /// Length of a hex digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Blake3 => blake3::OUT_LEN * 2,
            Self::Sha256 => 64,
        }
    }

    /// True if `digest` is lower-case hex of exactly `hex_len()` characters.
    pub fn is_valid_digest(self, digest: &str) -> bool {
        digest.len() == self.hex_len()
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Hash an in-memory buffer.
    pub fn hash_bytes(self, data: &[u8]) -> String {
        match self {
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
            Self::Sha256 => format!("{:x}", Sha256::digest(data)),
        }
    }

    /// Hash a regular file's contents in `STREAM_BUF_SIZE` chunks.
    pub fn hash_file(self, path: &Path) -> Result<String, Unreadable> {
        let meta = std::fs::metadata(path).map_err(|e| Unreadable::new(path, e.to_string()))?;
        if !meta.is_file() {
            return Err(Unreadable::new(path, "not a regular file"));
        }
        let mut file =
            std::fs::File::open(path).map_err(|e| Unreadable::new(path, e.to_string()))?;

        match self {
            Self::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                stream(&mut file, path, |chunk| {
                    hasher.update(chunk);
                })?;
                Ok(hasher.finalize().to_hex().to_string())
            }
            Self::Sha256 => {
                let mut hasher = Sha256::new();
                stream(&mut file, path, |chunk| hasher.update(chunk))?;
                Ok(format!("{:x}", hasher.finalize()))
            }
        }
    }
}

fn stream(
    reader: &mut impl Read,
    path: &Path,
    mut fold: impl FnMut(&[u8]),
) -> Result<(), Unreadable> {
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Unreadable::new(path, format!("read error: {}", e))),
        };
        fold(&buf[..n]);
    }
    Ok(())
}
