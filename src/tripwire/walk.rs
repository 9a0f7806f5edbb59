//! VG-005: File enumeration for a target path.
//!
//! A file target yields itself. A directory target yields every regular file
//! beneath it in `Path` order (sorted by name at each level, depth-first).
//! Symlinks are never followed.

use crate::core::config::Config;
use crate::core::types::SkippedEntry;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to hash plus everything the walk passed over.
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Canonical UTF-8 paths, used verbatim as baseline keys.
    pub files: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

/// Enumerate `root` (already canonical). Paths in `protected` are never
/// yielded; the baseline store lives there.
pub fn enumerate(root: &Path, config: &Config, protected: &[PathBuf]) -> Enumeration {
    let mut out = Enumeration::default();

    if !root.is_dir() {
        if protected.iter().any(|p| p == root) {
            out.skipped.push(SkippedEntry::new(root, "baseline store"));
        } else {
            push_file(&mut out, root);
        }
        return out;
    }

    let mut it = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = it.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                out.skipped.push(SkippedEntry::new(&path, e.to_string()));
                continue;
            }
        };
        let path = entry.path();
        let ft = entry.file_type();

        if config.is_excluded(path) {
            tracing::debug!(path = %path.display(), "excluded");
            out.skipped.push(SkippedEntry::new(path, "excluded"));
            if ft.is_dir() {
                it.skip_current_dir();
            }
            continue;
        }

        if ft.is_dir() {
            continue;
        }
        if ft.is_symlink() {
            out.skipped.push(SkippedEntry::new(path, "symlink"));
            continue;
        }
        if !ft.is_file() {
            tracing::warn!(path = %path.display(), "skipping non-regular file");
            out.skipped.push(SkippedEntry::new(path, "not a regular file"));
            continue;
        }
        if protected.iter().any(|p| p == path) {
            continue;
        }
        push_file(&mut out, path);
    }

    out
}

fn push_file(out: &mut Enumeration, path: &Path) {
    match path.to_str() {
        Some(s) => out.files.push(s.to_string()),
        None => {
            tracing::warn!(path = %path.display(), "skipping non UTF-8 path");
            out.skipped
                .push(SkippedEntry::new(path, "path is not valid UTF-8"));
        }
    }
}
