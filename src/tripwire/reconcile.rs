//! VG-006: Reconciliation engine: init, check and update against a baseline store.
//!
//! Every operation validates its preconditions (target exists, baseline
//! present and parseable) before touching the store, and `save` is always the
//! last step. A run that fails or is interrupted leaves the prior baseline
//! exactly as it was.

use crate::core::config::Config;
use crate::core::error::{Result, VigilError};
use crate::core::store::BaselineStore;
use crate::core::types::{
    Baseline, Classification, DigestRecord, FileOutcome, InitReport, UpdateReport, Verdict,
    VerifyReport,
};
use crate::tripwire::hasher::{HashAlgorithm, Unreadable};
use crate::tripwire::walk;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

type Hashed = (String, std::result::Result<String, Unreadable>);

pub struct Engine {
    config: Config,
    store: BaselineStore,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let store = BaselineStore::new(config.store.clone());
        Self { config, store }
    }

    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Snapshot every readable file under `target`, replacing the whole baseline.
    pub fn initialize(&self, target: &Path) -> Result<InitReport> {
        let root = resolve_target(target)?;
        self.reject_store(&root)?;
        let algorithm = self.config.algorithm;
        let listing = walk::enumerate(&root, &self.config, &self.protected_paths());

        let mut baseline = Baseline::new(algorithm);
        let mut unreadable = Vec::new();
        for (path, result) in self.hash_all(algorithm, &listing.files) {
            match result {
                Ok(digest) => {
                    baseline.upsert(path, digest);
                }
                Err(u) => {
                    tracing::warn!(path = %u.path.display(), reason = %u.reason, "excluded from baseline");
                    unreadable.push(u);
                }
            }
        }

        self.store.save(&baseline)?;
        tracing::info!(
            root = %root.display(),
            recorded = baseline.len(),
            unreadable = unreadable.len(),
            skipped = listing.skipped.len(),
            "baseline initialized"
        );

        Ok(InitReport {
            root: root.to_string_lossy().into_owned(),
            store: self.store.path().to_path_buf(),
            algorithm,
            recorded: baseline.records(),
            unreadable,
            skipped: listing.skipped,
        })
    }

    /// Classify every file under `target` against the stored baseline.
    /// Never writes the store.
    pub fn verify(&self, target: &Path) -> Result<VerifyReport> {
        let baseline = match self.store.load_existing()? {
            Some(b) if !b.is_empty() => b,
            _ => return Err(self.baseline_missing()),
        };
        let root = resolve_target(target)?;
        self.reject_store(&root)?;
        let algorithm = baseline.algorithm();
        let protected = self.protected_paths();
        let listing = walk::enumerate(&root, &self.config, &protected);

        let mut outcomes: Vec<FileOutcome> = self
            .hash_all(algorithm, &listing.files)
            .into_iter()
            .map(|(path, result)| {
                let classification = classify(&baseline, &path, result);
                tracing::debug!(path = %path, status = %classification, "classified");
                FileOutcome {
                    path,
                    classification,
                }
            })
            .collect();

        // Every tracked path under the root must be accounted for: either it
        // was hashed above, it is excluded, or it is reported here.
        let seen: HashSet<&str> = listing.files.iter().map(String::as_str).collect();
        let mut missing = Vec::new();
        let mut unaccounted = false;
        for p in baseline.paths_under(&root) {
            let path = Path::new(p);
            if seen.contains(p)
                || protected.iter().any(|q| q == path)
                || self.excluded_within(&root, path)
            {
                continue;
            }
            match unreachable_reason(path) {
                None => {
                    tracing::warn!(path = %p, "tracked file no longer exists");
                    missing.push(p.to_string());
                }
                Some(reason) => {
                    tracing::warn!(path = %p, reason = %reason, "tracked file not hashed");
                    unaccounted = true;
                    outcomes.push(FileOutcome {
                        path: p.to_string(),
                        classification: Classification::Unreadable { reason },
                    });
                }
            }
        }
        if unaccounted {
            outcomes.sort_by(|a, b| Path::new(&a.path).cmp(Path::new(&b.path)));
        }

        let verdict = Verdict::from_outcomes(&outcomes);
        let report = VerifyReport {
            root: root.to_string_lossy().into_owned(),
            algorithm,
            verdict,
            outcomes,
            missing,
            skipped: listing.skipped,
        };
        tracing::info!(
            root = %report.root,
            files = report.outcomes.len(),
            verdict = %verdict,
            "check complete"
        );
        Ok(report)
    }

    /// Accept the current content of one file as known good. Other records
    /// are left untouched.
    pub fn update_one(&self, target: &Path) -> Result<UpdateReport> {
        let path = resolve_file_target(target)?;
        self.reject_store(&path)?;
        let key = path
            .to_str()
            .ok_or_else(|| VigilError::InvalidTarget {
                path: path.clone(),
                reason: "path is not valid UTF-8".to_string(),
            })?
            .to_string();

        let mut baseline = self
            .store
            .load_existing()?
            .ok_or_else(|| self.baseline_missing())?;

        let digest = baseline.algorithm().hash_file(&path)?;
        let previous = baseline.upsert(key.clone(), digest.clone());
        self.store.save(&baseline)?;

        tracing::info!(path = %key, replaced = previous.is_some(), "record updated");
        Ok(UpdateReport {
            record: DigestRecord { path: key, digest },
            previous,
            store: self.store.path().to_path_buf(),
        })
    }

    /// The stored baseline, for display.
    pub fn status(&self) -> Result<Baseline> {
        self.store
            .load_existing()?
            .ok_or_else(|| self.baseline_missing())
    }

    fn hash_all(&self, algorithm: HashAlgorithm, files: &[String]) -> Vec<Hashed> {
        // Indexed collect keeps input order whatever the completion order.
        let run = || -> Vec<Hashed> {
            files
                .par_iter()
                .map(|p| (p.clone(), algorithm.hash_file(Path::new(p))))
                .collect()
        };
        match self.config.jobs {
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot build hashing pool, using global pool");
                    run()
                }
            },
            None => run(),
        }
    }

    /// Tracked paths inside an excluded file or directory beneath `root`.
    fn excluded_within(&self, root: &Path, path: &Path) -> bool {
        path.ancestors()
            .take_while(|a| *a != root)
            .any(|a| self.config.is_excluded(a))
    }

    fn reject_store(&self, root: &Path) -> Result<()> {
        if self.protected_paths().iter().any(|p| p == root) {
            return Err(VigilError::InvalidTarget {
                path: root.to_path_buf(),
                reason: "is the baseline store".to_string(),
            });
        }
        Ok(())
    }

    /// The store file and its temp sibling, as they appear in a canonical walk.
    fn protected_paths(&self) -> Vec<PathBuf> {
        let store = absolute_store_path(self.store.path());
        let mut tmp = store.clone().into_os_string();
        tmp.push(".tmp");
        vec![store, PathBuf::from(tmp)]
    }

    fn baseline_missing(&self) -> VigilError {
        VigilError::BaselineMissing {
            store: self.store.path().to_path_buf(),
        }
    }
}

fn classify(
    baseline: &Baseline,
    path: &str,
    current: std::result::Result<String, Unreadable>,
) -> Classification {
    let actual = match current {
        Ok(d) => d,
        Err(u) => {
            tracing::warn!(path = %path, reason = %u.reason, "unreadable");
            return Classification::Unreadable { reason: u.reason };
        }
    };
    match baseline.get(path) {
        None => Classification::New { actual },
        Some(expected) if expected == actual => Classification::Unmodified,
        Some(expected) => Classification::Modified {
            expected: expected.to_string(),
            actual,
        },
    }
}

fn resolve_target(target: &Path) -> Result<PathBuf> {
    dunce::canonicalize(target).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => VigilError::PathNotFound {
            path: target.to_path_buf(),
        },
        _ => VigilError::io(target, e),
    })
}

fn resolve_file_target(target: &Path) -> Result<PathBuf> {
    let invalid = |reason: &str| VigilError::InvalidTarget {
        path: target.to_path_buf(),
        reason: reason.to_string(),
    };
    let path = dunce::canonicalize(target).map_err(|_| invalid("no such file"))?;
    let meta = std::fs::metadata(&path).map_err(|e| invalid(&e.to_string()))?;
    if meta.is_dir() {
        return Err(invalid("is a directory; update accepts a single file"));
    }
    if !meta.is_file() {
        return Err(invalid("not a regular file"));
    }
    Ok(path)
}

fn absolute_store_path(store: &Path) -> PathBuf {
    if let Ok(p) = dunce::canonicalize(store) {
        return p;
    }
    let parent = match store.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (dunce::canonicalize(parent), store.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => store.to_path_buf(),
    }
}

/// Why a tracked path was not hashed by the walk. None means it is gone.
fn unreachable_reason(path: &Path) -> Option<String> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => return Some(format!("not reachable: {}", e)),
    };
    let ft = meta.file_type();
    let reason = if ft.is_symlink() {
        "no longer a regular file (symlink)"
    } else if ft.is_dir() {
        "no longer a regular file (directory)"
    } else if ft.is_file() {
        "not reachable by the walk"
    } else {
        "no longer a regular file"
    };
    Some(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        data: PathBuf,
        engine: Engine,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        let data = base.join("logs");
        std::fs::create_dir(&data).unwrap();
        let config = Config {
            store: base.join("state").join("vigil.lock.yaml"),
            ..Config::default()
        };
        Fixture {
            _dir: dir,
            data,
            engine: Engine::new(config),
        }
    }

    fn key(p: &Path) -> String {
        p.to_str().unwrap().to_string()
    }

    #[test]
    fn test_vg006_init_records_every_file() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        std::fs::create_dir(f.data.join("sub")).unwrap();
        std::fs::write(f.data.join("sub").join("b.txt"), "b").unwrap();

        let report = f.engine.initialize(&f.data).unwrap();
        assert_eq!(report.recorded.len(), 2);
        assert!(report.unreadable.is_empty());

        let baseline = f.engine.store().load().unwrap();
        assert_eq!(
            baseline.get(&key(&f.data.join("a.txt"))),
            Some(HashAlgorithm::Blake3.hash_bytes(b"a").as_str())
        );
        assert!(baseline.get(&key(&f.data.join("sub").join("b.txt"))).is_some());
    }

    #[test]
    fn test_vg006_init_path_not_found() {
        let f = fixture();
        let err = f.engine.initialize(&f.data.join("missing")).unwrap_err();
        assert!(matches!(err, VigilError::PathNotFound { .. }));
        assert!(!f.engine.store().path().exists());
    }

    #[test]
    fn test_vg006_init_replaces_never_merges() {
        let f = fixture();
        std::fs::write(f.data.join("keep.txt"), "k").unwrap();
        std::fs::write(f.data.join("gone.txt"), "g").unwrap();
        f.engine.initialize(&f.data).unwrap();

        std::fs::remove_file(f.data.join("gone.txt")).unwrap();
        f.engine.initialize(&f.data).unwrap();

        let baseline = f.engine.store().load().unwrap();
        assert_eq!(baseline.len(), 1);
        assert!(baseline.get(&key(&f.data.join("gone.txt"))).is_none());
    }

    #[test]
    fn test_vg006_init_single_file_drops_other_records() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        std::fs::write(f.data.join("b.txt"), "b").unwrap();
        f.engine.initialize(&f.data).unwrap();

        f.engine.initialize(&f.data.join("a.txt")).unwrap();
        let baseline = f.engine.store().load().unwrap();
        assert_eq!(baseline.len(), 1);
        assert!(baseline.get(&key(&f.data.join("a.txt"))).is_some());
    }

    #[test]
    fn test_vg006_check_unmodified_and_new() {
        let f = fixture();
        let a = f.data.join("a.txt");
        std::fs::write(&a, "alpha").unwrap();
        f.engine.initialize(&f.data).unwrap();

        let b = f.data.join("b.txt");
        std::fs::write(&b, "beta").unwrap();

        let report = f.engine.verify(&f.data).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(
            report.classification_of(&key(&a)),
            Some(&Classification::Unmodified)
        );
        assert!(matches!(
            report.classification_of(&key(&b)),
            Some(Classification::New { .. })
        ));
        assert_eq!(report.verdict, Verdict::Deviated);
    }

    #[test]
    fn test_vg006_check_detects_modification() {
        let f = fixture();
        let a = f.data.join("a.txt");
        std::fs::write(&a, "old bytes").unwrap();
        f.engine.initialize(&f.data).unwrap();

        std::fs::write(&a, "new bytes").unwrap();
        let report = f.engine.verify(&f.data).unwrap();
        match report.classification_of(&key(&a)) {
            Some(Classification::Modified { expected, actual }) => {
                assert_eq!(expected, &HashAlgorithm::Blake3.hash_bytes(b"old bytes"));
                assert_eq!(actual, &HashAlgorithm::Blake3.hash_bytes(b"new bytes"));
                assert_ne!(expected, actual);
            }
            other => panic!("expected Modified, got {other:?}"),
        }
        assert!(!report.verdict.is_clean());
    }

    #[test]
    fn test_vg006_check_clean() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        std::fs::write(f.data.join("b.txt"), "b").unwrap();
        f.engine.initialize(&f.data).unwrap();

        let report = f.engine.verify(&f.data).unwrap();
        assert!(report.verdict.is_clean());
        assert!(!report.has_blind_spots());
    }

    #[test]
    fn test_vg006_check_is_read_only() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();
        std::fs::write(f.data.join("a.txt"), "tampered").unwrap();
        std::fs::write(f.data.join("new.txt"), "n").unwrap();

        let before = std::fs::read(f.engine.store().path()).unwrap();
        f.engine.verify(&f.data).unwrap();
        let after = std::fs::read(f.engine.store().path()).unwrap();
        assert_eq!(
            HashAlgorithm::Blake3.hash_bytes(&before),
            HashAlgorithm::Blake3.hash_bytes(&after)
        );
    }

    #[test]
    fn test_vg006_check_reports_missing_records() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        std::fs::write(f.data.join("b.txt"), "b").unwrap();
        f.engine.initialize(&f.data).unwrap();
        std::fs::remove_file(f.data.join("b.txt")).unwrap();

        let report = f.engine.verify(&f.data).unwrap();
        assert_eq!(report.missing, vec![key(&f.data.join("b.txt"))]);
        assert!(report.verdict.is_clean());
        assert!(report.has_blind_spots());
    }

    #[test]
    fn test_vg006_check_subdirectory_of_baseline() {
        let f = fixture();
        std::fs::create_dir(f.data.join("sub")).unwrap();
        std::fs::write(f.data.join("top.txt"), "t").unwrap();
        std::fs::write(f.data.join("sub").join("s.txt"), "s").unwrap();
        f.engine.initialize(&f.data).unwrap();

        let report = f.engine.verify(&f.data.join("sub")).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.missing.is_empty());
        assert!(report.verdict.is_clean());
    }

    #[test]
    fn test_vg006_check_relative_and_absolute_targets_agree() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();

        let dotted = f.data.join("..").join("logs");
        let report = f.engine.verify(&dotted).unwrap();
        assert!(report.verdict.is_clean());
        assert_eq!(report.root, key(&f.data));
    }

    #[test]
    fn test_vg006_check_without_baseline() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        let err = f.engine.verify(&f.data).unwrap_err();
        assert!(matches!(err, VigilError::BaselineMissing { .. }));
        assert!(!f.engine.store().path().exists());
    }

    #[test]
    fn test_vg006_check_with_empty_baseline_is_missing() {
        let f = fixture();
        f.engine.initialize(&f.data).unwrap();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        let err = f.engine.verify(&f.data).unwrap_err();
        assert!(matches!(err, VigilError::BaselineMissing { .. }));
    }

    #[test]
    fn test_vg006_check_corrupt_baseline_is_fatal() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        std::fs::create_dir_all(f.engine.store().path().parent().unwrap()).unwrap();
        std::fs::write(f.engine.store().path(), "{{{{ not yaml").unwrap();
        let err = f.engine.verify(&f.data).unwrap_err();
        assert!(matches!(err, VigilError::CorruptBaseline { .. }));
    }

    #[test]
    fn test_vg006_check_uses_baseline_algorithm() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        let sha_engine = Engine::new(Config {
            algorithm: HashAlgorithm::Sha256,
            ..f.engine.config.clone()
        });
        sha_engine.initialize(&f.data).unwrap();

        // Configured default is blake3; the sha256 baseline still verifies clean
        let report = f.engine.verify(&f.data).unwrap();
        assert_eq!(report.algorithm, HashAlgorithm::Sha256);
        assert!(report.verdict.is_clean());
    }

    #[test]
    fn test_vg006_update_is_surgical() {
        let f = fixture();
        let a = f.data.join("a.txt");
        let b = f.data.join("b.txt");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();
        f.engine.initialize(&f.data).unwrap();
        let before = f.engine.store().load().unwrap();

        std::fs::write(&a, "a2").unwrap();
        std::fs::write(&b, "b2").unwrap();
        let report = f.engine.update_one(&a).unwrap();
        assert_eq!(report.previous.as_deref(), before.get(&key(&a)));

        let after = f.engine.store().load().unwrap();
        assert_eq!(
            after.get(&key(&a)),
            Some(HashAlgorithm::Blake3.hash_bytes(b"a2").as_str())
        );
        assert_eq!(after.get(&key(&b)), before.get(&key(&b)));
        assert_eq!(after.len(), before.len());

        let check = f.engine.verify(&f.data).unwrap();
        assert_eq!(check.classification_of(&key(&a)), Some(&Classification::Unmodified));
        assert!(matches!(
            check.classification_of(&key(&b)),
            Some(Classification::Modified { .. })
        ));
    }

    #[test]
    fn test_vg006_update_adds_untracked_file() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();

        let c = f.data.join("c.txt");
        std::fs::write(&c, "c").unwrap();
        let report = f.engine.update_one(&c).unwrap();
        assert!(report.previous.is_none());
        assert_eq!(f.engine.store().load().unwrap().len(), 2);
    }

    #[test]
    fn test_vg006_update_rejects_directory_and_missing_file() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();

        let err = f.engine.update_one(&f.data).unwrap_err();
        assert!(matches!(err, VigilError::InvalidTarget { .. }));
        let err = f.engine.update_one(&f.data.join("nope.txt")).unwrap_err();
        assert!(matches!(err, VigilError::InvalidTarget { .. }));
    }

    #[test]
    fn test_vg006_update_without_baseline() {
        let f = fixture();
        let a = f.data.join("a.txt");
        std::fs::write(&a, "a").unwrap();
        let err = f.engine.update_one(&a).unwrap_err();
        assert!(matches!(err, VigilError::BaselineMissing { .. }));
        assert!(!f.engine.store().path().exists());
    }

    #[test]
    fn test_vg006_update_rejects_store_file() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();
        let store = f.engine.store().path().to_path_buf();
        let err = f.engine.update_one(&store).unwrap_err();
        assert!(matches!(err, VigilError::InvalidTarget { .. }));
    }

    #[test]
    fn test_vg006_init_and_check_reject_store_file() {
        let f = fixture();
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();
        let store = f.engine.store().path().to_path_buf();
        let before = std::fs::read(&store).unwrap();

        let err = f.engine.initialize(&store).unwrap_err();
        assert!(matches!(err, VigilError::InvalidTarget { .. }), "got {err:?}");
        let err = f.engine.verify(&store).unwrap_err();
        assert!(matches!(err, VigilError::InvalidTarget { .. }), "got {err:?}");
        assert_eq!(std::fs::read(&store).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_vg006_check_tracked_file_replaced_by_symlink() {
        let f = fixture();
        let a = f.data.join("a.log");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(f.data.join("b.log"), "b").unwrap();
        f.engine.initialize(&f.data).unwrap();

        std::fs::remove_file(&a).unwrap();
        std::os::unix::fs::symlink(f.data.join("b.log"), &a).unwrap();

        let report = f.engine.verify(&f.data).unwrap();
        assert!(matches!(
            report.classification_of(&key(&a)),
            Some(Classification::Unreadable { .. })
        ));
        assert!(report.missing.is_empty());
        assert!(report.has_blind_spots());
        assert!(report.verdict.is_clean());
    }

    #[test]
    fn test_vg006_check_tracked_file_replaced_by_directory() {
        let f = fixture();
        let a = f.data.join("a.log");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(f.data.join("b.log"), "b").unwrap();
        f.engine.initialize(&f.data).unwrap();

        std::fs::remove_file(&a).unwrap();
        std::fs::create_dir(&a).unwrap();

        let report = f.engine.verify(&f.data).unwrap();
        match report.classification_of(&key(&a)) {
            Some(Classification::Unreadable { reason }) => assert!(reason.contains("directory")),
            other => panic!("expected Unreadable, got {other:?}"),
        }
        assert_eq!(report.unreadable_count(), 1);
        assert!(report.has_blind_spots());
        let paths: Vec<_> = report.outcomes.iter().map(|o| o.path.clone()).collect();
        assert_eq!(paths, vec![key(&a), key(&f.data.join("b.log"))]);
    }

    #[test]
    fn test_vg006_exclude_holds_when_checking_subdirectory() {
        let f = fixture();
        let archive = f.data.join("archive");
        std::fs::create_dir(&archive).unwrap();
        std::fs::write(archive.join("old.log"), "o").unwrap();
        std::fs::write(f.data.join("a.log"), "a").unwrap();
        let engine = Engine::new(Config {
            exclude: vec![glob::Pattern::new("archive/**").unwrap()],
            ..f.engine.config.clone()
        });

        let init = engine.initialize(&f.data).unwrap();
        assert_eq!(init.recorded.len(), 1);

        let whole = engine.verify(&f.data).unwrap();
        assert!(whole.verdict.is_clean());
        let sub = engine.verify(&archive).unwrap();
        assert!(sub.outcomes.is_empty());
        assert!(sub.verdict.is_clean());
    }

    #[test]
    fn test_vg006_store_inside_target_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        std::fs::write(base.join("a.txt"), "a").unwrap();
        let engine = Engine::new(Config {
            store: base.join("vigil.lock.yaml"),
            ..Config::default()
        });

        engine.initialize(&base).unwrap();
        let report = engine.verify(&base).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.verdict.is_clean());
    }

    #[test]
    fn test_vg006_parallel_hashing_keeps_order() {
        let f = fixture();
        for i in 0..50 {
            std::fs::write(f.data.join(format!("f{i:03}.log")), format!("{i}")).unwrap();
        }
        f.engine.initialize(&f.data).unwrap();

        let engine = Engine::new(Config {
            jobs: Some(4),
            ..f.engine.config.clone()
        });
        let report = engine.verify(&f.data).unwrap();
        let paths: Vec<_> = report.outcomes.iter().map(|o| o.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert!(report.verdict.is_clean());
    }

    #[test]
    fn test_vg006_status() {
        let f = fixture();
        assert!(matches!(
            f.engine.status(),
            Err(VigilError::BaselineMissing { .. })
        ));
        std::fs::write(f.data.join("a.txt"), "a").unwrap();
        f.engine.initialize(&f.data).unwrap();
        assert_eq!(f.engine.status().unwrap().len(), 1);
    }

    #[cfg(unix)]
    fn running_as_root() -> bool {
        // Root ignores file permission bits.
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        std::fs::write(&marker, "m").unwrap();
        set_mode(&marker, 0o000);
        std::fs::File::open(&marker).is_ok()
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_vg006_unreadable_file_skipped() {
        if running_as_root() {
            return;
        }
        let f = fixture();
        let secret = f.data.join("secret.log");
        std::fs::write(&secret, "s").unwrap();
        std::fs::write(f.data.join("open.log"), "o").unwrap();
        set_mode(&secret, 0o000);

        let init = f.engine.initialize(&f.data).unwrap();
        assert_eq!(init.recorded.len(), 1);
        assert_eq!(init.unreadable.len(), 1);
        let baseline = f.engine.store().load().unwrap();
        assert!(baseline.get(&key(&secret)).is_none());
        assert!(baseline.get(&key(&f.data.join("open.log"))).is_some());

        let check = f.engine.verify(&f.data).unwrap();
        assert!(matches!(
            check.classification_of(&key(&secret)),
            Some(Classification::Unreadable { .. })
        ));
        assert!(check.verdict.is_clean());
        assert_eq!(check.unreadable_count(), 1);

        let err = f.engine.update_one(&secret).unwrap_err();
        assert!(matches!(err, VigilError::Unreadable { .. }));
        set_mode(&secret, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_vg006_unreadable_subdirectory_reported() {
        if running_as_root() {
            return;
        }
        let f = fixture();
        let locked = f.data.join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("inner.log"), "i").unwrap();
        std::fs::write(f.data.join("open.log"), "o").unwrap();
        set_mode(&locked, 0o000);

        let init = f.engine.initialize(&f.data).unwrap();
        set_mode(&locked, 0o755);
        assert_eq!(init.recorded.len(), 1);
        assert_eq!(init.skipped.len(), 1);
    }
}
