//! Filters deletion requests down to paths that are provably safe to remove.

use super::hasher::IntegrityVerifier;
use super::scanner::sibling_path;
use super::NameClassifier;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Defines the interface to the reversible-delete primitive.
///
/// This mirrors the OS recycle bin / trash: each call is independent and may
/// fail on its own. Abstracted as a trait so tests can inject failing or
/// recording doubles instead of touching the real trash.
pub trait TrashProvider: Send + Sync {
    fn trash(&self, path: &Path) -> anyhow::Result<()>;
}

/// The production implementation backed by the `trash` crate.
pub struct SystemTrash;

impl TrashProvider for SystemTrash {
    fn trash(&self, path: &Path) -> anyhow::Result<()> {
        trash::delete(path)?;
        Ok(())
    }
}

/// Outcome of a deletion batch. Partial success is expected: the report
/// lists exactly the paths that were trashed and those that were not.
#[derive(Debug, Clone, Default)]
pub struct DeletionReport {
    pub trashed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl DeletionReport {
    pub fn deleted_count(&self) -> usize {
        self.trashed.len()
    }
}

/// Re-derives deletability from live filesystem state for every requested
/// path. Caller-supplied flags from a possibly-stale snapshot are never
/// trusted: the decision is made to be correct at the moment of the
/// destructive action, not at the last scan.
pub struct DeletionPlanner {
    classifier: NameClassifier,
}

impl DeletionPlanner {
    pub fn new(classifier: NameClassifier) -> Self {
        Self { classifier }
    }

    /// Filters `requested` to the paths that are safe to delete right now.
    ///
    /// A path is dropped when its name matches no copy pattern, when the
    /// inferred original does not currently exist, or — in strict mode —
    /// when the content digests are not confirmed equal. A hashing error
    /// counts as "cannot prove identical" and excludes the path.
    pub async fn plan(&self, requested: &[PathBuf], strict: bool) -> Vec<PathBuf> {
        let mut approved = Vec::new();
        let mut seen = HashSet::new();

        for path in requested {
            if !seen.insert(path.clone()) {
                continue;
            }

            let Some(original) = self.derive_original(path) else {
                tracing::debug!("Rejecting {:?}: name matches no copy pattern", path);
                continue;
            };
            if !original.is_file() {
                tracing::debug!("Rejecting {:?}: original {:?} not found", path, original);
                continue;
            }

            if strict {
                match IntegrityVerifier::compare(path, &original).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::info!("Rejecting {:?}: content differs from original", path);
                        continue;
                    }
                    Err(err) => {
                        tracing::warn!("Rejecting {:?}: cannot verify content ({})", path, err);
                        continue;
                    }
                }
            }

            approved.push(path.clone());
        }

        approved
    }

    /// Invokes the trash primitive once per approved path and aggregates the
    /// per-path outcomes. A failing call never aborts the batch.
    pub fn execute(&self, approved: &[PathBuf], trasher: &dyn TrashProvider) -> DeletionReport {
        let mut report = DeletionReport::default();
        for path in approved {
            match trasher.trash(path) {
                Ok(()) => report.trashed.push(path.clone()),
                Err(err) => {
                    tracing::warn!("Failed to trash {:?}: {}", path, err);
                    report.failed.push((path.clone(), err.to_string()));
                }
            }
        }
        tracing::info!(
            "Deletion batch complete: {} trashed, {} failed",
            report.trashed.len(),
            report.failed.len()
        );
        report
    }

    fn derive_original(&self, path: &Path) -> Option<PathBuf> {
        let stem = path.file_stem()?.to_str()?;
        let inferred = self.classifier.classify(stem)?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Some(sibling_path(path.parent()?, &inferred, extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn planner() -> DeletionPlanner {
        DeletionPlanner::new(NameClassifier::default())
    }

    #[tokio::test]
    async fn plan_drops_paths_without_copy_pattern() {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("Holiday.jpg");
        fs::write(&plain, b"img").unwrap();

        let approved = planner().plan(&[plain], false).await;
        assert!(approved.is_empty());
    }

    #[tokio::test]
    async fn plan_drops_paths_whose_original_is_missing() {
        let dir = TempDir::new().unwrap();
        let copy = dir.path().join("Holiday - Copy.jpg");
        fs::write(&copy, b"img").unwrap();

        let approved = planner().plan(&[copy], false).await;
        assert!(approved.is_empty());
    }

    #[tokio::test]
    async fn plan_approves_when_original_exists() {
        let dir = TempDir::new().unwrap();
        let copy = dir.path().join("Holiday - Copy.jpg");
        fs::write(dir.path().join("Holiday.jpg"), b"img").unwrap();
        fs::write(&copy, b"img").unwrap();

        let approved = planner().plan(&[copy.clone()], false).await;
        assert_eq!(approved, vec![copy]);
    }

    #[tokio::test]
    async fn plan_deduplicates_requests() {
        let dir = TempDir::new().unwrap();
        let copy = dir.path().join("Holiday - Copy.jpg");
        fs::write(dir.path().join("Holiday.jpg"), b"img").unwrap();
        fs::write(&copy, b"img").unwrap();

        let approved = planner().plan(&[copy.clone(), copy.clone()], false).await;
        assert_eq!(approved.len(), 1);
    }

    #[tokio::test]
    async fn strict_mode_rejects_differing_content() {
        let dir = TempDir::new().unwrap();
        let copy = dir.path().join("Holiday - Copy.jpg");
        fs::write(dir.path().join("Holiday.jpg"), b"original bytes").unwrap();
        fs::write(&copy, b"tampered bytes").unwrap();

        assert!(planner().plan(&[copy.clone()], true).await.is_empty());
        // Without strict verification the same request is approved.
        assert_eq!(planner().plan(&[copy.clone()], false).await, vec![copy]);
    }

    #[tokio::test]
    async fn strict_mode_rejects_when_hashing_errors() {
        let dir = TempDir::new().unwrap();
        // Original exists, but the copy itself is gone by plan time.
        fs::write(dir.path().join("Holiday.jpg"), b"img").unwrap();
        let vanished = dir.path().join("Holiday - Copy.jpg");

        let approved = planner().plan(&[vanished], true).await;
        assert!(approved.is_empty());
    }

    struct RecordingTrash {
        fail_on: Option<PathBuf>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl TrashProvider for RecordingTrash {
        fn trash(&self, path: &Path) -> anyhow::Result<()> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            if self.fail_on.as_deref() == Some(path) {
                anyhow::bail!("permission denied");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn execute_reports_partial_failure_precisely() {
        let dir = TempDir::new().unwrap();
        let ok_a = dir.path().join("A - Copy.jpg");
        let bad = dir.path().join("B - Copy.jpg");
        let ok_b = dir.path().join("C - Copy.jpg");
        let trasher = RecordingTrash {
            fail_on: Some(bad.clone()),
            calls: Mutex::new(Vec::new()),
        };

        let report = planner().execute(
            &[ok_a.clone(), bad.clone(), ok_b.clone()],
            &trasher,
        );

        assert_eq!(report.trashed, vec![ok_a, ok_b]);
        assert_eq!(report.deleted_count(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, bad);
        // Every approved path got its own independent trash call.
        assert_eq!(trasher.calls.lock().unwrap().len(), 3);
    }
}
