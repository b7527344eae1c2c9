//! Defines the central, mutable state of one cleanup session.

use crate::config::AppConfig;
use crate::core::{
    CandidateScanner, CoreError, DeletionPlanner, DeletionReport, FolderAggregate, HashState,
    IntegrityVerifier, NameClassifier, ScanSnapshot, SnapshotSink, TrashProvider,
    WatchCoordinator, WatchHandle,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Owns the complete state of a scan/watch/delete session.
///
/// All state that the original design kept as process-wide globals (current
/// root, active watcher) lives here explicitly, so independent sessions can
/// coexist and tests can drive one in isolation. At most one watch is active
/// per session: starting a new one replaces the previous.
pub struct Session<S: SnapshotSink> {
    config: AppConfig,
    scanner: Arc<CandidateScanner>,
    planner: DeletionPlanner,
    trasher: Arc<dyn TrashProvider>,
    sink: S,
    current_root: Option<PathBuf>,
    snapshot: Option<ScanSnapshot>,
    watch: Option<WatchHandle>,
}

impl<S: SnapshotSink> Session<S> {
    pub fn new(config: AppConfig, sink: S, trasher: Arc<dyn TrashProvider>) -> Self {
        let classifier = NameClassifier::new(config.numeric_suffix_rule);
        let scanner = Arc::new(CandidateScanner::new(
            classifier.clone(),
            config.excluded_dirs.clone(),
            config.max_scan_depth,
        ));
        let planner = DeletionPlanner::new(classifier);

        Self {
            config,
            scanner,
            planner,
            trasher,
            sink,
            current_root: None,
            snapshot: None,
            watch: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn current_root(&self) -> Option<&Path> {
        self.current_root.as_deref()
    }

    /// The most recently produced snapshot, if any scan has completed.
    pub fn snapshot(&self) -> Option<&ScanSnapshot> {
        self.snapshot.as_ref()
    }

    /// Selects a root directory, performs the initial full scan and
    /// publishes the resulting snapshot.
    pub async fn open_root(&mut self, path: &Path) -> Result<&ScanSnapshot> {
        if !path.is_dir() {
            return Err(CoreError::NotADirectory(path.to_path_buf()).into());
        }

        // Opening a new root invalidates any watch on the previous one.
        self.stop_watch();
        self.current_root = Some(path.to_path_buf());
        self.config.last_directory = Some(path.to_path_buf());

        self.rescan().await
    }

    /// Re-scans the current root and publishes a fresh snapshot.
    pub async fn rescan(&mut self) -> Result<&ScanSnapshot> {
        let root = self
            .current_root
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No root directory selected"))?;

        let scanner = self.scanner.clone();
        let snapshot = tokio::task::spawn_blocking(move || scanner.scan(&root)).await?;

        self.sink.publish(snapshot.clone());
        Ok(&*self.snapshot.insert(snapshot))
    }

    /// Starts watching the current root, replacing any previous watch.
    /// Every settled change burst triggers a full rescan whose snapshot is
    /// published to this session's sink.
    pub fn start_watch(&mut self) -> Result<()> {
        let root = self
            .current_root
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No root directory selected"))?;

        self.stop_watch();
        let handle = WatchCoordinator::start(
            &root,
            self.scanner.clone(),
            self.sink.clone(),
            Duration::from_millis(self.config.settle_ms),
        )?;
        self.watch = Some(handle);
        Ok(())
    }

    /// Stops the active watch, if any, releasing the OS watch resources
    /// before returning.
    pub fn stop_watch(&mut self) {
        if self.watch.take().is_some() {
            tracing::info!("Stopped filesystem watch");
        }
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Plans and executes a deletion batch for the requested paths, then
    /// re-scans so the published snapshot reflects the new filesystem state.
    ///
    /// Deletability is re-derived from live filesystem state inside the
    /// planner; stale snapshot flags are never trusted.
    pub async fn delete_paths(&mut self, requested: &[PathBuf]) -> Result<DeletionReport> {
        let approved = self
            .planner
            .plan(requested, self.config.strict_hash)
            .await;
        let report = self.planner.execute(&approved, self.trasher.as_ref());

        if self.current_root.is_some() {
            self.rescan().await?;
        }
        Ok(report)
    }

    /// Deletes every currently-deletable copy candidate under `folder`,
    /// based on a fresh walk of that subtree.
    pub async fn delete_folder_copies(&mut self, folder: &Path) -> Result<DeletionReport> {
        if !folder.is_dir() {
            return Err(CoreError::NotADirectory(folder.to_path_buf()).into());
        }

        let scanner = self.scanner.clone();
        let folder = folder.to_path_buf();
        let local = tokio::task::spawn_blocking(move || scanner.scan(&folder)).await?;

        let requested: Vec<PathBuf> = local
            .candidates
            .into_iter()
            .filter(|c| c.deletable)
            .map(|c| c.path)
            .collect();

        self.delete_paths(&requested).await
    }

    /// On-demand integrity check for one (copy, original) pair.
    pub async fn verify_pair(&self, copy: &Path, original: &Path) -> HashState {
        match IntegrityVerifier::compare(copy, original).await {
            Ok(true) => HashState::Match,
            Ok(false) => HashState::Mismatch,
            Err(err) => {
                tracing::warn!("Integrity check failed for {:?}: {}", copy, err);
                HashState::Error
            }
        }
    }

    /// Per-directory rollup of the current snapshot's deletable candidates.
    pub fn folder_aggregates(&self) -> Vec<FolderAggregate> {
        self.snapshot
            .as_ref()
            .map(ScanSnapshot::folder_aggregates)
            .unwrap_or_default()
    }
}
