//! Bridges raw filesystem change notifications into coherent rescan triggers.

use super::error::CoreError;
use super::scanner::CandidateScanner;
use super::ScanSnapshot;
use crate::utils::is_image_file;
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Consumer seam for freshly produced snapshots.
///
/// Fire-and-forget: publishing must never block or fail the producer, so a
/// dropped consumer is logged and ignored.
pub trait SnapshotSink: Send + Sync + Clone + 'static {
    fn publish(&self, snapshot: ScanSnapshot);
}

impl SnapshotSink for mpsc::UnboundedSender<ScanSnapshot> {
    fn publish(&self, snapshot: ScanSnapshot) {
        if self.send(snapshot).is_err() {
            tracing::warn!("Snapshot receiver dropped; discarding published snapshot");
        }
    }
}

/// A live watch subscription. Dropping the handle releases the underlying
/// OS watch resources and stops the rescan task deterministically.
pub struct WatchHandle {
    _debouncer: Debouncer<RecommendedWatcher>,
    rescan_task: tokio::task::JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.rescan_task.abort();
    }
}

/// Subscribes to change notifications for a root and re-scans on demand.
///
/// Debouncing ("settle" semantics) is delegated to the watch primitive;
/// on every qualifying burst the whole tree is re-scanned and the fresh
/// snapshot is published. Full rescans trade throughput on huge trees for
/// correctness and simplicity, which is acceptable for interactively-sized
/// roots.
pub struct WatchCoordinator;

impl WatchCoordinator {
    /// Starts watching `root`. Rescans run one at a time on a dedicated
    /// task; triggers that arrive during a rescan coalesce into a single
    /// follow-up pass.
    pub fn start<S: SnapshotSink>(
        root: &Path,
        scanner: Arc<CandidateScanner>,
        sink: S,
        settle: Duration,
    ) -> Result<WatchHandle, CoreError> {
        if !root.is_dir() {
            return Err(CoreError::NotADirectory(root.to_path_buf()));
        }

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel::<()>();

        let mut debouncer = new_debouncer(settle, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    if events.iter().any(|event| concerns_images(&event.path)) {
                        // Receiver gone means the handle was dropped; the
                        // debouncer itself is about to be torn down too.
                        trigger_tx.send(()).ok();
                    }
                }
                Err(err) => {
                    tracing::warn!("Watch notification error: {}", err);
                }
            }
        })?;

        debouncer.watcher().watch(root, RecursiveMode::Recursive)?;
        tracing::info!("Watching {:?} for changes", root);

        let rescan_task = tokio::spawn(rescan_loop(
            root.to_path_buf(),
            scanner,
            sink,
            trigger_rx,
        ));

        Ok(WatchHandle {
            _debouncer: debouncer,
            rescan_task,
        })
    }
}

/// Serializes full rescans of one root: no two scans of the same root ever
/// overlap, because all triggers funnel through this single loop.
async fn rescan_loop<S: SnapshotSink>(
    root: PathBuf,
    scanner: Arc<CandidateScanner>,
    sink: S,
    mut trigger_rx: mpsc::UnboundedReceiver<()>,
) {
    while trigger_rx.recv().await.is_some() {
        // Collapse any triggers queued during the previous rescan.
        while trigger_rx.try_recv().is_ok() {}

        let scan_root = root.clone();
        let scan_scanner = scanner.clone();
        match tokio::task::spawn_blocking(move || scan_scanner.scan(&scan_root)).await {
            Ok(snapshot) => sink.publish(snapshot),
            Err(err) => tracing::error!("Watch-triggered rescan failed to run: {}", err),
        }
    }
    tracing::debug!("Rescan loop for {:?} stopped", root);
}

/// Decides whether a change event may affect the candidate set.
///
/// Image files qualify directly. Paths without an extension are kept
/// conservatively: directory events carry no extension and may hide file
/// changes beneath them.
fn concerns_images(path: &Path) -> bool {
    is_image_file(path) || path.extension().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_events_qualify() {
        assert!(concerns_images(Path::new("/root/Photo - Copy.jpg")));
        assert!(concerns_images(Path::new("/root/shot.NEF")));
    }

    #[test]
    fn extensionless_paths_qualify_conservatively() {
        assert!(concerns_images(Path::new("/root/new-subdir")));
    }

    #[test]
    fn unrelated_file_events_are_ignored() {
        assert!(!concerns_images(Path::new("/root/notes.txt")));
        assert!(!concerns_images(Path::new("/root/archive.zip")));
    }
}
