pub mod classifier;
pub mod error;
pub mod hasher;
pub mod planner;
pub mod scanner;
pub mod watcher;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::SystemTime;

/// Lazily computed integrity status of a (copy, original) pair.
///
/// Not part of a snapshot's identity: every fresh scan resets it to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashState {
    Idle,
    Computing,
    Match,
    Mismatch,
    Error,
}

/// One file whose name matched a copy-naming pattern, with the facts about
/// its inferred original captured at scan time.
#[derive(Debug, Clone, Serialize)]
pub struct CopyCandidate {
    /// Absolute path of the copy file; unique key within a snapshot.
    pub path: PathBuf,
    /// Directory containing the copy.
    pub directory: PathBuf,
    /// File name of the copy, including extension.
    pub name: String,
    /// Extension of the copy, without the leading dot.
    pub extension: String,
    /// Stem the classifier infers as the original, if a pattern matched.
    pub inferred_original_base: Option<String>,
    /// `directory/inferred_original_base.extension`, when inferred.
    pub original_path: Option<PathBuf>,
    /// Whether a file existed at `original_path` at scan time.
    pub original_exists: bool,
    /// Size of the copy file in bytes at scan time.
    pub size: u64,
    /// Modification time of the copy file at scan time.
    pub modified_at: Option<SystemTime>,
    /// A candidate is never deletable without a verified-present original.
    pub deletable: bool,
    pub hash_state: HashState,
}

/// Per-directory rollup of deletable candidates, derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderAggregate {
    pub directory: PathBuf,
    pub count: usize,
    pub reclaimable_bytes: u64,
}

/// Immutable result of one full scan of a root directory.
///
/// Candidates are sorted by (directory, name) for stable display. A snapshot
/// is superseded wholesale by the next scan, never patched incrementally.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSnapshot {
    pub root: PathBuf,
    pub candidates: Vec<CopyCandidate>,
    /// Number of directories skipped because they could not be read.
    pub skipped_dirs: usize,
}

impl ScanSnapshot {
    /// Total bytes that would be reclaimed by deleting every deletable
    /// candidate.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.candidates
            .iter()
            .filter(|c| c.deletable)
            .map(|c| c.size)
            .sum()
    }

    /// Groups deletable candidates per directory, sorted by directory path.
    pub fn folder_aggregates(&self) -> Vec<FolderAggregate> {
        let mut by_dir: BTreeMap<&PathBuf, (usize, u64)> = BTreeMap::new();
        for candidate in self.candidates.iter().filter(|c| c.deletable) {
            let entry = by_dir.entry(&candidate.directory).or_default();
            entry.0 += 1;
            entry.1 += candidate.size;
        }
        by_dir
            .into_iter()
            .map(|(directory, (count, reclaimable_bytes))| FolderAggregate {
                directory: directory.clone(),
                count,
                reclaimable_bytes,
            })
            .collect()
    }
}

pub use classifier::NameClassifier;
pub use error::CoreError;
pub use hasher::IntegrityVerifier;
pub use planner::{DeletionPlanner, DeletionReport, SystemTrash, TrashProvider};
pub use scanner::CandidateScanner;
pub use watcher::{SnapshotSink, WatchCoordinator, WatchHandle};
