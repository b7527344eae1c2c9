//! Builds the set of copy-candidate entries for a directory subtree.

use super::{CopyCandidate, HashState, NameClassifier, ScanSnapshot};
use crate::utils::is_image_file;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Walks a directory tree, classifies image file names and attaches the
/// existence/metadata facts that make up a [`ScanSnapshot`].
///
/// Enumeration is best-effort: unreadable directories are skipped and
/// counted, and the scan itself never fails. Symlinks are not followed and
/// depth is bounded, so traversal terminates even on cyclic link layouts.
pub struct CandidateScanner {
    classifier: NameClassifier,
    excluded_dirs: HashSet<String>,
    max_depth: usize,
}

impl CandidateScanner {
    pub fn new(
        classifier: NameClassifier,
        excluded_dirs: HashSet<String>,
        max_depth: usize,
    ) -> Self {
        Self {
            classifier,
            excluded_dirs,
            max_depth,
        }
    }

    /// Recursively enumerates all files under `root` and returns a fresh
    /// snapshot of every image file whose name matches a copy pattern.
    ///
    /// Degrades to an empty snapshot if `root` is not a readable directory;
    /// partial results are preferable to total failure.
    pub fn scan(&self, root: &Path) -> ScanSnapshot {
        let mut candidates = Vec::new();
        let mut skipped_dirs = 0usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|entry| !self.should_skip(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skipped_dirs += 1;
                    tracing::debug!("Skipping unreadable entry during scan: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !is_image_file(path) {
                continue;
            }

            if let Some(candidate) = self.build_candidate(path, &entry) {
                candidates.push(candidate);
            }
        }

        candidates.sort_by(|a, b| {
            a.directory
                .cmp(&b.directory)
                .then_with(|| a.name.cmp(&b.name))
        });

        tracing::info!(
            "Scan of {:?} complete: {} copy candidates, {} entries skipped",
            root,
            candidates.len(),
            skipped_dirs
        );

        ScanSnapshot {
            root: root.to_path_buf(),
            candidates,
            skipped_dirs,
        }
    }

    fn should_skip(&self, entry: &DirEntry) -> bool {
        // Never prune the scan root itself, even if its name is excluded.
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        entry
            .file_name()
            .to_str()
            .map(|name| self.excluded_dirs.contains(name))
            .unwrap_or(false)
    }

    fn build_candidate(&self, path: &Path, entry: &DirEntry) -> Option<CopyCandidate> {
        let stem = path.file_stem()?.to_str()?;
        let inferred = self.classifier.classify(stem)?;

        let directory = path.parent()?.to_path_buf();
        let name = path.file_name()?.to_string_lossy().to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_string();

        let original_path = sibling_path(&directory, &inferred, &extension);
        let original_exists = original_path.is_file();

        // Stat failures degrade to zeroed metadata rather than dropping the
        // candidate; deletability depends on the original, not on the stat.
        let (size, modified_at) = match entry.metadata() {
            Ok(metadata) => (metadata.len(), metadata.modified().ok()),
            Err(err) => {
                tracing::debug!("Failed to stat {:?}: {}", path, err);
                (0, None)
            }
        };

        Some(CopyCandidate {
            path: path.to_path_buf(),
            directory,
            name,
            extension,
            inferred_original_base: Some(inferred),
            original_path: Some(original_path),
            original_exists,
            size,
            modified_at,
            deletable: original_exists,
            hash_state: HashState::Idle,
        })
    }
}

/// Computes `directory/stem.extension`, the location where a candidate's
/// original must live.
pub fn sibling_path(directory: &Path, stem: &str, extension: &str) -> PathBuf {
    if extension.is_empty() {
        directory.join(stem)
    } else {
        directory.join(format!("{}.{}", stem, extension))
    }
}
