pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Directory names pruned during scans (build and dependency caches).
    pub excluded_dirs: HashSet<String>,
    /// Root of the most recently scanned tree.
    pub last_directory: Option<PathBuf>,
    /// When true, deletion additionally requires a content-digest match
    /// between copy and original.
    pub strict_hash: bool,
    /// Whether the bare `Name (N)` convention counts as a copy marker.
    pub numeric_suffix_rule: bool,
    /// Maximum directory depth walked during a scan.
    pub max_scan_depth: usize,
    /// How long write activity must pause before the watch primitive
    /// notifies (debounce window, milliseconds).
    pub settle_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let excluded_dirs = [
            "node_modules",
            "dist",
            "target",
            "build",
            "out",
            "__pycache__",
            ".venv",
            "venv",
            ".git",
            ".svn",
            ".idea",
            ".vscode",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        Self {
            excluded_dirs,
            last_directory: None,
            strict_hash: false,
            numeric_suffix_rule: true,
            max_scan_depth: 99,
            settle_ms: 500,
        }
    }
}
