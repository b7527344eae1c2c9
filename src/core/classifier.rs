//! Infers the original file name a copy-named file was duplicated from.

use regex::Regex;
use std::sync::OnceLock;

/// Classifies file stems (basenames without extension) against the known
/// copy-naming conventions.
///
/// This is a pure, deterministic function of the stem string alone: it never
/// touches the filesystem and has no failure mode. Rules are tried in a fixed
/// order and the first match wins, so an explicit "Copy" marker always takes
/// precedence over the looser numeric-suffix convention.
#[derive(Debug, Clone)]
pub struct NameClassifier {
    /// Whether the bare `Name (N)` convention (N >= 2) is treated as a copy
    /// marker. This rule can false-positive on legitimately numbered files
    /// (versioned exports), so it is configurable.
    numeric_suffix: bool,
}

fn copy_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.+)\s-\scopy(?:\s\(\d+\))?$").unwrap())
}

fn copia_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.+)\s-\scopia(?:\s\(\d+\))?$").unwrap())
}

fn copy_of_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^copy\s+of\s+(.+)$").unwrap())
}

fn copia_di_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^copia\s+di\s+(.+)$").unwrap())
}

fn numeric_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)\s\((\d+)\)$").unwrap())
}

impl NameClassifier {
    pub fn new(numeric_suffix: bool) -> Self {
        Self { numeric_suffix }
    }

    /// Returns the inferred original stem if `stem` matches a copy-naming
    /// pattern, or `None` otherwise.
    ///
    /// The returned stem is never empty: every rule requires at least one
    /// character of original name.
    pub fn classify(&self, stem: &str) -> Option<String> {
        // 1) "Name - Copy" / "Name - Copy (2)"
        if let Some(caps) = copy_suffix_re().captures(stem) {
            return Some(caps[1].to_string());
        }

        // 2) "Name - Copia" / "Name - Copia (2)" (Italian)
        if let Some(caps) = copia_suffix_re().captures(stem) {
            return Some(caps[1].to_string());
        }

        // 3) "Copy of Name"
        if let Some(caps) = copy_of_re().captures(stem) {
            return Some(caps[1].to_string());
        }

        // 4) "Copia di Name" (Italian)
        if let Some(caps) = copia_di_re().captures(stem) {
            return Some(caps[1].to_string());
        }

        // 5) "Name (N)" with N >= 2; (0) and (1) are not duplicate markers.
        if self.numeric_suffix {
            if let Some(caps) = numeric_suffix_re().captures(stem) {
                if caps[2].parse::<u64>().map_or(false, |n| n >= 2) {
                    return Some(caps[1].to_string());
                }
            }
        }

        None
    }
}

impl Default for NameClassifier {
    fn default() -> Self {
        Self::new(true)
    }
}
