//! Domain blocklist (component H) and its text-file loader.
//!
//! The loader is the "external collaborator" named in spec §1; the
//! predicate itself (`is_blocked`) is the core, testable piece.

use std::fs;
use std::path::Path;

const MAX_ENTRIES: usize = 100;

pub struct BlockList {
    entries: Vec<String>,
}

impl BlockList {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// One domain substring per line; blank lines ignored; silently capped
    /// at `MAX_ENTRIES`. A missing file yields an empty list rather than an
    /// error, matching the config loader's tolerance (spec §10.D).
    pub fn load(path: &Path) -> Self {
        let text = fs::read_to_string(path).unwrap_or_default();
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(MAX_ENTRIES)
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    /// True iff any blocklist entry is a substring of `host` (case-sensitive).
    pub fn is_blocked(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        self.entries.iter().any(|entry| host.contains(entry.as_str()))
    }
}
