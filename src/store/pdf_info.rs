//! Session cache of resolved PDF files

use std::collections::{HashMap, HashSet};

use crate::core::resolver::{ResolveError, ResolvedFile};

/// Cache key: a file within a dataset version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdfKey {
    pub version: String,
    pub filename: String,
}

impl PdfKey {
    pub fn new(version: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            filename: filename.into(),
        }
    }
}

/// Resolved files for the session. Entries are never evicted; failures are
/// never stored so the next request probes again.
#[derive(Debug, Default)]
pub struct PdfInfoStore {
    entries: HashMap<PdfKey, ResolvedFile>,
    pending: HashSet<PdfKey>,
}

impl PdfInfoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PdfKey) -> Option<&ResolvedFile> {
        let hit = self.entries.get(key);
        if hit.is_some() {
            tracing::trace!("PDF cache hit for v{}/{}", key.version, key.filename);
        }
        hit
    }

    pub fn set(&mut self, key: PdfKey, file: ResolvedFile) {
        self.pending.remove(&key);
        self.entries.insert(key, file);
    }

    pub fn contains(&self, key: &PdfKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Note that a resolution for `key` was started.
    ///
    /// Returns `false` when the key is cached or already pending, meaning no new
    /// resolution is needed.
    pub fn begin_resolve(&mut self, key: &PdfKey) -> bool {
        if self.contains(key) {
            return false;
        }
        self.pending.insert(key.clone())
    }

    /// Store a resolution outcome. Successes are cached, failures only clear
    /// the pending flag.
    pub fn record(&mut self, key: PdfKey, result: &Result<ResolvedFile, ResolveError>) {
        match result {
            Ok(file) => self.set(key, file.clone()),
            Err(err) => {
                tracing::debug!("Not caching v{}/{}: {}", key.version, key.filename, err);
                self.pending.remove(&key);
            }
        }
    }
}
