use std::{collections::HashMap, sync::Arc};

use crate::{assets::decode::PreparedImage, foundation::error::ChatreelResult};

#[derive(Clone, Debug)]
/// Outcome of a completed resolution attempt.
pub enum CacheEntry {
    /// Loader succeeded; the decoded image is shared with every message referencing the key.
    Resolved(Arc<PreparedImage>),
    /// Loader failed and the failure was remembered.
    Failed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// What to do with a key whose loader failed.
pub enum NegativeCachePolicy {
    /// Store a [`CacheEntry::Failed`] marker; later lookups of the key never call a loader again.
    #[default]
    Remember,
    /// Store nothing; the next lookup of the key runs its loader again.
    Retry,
}

/// Run-scoped image memo keyed by a stable identifier (channel id, `emoji:<id>`).
///
/// Populated during normalization only. There is no eviction: a conversion run is bounded.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<String, CacheEntry>,
    policy: NegativeCachePolicy,
    downloads: u64,
    failures: u64,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: NegativeCachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> NegativeCachePolicy {
        self.policy
    }

    /// `None` means the key was never attempted (or failed under [`NegativeCachePolicy::Retry`]).
    pub fn lookup(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Return the cached image for `key`, invoking `loader` only on a miss.
    pub fn resolve<F>(&mut self, key: &str, loader: F) -> Option<Arc<PreparedImage>>
    where
        F: FnOnce() -> ChatreelResult<PreparedImage>,
    {
        match self.entries.get(key) {
            Some(CacheEntry::Resolved(img)) => return Some(img.clone()),
            Some(CacheEntry::Failed) => return None,
            None => {}
        }

        match loader() {
            Ok(img) => {
                let img = Arc::new(img);
                self.downloads += 1;
                tracing::debug!(
                    key,
                    width = img.width,
                    height = img.height,
                    downloads = self.downloads,
                    "image resolved"
                );
                self.entries
                    .insert(key.to_string(), CacheEntry::Resolved(img.clone()));
                Some(img)
            }
            Err(err) => {
                self.failures += 1;
                tracing::warn!(key, error = %err, "image resolution failed");
                if self.policy == NegativeCachePolicy::Remember {
                    self.entries.insert(key.to_string(), CacheEntry::Failed);
                }
                None
            }
        }
    }

    /// Number of successful loads so far.
    pub fn downloads(&self) -> u64 {
        self.downloads
    }

    /// Number of failed loads so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
