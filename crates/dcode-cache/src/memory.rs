//! In-memory cache implementation.
//!
//! [`MemoryCache`] keeps every captured output for the lifetime of the value.
//! There is no eviction: one cache is meant to serve exactly one document build.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::{Fingerprint, ResultCache};

/// Unbounded in-memory [`ResultCache`].
///
/// The map is guarded by a mutex so a cache may be shared between threads,
/// although a build drives it from a single thread.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<Fingerprint, String>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached outputs.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether nothing has been cached yet.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<String> {
        self.entries.lock().unwrap().get(fingerprint).cloned()
    }

    fn set(&self, fingerprint: &Fingerprint, output: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(*fingerprint, output.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{InvocationKey, Kwargs};

    fn fingerprint(script: &str) -> Fingerprint {
        InvocationKey {
            script,
            args: &[],
            kwargs: &Kwargs::new(),
            content: None,
        }
        .fingerprint()
    }

    #[test]
    fn test_set_and_get() {
        let cache = MemoryCache::new();
        let fp = fingerprint("gen");

        cache.set(&fp, "Title\n=====\n");
        assert_eq!(cache.get(&fp), Some("Title\n=====\n".to_owned()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let cache = MemoryCache::new();

        assert_eq!(cache.get(&fingerprint("gen")), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite() {
        let cache = MemoryCache::new();
        let fp = fingerprint("gen");

        cache.set(&fp, "first");
        cache.set(&fp, "second");

        assert_eq!(cache.get(&fp), Some("second".to_owned()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entries_are_isolated_by_fingerprint() {
        let cache = MemoryCache::new();
        let a = fingerprint("gen-a");
        let b = fingerprint("gen-b");

        cache.set(&a, "alpha");
        cache.set(&b, "beta");

        assert_eq!(cache.get(&a), Some("alpha".to_owned()));
        assert_eq!(cache.get(&b), Some("beta".to_owned()));
    }
}
