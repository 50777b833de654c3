//! Extension trait for [`ResultCache`] with a compute-on-miss helper.

use crate::{Fingerprint, ResultCache};

/// Convenience methods for [`ResultCache`].
///
/// Implemented as default methods on an extension trait so that
/// [`ResultCache`] stays object-safe while callers get a generic
/// `get_or_compute`.
pub trait ResultCacheExt: ResultCache {
    /// Return the cached output for `fingerprint`, computing and storing it on a miss.
    ///
    /// `compute` is not called on a hit. A failed computation stores nothing.
    fn get_or_compute<E, F>(&self, fingerprint: &Fingerprint, compute: F) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
    {
        if let Some(output) = self.get(fingerprint) {
            tracing::debug!(%fingerprint, "Cache hit");
            return Ok(output);
        }

        let output = compute()?;
        tracing::debug!(%fingerprint, "Cache store");
        self.set(fingerprint, &output);
        Ok(output)
    }
}

impl<C: ResultCache + ?Sized> ResultCacheExt for C {}
