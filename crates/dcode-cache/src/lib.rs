//! Result caching for dcode.
//!
//! Script invocations are identified by a [`Fingerprint`] computed from an
//! [`InvocationKey`]. Captured output is stored in a [`ResultCache`] keyed by
//! that fingerprint, so an identical invocation later in the same build is
//! answered without running the script again.
//!
//! # Implementations
//!
//! - [`NullCache`]: No-op implementation (always misses)
//! - [`MemoryCache`]: In-memory map that lives as long as the build
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use dcode_cache::{InvocationKey, MemoryCache, ResultCache, ResultCacheExt};
//!
//! let cache = MemoryCache::new();
//! let kwargs = BTreeMap::new();
//! let key = InvocationKey {
//!     script: "gen-docs",
//!     args: &["api".to_owned()],
//!     kwargs: &kwargs,
//!     content: None,
//! };
//! let fingerprint = key.fingerprint();
//!
//! let output: Result<String, std::convert::Infallible> =
//!     cache.get_or_compute(&fingerprint, || Ok("Title\n=====\n".to_owned()));
//! assert_eq!(cache.get(&fingerprint), Some(output.unwrap()));
//! ```

mod ext;
mod key;
mod memory;

pub use ext::ResultCacheExt;
pub use key::{Fingerprint, InvocationKey, Kwargs};
pub use memory::MemoryCache;

/// Storage for captured script output, keyed by invocation [`Fingerprint`].
///
/// Entries never expire: a cache is created once per build and dropped with it.
pub trait ResultCache: Send + Sync {
    /// Retrieve previously captured output for `fingerprint`.
    fn get(&self, fingerprint: &Fingerprint) -> Option<String>;

    /// Store captured output, overwriting any previous entry.
    fn set(&self, fingerprint: &Fingerprint, output: &str);
}

/// No-op [`ResultCache`] that never stores or retrieves data.
///
/// Every `get` returns `None`; every `set` is silently discarded.
pub struct NullCache;

impl ResultCache for NullCache {
    fn get(&self, _fingerprint: &Fingerprint) -> Option<String> {
        None
    }

    fn set(&self, _fingerprint: &Fingerprint, _output: &str) {}
}
