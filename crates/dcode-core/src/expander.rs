//! Build-scoped directive expander.

use std::path::PathBuf;

use dcode_cache::{MemoryCache, ResultCache};

use crate::generate::{Outcome, ScriptInput, generate};
use crate::settings::{Options, SettingsLayer};
use crate::{ExpandError, Registry};

/// One `dcode` directive as seen by the host document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    /// Directive arguments. The first one names a key if the registry knows it.
    pub arguments: Vec<String>,
    /// Directive options.
    pub options: Options,
    /// Directive body.
    pub content: Option<String>,
}

/// Counters for one build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpandStats {
    /// Directives expanded.
    pub directives: usize,
    /// Scripts actually run.
    pub invoked: usize,
    /// Directives answered from the cache.
    pub cached: usize,
    /// Directives skipped by `ignore`.
    pub ignored: usize,
}

/// Expands `dcode` directives for the lifetime of one build.
///
/// Owns the option [`Registry`] and the result cache, so both are shared by
/// every directive of the build and dropped with it.
pub struct Expander {
    registry: Registry,
    cache: Box<dyn ResultCache>,
    cache_enabled: bool,
    record: Option<PathBuf>,
    stats: ExpandStats,
}

impl Expander {
    /// Create an expander with an empty registry and an in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            cache: Box::new(MemoryCache::new()),
            cache_enabled: true,
            record: None,
            stats: ExpandStats::default(),
        }
    }

    /// Use `cache` for script results.
    #[must_use]
    pub fn with_cache(mut self, cache: Box<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Allow or forbid caching regardless of directive options.
    #[must_use]
    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Record every command line to `path`, overriding per-key record files.
    #[must_use]
    pub fn with_record(mut self, path: Option<PathBuf>) -> Self {
        self.record = path;
        self
    }

    /// Option registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> ExpandStats {
        self.stats
    }

    /// Handle a `dcode-default` directive: merge `options` into the defaults
    /// for `key` (`None` for the global defaults).
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidOption`] if an option value is malformed.
    pub fn apply_defaults(
        &mut self,
        key: Option<&str>,
        options: &Options,
    ) -> Result<(), ExpandError> {
        self.registry.apply_overrides(key, options)
    }

    /// Handle a `dcode` directive and return the lines replacing it.
    ///
    /// Directive options override the key's registered defaults; options the
    /// registry does not recognize are passed to the script as keyword
    /// arguments. Whitespace-only output lines are returned empty.
    ///
    /// # Errors
    ///
    /// Propagates configuration, option and script errors.
    pub fn expand(&mut self, request: Request) -> Result<Vec<String>, ExpandError> {
        let mut args = request.arguments;
        let key = match args.first() {
            Some(first) if self.registry.contains(first) => Some(args.remove(0)),
            _ => None,
        };

        let (directive, kwargs) = SettingsLayer::parse(&request.options)?;
        let mut settings = self.registry.resolve_with(key.as_deref(), &directive);
        if !self.cache_enabled {
            settings.cache = false;
        }
        if let Some(record) = &self.record {
            settings.record = Some(record.clone());
        }

        let input = ScriptInput {
            args,
            kwargs,
            content: request.content,
        };
        let mut lines: Vec<String> = Vec::new();
        let outcome = generate(&settings, input, self.cache.as_ref(), &mut lines)?;

        self.stats.directives += 1;
        match outcome {
            Outcome::Invoked => self.stats.invoked += 1,
            Outcome::Cached => self.stats.cached += 1,
            Outcome::Ignored => self.stats.ignored += 1,
        }
        tracing::debug!(
            key = key.as_deref().unwrap_or("default"),
            ?outcome,
            lines = lines.len(),
            "Directive expanded"
        );

        for line in &mut lines {
            if line.trim().is_empty() {
                line.clear();
            }
        }
        Ok(lines)
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}
