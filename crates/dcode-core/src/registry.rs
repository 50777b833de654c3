//! Keyed option registry with default inheritance.

use std::collections::HashMap;

use crate::settings::{Options, SettingsLayer};
use crate::{ExpandError, Settings};

/// Registry of directive defaults.
///
/// Holds one global default layer and one override layer per key. Resolving
/// a key stacks its overrides over the global defaults field by field, so a
/// key only needs to name what differs.
///
/// The registry lives for a whole build and is mutated in document order:
/// a `dcode-default` block affects every directive after it.
#[derive(Debug, Default)]
pub struct Registry {
    defaults: SettingsLayer,
    keys: HashMap<String, SettingsLayer>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has been registered by a previous override.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Merge `options` into the layer for `key` (`None` for global defaults).
    ///
    /// Only recognized options are stored; anything else is ignored with a
    /// warning since defaults cannot carry script keyword arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidOption`] if an option value is malformed.
    /// The registry is left unchanged in that case.
    pub fn apply_overrides(
        &mut self,
        key: Option<&str>,
        options: &Options,
    ) -> Result<(), ExpandError> {
        let (layer, ignored) = SettingsLayer::parse(options)?;
        for name in ignored.keys() {
            tracing::warn!(
                key = key.unwrap_or("default"),
                option = %name,
                "Ignoring unknown default option"
            );
        }

        tracing::debug!(key = key.unwrap_or("default"), ?layer, "Applying defaults");
        match key {
            Some(key) => self.keys.entry(key.to_owned()).or_default().merge(layer),
            None => self.defaults.merge(layer),
        }
        Ok(())
    }

    /// Resolve effective settings for `key`.
    ///
    /// Unknown keys resolve to the global defaults.
    #[must_use]
    pub fn resolve(&self, key: Option<&str>) -> Settings {
        self.stack(key).resolve(key)
    }

    /// Resolve settings for `key` with `directive` stacked on top.
    #[must_use]
    pub fn resolve_with(&self, key: Option<&str>, directive: &SettingsLayer) -> Settings {
        directive.over(&self.stack(key)).resolve(key)
    }

    fn stack(&self, key: Option<&str>) -> SettingsLayer {
        match key.and_then(|key| self.keys.get(key)) {
            Some(layer) => layer.over(&self.defaults),
            None => self.defaults.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use dcode_sections::SectionPath;
    use pretty_assertions::assert_eq;

    use super::*;

    fn options(pairs: &[(&str, &str)]) -> Options {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_empty_registry_resolves_builtin_defaults() {
        let registry = Registry::new();

        assert_eq!(registry.resolve(None), Settings::default());
    }

    #[test]
    fn test_key_inherits_unset_fields_from_defaults() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(None, &options(&[("script", "gen"), ("cache", "")]))
            .unwrap();
        registry
            .apply_overrides(Some("api"), &options(&[("section-include", "params")]))
            .unwrap();

        let settings = registry.resolve(Some("api"));

        assert_eq!(settings.key.as_deref(), Some("api"));
        assert_eq!(settings.script.as_deref(), Some("gen"));
        assert!(settings.cache);
        assert_eq!(settings.section_include, Some(vec![SectionPath::new("params")]));
    }

    #[test]
    fn test_key_override_wins_over_defaults() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(None, &options(&[("script", "gen"), ("cache", "")]))
            .unwrap();
        registry
            .apply_overrides(Some("api"), &options(&[("script", "api-gen"), ("cache", "no")]))
            .unwrap();

        let settings = registry.resolve(Some("api"));

        assert_eq!(settings.script.as_deref(), Some("api-gen"));
        assert!(!settings.cache);
        assert_eq!(registry.resolve(None).script.as_deref(), Some("gen"));
    }

    #[test]
    fn test_later_defaults_are_visible_to_existing_keys() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(Some("api"), &options(&[("ignore", "")]))
            .unwrap();
        registry
            .apply_overrides(None, &options(&[("script", "late-gen")]))
            .unwrap();

        let settings = registry.resolve(Some("api"));

        assert_eq!(settings.script.as_deref(), Some("late-gen"));
        assert!(settings.ignore);
    }

    #[test]
    fn test_repeated_overrides_merge_field_by_field() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(Some("api"), &options(&[("script", "gen"), ("record", "/tmp/a")]))
            .unwrap();
        registry
            .apply_overrides(Some("api"), &options(&[("record", "/tmp/b")]))
            .unwrap();

        let settings = registry.resolve(Some("api"));

        assert_eq!(settings.script.as_deref(), Some("gen"));
        assert_eq!(settings.record, Some(PathBuf::from("/tmp/b")));
    }

    #[test]
    fn test_unknown_key_resolves_defaults() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(None, &options(&[("script", "gen")]))
            .unwrap();

        let settings = registry.resolve(Some("missing"));

        assert_eq!(settings.script.as_deref(), Some("gen"));
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_contains_registered_key() {
        let mut registry = Registry::new();
        registry.apply_overrides(Some("api"), &Options::new()).unwrap();

        assert!(registry.contains("api"));
    }

    #[test]
    fn test_invalid_option_leaves_registry_unchanged() {
        let mut registry = Registry::new();
        let result =
            registry.apply_overrides(Some("api"), &options(&[("script", "gen"), ("cache", "?")]));

        assert!(matches!(result, Err(ExpandError::InvalidOption { .. })));
        assert!(!registry.contains("api"));
    }

    #[test]
    fn test_unknown_default_option_is_ignored() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(None, &options(&[("format", "rst")]))
            .unwrap();

        assert_eq!(registry.resolve(None), Settings::default());
    }

    #[test]
    fn test_resolve_with_directive_layer() {
        let mut registry = Registry::new();
        registry
            .apply_overrides(None, &options(&[("script", "gen"), ("cache", "")]))
            .unwrap();
        let directive = SettingsLayer {
            cache: Some(false),
            ..SettingsLayer::default()
        };

        let settings = registry.resolve_with(None, &directive);

        assert_eq!(settings.script.as_deref(), Some("gen"));
        assert!(!settings.cache);
    }
}
