//! Configuration management for dcode.
//!
//! Parses `dcode.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! A config file seeds the directive defaults before any document is read:
//! the `[defaults]` table plays the role of a key-less `dcode-default`
//! directive and every `[keys.<name>]` table the role of `dcode-default <name>`.
//!
//! ```toml
//! [build]
//! record = "~/dcode.record"
//!
//! [defaults]
//! script = "python3 tools/gen.py"
//! cache = true
//!
//! [keys.api]
//! script = "tools/api-doc --format rst"
//! section-include = ["reference.params", "usage"]
//! ```
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `script`, `record` and `section-include` values (and `build.record`)
//! support `${VAR}` and `${VAR:-default}` expansion.

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "dcode.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the build-wide cache switch.
    pub cache_enabled: Option<bool>,
    /// Override the audit record path for every invocation.
    pub record: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Build-wide settings (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Defaults for directives without a key.
    pub defaults: Option<DirectiveDefaults>,
    /// Defaults for keyed directives.
    pub keys: BTreeMap<String, DirectiveDefaults>,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw build configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BuildConfigRaw {
    cache: Option<bool>,
    record: Option<String>,
}

/// Resolved build-wide settings.
#[derive(Debug)]
pub struct BuildConfig {
    /// Whether result caching is allowed at all. When false, `cache` flags
    /// on directives are ignored.
    pub cache_enabled: bool,
    /// Audit record path applied to every invocation, overriding directive values.
    pub record: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            record: None,
        }
    }
}

/// Default directive options for one key, as written in `dcode.toml`.
///
/// Field names follow the directive option names (`section-chars`, ...).
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct DirectiveDefaults {
    /// Script command line.
    pub script: Option<String>,
    /// Cache the script output for the rest of the build.
    pub cache: Option<bool>,
    /// Audit record path.
    pub record: Option<String>,
    /// Skip the directive entirely.
    pub ignore: Option<bool>,
    /// Adornment character per section depth.
    pub section_chars: Option<String>,
    /// Dotted section paths to keep.
    pub section_include: Option<SectionInclude>,
}

/// `section-include` value: either a list or a whitespace-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SectionInclude {
    /// `section-include = ["a.b", "c"]`
    List(Vec<String>),
    /// `section-include = "a.b c"`
    Joined(String),
}

impl SectionInclude {
    /// The value in directive option form (whitespace-separated).
    #[must_use]
    pub fn to_option_value(&self) -> String {
        match self {
            Self::List(paths) => paths.join(" "),
            Self::Joined(value) => value.clone(),
        }
    }
}

impl DirectiveDefaults {
    /// Convert to directive options (`name -> value`).
    ///
    /// Booleans become `"true"`/`"false"` so an explicit `false` still
    /// overrides an inherited `true`.
    #[must_use]
    pub fn to_options(&self) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        let mut put = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                options.insert(name.to_owned(), value);
            }
        };

        put("script", self.script.clone());
        put("cache", self.cache.map(|v| v.to_string()));
        put("record", self.record.clone());
        put("ignore", self.ignore.map(|v| v.to_string()));
        put("section-chars", self.section_chars.clone());
        put(
            "section-include",
            self.section_include
                .as_ref()
                .map(SectionInclude::to_option_value),
        );

        options
    }

    fn validate(&self, table: &str) -> Result<(), ConfigError> {
        if let Some(script) = &self.script {
            require_non_empty(script.trim(), &format!("{table}.script"))?;
        }
        if let Some(chars) = &self.section_chars {
            let field = format!("{table}.section-chars");
            require_non_empty(chars, &field)?;
            if chars.chars().any(|c| c.is_alphanumeric() || c.is_whitespace()) {
                return Err(ConfigError::Validation(format!(
                    "{field} must contain only punctuation characters"
                )));
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self, table: &str) -> Result<(), ConfigError> {
        if let Some(script) = &self.script {
            self.script = Some(expand::expand_env(script, &format!("{table}.script"))?);
        }
        if let Some(record) = &self.record {
            self.record = Some(expand::expand_env(record, &format!("{table}.record"))?);
        }
        if let Some(include) = &mut self.section_include {
            let field = format!("{table}.section-include");
            match include {
                SectionInclude::List(paths) => {
                    for path in paths.iter_mut() {
                        *path = expand::expand_env(path, &field)?;
                    }
                }
                SectionInclude::Joined(value) => *value = expand::expand_env(value, &field)?,
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        if let Some(record) = &self.record {
            self.record = Some(resolve_record(record, config_dir));
        }
    }
}

/// One `(key, options)` default request, in the order it must be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRequest {
    /// Directive key (`None` for the global defaults).
    pub key: Option<String>,
    /// Directive options.
    pub options: BTreeMap<String, String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`keys.api.script`").
        field: String,
        /// Error message (e.g., "${`TOOLS`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Resolve a record path against the config directory.
///
/// `~`-prefixed and absolute paths are kept as written; `~` is expanded when
/// the option is applied.
fn resolve_record(record: &str, config_dir: &Path) -> String {
    if record.starts_with('~') || Path::new(record).is_absolute() {
        return record.to_owned();
    }
    config_dir.join(record).display().to_string()
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `dcode.toml` in current directory and parents,
    /// falling back to an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            tracing::debug!(path = %discovered.display(), "Discovered config file");
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Directive defaults in application order: `[defaults]` first, then
    /// `[keys.*]` sorted by name.
    #[must_use]
    pub fn default_requests(&self) -> Vec<DefaultRequest> {
        let global = self.defaults.iter().map(|defaults| DefaultRequest {
            key: None,
            options: defaults.to_options(),
        });
        let keyed = self.keys.iter().map(|(key, defaults)| DefaultRequest {
            key: Some(key.clone()),
            options: defaults.to_options(),
        });
        global.chain(keyed).collect()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(defaults) = &self.defaults {
            defaults.validate("defaults")?;
        }
        for (key, defaults) in &self.keys {
            require_non_empty(key.trim(), "keys.<name>")?;
            defaults.validate(&format!("keys.{key}"))?;
        }
        Ok(())
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(cache_enabled) = settings.cache_enabled {
            self.build_resolved.cache_enabled = cache_enabled;
        }
        if let Some(record) = &settings.record {
            self.build_resolved.record = Some(record.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;
        tracing::info!(
            path = %path.display(),
            keys = config.keys.len(),
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(record) = &self.build.record {
            self.build.record = Some(expand::expand_env(record, "build.record")?);
        }
        if let Some(defaults) = &mut self.defaults {
            defaults.expand_env_vars("defaults")?;
        }
        for (key, defaults) in &mut self.keys {
            defaults.expand_env_vars(&format!("keys.{key}"))?;
        }
        Ok(())
    }

    /// Resolve relative record paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.build_resolved = BuildConfig {
            cache_enabled: self.build.cache.unwrap_or(true),
            record: self
                .build
                .record
                .as_deref()
                .map(|record| PathBuf::from(resolve_record(record, config_dir))),
        };
        if let Some(defaults) = &mut self.defaults {
            defaults.resolve_paths(config_dir);
        }
        for defaults in self.keys.values_mut() {
            defaults.resolve_paths(config_dir);
        }
    }
}
