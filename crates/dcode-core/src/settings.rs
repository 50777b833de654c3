//! Directive settings and option parsing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dcode_cache::Kwargs;
use dcode_sections::SectionPath;

use crate::ExpandError;

/// Raw directive options as written by the author (`name -> value`).
pub type Options = BTreeMap<String, String>;

/// Option naming the script command line.
pub const SCRIPT: &str = "script";
/// Flag enabling the result cache.
pub const CACHE: &str = "cache";
/// Option naming the audit record file.
pub const RECORD: &str = "record";
/// Flag suppressing the directive entirely.
pub const IGNORE: &str = "ignore";
/// Option listing the adornment character per section depth.
pub const SECTION_CHARS: &str = "section-chars";
/// Option listing the dotted section paths to keep.
pub const SECTION_INCLUDE: &str = "section-include";

/// Adornment characters used when none are configured.
pub const DEFAULT_SECTION_CHARS: &str = "~^";

/// Fully resolved settings for one directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Key the settings were resolved for (`None` for the default key).
    pub key: Option<String>,
    /// Script command line.
    pub script: Option<String>,
    /// Whether results may be served from and stored in the cache.
    pub cache: bool,
    /// File each executed command line is appended to.
    pub record: Option<PathBuf>,
    /// Whether the directive produces no output and runs nothing.
    pub ignore: bool,
    /// Adornment character per section depth.
    pub section_chars: String,
    /// Section paths to keep. `None` disables filtering; an empty list keeps nothing.
    pub section_include: Option<Vec<SectionPath>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key: None,
            script: None,
            cache: false,
            record: None,
            ignore: false,
            section_chars: DEFAULT_SECTION_CHARS.to_owned(),
            section_include: None,
        }
    }
}

impl Settings {
    /// Script command line, or a configuration error naming the key.
    ///
    /// A blank script counts as missing.
    pub fn require_script(&self) -> Result<&str, ExpandError> {
        self.script
            .as_deref()
            .filter(|script| !script.trim().is_empty())
            .ok_or_else(|| ExpandError::Configuration {
                key: self.key.clone(),
            })
    }
}

/// One layer of partially specified settings.
///
/// Layers stack: directive options over key defaults over global defaults.
/// A field left `None` falls through to the layer below.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsLayer {
    pub script: Option<String>,
    pub cache: Option<bool>,
    pub record: Option<PathBuf>,
    pub ignore: Option<bool>,
    pub section_chars: Option<String>,
    pub section_include: Option<Vec<SectionPath>>,
}

impl SettingsLayer {
    /// Parse options into a layer, returning unrecognized options as kwargs.
    ///
    /// Kwarg values are split on whitespace; each word becomes one
    /// `--name=word` argument.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidOption`] for a malformed flag or an empty
    /// `section-chars`.
    pub fn parse(options: &Options) -> Result<(Self, Kwargs), ExpandError> {
        let mut layer = Self::default();
        let mut kwargs = Kwargs::new();

        for (name, value) in options {
            match name.as_str() {
                SCRIPT => layer.script = Some(value.trim().to_owned()),
                CACHE => layer.cache = Some(parse_flag(name, value)?),
                RECORD => {
                    let expanded = shellexpand::tilde(value.trim());
                    layer.record = Some(PathBuf::from(expanded.as_ref()));
                }
                IGNORE => layer.ignore = Some(parse_flag(name, value)?),
                SECTION_CHARS => {
                    let chars = value.trim();
                    if chars.is_empty() {
                        return Err(invalid(name, value));
                    }
                    layer.section_chars = Some(chars.to_owned());
                }
                SECTION_INCLUDE => layer.section_include = Some(SectionPath::parse_list(value)),
                _ => {
                    let words = value.split_whitespace().map(str::to_owned).collect();
                    kwargs.insert(name.clone(), words);
                }
            }
        }

        Ok((layer, kwargs))
    }

    /// Overwrite the fields set in `other`, leaving the rest untouched.
    pub fn merge(&mut self, other: Self) {
        if other.script.is_some() {
            self.script = other.script;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if other.record.is_some() {
            self.record = other.record;
        }
        if other.ignore.is_some() {
            self.ignore = other.ignore;
        }
        if other.section_chars.is_some() {
            self.section_chars = other.section_chars;
        }
        if other.section_include.is_some() {
            self.section_include = other.section_include;
        }
    }

    /// Stack `self` over `lower`: fields set here win.
    #[must_use]
    pub fn over(&self, lower: &Self) -> Self {
        let mut stacked = lower.clone();
        stacked.merge(self.clone());
        stacked
    }

    /// Fill unset fields with built-in defaults.
    #[must_use]
    pub fn resolve(self, key: Option<&str>) -> Settings {
        let base = Settings::default();
        Settings {
            key: key.map(str::to_owned),
            script: self.script,
            cache: self.cache.unwrap_or(base.cache),
            record: self.record,
            ignore: self.ignore.unwrap_or(base.ignore),
            section_chars: self.section_chars.unwrap_or(base.section_chars),
            section_include: self.section_include,
        }
    }
}

/// Parse a flag option. An empty value means `true`.
fn parse_flag(name: &str, value: &str) -> Result<bool, ExpandError> {
    match value.trim().to_lowercase().as_str() {
        "" | "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

fn invalid(name: &str, value: &str) -> ExpandError {
    ExpandError::InvalidOption {
        option: name.to_owned(),
        value: value.to_owned(),
    }
}
