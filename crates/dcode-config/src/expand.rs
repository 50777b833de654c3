//! Environment variable expansion for configuration strings.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ConfigError;

static ENV_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").unwrap()
});

/// Expand `${VAR}` and `${VAR:-default}` references in a configuration value.
///
/// Only braced references are expanded. Bare `$1` or `$NAME` in a script
/// command line are left for the shell. The default applies when the
/// variable is unset or empty. An unset variable without a default is an
/// error naming `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut missing: Option<String> = None;
    let expanded = ENV_REF_RE.replace_all(value, |caps: &Captures| {
        let name = &caps[1];
        match (std::env::var(name), caps.get(2)) {
            (Ok(val), Some(default)) if val.is_empty() => default.as_str().to_owned(),
            (Ok(val), _) => val,
            (Err(_), Some(default)) => default.as_str().to_owned(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| name.to_owned());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        }),
        None => Ok(expanded.into_owned()),
    }
}
