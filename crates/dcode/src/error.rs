//! CLI error types.

use dcode_config::ConfigError;
use dcode_core::ExpandError;
use dcode_rst::RstError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Expand(#[from] ExpandError),

    #[error("{0}")]
    Rst(#[from] RstError),

    #[error("{0}")]
    Validation(String),
}
