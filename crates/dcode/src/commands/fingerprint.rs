//! `dcode fingerprint` command implementation.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use dcode_core::Invocation;

use crate::error::CliError;

/// Arguments for the fingerprint command.
#[derive(Args)]
pub(crate) struct FingerprintArgs {
    /// Script command line, as configured.
    script: String,

    /// Positional arguments passed to the script.
    args: Vec<String>,

    /// Keyword argument passed as `--NAME=VALUE` (repeatable).
    #[arg(short = 'k', long = "kwarg", value_name = "NAME=VALUE")]
    kwargs: Vec<String>,

    /// File holding the directive body fed on stdin.
    #[arg(long)]
    content: Option<PathBuf>,
}

impl FingerprintArgs {
    /// Execute the fingerprint command.
    ///
    /// # Errors
    ///
    /// Returns an error if a kwarg is malformed or the content file cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let mut kwargs: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for kwarg in &self.kwargs {
            let (name, value) = kwarg.split_once('=').ok_or_else(|| {
                CliError::Validation(format!("Invalid kwarg `{kwarg}`, expected NAME=VALUE"))
            })?;
            kwargs
                .entry(name.to_owned())
                .or_default()
                .extend(value.split_whitespace().map(str::to_owned));
        }

        let content = self
            .content
            .as_deref()
            .map(std::fs::read_to_string)
            .transpose()?;

        let invocation = Invocation {
            script: self.script,
            args: self.args,
            kwargs,
            content,
        };

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", invocation.key().fingerprint())?;
        Ok(())
    }
}
