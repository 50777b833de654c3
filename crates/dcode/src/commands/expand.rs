//! `dcode expand` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use dcode_config::{CliSettings, Config};
use dcode_core::Expander;
use dcode_rst::RstProcessor;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the expand command.
#[derive(Args)]
pub(crate) struct ExpandArgs {
    /// reStructuredText document to expand.
    input: PathBuf,

    /// Write the expanded document here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover dcode.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable caching.
    #[arg(long)]
    no_cache: bool,

    /// Append every executed command line to this file (overrides config).
    #[arg(long, env = "DCODE_RECORD")]
    record: Option<PathBuf>,

    /// Enable verbose output (log script runs and cache hits).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ExpandArgs {
    /// Execute the expand command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, a directive fails, or the
    /// document cannot be read or written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            cache_enabled: self.no_cache.then_some(false),
            record: self.record,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(
            config = ?config.config_path,
            cache_enabled = config.build_resolved.cache_enabled,
            record = ?config.build_resolved.record,
            "Starting build"
        );

        let mut expander = Expander::new()
            .with_cache_enabled(config.build_resolved.cache_enabled)
            .with_record(config.build_resolved.record.clone());
        for request in config.default_requests() {
            expander.apply_defaults(request.key.as_deref(), &request.options)?;
        }

        let mut processor = RstProcessor::new(expander);
        let expanded = processor.process_file(&self.input)?;

        if let Some(path) = &self.output {
            std::fs::write(path, &expanded)?;
            output.written(path);
        } else {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(expanded.as_bytes())?;
            stdout.flush()?;
        }

        output.summary(&self.input, processor.expander().stats());
        Ok(())
    }
}
