//! dcode CLI - script-generated documentation.
//!
//! Provides commands for:
//! - `expand`: Expand dcode directives in a reStructuredText document
//! - `fingerprint`: Print the cache fingerprint of a script invocation

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExpandArgs, FingerprintArgs};
use output::Output;

/// Log directives enabled by `--verbose`.
const VERBOSE_FILTER: &str =
    "warn,dcode=debug,dcode_cache=debug,dcode_config=debug,dcode_core=debug,dcode_rst=debug,dcode_sections=debug";

/// dcode - documentation generated by scripts.
#[derive(Parser)]
#[command(name = "dcode", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand dcode directives in a document.
    Expand(ExpandArgs),
    /// Print the cache fingerprint of a script invocation.
    Fingerprint(FingerprintArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Expand(args) if args.verbose);

    // --verbose enables DEBUG for dcode crates, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Expand(args) => args.execute(),
        Commands::Fingerprint(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
