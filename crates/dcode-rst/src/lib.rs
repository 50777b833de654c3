//! reStructuredText host for dcode directives.
//!
//! Scans documents for directive blocks and splices in script output:
//!
//! ```text
//! .. dcode-default:: api
//!    :script: tools/api-doc --format rst
//!    :cache:
//!
//! .. dcode:: api users
//!    :section-include: usage
//! ```
//!
//! The scanner is line-based and only understands the indentation rules needed
//! to find a block's options and body; everything else passes through as is.

mod parser;
mod processor;

use std::io;
use std::path::PathBuf;

use dcode_core::ExpandError;

pub use processor::RstProcessor;

/// Error returned when a document cannot be expanded.
#[derive(Debug, thiserror::Error)]
pub enum RstError {
    /// A directive failed.
    #[error("line {line}: {source}")]
    Expand {
        /// 1-based line number of the directive marker.
        line: usize,
        /// Underlying expansion error.
        source: ExpandError,
    },

    /// The document could not be read.
    #[error("Failed to read {}", .path.display())]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
