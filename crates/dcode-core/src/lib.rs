//! Directive expansion engine for dcode.
//!
//! A `dcode` directive names a script (directly or through a registered key),
//! runs it with the directive's arguments, options and body, and replaces the
//! directive with the script's output.
//!
//! # Architecture
//!
//! - [`Registry`]: Global and per-key defaults, resolved field by field
//! - [`Invocation`]: Command line construction and subprocess execution
//! - [`generate`]: Cache lookup, execution and section filtering for one directive
//! - [`Expander`]: Build-scoped state tying the above together
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use dcode_core::{Expander, Request};
//!
//! let mut expander = Expander::new();
//! let defaults = BTreeMap::from([("script".to_owned(), "cat".to_owned())]);
//! expander.apply_defaults(None, &defaults).unwrap();
//!
//! let lines = expander
//!     .expand(Request {
//!         content: Some("Hello\n=====".to_owned()),
//!         ..Request::default()
//!     })
//!     .unwrap();
//! assert_eq!(lines, ["Hello", "====="]);
//! ```

mod error;
mod expander;
mod generate;
mod invocation;
mod registry;
pub mod settings;

pub use error::{ExecutionFailure, ExpandError};
pub use expander::{ExpandStats, Expander, Request};
pub use generate::{Outcome, ScriptInput, generate};
pub use invocation::Invocation;
pub use registry::Registry;
pub use settings::{Options, Settings, SettingsLayer};
