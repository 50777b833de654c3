//! Section filtering for generated reStructuredText.
//!
//! Scripts often produce a whole document when only one part of it is wanted.
//! [`SectionFilter`] sits between the script output and the final
//! [`LineSink`] and forwards only the lines inside the selected sections.
//!
//! Sections are recognized by the heading/underline convention:
//!
//! ```text
//! Details
//! ~~~~~~~
//! ```
//!
//! The adornment character decides the nesting depth: the filter is configured
//! with one character per depth (`"~^"` means `~` for top-level headings and
//! `^` for their subsections). A section is selected with a dotted path of
//! heading names, compared case-insensitively (`details.usage`).
//!
//! # Example
//!
//! ```
//! use dcode_sections::{SectionFilter, SectionPath};
//!
//! let include = vec![SectionPath::new("details")];
//! let mut filter = SectionFilter::new("~^", include, Vec::<String>::new());
//! for line in ["Intro", "-----", "text1", "Details", "~~~~~~~", "text2"] {
//!     filter.feed(line);
//! }
//! filter.finish();
//!
//! assert_eq!(filter.into_inner(), ["Details", "~~~~~~~", "text2"]);
//! ```

mod filter;
mod path;

pub use filter::SectionFilter;
pub use path::SectionPath;

/// Destination for generated lines.
pub trait LineSink {
    /// Accept one line (without its line terminator).
    fn write(&mut self, line: &str);
}

impl LineSink for Vec<String> {
    fn write(&mut self, line: &str) {
        self.push(line.to_owned());
    }
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn write(&mut self, line: &str) {
        (**self).write(line);
    }
}
