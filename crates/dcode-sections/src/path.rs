//! Dotted section paths.

use std::fmt;

/// Separator between heading names in a section path.
const SEPARATOR: char = '.';

/// A nested section selector such as `reference.params`.
///
/// Names are stored lower-cased; headings are lower-cased before comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPath {
    names: Vec<String>,
}

impl SectionPath {
    /// Parse a dotted path.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            names: path.split(SEPARATOR).map(str::to_lowercase).collect(),
        }
    }

    /// Parse a whitespace-separated list of dotted paths.
    ///
    /// ```
    /// use dcode_sections::SectionPath;
    ///
    /// let paths = SectionPath::parse_list("usage  Reference.Params");
    /// assert_eq!(paths[1].names(), ["reference", "params"]);
    /// ```
    #[must_use]
    pub fn parse_list(value: &str) -> Vec<Self> {
        value.split_whitespace().map(Self::new).collect()
    }

    /// Heading names from the outermost section inwards.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of nesting levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the path has no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join("."))
    }
}
