//! Document-level directive expansion.

use std::path::Path;

use dcode_core::{Expander, Request};

use crate::RstError;
use crate::parser::{DirectiveKind, parse_block, parse_marker};

/// Expands dcode directives in reStructuredText documents.
///
/// Wraps an [`Expander`] so that defaults registered by `dcode-default`
/// blocks and cached results carry over from one document to the next
/// within the same build.
///
/// # Example
///
/// ```
/// use dcode_core::Expander;
/// use dcode_rst::RstProcessor;
///
/// let mut processor = RstProcessor::new(Expander::new());
/// let source = "\
/// .. dcode-default::
///    :script: cat
///
/// .. dcode::
///
///    Generated
///    =========
/// ";
///
/// let output = processor.process(source).unwrap();
/// assert_eq!(output, "\nGenerated\n=========\n");
/// ```
pub struct RstProcessor {
    expander: Expander,
}

impl RstProcessor {
    /// Create a processor driving `expander`.
    #[must_use]
    pub fn new(expander: Expander) -> Self {
        Self { expander }
    }

    /// Underlying expander.
    #[must_use]
    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Read `path` and expand its directives.
    ///
    /// # Errors
    ///
    /// Returns [`RstError::Io`] if the file cannot be read, or
    /// [`RstError::Expand`] if a directive fails.
    pub fn process_file(&mut self, path: &Path) -> Result<String, RstError> {
        let source = std::fs::read_to_string(path).map_err(|source| RstError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Expanding document");
        self.process(&source)
    }

    /// Expand every directive in `source` and return the resulting document.
    ///
    /// Text outside directive blocks is copied unchanged. A `dcode` block is
    /// replaced by the script output, indented like the directive marker. A
    /// `dcode-default` block is removed. Blank lines after a block are kept.
    ///
    /// # Errors
    ///
    /// Returns [`RstError::Expand`] with the 1-based line number of the first
    /// failing directive. Processing stops there.
    pub fn process(&mut self, source: &str) -> Result<String, RstError> {
        let lines: Vec<&str> = source.lines().collect();
        let mut output: Vec<String> = Vec::with_capacity(lines.len());

        let mut i = 0;
        while i < lines.len() {
            let Some(marker) = parse_marker(lines[i]) else {
                output.push(lines[i].to_owned());
                i += 1;
                continue;
            };

            let line = i + 1;
            let block = parse_block(&lines[line..], marker.indent);
            let expand_error = |source| RstError::Expand { line, source };

            match marker.kind {
                DirectiveKind::Default => {
                    let key = marker.arguments.first().map(String::as_str);
                    self.expander
                        .apply_defaults(key, &block.options)
                        .map_err(expand_error)?;
                }
                DirectiveKind::Expand => {
                    let request = Request {
                        arguments: marker.arguments,
                        options: block.options,
                        content: block.content,
                    };
                    let generated = self.expander.expand(request).map_err(expand_error)?;
                    output.extend(generated.into_iter().map(|generated_line| {
                        if generated_line.is_empty() {
                            generated_line
                        } else {
                            format!("{}{generated_line}", marker.indent)
                        }
                    }));
                }
            }

            output.extend(std::iter::repeat_n(String::new(), block.trailing_blank));
            i = line + block.len + block.trailing_blank;
        }

        let mut result = output.join("\n");
        if source.ends_with('\n') && !output.is_empty() {
            result.push('\n');
        }
        Ok(result)
    }
}
