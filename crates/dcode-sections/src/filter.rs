//! Streaming section filter.

use crate::{LineSink, SectionPath};

/// Line-by-line state machine that forwards only the selected sections.
///
/// A non-indented, non-empty line is held back as a heading candidate until
/// the next line shows whether it is underlined. A confirmed heading either
/// moves the match one level deeper along an include path, opens the filtered
/// region when a whole path has matched, or closes the region when its
/// adornment belongs to an outer level. A closing heading is dropped and does
/// not start a new match.
///
/// Lines are forwarded only while the filtered region is open. Call
/// [`finish`](Self::finish) after the last line to flush a held-back heading.
#[derive(Debug)]
pub struct SectionFilter<S> {
    /// Adornment character expected at each depth.
    chars: Vec<char>,
    include: Vec<SectionPath>,
    sink: S,
    /// Whether lines are currently being forwarded.
    filtered: bool,
    /// Number of path components matched so far.
    depth: usize,
    /// Adornments that keep the filtered region open (subsections).
    active_chars: Vec<char>,
    /// Heading candidate waiting for its underline.
    pending: Option<String>,
}

impl<S: LineSink> SectionFilter<S> {
    /// Create a filter writing selected lines to `sink`.
    ///
    /// # Arguments
    ///
    /// * `chars` - Adornment character per nesting depth (e.g., `"~^"`)
    /// * `include` - Section paths to keep, tried in order
    /// * `sink` - Destination for forwarded lines
    pub fn new(chars: &str, include: Vec<SectionPath>, sink: S) -> Self {
        Self {
            chars: chars.chars().collect(),
            include,
            sink,
            filtered: false,
            depth: 0,
            active_chars: Vec::new(),
            pending: None,
        }
    }

    /// Process one line of input.
    pub fn feed(&mut self, line: &str) {
        if let Some(heading) = self.pending.take() {
            if is_adornment(&heading, line) {
                self.on_section(&heading, line);
                return;
            }
            // Not a heading after all; the current line may start the next one.
            self.emit(&heading);
        }

        if starts_heading(line) {
            self.pending = Some(line.to_owned());
        } else {
            self.emit(line);
        }
    }

    /// Flush a heading candidate left over at the end of input.
    pub fn finish(&mut self) {
        if let Some(heading) = self.pending.take() {
            self.emit(&heading);
        }
    }

    /// Whether lines are currently being forwarded.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Consume the filter and return the sink.
    ///
    /// Does not flush; call [`finish`](Self::finish) first.
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn emit(&mut self, line: &str) {
        if self.filtered {
            self.sink.write(line);
        }
    }

    fn on_section(&mut self, heading: &str, adornment: &str) {
        let Some(marker) = adornment.chars().next() else {
            return;
        };

        if self.filtered {
            if self.active_chars.contains(&marker) {
                self.emit(heading);
                self.emit(adornment);
                return;
            }
            tracing::debug!(heading, adornment, "Section filtering off");
            self.filtered = false;
            self.depth = 0;
            return;
        }

        if self.chars.get(self.depth) != Some(&marker) {
            // Out-of-sequence nesting: the match restarts from the top.
            self.depth = 0;
            return;
        }

        let name = heading.trim_end().to_lowercase();
        let depth = self.depth;
        let Some(matched_len) = self
            .include
            .iter()
            .find(|path| path.names().get(depth) == Some(&name))
            .map(SectionPath::len)
        else {
            return;
        };

        self.depth += 1;
        if matched_len == self.depth {
            tracing::debug!(heading, adornment, "Section filtering on");
            self.active_chars = self.chars.get(self.depth..).unwrap_or_default().to_vec();
            self.filtered = true;
            self.emit(heading);
            self.emit(adornment);
        }
    }
}

impl<S: LineSink> LineSink for SectionFilter<S> {
    fn write(&mut self, line: &str) {
        self.feed(line);
    }
}

/// Whether `line` can start a heading (non-empty, not indented).
fn starts_heading(line: &str) -> bool {
    line.chars().next().is_some_and(|c| !c.is_whitespace())
}

/// Whether `line` is a valid underline for `heading`.
///
/// The underline must be a run of one repeated non-alphanumeric character,
/// exactly as long as the heading (trailing whitespace ignored on both).
fn is_adornment(heading: &str, line: &str) -> bool {
    let heading = heading.trim_end();
    let line = line.trim_end();
    let Some(first) = line.chars().next() else {
        return false;
    };

    !first.is_alphanumeric()
        && line.chars().all(|c| c == first)
        && line.chars().count() == heading.chars().count()
}
