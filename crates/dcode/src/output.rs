//! Colored terminal output utilities.

use std::path::Path;

use console::{Style, Term};
use dcode_core::ExpandStats;

/// Terminal output formatter.
///
/// Writes to stderr so that an expanded document on stdout stays clean.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Print the build summary (green), or a warning if nothing was expanded.
    pub(crate) fn summary(&self, input: &Path, stats: ExpandStats) {
        if stats.directives == 0 {
            self.line(
                &self.yellow,
                &format!("No dcode directives found in {}", input.display()),
            );
            return;
        }

        let mut summary = format!(
            "Expanded {} directives ({} cached)",
            stats.directives, stats.cached
        );
        if stats.ignored > 0 {
            summary.push_str(&format!(", {} ignored", stats.ignored));
        }
        self.line(&self.green, &summary);
    }

    /// Print where the document was written (dimmed).
    pub(crate) fn written(&self, path: &Path) {
        self.line(&self.dim, &format!("Wrote {}", path.display()));
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.red, msg);
    }

    fn line(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
