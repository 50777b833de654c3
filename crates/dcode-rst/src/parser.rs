//! Directive block parsing.
//!
//! Recognizes `.. dcode::` and `.. dcode-default::` blocks:
//!
//! ```text
//! .. dcode:: api users
//!    :section-include: usage
//!    :format: rst
//!
//!    body fed to the script
//! ```

use std::sync::LazyLock;

use dcode_core::Options;
use regex::Regex;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)\.\.\s+(dcode|dcode-default)::(.*)$").unwrap());

static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:([A-Za-z0-9_][A-Za-z0-9_.-]*):(?:\s+(.*))?$").unwrap());

/// Which directive a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectiveKind {
    /// `dcode`: expanded into script output.
    Expand,
    /// `dcode-default`: registers defaults, produces nothing.
    Default,
}

/// Directive marker line: `.. dcode:: args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Marker<'a> {
    pub kind: DirectiveKind,
    /// Leading whitespace of the marker line.
    pub indent: &'a str,
    pub arguments: Vec<String>,
}

/// Parsed directive block following a marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Block {
    pub options: Options,
    pub content: Option<String>,
    /// Body lines consumed, excluding trailing blank lines.
    pub len: usize,
    /// Trailing blank lines belonging to the block.
    pub trailing_blank: usize,
}

/// Parse a directive marker line.
pub(crate) fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let caps = MARKER_RE.captures(line)?;
    let kind = match &caps[2] {
        "dcode" => DirectiveKind::Expand,
        _ => DirectiveKind::Default,
    };
    let indent = caps.get(1).map_or("", |m| m.as_str());
    let arguments = caps[3].split_whitespace().map(str::to_owned).collect();

    Some(Marker {
        kind,
        indent,
        arguments,
    })
}

/// Parse the body of a directive whose marker has `indent` leading whitespace.
///
/// `lines` starts right after the marker line. The body extends over every
/// blank line and every line indented deeper than the marker.
pub(crate) fn parse_block(lines: &[&str], indent: &str) -> Block {
    let marker_width = width(indent);
    let body_len = lines
        .iter()
        .position(|line| !is_blank(line) && width(line) <= marker_width)
        .unwrap_or(lines.len());
    let body = &lines[..body_len];

    let len = body
        .iter()
        .rposition(|line| !is_blank(line))
        .map_or(0, |last| last + 1);
    let body = &body[..len];

    let mut options = Options::new();
    let mut rest = body;
    while let Some((line, tail)) = rest.split_first() {
        let Some(caps) = OPTION_RE.captures(line) else {
            break;
        };
        let value = caps.get(2).map_or("", |m| m.as_str().trim());
        options.insert(caps[1].to_owned(), value.to_owned());
        rest = tail;
    }

    let start = rest
        .iter()
        .position(|line| !is_blank(line))
        .unwrap_or(rest.len());
    let content = dedent(&rest[start..]);

    Block {
        options,
        content,
        len,
        trailing_blank: body_len - len,
    }
}

/// Strip the common indentation of `lines` and join them with newlines.
fn dedent(lines: &[&str]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }

    let common = lines
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| leading_len(line))
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = lines
        .iter()
        .map(|line| line.get(common..).unwrap_or("").trim_end())
        .collect();
    Some(dedented.join("\n"))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Byte length of the leading spaces and tabs.
fn leading_len(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Indentation width with tabs expanded to multiples of 8.
fn width(line: &str) -> usize {
    let mut col = 0;
    for c in line.chars() {
        match c {
            ' ' => col += 1,
            '\t' => col = (col / 8 + 1) * 8,
            _ => break,
        }
    }
    col
}
