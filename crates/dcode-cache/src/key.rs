//! Invocation fingerprint computation.
//!
//! Provides [`InvocationKey`] for computing the content-based [`Fingerprint`]
//! used as a cache key.

use std::collections::BTreeMap;
use std::fmt;

use md5::{Digest, Md5};

/// Keyword options passed to a script: option name to its values in order.
///
/// A name with several values is passed as repeated `--name=value` flags.
pub type Kwargs = BTreeMap<String, Vec<String>>;

/// 128-bit digest identifying a unique script invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Invocation parameters for fingerprint computation.
///
/// Contains everything that determines the output of a script run.
#[derive(Debug, Clone, Copy)]
pub struct InvocationKey<'a> {
    /// Script command line (before shell-word splitting).
    pub script: &'a str,
    /// Positional arguments.
    pub args: &'a [String],
    /// Keyword options.
    pub kwargs: &'a Kwargs,
    /// Text fed to the script on stdin.
    pub content: Option<&'a str>,
}

impl InvocationKey<'_> {
    /// Compute the fingerprint for this invocation.
    ///
    /// # Hash Format
    ///
    /// MD-5 over, in order: the script; the positional arguments sorted
    /// lexicographically; each kwargs name followed by its values in sequence
    /// order, names sorted; every content line in its original order. Each
    /// field is terminated by a NUL byte.
    ///
    /// Every group starts with a tag byte and its element count (little-endian
    /// `u64`), and so does the value list of each kwarg. A string cannot move
    /// from one group to another without changing the digest.
    ///
    /// Argument order does not change the fingerprint, content line order does.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Md5::new();

        group(&mut hasher, TAG_SCRIPT, 1);
        field(&mut hasher, self.script);

        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        args.sort_unstable();
        group(&mut hasher, TAG_ARGS, args.len());
        for arg in args {
            field(&mut hasher, arg);
        }

        group(&mut hasher, TAG_KWARGS, self.kwargs.len());
        for (name, values) in self.kwargs {
            field(&mut hasher, name);
            group(&mut hasher, TAG_VALUES, values.len());
            for value in values {
                field(&mut hasher, value);
            }
        }

        let lines: Vec<&str> = self.content.unwrap_or_default().lines().collect();
        group(&mut hasher, TAG_CONTENT, lines.len());
        for line in lines {
            field(&mut hasher, line);
        }

        let mut digest = [0u8; 16];
        digest.copy_from_slice(&hasher.finalize());
        Fingerprint(digest)
    }
}

const TAG_SCRIPT: u8 = 1;
const TAG_ARGS: u8 = 2;
const TAG_KWARGS: u8 = 3;
const TAG_VALUES: u8 = 4;
const TAG_CONTENT: u8 = 5;

fn group(hasher: &mut Md5, tag: u8, len: usize) {
    hasher.update([tag]);
    hasher.update((len as u64).to_le_bytes());
}

fn field(hasher: &mut Md5, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([0u8]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<'a>(
        args: &'a [String],
        kwargs: &'a Kwargs,
        content: Option<&'a str>,
    ) -> InvocationKey<'a> {
        InvocationKey {
            script: "gen-docs --strict",
            args,
            kwargs,
            content,
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|&v| v.to_owned()).collect()
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let args = strings(&["api", "v2"]);
        let kwargs = Kwargs::new();

        assert_eq!(
            key(&args, &kwargs, Some("body")).fingerprint(),
            key(&args, &kwargs, Some("body")).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_ignores_argument_order() {
        let forward = strings(&["alpha", "beta", "gamma"]);
        let reversed = strings(&["gamma", "beta", "alpha"]);
        let kwargs = Kwargs::new();

        assert_eq!(
            key(&forward, &kwargs, None).fingerprint(),
            key(&reversed, &kwargs, None).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_respects_content_line_order() {
        let kwargs = Kwargs::new();

        assert_ne!(
            key(&[], &kwargs, Some("a\nb")).fingerprint(),
            key(&[], &kwargs, Some("b\na")).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_respects_kwarg_value_order() {
        let mut first = Kwargs::new();
        first.insert("tag".to_owned(), strings(&["x", "y"]));
        let mut second = Kwargs::new();
        second.insert("tag".to_owned(), strings(&["y", "x"]));

        assert_ne!(
            key(&[], &first, None).fingerprint(),
            key(&[], &second, None).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_script_matters() {
        let kwargs = Kwargs::new();
        let other = InvocationKey {
            script: "other-script",
            ..key(&[], &kwargs, None)
        };

        assert_ne!(key(&[], &kwargs, None).fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_fingerprint_fields_do_not_run_together() {
        let joined = strings(&["ab"]);
        let split = strings(&["a", "b"]);
        let kwargs = Kwargs::new();

        assert_ne!(
            key(&joined, &kwargs, None).fingerprint(),
            key(&split, &kwargs, None).fingerprint()
        );
    }

    #[test]
    fn test_argument_and_content_do_not_collide() {
        let args = strings(&["x"]);
        let kwargs = Kwargs::new();

        assert_ne!(
            key(&args, &kwargs, None).fingerprint(),
            key(&[], &kwargs, Some("x")).fingerprint()
        );
    }

    #[test]
    fn test_argument_and_kwarg_name_do_not_collide() {
        let args = strings(&["x"]);
        let mut kwargs = Kwargs::new();
        kwargs.insert("x".to_owned(), Vec::new());

        assert_ne!(
            key(&args, &Kwargs::new(), None).fingerprint(),
            key(&[], &kwargs, None).fingerprint()
        );
    }

    #[test]
    fn test_kwarg_values_do_not_shift_between_names() {
        let mut first = Kwargs::new();
        first.insert("a".to_owned(), strings(&["b"]));
        first.insert("c".to_owned(), Vec::new());
        let mut second = Kwargs::new();
        second.insert("a".to_owned(), Vec::new());
        second.insert("b".to_owned(), strings(&["c"]));

        assert_ne!(
            key(&[], &first, None).fingerprint(),
            key(&[], &second, None).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_raw_bytes_match_display() {
        let kwargs = Kwargs::new();
        let fingerprint = key(&[], &kwargs, None).fingerprint();

        assert_eq!(hex::encode(fingerprint.as_bytes()), fingerprint.to_string());
    }

    #[test]
    fn test_absent_and_empty_content_match() {
        let kwargs = Kwargs::new();

        assert_eq!(
            key(&[], &kwargs, None).fingerprint(),
            key(&[], &kwargs, Some("")).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_display_is_hex() {
        let kwargs = Kwargs::new();
        let hash = key(&[], &kwargs, None).fingerprint().to_string();

        assert_eq!(hash.len(), 32, "MD-5 digest should be 32 hex characters");
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
