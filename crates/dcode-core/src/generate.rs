//! Output generation for one directive.

use dcode_cache::{ResultCache, ResultCacheExt};
use dcode_sections::{LineSink, SectionFilter};

use crate::{ExpandError, Invocation, Settings};

/// Script input for one directive: everything except the settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptInput {
    /// Positional arguments.
    pub args: Vec<String>,
    /// Keyword arguments.
    pub kwargs: dcode_cache::Kwargs,
    /// Directive body, fed on standard input.
    pub content: Option<String>,
}

/// How a directive's output was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The directive is ignored; nothing ran and nothing was written.
    Ignored,
    /// Output was served from the cache.
    Cached,
    /// The script ran.
    Invoked,
}

/// Produce a directive's output into `sink`.
///
/// Runs the configured script (or reuses a cached result when caching is
/// enabled), splits its output into lines and writes them to `sink`, through a
/// [`SectionFilter`] when `section_include` is configured.
///
/// # Errors
///
/// Returns [`ExpandError::Configuration`] before anything runs if no script is
/// configured, even for ignored directives. Script failures are propagated and
/// never cached.
pub fn generate<S: LineSink>(
    settings: &Settings,
    input: ScriptInput,
    cache: &dyn ResultCache,
    sink: &mut S,
) -> Result<Outcome, ExpandError> {
    let script = settings.require_script()?;
    let invocation = Invocation {
        script: script.to_owned(),
        args: input.args,
        kwargs: input.kwargs,
        content: input.content,
    };

    match &settings.section_include {
        Some(include) => {
            let mut filter =
                SectionFilter::new(&settings.section_chars, include.clone(), &mut *sink);
            let outcome = run(settings, &invocation, cache, &mut filter);
            filter.finish();
            outcome
        }
        None => run(settings, &invocation, cache, sink),
    }
}

fn run<S: LineSink>(
    settings: &Settings,
    invocation: &Invocation,
    cache: &dyn ResultCache,
    sink: &mut S,
) -> Result<Outcome, ExpandError> {
    if settings.ignore {
        tracing::debug!(script = %invocation.script, "Directive ignored");
        return Ok(Outcome::Ignored);
    }

    let record = settings.record.as_deref();
    let (output, outcome) = if settings.cache {
        let fingerprint = invocation.key().fingerprint();
        let mut invoked = false;
        let output = cache.get_or_compute(&fingerprint, || {
            invoked = true;
            invocation.execute(record)
        })?;
        let outcome = if invoked {
            Outcome::Invoked
        } else {
            Outcome::Cached
        };
        (output, outcome)
    } else {
        (invocation.execute(record)?, Outcome::Invoked)
    };

    for line in output.lines() {
        sink.write(line);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use dcode_cache::{MemoryCache, NullCache};
    use dcode_sections::SectionPath;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    /// Script echoing stdin that appends one line to `counter` per run.
    fn counting_script(counter: &Path) -> String {
        shell_words::join([
            "sh",
            "-c",
            "echo run >> \"$0\"; cat",
            counter.to_str().unwrap(),
        ])
    }

    fn runs(counter: &Path) -> usize {
        std::fs::read_to_string(counter).map_or(0, |s| s.lines().count())
    }

    fn settings(script: String) -> Settings {
        Settings {
            script: Some(script),
            ..Settings::default()
        }
    }

    fn input(content: &str) -> ScriptInput {
        ScriptInput {
            content: Some(content.to_owned()),
            ..ScriptInput::default()
        }
    }

    #[test]
    fn test_writes_output_lines() {
        let mut out: Vec<String> = Vec::new();
        let outcome = generate(
            &settings("cat".to_owned()),
            input("Title\n=====\n\nbody\n"),
            &NullCache,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome, Outcome::Invoked);
        assert_eq!(out, vec!["Title", "=====", "", "body"]);
    }

    #[test]
    fn test_cache_reuses_result() {
        let temp_dir = TempDir::new().unwrap();
        let counter = temp_dir.path().join("counter");
        let settings = Settings {
            cache: true,
            ..settings(counting_script(&counter))
        };
        let cache = MemoryCache::new();

        let mut first: Vec<String> = Vec::new();
        let mut second: Vec<String> = Vec::new();
        let outcome1 = generate(&settings, input("hello"), &cache, &mut first).unwrap();
        let outcome2 = generate(&settings, input("hello"), &cache, &mut second).unwrap();

        assert_eq!(runs(&counter), 1);
        assert_eq!(outcome1, Outcome::Invoked);
        assert_eq!(outcome2, Outcome::Cached);
        assert_eq!(first, second);
        assert_eq!(first, vec!["hello"]);
    }

    #[test]
    fn test_cache_distinguishes_content() {
        let temp_dir = TempDir::new().unwrap();
        let counter = temp_dir.path().join("counter");
        let settings = Settings {
            cache: true,
            ..settings(counting_script(&counter))
        };
        let cache = MemoryCache::new();

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input("one"), &cache, &mut out).unwrap();
        generate(&settings, input("two"), &cache, &mut out).unwrap();

        assert_eq!(runs(&counter), 2);
        assert_eq!(out, vec!["one", "two"]);
    }

    #[test]
    fn test_cache_disabled_runs_every_time() {
        let temp_dir = TempDir::new().unwrap();
        let counter = temp_dir.path().join("counter");
        let settings = settings(counting_script(&counter));
        let cache = MemoryCache::new();

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input("hello"), &cache, &mut out).unwrap();
        generate(&settings, input("hello"), &cache, &mut out).unwrap();

        assert_eq!(runs(&counter), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failure_is_not_cached() {
        let settings = Settings {
            cache: true,
            ..settings("sh -c 'exit 1'".to_owned())
        };
        let cache = MemoryCache::new();

        let mut out: Vec<String> = Vec::new();
        let result = generate(&settings, ScriptInput::default(), &cache, &mut out);

        assert!(matches!(result, Err(ExpandError::Execution(_))));
        assert!(cache.is_empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_ignore_runs_nothing_and_records_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let counter = temp_dir.path().join("counter");
        let record = temp_dir.path().join("commands.record");
        let settings = Settings {
            ignore: true,
            record: Some(record.clone()),
            ..settings(counting_script(&counter))
        };

        let mut out: Vec<String> = Vec::new();
        let outcome = generate(&settings, input("hello"), &NullCache, &mut out).unwrap();

        assert_eq!(outcome, Outcome::Ignored);
        assert!(out.is_empty());
        assert_eq!(runs(&counter), 0);
        assert!(!record.exists());
    }

    #[test]
    fn test_missing_script_fails_before_running() {
        let settings = Settings {
            key: Some("api".to_owned()),
            ignore: true,
            ..Settings::default()
        };

        let mut out: Vec<String> = Vec::new();
        let err = generate(&settings, ScriptInput::default(), &NullCache, &mut out).unwrap_err();

        assert!(matches!(
            err,
            ExpandError::Configuration { key: Some(ref key) } if key == "api"
        ));
    }

    #[test]
    fn test_records_command_line() {
        let temp_dir = TempDir::new().unwrap();
        let record = temp_dir.path().join("commands.record");
        let settings = Settings {
            record: Some(record.clone()),
            ..settings("echo".to_owned())
        };
        let input = ScriptInput {
            args: vec!["x y".to_owned()],
            ..ScriptInput::default()
        };

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input, &NullCache, &mut out).unwrap();

        assert_eq!(std::fs::read_to_string(&record).unwrap(), "echo 'x y'\n");
        assert_eq!(out, vec!["x y"]);
    }

    #[test]
    fn test_section_filter_applied() {
        let settings = Settings {
            section_include: Some(vec![SectionPath::new("details")]),
            ..settings("cat".to_owned())
        };
        let content = "Intro\n-----\ntext1\nDetails\n~~~~~~~\ntext2\nSub\n^^^\ntext3\n";

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input(content), &NullCache, &mut out).unwrap();

        assert_eq!(out, vec!["Details", "~~~~~~~", "text2", "Sub", "^^^", "text3"]);
    }

    #[test]
    fn test_empty_section_include_emits_nothing() {
        let settings = Settings {
            section_include: Some(Vec::new()),
            ..settings("cat".to_owned())
        };

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input("Details\n~~~~~~~\ntext\n"), &NullCache, &mut out).unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn test_section_chars_configurable() {
        let settings = Settings {
            section_chars: "=-".to_owned(),
            section_include: Some(vec![SectionPath::new("api.params")]),
            ..settings("cat".to_owned())
        };
        let content = "API\n===\nParams\n------\np text\nReturns\n-------\nr text\n";

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input(content), &NullCache, &mut out).unwrap();

        assert_eq!(out, vec!["Params", "------", "p text"]);
    }

    #[test]
    fn test_cache_hit_is_not_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let record = temp_dir.path().join("commands.record");
        let settings = Settings {
            cache: true,
            record: Some(record.clone()),
            ..settings("cat".to_owned())
        };
        let cache = MemoryCache::new();

        let mut out: Vec<String> = Vec::new();
        generate(&settings, input("a"), &cache, &mut out).unwrap();
        generate(&settings, input("a"), &cache, &mut out).unwrap();

        assert_eq!(std::fs::read_to_string(&record).unwrap(), "cat\n");
    }
}
