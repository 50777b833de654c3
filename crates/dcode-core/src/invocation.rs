//! Script invocation: command line construction and subprocess execution.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use dcode_cache::{InvocationKey, Kwargs};

use crate::{ExecutionFailure, ExpandError};

/// Everything needed to run a script once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Script command line, split into words with shell quoting rules.
    pub script: String,
    /// Positional arguments appended after the script words.
    pub args: Vec<String>,
    /// Keyword arguments, passed as `--name=value` in name order.
    pub kwargs: Kwargs,
    /// Text fed to the script on standard input.
    pub content: Option<String>,
}

impl Invocation {
    /// Cache key view of this invocation.
    #[must_use]
    pub fn key(&self) -> InvocationKey<'_> {
        InvocationKey {
            script: &self.script,
            args: &self.args,
            kwargs: &self.kwargs,
            content: self.content.as_deref(),
        }
    }

    /// Full argument vector: script words, positional args, then kwargs.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::InvalidScript`] if the script has unbalanced
    /// quotes or no words at all.
    pub fn command_line(&self) -> Result<Vec<String>, ExpandError> {
        let mut command =
            shell_words::split(&self.script).map_err(|e| ExpandError::InvalidScript {
                script: self.script.clone(),
                message: e.to_string(),
            })?;
        if command.is_empty() {
            return Err(ExpandError::InvalidScript {
                script: self.script.clone(),
                message: "no program given".to_owned(),
            });
        }

        command.extend(self.args.iter().cloned());
        for (name, values) in &self.kwargs {
            command.extend(values.iter().map(|value| format!("--{name}={value}")));
        }
        Ok(command)
    }

    /// Run the script and return its standard output.
    ///
    /// The quoted command line is appended to `record` before the script is
    /// started. Content is written to standard input from a separate thread so
    /// a script producing lots of output before reading its input cannot
    /// deadlock. A script that exits without reading its input is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::Execution`] if the script exits unsuccessfully,
    /// [`ExpandError::Spawn`] if it cannot be started, and
    /// [`ExpandError::Record`] if the record file cannot be written.
    pub fn execute(&self, record: Option<&Path>) -> Result<String, ExpandError> {
        let command = self.command_line()?;
        let quoted = shell_words::join(&command);
        tracing::debug!(command = %quoted, "Running script");

        if let Some(path) = record {
            append_record(path, &quoted)?;
        }

        let (program, args) = command
            .split_first()
            .ok_or_else(|| ExpandError::InvalidScript {
                script: self.script.clone(),
                message: "no program given".to_owned(),
            })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExpandError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let input = self.content.as_deref().unwrap_or_default();
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(input.as_bytes())?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            (output, writer.join())
        });
        let output = output?;

        if !output.status.success() {
            let failure = ExecutionFailure {
                command: quoted,
                exit_code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            };
            tracing::error!(
                command = %failure.command,
                exit_code = ?failure.exit_code,
                stdout = %failure.stdout_lossy(),
                stderr = %failure.stderr_lossy(),
                "Script failed"
            );
            return Err(Box::new(failure).into());
        }

        if let Ok(Err(e)) = written
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            return Err(e.into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Append one command line to the record file, creating it if needed.
fn append_record(path: &Path, command: &str) -> Result<(), ExpandError> {
    let record_error = |source| ExpandError::Record {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(record_error)?;
    writeln!(file, "{command}").map_err(record_error)
}
