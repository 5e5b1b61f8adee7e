//! Centralized command execution with consistent error handling.
//!
//! Every external tool the packager drives (virtualenv, pip, python,
//! virtualenv-tools, fpm, shim scripts) goes through this module. Commands
//! either stream their stdout line-by-line to a sink as it is produced, or
//! capture it for parsing. A non-zero exit surfaces as
//! [`Error::CommandFailed`] carrying the program, its arguments, and the
//! exit code.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::Error;

/// Result of a captured command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Print a streamed line with trailing whitespace stripped.
///
/// The default sink for streamed commands; build tools emit their own
/// newlines, so unstripped lines would double-space the log.
pub fn print_line(line: &str) {
    println!("{}", line.trim_end());
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
        }
    }

    /// Create a command builder from a path to an executable.
    pub fn from_path(program: &Path) -> Self {
        Self::new(program.to_string_lossy())
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Add a path as an argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Add an environment variable for the child process only.
    ///
    /// The overlay is applied on top of the inherited environment; the
    /// parent process environment is never mutated.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.envs
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    fn failure(&self, status: ExitStatus) -> Error {
        Error::CommandFailed {
            program: self.program.clone(),
            args: self.args.clone(),
            code: status.code().unwrap_or(-1),
        }
    }

    /// Run the command and capture stdout. Fails on non-zero exit.
    pub fn run(self) -> Result<CommandResult> {
        let output = self
            .command()
            .output()
            .with_context(|| format!("failed to execute '{}'. Is it installed?", self.program))?;

        if !output.status.success() {
            return Err(self.failure(output.status).into());
        }

        Ok(CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    /// Run the command, forwarding each line of stdout to `sink` as it is
    /// produced. stderr is inherited and goes straight to the console.
    ///
    /// Lines reach the sink before the command finishes, so a failing
    /// tool's output is already visible when the error surfaces.
    pub fn stream(self, sink: &mut dyn FnMut(&str)) -> Result<()> {
        let mut cmd = self.command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to execute '{}'. Is it installed?", self.program))?;

        // stdout was piped just above, so the handle is always present.
        let stdout = child
            .stdout
            .take()
            .context("child process has no stdout handle")?;
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            sink(&line);
        }

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for '{}'", self.program))?;
        if !status.success() {
            return Err(self.failure(status).into());
        }
        Ok(())
    }

    /// Stream the command's output to stdout.
    pub fn stream_to_stdout(self) -> Result<()> {
        self.stream(&mut print_line)
    }
}
