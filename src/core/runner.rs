//! External program execution
//!
//! Every subprocess the release goes through (git, tar, compilers, archivers,
//! dpkg-deb, ...) is described as an [`Invocation`] and handed to a
//! [`CommandRunner`]. Production code uses [`SystemRunner`]; tests swap in a
//! recording fake.

use crate::core::error::{ReleaseResult, ToolError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A single external program call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Append a path argument
  pub fn path_arg(self, path: &Path) -> Self {
    self.arg(path.to_string_lossy())
  }

  pub fn current_dir(mut self, dir: &Path) -> Self {
    self.cwd = Some(dir.to_path_buf());
    self
  }

  /// Run this invocation through a wrapper program (e.g. `wine`, `fakeroot`)
  pub fn wrapped_in(self, wrapper: impl Into<String>) -> Self {
    let mut args = Vec::with_capacity(self.args.len() + 1);
    args.push(self.program);
    args.extend(self.args);
    Self {
      program: wrapper.into(),
      args,
      cwd: self.cwd,
    }
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      if arg.contains(' ') {
        write!(f, " \"{}\"", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Captured result of a finished program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
  /// Exit code, `None` when terminated by a signal
  pub status: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.status == Some(0)
  }

  /// Build a successful output with the given stdout (handy for fakes)
  pub fn ok(stdout: impl Into<String>) -> Self {
    Self {
      status: Some(0),
      stdout: stdout.into(),
      stderr: String::new(),
    }
  }

  /// Build a failed output with the given exit code and stderr
  pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
    Self {
      status: Some(status),
      stdout: String::new(),
      stderr: stderr.into(),
    }
  }
}

/// Capability to run external programs and look them up on the search path
pub trait CommandRunner {
  /// Run a program to completion and capture its output.
  ///
  /// Only a failure to start the program is an `Err`; a non-zero exit status
  /// is reported through [`ProcessOutput::status`].
  fn run(&self, invocation: &Invocation) -> ReleaseResult<ProcessOutput>;

  /// Locate a program on the search path
  fn locate(&self, program: &str) -> Option<PathBuf>;

  /// Run a program and turn a non-zero exit into a [`ToolError`]
  fn run_checked(&self, invocation: &Invocation) -> ReleaseResult<ProcessOutput> {
    let output = self.run(invocation)?;
    if !output.success() {
      return Err(
        ToolError::CommandFailed {
          command: invocation.to_string(),
          status: output.status,
          stderr: output.stderr,
        }
        .into(),
      );
    }
    Ok(output)
  }
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, invocation: &Invocation) -> ReleaseResult<ProcessOutput> {
    tracing::debug!(command = %invocation, cwd = ?invocation.cwd, "running");

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args);
    if let Some(dir) = &invocation.cwd {
      cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|e| ToolError::SpawnFailed {
      program: invocation.program.clone(),
      reason: e.to_string(),
    })?;

    Ok(ProcessOutput {
      status: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
  }

  fn locate(&self, program: &str) -> Option<PathBuf> {
    which::which(program).ok()
  }
}
