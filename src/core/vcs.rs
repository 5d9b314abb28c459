//! Git operations used by the release (checkout, modified files, identity)
//!
//! Everything goes through the system `git` binary via the injected
//! [`CommandRunner`], never through the process-wide working directory.

use crate::core::error::{ReleaseResult, ValidationError};
use crate::core::runner::{CommandRunner, Invocation};
use std::path::{Path, PathBuf};

/// Git backend for one working tree
pub struct Git<'a> {
  runner: &'a dyn CommandRunner,
  work_tree: PathBuf,
}

impl<'a> Git<'a> {
  /// Open a working tree, failing if `git` is not on the search path
  pub fn open(runner: &'a dyn CommandRunner, work_tree: &Path) -> ReleaseResult<Self> {
    if runner.locate("git").is_none() {
      return Err(
        ValidationError::MissingTool {
          tool: "git".to_string(),
          hint: Some("'git' is not in your PATH; specify --src instead".to_string()),
        }
        .into(),
      );
    }
    Ok(Self {
      runner,
      work_tree: work_tree.to_path_buf(),
    })
  }

  /// Whether a git executable is available at all
  pub fn available(runner: &dyn CommandRunner) -> bool {
    runner.locate("git").is_some()
  }

  fn git_cmd(&self) -> Invocation {
    Invocation::new("git").arg("-C").path_arg(&self.work_tree)
  }

  /// Write a tarball of HEAD to `tarfile`
  pub fn archive_head(&self, tarfile: &Path) -> ReleaseResult<()> {
    let inv = self.git_cmd().args(["archive", "--format=tar", "-o"]).path_arg(tarfile).arg("HEAD");
    self.runner.run_checked(&inv)?;
    Ok(())
  }

  /// Files modified in the working tree, relative to its root
  pub fn modified_files(&self) -> ReleaseResult<Vec<PathBuf>> {
    let output = self.runner.run_checked(&self.git_cmd().args(["ls-files", "-m"]))?;
    Ok(
      output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect(),
    )
  }

  /// Read a config value; unset keys yield `None`
  pub fn config_value(&self, key: &str) -> ReleaseResult<Option<String>> {
    let output = self.runner.run(&self.git_cmd().args(["config", key]))?;
    if !output.success() {
      return Ok(None);
    }
    let value = output.stdout.trim_end_matches(['\r', '\n']).to_string();
    Ok((!value.is_empty()).then_some(value))
  }
}
