//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const VERSION_D: &str = r#"module dil.Version;

enum uint VERSION_MAJOR = 0;
enum uint VERSION_MINOR = 0;
enum string VERSION_SUFFIX = "";
"#;

pub const DILCONF_D: &str = r#"var DATADIR = "${BINDIR}/../../data";
var KANDILDIR = "${DATADIR}/../kandil";
"#;

/// Write a minimal DIL source tree under `root`
pub fn write_source_tree(root: &Path) -> Result<()> {
  std::fs::create_dir_all(root.join("src/dil"))?;
  std::fs::create_dir_all(root.join("data"))?;
  std::fs::create_dir_all(root.join("kandil/img"))?;
  std::fs::write(root.join("src/main.d"), "void main() {}\n")?;
  std::fs::write(root.join("src/dil/Version.d"), VERSION_D)?;
  std::fs::write(root.join("data/dilconf.d"), DILCONF_D)?;
  std::fs::write(root.join("data/html.css"), "body {}\n")?;
  std::fs::write(root.join("kandil/img/icon.png"), "png")?;
  std::fs::write(root.join("AUTHORS"), "Aziz Köksal\n")?;
  Ok(())
}

/// A DIL project with a dummy compiler, plus a separate tree for `--src`
pub struct TestProject {
  _root: TempDir,
  _src_root: TempDir,
  pub path: PathBuf,
  pub src: PathBuf,
}

impl TestProject {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    write_source_tree(&path)?;
    // Never executed: --cmp-exe only has to point at an existing file
    std::fs::write(path.join("fake-dmd"), "")?;

    let src_root = TempDir::new()?;
    let src = src_root.path().join("dil");
    write_source_tree(&src)?;

    Ok(Self {
      _root: root,
      _src_root: src_root,
      path,
      src,
    })
  }

  /// `--src` argument value
  pub fn src_arg(&self) -> String {
    self.src.display().to_string()
  }

  /// Turn the project into a git repository with one commit
  pub fn init_git(&self) -> Result<()> {
    git(&self.path, &["init", "--initial-branch=main"])?;
    git(&self.path, &["config", "user.name", "Test User"])?;
    git(&self.path, &["config", "user.email", "test@example.com"])?;
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", "Initial tree"])?;
    Ok(())
  }

  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let file = self.path.join(path);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file, content)?;
    Ok(())
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run dil-release and return its output whatever the exit status
pub fn run_dil_release_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_dil-release"))
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run dil-release")
}

/// Run dil-release, failing on a non-zero exit
pub fn run_dil_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_dil_release_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "dil-release failed: dil-release {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
