//! `--winpath` argument handling

use crate::helpers::{TestProject, run_dil_release_raw};
use anyhow::Result;

#[test]
fn test_winpath_does_not_start_a_release() -> Result<()> {
  let project = TestProject::new()?;

  // Without a registry (no reg/wine) the command fails, but never builds
  let _ = run_dil_release_raw(&project.path, &["--winpath", "C:\\dil\\bin"])?;
  assert!(!project.file_exists("build"));
  Ok(())
}

#[test]
fn test_winpath_rejects_empty_entry() -> Result<()> {
  let project = TestProject::new()?;
  let output = run_dil_release_raw(&project.path, &["--winpath", ""])?;
  assert!(!output.status.success());
  assert!(!project.file_exists("build"));
  Ok(())
}
