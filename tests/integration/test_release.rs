//! Integration tests for release runs that need no compiler

use crate::helpers::{TestProject, run_dil_release, run_dil_release_raw};
use anyhow::Result;

#[test]
fn test_no_bin_release_from_src() -> Result<()> {
  let project = TestProject::new()?;
  let src = project.src_arg();

  let output = run_dil_release(
    &project.path,
    &["1.123-rc1", "--no-bin", "--src", &src, "--cmp-exe", "fake-dmd", "--builddir", "out"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(project.read_file("out/dil_1.123-rc1/dil/VERSION")?, "1.123-rc1\n");
  let version_d = project.read_file("out/dil_1.123-rc1/dil/src/dil/Version.d")?;
  assert!(version_d.contains("enum uint VERSION_MAJOR = 1;"));
  assert!(version_d.contains("enum uint VERSION_MINOR = 123;"));
  assert!(version_d.contains("enum string VERSION_SUFFIX = \"rc1\";"));

  // The source tree's own Version.d is untouched
  let pristine = std::fs::read_to_string(project.src.join("src/dil/Version.d"))?;
  assert!(pristine.contains("VERSION_MAJOR = 0;"));

  assert!(project.file_exists("out/dil_1.123-rc1/dil/src/main.d"));
  assert!(!project.file_exists("out/dil_1.123-rc1/dil/doc"));
  assert!(!project.file_exists("out/dil_1.123-rc1/tmp"));
  assert!(!project.file_exists("out/dil_1.123-rc1/dil_1.123-rc1_all.zip"));

  assert!(stdout.contains("Produced files/folders:"));
  assert!(stdout.contains("Finished in"));
  Ok(())
}

#[test]
fn test_release_rerun_replaces_build_root() -> Result<()> {
  let project = TestProject::new()?;
  let src = project.src_arg();
  let args = ["1.200", "--no-bin", "--src", src.as_str(), "--cmp-exe", "fake-dmd", "--builddir", "out"];

  run_dil_release(&project.path, &args)?;
  project.write_file("out/dil_1.200/stale.txt", "old")?;
  run_dil_release(&project.path, &args)?;

  assert!(!project.file_exists("out/dil_1.200/stale.txt"));
  assert_eq!(project.read_file("out/dil_1.200/dil/VERSION")?, "1.200\n");
  Ok(())
}

#[test]
fn test_builddir_from_config_file() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("release.toml", "[paths]\nbuilddir = \"dist\"\n")?;
  let src = project.src_arg();

  run_dil_release(&project.path, &["1.123", "--no-bin", "--src", &src, "--cmp-exe", "fake-dmd"])?;

  assert!(project.file_exists("dist/dil_1.123/dil/VERSION"));
  assert!(!project.file_exists("build"));
  Ok(())
}

#[test]
fn test_invalid_version_is_rejected() -> Result<()> {
  let project = TestProject::new()?;

  for bad in ["1.12", "v1.000", "1.0001"] {
    let output = run_dil_release_raw(&project.path, &[bad, "--no-bin", "--cmp-exe", "fake-dmd"])?;
    assert_eq!(output.status.code(), Some(1), "{} should be rejected", bad);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(bad));
  }
  assert!(!project.file_exists("build"));
  Ok(())
}

#[test]
fn test_missing_src_is_rejected() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_dil_release_raw(
    &project.path,
    &["1.123", "--no-bin", "--src", "does/not/exist", "--cmp-exe", "fake-dmd"],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("doesn't exist"));
  assert!(!project.file_exists("build"));
  Ok(())
}

#[test]
fn test_missing_compiler_is_rejected() -> Result<()> {
  let project = TestProject::new()?;
  let src = project.src_arg();

  let output = run_dil_release_raw(
    &project.path,
    &["1.123", "--no-bin", "--src", &src, "--cmp-exe", "no-such-dmd"],
  )?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("no-such-dmd"));
  assert!(!project.file_exists("build"));
  Ok(())
}

#[test]
fn test_version_is_required() -> Result<()> {
  let project = TestProject::new()?;
  let output = run_dil_release_raw(&project.path, &["--no-bin"])?;
  assert!(!output.status.success());
  Ok(())
}

#[test]
fn test_checkout_with_modified_files() -> Result<()> {
  let project = TestProject::new()?;
  project.init_git()?;
  project.write_file("src/main.d", "void main() { /* edited */ }\n")?;

  run_dil_release(&project.path, &["1.123", "--no-bin", "-m", "--cmp-exe", "fake-dmd"])?;

  assert!(project.file_exists("build/dil_1.123/dil/AUTHORS"));
  assert!(!project.file_exists("build/dil_1.123/dil/dil.tar"));
  assert!(project.read_file("build/dil_1.123/dil/src/main.d")?.contains("edited"));
  assert_eq!(project.read_file("build/dil_1.123/dil/VERSION")?, "1.123\n");
  Ok(())
}

#[test]
fn test_checkout_ignores_uncommitted_edits_without_m() -> Result<()> {
  let project = TestProject::new()?;
  project.init_git()?;
  project.write_file("src/main.d", "void main() { /* edited */ }\n")?;

  run_dil_release(&project.path, &["1.123", "--no-bin", "--cmp-exe", "fake-dmd"])?;

  assert!(!project.read_file("build/dil_1.123/dil/src/main.d")?.contains("edited"));
  Ok(())
}
