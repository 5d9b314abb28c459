//! Textual substitutions into source and configuration files

use crate::core::error::{ReleaseResult, ResultExt};
use crate::release::version::Version;
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static DATADIR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"DATADIR = ".+?""#).expect("valid DATADIR regex"));

/// Replace the values of the `VERSION_*` constants, keeping the statements.
pub fn stamp_version(code: &str, version: &Version) -> String {
  let values = [
    ("MAJOR", version.major().to_string()),
    ("MINOR", version.minor_number().to_string()),
    ("SUFFIX", format!("\"{}\"", version.suffix())),
  ];

  let mut code = code.to_string();
  for (name, value) in values {
    let re = Regex::new(&format!(r"(VERSION_{} =).+?;", name)).expect("valid VERSION_* regex");
    code = re.replace_all(&code, format!("${{1}} {};", value).as_str()).into_owned();
  }
  code
}

/// Rewrite the version info in the compiler's source file in place
pub fn update_version_source(path: &Path, version: &Version) -> ReleaseResult<()> {
  let code = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  fs::write(path, stamp_version(&code, version)).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}

/// Write `<dest>/VERSION` containing the version and a newline
pub fn write_version_file(version: &Version, dest: &Path) -> ReleaseResult<()> {
  let path = dest.join("VERSION");
  fs::write(&path, format!("{}\n", version)).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(())
}

/// Point the `DATADIR` constant of a dilconf text at `datadir`
pub fn rewrite_datadir(conf: &str, datadir: &str) -> String {
  DATADIR_RE
    .replace_all(conf, NoExpand(&format!("DATADIR = \"{}\"", datadir)))
    .into_owned()
}

/// Copy a dilconf file to `dest` with its `DATADIR` rewritten
pub fn write_modified_dilconf(src: &Path, dest: &Path, datadir: &str) -> ReleaseResult<()> {
  let conf = fs::read_to_string(src).with_context(|| format!("Failed to read {}", src.display()))?;
  fs::write(dest, rewrite_datadir(&conf, datadir)).with_context(|| format!("Failed to write {}", dest.display()))?;
  Ok(())
}
