//! Permanently append a directory to the user PATH in the Windows registry
//!
//! On non-Windows hosts the registry of the `wine` prefix is edited.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::runner::{CommandRunner, Invocation};

const ENV_KEY: &str = r"HKCU\Environment";

fn reg(host_is_windows: bool) -> Invocation {
  let inv = Invocation::new("reg");
  if host_is_windows { inv } else { inv.wrapped_in("wine") }
}

/// Extract the PATH value from `reg query` output
pub fn parse_reg_query(output: &str) -> Option<String> {
  output.lines().find_map(|line| {
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    if !name.eq_ignore_ascii_case("PATH") {
      return None;
    }
    let kind = parts.next()?;
    if !kind.starts_with("REG_") {
      return None;
    }
    // The value may itself contain spaces; take everything after the type
    let idx = line.find(kind)? + kind.len();
    Some(line[idx..].trim().to_string())
  })
}

/// Append `entry` to a `;`-separated PATH unless already present
pub fn append_entry(path: &str, entry: &str) -> Option<String> {
  let present = path
    .split(';')
    .any(|p| p.trim_end_matches('\\').eq_ignore_ascii_case(entry.trim_end_matches('\\')));
  if present {
    return None;
  }
  Some(if path.is_empty() {
    entry.to_string()
  } else {
    format!("{};{}", path.trim_end_matches(';'), entry)
  })
}

/// Append `entry` to the registry PATH. Returns false if it was already there.
pub fn append_to_path(entry: &str, host_is_windows: bool, runner: &dyn CommandRunner) -> ReleaseResult<bool> {
  if entry.is_empty() {
    return Err(ReleaseError::message("--winpath needs a non-empty path"));
  }

  let query = reg(host_is_windows).args(["query", ENV_KEY, "/v", "PATH"]);
  let output = runner.run(&query)?;
  let current = if output.success() {
    parse_reg_query(&output.stdout).unwrap_or_default()
  } else {
    String::new()
  };

  let Some(updated) = append_entry(&current, entry) else {
    println!("'{}' is already in PATH", entry);
    return Ok(false);
  };

  let add = reg(host_is_windows).args(["add", ENV_KEY, "/v", "PATH", "/t", "REG_EXPAND_SZ", "/d", &updated, "/f"]);
  runner.run_checked(&add)?;
  println!("Appended '{}' to PATH", entry);
  Ok(true)
}
