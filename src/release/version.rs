//! Release version descriptor
//!
//! Grammar: `MAJOR.MINOR[-SUFFIX][+BINSUFFIX]` where MAJOR is one digit and
//! MINOR exactly three. The binary suffix is not part of the version proper;
//! it only tags binaries and package names.

use crate::core::error::{ReleaseResult, ValidationError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^((\d)\.(\d{3})(?:-(\w+))?)(?:\+(\w+))?$").expect("valid version regex"));

/// A parsed release version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
  full: String,
  major: String,
  minor: String,
  suffix: String,
  bin_suffix: String,
}

impl Version {
  /// Parse and validate a version string
  pub fn parse(input: &str) -> ReleaseResult<Self> {
    let caps = VERSION_RE
      .captures(input)
      .ok_or_else(|| ValidationError::InvalidVersionFormat {
        input: input.to_string(),
      })?;

    let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();

    Ok(Self {
      full: group(1),
      major: group(2),
      minor: group(3),
      suffix: group(4),
      bin_suffix: group(5),
    })
  }

  /// Version without the binary suffix, e.g. `1.123-beta`
  pub fn full(&self) -> &str {
    &self.full
  }

  pub fn major(&self) -> &str {
    &self.major
  }

  /// The three-digit minor as written, e.g. `012`
  pub fn minor(&self) -> &str {
    &self.minor
  }

  /// Minor as a number, leading zeros dropped
  pub fn minor_number(&self) -> u32 {
    self.minor.parse().unwrap_or_default()
  }

  pub fn suffix(&self) -> &str {
    &self.suffix
  }

  pub fn bin_suffix(&self) -> &str {
    &self.bin_suffix
  }

  /// Debian-compatible upstream version: every `-` becomes `.`
  pub fn debian_upstream(&self) -> String {
    self.full.replace('-', ".")
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.full)
  }
}
