//! Target matrix: the (OS, bit-width) combinations binaries are built for

use crate::core::error::{ConfigError, ReleaseResult};
use std::fmt;

/// Operating system family of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
  Linux,
  Windows,
}

impl Os {
  /// Directory name inside the release tree (`linux/`, `windows/`)
  pub fn dir(self) -> &'static str {
    match self {
      Os::Linux => "linux",
      Os::Windows => "windows",
    }
  }

  /// Short name used in archive file names
  pub fn archive_tag(self) -> &'static str {
    match self {
      Os::Linux => "linux",
      Os::Windows => "win",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Os::Linux => write!(f, "Linux"),
      Os::Windows => write!(f, "Windows"),
    }
  }
}

/// A build target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
  pub key: &'static str,
  pub os: Os,
  pub bits: u8,
  /// Debian architecture name
  pub arch: &'static str,
}

/// Every target the release knows how to build
pub const TARGETS: [Target; 4] = [
  Target {
    key: "Lin32",
    os: Os::Linux,
    bits: 32,
    arch: "i386",
  },
  Target {
    key: "Lin64",
    os: Os::Linux,
    bits: 64,
    arch: "amd64",
  },
  Target {
    key: "Win32",
    os: Os::Windows,
    bits: 32,
    arch: "i386",
  },
  Target {
    key: "Win64",
    os: Os::Windows,
    bits: 64,
    arch: "amd64",
  },
];

impl Target {
  /// Look up a target by key (`Lin32`, `Win64`, ...)
  pub fn by_key(key: &str) -> ReleaseResult<Target> {
    TARGETS
      .iter()
      .copied()
      .find(|t| t.key.eq_ignore_ascii_case(key))
      .ok_or_else(|| ConfigError::UnknownTarget { name: key.to_string() }.into())
  }

  /// Resolve a list of target keys, preserving order
  pub fn select<S: AsRef<str>>(keys: &[S]) -> ReleaseResult<Vec<Target>> {
    keys.iter().map(|k| Target::by_key(k.as_ref())).collect()
  }

  pub fn is_windows(&self) -> bool {
    self.os == Os::Windows
  }

  pub fn is_linux(&self) -> bool {
    self.os == Os::Linux
  }

  /// Relative directory holding this target's binaries, e.g. `linux/bin32`
  pub fn bin_dir(&self) -> String {
    format!("{}/bin{}", self.os.dir(), self.bits)
  }

  fn exe_ext(&self) -> &'static str {
    if self.is_windows() { ".exe" } else { "" }
  }

  /// File name of the debug executable
  pub fn debug_exe(&self, sfx: &str) -> String {
    format!("dil{}_d{}", sfx, self.exe_ext())
  }

  /// File name of the release executable
  pub fn release_exe(&self, sfx: &str) -> String {
    format!("dil{}{}", sfx, self.exe_ext())
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}bit", self.os, self.bits)
  }
}
