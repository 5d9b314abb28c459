use crate::core::error::{ConfigError, ReleaseResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional project-level defaults for dil-release
/// Searched in order: release.toml, .release.toml, scripts/release.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseConfig {
  #[serde(default)]
  pub build: BuildSettings,
  #[serde(default)]
  pub deb: DebSettings,
  #[serde(default)]
  pub paths: PathSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
  /// Target names from the build matrix (default: Lin32, Lin64, Win32)
  #[serde(default = "default_targets")]
  pub targets: Vec<String>,

  /// Inline release builds. Off by default: -inline bloats the Linux
  /// binaries and trips DMD bug 7967.
  #[serde(default)]
  pub inline_release: bool,

  /// Extra `-version=` identifiers passed to every build
  #[serde(default)]
  pub versions: Vec<String>,
}

fn default_targets() -> Vec<String> {
  vec!["Lin32".to_string(), "Lin64".to_string(), "Win32".to_string()]
}

impl Default for BuildSettings {
  fn default() -> Self {
    Self {
      targets: default_targets(),
      inline_release: false,
      versions: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebSettings {
  #[serde(default)]
  pub maintainer: Option<String>,

  #[serde(default = "default_revision")]
  pub revision: u32,
}

fn default_revision() -> u32 {
  1
}

impl Default for DebSettings {
  fn default() -> Self {
    Self {
      maintainer: None,
      revision: default_revision(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathSettings {
  #[serde(default = "default_builddir")]
  pub builddir: PathBuf,
}

fn default_builddir() -> PathBuf {
  PathBuf::from("build")
}

impl Default for PathSettings {
  fn default() -> Self {
    Self {
      builddir: default_builddir(),
    }
  }
}

impl ReleaseConfig {
  const CANDIDATES: [&'static str; 3] = ["release.toml", ".release.toml", "scripts/release.toml"];

  /// Find the config file in the project root, if any
  pub fn find_config_path(project_root: &Path) -> Option<PathBuf> {
    Self::CANDIDATES
      .iter()
      .map(|c| project_root.join(c))
      .find(|p| p.is_file())
  }

  /// Load the config, falling back to defaults when no file exists
  pub fn load(project_root: &Path) -> ReleaseResult<Self> {
    match Self::find_config_path(project_root) {
      Some(path) => {
        let content = fs::read_to_string(&path)?;
        let config = Self::parse(&content).map_err(|e| ConfigError::Parse {
          path: Some(path.clone()),
          reason: e,
        })?;
        tracing::info!(path = %path.display(), "loaded release config");
        Ok(config)
      }
      None => Ok(Self::default()),
    }
  }

  fn parse(content: &str) -> Result<Self, String> {
    toml_edit::de::from_str(content).map_err(|e| e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults_without_file() {
    let tmp = TempDir::new().unwrap();
    let config = ReleaseConfig::load(tmp.path()).unwrap();
    assert_eq!(config.build.targets, vec!["Lin32", "Lin64", "Win32"]);
    assert!(!config.build.inline_release);
    assert_eq!(config.deb.revision, 1);
    assert_eq!(config.paths.builddir, PathBuf::from("build"));
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
      tmp.path().join("release.toml"),
      r#"
[build]
targets = ["Lin64"]
inline_release = true

[deb]
maintainer = "Jane Doe <jane@example.org>"
"#,
    )
    .unwrap();

    let config = ReleaseConfig::load(tmp.path()).unwrap();
    assert_eq!(config.build.targets, vec!["Lin64"]);
    assert!(config.build.inline_release);
    assert_eq!(config.deb.maintainer.as_deref(), Some("Jane Doe <jane@example.org>"));
    assert_eq!(config.deb.revision, 1);
  }

  #[test]
  fn test_scripts_dir_candidate() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("scripts")).unwrap();
    fs::write(tmp.path().join("scripts/release.toml"), "[paths]\nbuilddir = \"out\"\n").unwrap();
    let config = ReleaseConfig::load(tmp.path()).unwrap();
    assert_eq!(config.paths.builddir, PathBuf::from("out"));
  }

  #[test]
  fn test_malformed_file_is_config_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("release.toml"), "[build\n").unwrap();
    let err = ReleaseConfig::load(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("release.toml"));
  }
}
