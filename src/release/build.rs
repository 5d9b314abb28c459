//! Compiler invocations and the per-target build matrix
//!
//! A [`BuildConfig`] describes one compilation in toolchain-neutral terms.
//! Each [`BuildCommand`] implementation maps it to the flags of one compiler
//! family; [`build_binaries`] runs a debug and a release build per target.

use crate::core::error::{ReleaseResult, ValidationError};
use crate::core::fs;
use crate::core::runner::{CommandRunner, Invocation};
use crate::release::target::Target;
use crate::ui;
use std::path::{Path, PathBuf};

/// Toolchain-neutral description of one compiler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
  /// Output executable path, already in the target's path convention
  pub output: String,
  pub sources: Vec<PathBuf>,
  /// `-m32` / `-m64`
  pub bits: Option<u8>,
  pub optimize: bool,
  pub debug_info: bool,
  /// Emit debug info in the debugger-neutral (C) format
  pub symbolic_debug: bool,
  pub release: bool,
  pub inline: bool,
  pub link_args: Vec<String>,
  /// `-version=` identifiers
  pub versions: Vec<String>,
  /// Run the compiler under the Windows emulation helper
  pub cross: bool,
}

/// A compiler family that can turn a [`BuildConfig`] into arguments
pub trait BuildCommand {
  /// Executable name looked up when no explicit path is given
  fn default_exe(&self) -> &'static str;

  /// Compiler arguments for the configuration
  fn args(&self, config: &BuildConfig) -> Vec<String>;
}

/// The reference D compiler (dmd)
#[derive(Debug, Clone, Copy)]
pub struct DmdCommand;

impl BuildCommand for DmdCommand {
  fn default_exe(&self) -> &'static str {
    "dmd"
  }

  fn args(&self, config: &BuildConfig) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(bits) = config.bits {
      args.push(format!("-m{}", bits));
    }
    if config.debug_info {
      args.push(if config.symbolic_debug { "-gc" } else { "-g" }.to_string());
    }
    if config.optimize {
      args.push("-O".to_string());
    }
    if config.release {
      args.push("-release".to_string());
    }
    if config.inline {
      args.push("-inline".to_string());
    }
    args.extend(config.versions.iter().map(|v| format!("-version={}", v)));
    args.extend(config.link_args.iter().map(|l| format!("-L{}", l)));
    args.push(format!("-of{}", config.output));
    args.extend(config.sources.iter().map(|s| s.to_string_lossy().to_string()));
    args
  }
}

/// The LLVM-based D compiler (ldc2)
#[derive(Debug, Clone, Copy)]
pub struct LdcCommand;

impl BuildCommand for LdcCommand {
  fn default_exe(&self) -> &'static str {
    "ldc2"
  }

  fn args(&self, config: &BuildConfig) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(bits) = config.bits {
      args.push(format!("-m{}", bits));
    }
    if config.debug_info {
      args.push(if config.symbolic_debug { "-gc" } else { "-g" }.to_string());
    }
    if config.optimize {
      args.push("-O3".to_string());
    }
    if config.release {
      args.push("-release".to_string());
    }
    if config.inline {
      args.push("-enable-inlining".to_string());
    }
    args.extend(config.versions.iter().map(|v| format!("-d-version={}", v)));
    args.extend(config.link_args.iter().map(|l| format!("-L={}", l)));
    args.push(format!("-of={}", config.output));
    args.extend(config.sources.iter().map(|s| s.to_string_lossy().to_string()));
    args
  }
}

/// A resolved compiler: toolchain flavor plus executable
pub struct Compiler {
  pub exe: PathBuf,
  pub command: Box<dyn BuildCommand>,
}

impl Compiler {
  /// Pick the toolchain and verify its executable can be found
  pub fn resolve(use_ldc: bool, exe: Option<&Path>, runner: &dyn CommandRunner) -> ReleaseResult<Self> {
    let command: Box<dyn BuildCommand> = if use_ldc { Box::new(LdcCommand) } else { Box::new(DmdCommand) };
    let exe = exe.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(command.default_exe()));

    if !exe.exists() && runner.locate(&exe.to_string_lossy()).is_none() {
      return Err(
        ValidationError::MissingTool {
          tool: exe.display().to_string(),
          hint: Some("Pass --cmp-exe if dmd/ldc is not in your PATH".to_string()),
        }
        .into(),
      );
    }
    Ok(Self { exe, command })
  }

  /// The full invocation for a configuration
  pub fn invocation(&self, config: &BuildConfig) -> Invocation {
    let inv = Invocation::new(self.exe.to_string_lossy()).args(self.command.args(config));
    if config.cross { inv.wrapped_in("wine") } else { inv }
  }

  /// Print and run one compilation; a failing compiler aborts the release
  pub fn build(&self, config: &BuildConfig, runner: &dyn CommandRunner) -> ReleaseResult<()> {
    let inv = self.invocation(config);
    println!("{}", inv);
    runner.run_checked(&inv)?;
    Ok(())
  }
}

/// Parameters shared by every target build
pub struct BuildMatrix<'a> {
  pub targets: &'a [Target],
  pub compiler: &'a Compiler,
  pub sources: &'a [PathBuf],
  /// Release tree root; binaries land in `<dest>/<os>/bin<bits>/`
  pub dest: &'a Path,
  pub major: &'a str,
  pub extra_versions: &'a [String],
  pub host_is_windows: bool,
  pub inline_release: bool,
  pub debug_symbols: bool,
}

/// A binary that exists on disk after its build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBinary {
  pub path: PathBuf,
  pub target: Target,
}

/// Rewrite path separators for a target's convention
///
/// Only cross builds for Windows need this: the emulated compiler expects
/// backslash-separated paths.
pub fn fix_dirsep(path: &Path, target: &Target, host_is_windows: bool) -> String {
  let path = path.to_string_lossy();
  if !host_is_windows && target.is_windows() {
    path.replace('/', "\\")
  } else {
    path.to_string()
  }
}

/// Debug and release configurations for one target
pub fn target_configs(
  matrix: &BuildMatrix,
  target: &Target,
  dbg_out: String,
  rls_out: String,
) -> (BuildConfig, BuildConfig) {
  let mut versions = vec![format!("D{}", matrix.major)];
  versions.extend(matrix.extra_versions.iter().cloned());

  let base = BuildConfig {
    sources: matrix.sources.to_vec(),
    bits: Some(target.bits),
    versions,
    cross: target.is_windows() && !matrix.host_is_windows,
    ..BuildConfig::default()
  };

  let mut debug = BuildConfig {
    output: dbg_out,
    debug_info: true,
    symbolic_debug: matrix.debug_symbols,
    ..base.clone()
  };
  if target.is_linux() {
    debug.link_args = ["-ltango-dmd", "-lphobos2", "-ldl"].iter().map(|s| s.to_string()).collect();
  }

  let release = BuildConfig {
    output: rls_out,
    release: true,
    optimize: true,
    inline: matrix.inline_release,
    ..base
  };

  (debug, release)
}

/// Build debug and release binaries for every target.
///
/// Windows targets are skipped with a warning on non-Windows hosts without
/// `wine`. Binaries missing after their build are left out of the result.
pub fn build_binaries(matrix: &BuildMatrix, runner: &dyn CommandRunner) -> ReleaseResult<Vec<BuiltBinary>> {
  let mut targets: Vec<Target> = matrix.targets.to_vec();

  if !matrix.host_is_windows && targets.iter().any(Target::is_windows) && runner.locate("wine").is_none() {
    ui::warn("cannot build Windows binaries: 'wine' is not in PATH.");
    targets.retain(|t| !t.is_windows());
  }

  let mut bins = Vec::new();

  for target in &targets {
    ui::step(&format!("Building {} binary", target));

    let bin_dir = fs::mkdir(&matrix.dest.join(target.bin_dir()))?;
    let sfx = "";
    let dbg_exe = bin_dir.join(target.debug_exe(sfx));
    let rls_exe = bin_dir.join(target.release_exe(sfx));

    let (debug, release) = target_configs(
      matrix,
      target,
      fix_dirsep(&dbg_exe, target, matrix.host_is_windows),
      fix_dirsep(&rls_exe, target, matrix.host_is_windows),
    );

    matrix.compiler.build(&debug, runner)?;
    matrix.compiler.build(&release, runner)?;

    for exe in [dbg_exe, rls_exe] {
      if exe.exists() {
        bins.push(BuiltBinary { path: exe, target: *target });
      } else {
        tracing::debug!(path = %exe.display(), "binary missing after build");
      }
    }
  }

  Ok(bins)
}

/// Build the project's own compiler executable unless it already exists.
///
/// It is needed to generate the documentation.
pub fn build_project_exe(
  compiler: &Compiler,
  exe: &Path,
  sources: &[PathBuf],
  major: &str,
  runner: &dyn CommandRunner,
) -> ReleaseResult<()> {
  if exe.exists() {
    return Ok(());
  }
  ui::step("Building DIL for documentation");
  if let Some(parent) = exe.parent() {
    fs::mkdir(parent)?;
  }
  let config = BuildConfig {
    output: exe.to_string_lossy().to_string(),
    sources: sources.to_vec(),
    debug_info: true,
    versions: vec![format!("D{}", major)],
    ..BuildConfig::default()
  };
  compiler.build(&config, runner)
}
