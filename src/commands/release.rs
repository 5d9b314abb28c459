//! Release command: merge CLI flags with release.toml and run the pipeline

use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::layout::ProjectLayout;
use crate::core::runner::CommandRunner;
use crate::release::archive::ArchiveSelection;
use crate::release::summary::Produced;
use crate::release::target::Target;
use crate::release::{ReleaseOptions, Version, pipeline};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments of a release run
#[derive(Args, Debug, Clone, Default)]
pub struct ReleaseArgs {
  /// Release version, e.g. 1.123 or 1.123-rc1+win32
  #[arg(id = "release_version", value_name = "VERSION", required_unless_present = "winpath")]
  pub version: Option<String>,

  /// Generate symbols for debug builds (-gc)
  #[arg(short = 's', long)]
  pub dsymbols: bool,

  /// Generate and include the documentation
  #[arg(short, long)]
  pub docs: bool,

  /// Don't compile any binaries
  #[arg(short = 'n', long)]
  pub no_bin: bool,

  /// Create a 7z archive of the release tree
  #[arg(long = "7z")]
  pub seven_zip: bool,

  /// Create a tar.gz archive of the release tree
  #[arg(long)]
  pub gz: bool,

  /// Create a tar.bz2 archive of the release tree
  #[arg(long)]
  pub bz2: bool,

  /// Create a zip archive of the release tree
  #[arg(long)]
  pub zip: bool,

  /// Create Debian packages
  #[arg(long)]
  pub deb: bool,

  /// Generate a PDF of the documentation
  #[arg(long)]
  pub pdf: bool,

  /// Generate a CHM of the documentation
  #[arg(long, hide = true)]
  pub chm: bool,

  /// Copy modified files from the working tree into the checkout
  #[arg(short = 'm')]
  pub copy_modified: bool,

  /// Build with ldc instead of dmd
  #[arg(long)]
  pub ldc: bool,

  /// Use this source tree instead of checking out HEAD
  #[arg(long, value_name = "SRC")]
  pub src: Option<PathBuf>,

  /// Path to the compiler executable
  #[arg(long, value_name = "EXE_PATH")]
  pub cmp_exe: Option<PathBuf>,

  /// Where the release is assembled (default: build)
  #[arg(long, value_name = "DIR")]
  pub builddir: Option<PathBuf>,

  /// Append a directory to the Windows user PATH and exit
  #[arg(long, value_name = "PATH")]
  pub winpath: Option<String>,

  /// Maintainer of the Debian packages
  #[arg(long, hide = true, value_name = "MAINTAINER")]
  pub debm: Option<String>,

  /// Debian package revision
  #[arg(long, hide = true, value_name = "NUM")]
  pub debnum: Option<u32>,
}

impl ReleaseArgs {
  fn archives(&self) -> ArchiveSelection {
    ArchiveSelection {
      seven_zip: self.seven_zip,
      tar_gz: self.gz,
      tar_bz2: self.bz2,
      zip: self.zip,
    }
  }

  /// Merge the arguments over the file config. Flags win over the file.
  pub fn into_options(self, config: &ReleaseConfig) -> ReleaseResult<ReleaseOptions> {
    let raw = self
      .version
      .as_deref()
      .ok_or_else(|| ReleaseError::with_help("VERSION is required", "e.g. dil-release 1.123"))?;
    let version = Version::parse(raw)?;
    let targets = Target::select(&config.build.targets)?;

    Ok(ReleaseOptions {
      version,
      debug_symbols: self.dsymbols,
      docs: self.docs,
      no_binaries: self.no_bin,
      archives: self.archives(),
      deb: self.deb,
      pdf: self.pdf,
      chm: self.chm,
      copy_modified: self.copy_modified,
      use_ldc: self.ldc,
      src: self.src,
      compiler_exe: self.cmp_exe,
      builddir: self.builddir.unwrap_or_else(|| config.paths.builddir.clone()),
      targets,
      inline_release: config.build.inline_release,
      extra_versions: config.build.versions.clone(),
      maintainer: self.debm.or_else(|| config.deb.maintainer.clone()),
      deb_revision: self.debnum.unwrap_or(config.deb.revision),
      host_is_windows: cfg!(windows),
    })
  }
}

/// Load the project config, merge `args` over it and run a release
pub fn run_release(args: ReleaseArgs, project_root: &Path, runner: &dyn CommandRunner) -> ReleaseResult<Produced> {
  let config = ReleaseConfig::load(project_root)?;
  let options = args.into_options(&config)?;
  tracing::debug!(version = %options.version, targets = options.targets.len(), "starting release");

  let project = ProjectLayout::new(project_root);
  pipeline::run_release(&project, &options, runner)
}
