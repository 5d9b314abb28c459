//! The release pipeline: checkout, stamp, build, package, archive
//!
//! Every step runs to completion before the next one starts. Validation
//! happens before anything is written so a rejected run leaves no trace.

use crate::core::error::{ReleaseResult, ValidationError};
use crate::core::fs::{self, ScratchDir};
use crate::core::layout::{ProjectLayout, ReleaseLayout};
use crate::core::runner::{CommandRunner, Invocation};
use crate::core::vcs::Git;
use crate::release::archive::{self, ArchiveFormat, ArchiveSelection};
use crate::release::build::{self, BuildMatrix, BuiltBinary, Compiler};
use crate::release::deb::{self, DebRequest};
use crate::release::docs;
use crate::release::stamp;
use crate::release::summary::Produced;
use crate::release::target::{Os, Target};
use crate::release::version::Version;
use crate::ui;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Everything a release run needs, merged from CLI flags and release.toml
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
  pub version: Version,
  pub debug_symbols: bool,
  pub docs: bool,
  pub no_binaries: bool,
  pub archives: ArchiveSelection,
  pub deb: bool,
  pub pdf: bool,
  pub chm: bool,
  pub copy_modified: bool,
  pub use_ldc: bool,
  pub src: Option<PathBuf>,
  pub compiler_exe: Option<PathBuf>,
  pub builddir: PathBuf,
  pub targets: Vec<Target>,
  pub inline_release: bool,
  pub extra_versions: Vec<String>,
  pub maintainer: Option<String>,
  pub deb_revision: u32,
  pub host_is_windows: bool,
}

const DOC_OPTIONS: [&str; 4] = ["-v", "-i", "-hl", "--kandil"];
const DEB_ARCHS: [&str; 2] = ["i386", "amd64"];

/// Per-platform distribution archives: (os, bits, formats)
const PLATFORM_ARCHIVES: [(Os, u8, &[ArchiveFormat]); 3] = [
  (Os::Linux, 32, &[ArchiveFormat::SevenZip, ArchiveFormat::TarXz]),
  (Os::Linux, 64, &[ArchiveFormat::SevenZip, ArchiveFormat::TarXz]),
  (Os::Windows, 32, &[ArchiveFormat::SevenZip, ArchiveFormat::Zip]),
];

const ALL_PLATFORM_FORMATS: [ArchiveFormat; 3] = [ArchiveFormat::SevenZip, ArchiveFormat::Zip, ArchiveFormat::TarXz];

/// Run a complete release of `project` and return what was produced
pub fn run_release(
  project: &ProjectLayout,
  opts: &ReleaseOptions,
  runner: &dyn CommandRunner,
) -> ReleaseResult<Produced> {
  let started = Instant::now();
  let mut produced = Produced::new();

  // Validate before touching the filesystem
  let compiler = Compiler::resolve(opts.use_ldc, opts.compiler_exe.as_deref(), runner)?;
  let git = match &opts.src {
    Some(src) => {
      if !src.exists() {
        return Err(ValidationError::SourceNotFound { path: src.clone() }.into());
      }
      None
    }
    None => {
      let git = Git::open(runner, &project.root)?;
      require_tool(runner, "tar")?;
      Some(git)
    }
  };

  let builddir = project.root.join(&opts.builddir);
  let layout = ReleaseLayout::new(&builddir, &opts.version);
  let dest = &layout.dest;
  let step_timer = produced.start();

  fs::remove(&layout.build_root)?;
  fs::mkdir(&layout.build_root)?;

  if let Some(git) = &git {
    checkout(git, project, dest, opts.copy_modified, runner)?;
  } else if let Some(src) = &opts.src {
    fs::copy(src, &dest.root)?;
  }

  dest.doc.create_dirs()?;
  let tmp = ScratchDir::create(&layout.tmp)?;

  ui::step("Copying files");
  docs::copy_doc_assets(dest)?;

  let files = dest.source_files()?;

  let version_source = dest.version_source();
  stamp::update_version_source(&version_source, &opts.version)?;
  stamp::write_version_file(&opts.version, &dest.root)?;

  if opts.docs {
    build::build_project_exe(&compiler, &project.exe, &project.source_files()?, opts.version.major(), runner)?;

    ui::step("Generating documentation");
    let mut doc_files = vec![dest.data.join("macros_dil.ddoc"), dest.dilconf()];
    doc_files.extend(files.iter().cloned());
    docs::generate_docs(
      &project.exe,
      &dest.doc.root,
      &layout.module_list(),
      &doc_files,
      &["DDoc"],
      &DOC_OPTIONS,
      runner,
    )?;
  }

  if opts.pdf {
    docs::write_pdf(&dest.doc.root, &opts.version, runner)?;
  }
  if opts.chm {
    docs::write_chm(&dest.doc.root, &opts.version, tmp.path(), opts.host_is_windows, runner)?;
  }

  let mut bins: Vec<BuiltBinary> = Vec::new();
  if !opts.no_binaries {
    let matrix = BuildMatrix {
      targets: &opts.targets,
      compiler: &compiler,
      sources: &files,
      dest: &dest.root,
      major: opts.version.major(),
      extra_versions: &opts.extra_versions,
      host_is_windows: opts.host_is_windows,
      inline_release: opts.inline_release,
      debug_symbols: opts.debug_symbols,
    };
    bins = build::build_binaries(&matrix, runner)?;
    let dilconf = project.dilconf();
    if dilconf.is_file() {
      for bin in &bins {
        if let Some(dir) = bin.path.parent() {
          fs::copy(&dilconf, dir)?;
        }
      }
    }
  }

  produced.record(std::path::absolute(&dest.root)?, step_timer);

  if !opts.docs {
    fs::remove(&dest.doc.root)?;
  }

  archive::create_archives(&opts.archives, &dest.root, "dil", runner, &mut produced);

  if opts.deb && !opts.no_binaries {
    build_deb_packages(project, &layout, opts, &bins, tmp.path(), runner, &mut produced)?;
  }

  if !opts.no_binaries {
    build_distribution_archives(&layout, &opts.version, tmp.path(), runner, &mut produced)?;
  }

  drop(tmp);

  print!("{}", produced.render(started.elapsed()));
  Ok(produced)
}

fn require_tool(runner: &dyn CommandRunner, tool: &str) -> ReleaseResult<()> {
  if runner.locate(tool).is_none() {
    return Err(
      ValidationError::MissingTool {
        tool: tool.to_string(),
        hint: Some(format!("program '{}' is not in your PATH", tool)),
      }
      .into(),
    );
  }
  Ok(())
}

/// Export a clean copy of HEAD into the destination
fn checkout(
  git: &Git,
  project: &ProjectLayout,
  dest: &ProjectLayout,
  copy_modified: bool,
  runner: &dyn CommandRunner,
) -> ReleaseResult<()> {
  ui::step("Checking out HEAD");
  fs::mkdir(&dest.root)?;
  let tarfile = std::path::absolute(dest.root.join("dil.tar"))?;
  git.archive_head(&tarfile)?;
  runner.run_checked(&Invocation::new("tar").arg("-xf").arg("dil.tar").current_dir(&dest.root))?;
  fs::remove(&tarfile)?;

  if copy_modified {
    for file in git.modified_files()? {
      let from = project.root.join(&file);
      if from.is_file() {
        fs::copy(&from, &dest.root.join(&file))?;
      }
    }
  }
  Ok(())
}

/// One `.deb` per architecture from the Linux binaries
fn build_deb_packages(
  project: &ProjectLayout,
  layout: &ReleaseLayout,
  opts: &ReleaseOptions,
  bins: &[BuiltBinary],
  scratch_parent: &Path,
  runner: &dyn CommandRunner,
  produced: &mut Produced,
) -> ReleaseResult<()> {
  let maintainer = deb::resolve_maintainer(opts.maintainer.as_deref(), runner, &project.root)?;

  for arch in DEB_ARCHS {
    let arch_bins: Vec<PathBuf> = bins
      .iter()
      .filter(|b| b.target.is_linux() && b.target.arch == arch)
      .map(|b| b.path.clone())
      .collect();
    if arch_bins.is_empty() {
      ui::warn(&format!("no Linux binaries for '{}'; skipping its deb package", arch));
      continue;
    }

    ui::step(&format!("Building {} deb package", arch));
    let timer = produced.start();
    let deb = deb::make_deb_package(
      &DebRequest {
        binaries: &arch_bins,
        source: &layout.dest,
        dest_dir: &layout.build_root,
        scratch_parent,
        version: &opts.version,
        arch,
        maintainer: &maintainer,
        revision: opts.deb_revision,
      },
      runner,
    )?;
    produced.record(std::path::absolute(deb)?, timer);
  }
  Ok(())
}

/// Per-platform archives plus one archive with every platform
fn build_distribution_archives(
  layout: &ReleaseLayout,
  version: &Version,
  tmp: &Path,
  runner: &dyn CommandRunner,
  produced: &mut Produced,
) -> ReleaseResult<()> {
  let dest = &layout.dest;

  ui::step("Creating archives");
  let noarch = ScratchDir::create(tmp.join("dil_noarch"))?;
  fs::copy_dir_all(&dest.root, noarch.path())?;
  for os in [Os::Linux, Os::Windows] {
    fs::remove(&noarch.path().join(os.dir()))?;
  }

  for (os, bits, formats) in PLATFORM_ARCHIVES {
    let bin = dest.root.join(format!("{}/bin{}", os.dir(), bits));
    if !bin.is_dir() {
      continue;
    }

    let tree = ScratchDir::create(tmp.join(format!("dil_{}", version)))?;
    fs::copy_dir_all(noarch.path(), tree.path())?;
    let tree_bin = tree.path().join("bin");
    fs::copy_dir_all(&bin, &tree_bin)?;
    let conf = tree.path().join("data").join("dilconf.d");
    if conf.is_file() {
      stamp::write_modified_dilconf(&conf, &tree_bin.join("dilconf.d"), "${BINDIR}/../data")?;
    }

    let base = std::path::absolute(layout.archive_base(version, &format!("{}{}", os.archive_tag(), bits)))?;
    for &format in formats {
      let archive = archive::with_extension(&base, format);
      let timer = produced.start();
      archive::make_archive(tree.path(), &archive, format, runner)?;
      produced.record(archive, timer);
    }
  }
  drop(noarch);

  let base = std::path::absolute(layout.archive_base(version, "all"))?;
  for format in ALL_PLATFORM_FORMATS {
    let archive = archive::with_extension(&base, format);
    let timer = produced.start();
    archive::make_archive(&dest.root, &archive, format, runner)?;
    produced.record(archive, timer);
  }
  Ok(())
}
