//! Compressed archives of release trees
//!
//! Archiving is delegated to the usual command-line tools (`7z`, `zip`,
//! `tar`). The archived directory always appears as the single top-level
//! entry of the archive.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::fs;
use crate::core::runner::{CommandRunner, Invocation};
use crate::release::summary::Produced;
use crate::ui;
use std::path::{Path, PathBuf};

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
  SevenZip,
  TarGz,
  TarBz2,
  TarXz,
  Zip,
}

impl ArchiveFormat {
  /// File extension including the leading dot
  pub fn extension(self) -> &'static str {
    match self {
      ArchiveFormat::SevenZip => ".7z",
      ArchiveFormat::TarGz => ".tar.gz",
      ArchiveFormat::TarBz2 => ".tar.bz2",
      ArchiveFormat::TarXz => ".tar.xz",
      ArchiveFormat::Zip => ".zip",
    }
  }

  /// Command that packs `entry` (relative to its working directory) into `archive`
  pub fn invocation(self, archive: &Path, entry: &str) -> Invocation {
    match self {
      ArchiveFormat::SevenZip => Invocation::new("7z").args(["a", "-t7z", "-mx=9", "-bd"]).path_arg(archive).arg(entry),
      ArchiveFormat::Zip => Invocation::new("zip").args(["-q", "-r", "-9"]).path_arg(archive).arg(entry),
      ArchiveFormat::TarGz => Invocation::new("tar").arg("-czf").path_arg(archive).arg(entry),
      ArchiveFormat::TarBz2 => Invocation::new("tar").arg("-cjf").path_arg(archive).arg(entry),
      ArchiveFormat::TarXz => Invocation::new("tar").arg("-cJf").path_arg(archive).arg(entry),
    }
  }
}

/// Append an archive extension to a base path
pub fn with_extension(base: &Path, format: ArchiveFormat) -> PathBuf {
  let mut path = base.as_os_str().to_os_string();
  path.push(format.extension());
  PathBuf::from(path)
}

/// Pack directory `src` into `archive`.
///
/// An existing archive is replaced; a failing archiver is an error.
pub fn make_archive(
  src: &Path,
  archive: &Path,
  format: ArchiveFormat,
  runner: &dyn CommandRunner,
) -> ReleaseResult<()> {
  let entry = src
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .ok_or_else(|| ReleaseError::message(format!("Cannot archive {}: no directory name", src.display())))?;
  let cwd = src.parent().unwrap_or(Path::new("."));

  fs::remove(archive)?;
  let archive = std::path::absolute(archive)?;
  runner.run_checked(&format.invocation(&archive, &entry).current_dir(cwd))?;
  Ok(())
}

/// Which user-selectable archives to create
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSelection {
  pub seven_zip: bool,
  pub tar_gz: bool,
  pub tar_bz2: bool,
  pub zip: bool,
}

impl ArchiveSelection {
  pub fn formats(&self) -> Vec<ArchiveFormat> {
    let mut formats = Vec::new();
    if self.seven_zip {
      formats.push(ArchiveFormat::SevenZip);
    }
    if self.tar_gz {
      formats.push(ArchiveFormat::TarGz);
    }
    if self.tar_bz2 {
      formats.push(ArchiveFormat::TarBz2);
    }
    if self.zip {
      formats.push(ArchiveFormat::Zip);
    }
    formats
  }
}

/// Create every selected archive of `src` next to it, named `<name><ext>`.
///
/// Formats are independent: a failure is reported and the next format is
/// still attempted. Each attempt is timed into `produced`.
pub fn create_archives(
  selection: &ArchiveSelection,
  src: &Path,
  name: &str,
  runner: &dyn CommandRunner,
  produced: &mut Produced,
) {
  let dir = src.parent().unwrap_or(Path::new("."));
  for format in selection.formats() {
    let archive = with_extension(&dir.join(name), format);
    let timer = produced.start();
    match make_archive(src, &archive, format, runner) {
      Ok(()) => produced.record(archive, timer),
      Err(e) => ui::warn(&format!("failed to create {}: {}", archive.display(), e)),
    }
  }
}
