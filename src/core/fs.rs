//! Filesystem helpers for assembling release trees
//!
//! Thin wrappers over `std::fs` that add error context, recursive copies,
//! pruned directory walks and a scratch-directory guard.

use crate::core::error::{ReleaseResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Create a directory and all parents, returning the path
pub fn mkdir(path: &Path) -> ReleaseResult<PathBuf> {
  fs::create_dir_all(path).with_context(|| format!("Failed to create directory {}", path.display()))?;
  Ok(path.to_path_buf())
}

/// Remove a file or directory tree; a missing path is not an error
pub fn remove(path: &Path) -> ReleaseResult<()> {
  let meta = match fs::symlink_metadata(path) {
    Ok(meta) => meta,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
    Err(e) => return Err(e).with_context(|| format!("Failed to stat {}", path.display())),
  };
  if meta.is_dir() {
    fs::remove_dir_all(path).with_context(|| format!("Failed to remove {}", path.display()))
  } else {
    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
  }
}

/// Copy a file or a directory tree to `dest`.
///
/// If `dest` is an existing directory and `src` is a file, the file is
/// copied into it under its own name.
pub fn copy(src: &Path, dest: &Path) -> ReleaseResult<PathBuf> {
  if src.is_dir() {
    copy_dir_all(src, dest)?;
    return Ok(dest.to_path_buf());
  }

  let target = if dest.is_dir() {
    match src.file_name() {
      Some(name) => dest.join(name),
      None => dest.to_path_buf(),
    }
  } else {
    dest.to_path_buf()
  };

  if let Some(parent) = target.parent() {
    mkdir(parent)?;
  }
  fs::copy(src, &target).with_context(|| format!("Failed to copy {} to {}", src.display(), target.display()))?;
  Ok(target)
}

/// Recursively copy the contents of `src` into `dest`.
///
/// Symlinks are resolved: the copy holds what they point to.
pub fn copy_dir_all(src: &Path, dest: &Path) -> ReleaseResult<()> {
  mkdir(dest)?;
  for entry in fs::read_dir(src).with_context(|| format!("Failed to read directory {}", src.display()))? {
    let entry = entry?;
    let from = entry.path();
    let to = dest.join(entry.file_name());
    if from.is_dir() {
      copy_dir_all(&from, &to)?;
    } else {
      fs::copy(&from, &to).with_context(|| format!("Failed to copy {}", from.display()))?;
    }
  }
  Ok(())
}

/// Expand a glob pattern relative to `dir`, sorted
///
/// Only `pattern` is interpreted; metacharacters in `dir` match literally.
pub fn glob_in(dir: &Path, pattern: &str) -> ReleaseResult<Vec<PathBuf>> {
  let full = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join(pattern);
  let mut matches = Vec::new();
  for entry in glob::glob(&full.to_string_lossy())? {
    matches.push(entry?);
  }
  matches.sort();
  Ok(matches)
}

/// Sorted depth-first walk below `root`, skipping directories `prune` rejects.
///
/// Symlinks are not followed and count as neither file nor directory, so
/// they are never hashed or chmod-ed.
fn walker<'a>(
  root: &Path,
  prune: &'a dyn Fn(&Path) -> bool,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
  WalkDir::new(root)
    .min_depth(1)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(move |e| !(e.file_type().is_dir() && prune(e.path())))
}

/// Recursively list regular files under `root` in sorted order.
///
/// Directories for which `prune` returns true are not descended into.
pub fn walk_files(root: &Path, prune: &dyn Fn(&Path) -> bool) -> ReleaseResult<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in walker(root, prune) {
    let entry = entry?;
    if entry.file_type().is_file() {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

/// Recursively list directories under `root` (excluding `root`) in sorted order
pub fn walk_dirs(root: &Path) -> ReleaseResult<Vec<PathBuf>> {
  let mut dirs = Vec::new();
  for entry in walker(root, &|_| false) {
    let entry = entry?;
    if entry.file_type().is_dir() {
      dirs.push(entry.into_path());
    }
  }
  Ok(dirs)
}

/// Scratch directory that is removed when dropped
///
/// The directory is wiped and recreated on acquisition.
#[derive(Debug)]
pub struct ScratchDir {
  path: PathBuf,
}

impl ScratchDir {
  pub fn create(path: impl Into<PathBuf>) -> ReleaseResult<Self> {
    let path = path.into();
    remove(&path)?;
    mkdir(&path)?;
    Ok(Self { path })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for ScratchDir {
  fn drop(&mut self) {
    if let Err(e) = remove(&self.path) {
      tracing::warn!(path = %self.path.display(), error = %e, "failed to remove scratch directory");
    }
  }
}
