//! Named directory layouts - resolve once, pass everywhere
//!
//! # Design
//!
//! Paths are grouped into plain structs built once in the driver and passed
//! by reference to every step. Nothing relies on the process working
//! directory.
//!
//! ```text
//! <project>/                 ProjectLayout (the checkout running the release)
//!   src/ data/ doc/ kandil/ bin/dil
//! <builddir>/dil_<version>/  ReleaseLayout::build_root
//!   dil/                     ReleaseLayout::dest (a ProjectLayout)
//!   tmp/                     ReleaseLayout::tmp (removed at the end)
//! ```

use crate::core::error::ReleaseResult;
use crate::core::fs;
use crate::release::version::Version;
use std::path::{Path, PathBuf};

/// Layout of a DIL source tree
#[derive(Debug, Clone)]
pub struct ProjectLayout {
  pub root: PathBuf,
  pub src: PathBuf,
  pub data: PathBuf,
  pub doc: DocLayout,
  pub kandil: KandilLayout,
  /// The compiler built from this tree (used to generate documentation)
  pub exe: PathBuf,
}

impl ProjectLayout {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    let exe_name = if cfg!(windows) { "dil.exe" } else { "dil" };
    Self {
      src: root.join("src"),
      data: root.join("data"),
      doc: DocLayout::new(root.join("doc")),
      kandil: KandilLayout::new(root.join("kandil")),
      exe: root.join("bin").join(exe_name),
      root,
    }
  }

  /// Source file carrying the VERSION_* constants
  pub fn version_source(&self) -> PathBuf {
    self.src.join("dil").join("Version.d")
  }

  /// The configuration file template shipped with the compiler
  pub fn dilconf(&self) -> PathBuf {
    self.data.join("dilconf.d")
  }

  /// Every D source file under `src/`, sorted
  pub fn source_files(&self) -> ReleaseResult<Vec<PathBuf>> {
    if !self.src.is_dir() {
      return Ok(Vec::new());
    }
    let files = fs::walk_files(&self.src, &|_| false)?;
    Ok(files.into_iter().filter(|f| f.extension().is_some_and(|e| e == "d")).collect())
  }
}

/// Layout of the generated documentation tree
#[derive(Debug, Clone)]
pub struct DocLayout {
  pub root: PathBuf,
  pub htmlsrc: PathBuf,
  pub css: PathBuf,
  pub img: PathBuf,
  pub js: PathBuf,
}

impl DocLayout {
  pub fn new(root: PathBuf) -> Self {
    Self {
      htmlsrc: root.join("htmlsrc"),
      css: root.join("css"),
      img: root.join("img"),
      js: root.join("js"),
      root,
    }
  }

  /// Create every documentation directory
  pub fn create_dirs(&self) -> ReleaseResult<()> {
    for dir in [&self.htmlsrc, &self.css, &self.img, &self.js] {
      fs::mkdir(dir)?;
    }
    Ok(())
  }
}

/// Layout of the kandil documentation theme
#[derive(Debug, Clone)]
pub struct KandilLayout {
  pub root: PathBuf,
  pub style: PathBuf,
}

impl KandilLayout {
  pub fn new(root: PathBuf) -> Self {
    Self {
      style: root.join("css").join("style.css"),
      root,
    }
  }

  /// JavaScript files at the theme root and under `js/`
  pub fn js_files(&self) -> ReleaseResult<Vec<PathBuf>> {
    let mut files = fs::glob_in(&self.root, "*.js")?;
    files.extend(fs::glob_in(&self.root.join("js"), "*.js")?);
    Ok(files)
  }

  /// Image files under `img/`
  pub fn images(&self) -> ReleaseResult<Vec<PathBuf>> {
    let img = self.root.join("img");
    let mut files = Vec::new();
    for pattern in ["*.png", "*.gif", "*.jpg", "*.svg", "*.ico"] {
      files.extend(fs::glob_in(&img, pattern)?);
    }
    files.sort();
    Ok(files)
  }
}

/// Layout of one release build
#[derive(Debug, Clone)]
pub struct ReleaseLayout {
  /// `<builddir>/dil_<version>`
  pub build_root: PathBuf,
  /// The assembled release tree
  pub dest: ProjectLayout,
  /// Scratch space, removed at the end of the run
  pub tmp: PathBuf,
}

impl ReleaseLayout {
  pub fn new(builddir: &Path, version: &Version) -> Self {
    let build_root = builddir.join(format!("dil_{}", version));
    Self {
      dest: ProjectLayout::new(build_root.join("dil")),
      tmp: build_root.join("tmp"),
      build_root,
    }
  }

  /// Module list written by the documentation generator
  pub fn module_list(&self) -> PathBuf {
    self.tmp.join("modules.txt")
  }

  /// Base path (without extension) for a named distribution archive
  pub fn archive_base(&self, version: &Version, flavor: &str) -> PathBuf {
    self.build_root.join(format!("dil_{}_{}", version, flavor))
  }
}
