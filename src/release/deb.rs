//! Debian package builder
//!
//! Lays out a filesystem-hierarchy tree in a scratch directory, computes the
//! installed size and md5sums manifest, renders the control file and hands the
//! tree to `dpkg-deb` under `fakeroot`.

use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::fs::{self, ScratchDir};
use crate::core::layout::ProjectLayout;
use crate::core::runner::{CommandRunner, Invocation};
use crate::core::vcs::Git;
use crate::release::stamp;
use crate::release::version::Version;
use crate::ui;
use crate::ui::progress::FileProgress;
use md5::{Digest, Md5};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Fallback when no maintainer can be determined
pub const UNKNOWN_MAINTAINER: &str = "Unknown <un@kn.own>";

const CONFFILES: &str = "/etc/dilconf.d\n";
const NOOP_SCRIPT: &str = "#!/bin/sh\nexit 0\n";
const COPYRIGHT: &str = "License: GPL3\nAuthors: See AUTHORS file.\n";

static MAINTAINER_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^.+? <[^>@]+@[^>]+>$").expect("valid maintainer regex"));

/// Whether a maintainer string looks like `Name <user@host>`
pub fn maintainer_looks_valid(maintainer: &str) -> bool {
  MAINTAINER_RE.is_match(maintainer)
}

/// Determine the package maintainer.
///
/// An explicit value wins; otherwise the git identity of the project is used
/// when git is available, else a placeholder. A malformed result only warns.
pub fn resolve_maintainer(
  given: Option<&str>,
  runner: &dyn CommandRunner,
  project_root: &Path,
) -> ReleaseResult<String> {
  let maintainer = match given {
    Some(m) => m.to_string(),
    None if Git::available(runner) => {
      let git = Git::open(runner, project_root)?;
      let name = git.config_value("user.name")?.unwrap_or_default();
      let email = git.config_value("user.email")?.unwrap_or_default();
      format!("{} <{}>", name, email)
    }
    None => UNKNOWN_MAINTAINER.to_string(),
  };

  if !maintainer_looks_valid(&maintainer) {
    ui::warn("'deb package maintainer' seems to be in the wrong format");
  }
  Ok(maintainer)
}

/// Package name: `dil`, or `dil-<binsuffix>` for tagged builds
pub fn package_name(version: &Version) -> String {
  if version.bin_suffix().is_empty() {
    "dil".to_string()
  } else {
    format!("dil-{}", version.bin_suffix())
  }
}

/// Full Debian version: upstream with dots, plus `-<revision>`
pub fn debian_version(version: &Version, revision: u32) -> String {
  format!("{}-{}", version.debian_upstream(), revision)
}

/// Installed size and checksum listing of a package tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
  /// Sum of file sizes in KiB, rounded down
  pub installed_size: u64,
  /// One `<md5>  <relative path>` line per file
  pub md5sums: String,
}

/// Compute the installed size and md5sums for `files` under `root`.
///
/// Lines follow the order of `files`.
pub fn get_totalsize_and_md5sums(files: &[PathBuf], root: &Path) -> ReleaseResult<PackageManifest> {
  let mut total: u64 = 0;
  let mut md5sums = String::new();
  let mut progress = FileProgress::new(files.len(), "Hashing package files");

  for file in files {
    let data = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    total += data.len() as u64;
    let digest = Md5::digest(&data);
    let rel = file.strip_prefix(root)?;
    let rel = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
    md5sums.push_str(&format!("{:x}  {}\n", digest, rel));
    progress.inc();
  }

  Ok(PackageManifest {
    installed_size: total / 1024,
    md5sums,
  })
}

/// Values substituted into the control file
#[derive(Debug, Clone)]
pub struct ControlFields<'a> {
  pub package: &'a str,
  /// Full Debian version including the revision
  pub version: &'a str,
  pub arch: &'a str,
  pub installed_size: u64,
  pub maintainer: &'a str,
}

/// Render `DEBIAN/control`
pub fn render_control(fields: &ControlFields) -> String {
  format!(
    "Package: {package}
Version: {version}
Section: devel
Priority: optional
Architecture: {arch}
Depends: libc6
Provides: d-compiler
Installed-Size: {size}
Maintainer: {maintainer}
Bugs: https://github.com/azizk/dil/issues
Homepage: http://code.google.com/p/dil
Description: D compiler
 DIL is a feature-rich compiler for the D programming language
 written entirely in D.
",
    package = fields.package,
    version = fields.version,
    arch = fields.arch,
    size = fields.installed_size,
    maintainer = fields.maintainer,
  )
}

/// Render a single-entry `changelog.Debian`
pub fn render_debian_changelog(
  package: &str,
  deb_version: &str,
  version: &Version,
  maintainer: &str,
  date: &str,
) -> String {
  format!(
    "{} ({}) unstable; urgency=low\n\n  * Release {}.\n\n -- {}  {}\n",
    package, deb_version, version, maintainer, date
  )
}

/// Inputs for one Debian package
pub struct DebRequest<'a> {
  /// Linux binaries for this architecture
  pub binaries: &'a [PathBuf],
  /// Assembled release tree (data, docs, AUTHORS)
  pub source: &'a ProjectLayout,
  /// Where the `.deb` is written
  pub dest_dir: &'a Path,
  /// Parent of the scratch tree
  pub scratch_parent: &'a Path,
  pub version: &'a Version,
  pub arch: &'a str,
  pub maintainer: &'a str,
  pub revision: u32,
}

/// Directories of the package tree
struct DebTree {
  root: PathBuf,
  bin: PathBuf,
  doc: PathBuf,
  man: PathBuf,
  share: PathBuf,
  etc: PathBuf,
  control: PathBuf,
}

impl DebTree {
  fn create(root: &Path, package: &str) -> ReleaseResult<Self> {
    Ok(Self {
      bin: fs::mkdir(&root.join("usr/bin"))?,
      doc: fs::mkdir(&root.join("usr/share/doc").join(package))?,
      man: fs::mkdir(&root.join("usr/share/man/man1"))?,
      share: fs::mkdir(&root.join("usr/share").join(package))?,
      etc: fs::mkdir(&root.join("etc"))?,
      control: fs::mkdir(&root.join("DEBIAN"))?,
      root: root.to_path_buf(),
    })
  }
}

fn gzip(runner: &dyn CommandRunner, file: &Path) -> ReleaseResult<PathBuf> {
  runner.run_checked(&Invocation::new("gzip").arg("--best").path_arg(file))?;
  let mut gz = file.as_os_str().to_os_string();
  gz.push(".gz");
  Ok(PathBuf::from(gz))
}

/// Build one `.deb` and return its path
pub fn make_deb_package(req: &DebRequest, runner: &dyn CommandRunner) -> ReleaseResult<PathBuf> {
  let package = package_name(req.version);
  let deb_version = debian_version(req.version, req.revision);

  let scratch = ScratchDir::create(req.scratch_parent.join("debian"))?;
  let tree = DebTree::create(scratch.path(), &package)?;

  for binary in req.binaries {
    let name = binary.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    let rest = name.strip_prefix("dil").unwrap_or(&name);
    fs::copy(binary, &tree.bin.join(format!("{}{}", package, rest)))?;
  }

  let datadir = format!("/usr/share/{}/data", package);
  stamp::write_modified_dilconf(&req.source.dilconf(), &tree.etc.join("dilconf.d"), &datadir)?;

  std::fs::write(tree.doc.join("copyright"), COPYRIGHT)?;
  let changelog = tree.doc.join("changelog");
  std::fs::write(&changelog, "\n")?;
  let changelog_deb = tree.doc.join("changelog.Debian");
  let date = chrono::Local::now().to_rfc2822();
  std::fs::write(
    &changelog_deb,
    render_debian_changelog(&package, &deb_version, req.version, req.maintainer, &date),
  )?;

  let authors = req.source.root.join("AUTHORS");
  if authors.is_file() {
    fs::copy(&authors, &tree.doc)?;
  }
  if req.source.data.is_dir() {
    fs::copy(&req.source.data, &tree.share.join("data"))?;
  }
  if req.source.doc.root.is_dir() {
    fs::copy(&req.source.doc.root, &tree.doc.join("api"))?;
  }

  let manpage = tree.man.join(format!("{}.1", package));
  std::fs::write(&manpage, "\n")?;
  let manpage_gz = gzip(runner, &manpage)?;
  gzip(runner, &changelog)?;
  gzip(runner, &changelog_deb)?;
  fs::copy(&manpage_gz, &tree.man.join(format!("{}_dbg.1.gz", package)))?;

  let files = fs::walk_files(&tree.root, &|p| p == tree.control.as_path())?;
  let manifest = get_totalsize_and_md5sums(&files, &tree.root)?;

  let control = render_control(&ControlFields {
    package: &package,
    version: &deb_version,
    arch: req.arch,
    installed_size: manifest.installed_size,
    maintainer: req.maintainer,
  });

  let control_files = [
    (tree.control.join("control"), control),
    (tree.control.join("conffiles"), CONFFILES.to_string()),
    (tree.control.join("md5sums"), manifest.md5sums),
  ];
  for (path, content) in &control_files {
    std::fs::write(path, content)?;
  }
  let scripts = [tree.control.join("postinst"), tree.control.join("prerm")];
  for script in &scripts {
    std::fs::write(script, NOOP_SCRIPT)?;
  }

  let mut regular: Vec<PathBuf> = files.clone();
  regular.extend(control_files.iter().map(|(p, _)| p.clone()));
  let mut executable = vec![tree.root.clone()];
  executable.extend(fs::walk_dirs(&tree.root)?);
  executable.extend(fs::walk_files(&tree.bin, &|_| false)?);
  executable.extend(scripts.iter().cloned());
  set_permissions(&regular, &executable)?;

  let name = format!("{}_{}_{}.deb", package, deb_version, req.arch);
  let deb = req.dest_dir.join(&name);
  let inv = Invocation::new("dpkg-deb")
    .arg("--build")
    .path_arg(&tree.root)
    .path_arg(&deb)
    .wrapped_in("fakeroot");
  runner.run_checked(&inv)?;

  drop(scratch);
  Ok(deb)
}

#[cfg(unix)]
fn set_permissions(regular: &[PathBuf], executable: &[PathBuf]) -> ReleaseResult<()> {
  use std::os::unix::fs::PermissionsExt;

  for path in regular {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
      .with_context(|| format!("Failed to chmod {}", path.display()))?;
  }
  for path in executable {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
      .with_context(|| format!("Failed to chmod {}", path.display()))?;
  }
  Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_regular: &[PathBuf], _executable: &[PathBuf]) -> ReleaseResult<()> {
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::runner::ProcessOutput;
  use crate::core::runner::testing::FakeRunner;
  use tempfile::TempDir;

  /// gzip renames, dpkg-deb writes its output file
  fn packaging_runner() -> FakeRunner {
    FakeRunner::new().respond_with(|inv| {
      match inv.program.as_str() {
        "gzip" => {
          let file = inv.args.last().unwrap();
          std::fs::rename(file, format!("{}.gz", file)).unwrap();
        }
        "fakeroot" => {
          let out = inv.args.last().unwrap();
          std::fs::write(out, "!<arch>\n").unwrap();
        }
        _ => {}
      }
      ProcessOutput::ok("")
    })
  }

  fn source_tree(root: &Path) -> ProjectLayout {
    let layout = ProjectLayout::new(root.join("dil"));
    std::fs::create_dir_all(&layout.data).unwrap();
    std::fs::write(layout.dilconf(), "var DATADIR = \"${BINDIR}/../data\";\n").unwrap();
    std::fs::write(layout.root.join("AUTHORS"), "Aziz\n").unwrap();
    std::fs::create_dir_all(layout.root.join("linux/bin64")).unwrap();
    std::fs::write(layout.root.join("linux/bin64/dil"), "ELF").unwrap();
    std::fs::write(layout.root.join("linux/bin64/dil_d"), "ELF-debug").unwrap();
    layout
  }

  #[test]
  fn test_control_snapshot() {
    let control = render_control(&ControlFields {
      package: "dil",
      version: "1.123.rc1-2",
      arch: "amd64",
      installed_size: 42,
      maintainer: "Jane Doe <jane@example.org>",
    });
    assert_eq!(
      control,
      "Package: dil
Version: 1.123.rc1-2
Section: devel
Priority: optional
Architecture: amd64
Depends: libc6
Provides: d-compiler
Installed-Size: 42
Maintainer: Jane Doe <jane@example.org>
Bugs: https://github.com/azizk/dil/issues
Homepage: http://code.google.com/p/dil
Description: D compiler
 DIL is a feature-rich compiler for the D programming language
 written entirely in D.
"
    );
  }

  #[test]
  fn test_debian_version_replaces_dashes() {
    let v = Version::parse("1.123-rc1").unwrap();
    assert_eq!(debian_version(&v, 2), "1.123.rc1-2");
    let v = Version::parse("1.123").unwrap();
    assert_eq!(debian_version(&v, 1), "1.123-1");
  }

  #[test]
  fn test_package_name() {
    assert_eq!(package_name(&Version::parse("1.123").unwrap()), "dil");
    assert_eq!(package_name(&Version::parse("1.123+static").unwrap()), "dil-static");
  }

  #[test]
  fn test_totalsize_and_md5sums() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::create_dir_all(root.join("usr/bin")).unwrap();
    let a = root.join("usr/bin/dil");
    let b = root.join("etc");
    std::fs::write(&a, vec![b'x'; 2000]).unwrap();
    std::fs::write(&b, vec![b'y'; 100]).unwrap();
    let c = root.join("empty");
    std::fs::write(&c, "").unwrap();

    let manifest = get_totalsize_and_md5sums(&[a.clone(), b, c], root).unwrap();
    assert_eq!(manifest.installed_size, 2100 / 1024);
    let lines: Vec<&str> = manifest.md5sums.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("  usr/bin/dil"));
    assert!(lines[1].ends_with("  etc"));
    assert_eq!(lines[2], "d41d8cd98f00b204e9800998ecf8427e  empty");

    let again = get_totalsize_and_md5sums(&[a], root).unwrap();
    assert_eq!(again.md5sums.lines().next(), Some(lines[0]));
  }

  #[test]
  fn test_maintainer_pattern() {
    assert!(maintainer_looks_valid("Jane Doe <jane@example.org>"));
    assert!(maintainer_looks_valid(UNKNOWN_MAINTAINER));
    assert!(!maintainer_looks_valid("Jane Doe"));
    assert!(!maintainer_looks_valid("Jane <jane>"));
    assert!(!maintainer_looks_valid(" <>"));
  }

  #[test]
  fn test_resolve_maintainer_sources() {
    let runner = FakeRunner::new();
    let m = resolve_maintainer(None, &runner, Path::new("/p")).unwrap();
    assert_eq!(m, UNKNOWN_MAINTAINER);

    let runner = FakeRunner::new().with_programs(&["git"]).respond_with(|inv| {
      if inv.args.iter().any(|a| a == "user.name") {
        ProcessOutput::ok("Jane Doe\n")
      } else {
        ProcessOutput::ok("jane@example.org\n")
      }
    });
    let m = resolve_maintainer(None, &runner, Path::new("/p")).unwrap();
    assert_eq!(m, "Jane Doe <jane@example.org>");

    // Malformed strings are kept, only warned about
    let m = resolve_maintainer(Some("nobody"), &runner, Path::new("/p")).unwrap();
    assert_eq!(m, "nobody");
  }

  #[test]
  fn test_make_deb_package() {
    let tmp = TempDir::new().unwrap();
    let source = source_tree(tmp.path());
    let version = Version::parse("1.123-rc1").unwrap();
    let bins = vec![source.root.join("linux/bin64/dil"), source.root.join("linux/bin64/dil_d")];
    let scratch_parent = tmp.path().join("tmp");
    std::fs::create_dir_all(&scratch_parent).unwrap();
    let runner = packaging_runner();

    let deb = make_deb_package(
      &DebRequest {
        binaries: &bins,
        source: &source,
        dest_dir: tmp.path(),
        scratch_parent: &scratch_parent,
        version: &version,
        arch: "amd64",
        maintainer: "Jane Doe <jane@example.org>",
        revision: 2,
      },
      &runner,
    )
    .unwrap();

    assert_eq!(deb, tmp.path().join("dil_1.123.rc1-2_amd64.deb"));
    assert!(deb.exists());
    assert!(!scratch_parent.join("debian").exists(), "scratch tree must be removed");

    let calls = runner.calls.borrow();
    let gz: Vec<_> = calls.iter().filter(|c| c.program == "gzip").collect();
    assert_eq!(gz.len(), 3);
    let pack = calls.last().unwrap();
    assert_eq!(pack.program, "fakeroot");
    assert_eq!(pack.args[0], "dpkg-deb");
    assert_eq!(pack.args[1], "--build");
  }

  #[cfg(unix)]
  #[test]
  fn test_make_deb_package_with_symlinked_data_dir() {
    let tmp = TempDir::new().unwrap();
    let source = source_tree(tmp.path());
    let shared = tmp.path().join("shared-lexicon");
    std::fs::create_dir_all(&shared).unwrap();
    std::fs::write(shared.join("keywords.txt"), "abstract\n").unwrap();
    std::os::unix::fs::symlink(&shared, source.data.join("lexicon")).unwrap();

    let version = Version::parse("1.123").unwrap();
    let bins = vec![source.root.join("linux/bin64/dil")];
    let scratch_parent = tmp.path().join("tmp");
    std::fs::create_dir_all(&scratch_parent).unwrap();

    let deb = make_deb_package(
      &DebRequest {
        binaries: &bins,
        source: &source,
        dest_dir: tmp.path(),
        scratch_parent: &scratch_parent,
        version: &version,
        arch: "amd64",
        maintainer: "Jane Doe <jane@example.org>",
        revision: 1,
      },
      &packaging_runner(),
    )
    .unwrap();
    assert!(deb.exists());
  }

  #[test]
  fn test_deb_tree_contents_before_packaging() {
    let tmp = TempDir::new().unwrap();
    let source = source_tree(tmp.path());
    let version = Version::parse("1.123").unwrap();
    let bins = vec![source.root.join("linux/bin64/dil_d")];
    let scratch_parent = tmp.path().join("tmp");
    let snapshot = tmp.path().join("snapshot");

    // Capture the tree when dpkg-deb is invoked
    let snap = snapshot.clone();
    let runner = FakeRunner::new().respond_with(move |inv| {
      match inv.program.as_str() {
        "gzip" => {
          let file = inv.args.last().unwrap();
          std::fs::rename(file, format!("{}.gz", file)).unwrap();
        }
        "fakeroot" => {
          crate::core::fs::copy(Path::new(&inv.args[2]), &snap).unwrap();
        }
        _ => {}
      }
      ProcessOutput::ok("")
    });

    make_deb_package(
      &DebRequest {
        binaries: &bins,
        source: &source,
        dest_dir: tmp.path(),
        scratch_parent: &scratch_parent,
        version: &version,
        arch: "amd64",
        maintainer: "Jane Doe <jane@example.org>",
        revision: 1,
      },
      &runner,
    )
    .unwrap();

    assert!(snapshot.join("usr/bin/dil_d").exists());
    assert!(snapshot.join("usr/share/man/man1/dil.1.gz").exists());
    assert!(snapshot.join("usr/share/man/man1/dil_dbg.1.gz").exists());
    assert!(snapshot.join("usr/share/doc/dil/AUTHORS").exists());
    assert!(snapshot.join("usr/share/dil/data/dilconf.d").exists());
    assert!(!snapshot.join("usr/share/doc/dil/api").exists());
    assert_eq!(
      std::fs::read_to_string(snapshot.join("etc/dilconf.d")).unwrap(),
      "var DATADIR = \"/usr/share/dil/data\";\n"
    );
    assert_eq!(std::fs::read_to_string(snapshot.join("DEBIAN/conffiles")).unwrap(), "/etc/dilconf.d\n");
    assert_eq!(std::fs::read_to_string(snapshot.join("DEBIAN/prerm")).unwrap(), "#!/bin/sh\nexit 0\n");

    let md5sums = std::fs::read_to_string(snapshot.join("DEBIAN/md5sums")).unwrap();
    assert!(md5sums.lines().all(|l| !l.contains("DEBIAN")));
    assert!(md5sums.contains("  usr/bin/dil_d\n"));

    let control = std::fs::read_to_string(snapshot.join("DEBIAN/control")).unwrap();
    assert!(control.contains("Version: 1.123-1\n"));
  }

  #[test]
  fn test_packager_failure_is_fatal_and_cleans_up() {
    let tmp = TempDir::new().unwrap();
    let source = source_tree(tmp.path());
    let version = Version::parse("1.123").unwrap();
    let scratch_parent = tmp.path().join("tmp");
    let runner = FakeRunner::new().respond_with(|inv| match inv.program.as_str() {
      "gzip" => {
        let file = inv.args.last().unwrap();
        std::fs::rename(file, format!("{}.gz", file)).unwrap();
        ProcessOutput::ok("")
      }
      _ => ProcessOutput::failed(2, "dpkg-deb: error"),
    });

    let result = make_deb_package(
      &DebRequest {
        binaries: &[],
        source: &source,
        dest_dir: tmp.path(),
        scratch_parent: &scratch_parent,
        version: &version,
        arch: "i386",
        maintainer: UNKNOWN_MAINTAINER,
        revision: 1,
      },
      &runner,
    );
    assert!(result.is_err());
    assert!(!scratch_parent.join("debian").exists());
  }
}
