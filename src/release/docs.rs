//! Documentation assets and generators
//!
//! The HTML documentation is produced by the compiler's own `ddoc` command.
//! PDF and CHM output are handed to external converters.

use crate::core::error::{ReleaseError, ReleaseResult, ToolError};
use crate::core::fs;
use crate::core::layout::ProjectLayout;
use crate::core::runner::{CommandRunner, Invocation};
use crate::release::version::Version;
use crate::ui;
use std::path::{Path, PathBuf};

/// Copy stylesheets, scripts and images into the documentation tree.
///
/// Inputs missing from the source tree are skipped.
pub fn copy_doc_assets(project: &ProjectLayout) -> ReleaseResult<()> {
  let doc = &project.doc;
  let html_css = project.data.join("html.css");
  if html_css.is_file() {
    fs::copy(&html_css, &doc.htmlsrc)?;
  }
  if project.kandil.style.is_file() {
    fs::copy(&project.kandil.style, &doc.css)?;
  }
  for js in project.kandil.js_files()? {
    fs::copy(&js, &doc.js)?;
  }
  for img in project.kandil.images()? {
    fs::copy(&img, &doc.img)?;
  }
  Ok(())
}

/// Run the compiler's documentation generator over `files`
pub fn generate_docs(
  exe: &Path,
  doc_dir: &Path,
  module_list: &Path,
  files: &[PathBuf],
  versions: &[&str],
  options: &[&str],
  runner: &dyn CommandRunner,
) -> ReleaseResult<()> {
  let mut inv = Invocation::new(exe.to_string_lossy())
    .arg("ddoc")
    .path_arg(doc_dir)
    .arg(format!("-m={}", module_list.display()));
  inv = inv.args(versions.iter().map(|v| format!("-version={}", v)));
  inv = inv.args(options.iter().copied());
  inv = inv.args(files.iter().map(|f| f.to_string_lossy().to_string()));
  runner.run_checked(&inv)?;
  Ok(())
}

/// Document metadata for the PDF converter
#[derive(Debug, Clone)]
pub struct PdfParams {
  pub title: String,
  pub author: String,
  pub subject: String,
  pub keywords: String,
}

impl PdfParams {
  pub fn for_version(version: &Version) -> Self {
    Self {
      title: format!("DIL {} API", version),
      author: "Aziz Köksal".to_string(),
      subject: "Compiler API".to_string(),
      keywords: "DIL D compiler API documentation".to_string(),
    }
  }
}

/// Convert the HTML documentation into `doc/dil.<version>.API.pdf`
pub fn write_pdf(doc_dir: &Path, version: &Version, runner: &dyn CommandRunner) -> ReleaseResult<PathBuf> {
  ui::step("Generating PDF");
  let params = PdfParams::for_version(version);
  let html_files = fs::glob_in(doc_dir, "*.html")?;
  let dest = doc_dir.join(format!("dil.{}.API.pdf", version));

  let inv = Invocation::new("prince")
    .arg(format!("--pdf-title={}", params.title))
    .arg(format!("--pdf-author={}", params.author))
    .arg(format!("--pdf-subject={}", params.subject))
    .arg(format!("--pdf-keywords={}", params.keywords))
    .arg("-o")
    .path_arg(&dest)
    .args(html_files.iter().map(|f| f.to_string_lossy().to_string()));
  runner.run_checked(&inv)?;
  Ok(dest)
}

/// Settings of an HTML Help project
#[derive(Debug, Clone)]
pub struct ChmParams {
  pub title: String,
  pub default_window: String,
  pub default_topic: String,
}

impl ChmParams {
  pub fn for_version(version: &Version) -> Self {
    Self {
      title: format!("DIL {} API", version),
      default_window: "main".to_string(),
      default_topic: "dilconf.html".to_string(),
    }
  }
}

/// Render an HTML Help Workshop project file
pub fn render_hhp(params: &ChmParams, compiled_file: &str, files: &[String]) -> String {
  let mut out = format!(
    "[OPTIONS]
Compatibility=1.1 or later
Compiled file={compiled}
Default Window={window}
Default topic={topic}
Display compile progress=No
Language=0x409 English (United States)
Title={title}

[WINDOWS]
{window}=\"{title}\",,,\"{topic}\",\"{topic}\",,,,,0x23520,,0x387e,,,,,,,,0

[FILES]
",
    compiled = compiled_file,
    window = params.default_window,
    topic = params.default_topic,
    title = params.title,
  );
  for file in files {
    out.push_str(file);
    out.push('\n');
  }
  out
}

/// Compile the HTML documentation into `doc/dil.<version>.API.chm`.
///
/// `hhc` runs under `wine` on non-Windows hosts.
pub fn write_chm(
  doc_dir: &Path,
  version: &Version,
  tmp: &Path,
  host_is_windows: bool,
  runner: &dyn CommandRunner,
) -> ReleaseResult<PathBuf> {
  ui::step("Generating CHM");
  let work = fs::ScratchDir::create(tmp.join("chm"))?;
  fs::copy_dir_all(doc_dir, work.path())?;

  let html_files: Vec<String> = fs::glob_in(work.path(), "*.html")?
    .iter()
    .filter_map(|f| f.file_name().map(|n| n.to_string_lossy().to_string()))
    .collect();
  let compiled = format!("dil.{}.API.chm", version);
  let hhp = work.path().join("dil.hhp");
  std::fs::write(&hhp, render_hhp(&ChmParams::for_version(version), &compiled, &html_files))?;

  let mut inv = Invocation::new("hhc").arg("dil.hhp").current_dir(work.path());
  if !host_is_windows {
    inv = inv.wrapped_in("wine");
  }
  // hhc exits with 1 on success, so judge by the output file instead
  let output = runner.run(&inv)?;
  let built = work.path().join(&compiled);
  if !built.is_file() {
    return Err(ReleaseError::Tool(ToolError::CommandFailed {
      command: inv.to_string(),
      status: output.status,
      stderr: output.stderr,
    }));
  }

  let dest = doc_dir.join(&compiled);
  fs::copy(&built, &dest)?;
  Ok(dest)
}
