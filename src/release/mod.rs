//! Release assembly for the DIL compiler
//!
//! A release run checks out the sources into `<builddir>/dil_<version>/dil`,
//! stamps the version, optionally generates documentation, builds the
//! compiler for every target and packages the result:
//!
//! - **version**: version string parsing and derived forms
//! - **target**: the platform/architecture build matrix
//! - **build**: compiler invocations (dmd, ldc)
//! - **stamp**: version stamping and `dilconf.d` rewriting
//! - **docs**: documentation assets, HTML, PDF and CHM output
//! - **deb**: Debian packages
//! - **archive**: 7z/zip/tar archives
//! - **summary**: produced artifacts and timings
//! - **winpath**: `--winpath` registry PATH editing
//! - **pipeline**: the end-to-end release run

pub mod archive;
pub mod build;
pub mod deb;
pub mod docs;
pub mod pipeline;
pub mod stamp;
pub mod summary;
pub mod target;
pub mod version;
pub mod winpath;

pub use pipeline::ReleaseOptions;
pub use version::Version;
