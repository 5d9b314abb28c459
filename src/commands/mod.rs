//! CLI command implementations
//!
//! - **release**: assemble a DIL release from the parsed arguments
//! - **winpath**: register a directory in the Windows user PATH

pub mod release;
pub mod winpath;

pub use release::{ReleaseArgs, run_release};
pub use winpath::run_winpath;
