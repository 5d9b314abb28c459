//! Core plumbing for dil-release
//!
//! - **config**: optional release.toml defaults
//! - **error**: error types with contextual help messages and exit codes
//! - **fs**: file/directory helpers and the scratch-directory guard
//! - **layout**: named directory layouts of the project and the release tree
//! - **runner**: external program invocation behind the `CommandRunner` trait
//! - **vcs**: git operations (checkout, modified files, identity)

pub mod config;
pub mod error;
pub mod fs;
pub mod layout;
pub mod runner;
pub mod vcs;
