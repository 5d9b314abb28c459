//! `--winpath`: append a directory to the user PATH and exit

use crate::core::error::ReleaseResult;
use crate::core::runner::CommandRunner;
use crate::release::winpath;

pub fn run_winpath(entry: &str, runner: &dyn CommandRunner) -> ReleaseResult<()> {
  winpath::append_to_path(entry, cfg!(windows), runner)?;
  Ok(())
}
