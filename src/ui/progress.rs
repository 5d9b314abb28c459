//! Progress indicators for long-running file operations
//!
//! Uses `linya`, which draws to stderr and stays out of the step output.

use linya::{Bar, Progress};

/// Progress bar for per-file work (hashing, copying)
pub struct FileProgress {
  progress: Progress,
  bar: Bar,
}

impl FileProgress {
  /// Create a new progress bar over `total` files
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
