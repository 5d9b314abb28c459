//! Produced artifacts and the final timing report

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// One produced file or directory with the time it took
#[derive(Debug, Clone, PartialEq)]
pub struct ProducedEntry {
  pub path: PathBuf,
  pub elapsed: Duration,
}

/// Append-only record of everything the release produced
#[derive(Debug, Default)]
pub struct Produced {
  entries: Vec<ProducedEntry>,
}

impl Produced {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start timing a step
  pub fn start(&self) -> Instant {
    Instant::now()
  }

  /// Record `path` as produced by the step started at `started`
  pub fn record(&mut self, path: PathBuf, started: Instant) {
    self.entries.push(ProducedEntry {
      path,
      elapsed: started.elapsed(),
    });
  }

  pub fn entries(&self) -> &[ProducedEntry] {
    &self.entries
  }

  /// Render the summary; entries whose path no longer exists are left out
  pub fn render(&self, total: Duration) -> String {
    let mut out = String::new();
    if !self.entries.is_empty() {
      out.push_str("\nProduced files/folders:\n");
      for entry in self.entries.iter().filter(|e| e.path.exists()) {
        let _ = writeln!(out, "{} ({:.2}s)", entry.path.display(), entry.elapsed.as_secs_f64());
      }
      out.push('\n');
    }
    let _ = writeln!(out, "Finished in {:.2}s!", total.as_secs_f64());
    out
  }
}
