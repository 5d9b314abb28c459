//! Terminal output for release steps

pub mod progress;

/// Print a step banner, e.g. `== Building Linux 32bit binary ==`
pub fn step(title: &str) {
  println!("== {} ==", title);
  tracing::info!(step = title);
}

/// Print a non-fatal warning inline
pub fn warn(message: &str) {
  println!("⚠️  Warning: {}", message);
  tracing::warn!("{}", message);
}
