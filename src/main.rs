mod commands;
mod core;
mod release;
mod ui;

use clap::Parser;
use commands::ReleaseArgs;
use core::error::{ReleaseError, print_error};
use core::runner::SystemRunner;
use tracing_subscriber::EnvFilter;

/// Build and package a release of the DIL compiler
#[derive(Parser)]
#[command(name = "dil-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  #[command(flatten)]
  release: ReleaseArgs,
}

fn get_styles() -> clap::builder::Styles {
  let yellow = anstyle::Style::new()
    .bold()
    .underline()
    .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow)));
  let red = anstyle::Style::new()
    .bold()
    .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red)));

  clap::builder::Styles::styled()
    .usage(yellow)
    .header(yellow)
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(red)
    .error(red)
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  // RUST_LOG=debug shows every external command
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let runner = SystemRunner;

  if let Some(entry) = cli.release.winpath.as_deref() {
    if let Err(e) = commands::run_winpath(entry, &runner) {
      handle_error(e);
    }
    return;
  }

  let project_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(ReleaseError::message(format!("Failed to get current directory: {}", e))),
  };

  if let Err(e) = commands::run_release(cli.release, &project_root, &runner) {
    handle_error(e);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
