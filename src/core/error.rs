//! Error types for dil-release with contextual messages and exit codes
//!
//! Every error is categorized so the driver can pick an exit code, and most
//! carry a help line telling the user what to do next.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for dil-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad arguments, config, missing inputs)
  User = 1,
  /// System error (external tool, I/O)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for dil-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration errors (release.toml)
  Config(ConfigError),

  /// Argument and environment validation errors
  Validation(ValidationError),

  /// External program failures
  Tool(ToolError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(e) => ReleaseError::Message {
        message: format!("{}: {}", ctx_str, e),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Validation(_) => ExitCode::User,
      ReleaseError::Tool(_) => ExitCode::System,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Validation(e) => e.help_message(),
      ReleaseError::Tool(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Validation(e) => write!(f, "{}", e),
      ReleaseError::Tool(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ValidationError> for ReleaseError {
  fn from(err: ValidationError) -> Self {
    ReleaseError::Validation(err)
  }
}

impl From<ToolError> for ReleaseError {
  fn from(err: ToolError) -> Self {
    ReleaseError::Tool(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::Config(ConfigError::Parse {
      path: None,
      reason: err.to_string(),
    })
  }
}

impl From<glob::PatternError> for ReleaseError {
  fn from(err: glob::PatternError) -> Self {
    ReleaseError::message(format!("Invalid glob pattern: {}", err))
  }
}

impl From<glob::GlobError> for ReleaseError {
  fn from(err: glob::GlobError) -> Self {
    ReleaseError::message(format!("Glob error: {}", err))
  }
}

impl From<walkdir::Error> for ReleaseError {
  fn from(err: walkdir::Error) -> Self {
    match err.path() {
      Some(path) => ReleaseError::message(format!("Failed to walk {}: {}", path.display(), err)),
      None => ReleaseError::message(format!("Directory walk error: {}", err)),
    }
  }
}

impl From<std::path::StripPrefixError> for ReleaseError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ReleaseError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// release.toml could not be parsed
  Parse { path: Option<PathBuf>, reason: String },

  /// A target name that is not part of the build matrix
  UnknownTarget { name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Parse { .. } => {
        Some("Fix the syntax in release.toml or remove the file to use defaults.".to_string())
      }
      ConfigError::UnknownTarget { .. } => Some("Valid targets are: Lin32, Lin64, Win32, Win64".to_string()),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Parse { path: Some(path), reason } => {
        write!(f, "Failed to parse {}: {}", path.display(), reason)
      }
      ConfigError::Parse { path: None, reason } => write!(f, "Failed to parse release config: {}", reason),
      ConfigError::UnknownTarget { name } => write!(f, "Unknown build target '{}'", name),
    }
  }
}

/// Validation errors, raised before anything is written to disk
#[derive(Debug)]
pub enum ValidationError {
  /// VERSION argument does not match the release grammar
  InvalidVersionFormat { input: String },

  /// A required external program could not be located
  MissingTool { tool: String, hint: Option<String> },

  /// The path passed with --src does not exist
  SourceNotFound { path: PathBuf },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::InvalidVersionFormat { .. } => {
        Some(
          "Expected MAJOR.MINOR[-SUFFIX][+BINSUFFIX] with a 3-digit minor, e.g. 1.123 or 1.123-beta+win32"
            .to_string(),
        )
      }
      ValidationError::MissingTool { hint, .. } => hint.clone(),
      ValidationError::SourceNotFound { .. } => Some("Pass an existing directory to --src".to_string()),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::InvalidVersionFormat { input } => {
        write!(f, "Invalid VERSION format: '{}'", input)
      }
      ValidationError::MissingTool { tool, .. } => {
        write!(f, "The executable '{}' could not be located", tool)
      }
      ValidationError::SourceNotFound { path } => {
        write!(f, "The given SRC path ({}) doesn't exist", path.display())
      }
    }
  }
}

/// External program errors
#[derive(Debug)]
pub enum ToolError {
  /// The program ran and exited unsuccessfully
  CommandFailed {
    command: String,
    status: Option<i32>,
    stderr: String,
  },

  /// The program could not be started at all
  SpawnFailed { program: String, reason: String },
}

impl ToolError {
  fn help_message(&self) -> Option<String> {
    match self {
      ToolError::SpawnFailed { program, .. } => Some(format!("Make sure '{}' is installed and in your PATH.", program)),
      ToolError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::CommandFailed { command, status, stderr } => {
        match status {
          Some(code) => write!(f, "Command failed with exit code {}: {}", code, command)?,
          None => write!(f, "Command terminated by signal: {}", command)?,
        }
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
      ToolError::SpawnFailed { program, reason } => {
        write!(f, "Failed to execute {}: {}", program, reason)
      }
    }
  }
}

/// Result type alias for dil-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
