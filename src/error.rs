//! Error and warning types produced while rebasing a stylesheet.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions. Every variant aborts the current file; nothing is emitted for it.
#[derive(Debug, Error)]
pub enum RebaseError {
  /// Construction options were missing or had the wrong shape.
  #[error("invalid configuration: {0}")]
  Configuration(String),

  /// The file handed to the transform cannot be processed at all.
  #[error("invalid input file: {0}")]
  Input(String),

  /// The stylesheet could not be parsed as CSS.
  #[error("failed to parse {} as CSS: {message}", path.display())]
  Parse {
    /// Source stylesheet.
    path: PathBuf,
    /// Message reported by the CSS backend.
    message: String,
  },

  /// An asset could not be copied to its new location.
  #[error("copying {} to {} failed: {source}", from.display(), to.display())]
  Copy {
    /// Original asset path.
    from: PathBuf,
    /// Destination asset path.
    to: PathBuf,
    /// Underlying I/O failure.
    #[source]
    source: io::Error,
  },

  /// The rewritten stylesheet could not be turned back into text.
  #[error("unable to serialize CSS for {}: {message}", path.display())]
  Serialization {
    /// Source stylesheet.
    path: PathBuf,
    /// Message reported by the CSS backend.
    message: String,
  },
}

/// Non-fatal diagnostics. Processing continues after these are recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseWarning {
  /// The parsed stylesheet contains no rules.
  NoRules {
    /// Source stylesheet.
    path: PathBuf,
  },
  /// A `url(...)` token without a usable path; it is left untouched.
  MalformedUrl {
    /// Source stylesheet.
    path: PathBuf,
    /// The raw token as it appeared in the declaration value.
    token: String,
  },
}

impl fmt::Display for RebaseWarning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NoRules { path } => write!(f, "parsed CSS has no rules: {}", path.display()),
      Self::MalformedUrl { path, token } => {
        write!(f, "expected url() with a path in {}: {}", path.display(), token)
      }
    }
  }
}

/// Result alias used across the crate.
pub type RebaseResult<T> = Result<T, RebaseError>;
