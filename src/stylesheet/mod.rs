//! Stylesheet tree consumed by the rebaser, and the seam to the CSS backend.
//!
//! Rule structure is the backend's business: a [`CssSyntax`] implementation turns text into a
//! [`Stylesheet`] of rules and declarations and prints the (possibly edited) tree back out.

mod raw;
mod tree;

use thiserror::Error;

pub use raw::RawSyntax;
pub use tree::{Declaration, Rule, Stylesheet};

/// Failure reported by a CSS backend while parsing or printing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct SyntaxError {
  message: String,
}

impl SyntaxError {
  /// Wrap a backend message.
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Parser and serializer for stylesheets.
pub trait CssSyntax {
  /// Parse `source`; `filename` is only used for diagnostics.
  fn parse(&self, source: &str, filename: &str) -> Result<Stylesheet, SyntaxError>;

  /// Print a stylesheet back to CSS text.
  fn stringify(&self, stylesheet: &Stylesheet) -> Result<String, SyntaxError>;
}
