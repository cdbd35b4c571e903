//! The per-file descriptor exchanged with the surrounding pipeline.

use std::path::{Path, PathBuf};

use crate::error::{RebaseError, RebaseResult};

/// A stylesheet travelling through the build pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
  /// Absolute path of the stylesheet on disk.
  pub path: PathBuf,
  /// Path of the stylesheet relative to the pipeline's source root.
  pub relative: PathBuf,
  /// Raw stylesheet bytes.
  pub contents: Vec<u8>,
}

impl SourceFile {
  /// Build a descriptor from its parts.
  pub fn new(
    path: impl Into<PathBuf>,
    relative: impl Into<PathBuf>,
    contents: impl Into<Vec<u8>>,
  ) -> Self {
    Self {
      path: path.into(),
      relative: relative.into(),
      contents: contents.into(),
    }
  }

  /// Read a stylesheet from disk, deriving `relative` from the pipeline's source root.
  ///
  /// Files outside `base` keep their full path as `relative` minus any root component, which
  /// mirrors them under the destination instead of escaping it.
  pub fn read(path: &Path, base: &Path) -> std::io::Result<Self> {
    let contents = std::fs::read(path)?;
    let relative = match path.strip_prefix(base) {
      Ok(relative) => relative.to_path_buf(),
      Err(_) => path
        .components()
        .filter(|component| matches!(component, std::path::Component::Normal(_)))
        .collect(),
    };
    Ok(Self::new(path, relative, contents))
  }

  /// Directory containing the stylesheet; the base for its relative `url()` references.
  pub(crate) fn owner_dir(&self) -> RebaseResult<&Path> {
    if self.path.as_os_str().is_empty() {
      return Err(RebaseError::Input("expected a source file path".into()));
    }
    self
      .path
      .parent()
      .ok_or_else(|| RebaseError::Input(format!("{} has no parent directory", self.path.display())))
  }

  /// Validate the relative path used to place the stylesheet under the destination root.
  pub(crate) fn checked_relative(&self) -> RebaseResult<&Path> {
    if self.relative.as_os_str().is_empty() {
      return Err(RebaseError::Input(format!(
        "{} has an empty relative path",
        self.path.display()
      )));
    }
    if self.relative.has_root() {
      return Err(RebaseError::Input(format!(
        "relative path {} of {} must not be absolute",
        self.relative.display(),
        self.path.display()
      )));
    }
    Ok(&self.relative)
  }
}
