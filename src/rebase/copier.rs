//! Copying remapped assets into the assets root.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RebaseError, RebaseResult};

use super::remap::AssetRelocation;

/// Copy primitive used for every distinct asset of a stylesheet.
pub trait AssetCopier {
  /// Copy `from` (a file or a directory tree) to `to`, creating parent directories.
  fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
}

impl<C: AssetCopier + ?Sized> AssetCopier for &C {
  fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
    (**self).copy(from, to)
  }
}

/// Copies on the local filesystem, recursing into directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl AssetCopier for FsCopier {
  fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    if !metadata.is_dir() {
      return copy_file(from, to);
    }

    for entry in WalkDir::new(from) {
      let entry = entry.map_err(io::Error::from)?;
      let relative = entry
        .path()
        .strip_prefix(from)
        .map_err(|err| io::Error::other(err.to_string()))?;
      let target = to.join(relative);
      if entry.file_type().is_dir() {
        fs::create_dir_all(&target)?;
      } else {
        copy_file(entry.path(), &target)?;
      }
    }
    Ok(())
  }
}

fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent)?;
  }
  if to.exists() && is_same_file(from, to)? {
    return Ok(());
  }
  fs::copy(from, to).map(|_| ())
}

/// A copy that has been carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedAsset {
  /// Original asset path.
  pub from: PathBuf,
  /// New asset path.
  pub to: PathBuf,
}

/// Distinct assets pending copy for one stylesheet.
#[derive(Debug, Default)]
pub struct CopyLedger {
  pending: BTreeMap<PathBuf, PathBuf>,
}

impl CopyLedger {
  /// Record a relocation. Returns `false` when the original path was already recorded.
  pub fn record(&mut self, relocation: &AssetRelocation) -> bool {
    if self.pending.contains_key(&relocation.original_asset_path) {
      return false;
    }
    self.pending.insert(
      relocation.original_asset_path.clone(),
      relocation.new_asset_path.clone(),
    );
    true
  }

  /// Copy every recorded asset once, stopping at the first failure.
  pub fn copy_all<C: AssetCopier>(self, copier: &C) -> RebaseResult<Vec<CopiedAsset>> {
    let mut copied = Vec::with_capacity(self.pending.len());
    for (from, to) in self.pending {
      debug!(from = %from.display(), to = %to.display(), "copying asset");
      if let Err(source) = copier.copy(&from, &to) {
        return Err(RebaseError::Copy { from, to, source });
      }
      copied.push(CopiedAsset { from, to });
    }
    Ok(copied)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use tempfile::tempdir;

  #[derive(Default)]
  struct RecordingCopier {
    calls: RefCell<Vec<(PathBuf, PathBuf)>>,
  }

  impl AssetCopier for RecordingCopier {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
      self.calls.borrow_mut().push((from.to_path_buf(), to.to_path_buf()));
      Ok(())
    }
  }

  fn relocation(from: &Path, to: &Path) -> AssetRelocation {
    AssetRelocation {
      original_url: "node_modules/pkg/a.png".into(),
      original_asset_path: from.to_path_buf(),
      dependency_root: from.parent().unwrap().to_path_buf(),
      new_asset_path: to.to_path_buf(),
      new_url: "pkg/a.png".into(),
    }
  }

  #[test]
  fn copies_files_and_creates_parents() -> io::Result<()> {
    let temp = tempdir()?;
    let source = temp.path().join("a.png");
    fs::write(&source, b"png")?;
    let destination = temp.path().join("out/deep/a.png");

    FsCopier.copy(&source, &destination)?;
    assert_eq!(fs::read(&destination)?, b"png");
    Ok(())
  }

  #[test]
  fn copies_directory_trees() -> io::Result<()> {
    let temp = tempdir()?;
    let source = temp.path().join("fonts");
    fs::create_dir_all(source.join("woff"))?;
    fs::write(source.join("woff/a.woff"), b"woff")?;
    fs::write(source.join("LICENSE"), b"mit")?;

    let destination = temp.path().join("out/fonts");
    FsCopier.copy(&source, &destination)?;

    assert_eq!(fs::read(destination.join("woff/a.woff"))?, b"woff");
    assert_eq!(fs::read(destination.join("LICENSE"))?, b"mit");
    Ok(())
  }

  #[test]
  fn skips_copy_onto_itself() -> io::Result<()> {
    let temp = tempdir()?;
    let source = temp.path().join("a.png");
    fs::write(&source, b"png")?;

    FsCopier.copy(&source, &source)?;
    assert_eq!(fs::read(&source)?, b"png");
    Ok(())
  }

  #[test]
  fn ledger_deduplicates_original_paths() {
    let mut ledger = CopyLedger::default();
    let from = Path::new("/src/node_modules/pkg/a.png");
    let to = Path::new("/build/pkg/a.png");

    assert!(ledger.record(&relocation(from, to)));
    assert!(!ledger.record(&relocation(from, to)));

    let copier = RecordingCopier::default();
    let copied = ledger.copy_all(&copier).unwrap();
    assert_eq!(copied.len(), 1);
    assert_eq!(*copier.calls.borrow(), vec![(from.to_path_buf(), to.to_path_buf())]);
  }

  #[test]
  fn missing_source_reports_both_paths() {
    let temp = tempdir().unwrap();
    let from = temp.path().join("missing.png");
    let to = temp.path().join("out/missing.png");
    let mut ledger = CopyLedger::default();
    ledger.record(&relocation(&from, &to));

    match ledger.copy_all(&FsCopier) {
      Err(RebaseError::Copy { from: err_from, to: err_to, source }) => {
        assert_eq!(err_from, from);
        assert_eq!(err_to, to);
        assert_eq!(source.kind(), io::ErrorKind::NotFound);
      }
      other => panic!("expected copy error, got {other:?}"),
    }
  }
}
