//! The per-file transform: filter, extract, remap, copy, rewrite, serialize.

mod copier;
mod filter;
pub(crate) mod paths;
mod remap;
mod rewrite;
mod urls;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub use copier::{AssetCopier, CopiedAsset, CopyLedger, FsCopier};
pub use filter::filter_declarations;
pub use paths::{normalize, relative_path, to_url_path};
pub use remap::{AssetRelocation, RemapLayout};
pub use rewrite::ReplacementMap;
pub use urls::{UrlReference, extract_urls, is_external_url};

use crate::config::{RebaseConfig, RebaseOptions};
use crate::error::{RebaseError, RebaseResult, RebaseWarning};
use crate::file::SourceFile;
use crate::stylesheet::{CssSyntax, RawSyntax};

/// Non-fatal diagnostics collected while processing one stylesheet.
#[derive(Debug)]
pub struct Diagnostics {
  path: PathBuf,
  warnings: Vec<RebaseWarning>,
}

impl Diagnostics {
  /// Diagnostics for the stylesheet at `path`.
  pub fn new(path: &Path) -> Self {
    Self {
      path: path.to_path_buf(),
      warnings: Vec::new(),
    }
  }

  /// Stylesheet the diagnostics belong to.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Log and keep a warning.
  pub fn warn(&mut self, warning: RebaseWarning) {
    warn!("{warning}");
    self.warnings.push(warning);
  }

  /// Warnings in the order they were raised.
  pub fn into_warnings(self) -> Vec<RebaseWarning> {
    self.warnings
  }
}

/// Outcome of a successful transform.
#[derive(Debug)]
pub struct Rebased {
  /// The stylesheet, with rewritten contents when `modified` is set.
  pub file: SourceFile,
  /// Whether any declaration was rewritten.
  pub modified: bool,
  /// Assets copied for this stylesheet, one entry per distinct original path.
  pub copied: Vec<CopiedAsset>,
  /// Non-fatal diagnostics.
  pub warnings: Vec<RebaseWarning>,
}

/// Rewrites dependency `url()` references of stylesheets and copies the referenced assets.
///
/// The configuration is fixed at construction. Every call to [`AssetRebaser::transform`]
/// works on its own state, so one rebaser can process any number of files in sequence.
#[derive(Debug, Clone)]
pub struct AssetRebaser<S = RawSyntax, C = FsCopier> {
  config: RebaseConfig,
  syntax: S,
  copier: C,
}

impl AssetRebaser {
  /// Validate options and resolve them against the working directory.
  pub fn new(options: &RebaseOptions) -> RebaseResult<Self> {
    Ok(Self::from_config(options.resolve()?))
  }

  /// Rebaser for an already resolved configuration.
  pub fn from_config(config: RebaseConfig) -> Self {
    Self {
      config,
      syntax: RawSyntax,
      copier: FsCopier,
    }
  }
}

impl<S: CssSyntax, C: AssetCopier> AssetRebaser<S, C> {
  /// Replace the CSS backend.
  pub fn with_syntax<T: CssSyntax>(self, syntax: T) -> AssetRebaser<T, C> {
    AssetRebaser {
      config: self.config,
      syntax,
      copier: self.copier,
    }
  }

  /// Replace the copy primitive.
  pub fn with_copier<T: AssetCopier>(self, copier: T) -> AssetRebaser<S, T> {
    AssetRebaser {
      config: self.config,
      syntax: self.syntax,
      copier,
    }
  }

  /// The resolved configuration.
  pub fn config(&self) -> &RebaseConfig {
    &self.config
  }

  /// Rebase one stylesheet.
  ///
  /// Unmodified stylesheets are returned byte-identical. On error nothing is returned for the
  /// file; assets copied before a failing copy stay where they are.
  pub fn transform(&self, mut file: SourceFile) -> RebaseResult<Rebased> {
    let owner_dir = file.owner_dir()?.to_path_buf();
    let layout = RemapLayout::new(&self.config, &owner_dir, file.checked_relative()?);

    let text = std::str::from_utf8(&file.contents).map_err(|err| RebaseError::Parse {
      path: file.path.clone(),
      message: err.to_string(),
    })?;
    let mut stylesheet = self
      .syntax
      .parse(text, &file.path.to_string_lossy())
      .map_err(|err| RebaseError::Parse {
        path: file.path.clone(),
        message: err.to_string(),
      })?;

    let mut diagnostics = Diagnostics::new(&file.path);
    let mut ledger = CopyLedger::default();
    let mut modified = false;

    for declaration in filter_declarations(&mut stylesheet, self.config.marker(), &mut diagnostics) {
      let mut replacements = ReplacementMap::default();
      let references = extract_urls(&declaration.value);
      for reference in &references {
        let Some(url_path) = reference.path.as_deref() else {
          let path = diagnostics.path().to_path_buf();
          diagnostics.warn(RebaseWarning::MalformedUrl {
            path,
            token: reference.token.clone(),
          });
          continue;
        };
        let Some(relocation) = layout.relocate(url_path) else {
          continue;
        };
        ledger.record(&relocation);
        replacements.insert(relocation.original_url, relocation.new_url);
      }

      if !replacements.is_empty() {
        declaration.value = replacements.apply(&declaration.value, &references);
        modified = true;
      }
    }

    let warnings = diagnostics.into_warnings();
    if !modified {
      debug!(path = %file.path.display(), "no dependency references, forwarding unchanged");
      return Ok(Rebased {
        file,
        modified,
        copied: Vec::new(),
        warnings,
      });
    }

    let copied = ledger.copy_all(&self.copier)?;
    let css = self
      .syntax
      .stringify(&stylesheet)
      .map_err(|err| RebaseError::Serialization {
        path: file.path.clone(),
        message: err.to_string(),
      })?;
    file.contents = css.into_bytes();

    debug!(
      path = %file.path.display(),
      assets = copied.len(),
      "rewrote dependency references"
    );
    Ok(Rebased {
      file,
      modified,
      copied,
      warnings,
    })
  }
}
