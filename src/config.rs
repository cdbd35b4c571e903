//! Construction options for the rebaser and their validation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{RebaseError, RebaseResult};
use crate::rebase::paths::normalize;

/// Dependency directory marker used when none is configured.
pub const DEFAULT_MARKER: &str = "node_modules";

/// Options file looked up by [`RebaseOptions::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "rebase.config.json";

/// Options as supplied by the caller, before path resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebaseOptions {
  /// Root directory that output stylesheet paths are computed relative to.
  pub dest: String,
  /// Root directory assets are copied into. Falls back to `dest`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assets: Option<String>,
  /// Path segment identifying the dependency directory. Falls back to [`DEFAULT_MARKER`].
  #[serde(skip_serializing_if = "Option::is_none")]
  pub marker: Option<String>,
}

/// Fully resolved, immutable configuration shared by every file of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseConfig {
  dest_root: PathBuf,
  assets_root: PathBuf,
  marker: String,
}

impl RebaseOptions {
  /// Options with only the required `dest` set.
  pub fn new(dest: impl Into<String>) -> Self {
    Self {
      dest: dest.into(),
      assets: None,
      marker: None,
    }
  }

  /// Copy assets into `assets` instead of `dest`.
  pub fn with_assets(mut self, assets: impl Into<String>) -> Self {
    self.assets = Some(assets.into());
    self
  }

  /// Use a dependency directory other than `node_modules`.
  pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
    self.marker = Some(marker.into());
    self
  }

  /// Validate a loosely typed options object, e.g. one read from JSON.
  pub fn from_value(value: Option<&Value>) -> RebaseResult<Self> {
    let Some(value) = value else {
      return Err(config_error("requires an options object"));
    };
    let Some(object) = value.as_object() else {
      return Err(config_error("requires an options object"));
    };

    let dest = match object.get("dest") {
      Some(Value::String(dest)) if !dest.is_empty() => dest.clone(),
      _ => return Err(config_error("requires a dest string")),
    };
    let assets = optional_string(object, "assets")?;
    let marker = optional_string(object, "marker")?;

    let options = Self { dest, assets, marker };
    options.validate()?;
    Ok(options)
  }

  /// Read options from a JSON file.
  pub fn from_path(path: &Path) -> RebaseResult<Self> {
    let content = fs::read_to_string(path)
      .map_err(|err| config_error(format!("failed to read {}: {}", path.display(), err)))?;
    let value: Value = serde_json::from_str(&content)
      .map_err(|err| config_error(format!("failed to parse {}: {}", path.display(), err)))?;
    Self::from_value(Some(&value))
  }

  /// Look for [`DEFAULT_CONFIG_FILE`] in `dir`. A missing file is not an error.
  pub fn discover(dir: &Path) -> RebaseResult<Option<Self>> {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    match fs::metadata(&candidate) {
      Ok(_) => Self::from_path(&candidate).map(Some),
      Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
      Err(err) => Err(config_error(format!(
        "failed to inspect {}: {}",
        candidate.display(),
        err
      ))),
    }
  }

  /// Resolve relative roots against the current working directory.
  pub fn resolve(&self) -> RebaseResult<RebaseConfig> {
    let cwd = std::env::current_dir()
      .map_err(|err| config_error(format!("failed to read the working directory: {err}")))?;
    self.resolve_from(&cwd)
  }

  /// Resolve relative roots against `base`.
  ///
  /// `dest` and `assets` are both taken relative to `base`, so `dest = build` with
  /// `assets = build/assets` places assets inside the destination tree.
  pub fn resolve_from(&self, base: &Path) -> RebaseResult<RebaseConfig> {
    self.validate()?;
    let dest_root = normalize(&base.join(&self.dest));
    let assets_root = match &self.assets {
      Some(assets) if !assets.is_empty() => normalize(&base.join(assets)),
      _ => dest_root.clone(),
    };
    Ok(RebaseConfig {
      dest_root,
      assets_root,
      marker: self.marker.clone().unwrap_or_else(|| DEFAULT_MARKER.to_string()),
    })
  }

  fn validate(&self) -> RebaseResult<()> {
    if self.dest.is_empty() {
      return Err(config_error("requires a dest string"));
    }
    if let Some(marker) = &self.marker {
      if marker.is_empty() || marker.contains(['/', '\\']) {
        return Err(config_error("the marker option must be a single path segment"));
      }
    }
    Ok(())
  }
}

impl RebaseConfig {
  /// Root that rewritten stylesheet locations are computed under.
  pub fn dest_root(&self) -> &Path {
    &self.dest_root
  }

  /// Root copied assets are placed under.
  pub fn assets_root(&self) -> &Path {
    &self.assets_root
  }

  /// Dependency directory marker.
  pub fn marker(&self) -> &str {
    &self.marker
  }
}

fn optional_string(object: &Map<String, Value>, key: &str) -> RebaseResult<Option<String>> {
  match object.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(value)) => Ok(Some(value.clone())),
    Some(_) => Err(config_error(format!("the {key} option must be a string"))),
  }
}

fn config_error(message: impl Into<String>) -> RebaseError {
  RebaseError::Configuration(message.into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::tempdir;

  #[test]
  fn requires_an_options_object() {
    assert!(matches!(
      RebaseOptions::from_value(None),
      Err(RebaseError::Configuration(_))
    ));
    assert!(matches!(
      RebaseOptions::from_value(Some(&json!("build"))),
      Err(RebaseError::Configuration(_))
    ));
  }

  #[test]
  fn requires_dest_string() {
    for value in [json!({}), json!({ "dest": 3 }), json!({ "dest": "" })] {
      let err = RebaseOptions::from_value(Some(&value)).unwrap_err();
      assert!(err.to_string().contains("dest"), "{err}");
    }
  }

  #[test]
  fn rejects_non_string_assets() {
    let err = RebaseOptions::from_value(Some(&json!({ "dest": "build", "assets": true }))).unwrap_err();
    assert!(err.to_string().contains("assets option must be a string"));
  }

  #[test]
  fn assets_default_to_dest() {
    let options = RebaseOptions::from_value(Some(&json!({ "dest": "build" }))).unwrap();
    let config = options.resolve_from(Path::new("/project")).unwrap();
    assert_eq!(config.dest_root(), Path::new("/project/build"));
    assert_eq!(config.assets_root(), Path::new("/project/build"));
    assert_eq!(config.marker(), DEFAULT_MARKER);
  }

  #[test]
  fn resolves_assets_against_base() {
    let options = RebaseOptions::new("build").with_assets("build/assets");
    let config = options.resolve_from(Path::new("/project")).unwrap();
    assert_eq!(config.assets_root(), Path::new("/project/build/assets"));
  }

  #[test]
  fn rejects_marker_with_separators() {
    let options = RebaseOptions::new("build").with_marker("vendor/libs");
    assert!(options.resolve_from(Path::new("/project")).is_err());
  }

  #[test]
  fn discovers_config_file() {
    let dir = tempdir().unwrap();
    assert_eq!(RebaseOptions::discover(dir.path()).unwrap(), None);

    fs::write(
      dir.path().join(DEFAULT_CONFIG_FILE),
      r#"{ "dest": "out", "marker": "bower_components" }"#,
    )
    .unwrap();
    let options = RebaseOptions::discover(dir.path()).unwrap().unwrap();
    assert_eq!(options, RebaseOptions::new("out").with_marker("bower_components"));
  }
}
