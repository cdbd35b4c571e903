//! Path remapping between the source tree, the dependency directory and the output layout.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::RebaseConfig;

use super::paths::{join_url_path, normalize, relative_path, to_url_path};
use super::urls::is_external_url;

/// Where one dependency asset comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRelocation {
  /// Path text as written in the stylesheet.
  pub original_url: String,
  /// Resolved location of the asset next to the source stylesheet.
  pub original_asset_path: PathBuf,
  /// Resolved location of the dependency directory the asset lives in.
  pub dependency_root: PathBuf,
  /// Location of the asset under the assets root.
  pub new_asset_path: PathBuf,
  /// Reference to the new asset from the rewritten stylesheet, `/`-separated.
  pub new_url: String,
}

/// Layout of a single stylesheet: where it is read from and where it will be written.
#[derive(Debug, Clone)]
pub struct RemapLayout<'a> {
  owner_dir: PathBuf,
  stylesheet_dir: PathBuf,
  assets_root: &'a Path,
  marker: &'a str,
}

impl<'a> RemapLayout<'a> {
  /// Layout for a stylesheet in `owner_dir` that lands at `dest_root/relative`.
  pub fn new(config: &'a RebaseConfig, owner_dir: &Path, relative: &Path) -> Self {
    let new_stylesheet_path = normalize(&config.dest_root().join(relative));
    let stylesheet_dir = new_stylesheet_path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| config.dest_root().to_path_buf());

    Self {
      owner_dir: normalize(owner_dir),
      stylesheet_dir,
      assets_root: config.assets_root(),
      marker: config.marker(),
    }
  }

  /// Remap a url path, or `None` when it does not point into the dependency directory.
  ///
  /// The marker must be a whole path segment: `node_modules/pkg/a.png` is relocated, while
  /// `my_node_modules/a.png` or `node_modules.png` are left untouched even though the
  /// declaration was selected for containing the marker text.
  pub fn relocate(&self, url_path: &str) -> Option<AssetRelocation> {
    if is_external_url(url_path) {
      return None;
    }
    let marker_end = marker_segment_end(url_path, self.marker)?;

    let dependency_root = join_url_path(&self.owner_dir, &url_path[..marker_end]);
    let original_asset_path = join_url_path(&self.owner_dir, url_path);
    let inside_dependency = original_asset_path.strip_prefix(&dependency_root).ok()?;
    if inside_dependency.as_os_str().is_empty() {
      return None;
    }

    let new_asset_path = normalize(&self.assets_root.join(inside_dependency));
    let new_url = to_url_path(&relative_path(&self.stylesheet_dir, &new_asset_path));

    debug!(
      url = url_path,
      from = %original_asset_path.display(),
      to = %new_asset_path.display(),
      "remapped dependency asset"
    );

    Some(AssetRelocation {
      original_url: url_path.to_string(),
      original_asset_path,
      dependency_root,
      new_asset_path,
      new_url,
    })
  }
}

/// Byte offset just past the first path segment equal to `marker`. Substring matches inside
/// a longer segment do not count.
fn marker_segment_end(url_path: &str, marker: &str) -> Option<usize> {
  url_path.match_indices(marker).find_map(|(start, _)| {
    let end = start + marker.len();
    let starts_segment = start == 0 || url_path[..start].ends_with(['/', '\\']);
    let ends_segment = end == url_path.len() || url_path[end..].starts_with(['/', '\\']);
    (starts_segment && ends_segment).then_some(end)
  })
}
