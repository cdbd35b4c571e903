//! Lexical path arithmetic shared by the remapper and configuration.
//!
//! Nothing here touches the filesystem: dependency trees are resolved purely by their
//! relative spelling, the way the stylesheet author wrote them.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// `..` at the root is dropped; leading `..` on a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match out.components().next_back() {
        Some(Component::Normal(_)) => {
          out.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => out.push(".."),
      },
      other => out.push(other.as_os_str()),
    }
  }
  out
}

/// Join a url path onto a directory the way a browser resolves it against the stylesheet:
/// a leading `/` does not reset to the filesystem root.
pub fn join_url_path(dir: &Path, url_path: &str) -> PathBuf {
  normalize(&dir.join(url_path.trim_start_matches('/')))
}

/// Path that leads from directory `from` to `to`. Both should be normalized.
///
/// Returns `to` unchanged when the two paths share no root (different Windows prefixes).
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
  let from: Vec<Component<'_>> = from.components().collect();
  let to_components: Vec<Component<'_>> = to.components().collect();

  let differing_roots = from.first() != to_components.first()
    && (from.first().is_some_and(is_root) || to_components.first().is_some_and(is_root));
  if differing_roots {
    return to.to_path_buf();
  }

  let shared = from
    .iter()
    .zip(to_components.iter())
    .take_while(|(left, right)| left == right)
    .count();

  let mut out = PathBuf::new();
  for _ in shared..from.len() {
    out.push("..");
  }
  for component in &to_components[shared..] {
    out.push(component.as_os_str());
  }
  out
}

/// Render a path for CSS text: always forward slashes, whatever the host separator.
pub fn to_url_path(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

fn is_root(component: &Component<'_>) -> bool {
  matches!(component, Component::RootDir | Component::Prefix(_))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalizes_parent_and_current_components() {
    assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    assert_eq!(normalize(Path::new("../a/../../b")), PathBuf::from("../../b"));
  }

  #[test]
  fn joins_url_paths_relative_to_directory() {
    assert_eq!(
      join_url_path(Path::new("/src/css"), "../node_modules/pkg/img.png"),
      PathBuf::from("/src/node_modules/pkg/img.png")
    );
    assert_eq!(
      join_url_path(Path::new("/src"), "/node_modules/pkg/img.png"),
      PathBuf::from("/src/node_modules/pkg/img.png")
    );
  }

  #[test]
  fn computes_relative_paths() {
    assert_eq!(
      relative_path(Path::new("/build"), Path::new("/build/assets/pkg/img.png")),
      PathBuf::from("assets/pkg/img.png")
    );
    assert_eq!(
      relative_path(Path::new("/build/css/deep"), Path::new("/build/assets/pkg/img.png")),
      PathBuf::from("../../assets/pkg/img.png")
    );
    assert_eq!(relative_path(Path::new("/build"), Path::new("/build")), PathBuf::new());
  }

  #[test]
  fn url_paths_use_forward_slashes() {
    assert_eq!(to_url_path(Path::new("assets\\pkg\\img.png")), "assets/pkg/img.png");
  }
}
