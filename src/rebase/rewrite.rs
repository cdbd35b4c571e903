//! Substitution of remapped urls inside a declaration value.

use std::collections::BTreeMap;

use super::urls::UrlReference;

/// Original url path to new url path, scoped to one declaration value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplacementMap {
  urls: BTreeMap<String, String>,
}

impl ReplacementMap {
  /// Record a replacement. Later entries for the same key win.
  pub fn insert(&mut self, original: impl Into<String>, replacement: impl Into<String>) {
    self.urls.insert(original.into(), replacement.into());
  }

  /// Whether any replacement was recorded.
  pub fn is_empty(&self) -> bool {
    self.urls.is_empty()
  }

  /// Rewrite the paths of `references`, which were extracted from `value`.
  ///
  /// Only the path range of each reference whose path has a replacement is touched; quotes,
  /// suffixes, other urls and the text between them are kept byte for byte.
  pub fn apply(&self, value: &str, references: &[UrlReference]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut cursor = 0;
    for reference in references {
      let Some(replacement) = reference.path.as_ref().and_then(|path| self.urls.get(path)) else {
        continue;
      };
      let range = &reference.path_range;
      if range.start < cursor || value.get(range.clone()).is_none() {
        continue;
      }
      out.push_str(&value[cursor..range.start]);
      out.push_str(replacement);
      cursor = range.end;
    }
    out.push_str(&value[cursor..]);
    out
  }
}
