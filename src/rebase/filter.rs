//! Selection of declarations that mention the dependency directory.

use crate::error::RebaseWarning;
use crate::stylesheet::{Declaration, Stylesheet};

use super::Diagnostics;

/// Declarations of block rules whose value contains `marker`, in source order.
///
/// Rules without a declaration block and declarations with an empty value are skipped. A
/// stylesheet without any rules produces a [`RebaseWarning::NoRules`] diagnostic.
pub fn filter_declarations<'a>(
  stylesheet: &'a mut Stylesheet,
  marker: &str,
  diagnostics: &mut Diagnostics,
) -> Vec<&'a mut Declaration> {
  if stylesheet.rules().is_empty() {
    let path = diagnostics.path().to_path_buf();
    diagnostics.warn(RebaseWarning::NoRules { path });
    return Vec::new();
  }

  stylesheet
    .rules_mut()
    .iter_mut()
    .filter_map(|rule| rule.declarations_mut())
    .flat_map(|declarations| declarations.iter_mut())
    .filter(|declaration| !declaration.value.is_empty() && declaration.value.contains(marker))
    .collect()
}
