//! Rules and declarations tied back to the text they were parsed from.

use std::ops::Range;

use super::SyntaxError;

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
  /// Property name, including any vendor prefix.
  pub property: String,
  /// Value text exactly as written, `!important` included.
  pub value: String,
  span: Option<Range<usize>>,
}

impl Declaration {
  /// A declaration that does not come from any source text.
  pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      property: property.into(),
      value: value.into(),
      span: None,
    }
  }

  /// A declaration whose value occupies `span` in the stylesheet source.
  pub fn from_source(property: impl Into<String>, value: impl Into<String>, span: Range<usize>) -> Self {
    Self {
      property: property.into(),
      value: value.into(),
      span: Some(span),
    }
  }

  /// Byte range of the value in the stylesheet source.
  pub fn span(&self) -> Option<&Range<usize>> {
    self.span.as_ref()
  }
}

/// A top-level node of a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
  /// A rule with a declaration block, such as a style rule or `@font-face`.
  Block {
    /// Selector list or at-rule prelude preceding the block.
    prelude: String,
    /// Declarations in source order.
    declarations: Vec<Declaration>,
  },
  /// Any other node, kept as its source text.
  Opaque(String),
}

impl Rule {
  /// Build a declaration block rule.
  pub fn block(prelude: impl Into<String>, declarations: Vec<Declaration>) -> Self {
    Self::Block {
      prelude: prelude.into(),
      declarations,
    }
  }

  /// Declarations of the rule, or `None` for nodes without a declaration block.
  pub fn declarations(&self) -> Option<&[Declaration]> {
    match self {
      Self::Block { declarations, .. } => Some(declarations),
      Self::Opaque(_) => None,
    }
  }

  /// Mutable access to the rule's declarations.
  pub fn declarations_mut(&mut self) -> Option<&mut Vec<Declaration>> {
    match self {
      Self::Block { declarations, .. } => Some(declarations),
      Self::Opaque(_) => None,
    }
  }
}

/// An ordered list of rules plus the text they were parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
  source: String,
  rules: Vec<Rule>,
}

impl Stylesheet {
  /// Rules that do not come from any source text.
  pub fn new(rules: Vec<Rule>) -> Self {
    Self {
      source: String::new(),
      rules,
    }
  }

  /// Rules parsed out of `source`.
  pub fn from_source(source: impl Into<String>, rules: Vec<Rule>) -> Self {
    Self {
      source: source.into(),
      rules,
    }
  }

  /// Rules in source order.
  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  /// Mutable rules in source order.
  pub fn rules_mut(&mut self) -> &mut [Rule] {
    &mut self.rules
  }

  /// The source with every edited declaration value spliced back in.
  ///
  /// Bytes outside edited values, comments and formatting included, are copied verbatim.
  pub fn to_css(&self) -> Result<String, SyntaxError> {
    let mut edits: Vec<(&Range<usize>, &str)> = Vec::new();
    for declaration in self.rules.iter().filter_map(Rule::declarations).flatten() {
      let Some(span) = declaration.span() else {
        return Err(SyntaxError::new(format!(
          "declaration `{}` has no source position",
          declaration.property
        )));
      };
      let original = self.source.get(span.clone()).ok_or_else(|| {
        SyntaxError::new(format!(
          "declaration `{}` points outside the stylesheet source",
          declaration.property
        ))
      })?;
      if original != declaration.value {
        edits.push((span, &declaration.value));
      }
    }
    edits.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(self.source.len());
    let mut cursor = 0;
    for (span, value) in edits {
      if span.start < cursor {
        return Err(SyntaxError::new("overlapping declaration values"));
      }
      out.push_str(&self.source[cursor..span.start]);
      out.push_str(value);
      cursor = span.end;
    }
    out.push_str(&self.source[cursor..]);
    Ok(out)
  }
}
