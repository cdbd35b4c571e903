//! Extraction of `url(...)` tokens from declaration values.

use std::ops::Range;
use std::sync::OnceLock;

use cssparser::{ParseError, Parser, ParserInput, Token};
use regex::Regex;

/// One `url(...)` occurrence inside a declaration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlReference {
  /// The whole token, wrapper and quotes included.
  pub token: String,
  /// The path component, or `None` when the token carries no path.
  pub path: Option<String>,
  /// Trailing `?query` and/or `#fragment`, which is not part of the path.
  pub suffix: Option<String>,
  /// Byte range of the path inside the declaration value.
  pub path_range: Range<usize>,
}

impl UrlReference {
  fn new(token: &str, text: &str, offset: usize) -> Self {
    let cut = text.find(['?', '#']).unwrap_or(text.len());
    let path = (cut > 0).then(|| text[..cut].to_string());
    let suffix = (cut < text.len()).then(|| text[cut..].to_string());
    Self {
      token: token.to_string(),
      path,
      suffix,
      path_range: offset..offset + cut,
    }
  }

  fn malformed(token: &str, offset: usize) -> Self {
    Self {
      token: token.to_string(),
      path: None,
      suffix: None,
      path_range: offset..offset,
    }
  }
}

fn external_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.-]+:|//)").expect("invalid external url regex")
  })
}

/// Every `url(...)` token in `value`, in order of appearance, nested functions included.
///
/// Strings and comments that merely contain `url(` are not references.
pub fn extract_urls(value: &str) -> Vec<UrlReference> {
  let mut input = ParserInput::new(value);
  let mut parser = Parser::new(&mut input);
  let mut urls = Vec::new();
  collect(&mut parser, &mut urls);
  urls
}

fn collect(parser: &mut Parser<'_, '_>, urls: &mut Vec<UrlReference>) {
  loop {
    let start = parser.position();
    let token = match parser.next_including_whitespace_and_comments().cloned() {
      Ok(token) => token,
      Err(_) => return,
    };
    match token {
      Token::UnquotedUrl(_) => {
        let token = parser.slice_from(start);
        let open = token.find('(').map_or(token.len(), |index| index + 1);
        let close = token.strip_suffix(')').unwrap_or(token).len().max(open);
        let inner = &token[open..close];
        let leading = inner.len() - inner.trim_start().len();
        urls.push(UrlReference::new(token, inner.trim(), start.byte_index() + open + leading));
      }
      Token::BadUrl(_) => urls.push(UrlReference::malformed(parser.slice_from(start), start.byte_index())),
      Token::Function(name) if name.eq_ignore_ascii_case("url") => {
        let mut quoted = None;
        let _ = parser.parse_nested_block(|nested| {
          quoted = quoted_argument(nested);
          Ok::<(), ParseError<'_, ()>>(())
        });
        let token = parser.slice_from(start);
        urls.push(match quoted {
          Some((text, offset)) => UrlReference::new(token, &text, offset),
          None => UrlReference::malformed(token, start.byte_index()),
        });
      }
      Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
        let _ = parser.parse_nested_block(|nested| {
          collect(nested, urls);
          Ok::<(), ParseError<'_, ()>>(())
        });
      }
      _ => {}
    }
  }
}

/// Raw text between the quotes of the string argument of `url("...")`, with its offset.
fn quoted_argument(parser: &mut Parser<'_, '_>) -> Option<(String, usize)> {
  let mut found = None;
  loop {
    let start = parser.position();
    let is_string = match parser.next_including_whitespace_and_comments() {
      Ok(token) => matches!(token, Token::QuotedString(_)),
      Err(_) => return found,
    };
    if is_string && found.is_none() {
      let raw = parser.slice_from(start);
      let quote = raw.chars().next().unwrap_or('"');
      let inner = raw[1..].strip_suffix(quote).unwrap_or(&raw[1..]);
      let leading = inner.len() - inner.trim_start().len();
      found = Some((inner.trim().to_string(), start.byte_index() + 1 + leading));
    }
  }
}

/// Whether a url points off the local filesystem (`https:`, `data:`, `//cdn`, ...).
pub fn is_external_url(path: &str) -> bool {
  external_pattern().is_match(path)
}
