//! Stylesheet backend built on the `cssparser` tokenizer.
//!
//! Only the top level of the sheet and the bodies of declaration at-rules are broken into
//! declarations. Each declaration remembers the byte range of its value so printing can
//! splice edits back into the untouched source.

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, SourcePosition, Token};

use super::{CssSyntax, Declaration, Rule, Stylesheet, SyntaxError};

type Failure<'i> = ParseError<'i, String>;

/// At-rules whose block holds declarations rather than nested rules.
const BLOCK_AT_RULES: [&str; 2] = ["font-face", "page"];

/// [`CssSyntax`] that keeps every byte it does not edit.
///
/// Parsing is forgiving inside declaration blocks: items that are not `name: value` pairs
/// (legacy hacks such as `*zoom: 1`, nested rules) are skipped and printed as written.
/// Broken rule structure, such as a stray `}` or a selector with no block, is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSyntax;

impl CssSyntax for RawSyntax {
  fn parse(&self, source: &str, filename: &str) -> Result<Stylesheet, SyntaxError> {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let rules = parse_rules(&mut parser).map_err(|err| describe(err, filename))?;
    Ok(Stylesheet::from_source(source, rules))
  }

  fn stringify(&self, stylesheet: &Stylesheet) -> Result<String, SyntaxError> {
    stylesheet.to_css()
  }
}

fn parse_rules<'i>(parser: &mut Parser<'i, '_>) -> Result<Vec<Rule>, Failure<'i>> {
  let mut rules = Vec::new();
  loop {
    let start = parser.position();
    let token = match parser.next_including_whitespace_and_comments().cloned() {
      Ok(token) => token,
      Err(_) => return Ok(rules),
    };
    match token {
      Token::WhiteSpace(_) | Token::Comment(_) | Token::CDO | Token::CDC => {}
      Token::CloseCurlyBracket => return Err(parser.new_custom_error("unexpected `}`".to_string())),
      Token::CurlyBracketBlock => return Err(parser.new_custom_error("missing selector".to_string())),
      Token::AtKeyword(name) => rules.push(parse_at_rule(parser, &name, start)?),
      token => {
        finish_nested(parser, &token);
        rules.push(parse_qualified_rule(parser, start)?);
      }
    }
  }
}

fn parse_qualified_rule<'i>(parser: &mut Parser<'i, '_>, start: SourcePosition) -> Result<Rule, Failure<'i>> {
  loop {
    let before = parser.position();
    match parser.next_including_whitespace_and_comments().cloned() {
      Ok(Token::CurlyBracketBlock) => {
        let prelude = parser.slice(start..before).trim().to_string();
        let declarations = parser.parse_nested_block(parse_declarations)?;
        return Ok(Rule::block(prelude, declarations));
      }
      Ok(Token::CloseCurlyBracket) => return Err(parser.new_custom_error("unexpected `}`".to_string())),
      Ok(token) => finish_nested(parser, &token),
      Err(_) => return Err(parser.new_custom_error("missing `{` after selector".to_string())),
    }
  }
}

fn parse_at_rule<'i>(parser: &mut Parser<'i, '_>, name: &str, start: SourcePosition) -> Result<Rule, Failure<'i>> {
  loop {
    let before = parser.position();
    match parser.next_including_whitespace_and_comments().cloned() {
      Ok(Token::Semicolon) | Err(_) => return Ok(Rule::Opaque(parser.slice_from(start).to_string())),
      Ok(Token::CloseCurlyBracket) => return Err(parser.new_custom_error("unexpected `}`".to_string())),
      Ok(Token::CurlyBracketBlock) => {
        if BLOCK_AT_RULES.iter().any(|known| name.eq_ignore_ascii_case(known)) {
          let prelude = parser.slice(start..before).trim().to_string();
          let declarations = parser.parse_nested_block(parse_declarations)?;
          return Ok(Rule::block(prelude, declarations));
        }
        parser.parse_nested_block(drain)?;
        return Ok(Rule::Opaque(parser.slice_from(start).to_string()));
      }
      Ok(token) => finish_nested(parser, &token),
    }
  }
}

fn parse_declarations<'i>(parser: &mut Parser<'i, '_>) -> Result<Vec<Declaration>, Failure<'i>> {
  let mut declarations = Vec::new();
  loop {
    let token = match parser.next_including_whitespace_and_comments().cloned() {
      Ok(token) => token,
      Err(_) => return Ok(declarations),
    };
    match token {
      Token::WhiteSpace(_) | Token::Comment(_) | Token::Semicolon => {}
      Token::Ident(name) => {
        if let Some(declaration) = parse_declaration(parser, &name) {
          declarations.push(declaration);
        }
      }
      Token::CurlyBracketBlock => {}
      _ => skip_item(parser),
    }
  }
}

/// Parse the rest of a declaration whose name was just consumed. `None` when the item turns
/// out not to be a declaration; it is consumed either way.
fn parse_declaration(parser: &mut Parser<'_, '_>, name: &str) -> Option<Declaration> {
  loop {
    match parser.next_including_whitespace_and_comments().cloned() {
      Ok(Token::WhiteSpace(_) | Token::Comment(_)) => {}
      Ok(Token::Colon) => break,
      Ok(Token::Semicolon) | Err(_) => return None,
      Ok(Token::CurlyBracketBlock) => return None,
      Ok(_) => {
        skip_item(parser);
        return None;
      }
    }
  }

  let start = parser.position();
  let end = loop {
    let before = parser.position();
    match parser.next_including_whitespace_and_comments().cloned() {
      Ok(Token::Semicolon) | Err(_) => break before,
      // `a:hover { ... }` nested inside a block
      Ok(Token::CurlyBracketBlock) => return None,
      Ok(token) => finish_nested(parser, &token),
    }
  };

  let raw = parser.slice(start..end);
  let value = raw.trim();
  let offset = start.byte_index() + (raw.len() - raw.trim_start().len());
  Some(Declaration::from_source(name, value, offset..offset + value.len()))
}

/// Consume tokens up to the end of the current item: a `;` or a `{}` block.
fn skip_item(parser: &mut Parser<'_, '_>) {
  loop {
    match parser.next_including_whitespace_and_comments() {
      Ok(Token::Semicolon | Token::CurlyBracketBlock) | Err(_) => return,
      Ok(_) => {}
    }
  }
}

/// Consume the contents of a block that `token` just opened, so that `position()` points
/// past its closing delimiter.
fn finish_nested(parser: &mut Parser<'_, '_>, token: &Token<'_>) {
  if matches!(
    token,
    Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock
  ) {
    let _ = parser.parse_nested_block(drain);
  }
}

fn drain<'i>(parser: &mut Parser<'i, '_>) -> Result<(), Failure<'i>> {
  while parser.next_including_whitespace_and_comments().is_ok() {}
  Ok(())
}

fn describe(err: Failure<'_>, filename: &str) -> SyntaxError {
  let message = match err.kind {
    ParseErrorKind::Basic(kind) => kind.to_string(),
    ParseErrorKind::Custom(message) => message,
  };
  SyntaxError::new(format!(
    "{message} at {filename}:{}:{}",
    err.location.line + 1,
    err.location.column
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(source: &str) -> Stylesheet {
    RawSyntax.parse(source, "test.css").expect("parses")
  }

  #[test]
  fn exposes_declarations_with_raw_values() {
    let sheet = parse(".a { color: #FF0000; background: url( 'x.png' ) no-repeat !important }");
    let declarations = sheet.rules()[0].declarations().unwrap();
    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[0].property, "color");
    assert_eq!(declarations[0].value, "#FF0000");
    assert_eq!(declarations[1].value, "url( 'x.png' ) no-repeat !important");
  }

  #[test]
  fn splicing_keeps_comments_and_quotes() {
    let source = "/* banner */\n.a {\n  background: url(\"x.png\"); /* why */\n  color: red\n}\n";
    let mut sheet = parse(source);
    assert_eq!(sheet.to_css().unwrap(), source);

    sheet.rules_mut()[0].declarations_mut().unwrap()[0].value = "url(\"y/x.png\")".into();
    assert_eq!(
      RawSyntax.stringify(&sheet).unwrap(),
      "/* banner */\n.a {\n  background: url(\"y/x.png\"); /* why */\n  color: red\n}\n"
    );
  }

  #[test]
  fn tolerates_legacy_property_hacks() {
    let sheet = parse(".a { *zoom: 1; _height: 1px; background: url(x.png) }");
    let declarations = sheet.rules()[0].declarations().unwrap();
    let properties: Vec<&str> = declarations.iter().map(|d| d.property.as_str()).collect();
    assert_eq!(properties, ["_height", "background"]);
  }

  #[test]
  fn nested_rules_are_skipped() {
    let sheet = parse(".a { color: red; &:hover { color: blue } a:focus { color: green } margin: 0 }");
    let declarations = sheet.rules()[0].declarations().unwrap();
    let properties: Vec<&str> = declarations.iter().map(|d| d.property.as_str()).collect();
    assert_eq!(properties, ["color", "margin"]);
  }

  #[test]
  fn keeps_other_at_rules_opaque() {
    let sheet = parse("@import 'x.css';\n@media print { .a { color: red } }\n.b { color: blue }");
    assert_eq!(sheet.rules().len(), 3);
    assert_eq!(sheet.rules()[0], Rule::Opaque("@import 'x.css';".into()));
    assert_eq!(sheet.rules()[1], Rule::Opaque("@media print { .a { color: red } }".into()));
    assert_eq!(sheet.rules()[2].declarations().unwrap()[0].value, "blue");
  }

  #[test]
  fn font_face_exposes_declarations() {
    let sheet = parse("@font-face { font-family: X; src: url(x.woff2) format('woff2') }");
    match &sheet.rules()[0] {
      Rule::Block { prelude, declarations } => {
        assert_eq!(prelude, "@font-face");
        assert_eq!(declarations[1].value, "url(x.woff2) format('woff2')");
      }
      other => panic!("unexpected rule {other:?}"),
    }
  }

  #[test]
  fn empty_sheet_has_no_rules() {
    assert!(parse(" /* nothing */ ").rules().is_empty());
  }

  #[test]
  fn stray_closing_brace_is_an_error() {
    let err = RawSyntax.parse("a { color: red } }", "broken.css").unwrap_err();
    assert!(err.to_string().contains("broken.css:1:"), "{err}");
  }

  #[test]
  fn selector_without_block_is_an_error() {
    assert!(RawSyntax.parse("a, b", "broken.css").is_err());
    assert!(RawSyntax.parse("{ color: red }", "broken.css").is_err());
  }
}
