//! `#define` extraction and the macro grammar.
//!
//! ```text
//! macro → Identifier ('(' Identifier (',' Identifier)* ')')? expression
//! ```
//!
//! A parameter list is only recognised when `(` directly follows the macro
//! name; `#define HALF (0.5)` is a constant whose body is parenthesized.

use super::expr::parse_expr;
use super::{ParseError, TokenStream};
use pbk_ast::{Macro, Span};
use pbk_lexer::{LexError, Token, tokenize};
use std::ops::Range;
use tracing::{debug, warn};

/// Result of parsing one `#define` directive.
#[derive(Debug, Clone)]
pub struct MacroParse {
    /// Full directive text, `#define` included.
    pub directive: String,
    pub span: Span,
    /// `None` when the body failed to parse.
    pub definition: Option<Macro>,
    pub lex_errors: Vec<LexError>,
    pub parse_errors: Vec<ParseError>,
}

/// Parse every `#define` among `directives`; other directives are ignored.
pub fn parse_directives(directives: &[(String, Range<usize>)]) -> Vec<MacroParse> {
    let mut macros = Vec::new();
    for (text, range) in directives {
        match define_body(text) {
            Some(body_offset) => {
                let offset = range.start + body_offset;
                let mut parsed = parse_macro(&text[body_offset..], offset);
                parsed.directive = text.clone();
                parsed.span = Span::from_range(range);
                macros.push(parsed);
            }
            None => warn!(directive = %text.trim_end(), "ignoring preprocessor directive"),
        }
    }
    macros
}

/// Byte offset of the text after `#define` and its separating whitespace.
fn define_body(text: &str) -> Option<usize> {
    let after_hash = text.strip_prefix('#')?;
    let keyword = after_hash.trim_start_matches([' ', '\t']);
    let rest = keyword.strip_prefix("define")?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let body = rest.trim_start_matches([' ', '\t']);
    Some(text.len() - body.len())
}

/// Parse a macro definition (`NAME(a, b) body`) whose text starts at byte
/// `offset` of the kernel source. Reported spans are relative to the
/// kernel source.
pub fn parse_macro(text: &str, offset: usize) -> MacroParse {
    let lexed = tokenize(text);
    let shift = |range: &Range<usize>| range.start + offset..range.end + offset;

    let tokens: Vec<(Token, Range<usize>)> = lexed
        .tokens
        .iter()
        .map(|(token, range)| (token.clone(), shift(range)))
        .collect();
    let lex_errors = lexed
        .errors
        .into_iter()
        .map(|e| LexError {
            span: shift(&e.span),
            text: e.text,
        })
        .collect();

    let mut stream = TokenStream::new(&tokens);
    let definition = match parse_definition(&mut stream) {
        Ok(definition) => Some(definition),
        Err(e) => {
            stream.report(e);
            None
        }
    };
    if let Some(definition) = &definition {
        debug!(name = %definition.name, arity = definition.arity(), "parsed macro");
    }

    MacroParse {
        directive: text.to_string(),
        span: Span::new(offset as u32, (offset + text.len()) as u32),
        definition,
        lex_errors,
        parse_errors: stream.take_errors(),
    }
}

fn parse_definition(stream: &mut TokenStream) -> Result<Macro, ParseError> {
    let start = stream.current_pos();
    let (name, _) = stream.expect_ident("as macro name")?;

    let adjacent_paren = matches!(stream.peek(), Some(Token::LParen))
        && matches!(
            (stream.previous_range(), stream.current_range()),
            (Some(prev), Some(next)) if prev.end == next.start
        );

    let params = if adjacent_paren {
        stream.advance();
        let mut params = Vec::new();
        if !stream.check(&Token::RParen) {
            loop {
                let (param, span) = stream.expect_ident("as macro parameter")?;
                if params.contains(&param) {
                    return Err(ParseError::invalid_syntax(
                        format!("duplicate macro parameter `{param}`"),
                        span,
                    ));
                }
                params.push(param);
                if !stream.eat(&Token::Comma) {
                    break;
                }
            }
        }
        stream.expect(Token::RParen)?;
        Some(params)
    } else {
        None
    };

    let body = parse_expr(stream)?;
    if !stream.at_end() {
        return Err(ParseError::unexpected_token(
            stream.peek(),
            "after macro body",
            stream.current_span(),
        ));
    }

    Ok(Macro {
        name,
        params,
        body,
        span: stream.span_from(start),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbk_ast::ExprKind;

    #[test]
    fn test_define_body_offset() {
        assert_eq!(define_body("#define PI 3.14"), Some(8));
        assert_eq!(define_body("#  define\tX 1"), Some(10));
        assert_eq!(define_body("#ifdef X"), None);
        assert_eq!(define_body("#defineX 1"), None);
    }

    #[test]
    fn test_constant_macro() {
        let parsed = parse_macro("PI 3.14159", 0);
        let def = parsed.definition.unwrap();
        assert_eq!(def.name, "PI");
        assert!(def.params.is_none());
        assert!(parsed.parse_errors.is_empty());
    }

    #[test]
    fn test_parameterized_macro() {
        let parsed = parse_macro("SQR(x) ((x) * (x))", 0);
        let def = parsed.definition.unwrap();
        assert_eq!(def.params, Some(vec!["x".to_string()]));
        assert!(matches!(def.body.kind, ExprKind::Paren(_)));
    }

    #[test]
    fn test_space_before_paren_is_body() {
        let parsed = parse_macro("HALF (0.5)", 0);
        let def = parsed.definition.unwrap();
        assert!(def.params.is_none());
        assert!(matches!(def.body.kind, ExprKind::Paren(_)));
    }

    #[test]
    fn test_spans_are_shifted() {
        let parsed = parse_macro("K 1.0 2.0", 100);
        assert!(parsed.definition.is_none());
        let error = &parsed.parse_errors[0];
        assert_eq!(error.span.start, 106);
    }
}
