//! Token stream wrapper for the hand-written parser.

use super::ParseError;
use pbk_ast::Span;
use pbk_lexer::Token;
use std::ops::Range;

/// Token stream with lookahead, backtracking and recovered-error collection.
///
/// Each token is paired with its byte span in the kernel source. Errors the
/// parser recovers from are pushed with [`TokenStream::report`] and drained
/// by the entry points once parsing finishes.
pub struct TokenStream<'src> {
    tokens: &'src [(Token, Range<usize>)],
    pos: usize,
    errors: Vec<ParseError>,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [(Token, Range<usize>)]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    pub fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the current one.
    pub fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token has the same kind as `expected`.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it has the kind of `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Expect a specific token and advance if it matches.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(ParseError::expected_token(
                expected,
                self.peek().cloned(),
                self.current_span(),
            ))
        }
    }

    /// Expect an identifier and return its name and span.
    pub fn expect_ident(&mut self, context: &str) -> Result<(String, Span), ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let span = self.current_span();
                self.advance();
                Ok((name.to_string(), span))
            }
            other => Err(ParseError::unexpected_token(
                other,
                &format!("expected identifier {context}"),
                self.current_span(),
            )),
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Return to an earlier position (speculative parsing).
    pub fn rewind(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    /// Byte range of the current token, without consuming it.
    pub fn current_range(&self) -> Option<&'src Range<usize>> {
        self.tokens.get(self.pos).map(|(_, range)| range)
    }

    /// Byte range of the most recently consumed token.
    pub fn previous_range(&self) -> Option<&'src Range<usize>> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, range)| range)
    }

    /// Span from the token at `start` to the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let Some((_, first)) = self.tokens.get(start) else {
            return self.current_span();
        };
        let end = match self.previous_range() {
            Some(last) if self.pos > start => last.end,
            _ => first.end,
        };
        Span::new(first.start as u32, end as u32)
    }

    /// Span of the current token; an empty span at the end of the last
    /// token once the stream is exhausted.
    pub fn current_span(&self) -> Span {
        if let Some((_, range)) = self.tokens.get(self.pos) {
            Span::from_range(range)
        } else if let Some((_, range)) = self.tokens.last() {
            Span::new(range.end as u32, range.end as u32)
        } else {
            Span::default()
        }
    }

    /// Record an error the parser recovered from.
    pub fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Skip to the end of the current statement for error recovery.
    ///
    /// Consumes through the next `;` outside braces, or through the `}` that
    /// closes a block opened while skipping. Stops before a `}` that closes
    /// the enclosing block so the caller can finish it.
    pub fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                Token::LBrace => depth += 1,
                Token::RBrace if depth == 0 => return,
                Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }
}
