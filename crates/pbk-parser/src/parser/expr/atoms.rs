//! Nullary expressions: literals, variables, calls, constructors, parens.

use super::parse_expr;
use crate::parser::{ParseError, TokenStream, types};
use pbk_ast::{Expr, ExprKind, Literal, StepOp};
use pbk_lexer::Token;

pub(super) fn parse_nullary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();

    let literal = |lit| Ok(Expr::new(ExprKind::Literal(lit), span));

    match stream.peek() {
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(Expr::new(
                ExprKind::Paren(Box::new(inner)),
                stream.span_from(start),
            ))
        }
        Some(token) if token.is_type_keyword() => {
            let ty = types::parse_type(stream)?;
            if !stream.check(&Token::LParen) {
                return Err(ParseError::unexpected_token(
                    stream.peek(),
                    &format!("after `{ty}`: expected `(` to construct a value"),
                    stream.current_span(),
                ));
            }
            let args = parse_arguments(stream)?;
            Ok(Expr::new(
                ExprKind::Construct { ty, args },
                stream.span_from(start),
            ))
        }
        Some(Token::Ident(name)) if matches!(stream.peek_nth(1), Some(Token::LParen)) => {
            stream.advance();
            let args = parse_arguments(stream)?;
            Ok(Expr::new(
                ExprKind::Call {
                    name: name.to_string(),
                    args,
                },
                stream.span_from(start),
            ))
        }
        Some(Token::Integer(n)) => {
            stream.advance();
            literal(Literal::Int(*n))
        }
        Some(Token::Number(x)) => {
            stream.advance();
            literal(Literal::Float(*x))
        }
        Some(Token::String(s)) => {
            stream.advance();
            literal(Literal::String(s.clone()))
        }
        Some(Token::True) => {
            stream.advance();
            literal(Literal::Bool(true))
        }
        Some(Token::False) => {
            stream.advance();
            literal(Literal::Bool(false))
        }
        Some(Token::Null) => {
            stream.advance();
            literal(Literal::Null)
        }
        Some(Token::Ident(_)) => {
            let variable = parse_variable(stream)?;
            let op = match stream.peek() {
                Some(Token::PlusPlus) => StepOp::Increment,
                Some(Token::MinusMinus) => StepOp::Decrement,
                _ => return Ok(variable),
            };
            stream.advance();
            Ok(Expr::new(
                ExprKind::Step {
                    op,
                    prefix: false,
                    target: Box::new(variable),
                },
                stream.span_from(start),
            ))
        }
        other => Err(ParseError::unexpected_token(other, "in expression", span)),
    }
}

/// `name`, `name.property` or `name[index]`.
pub(super) fn parse_variable(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let (name, span) = stream.expect_ident("in expression")?;
    let base = Box::new(Expr::new(ExprKind::Variable(name), span));

    let kind = if stream.eat(&Token::Dot) {
        let (property, _) = stream.expect_ident("after `.`")?;
        ExprKind::Property {
            base,
            name: property,
        }
    } else if stream.eat(&Token::LBracket) {
        let index = parse_expr(stream)?;
        stream.expect(Token::RBracket)?;
        ExprKind::Index {
            base,
            index: Box::new(index),
        }
    } else {
        return Ok(*base);
    };

    Ok(Expr::new(kind, stream.span_from(start)))
}

fn parse_arguments(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let mut args = Vec::new();
    if stream.eat(&Token::RParen) {
        return Ok(args);
    }
    loop {
        args.push(parse_expr(stream)?);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RParen)?;
    Ok(args)
}
