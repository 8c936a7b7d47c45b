//! Assignment, ternary, binary and unary levels.

use super::atoms::{parse_nullary, parse_variable};
use super::parse_expr;
use crate::parser::{ParseError, TokenStream};
use pbk_ast::{AssignOp, BinaryOp, Expr, ExprKind, StepOp, UnaryOp};
use pbk_lexer::Token;

fn assign_op(token: &Token) -> Option<AssignOp> {
    match token {
        Token::Eq => Some(AssignOp::Assign),
        Token::PlusEq => Some(AssignOp::Add),
        Token::MinusEq => Some(AssignOp::Sub),
        Token::StarEq => Some(AssignOp::Mul),
        Token::SlashEq => Some(AssignOp::Div),
        _ => None,
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    match token {
        Token::Plus => Some(BinaryOp::Add),
        Token::Minus => Some(BinaryOp::Sub),
        Token::Star => Some(BinaryOp::Mul),
        Token::Slash => Some(BinaryOp::Div),
        Token::Lt => Some(BinaryOp::Lt),
        Token::Gt => Some(BinaryOp::Gt),
        Token::LtEq => Some(BinaryOp::Le),
        Token::GtEq => Some(BinaryOp::Ge),
        Token::EqEq => Some(BinaryOp::Eq),
        Token::BangEq => Some(BinaryOp::Ne),
        Token::AndAnd => Some(BinaryOp::And),
        Token::OrOr => Some(BinaryOp::Or),
        Token::CaretCaret => Some(BinaryOp::Xor),
        _ => None,
    }
}

/// `lvalue op ternary` when the lookahead finds an assignment operator after
/// a variable, otherwise a plain ternary.
pub(super) fn parse_assignment(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();

    if matches!(stream.peek(), Some(Token::Ident(_)))
        && !matches!(stream.peek_nth(1), Some(Token::LParen))
    {
        if let Ok(target) = parse_variable(stream)
            && let Some(op) = stream.peek().and_then(assign_op)
        {
            stream.advance();
            let value = parse_ternary(stream)?;
            return Ok(Expr::new(
                ExprKind::Assign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
                stream.span_from(start),
            ));
        }
        stream.rewind(start);
    }

    parse_ternary(stream)
}

fn parse_ternary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let condition = parse_binary(stream)?;

    if !stream.eat(&Token::Question) {
        return Ok(condition);
    }

    let then_expr = parse_expr(stream)?;
    stream.expect(Token::Colon)?;
    let else_expr = parse_expr(stream)?;

    Ok(Expr::new(
        ExprKind::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        },
        stream.span_from(start),
    ))
}

fn parse_binary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let left = parse_unary(stream)?;

    let Some(op) = stream.peek().and_then(binary_op) else {
        return Ok(left);
    };
    stream.advance();

    // Right operand is a whole expression: right-associative, flat.
    let right = parse_expr(stream)?;

    Ok(Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        stream.span_from(start),
    ))
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();

    let kind = match stream.peek() {
        Some(Token::Minus) => Prefix::Unary(UnaryOp::Neg),
        Some(Token::Bang) => Prefix::Unary(UnaryOp::Not),
        Some(Token::PlusPlus) => Prefix::Step(StepOp::Increment),
        Some(Token::MinusMinus) => Prefix::Step(StepOp::Decrement),
        _ => return parse_nullary(stream),
    };
    stream.advance();

    let operand = Box::new(parse_unary(stream)?);
    let kind = match kind {
        Prefix::Unary(op) => ExprKind::Unary { op, operand },
        Prefix::Step(op) => ExprKind::Step {
            op,
            prefix: true,
            target: operand,
        },
    };
    Ok(Expr::new(kind, stream.span_from(start)))
}

enum Prefix {
    Unary(UnaryOp),
    Step(StepOp),
}
