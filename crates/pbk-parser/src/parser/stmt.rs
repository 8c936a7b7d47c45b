//! Blocks and statements.

use super::expr::parse_expr;
use super::{ParseError, TokenStream, types};
use pbk_ast::{Declaration, Declarator, Stmt, StmtKind, Type};
use pbk_lexer::Token;

/// Parse `{ statement* }`.
///
/// Statement errors are reported to the stream and parsing resumes after
/// the broken statement, so one typo does not hide the rest of the body.
pub fn parse_block(stream: &mut TokenStream) -> Result<Vec<Stmt>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut stmts = Vec::new();

    while !stream.at_end() && !stream.check(&Token::RBrace) {
        let before = stream.current_pos();
        match parse_statement(stream) {
            Ok(stmt) => stmts.push(stmt),
            Err(e) => {
                stream.report(e);
                stream.synchronize();
                if stream.current_pos() == before {
                    stream.advance();
                }
            }
        }
    }

    stream.expect(Token::RBrace)?;
    Ok(stmts)
}

pub fn parse_statement(stream: &mut TokenStream) -> Result<Stmt, ParseError> {
    let start = stream.current_pos();

    let kind = match stream.peek() {
        Some(Token::LBrace) => StmtKind::Block(parse_block(stream)?),
        Some(Token::Semicolon) => {
            stream.advance();
            StmtKind::Empty
        }
        Some(Token::Const) => {
            stream.advance();
            StmtKind::Constant(parse_declaration(stream, start)?)
        }
        // `float3(...)` starts an expression, `float3 x` a declaration
        Some(token)
            if token.is_type_keyword() && !matches!(stream.peek_nth(1), Some(Token::LParen)) =>
        {
            StmtKind::Variable(parse_declaration(stream, start)?)
        }
        Some(Token::If) => parse_if(stream)?,
        Some(Token::While) => {
            stream.advance();
            let condition = parse_condition(stream)?;
            let body = Box::new(parse_statement(stream)?);
            StmtKind::While { condition, body }
        }
        Some(Token::Do) => {
            stream.advance();
            let body = Box::new(parse_statement(stream)?);
            stream.expect(Token::While)?;
            let condition = parse_condition(stream)?;
            stream.expect(Token::Semicolon)?;
            StmtKind::DoWhile { body, condition }
        }
        Some(Token::For) => parse_for(stream)?,
        Some(Token::Break) => {
            stream.advance();
            stream.expect(Token::Semicolon)?;
            StmtKind::Break
        }
        Some(Token::Continue) => {
            stream.advance();
            stream.expect(Token::Semicolon)?;
            StmtKind::Continue
        }
        Some(Token::Return) => {
            stream.advance();
            let value = if stream.check(&Token::Semicolon) {
                None
            } else {
                Some(parse_expr(stream)?)
            };
            stream.expect(Token::Semicolon)?;
            StmtKind::Return(value)
        }
        _ => {
            let expr = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            StmtKind::Expression(expr)
        }
    };

    Ok(Stmt::new(kind, stream.span_from(start)))
}

/// `type name [= init] (, name [= init])* ;`: the caller has consumed any
/// `const` keyword.
pub fn parse_declaration(
    stream: &mut TokenStream,
    start: usize,
) -> Result<Declaration, ParseError> {
    let ty = types::parse_type(stream)?;
    if matches!(ty, Type::Void) {
        return Err(ParseError::invalid_syntax(
            "variables cannot have type `void`",
            stream.span_from(start),
        ));
    }

    let mut declarators = Vec::new();
    loop {
        let decl_start = stream.current_pos();
        let (name, _) = stream.expect_ident("in declaration")?;
        let init = if stream.eat(&Token::Eq) {
            Some(parse_expr(stream)?)
        } else {
            None
        };
        declarators.push(Declarator {
            name,
            init,
            span: stream.span_from(decl_start),
        });
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::Semicolon)?;

    Ok(Declaration {
        ty,
        declarators,
        span: stream.span_from(start),
    })
}

fn parse_condition(stream: &mut TokenStream) -> Result<pbk_ast::Expr, ParseError> {
    stream.expect(Token::LParen)?;
    let condition = parse_expr(stream)?;
    stream.expect(Token::RParen)?;
    Ok(condition)
}

fn parse_if(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.expect(Token::If)?;
    let condition = parse_condition(stream)?;
    let then_branch = Box::new(parse_statement(stream)?);
    // Dangling else binds to the nearest if.
    let else_branch = if stream.eat(&Token::Else) {
        Some(Box::new(parse_statement(stream)?))
    } else {
        None
    };
    Ok(StmtKind::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn parse_for(stream: &mut TokenStream) -> Result<StmtKind, ParseError> {
    stream.expect(Token::For)?;
    stream.expect(Token::LParen)?;

    // The initializer is a declaration or expression statement and consumes
    // its own `;`.
    let init = if stream.eat(&Token::Semicolon) {
        None
    } else {
        Some(Box::new(parse_statement(stream)?))
    };
    let condition = if stream.check(&Token::Semicolon) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::Semicolon)?;
    let update = if stream.check(&Token::RParen) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::RParen)?;
    let body = Box::new(parse_statement(stream)?);

    Ok(StmtKind::For {
        init,
        condition,
        update,
        body,
    })
}
