//! Type keyword parsing.

use super::{ParseError, TokenStream};
use pbk_ast::{Scalar, Span, Type};
use pbk_lexer::Token;

/// Parse a type keyword (`float3`, `pixel4`, `image1`, `void`, ...).
pub fn parse_type(stream: &mut TokenStream) -> Result<Type, ParseError> {
    let span = stream.current_span();
    let token = stream.peek();
    let ty = match token {
        Some(token) if token.is_type_keyword() => type_of(token, span)?,
        other => {
            return Err(ParseError::unexpected_token(other, "where a type was expected", span));
        }
    };
    stream.advance();
    Ok(ty)
}

/// Map a type keyword token onto the type lattice.
pub fn type_of(token: &Token, span: Span) -> Result<Type, ParseError> {
    let ty = match token {
        Token::Void => Type::Void,
        Token::Bool => Type::Bool,
        Token::BoolVector(n) => Type::Vector(Scalar::Bool, *n),
        Token::Int => Type::Int,
        Token::IntVector(n) => Type::Vector(Scalar::Int, *n),
        Token::Float => Type::Float,
        Token::FloatVector(n) => Type::Vector(Scalar::Float, *n),
        Token::FloatMatrix(dims) if dims.columns == dims.rows => Type::Matrix(dims.columns),
        Token::FloatMatrix(_) => {
            return Err(ParseError::invalid_syntax(
                format!("unsupported matrix type `{token}`: only square matrices exist"),
                span,
            ));
        }
        Token::IntMatrix(_) => {
            return Err(ParseError::invalid_syntax(
                format!("unsupported matrix type `{token}`: matrices are float-only"),
                span,
            ));
        }
        Token::Pixel(n) => Type::pixel(*n),
        Token::Image(n) => Type::Image(*n),
        Token::Region => Type::Region,
        Token::ImageRef => Type::ImageRef,
        Token::StringType => Type::String,
        other => {
            return Err(ParseError::unexpected_token(
                Some(other),
                "where a type was expected",
                span,
            ));
        }
    };
    Ok(ty)
}
