//! Kernel structure: tags, the kernel header and kernel-level declarations.
//!
//! ```text
//! pbk       → tag 'kernel' Identifier tag '{' kernelItem* '}'
//! tag       → '<' (Identifier ':' expression ';')* '>'
//! kernelItem → parameter | input | output | const | dependent | function
//! ```

use super::expr::parse_expr;
use super::stmt::{parse_block, parse_declaration};
use super::{ParseError, TokenStream, types};
use pbk_ast::{
    Argument, DependentDeclaration, FunctionDefinition, InputDeclaration, Kernel, KernelItem,
    Metadata, OutputDeclaration, Parameter, Scalar, Type,
};
use pbk_lexer::Token;

/// Parse a whole kernel source.
///
/// Errors inside the kernel body are reported to the stream and skipped;
/// only a malformed header aborts.
pub fn parse_kernel(stream: &mut TokenStream) -> Result<Kernel, ParseError> {
    let start = stream.current_pos();

    let header = if stream.check(&Token::Lt) {
        parse_tag(stream)?
    } else {
        Metadata::new()
    };

    stream.expect(Token::Kernel)?;
    let (name, _) = stream.expect_ident("after `kernel`")?;
    let metadata = parse_tag(stream)?;
    stream.expect(Token::LBrace)?;

    let mut items = Vec::new();
    while !stream.at_end() && !stream.check(&Token::RBrace) {
        let before = stream.current_pos();
        match parse_item(stream) {
            Ok(item) => items.push(item),
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

    if !stream.at_end() {
        stream.report(ParseError::unexpected_token(
            stream.peek(),
            "after the kernel body",
            stream.current_span(),
        ));
    }

    Ok(Kernel {
        name,
        header,
        metadata,
        items,
        span: stream.span_from(start),
    })
}

/// Parse `< name: value; ... >`.
pub fn parse_tag(stream: &mut TokenStream) -> Result<Metadata, ParseError> {
    stream.expect(Token::Lt)?;
    let mut metadata = Metadata::new();

    while !stream.at_end() && !stream.check(&Token::Gt) {
        let (name, span) = stream.expect_ident("as attribute name")?;
        stream.expect(Token::Colon)?;
        let value = parse_expr(stream)?;
        stream.expect(Token::Semicolon)?;
        if metadata.insert(name.clone(), value).is_some() {
            stream.report(ParseError::invalid_syntax(
                format!("duplicate attribute `{name}`"),
                span,
            ));
        }
    }

    stream.expect(Token::Gt)?;
    Ok(metadata)
}

fn parse_item(stream: &mut TokenStream) -> Result<KernelItem, ParseError> {
    let start = stream.current_pos();
    match stream.peek() {
        Some(Token::Parameter) => parse_parameter(stream).map(KernelItem::Parameter),
        Some(Token::Input) => parse_input(stream).map(KernelItem::Input),
        Some(Token::Output) => parse_output(stream).map(KernelItem::Output),
        Some(Token::Const) => {
            stream.advance();
            parse_declaration(stream, start).map(KernelItem::Constant)
        }
        Some(Token::Dependent) => parse_dependent(stream).map(KernelItem::Dependent),
        Some(token) if token.is_type_keyword() => {
            parse_function(stream).map(KernelItem::Function)
        }
        other => Err(ParseError::unexpected_token(
            other,
            "in kernel body",
            stream.current_span(),
        )),
    }
}

fn parse_parameter(stream: &mut TokenStream) -> Result<Parameter, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Parameter)?;
    let ty = types::parse_type(stream)?;
    let (name, _) = stream.expect_ident("as parameter name")?;
    let mut attributes = if stream.check(&Token::Lt) {
        parse_tag(stream)?
    } else {
        Metadata::new()
    };
    stream.expect(Token::Semicolon)?;

    Ok(Parameter {
        name,
        ty,
        min_value: attributes.shift_remove("minValue"),
        max_value: attributes.shift_remove("maxValue"),
        step_interval: attributes.shift_remove("stepInterval"),
        default_value: attributes.shift_remove("defaultValue"),
        preview_value: attributes.shift_remove("previewValue"),
        attributes,
        span: stream.span_from(start),
    })
}

fn parse_input(stream: &mut TokenStream) -> Result<InputDeclaration, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Input)?;
    let ty_span = stream.current_span();
    let ty = types::parse_type(stream)?;
    if !matches!(ty, Type::Image(_)) {
        return Err(ParseError::invalid_syntax(
            format!("input `{ty}` must be an image type"),
            ty_span,
        ));
    }
    let (name, _) = stream.expect_ident("as input name")?;
    stream.expect(Token::Semicolon)?;
    Ok(InputDeclaration {
        name,
        ty,
        span: stream.span_from(start),
    })
}

fn parse_output(stream: &mut TokenStream) -> Result<OutputDeclaration, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Output)?;
    let ty_span = stream.current_span();
    let ty = types::parse_type(stream)?;
    if ty.element() != Some(Scalar::Float) || ty.is_matrix() {
        return Err(ParseError::invalid_syntax(
            format!("output `{ty}` must be a pixel or float vector type"),
            ty_span,
        ));
    }
    let (name, _) = stream.expect_ident("as output name")?;
    stream.expect(Token::Semicolon)?;
    Ok(OutputDeclaration {
        name,
        ty,
        span: stream.span_from(start),
    })
}

fn parse_dependent(stream: &mut TokenStream) -> Result<DependentDeclaration, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Dependent)?;
    let ty = types::parse_type(stream)?;
    let mut names = Vec::new();
    loop {
        let (name, _) = stream.expect_ident("as dependent name")?;
        names.push(name);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::Semicolon)?;
    Ok(DependentDeclaration {
        ty,
        names,
        span: stream.span_from(start),
    })
}

fn parse_function(stream: &mut TokenStream) -> Result<FunctionDefinition, ParseError> {
    let start = stream.current_pos();
    let return_type = types::parse_type(stream)?;
    let (name, _) = stream.expect_ident("as function name")?;

    stream.expect(Token::LParen)?;
    let mut arguments = Vec::new();
    if !stream.check(&Token::RParen) {
        loop {
            let arg_start = stream.current_pos();
            let ty = types::parse_type(stream)?;
            let (arg_name, _) = stream.expect_ident("as argument name")?;
            arguments.push(Argument {
                name: arg_name,
                ty,
                span: stream.span_from(arg_start),
            });
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
    }
    stream.expect(Token::RParen)?;

    let body = parse_block(stream)?;

    Ok(FunctionDefinition {
        name,
        return_type,
        arguments,
        body,
        span: stream.span_from(start),
    })
}
