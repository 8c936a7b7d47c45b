//! Hand-written recursive descent parser for Pixel Bender kernels.
//!
//! ## Architecture
//!
//! - `stream`: TokenStream wrapper with lookahead and error collection
//! - `error`: ParseError and its constructors
//! - `decl`: kernel header, tags and kernel-level declarations
//! - `stmt`: blocks and statements
//! - `expr`: expression levels (assignment, ternary, binary, unary, nullary)
//! - `types`: type keywords
//! - `macros`: `#define` extraction and the macro grammar
//!
//! The parser never stops at the first error: broken statements and kernel
//! items are reported and skipped, so one pass surfaces every problem.

mod error;
mod stream;

pub use error::{ParseError, ParseErrorKind};
use stream::TokenStream;

mod decl;
mod expr;
mod macros;
mod stmt;
mod types;

pub use macros::{MacroParse, parse_macro};

use pbk_ast::{Kernel, Macro};
use pbk_lexer::{LexError, tokenize};
use std::ops::Range;
use tracing::debug;

/// Everything parsed out of one kernel source.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// `None` only when the kernel header itself could not be parsed.
    pub kernel: Option<Kernel>,
    /// One entry per `#define`, in source order.
    pub macros: Vec<MacroParse>,
    /// Lexer errors from the kernel source and every macro body.
    pub lex_errors: Vec<LexError>,
    /// Parse errors from the kernel source and every macro body.
    pub parse_errors: Vec<ParseError>,
    pub comments: Vec<(String, Range<usize>)>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.lex_errors.is_empty() || !self.parse_errors.is_empty()
    }

    /// Macro definitions that parsed successfully, in source order.
    pub fn macro_definitions(&self) -> Vec<Macro> {
        self.macros
            .iter()
            .filter_map(|m| m.definition.clone())
            .collect()
    }
}

/// Tokenize and parse a kernel source along with its `#define` macros.
pub fn parse(source: &str) -> ParseOutput {
    let lexed = tokenize(source);
    let macros = macros::parse_directives(&lexed.directives);

    let mut stream = TokenStream::new(&lexed.tokens);
    let kernel = match decl::parse_kernel(&mut stream) {
        Ok(kernel) => Some(kernel),
        Err(e) => {
            stream.report(e);
            None
        }
    };

    let mut lex_errors = Vec::new();
    let mut parse_errors = Vec::new();
    for m in &macros {
        lex_errors.extend(m.lex_errors.iter().cloned());
        parse_errors.extend(m.parse_errors.iter().cloned());
    }
    lex_errors.extend(lexed.errors);
    parse_errors.extend(stream.take_errors());

    debug!(
        tokens = lexed.tokens.len(),
        macros = macros.len(),
        lex_errors = lex_errors.len(),
        parse_errors = parse_errors.len(),
        "parsed kernel source"
    );

    ParseOutput {
        kernel,
        macros,
        lex_errors,
        parse_errors,
        comments: lexed.comments,
    }
}
