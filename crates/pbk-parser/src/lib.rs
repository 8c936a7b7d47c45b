// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Hand-written recursive descent parser for Pixel Bender kernels
//!
//! [`parse`] turns kernel source text into a [`pbk_ast::Kernel`] plus the
//! macros declared by its `#define` lines, collecting every lexical and
//! syntactic error along the way.

pub mod parser;

pub use parser::{MacroParse, ParseError, ParseErrorKind, ParseOutput, parse, parse_macro};

// Re-export lexer
pub use pbk_lexer::{LexError, Token};
