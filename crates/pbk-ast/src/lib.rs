// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! AST types for Pixel Bender kernels
//!
//! This crate contains the AST node definitions, the value type lattice
//! and source spans shared by the parser and the translator.

pub mod ast;
pub mod foundation;

pub use foundation::{Scalar, SourceFile, Span, Type};

pub use ast::*;
