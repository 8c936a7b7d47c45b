//! Expression parser.
//!
//! Grammar levels, outermost to innermost:
//!
//! 1. assignment: optional `lvalue (= | += | -= | *= | /=)` prefix, decided
//!    by speculative lookahead, then a ternary
//! 2. ternary: `binary ? expression : expression`
//! 3. binary: `unary (op expression)?`
//! 4. unary: optional `-`, `!`, `++`, `--` prefix
//! 5. nullary: parenthesized expression, constructor, call, literal,
//!    variable with optional `.property` / `[index]` and postfix `++` / `--`
//!
//! Binary operators take a whole expression as their right operand, so
//! chains are right-associative with no precedence between operators:
//! `a - b - c` is `a - (b - c)` and `a * b + c` is `a * (b + c)`. Kernels
//! written against the original toolchain rely on that grouping.

mod atoms;
mod operators;

use super::{ParseError, TokenStream};
use pbk_ast::Expr;

/// Parse a full expression (assignment level).
pub fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    operators::parse_assignment(stream)
}

