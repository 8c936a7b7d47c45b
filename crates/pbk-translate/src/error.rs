//! Translation errors.

use pbk_ast::{Span, Type};
use thiserror::Error;

/// Errors that abort a translation.
///
/// Each variant carries the span of the construct that triggered it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    /// A type with no Zig representation in this position (`image4` local,
    /// `region` constant, ...).
    #[error("type `{ty}` cannot be used here")]
    UnknownType { ty: Type, span: Span },

    #[error("undeclared function `{name}`")]
    UndeclaredFunction { name: String, span: Span },

    #[error("`{name}` takes {expected} argument(s), found {found}")]
    WrongArgumentCount {
        name: String,
        expected: String,
        found: usize,
        span: Span,
    },

    /// `position` is 1-based.
    #[error("argument {position} of `{name}` has type `{found}`, expected `{expected}`")]
    WrongArgumentType {
        name: String,
        position: usize,
        expected: Type,
        found: Type,
        span: Span,
    },

    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String, span: Span },

    #[error("invalid operands to `{op}`: `{left}` and `{right}`")]
    InvalidOperands {
        op: String,
        left: Type,
        right: Type,
        span: Span,
    },

    #[error("cannot convert `{from}` to `{to}`")]
    InvalidConversion { from: Type, to: Type, span: Span },

    #[error("invalid swizzle `.{swizzle}` on `{ty}`")]
    InvalidSwizzle {
        swizzle: String,
        ty: Type,
        span: Span,
    },

    #[error("cannot promote `{from}` to `{to}`")]
    InvalidPromotion { from: Type, to: Type, span: Span },

    /// Integer division by a literal zero, or a float literal divided by
    /// zero. Zig rejects both at compile time.
    #[error("division by zero")]
    DivisionByZero { span: Span },

    #[error("`{target}` cannot be assigned to")]
    NotAssignable { target: String, span: Span },

    #[error("`{keyword}` outside of a loop")]
    MisplacedJump { keyword: &'static str, span: Span },

    #[error("macro `{name}` expands recursively")]
    RecursiveMacro { name: String, span: Span },

    /// A macro parameter of unknown type reached an operation that must
    /// know the concrete type. Only seen while probing macros.
    #[error("operation `{operation}` needs concrete operand types")]
    NotGeneric { operation: String, span: Span },

    #[error("`{name}` collides with a member of the generated kernel")]
    ReservedName { name: String, span: Span },
}

impl TranslateError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownType { span, .. }
            | Self::UndeclaredFunction { span, .. }
            | Self::WrongArgumentCount { span, .. }
            | Self::WrongArgumentType { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::InvalidOperands { span, .. }
            | Self::InvalidConversion { span, .. }
            | Self::InvalidSwizzle { span, .. }
            | Self::InvalidPromotion { span, .. }
            | Self::DivisionByZero { span }
            | Self::NotAssignable { span, .. }
            | Self::MisplacedJump { span, .. }
            | Self::RecursiveMacro { span, .. }
            | Self::NotGeneric { span, .. }
            | Self::ReservedName { span, .. } => *span,
        }
    }

    /// Errors a macro probe answers by expanding the macro inline instead.
    pub(crate) fn is_probe_fallback(&self, parameterized: bool) -> bool {
        match self {
            Self::UndefinedVariable { .. } => true,
            Self::NotGeneric { .. } => parameterized,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
