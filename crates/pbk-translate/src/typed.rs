//! Typed expression handles.
//!
//! Expression translation returns a [`Typed`] for every node: the Zig text,
//! the inferred Pixel Bender type, the literal value when the node is a
//! literal, and whether the text can be used as an operand without
//! parentheses.

use crate::error::{Result, TranslateError};
use crate::zig;
use pbk_ast::{Scalar, Span, Type};
use std::borrow::Cow;

/// Literal value carried for folding conversions at translation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Constant {
    pub fn ty(self) -> Type {
        match self {
            Constant::Bool(_) => Type::Bool,
            Constant::Int(_) => Type::Int,
            Constant::Float(_) => Type::Float,
        }
    }

    pub fn cast(self, to: Scalar) -> Constant {
        match (self, to) {
            (Constant::Bool(b), Scalar::Bool) => Constant::Bool(b),
            (Constant::Bool(b), Scalar::Int) => Constant::Int(i64::from(b)),
            (Constant::Bool(b), Scalar::Float) => Constant::Float(if b { 1.0 } else { 0.0 }),
            (Constant::Int(n), Scalar::Bool) => Constant::Bool(n != 0),
            (Constant::Int(n), Scalar::Int) => Constant::Int(n),
            (Constant::Int(n), Scalar::Float) => Constant::Float(n as f64),
            (Constant::Float(x), Scalar::Bool) => Constant::Bool(x != 0.0),
            (Constant::Float(x), Scalar::Int) => Constant::Int(x.trunc() as i64),
            (Constant::Float(x), Scalar::Float) => Constant::Float(x),
        }
    }

    pub fn render(self) -> String {
        match self {
            Constant::Bool(b) => b.to_string(),
            Constant::Int(n) => n.to_string(),
            Constant::Float(x) => zig::float_literal(x),
        }
    }

    fn is_negative(self) -> bool {
        match self {
            Constant::Bool(_) => false,
            Constant::Int(n) => n < 0,
            Constant::Float(x) => x.is_sign_negative(),
        }
    }
}

/// The vector a swizzle read came from, kept so a masked write can shuffle
/// straight from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Swizzled {
    pub base: String,
    pub base_width: u8,
    pub indices: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typed {
    pub code: String,
    pub ty: Type,
    pub constant: Option<Constant>,
    /// Safe to use as an operand without parentheses.
    pub atomic: bool,
    pub swizzle: Option<Swizzled>,
}

impl Typed {
    /// Compound expression text.
    pub fn new(code: impl Into<String>, ty: Type) -> Self {
        Self {
            code: code.into(),
            ty,
            constant: None,
            atomic: false,
            swizzle: None,
        }
    }

    /// Name, call, index or builtin: never needs parentheses.
    pub fn atom(code: impl Into<String>, ty: Type) -> Self {
        Self {
            atomic: true,
            ..Self::new(code, ty)
        }
    }

    pub fn literal(constant: Constant) -> Self {
        Self {
            code: constant.render(),
            ty: constant.ty(),
            constant: Some(constant),
            atomic: !constant.is_negative(),
            swizzle: None,
        }
    }

    pub fn void() -> Self {
        Self::atom("{}", Type::Void)
    }

    pub fn is_any(&self) -> bool {
        self.ty == Type::Any
    }

    /// Text usable as an operand of a Zig operator.
    pub fn operand(&self) -> Cow<'_, str> {
        if self.atomic {
            Cow::Borrowed(&self.code)
        } else {
            Cow::Owned(format!("({})", self.code))
        }
    }

    /// Parenthesized form of a source-level `( ... )`.
    pub fn grouped(self) -> Typed {
        if self.atomic || self.ty == Type::Void {
            return self;
        }
        Typed {
            code: format!("({})", self.code),
            atomic: true,
            ..self
        }
    }

    /// Nothing left to emit: an assignment already written as a statement.
    pub fn is_void(&self) -> bool {
        self.ty == Type::Void && self.code == "{}"
    }

    /// Text for a generic (`anytype`) argument: scalar literals get an
    /// explicit type so they are not passed as comptime numbers.
    pub fn argument(&self) -> String {
        match self.constant {
            Some(Constant::Int(_)) => format!("@as(i32, {})", self.code),
            Some(Constant::Float(_)) => format!("@as(f32, {})", self.code),
            _ => self.code.clone(),
        }
    }

    /// Convert the element kind, keeping the shape. Literals fold.
    pub fn convert(self, to: Scalar, span: Span) -> Result<Typed> {
        let from = match self.ty {
            Type::Any => {
                return Err(TranslateError::NotGeneric {
                    operation: format!("conversion to {}", to.name()),
                    span,
                });
            }
            Type::Matrix(_) if to == Scalar::Float => return Ok(self),
            ty if ty.is_scalar() || ty.is_vector() => ty.element().unwrap_or(to),
            ty => {
                return Err(TranslateError::InvalidConversion {
                    from: ty,
                    to: self.ty.with_element(to),
                    span,
                });
            }
        };
        if from == to {
            return Ok(self);
        }
        if let Some(constant) = self.constant {
            return Ok(Typed::literal(constant.cast(to)));
        }

        let target = self.ty.with_element(to);
        let code = match self.ty {
            Type::Vector(_, n) => {
                let to_name = zig::scalar_type(to);
                let from_name = zig::scalar_type(from);
                let vector = format!("@Vector({n}, {to_name})");
                match (from, to) {
                    (Scalar::Int, Scalar::Float) => {
                        format!("@as({vector}, @floatFromInt({}))", self.code)
                    }
                    (Scalar::Float, Scalar::Int) => {
                        format!("@as({vector}, @intFromFloat({}))", self.code)
                    }
                    (_, Scalar::Bool) => format!(
                        "{} != @as(@Vector({n}, {from_name}), @splat(0))",
                        self.operand()
                    ),
                    (Scalar::Bool, _) => format!(
                        "@select({to_name}, {}, @as({vector}, @splat(1)), @as({vector}, @splat(0)))",
                        self.code
                    ),
                    _ => self.code,
                }
            }
            _ => match (from, to) {
                (Scalar::Int, Scalar::Float) => format!("@as(f32, @floatFromInt({}))", self.code),
                (Scalar::Float, Scalar::Int) => format!("@as(i32, @intFromFloat({}))", self.code),
                (_, Scalar::Bool) => format!("{} != 0", self.operand()),
                (Scalar::Bool, Scalar::Int) => format!("@as(i32, if ({}) 1 else 0)", self.code),
                (Scalar::Bool, Scalar::Float) => {
                    format!("@as(f32, if ({}) 1.0 else 0.0)", self.code)
                }
                _ => self.code,
            },
        };
        let atomic = !code.contains(" != ");
        Ok(Typed {
            code,
            ty: target,
            constant: None,
            atomic,
            swizzle: None,
        })
    }

    /// Splat a scalar to `width` lanes. Vectors pass through when the width
    /// already matches.
    pub fn promote(self, width: u8, span: Span) -> Result<Typed> {
        let to = match self.ty.element() {
            Some(scalar) => Type::vector(scalar, width),
            None => Type::Any,
        };
        match self.ty {
            Type::Any => Err(TranslateError::NotGeneric {
                operation: format!("promotion to {width} lanes"),
                span,
            }),
            ty if ty.is_scalar() && width > 1 => {
                let vector = zig::type_name(to, span)?;
                Ok(Typed::atom(format!("@as({vector}, @splat({}))", self.code), to))
            }
            ty if (ty.is_scalar() || ty.is_vector()) && ty.width() == width => Ok(self),
            ty => Err(TranslateError::InvalidPromotion { from: ty, to, span }),
        }
    }

    /// Fit a value into a slot of type `target` (initializer, assignment,
    /// argument default, return). Element kinds convert; shapes must match.
    pub fn coerce(self, target: Type, span: Span) -> Result<Typed> {
        if self.ty == target {
            return Ok(self);
        }
        if self.is_any() || target == Type::Any {
            return Err(TranslateError::NotGeneric {
                operation: format!("conversion to {target}"),
                span,
            });
        }
        let same_shape = (self.ty.is_scalar() && target.is_scalar())
            || (self.ty.is_vector() && target.is_vector() && self.ty.width() == target.width());
        match target.element() {
            Some(scalar) if same_shape => self.convert(scalar, span),
            _ => Err(TranslateError::InvalidConversion {
                from: self.ty,
                to: target,
                span,
            }),
        }
    }
}
