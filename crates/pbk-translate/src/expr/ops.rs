//! Binary operators: operand unification, matrix lowering and folding.

use crate::context::Context;
use crate::error::{Result, TranslateError};
use crate::typed::{Constant, Typed};
use pbk_ast::{BinaryOp, Scalar, Span, Type};

impl Context<'_> {
    /// Apply a binary operator to two translated operands.
    pub(crate) fn combine(
        &mut self,
        op: BinaryOp,
        left: Typed,
        right: Typed,
        span: Span,
    ) -> Result<Typed> {
        let symbol = op.symbol();

        if left.is_any() || right.is_any() {
            return any_operands(op, left, right, span);
        }
        if left.ty.is_matrix() || right.ty.is_matrix() {
            return self.matrix_op(op, left, right, span);
        }

        let (left_ty, right_ty) = (left.ty, right.ty);
        let invalid = || TranslateError::InvalidOperands {
            op: symbol.to_string(),
            left: left_ty,
            right: right_ty,
            span,
        };

        if op.is_logical() {
            if !left_ty.is_scalar() || !right_ty.is_scalar() {
                return Err(invalid());
            }
            let left = left.convert(Scalar::Bool, span)?;
            let right = right.convert(Scalar::Bool, span)?;
            let keyword = match op {
                BinaryOp::And => "and",
                BinaryOp::Or => "or",
                _ => "!=",
            };
            return Ok(Typed::new(
                format!("{} {keyword} {}", left.operand(), right.operand()),
                Type::Bool,
            ));
        }

        let (left, right) = self.unify(symbol, left, right, span)?;
        let ty = left.ty;

        if op.is_arithmetic() {
            if ty.element() == Some(Scalar::Bool) {
                return Err(invalid());
            }
            if op == BinaryOp::Div && divides_by_zero(&left, &right) {
                return Err(TranslateError::DivisionByZero { span });
            }
            if let (Some(a), Some(b)) = (left.constant, right.constant)
                && let Some(folded) = fold(op, a, b)
            {
                return Ok(Typed::literal(folded));
            }
            if op == BinaryOp::Div && ty.element() == Some(Scalar::Int) {
                return Ok(Typed::atom(
                    format!("@divTrunc({}, {})", left.code, right.code),
                    ty,
                ));
            }
            return Ok(Typed::new(
                format!("{} {symbol} {}", left.operand(), right.operand()),
                ty,
            ));
        }

        if op.is_ordering() {
            if !ty.is_scalar() || ty == Type::Bool {
                return Err(invalid());
            }
            return Ok(Typed::new(
                format!("{} {symbol} {}", left.operand(), right.operand()),
                Type::Bool,
            ));
        }

        // == and !=
        if ty.is_vector() {
            let reduce = if op == BinaryOp::Eq { ".And" } else { ".Or" };
            return Ok(Typed::atom(
                format!(
                    "@reduce({reduce}, {} {symbol} {})",
                    left.operand(),
                    right.operand()
                ),
                Type::Bool,
            ));
        }
        Ok(Typed::new(
            format!("{} {symbol} {}", left.operand(), right.operand()),
            Type::Bool,
        ))
    }

    /// Bring two scalar/vector operands to one type: int widens to float,
    /// bool converts to the numeric side, scalars splat to the vector width.
    pub(crate) fn unify(
        &mut self,
        op: &str,
        left: Typed,
        right: Typed,
        span: Span,
    ) -> Result<(Typed, Typed)> {
        if left.ty == right.ty {
            return Ok((left, right));
        }
        if left.is_any() || right.is_any() {
            return Err(TranslateError::NotGeneric {
                operation: format!("`{op}` with mixed operand types"),
                span,
            });
        }
        let (left_ty, right_ty) = (left.ty, right.ty);
        let invalid = || TranslateError::InvalidOperands {
            op: op.to_string(),
            left: left_ty,
            right: right_ty,
            span,
        };
        let value = |ty: Type| ty.is_scalar() || ty.is_vector();
        if !value(left_ty) || !value(right_ty) {
            return Err(invalid());
        }

        let (Some(a), Some(b)) = (left_ty.element(), right_ty.element()) else {
            return Err(invalid());
        };
        let element = if a == Scalar::Float || b == Scalar::Float {
            Scalar::Float
        } else if a == Scalar::Int || b == Scalar::Int {
            Scalar::Int
        } else {
            Scalar::Bool
        };
        let left = left.convert(element, span)?;
        let right = right.convert(element, span)?;

        let (wa, wb) = (left_ty.width(), right_ty.width());
        match (wa, wb) {
            _ if wa == wb => Ok((left, right)),
            (1, _) => Ok((left.promote(wb, span)?, right)),
            (_, 1) => {
                let right = right.promote(wa, span)?;
                Ok((left, right))
            }
            _ => Err(invalid()),
        }
    }

    /// Matrix operands lower to the `matrixOp` helper.
    fn matrix_op(&mut self, op: BinaryOp, left: Typed, right: Typed, span: Span) -> Result<Typed> {
        let symbol = op.symbol();
        let invalid = TranslateError::InvalidOperands {
            op: symbol.to_string(),
            left: left.ty,
            right: right.ty,
            span,
        };
        if op.is_ordering() || op.is_logical() {
            return Err(invalid);
        }
        let numeric_scalar = |ty: Type| ty.is_scalar() && ty != Type::Bool;

        let ty = match (left.ty, right.ty) {
            (Type::Matrix(a), Type::Matrix(b)) if a == b => {
                if op.is_equality() {
                    Type::Bool
                } else {
                    Type::Matrix(a)
                }
            }
            (Type::Matrix(n), Type::Vector(Scalar::Float, m))
            | (Type::Vector(Scalar::Float, m), Type::Matrix(n))
                if n == m && op == BinaryOp::Mul =>
            {
                Type::Vector(Scalar::Float, n)
            }
            (Type::Matrix(n), other) | (other, Type::Matrix(n))
                if numeric_scalar(other) && op.is_arithmetic() =>
            {
                Type::Matrix(n)
            }
            _ => return Err(invalid),
        };

        self.require_static("matrixOp", span)?;
        let as_float = |value: Typed| {
            if value.ty.is_scalar() {
                value.convert(Scalar::Float, span)
            } else {
                Ok(value)
            }
        };
        let left = as_float(left)?;
        let right = as_float(right)?;
        Ok(Typed::atom(
            format!(
                "matrixOp(\"{symbol}\", {}, {})",
                left.argument(),
                right.argument()
            ),
            ty,
        ))
    }
}

/// Operators a macro parameter of unknown type can still take part in.
fn any_operands(op: BinaryOp, left: Typed, right: Typed, span: Span) -> Result<Typed> {
    let generic = left.is_any()
        && right.is_any()
        && !matches!(
            op,
            BinaryOp::Div | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Xor
        );
    if !generic {
        return Err(TranslateError::NotGeneric {
            operation: format!("`{}`", op.symbol()),
            span,
        });
    }
    let (symbol, ty) = match op {
        BinaryOp::And => ("and", Type::Bool),
        BinaryOp::Or => ("or", Type::Bool),
        _ if op.is_ordering() => (op.symbol(), Type::Bool),
        _ => (op.symbol(), Type::Any),
    };
    Ok(Typed::new(
        format!("{} {symbol} {}", left.operand(), right.operand()),
        ty,
    ))
}

/// A zero divisor Zig would see at compile time.
fn divides_by_zero(left: &Typed, right: &Typed) -> bool {
    match right.constant {
        Some(Constant::Int(0)) => true,
        Some(Constant::Float(x)) => x == 0.0 && left.constant.is_some(),
        _ => false,
    }
}

fn fold(op: BinaryOp, left: Constant, right: Constant) -> Option<Constant> {
    match (left, right) {
        (Constant::Int(a), Constant::Int(b)) => match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div if b != 0 => a.checked_div(b),
            _ => None,
        }
        .map(Constant::Int),
        (Constant::Float(a), Constant::Float(b)) => match op {
            BinaryOp::Add => Some(a + b),
            BinaryOp::Sub => Some(a - b),
            BinaryOp::Mul => Some(a * b),
            BinaryOp::Div if b != 0.0 => Some(a / b),
            _ => None,
        }
        .map(Constant::Float),
        _ => None,
    }
}
