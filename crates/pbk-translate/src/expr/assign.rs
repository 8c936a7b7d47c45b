//! Assignments, write masks and increments.
//!
//! Assignments are statements in Zig, so each one is emitted as its own line
//! ahead of the enclosing expression. When the surrounding expression uses
//! the assigned value it reads a snapshot of the target taken right after
//! the write.

use super::swizzle::{mask, read_swizzle, swizzle_indices};
use crate::context::Context;
use crate::error::{Result, TranslateError};
use crate::typed::Typed;
use crate::zig;
use pbk_ast::{AssignOp, Expr, ExprKind, Literal, Span, StepOp, Type};

impl Context<'_> {
    pub(crate) fn assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        used: bool,
        span: Span,
    ) -> Result<Typed> {
        match &target.kind {
            ExprKind::Paren(inner) => return self.assign(op, inner, value, used, span),
            ExprKind::Property { base, name } => {
                return self.assign_swizzle(op, base, name, value, used, span);
            }
            _ => {}
        }

        let place = self.place(target)?;
        if place.ty == Type::Any {
            return Err(TranslateError::NotGeneric {
                operation: format!("`{}`", op.symbol()),
                span,
            });
        }
        let rhs = self.expr(value)?;
        let rhs = match op.binary() {
            None => rhs,
            Some(binary) => {
                self.mark_place_read(place.slot);
                let current = Typed::atom(place.code.clone(), place.ty);
                self.combine(binary, current, rhs, span)?
            }
        };
        let rhs = rhs.coerce(place.ty, span)?;
        self.line(&format!("{} = {};", place.code, rhs.code));
        self.mark_place_written(place.slot);

        if !used {
            return Ok(Typed::void());
        }
        self.mark_place_read(place.slot);
        self.temp(Typed::atom(place.code, place.ty), span)
    }

    /// `v.xz = rhs`: one shuffle writes every masked lane at once.
    fn assign_swizzle(
        &mut self,
        op: AssignOp,
        base: &Expr,
        swizzle: &str,
        value: &Expr,
        used: bool,
        span: Span,
    ) -> Result<Typed> {
        let place = self.place(base)?;
        let (element, width) = match place.ty {
            Type::Vector(scalar, width) => (scalar, width),
            Type::Any => {
                return Err(TranslateError::NotGeneric {
                    operation: format!("write to `.{swizzle}`"),
                    span,
                });
            }
            ty => {
                return Err(TranslateError::InvalidSwizzle {
                    swizzle: swizzle.to_string(),
                    ty,
                    span,
                });
            }
        };
        let indices = swizzle_indices(swizzle, place.ty, span)?;
        let duplicated = indices
            .iter()
            .enumerate()
            .any(|(i, lane)| indices[..i].contains(lane));
        if duplicated {
            return Err(TranslateError::InvalidSwizzle {
                swizzle: swizzle.to_string(),
                ty: place.ty,
                span,
            });
        }
        let slot_ty = Type::vector(element, indices.len() as u8);

        let rhs = self.expr(value)?;
        let rhs = match op.binary() {
            None => rhs,
            Some(binary) => {
                self.mark_place_read(place.slot);
                let current = read_swizzle(Typed::atom(place.code.clone(), place.ty), swizzle, span)?;
                self.combine(binary, current, rhs, span)?
            }
        };
        let rhs = fit(rhs, slot_ty, span)?;

        if let [lane] = indices.as_slice() {
            self.line(&format!("{}[{lane}] = {};", place.code, rhs.code));
        } else {
            // Masked lanes take `~p` (lane p of the second operand).
            let (other, lanes): (String, Vec<i32>) = match &rhs.swizzle {
                Some(source) => (
                    source.base.clone(),
                    (0..width)
                        .map(|lane| match indices.iter().position(|&i| i == lane) {
                            Some(p) => -1 - i32::from(source.indices[p]),
                            None => i32::from(lane),
                        })
                        .collect(),
                ),
                None => (
                    rhs.code.clone(),
                    (0..width)
                        .map(|lane| match indices.iter().position(|&i| i == lane) {
                            Some(p) => -1 - p as i32,
                            None => i32::from(lane),
                        })
                        .collect(),
                ),
            };
            self.line(&format!(
                "{0} = @shuffle({1}, {0}, {other}, {2});",
                place.code,
                zig::scalar_type(element),
                mask(lanes)
            ));
        }
        self.mark_place_written(place.slot);

        if !used {
            return Ok(Typed::void());
        }
        self.mark_place_read(place.slot);
        let written = read_swizzle(Typed::atom(place.code, place.ty), swizzle, span)?;
        self.temp(written, span)
    }

    /// `++x`, `x--`: `x += 1`, `x -= 1`. A used postfix step returns the old value
    /// from a temporary.
    pub(crate) fn step(
        &mut self,
        op: StepOp,
        prefix: bool,
        target: &Expr,
        used: bool,
        span: Span,
    ) -> Result<Typed> {
        let one = Expr::new(ExprKind::Literal(Literal::Int(1)), span);
        if prefix || !used {
            return self.assign(op.compound(), target, &one, used, span);
        }
        let old = self.expr(target)?;
        let old = self.temp(old, span)?;
        self.assign(op.compound(), target, &one, false, span)?;
        Ok(old)
    }

    fn mark_place_read(&mut self, slot: Option<usize>) {
        if let Some(slot) = slot {
            self.mark_read(slot);
        }
    }

    fn mark_place_written(&mut self, slot: Option<usize>) {
        if let Some(slot) = slot {
            self.mark_written(slot);
        }
    }
}

/// Like [`Typed::coerce`], but a scalar also fills every masked lane.
fn fit(value: Typed, target: Type, span: Span) -> Result<Typed> {
    if value.ty.is_scalar()
        && let Type::Vector(element, width) = target
    {
        return value.convert(element, span)?.promote(width, span);
    }
    value.coerce(target, span)
}
