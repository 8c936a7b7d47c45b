//! Swizzle reads.

use crate::context::Context;
use crate::error::{Result, TranslateError};
use crate::typed::{Swizzled, Typed};
use crate::zig;
use pbk_ast::{Expr, Span, Type};

/// Component letter sets; one swizzle may not mix sets.
const LETTER_SETS: [&str; 3] = ["rgba", "xyzw", "stpq"];

/// Lane indices named by a swizzle on a value of type `ty`.
///
/// Width is only checked for concrete vectors; macro parameters of unknown
/// type accept any letters.
pub(crate) fn swizzle_indices(swizzle: &str, ty: Type, span: Span) -> Result<Vec<u8>> {
    let invalid = || TranslateError::InvalidSwizzle {
        swizzle: swizzle.to_string(),
        ty,
        span,
    };
    if swizzle.is_empty() || swizzle.len() > 4 {
        return Err(invalid());
    }
    let first = swizzle.chars().next().ok_or_else(invalid)?;
    let set = LETTER_SETS
        .iter()
        .find(|set| set.contains(first))
        .ok_or_else(invalid)?;

    let mut indices = Vec::with_capacity(swizzle.len());
    for letter in swizzle.chars() {
        let index = set.find(letter).ok_or_else(invalid)? as u8;
        if ty != Type::Any && index >= ty.width() {
            return Err(invalid());
        }
        indices.push(index);
    }
    Ok(indices)
}

/// `@Vector(n, i32){ ... }` shuffle mask.
pub(crate) fn mask<I>(lanes: I) -> String
where
    I: IntoIterator<Item = i32>,
{
    let lanes: Vec<String> = lanes.into_iter().map(|lane| lane.to_string()).collect();
    format!("@Vector({}, i32){{ {} }}", lanes.len(), lanes.join(", "))
}

impl Context<'_> {
    pub(crate) fn swizzle(&mut self, base: &Expr, swizzle: &str, span: Span) -> Result<Typed> {
        let value = self.expr(base)?;
        read_swizzle(value, swizzle, span)
    }
}

/// Select lanes of `value`.
pub(crate) fn read_swizzle(value: Typed, swizzle: &str, span: Span) -> Result<Typed> {
    let element = match value.ty {
        Type::Vector(scalar, _) => Some(scalar),
        Type::Any => None,
        ty => {
            return Err(TranslateError::InvalidSwizzle {
                swizzle: swizzle.to_string(),
                ty,
                span,
            });
        }
    };
    let indices = swizzle_indices(swizzle, value.ty, span)?;
    let width = value.ty.width();
    let source = Swizzled {
        base: value.code.clone(),
        base_width: width,
        indices: indices.clone(),
    };
    let lanes = || mask(indices.iter().map(|&i| i32::from(i)));

    let mut result = match (element, indices.as_slice()) {
        (Some(scalar), [single]) => Typed::atom(
            format!("{}[{single}]", value.operand()),
            Type::scalar(scalar),
        ),
        (None, [single]) => Typed::atom(format!("{}[{single}]", value.operand()), Type::Any),
        (Some(_), _) if is_identity(&indices, width) => value,
        (Some(scalar), _) => Typed::atom(
            format!(
                "@shuffle({}, {}, undefined, {})",
                zig::scalar_type(scalar),
                value.code,
                lanes()
            ),
            Type::vector(scalar, indices.len() as u8),
        ),
        (None, _) => Typed::atom(
            format!(
                "@shuffle(std.meta.Child(@TypeOf({0})), {0}, undefined, {1})",
                value.code,
                lanes()
            ),
            Type::Any,
        ),
    };
    result.swizzle = Some(source);
    Ok(result)
}

fn is_identity(indices: &[u8], width: u8) -> bool {
    indices.len() == usize::from(width) && indices.iter().enumerate().all(|(i, &lane)| usize::from(lane) == i)
}
