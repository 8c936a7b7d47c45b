//! Type constructors: `float(x)`, `float3(a, b)`, `float2x2(...)`.

use crate::context::{Context, Visibility};
use crate::error::{Result, TranslateError};
use crate::typed::Typed;
use crate::zig;
use pbk_ast::{Expr, Scalar, Span, Type};

impl Context<'_> {
    pub(crate) fn construct(&mut self, ty: Type, args: &[Expr], span: Span) -> Result<Typed> {
        let values = self.in_order(args)?;
        if values.iter().any(Typed::is_any) {
            return Err(TranslateError::NotGeneric {
                operation: format!("`{ty}` constructor"),
                span,
            });
        }

        match ty {
            Type::Bool | Type::Int | Type::Float => {
                let [value] = exactly_one(ty, values, span)?;
                if !value.ty.is_scalar() {
                    return Err(TranslateError::InvalidConversion {
                        from: value.ty,
                        to: ty,
                        span,
                    });
                }
                value.convert(ty.element().unwrap_or(Scalar::Float), span)
            }
            Type::Vector(scalar, width) => self.construct_vector(scalar, width, values, span),
            Type::Matrix(n) => self.construct_matrix(n, values, span),
            other => Err(TranslateError::UnknownType { ty: other, span }),
        }
    }

    fn construct_vector(
        &mut self,
        scalar: Scalar,
        width: u8,
        values: Vec<Typed>,
        span: Span,
    ) -> Result<Typed> {
        let ty = Type::Vector(scalar, width);
        if let [value] = values.as_slice() {
            let value = value.clone();
            return match value.ty {
                from if from.is_scalar() => value.convert(scalar, span)?.promote(width, span),
                Type::Vector(_, n) if n == width => value.convert(scalar, span),
                from => Err(TranslateError::InvalidConversion { from, to: ty, span }),
            };
        }

        let components = self.components(values, scalar, span)?;
        if components.len() != usize::from(width) {
            return Err(TranslateError::WrongArgumentCount {
                name: ty.to_string(),
                expected: width.to_string(),
                found: components.len(),
                span,
            });
        }
        Ok(Typed::atom(
            format!("{}{{ {} }}", zig::type_name(ty, span)?, components.join(", ")),
            ty,
        ))
    }

    fn construct_matrix(&mut self, n: u8, values: Vec<Typed>, span: Span) -> Result<Typed> {
        let ty = Type::Matrix(n);
        let column_type = zig::type_name(Type::Vector(Scalar::Float, n), span)?;
        let column = |lanes: Vec<String>| format!("{column_type}{{ {} }}", lanes.join(", "));
        let matrix = |columns: Vec<String>| {
            Typed::atom(
                format!("[{n}]{column_type}{{ {} }}", columns.join(", ")),
                ty,
            )
        };

        if let [value] = values.as_slice() {
            let value = value.clone();
            match value.ty {
                Type::Matrix(m) if m == n => return Ok(value),
                // Resize: copy the overlap, identity elsewhere.
                Type::Matrix(m) => {
                    let source = self.reusable(value, span)?;
                    let columns = (0..n)
                        .map(|c| {
                            column(
                                (0..n)
                                    .map(|r| {
                                        if c < m && r < m {
                                            format!("{}[{c}][{r}]", source.code)
                                        } else if c == r {
                                            "1.0".to_string()
                                        } else {
                                            "0.0".to_string()
                                        }
                                    })
                                    .collect(),
                            )
                        })
                        .collect();
                    return Ok(matrix(columns));
                }
                // Diagonal.
                from if from.is_scalar() => {
                    let diagonal = self.reusable(value.convert(Scalar::Float, span)?, span)?;
                    let columns = (0..n)
                        .map(|c| {
                            column(
                                (0..n)
                                    .map(|r| {
                                        if r == c {
                                            diagonal.code.clone()
                                        } else {
                                            "0.0".to_string()
                                        }
                                    })
                                    .collect(),
                            )
                        })
                        .collect();
                    return Ok(matrix(columns));
                }
                _ => {}
            }
        }

        let whole_columns = values.len() == usize::from(n)
            && values.iter().all(|v| matches!(v.ty, Type::Vector(_, w) if w == n));
        if whole_columns {
            let columns = values
                .into_iter()
                .map(|v| v.convert(Scalar::Float, span).map(|v| v.code))
                .collect::<Result<Vec<_>>>()?;
            return Ok(matrix(columns));
        }

        let components = self.components(values, Scalar::Float, span)?;
        let expected = usize::from(n) * usize::from(n);
        if components.len() != expected {
            return Err(TranslateError::WrongArgumentCount {
                name: ty.to_string(),
                expected: expected.to_string(),
                found: components.len(),
                span,
            });
        }
        let columns = components
            .chunks(usize::from(n))
            .map(|lanes| column(lanes.to_vec()))
            .collect();
        Ok(matrix(columns))
    }

    /// Flatten scalar and vector arguments into converted lane expressions.
    fn components(
        &mut self,
        values: Vec<Typed>,
        scalar: Scalar,
        span: Span,
    ) -> Result<Vec<String>> {
        let mut lanes = Vec::new();
        for value in values {
            match value.ty {
                ty if ty.is_scalar() => lanes.push(value.convert(scalar, span)?.code),
                Type::Vector(_, width) => {
                    let vector = self.reusable(value.convert(scalar, span)?, span)?;
                    lanes.extend((0..width).map(|i| format!("{}[{i}]", vector.code)));
                }
                from => {
                    return Err(TranslateError::InvalidConversion {
                        from,
                        to: Type::scalar(scalar),
                        span,
                    });
                }
            }
        }
        Ok(lanes)
    }

    /// A value that can be indexed several times: calls and compound
    /// expressions are stored in a temporary inside kernel functions.
    fn reusable(&mut self, value: Typed, span: Span) -> Result<Typed> {
        let repeated_call = value.code.contains('(');
        if self.visibility == Visibility::Instance && (repeated_call || !value.atomic) {
            return self.temp(value, span);
        }
        self.hoist(value, span)
    }
}

fn exactly_one(ty: Type, values: Vec<Typed>, span: Span) -> Result<[Typed; 1]> {
    let found = values.len();
    <[Typed; 1]>::try_from(values).map_err(|_| TranslateError::WrongArgumentCount {
        name: ty.to_string(),
        expected: "1".to_string(),
        found,
        span,
    })
}
