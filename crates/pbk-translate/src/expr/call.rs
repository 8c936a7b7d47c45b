//! Function calls: macros, built-ins, image methods and kernel functions.

use crate::catalog::CalleeKind;
use crate::context::Context;
use crate::error::{Result, TranslateError};
use crate::typed::Typed;
use crate::zig;
use pbk_ast::{Expr, Scalar, Span, Type};

/// Source names that call a differently named helper.
fn canonical_name(name: &str, arity: usize) -> &str {
    match (name, arity) {
        ("sample", _) => "sampleLinear",
        ("atan", 2) => "atan2",
        _ => name,
    }
}

impl Context<'_> {
    pub(crate) fn call(&mut self, name: &str, args: &[Expr], used: bool, span: Span) -> Result<Typed> {
        if let Some(value) = self.macro_use(name, Some(args), used, span)? {
            return Ok(value);
        }

        if name == "outCoord" {
            if !args.is_empty() {
                return Err(TranslateError::WrongArgumentCount {
                    name: name.to_string(),
                    expected: "0".to_string(),
                    found: args.len(),
                    span,
                });
            }
            self.require_instance(name, span)?;
            return Ok(Typed::atom(
                "self.outCoord()",
                Type::Vector(Scalar::Float, 2),
            ));
        }

        let name = canonical_name(name, args.len());
        let Some(callee) = self.functions.get(name).cloned() else {
            return Err(TranslateError::UndeclaredFunction {
                name: name.to_string(),
                span,
            });
        };

        let values = self.in_order(args)?;
        let types: Vec<Type> = values.iter().map(|v| v.ty).collect();
        let returns = callee.signatures.resolve(name, &types, span)?;

        match callee.kind {
            CalleeKind::Builtin => {
                self.require_static(name, span)?;
                let args: Vec<String> = values.iter().map(Typed::argument).collect();
                Ok(Typed::atom(format!("{name}({})", args.join(", ")), returns))
            }
            CalleeKind::ImageMethod => {
                let Some((image, rest)) = values.split_first() else {
                    return Err(TranslateError::WrongArgumentCount {
                        name: name.to_string(),
                        expected: "1".to_string(),
                        found: 0,
                        span,
                    });
                };
                let sampler = name.starts_with("sample");
                let ty = match image.ty {
                    Type::Image(channels) if sampler => Type::pixel(channels),
                    Type::Any if sampler => Type::Any,
                    _ => returns,
                };
                let rest: Vec<&str> = rest.iter().map(|v| v.code.as_str()).collect();
                Ok(Typed::atom(
                    format!("{}.{name}({})", image.code, rest.join(", ")),
                    ty,
                ))
            }
            CalleeKind::Instance | CalleeKind::Kernel => {
                self.require_instance(name, span)?;
                let args: Vec<&str> = values.iter().map(|v| v.code.as_str()).collect();
                Ok(Typed::atom(
                    format!("self.{}({})", zig::ident(name), args.join(", ")),
                    returns,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(canonical_name("sample", 2), "sampleLinear");
        assert_eq!(canonical_name("atan", 1), "atan");
        assert_eq!(canonical_name("atan", 2), "atan2");
        assert_eq!(canonical_name("mix", 3), "mix");
    }
}
