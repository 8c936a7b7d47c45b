//! Expression translation.
//!
//! Every expression translates bottom-up into a [`Typed`] handle. Side
//! effects (assignments, increments, temporaries) are written to the emitter
//! as statements ahead of the expression that needs them, so the handle's
//! text is always a pure Zig expression. Operands already translated are
//! pinned in temporaries before a later operand's statements run, and code
//! that only runs conditionally (`?:` branches, the right side of `&&` and
//! `||`) is lowered to an `if` statement when it writes statements.

mod assign;
mod call;
mod construct;
mod ops;
mod swizzle;

use crate::context::{Context, SymbolKind, Visibility};
use crate::error::{Result, TranslateError};
use crate::macros::MacroForm;
use crate::scope::LocalKind;
use crate::typed::{Constant, Typed};
use crate::zig;
use pbk_ast::{BinaryOp, Expr, ExprKind, Literal, Scalar, Span, Type, UnaryOp};

/// A storage location an assignment can write.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Place {
    pub code: String,
    pub ty: Type,
    /// Usage slot of the local being written, if it is a local.
    pub slot: Option<usize>,
}

impl Context<'_> {
    /// Translate an expression whose value is used.
    pub(crate) fn expr(&mut self, expr: &Expr) -> Result<Typed> {
        self.translate(expr, true)
    }

    /// Translate an expression. With `used == false` assignments return
    /// [`Typed::void`] and skip any temporaries that only exist to produce
    /// a value.
    pub(crate) fn translate(&mut self, expr: &Expr, used: bool) -> Result<Typed> {
        let span = expr.span;
        match &expr.kind {
            // === Leaves ===
            ExprKind::Literal(literal) => translate_literal(literal, span),
            ExprKind::Variable(name) => self.variable(name, used, span),

            // === Access ===
            ExprKind::Property { base, name } => self.swizzle(base, name, span),
            ExprKind::Index { base, index } => self.index(base, index, span),

            // === Calls ===
            ExprKind::Call { name, args } => self.call(name, args, used, span),
            ExprKind::Construct { ty, args } => self.construct(*ty, args, span),

            // === Operators ===
            ExprKind::Unary { op, operand } => self.unary(*op, operand, span),
            ExprKind::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => self.short_circuit(*op, left, right, span),
                _ => {
                    let (left, right) = self.ordered(left, right)?;
                    self.combine(*op, left, right, span)
                }
            },
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => self.ternary(condition, then_expr, else_expr, span),

            // === Side effects ===
            ExprKind::Step { op, prefix, target } => self.step(*op, *prefix, target, used, span),
            ExprKind::Assign { op, target, value } => self.assign(*op, target, value, used, span),

            ExprKind::Paren(inner) => Ok(self.translate(inner, used)?.grouped()),
        }
    }

    /// A scalar condition converted to `bool`.
    pub(crate) fn condition(&mut self, expr: &Expr) -> Result<Typed> {
        let value = self.expr(expr)?;
        if value.ty.is_vector() || value.ty.is_matrix() {
            return Err(TranslateError::InvalidConversion {
                from: value.ty,
                to: Type::Bool,
                span: expr.span,
            });
        }
        value.convert(Scalar::Bool, expr.span)
    }

    fn variable(&mut self, name: &str, used: bool, span: Span) -> Result<Typed> {
        if let Some(local) = self.scope.lookup(name).cloned() {
            self.mark_read(local.slot);
            return Ok(Typed::atom(zig::ident(&local.zig), local.ty));
        }
        if let Some(value) = self.symbol(name, span)? {
            return Ok(value);
        }
        if let Some(value) = self.macro_use(name, None, used, span)? {
            return Ok(value);
        }
        Err(TranslateError::UndefinedVariable {
            name: name.to_string(),
            span,
        })
    }

    /// Kernel-level name, rendered for the current visibility.
    pub(crate) fn symbol(&mut self, name: &str, span: Span) -> Result<Option<Typed>> {
        let Some(symbol) = self.symbols.get(name).copied() else {
            return Ok(None);
        };
        let ident = zig::ident(name);
        let code = match symbol.kind {
            SymbolKind::Parameter | SymbolKind::Output | SymbolKind::Dependent => {
                self.require_instance(name, span)?;
                format!("self.{ident}")
            }
            SymbolKind::Input => {
                self.require_instance(name, span)?;
                format!("self.input.{ident}")
            }
            SymbolKind::Constant => {
                if self.visibility == Visibility::Global {
                    return Err(TranslateError::UndefinedVariable {
                        name: name.to_string(),
                        span,
                    });
                }
                ident.into_owned()
            }
            SymbolKind::MacroConstant { instance } => {
                if instance {
                    self.require_static(name, span)?;
                }
                ident.into_owned()
            }
        };
        Ok(Some(Typed::atom(code, symbol.ty)))
    }

    /// Resolve an assignment target without reading it.
    pub(crate) fn place(&mut self, target: &Expr) -> Result<Place> {
        let span = target.span;
        match &target.kind {
            ExprKind::Paren(inner) => self.place(inner),
            ExprKind::Variable(name) => self.variable_place(name, span),
            ExprKind::Index { base, index } => {
                let base = self.place(base)?;
                let index = self.index_code(index)?;
                let ty = indexed_type(base.ty, span)?;
                if ty == Type::Any {
                    return Err(TranslateError::NotGeneric {
                        operation: "indexed assignment".to_string(),
                        span,
                    });
                }
                Ok(Place {
                    code: format!("{}[{index}]", base.code),
                    ty,
                    slot: base.slot,
                })
            }
            _ => Err(TranslateError::NotAssignable {
                target: describe(target),
                span,
            }),
        }
    }

    fn variable_place(&mut self, name: &str, span: Span) -> Result<Place> {
        let not_assignable = || TranslateError::NotAssignable {
            target: name.to_string(),
            span,
        };

        if let Some(local) = self.scope.lookup(name).cloned() {
            if local.kind == LocalKind::MacroParam && local.ty == Type::Any {
                return Err(TranslateError::NotGeneric {
                    operation: format!("assignment to `{name}`"),
                    span,
                });
            }
            if !local.kind.is_assignable() {
                return Err(not_assignable());
            }
            return Ok(Place {
                code: zig::ident(&local.zig).into_owned(),
                ty: local.ty,
                slot: Some(local.slot),
            });
        }

        if let Some(symbol) = self.symbols.get(name).copied() {
            return match symbol.kind {
                SymbolKind::Output | SymbolKind::Dependent => {
                    self.require_instance(name, span)?;
                    Ok(Place {
                        code: format!("self.{}", zig::ident(name)),
                        ty: symbol.ty,
                        slot: None,
                    })
                }
                _ => Err(not_assignable()),
            };
        }

        if self.forms.get(name) == Some(&MacroForm::Inline)
            && let Some(definition) = self.macros.get(name).copied()
            && definition.params.is_none()
        {
            return self.expanding(name, span, |ctx| ctx.place(&definition.body));
        }
        if self.macros.contains_key(name) {
            return Err(not_assignable());
        }

        Err(TranslateError::UndefinedVariable {
            name: name.to_string(),
            span,
        })
    }

    /// Zig index text; runtime indices are cast to `usize`.
    fn index_code(&mut self, index: &Expr) -> Result<String> {
        let value = self.expr(index)?;
        match value.ty {
            Type::Any => Err(TranslateError::NotGeneric {
                operation: "index".to_string(),
                span: index.span,
            }),
            Type::Int => Ok(match value.constant {
                Some(Constant::Int(n)) if n >= 0 => n.to_string(),
                _ => format!("@intCast({})", value.code),
            }),
            other => Err(TranslateError::InvalidOperands {
                op: "[]".to_string(),
                left: other,
                right: Type::Int,
                span: index.span,
            }),
        }
    }

    fn index(&mut self, base: &Expr, index: &Expr, span: Span) -> Result<Typed> {
        let base = self.expr(base)?;
        let index = self.index_code(index)?;
        let ty = indexed_type(base.ty, span)?;
        Ok(Typed::atom(format!("{}[{index}]", base.operand()), ty))
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Result<Typed> {
        let value = self.expr(operand)?;
        let invalid = |ty: Type, symbol: &str| TranslateError::InvalidOperands {
            op: symbol.to_string(),
            left: ty,
            right: ty,
            span,
        };

        match op {
            UnaryOp::Neg => {
                match value.constant {
                    Some(Constant::Int(n)) => return Ok(Typed::literal(Constant::Int(n.wrapping_neg()))),
                    Some(Constant::Float(x)) => return Ok(Typed::literal(Constant::Float(-x))),
                    Some(Constant::Bool(_)) => return Err(invalid(value.ty, "-")),
                    None => {}
                }
                match value.ty {
                    Type::Matrix(_) => {
                        self.require_static("matrixOp", span)?;
                        Ok(Typed::atom(
                            format!("matrixOp(\"*\", {}, @as(f32, -1.0))", value.code),
                            value.ty,
                        ))
                    }
                    ty if ty == Type::Any || ty.is_numeric() => {
                        Ok(Typed::new(format!("-{}", value.operand()), ty))
                    }
                    ty => Err(invalid(ty, "-")),
                }
            }
            UnaryOp::Not => {
                if value.is_any() {
                    return Ok(Typed::new(format!("!{}", value.operand()), Type::Bool));
                }
                if !value.ty.is_scalar() {
                    return Err(invalid(value.ty, "!"));
                }
                let value = value.convert(Scalar::Bool, span)?;
                if let Some(Constant::Bool(b)) = value.constant {
                    return Ok(Typed::literal(Constant::Bool(!b)));
                }
                Ok(Typed::new(format!("!{}", value.operand()), Type::Bool))
            }
        }
    }

    /// Translate `exprs` left to right. A value is settled before any later
    /// operand's statements are written.
    pub(crate) fn in_order<'e>(
        &mut self,
        exprs: impl IntoIterator<Item = &'e Expr>,
    ) -> Result<Vec<Typed>> {
        let mut values: Vec<Typed> = Vec::new();
        for expr in exprs {
            let (lines, value) = self.capture(|ctx| ctx.expr(expr))?;
            if !lines.is_empty() {
                for earlier in &mut values {
                    *earlier = self.settle(earlier.clone(), expr.span)?;
                }
                self.emitter.append(&lines);
            }
            values.push(value);
        }
        Ok(values)
    }

    fn ordered(&mut self, left: &Expr, right: &Expr) -> Result<(Typed, Typed)> {
        let left = self.expr(left)?;
        let (lines, right_value) = self.capture(|ctx| ctx.expr(right))?;
        if lines.is_empty() {
            return Ok((left, right_value));
        }
        let left = self.settle(left, right.span)?;
        self.emitter.append(&lines);
        Ok((left, right_value))
    }

    /// `&&` and `||`. A right side that writes statements runs them only
    /// when the left side does not decide the result.
    fn short_circuit(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> Result<Typed> {
        let left = self.expr(left)?;
        let (lines, right) = self.capture(|ctx| ctx.expr(right))?;
        if lines.is_empty() {
            return self.combine(op, left, right, span);
        }
        if left.is_any() || right.is_any() {
            return Err(TranslateError::NotGeneric {
                operation: format!("`{}` with side effects", op.symbol()),
                span,
            });
        }
        // Operand checks only; the result is rebuilt below.
        self.combine(op, left.clone(), right.clone(), span)?;
        let left = left.convert(Scalar::Bool, span)?;
        let right = right.convert(Scalar::Bool, span)?;

        let result = self.branch_result(Type::Bool, &left.code, span)?;
        let test = match op {
            BinaryOp::And => result.clone(),
            _ => format!("!{result}"),
        };
        self.line(&format!("if ({test}) {{"));
        self.emitter.append(&lines);
        self.line(&format!("{result} = {};", right.code));
        self.line("}");
        Ok(Typed::atom(result, Type::Bool))
    }

    fn ternary(
        &mut self,
        condition: &Expr,
        then_expr: &Expr,
        else_expr: &Expr,
        span: Span,
    ) -> Result<Typed> {
        let condition = self.condition(condition)?;
        let (then_lines, then_value) = self.capture(|ctx| ctx.expr(then_expr))?;
        let (else_lines, else_value) = self.capture(|ctx| ctx.expr(else_expr))?;
        let (then_value, else_value) = self.unify("?:", then_value, else_value, span)?;
        if then_lines.is_empty() && else_lines.is_empty() {
            return Ok(Typed::new(
                format!(
                    "if ({}) {} else {}",
                    condition.code,
                    then_value.argument(),
                    else_value.argument()
                ),
                then_value.ty,
            ));
        }
        if then_value.is_any() {
            return Err(TranslateError::NotGeneric {
                operation: "`?:` with side effects".to_string(),
                span,
            });
        }

        let result = self.branch_result(then_value.ty, "undefined", span)?;
        self.line(&format!("if ({}) {{", condition.code));
        self.emitter.append(&then_lines);
        self.line(&format!("{result} = {};", then_value.code));
        self.line("} else {");
        self.emitter.append(&else_lines);
        self.line(&format!("{result} = {};", else_value.code));
        self.line("}");
        Ok(Typed::atom(result, then_value.ty))
    }

    /// Run `f` one macro expansion deeper, failing past the configured limit.
    pub(crate) fn expanding<T>(
        &mut self,
        name: &str,
        span: Span,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.macro_depth >= self.options.max_macro_depth {
            return Err(TranslateError::RecursiveMacro {
                name: name.to_string(),
                span,
            });
        }
        self.macro_depth += 1;
        let result = f(self);
        self.macro_depth -= 1;
        result
    }
}

fn translate_literal(literal: &Literal, span: Span) -> Result<Typed> {
    Ok(match literal {
        Literal::Bool(b) => Typed::literal(Constant::Bool(*b)),
        Literal::Int(n) => Typed::literal(Constant::Int(*n)),
        Literal::Float(x) => Typed::literal(Constant::Float(*x)),
        Literal::String(text) => Typed::atom(zig::string_literal(text), Type::String),
        Literal::Null => return Err(TranslateError::UnknownType { ty: Type::Void, span }),
    })
}

/// Type of `base[i]`: a vector element or a matrix column.
fn indexed_type(base: Type, span: Span) -> Result<Type> {
    match base {
        Type::Vector(scalar, _) => Ok(Type::scalar(scalar)),
        Type::Matrix(n) => Ok(Type::Vector(Scalar::Float, n)),
        Type::Any => Ok(Type::Any),
        other => Err(TranslateError::InvalidOperands {
            op: "[]".to_string(),
            left: other,
            right: Type::Int,
            span,
        }),
    }
}

/// Short source-like rendering of an assignment target for diagnostics.
fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Property { base, name } => format!("{}.{name}", describe(base)),
        ExprKind::Index { base, .. } => format!("{}[...]", describe(base)),
        ExprKind::Paren(inner) => describe(inner),
        ExprKind::Call { name, .. } => format!("{name}(...)"),
        _ => "expression".to_string(),
    }
}
