//! `#define` macro classification and expansion.
//!
//! Macros are classified once, in source order, before any kernel function
//! is translated:
//!
//! - a macro without arguments whose body translates in the kernel namespace
//!   becomes a typed named constant;
//! - a macro with arguments whose body translates with every argument bound
//!   to an unknown type becomes a generic function taking `anytype`;
//! - anything else expands inline at each use, with the argument
//!   expressions substituted into a fresh copy of the body.
//!
//! Expansion is not hygienic: free names in a macro body resolve at the use
//! site.

use crate::context::{Context, Symbol, SymbolKind, Visibility};
use crate::error::{Result, TranslateError};
use crate::scope::LocalKind;
use crate::typed::Typed;
use crate::zig;
use indexmap::IndexMap;
use pbk_ast::{Expr, Macro, Span, Type};
use tracing::debug;

/// How uses of a macro are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MacroForm {
    /// Named constant, registered as a symbol.
    Constant,
    /// Generic function in the instance type.
    Generic,
    /// Substituted at every use.
    Inline,
}

/// Outcome of translating a macro body on its own.
#[derive(Debug)]
pub(crate) enum Probe {
    Translated { lines: Vec<String>, value: Typed },
    /// The body depends on its use site.
    Fallback(TranslateError),
}

impl Context<'_> {
    pub(crate) fn classify_macros(&mut self) -> Result<()> {
        let macros: Vec<&Macro> = self.macros.values().copied().collect();
        for definition in macros {
            let form = if definition.takes_no_arguments() {
                self.classify_constant(definition)?
            } else {
                self.classify_generic(definition)?
            };
            debug!(name = %definition.name, ?form, "macro classified");
            self.forms.insert(definition.name.clone(), form);
        }
        Ok(())
    }

    fn probe(
        &mut self,
        parameterized: bool,
        f: impl FnOnce(&mut Self) -> Result<Typed>,
    ) -> Result<Probe> {
        match self.capture(f) {
            Ok((lines, value)) => Ok(Probe::Translated { lines, value }),
            Err(err) if err.is_probe_fallback(parameterized) => Ok(Probe::Fallback(err)),
            Err(err) => Err(err),
        }
    }

    fn classify_constant(&mut self, definition: &Macro) -> Result<MacroForm> {
        self.placement = Some(false);
        let probe = self.with_visibility(Visibility::Global, |ctx| {
            ctx.detached_scope(|ctx| ctx.probe(false, |ctx| ctx.expr(&definition.body)))
        });
        let instance = self.placement.take().unwrap_or(false);

        let (lines, value) = match probe? {
            Probe::Translated { lines, value } => (lines, value),
            Probe::Fallback(reason) => {
                debug!(name = %definition.name, %reason, "macro expands inline");
                return Ok(MacroForm::Inline);
            }
        };
        let Ok(ty) = zig::value_type_name(value.ty, definition.span) else {
            return Ok(MacroForm::Inline);
        };
        if !lines.is_empty() {
            return Ok(MacroForm::Inline);
        }

        let declaration = format!("const {}: {ty} = {};", zig::ident(&definition.name), value.code);
        if instance {
            self.sections.instance_constants.push(declaration);
        } else {
            self.sections.namespace_constants.push(declaration);
        }
        self.symbols.insert(
            definition.name.clone(),
            Symbol {
                kind: SymbolKind::MacroConstant { instance },
                ty: value.ty,
            },
        );
        Ok(MacroForm::Constant)
    }

    fn classify_generic(&mut self, definition: &Macro) -> Result<MacroForm> {
        let params = definition.params.as_deref().unwrap_or_default();
        let saved_usage = std::mem::take(&mut self.usage);
        let probed = self.with_visibility(Visibility::Static, |ctx| {
            ctx.detached_scope(|ctx| {
                let slots: Vec<usize> = params
                    .iter()
                    .map(|param| ctx.declare_local(param, Type::Any, LocalKind::MacroParam))
                    .collect();
                let probe = ctx.probe(true, |ctx| ctx.expr(&definition.body))?;
                Ok((slots, probe))
            })
        });
        let usage = std::mem::replace(&mut self.usage, saved_usage);
        let (slots, probe) = probed?;

        let (lines, value) = match probe {
            Probe::Translated { lines, value } => (lines, value),
            Probe::Fallback(reason) => {
                debug!(name = %definition.name, %reason, "macro expands inline");
                return Ok(MacroForm::Inline);
            }
        };
        let returns = match value.ty {
            Type::Any => format!("@TypeOf({})", value.code),
            ty => zig::value_type_name(ty, definition.span)
                .unwrap_or_else(|_| format!("@TypeOf({})", value.code)),
        };

        let mut signature = Vec::with_capacity(slots.len());
        let mut discards = Vec::new();
        for &slot in &slots {
            let Some(param) = usage.get(slot) else {
                continue;
            };
            let name = zig::ident(&param.zig);
            signature.push(format!("{name}: anytype"));
            if !param.read {
                discards.push(format!("_ = {name};"));
            }
        }

        let mut code = vec![format!(
            "fn {}({}) {returns} {{",
            zig::ident(&definition.name),
            signature.join(", ")
        )];
        code.extend(discards);
        code.extend(lines);
        code.push(format!("return {};", value.code));
        code.push("}".to_string());
        self.sections.generic_functions.push(code.join("\n"));
        Ok(MacroForm::Generic)
    }

    /// Translate `name` or `name(args)` when `name` is a classified macro.
    pub(crate) fn macro_use(
        &mut self,
        name: &str,
        args: Option<&[Expr]>,
        used: bool,
        span: Span,
    ) -> Result<Option<Typed>> {
        let Some(form) = self.forms.get(name).copied() else {
            return Ok(None);
        };
        let Some(definition) = self.macros.get(name).copied() else {
            return Ok(None);
        };
        let arity_error = |found: usize| TranslateError::WrongArgumentCount {
            name: name.to_string(),
            expected: definition.arity().to_string(),
            found,
            span,
        };

        match (form, args) {
            (MacroForm::Constant, Some(args)) if !args.is_empty() => Err(arity_error(args.len())),
            (MacroForm::Constant, _) => self.symbol(name, span),
            (MacroForm::Generic, None) => Err(TranslateError::UndefinedVariable {
                name: name.to_string(),
                span,
            }),
            (MacroForm::Generic, Some(args)) => {
                if args.len() != definition.arity() {
                    return Err(arity_error(args.len()));
                }
                self.generic_call(definition, args, span).map(Some)
            }
            (MacroForm::Inline, args) => {
                let args = args.unwrap_or_default();
                match &definition.params {
                    None if !args.is_empty() => return Err(arity_error(args.len())),
                    Some(params) if params.len() != args.len() => {
                        return Err(arity_error(args.len()));
                    }
                    _ => {}
                }
                let bindings: IndexMap<String, Expr> = definition
                    .params
                    .iter()
                    .flatten()
                    .cloned()
                    .zip(args.iter().cloned())
                    .collect();
                let expanded = definition.body.substitute(&bindings);
                self.expanding(name, span, |ctx| ctx.translate(&expanded, used))
                    .map(Some)
            }
        }
    }

    fn generic_call(&mut self, definition: &Macro, args: &[Expr], span: Span) -> Result<Typed> {
        let values = self.in_order(args)?;
        self.require_static(&definition.name, span)?;
        let ty = self.retype(definition, &values)?;
        let args: Vec<String> = values.iter().map(Typed::argument).collect();
        Ok(Typed::atom(
            format!("{}({})", zig::ident(&definition.name), args.join(", ")),
            ty,
        ))
    }

    /// Result type of a generic macro for concrete argument types.
    fn retype(&mut self, definition: &Macro, values: &[Typed]) -> Result<Type> {
        let params = definition.params.as_deref().unwrap_or_default();
        let saved_usage = std::mem::take(&mut self.usage);
        let result = self.with_visibility(Visibility::Static, |ctx| {
            ctx.detached_scope(|ctx| {
                for (param, value) in params.iter().zip(values) {
                    ctx.declare_local(param, value.ty, LocalKind::MacroParam);
                }
                ctx.capture(|ctx| ctx.expr(&definition.body))
                    .map(|(_, value)| value.ty)
            })
        });
        self.usage = saved_usage;
        result
    }
}
