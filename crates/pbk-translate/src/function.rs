//! Kernel function definitions become methods of the instance type.

use crate::context::{Context, Usage, patch_markers};
use crate::error::Result;
use crate::scope::LocalKind;
use crate::zig;
use pbk_ast::FunctionDefinition;
use tracing::warn;

/// Functions the driver calls from outside the instance.
const ENTRY_POINTS: &[&str] = &["evaluatePixel", "evaluateDependents"];

impl Context<'_> {
    /// Translate one kernel function into the lines of a Zig method.
    /// Functions with `region`/`imageRef` in their signature are skipped.
    pub(crate) fn function(&mut self, definition: &FunctionDefinition) -> Result<Option<Vec<String>>> {
        if !definition.is_supported() {
            warn!(name = %definition.name, "skipping function with region or imageRef types");
            return Ok(None);
        }

        self.begin_function(definition.return_type);
        let mut slots = Vec::with_capacity(definition.arguments.len());
        for argument in &definition.arguments {
            zig::value_type_name(argument.ty, argument.span)?;
            slots.push(self.declare_local(&argument.name, argument.ty, LocalKind::Argument));
        }

        let (lines, ()) = self.capture(|ctx| ctx.scoped(|ctx| ctx.statements(&definition.body)))?;
        let usage = std::mem::take(&mut self.usage);
        let body = patch_markers(lines, &usage);

        let mut params = vec!["self: *@This()".to_string()];
        let mut prologue = Vec::new();
        if !self.self_used {
            prologue.push("_ = self;".to_string());
        }
        for (argument, &slot) in definition.arguments.iter().zip(&slots) {
            let Some(local) = usage.get(slot) else {
                continue;
            };
            let ty = zig::value_type_name(argument.ty, argument.span)?;
            let name = zig::ident(&local.zig).into_owned();
            if local.written {
                // Arguments are immutable in Zig; written ones get a copy.
                let incoming = fresh_argument_name(&local.zig, &usage);
                params.push(format!("{}: {ty}", zig::ident(&incoming)));
                prologue.push(format!("var {name}: {ty} = {};", zig::ident(&incoming)));
            } else {
                params.push(format!("{name}: {ty}"));
                if !local.read {
                    prologue.push(format!("_ = {name};"));
                }
            }
        }

        let visibility = if ENTRY_POINTS.contains(&definition.name.as_str()) {
            "pub "
        } else {
            ""
        };
        let returns = zig::type_name(definition.return_type, definition.span)?;
        let mut code = vec![format!(
            "{visibility}fn {}({}) {returns} {{",
            zig::ident(&definition.name),
            params.join(", ")
        )];
        code.extend(prologue);
        code.extend(body);
        code.push("}".to_string());
        Ok(Some(code))
    }
}

/// `name_in`, suffixed further if a local of the function already uses it.
fn fresh_argument_name(name: &str, usage: &[Usage]) -> String {
    let taken = |candidate: &str| usage.iter().any(|u| u.zig == candidate);
    let base = format!("{name}_in");
    if !taken(&base) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_argument_name_avoids_locals() {
        let usage = vec![
            Usage {
                zig: "x".to_string(),
                read: true,
                written: true,
            },
            Usage {
                zig: "x_in".to_string(),
                read: true,
                written: false,
            },
        ];
        assert_eq!(fresh_argument_name("x", &usage), "x_in_1");
        assert_eq!(fresh_argument_name("y", &usage), "y_in");
    }
}
