//! Per-translation state.
//!
//! A [`Context`] is built fresh for every [`crate::Translator::translate`]
//! call and owns everything that changes while a kernel is translated: the
//! emitter, the local scopes, the function table, the kernel-level symbol
//! table, macro classifications and the usage table that decides `var`
//! versus `const` for locals.

use crate::catalog::FunctionTable;
use crate::emitter::Emitter;
use crate::error::{Result, TranslateError};
use crate::library::Library;
use crate::macros::MacroForm;
use crate::options::TranslateOptions;
use crate::scope::{Local, LocalKind, ScopeStack};
use crate::typed::Typed;
use crate::zig;
use indexmap::{IndexMap, IndexSet};
use pbk_ast::{Kernel, Macro, Span, Type};

/// Members of the generated code that kernel names may not reuse.
pub(crate) const GENERATED_MEMBERS: &[&str] = &[
    "input",
    "output",
    "outputCoord",
    "outCoord",
    "setOutputCoord",
    "writeOutputPixels",
];

/// Declarations around the instance type that locals may not shadow.
const ENCLOSING_DECLS: &[&str] = &[
    "std",
    "kernel",
    "Instance",
    "create",
    "parameters",
    "inputImages",
    "outputImages",
    "InputStruct",
    "OutputStruct",
    "self",
    "outCoord",
    "setOutputCoord",
    "writeOutputPixels",
];

/// Which kernel-level names an expression may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visibility {
    /// Kernel namespace: metadata, parameter tables, macro constants.
    Global,
    /// Instance-level declarations: kernel constants, generic macros.
    Static,
    /// Kernel function bodies.
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolKind {
    Parameter,
    Input,
    Output,
    Dependent,
    Constant,
    MacroConstant {
        /// Declared inside the instance type instead of the namespace.
        instance: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Symbol {
    pub kind: SymbolKind,
    pub ty: Type,
}

/// How often a local was read and written, for `var`/`const` and discards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Usage {
    pub zig: String,
    pub read: bool,
    pub written: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Loop {
    /// Block label that `continue` breaks out of (do-while bodies).
    pub continue_label: Option<String>,
    pub label_used: bool,
}

/// Generated declarations collected before the layout is written.
#[derive(Debug, Clone, Default)]
pub(crate) struct Sections {
    pub namespace_constants: Vec<String>,
    pub instance_constants: Vec<String>,
    pub generic_functions: Vec<String>,
}

pub(crate) struct Context<'a> {
    pub options: &'a TranslateOptions,
    pub library: &'a Library,
    pub kernel: &'a Kernel,
    pub macros: IndexMap<&'a str, &'a Macro>,
    pub forms: IndexMap<String, MacroForm>,
    pub emitter: Emitter,
    pub scope: ScopeStack,
    pub functions: FunctionTable,
    pub symbols: IndexMap<String, Symbol>,
    pub sections: Sections,
    pub visibility: Visibility,
    /// Set while a zero-argument macro is probed: becomes `true` when the
    /// body needs the instance type (helper calls, instance constants).
    pub placement: Option<bool>,
    pub reserved: IndexSet<String>,
    pub usage: Vec<Usage>,
    pub loops: Vec<Loop>,
    /// Temporaries of the current function holding a finished value.
    pub snapshots: IndexSet<String>,
    counter: usize,
    pub macro_depth: usize,
    pub self_used: bool,
    pub return_type: Type,
}

impl<'a> Context<'a> {
    pub fn new(
        options: &'a TranslateOptions,
        library: &'a Library,
        kernel: &'a Kernel,
        macros: &'a [Macro],
    ) -> Self {
        Self {
            options,
            library,
            kernel,
            macros: macros.iter().map(|m| (m.name.as_str(), m)).collect(),
            forms: IndexMap::new(),
            emitter: Emitter::new(options.indent_width),
            scope: ScopeStack::new(),
            functions: FunctionTable::with_builtins(),
            symbols: IndexMap::new(),
            sections: Sections::default(),
            visibility: Visibility::Global,
            placement: None,
            reserved: IndexSet::new(),
            usage: Vec::new(),
            loops: Vec::new(),
            snapshots: IndexSet::new(),
            counter: 0,
            macro_depth: 0,
            self_used: false,
            return_type: Type::Void,
        }
    }

    /// Names locals must not take: every container declaration a function
    /// body can see.
    pub fn reserve_names(&mut self) {
        let mut reserved: IndexSet<String> = ENCLOSING_DECLS.iter().map(|s| s.to_string()).collect();
        reserved.extend(self.library.names().map(str::to_string));
        reserved.extend(self.functions.names().map(str::to_string));
        reserved.extend(self.kernel.functions().map(|f| f.name.clone()));
        reserved.extend(
            self.kernel
                .constants()
                .flat_map(|c| c.declarators.iter().map(|d| d.name.clone())),
        );
        reserved.extend(self.macros.keys().map(|name| name.to_string()));
        reserved.extend(self.kernel.metadata.keys().cloned());
        self.reserved = reserved;
    }

    /// Run `f` with output going to a fresh emitter; returns the captured
    /// lines with the result.
    pub fn capture<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<(Vec<String>, T)> {
        let detached = self.emitter.detached();
        let outer = std::mem::replace(&mut self.emitter, detached);
        let result = f(self);
        let inner = std::mem::replace(&mut self.emitter, outer);
        result.map(|value| (inner.into_lines(), value))
    }

    pub fn with_visibility<T>(
        &mut self,
        visibility: Visibility,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.visibility, visibility);
        let result = f(self);
        self.visibility = saved;
        result
    }

    /// Run `f` inside a new block scope.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope.push();
        let result = f(self);
        self.scope.pop();
        result
    }

    /// Run `f` with an empty scope stack, restoring the current one after.
    pub fn detached_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = std::mem::take(&mut self.scope);
        let result = f(self);
        self.scope = saved;
        result
    }

    pub fn line(&mut self, text: &str) {
        self.emitter.line(text);
    }

    fn is_free(&self, candidate: &str) -> bool {
        !self.reserved.contains(candidate)
            && !zig::is_primitive(candidate)
            && !self.scope.is_taken(candidate)
    }

    /// `base`, or `base_N` when `base` would clash with a visible name.
    pub fn fresh_name(&self, base: &str) -> String {
        if self.is_free(base) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}_{n}");
            if self.is_free(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn next_id(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    /// Declare a local in the current scope; returns its usage slot.
    pub fn declare_local(&mut self, name: &str, ty: Type, kind: LocalKind) -> usize {
        let zig = self.fresh_name(name);
        let slot = self.usage.len();
        self.usage.push(Usage {
            zig: zig.clone(),
            read: false,
            written: false,
        });
        self.scope.declare(
            name,
            Local {
                zig,
                ty,
                kind,
                slot,
            },
        );
        slot
    }

    pub fn local_name(&self, slot: usize) -> &str {
        self.usage.get(slot).map_or("_", |u| u.zig.as_str())
    }

    pub fn mark_read(&mut self, slot: usize) {
        if let Some(usage) = self.usage.get_mut(slot) {
            usage.read = true;
        }
    }

    pub fn mark_written(&mut self, slot: usize) {
        if let Some(usage) = self.usage.get_mut(slot) {
            usage.written = true;
        }
    }

    /// Store `value` in a new `const` so it is evaluated once.
    pub fn temp(&mut self, value: Typed, span: Span) -> Result<Typed> {
        let id = self.next_id();
        let name = self.fresh_name(&format!("tmp_{id}"));
        self.scope.take(&name);
        let line = if value.is_any() {
            format!("const {name} = {};", value.code)
        } else {
            let ty = zig::value_type_name(value.ty, span)?;
            format!("const {name}: {ty} = {};", value.code)
        };
        self.line(&line);
        self.snapshots.insert(name.clone());
        Ok(Typed::atom(name, value.ty))
    }

    /// Pin `value` before statements that run after it but belong to the
    /// same expression: anything that reads state goes into a temporary.
    pub fn settle(&mut self, value: Typed, span: Span) -> Result<Typed> {
        let stable = value.constant.is_some()
            || self.visibility != Visibility::Instance
            || self.snapshots.contains(&value.code)
            || matches!(
                value.ty,
                Type::Void | Type::Image(_) | Type::Region | Type::ImageRef | Type::String
            );
        if stable {
            return Ok(value);
        }
        self.temp(value, span)
    }

    /// Declare a `var` temporary for a value computed inside branches.
    /// The caller assigns it on every path before it is read.
    pub fn branch_result(&mut self, ty: Type, init: &str, span: Span) -> Result<String> {
        let ty = zig::value_type_name(ty, span)?;
        let id = self.next_id();
        let name = self.fresh_name(&format!("tmp_{id}"));
        self.scope.take(&name);
        self.line(&format!("var {name}: {ty} = {init};"));
        self.snapshots.insert(name.clone());
        Ok(name)
    }

    /// Make `value` safe to repeat: instance code stores compound values in
    /// a temporary, other contexts parenthesize them.
    pub fn hoist(&mut self, value: Typed, span: Span) -> Result<Typed> {
        if value.atomic {
            return Ok(value);
        }
        if self.visibility == Visibility::Instance {
            return self.temp(value, span);
        }
        let code = value.operand().into_owned();
        Ok(Typed {
            code,
            atomic: true,
            swizzle: None,
            ..value
        })
    }

    /// Instance state or a kernel function was referenced; rejected outside
    /// kernel functions.
    pub fn require_instance(&mut self, name: &str, span: Span) -> Result<()> {
        if self.visibility == Visibility::Instance {
            self.self_used = true;
            Ok(())
        } else {
            Err(TranslateError::UndefinedVariable {
                name: name.to_string(),
                span,
            })
        }
    }

    /// Something only the instance type can see (a helper call, an
    /// instance constant) was used; allowed everywhere except the kernel
    /// namespace, where it moves a probed macro constant into the instance.
    pub fn require_static(&mut self, name: &str, span: Span) -> Result<()> {
        if self.visibility != Visibility::Global {
            return Ok(());
        }
        match self.placement.as_mut() {
            Some(instance) => {
                *instance = true;
                Ok(())
            }
            None => Err(TranslateError::UndefinedVariable {
                name: name.to_string(),
                span,
            }),
        }
    }

    /// Reset per-function state before a function body is translated.
    pub fn begin_function(&mut self, return_type: Type) {
        self.scope = ScopeStack::new();
        self.usage.clear();
        self.loops.clear();
        self.snapshots.clear();
        self.counter = 0;
        self.self_used = false;
        self.return_type = return_type;
        self.visibility = Visibility::Instance;
    }
}

/// Placeholder for `var`/`const`, resolved once the function is done.
pub(crate) fn decl_marker(slot: usize) -> String {
    format!("\u{1}decl:{slot}\u{1}")
}

/// Line replaced by `_ = name;` when the local is never used.
pub(crate) fn discard_marker(slot: usize) -> String {
    format!("\u{1}discard:{slot}\u{1}")
}

/// Resolve declaration and discard markers in captured function lines.
pub(crate) fn patch_markers(lines: Vec<String>, usage: &[Usage]) -> Vec<String> {
    let mut patched = Vec::with_capacity(lines.len());
    for line in lines {
        let trimmed = line.trim();
        if let Some(slot) = trimmed
            .strip_prefix("\u{1}discard:")
            .and_then(|rest| rest.strip_suffix('\u{1}'))
            .and_then(|n| n.parse::<usize>().ok())
        {
            if let Some(u) = usage.get(slot)
                && !u.read
                && !u.written
            {
                patched.push(format!("_ = {};", zig::ident(&u.zig)));
            }
            continue;
        }
        patched.push(replace_decl_markers(&line, usage));
    }
    patched
}

fn replace_decl_markers(line: &str, usage: &[Usage]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("\u{1}decl:") {
        out.push_str(&rest[..start]);
        let after = &rest[start + "\u{1}decl:".len()..];
        let Some(end) = after.find('\u{1}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let written = after[..end]
            .parse::<usize>()
            .ok()
            .and_then(|slot| usage.get(slot))
            .is_some_and(|u| u.written);
        out.push_str(if written { "var" } else { "const" });
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(zig: &str, read: bool, written: bool) -> Usage {
        Usage {
            zig: zig.to_string(),
            read,
            written,
        }
    }

    #[test]
    fn test_markers_pick_var_for_written_locals() {
        let lines = vec![
            format!("{} a: f32 = 1.0;", decl_marker(0)),
            discard_marker(0),
            format!("{} b: f32 = a;", decl_marker(1)),
            discard_marker(1),
            "a = 2.0;".to_string(),
        ];
        let table = [usage("a", true, true), usage("b", false, false)];
        let patched = patch_markers(lines, &table);
        assert_eq!(
            patched,
            [
                "var a: f32 = 1.0;",
                "const b: f32 = a;",
                "_ = b;",
                "a = 2.0;"
            ]
        );
    }

    #[test]
    fn test_discard_escapes_keywords() {
        let table = [usage("error", false, false)];
        let patched = patch_markers(vec![discard_marker(0)], &table);
        assert_eq!(patched, ["_ = @\"error\";"]);
    }
}
