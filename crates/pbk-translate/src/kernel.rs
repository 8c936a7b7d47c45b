//! Kernel layout: symbol tables, name checks and the generated file.
//!
//! ```text
//! // heading and metadata comments
//! const std = @import("std");
//!
//! pub const kernel = struct {
//!     namespace macro constants, metadata constants
//!     parameters / inputImages / outputImages tables
//!     fn Instance(InputStruct, OutputStruct) type { fields, decls, methods }
//!     pub fn create(input, output, params)
//! };
//!
//! driver (optional)
//! ```

use crate::catalog::Signature;
use crate::context::{Context, GENERATED_MEMBERS, Symbol, SymbolKind, Visibility};
use crate::error::{Result, TranslateError};
use crate::library::{DRIVER, Helper};
use crate::macros::MacroForm;
use crate::zig;
use indexmap::IndexSet;
use pbk_ast::{Expr, ExprKind, Literal, Metadata, Parameter, Span, Type};
use tracing::debug;

impl Context<'_> {
    /// Translate the whole kernel into the generated file.
    pub(crate) fn kernel_source(&mut self, helpers: &[&Helper]) -> Result<String> {
        let members = self.member_names();
        check_member_names(&members, helpers)?;
        self.declare_symbols();
        self.register_functions();
        self.reserve_names();

        self.classify_macros()?;
        self.check_macro_names(&members)?;

        let constants = self.with_visibility(Visibility::Static, |ctx| ctx.kernel_constants())?;
        let kernel = self.kernel;
        let mut functions = Vec::new();
        for definition in kernel.functions() {
            if let Some(lines) = self.function(definition)? {
                functions.push(lines);
            }
        }
        self.visibility = Visibility::Global;

        self.heading()?;
        self.line("const std = @import(\"std\");");
        self.emitter.blank();
        self.line("pub const kernel = struct {");
        self.namespace_declarations()?;
        self.instance_type(&constants, &functions, helpers)?;
        self.emitter.blank();
        self.create_function();
        self.line("};");

        if self.options.include_driver {
            self.emitter.blank();
            self.emitter.verbatim(DRIVER);
        }

        let fresh = self.emitter.detached();
        Ok(std::mem::replace(&mut self.emitter, fresh).finish())
    }

    /// Instance members and kernel-level declarations, with spans.
    fn member_names(&self) -> Vec<(String, Span)> {
        let kernel = self.kernel;
        let mut names: Vec<(String, Span)> = Vec::new();
        names.extend(kernel.parameters().map(|p| (p.name.clone(), p.span)));
        names.extend(kernel.inputs().map(|i| (i.name.clone(), i.span)));
        names.extend(kernel.outputs().map(|o| (o.name.clone(), o.span)));
        for dependent in kernel.dependents() {
            names.extend(dependent.names.iter().map(|n| (n.clone(), dependent.span)));
        }
        for constant in kernel.constants() {
            names.extend(constant.declarators.iter().map(|d| (d.name.clone(), d.span)));
        }
        names.extend(kernel.functions().map(|f| (f.name.clone(), f.span)));
        names
    }

    fn declare_symbols(&mut self) {
        let kernel = self.kernel;
        let mut add = |name: &str, kind: SymbolKind, ty: Type| {
            self.symbols.insert(name.to_string(), Symbol { kind, ty });
        };
        for parameter in kernel.parameters() {
            add(&parameter.name, SymbolKind::Parameter, parameter.ty);
        }
        for input in kernel.inputs() {
            add(&input.name, SymbolKind::Input, input.ty);
        }
        for output in kernel.outputs() {
            add(&output.name, SymbolKind::Output, output.ty);
        }
        for dependent in kernel.dependents() {
            for name in &dependent.names {
                add(name, SymbolKind::Dependent, dependent.ty);
            }
        }
        for constant in kernel.constants() {
            for declarator in &constant.declarators {
                add(&declarator.name, SymbolKind::Constant, constant.ty);
            }
        }
    }

    /// Kernel functions are callable before their definition.
    fn register_functions(&mut self) {
        let kernel = self.kernel;
        for definition in kernel.functions().filter(|f| f.is_supported()) {
            let params: Vec<Type> = definition.arguments.iter().map(|a| a.ty).collect();
            self.functions
                .register_kernel_function(&definition.name, Signature::new(params, definition.return_type));
        }
    }

    /// Macros emitted as declarations may not collide with kernel members.
    fn check_macro_names(&self, members: &[(String, Span)]) -> Result<()> {
        for (name, form) in &self.forms {
            if *form == MacroForm::Inline || !members.iter().any(|(member, _)| member == name) {
                continue;
            }
            let span = self.macros.get(name.as_str()).map_or_else(Span::default, |m| m.span);
            return Err(TranslateError::ReservedName {
                name: name.clone(),
                span,
            });
        }
        Ok(())
    }

    fn kernel_constants(&mut self) -> Result<Vec<String>> {
        let kernel = self.kernel;
        let mut constants = Vec::new();
        for declaration in kernel.constants() {
            let ty = zig::value_type_name(declaration.ty, declaration.span)?;
            for declarator in &declaration.declarators {
                let value = match &declarator.init {
                    Some(init) => {
                        let (_, value) = self.capture(|ctx| ctx.expr(init))?;
                        value.coerce(declaration.ty, init.span)?.code
                    }
                    None => zig::zero_value(declaration.ty, declarator.span)?,
                };
                constants.push(format!("const {}: {ty} = {value};", zig::ident(&declarator.name)));
            }
        }
        Ok(constants)
    }

    fn heading(&mut self) -> Result<()> {
        let kernel = self.kernel;
        self.line(&format!(
            "// Pixel Bender kernel \"{}\" (translated using {})",
            kernel.name, self.options.tool_name
        ));
        for (key, value) in kernel.header.iter().chain(&kernel.metadata) {
            let text = self.comment_text(value)?;
            self.line(&format!("// {key}: {text}"));
        }
        self.emitter.blank();
        Ok(())
    }

    fn comment_text(&mut self, value: &Expr) -> Result<String> {
        if let ExprKind::Literal(Literal::String(text)) = &value.kind {
            return Ok(text.replace(['\n', '\r'], " "));
        }
        Ok(self.expr(value)?.code)
    }

    fn namespace_declarations(&mut self) -> Result<()> {
        let kernel = self.kernel;
        for constant in std::mem::take(&mut self.sections.namespace_constants) {
            self.line(&format!("pub {constant}"));
        }
        for (key, value) in &kernel.metadata {
            let value = self.expr(value)?;
            self.line(&format!("pub const {} = {};", zig::ident(key), value.code));
        }
        self.emitter.blank();

        self.line("pub const parameters = .{");
        for parameter in kernel.parameters() {
            self.parameter_entry(parameter)?;
        }
        self.line("};");

        let inputs: Vec<(String, u8)> = kernel.inputs().map(|i| (i.name.clone(), i.channels())).collect();
        self.image_table("inputImages", &inputs);
        let outputs: Vec<(String, u8)> = kernel.outputs().map(|o| (o.name.clone(), o.channels())).collect();
        self.image_table("outputImages", &outputs);
        self.emitter.blank();
        Ok(())
    }

    fn parameter_entry(&mut self, parameter: &Parameter) -> Result<()> {
        let ty = parameter.ty;
        self.line(&format!(".{} = .{{", zig::ident(&parameter.name)));
        self.line(&format!(".type = {},", zig::value_type_name(ty, parameter.span)?));
        let tags = [
            ("minValue", &parameter.min_value),
            ("maxValue", &parameter.max_value),
            ("stepInterval", &parameter.step_interval),
            ("defaultValue", &parameter.default_value),
            ("previewValue", &parameter.preview_value),
        ];
        for (tag, value) in tags {
            if let Some(value) = value {
                let code = self.parameter_value(value, ty)?;
                self.line(&format!(".{tag} = {code},"));
            }
        }
        self.extra_attributes(&parameter.attributes)?;
        self.line("},");
        Ok(())
    }

    /// Tag value in the parameter's type; literals carry an explicit type.
    fn parameter_value(&mut self, value: &Expr, ty: Type) -> Result<String> {
        let converted = self.expr(value)?.coerce(ty, value.span)?;
        if converted.constant.is_some() {
            return Ok(format!("@as({}, {})", zig::value_type_name(ty, value.span)?, converted.code));
        }
        Ok(converted.code)
    }

    fn extra_attributes(&mut self, attributes: &Metadata) -> Result<()> {
        for (key, value) in attributes {
            let value = self.expr(value)?;
            self.line(&format!(".{} = {},", zig::ident(key), value.code));
        }
        Ok(())
    }

    fn image_table(&mut self, name: &str, images: &[(String, u8)]) {
        if images.is_empty() {
            self.line(&format!("pub const {name} = .{{}};"));
            return;
        }
        self.line(&format!("pub const {name} = .{{"));
        for (image, channels) in images {
            self.line(&format!(".{} = .{{ .channels = {channels} }},", zig::ident(image)));
        }
        self.line("};");
    }

    fn instance_type(
        &mut self,
        constants: &[String],
        functions: &[Vec<String>],
        helpers: &[&Helper],
    ) -> Result<()> {
        let kernel = self.kernel;
        self.line("fn Instance(comptime InputStruct: type, comptime OutputStruct: type) type {");
        self.line("return struct {");

        // === Fields ===
        for parameter in kernel.parameters() {
            let ty = zig::value_type_name(parameter.ty, parameter.span)?;
            let default = match &parameter.default_value {
                Some(value) => self.expr(value)?.coerce(parameter.ty, value.span)?.code,
                None => zig::zero_value(parameter.ty, parameter.span)?,
            };
            self.line(&format!("{}: {ty} = {default},", zig::ident(&parameter.name)));
        }
        self.line("input: InputStruct,");
        self.line("output: OutputStruct,");
        for output in kernel.outputs() {
            let ty = zig::value_type_name(output.ty, output.span)?;
            self.line(&format!("{}: {ty} = undefined,", zig::ident(&output.name)));
        }
        for dependent in kernel.dependents() {
            let ty = zig::value_type_name(dependent.ty, dependent.span)?;
            for name in &dependent.names {
                self.line(&format!("{}: {ty} = undefined,", zig::ident(name)));
            }
        }
        self.line("outputCoord: @Vector(2, u32) = @splat(0),");

        // === Declarations ===
        let declarations: Vec<String> = constants
            .iter()
            .cloned()
            .chain(std::mem::take(&mut self.sections.instance_constants))
            .collect();
        if !declarations.is_empty() {
            self.emitter.blank();
            for declaration in &declarations {
                self.line(declaration);
            }
        }
        for generic in std::mem::take(&mut self.sections.generic_functions) {
            self.emitter.blank();
            self.line(&generic);
        }

        // === Methods ===
        self.emitter.blank();
        self.line("fn outCoord(self: *@This()) @Vector(2, f32) {");
        self.line("return @as(@Vector(2, f32), @floatFromInt(self.outputCoord)) + @as(@Vector(2, f32), @splat(0.5));");
        self.line("}");
        self.emitter.blank();
        self.line("pub fn setOutputCoord(self: *@This(), x: u32, y: u32) void {");
        self.line("self.outputCoord = .{ x, y };");
        self.line("}");
        self.emitter.blank();
        self.line("pub fn writeOutputPixels(self: *@This()) void {");
        let mut wrote = false;
        for output in kernel.outputs() {
            let name = zig::ident(&output.name);
            self.line(&format!(
                "self.output.{name}.setPixel(self.outputCoord[0], self.outputCoord[1], self.{name});"
            ));
            wrote = true;
        }
        if !wrote {
            self.line("_ = self;");
        }
        self.line("}");

        for function in functions {
            self.emitter.blank();
            self.line(&function.join("\n"));
        }
        for helper in helpers {
            self.emitter.blank();
            self.line(&helper.code);
        }

        self.line("};");
        self.line("}");
        debug!(
            functions = functions.len(),
            helpers = helpers.len(),
            "instance type emitted"
        );
        Ok(())
    }

    fn create_function(&mut self) {
        let evaluates_dependents = self
            .kernel
            .function("evaluateDependents")
            .is_some_and(|f| f.is_supported());
        self.line("pub fn create(input: anytype, output: anytype, params: anytype) Instance(@TypeOf(input), @TypeOf(output)) {");
        self.line("var instance: Instance(@TypeOf(input), @TypeOf(output)) = .{ .input = input, .output = output };");
        self.line("inline for (std.meta.fields(@TypeOf(params))) |field| {");
        self.line("@field(instance, field.name) = @field(params, field.name);");
        self.line("}");
        if evaluates_dependents {
            self.line("instance.evaluateDependents();");
        } else {
            self.line("_ = &instance;");
        }
        self.line("return instance;");
        self.line("}");
    }
}

/// Kernel members must be unique and must not reuse generated member
/// names, Zig primitive names or the names of included helpers.
fn check_member_names(members: &[(String, Span)], helpers: &[&Helper]) -> Result<()> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for (name, span) in members {
        let clash = GENERATED_MEMBERS.contains(&name.as_str())
            || zig::is_primitive(name)
            || helpers.iter().any(|h| h.name == *name)
            || !seen.insert(name.as_str());
        if clash {
            return Err(TranslateError::ReservedName {
                name: name.clone(),
                span: *span,
            });
        }
    }
    Ok(())
}
