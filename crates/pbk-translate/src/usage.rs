//! Which runtime helpers a kernel needs.
//!
//! The scan is syntactic: every call name in kernel functions, kernel
//! constants, parameter tags and macro bodies that names a library helper is
//! kept, plus `matrixOp` whenever a matrix type appears anywhere. Macro
//! bodies are scanned whole because generic macros and macro constants are
//! emitted whether or not they are used.

use crate::catalog::IMAGE_METHODS;
use crate::library::Library;
use indexmap::IndexSet;
use pbk_ast::walk::{visit_types, walk_expr, walk_stmts};
use pbk_ast::{Expr, ExprKind, Kernel, Macro, Type};
use tracing::debug;

const MATRIX_HELPER: &str = "matrixOp";

/// Helper names called by the kernel, before closing over helper calls.
pub fn required_helpers(kernel: &Kernel, macros: &[Macro], library: &Library) -> IndexSet<String> {
    let mut required = IndexSet::new();
    let mut uses_matrix = false;

    let mut scan = |expr: &Expr| match &expr.kind {
        ExprKind::Call { name, args } => {
            if macros.iter().any(|m| &m.name == name) || kernel.function(name).is_some() {
                return;
            }
            let name = match (name.as_str(), args.len()) {
                ("sample", _) => "sampleLinear",
                ("atan", 2) => "atan2",
                (name, _) => name,
            };
            if name == "outCoord" || IMAGE_METHODS.contains(&name) {
                return;
            }
            if library.contains(name) {
                required.insert(name.to_string());
            }
        }
        ExprKind::Construct { ty, .. } if ty.is_matrix() => uses_matrix = true,
        _ => {}
    };

    for function in kernel.functions().filter(|f| f.is_supported()) {
        walk_stmts(&function.body, &mut scan);
    }
    for declarator in kernel.constants().flat_map(|c| &c.declarators) {
        if let Some(init) = &declarator.init {
            walk_expr(init, &mut scan);
        }
    }
    for parameter in kernel.parameters() {
        let tags = [
            &parameter.min_value,
            &parameter.max_value,
            &parameter.step_interval,
            &parameter.default_value,
            &parameter.preview_value,
        ];
        for value in tags.into_iter().flatten().chain(parameter.attributes.values()) {
            walk_expr(value, &mut scan);
        }
    }
    for definition in macros {
        walk_expr(&definition.body, &mut scan);
    }

    let uses_matrix = uses_matrix || declares_matrix(kernel);
    if uses_matrix && library.contains(MATRIX_HELPER) {
        required.insert(MATRIX_HELPER.to_string());
    }

    debug!(helpers = ?required, "helpers referenced by kernel");
    required
}

/// Any matrix in a parameter, dependent, constant, signature or local.
fn declares_matrix(kernel: &Kernel) -> bool {
    let mut found = kernel.parameters().any(|p| p.ty.is_matrix())
        || kernel.dependents().any(|d| d.ty.is_matrix())
        || kernel.constants().any(|c| c.ty.is_matrix());

    for function in kernel.functions().filter(|f| f.is_supported()) {
        found |= function.return_type.is_matrix()
            || function.arguments.iter().any(|a| a.ty.is_matrix());
        visit_types(&function.body, &mut |ty: Type| found |= ty.is_matrix());
    }
    found
}
