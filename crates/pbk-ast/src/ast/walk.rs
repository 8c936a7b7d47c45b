//! Tree walking utilities.
//!
//! Closure-based pre-order traversal shared by the analysis passes (helper
//! usage scanning, matrix detection) so none of them re-implement recursive
//! descent.
//!
//! # Examples
//!
//! ```rust,ignore
//! use pbk_ast::walk::walk_stmts;
//! use pbk_ast::ExprKind;
//!
//! // Collect every called name
//! let mut calls = Vec::new();
//! walk_stmts(&function.body, &mut |node| {
//!     if let ExprKind::Call { name, .. } = &node.kind {
//!         calls.push(name.clone());
//!     }
//! });
//! ```

use super::{Expr, ExprKind, Stmt, StmtKind};
use crate::foundation::Type;

/// Walk an expression tree in pre-order, calling `visitor` for each node.
pub fn walk_expr<V>(expr: &Expr, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    visitor(expr);

    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Variable(_) => {}
        ExprKind::Property { base, .. } => walk_expr(base, visitor),
        ExprKind::Index { base, index } => {
            walk_expr(base, visitor);
            walk_expr(index, visitor);
        }
        ExprKind::Call { args, .. } | ExprKind::Construct { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Step { target, .. } => walk_expr(target, visitor),
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, visitor);
            walk_expr(right, visitor);
        }
        ExprKind::Ternary {
            condition,
            then_expr,
            else_expr,
        } => {
            walk_expr(condition, visitor);
            walk_expr(then_expr, visitor);
            walk_expr(else_expr, visitor);
        }
        ExprKind::Assign { target, value, .. } => {
            walk_expr(target, visitor);
            walk_expr(value, visitor);
        }
        ExprKind::Paren(inner) => walk_expr(inner, visitor),
    }
}

/// Walk every expression reachable from a statement.
pub fn walk_stmt<V>(stmt: &Stmt, visitor: &mut V)
where
    V: FnMut(&Expr),
{
    match &stmt.kind {
        StmtKind::Block(stmts) => walk_stmts(stmts, visitor),
        StmtKind::Variable(decl) | StmtKind::Constant(decl) => {
            for init in decl.declarators.iter().filter_map(|d| d.init.as_ref()) {
                walk_expr(init, visitor);
            }
        }
        StmtKind::Expression(expr) => walk_expr(expr, visitor),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            walk_expr(condition, visitor);
            walk_stmt(then_branch, visitor);
            if let Some(else_branch) = else_branch {
                walk_stmt(else_branch, visitor);
            }
        }
        StmtKind::While { condition, body } | StmtKind::DoWhile { body, condition } => {
            walk_expr(condition, visitor);
            walk_stmt(body, visitor);
        }
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => {
            if let Some(init) = init {
                walk_stmt(init, visitor);
            }
            if let Some(condition) = condition {
                walk_expr(condition, visitor);
            }
            if let Some(update) = update {
                walk_expr(update, visitor);
            }
            walk_stmt(body, visitor);
        }
        StmtKind::Return(Some(expr)) => walk_expr(expr, visitor),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
    }
}

pub fn walk_stmts<V>(stmts: &[Stmt], visitor: &mut V)
where
    V: FnMut(&Expr),
{
    for stmt in stmts {
        walk_stmt(stmt, visitor);
    }
}

/// Call `visitor` with the type of every local declaration and every
/// constructor in the statements.
pub fn visit_types<V>(stmts: &[Stmt], visitor: &mut V)
where
    V: FnMut(Type),
{
    visit_declared_types(stmts, visitor);
    walk_stmts(stmts, &mut |node| {
        if let ExprKind::Construct { ty, .. } = &node.kind {
            visitor(*ty);
        }
    });
}

fn visit_declared_types<V>(stmts: &[Stmt], visitor: &mut V)
where
    V: FnMut(Type),
{
    for stmt in stmts {
        match &stmt.kind {
            StmtKind::Variable(decl) | StmtKind::Constant(decl) => visitor(decl.ty),
            StmtKind::Block(inner) => visit_declared_types(inner, visitor),
            StmtKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                visit_declared_types(std::slice::from_ref(then_branch.as_ref()), visitor);
                if let Some(else_branch) = else_branch {
                    visit_declared_types(std::slice::from_ref(else_branch.as_ref()), visitor);
                }
            }
            StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
                visit_declared_types(std::slice::from_ref(body.as_ref()), visitor);
            }
            StmtKind::For { init, body, .. } => {
                if let Some(init) = init {
                    visit_declared_types(std::slice::from_ref(init.as_ref()), visitor);
                }
                visit_declared_types(std::slice::from_ref(body.as_ref()), visitor);
            }
            StmtKind::Expression(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Return(_)
            | StmtKind::Empty => {}
        }
    }
}
