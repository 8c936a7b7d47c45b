//! AST node definitions.
//!
//! The grammar builds these directly; the translator only reads them.
//! Every node kind is a closed enum so translation passes match
//! exhaustively.

mod expr;
mod kernel;
mod stmt;
pub mod walk;

pub use expr::{AssignOp, BinaryOp, Expr, ExprKind, Literal, StepOp, UnaryOp};
pub use kernel::{
    Argument, DependentDeclaration, FunctionDefinition, InputDeclaration, Kernel, KernelItem,
    Macro, Metadata, OutputDeclaration, Parameter,
};
pub use stmt::{Declaration, Declarator, Stmt, StmtKind};
