//! Statement nodes.

use super::Expr;
use crate::foundation::{Span, Type};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// `float3 a = x, b;`
    Variable(Declaration),
    /// `const float k = 2.0;`
    Constant(Declaration),
    Expression(Expr),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    Empty,
}

/// A typed declaration introducing one or more names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub ty: Type,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// One `name [= init]` inside a declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}
