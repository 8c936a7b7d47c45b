//! Expression nodes.

use crate::foundation::{Span, Type};
use indexmap::IndexMap;
use serde::Serialize;

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds.
///
/// The grammar only produces `Property` and `Index` over a `Variable` base;
/// macro substitution may rebuild them onto arbitrary argument expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Literal(Literal),
    Variable(String),
    /// `base.name`: swizzle or component access
    Property {
        base: Box<Expr>,
        name: String,
    },
    /// `base[index]`
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// `name(args)`: built-in, kernel function or macro
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `float3(args)` and friends
    Construct {
        ty: Type,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `++x`, `x--`, ...
    Step {
        op: StepOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StepOp {
    Increment,
    Decrement,
}

impl StepOp {
    /// The compound assignment the step lowers to (`x += 1`).
    pub fn compound(self) -> AssignOp {
        match self {
            StepOp::Increment => AssignOp::Add,
            StepOp::Decrement => AssignOp::Sub,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^^",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    /// `< > <= >=`
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    /// `== !=`
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// Arithmetic applied before storing, `None` for plain `=`.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Deep copy of this tree with variable leaves named in `bindings`
    /// replaced by (copies of) the bound expressions.
    ///
    /// Every call produces an independent tree, so two expansions of the same
    /// macro never share nodes. A property or index on a replaced variable is
    /// rebuilt onto the replacement.
    pub fn substitute(&self, bindings: &IndexMap<String, Expr>) -> Expr {
        let boxed = |e: &Expr| Box::new(e.substitute(bindings));
        let kind = match &self.kind {
            ExprKind::Variable(name) => match bindings.get(name) {
                Some(replacement) => return replacement.clone(),
                None => ExprKind::Variable(name.clone()),
            },
            ExprKind::Literal(lit) => ExprKind::Literal(lit.clone()),
            ExprKind::Property { base, name } => ExprKind::Property {
                base: boxed(base),
                name: name.clone(),
            },
            ExprKind::Index { base, index } => ExprKind::Index {
                base: boxed(base),
                index: boxed(index),
            },
            ExprKind::Call { name, args } => ExprKind::Call {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            ExprKind::Construct { ty, args } => ExprKind::Construct {
                ty: *ty,
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            ExprKind::Unary { op, operand } => ExprKind::Unary {
                op: *op,
                operand: boxed(operand),
            },
            ExprKind::Step { op, prefix, target } => ExprKind::Step {
                op: *op,
                prefix: *prefix,
                target: boxed(target),
            },
            ExprKind::Binary { op, left, right } => ExprKind::Binary {
                op: *op,
                left: boxed(left),
                right: boxed(right),
            },
            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => ExprKind::Ternary {
                condition: boxed(condition),
                then_expr: boxed(then_expr),
                else_expr: boxed(else_expr),
            },
            ExprKind::Assign { op, target, value } => ExprKind::Assign {
                op: *op,
                target: boxed(target),
                value: boxed(value),
            },
            ExprKind::Paren(inner) => ExprKind::Paren(boxed(inner)),
        };
        Expr::new(kind, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expr {
        Expr::new(ExprKind::Variable(name.into()), Span::default())
    }

    fn lit(value: f64) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Float(value)), Span::default())
    }

    #[test]
    fn test_substitute_replaces_only_bound_leaves() {
        let body = Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Mul,
                left: Box::new(var("x")),
                right: Box::new(var("scale")),
            },
            Span::default(),
        );
        let mut bindings = IndexMap::new();
        bindings.insert("x".to_string(), lit(2.0));

        let expanded = body.substitute(&bindings);
        let ExprKind::Binary { left, right, .. } = &expanded.kind else {
            panic!("expected binary, got {:?}", expanded.kind);
        };
        assert_eq!(left.kind, ExprKind::Literal(Literal::Float(2.0)));
        assert_eq!(right.kind, ExprKind::Variable("scale".into()));
    }

    #[test]
    fn test_substitute_rebuilds_property_onto_argument() {
        let body = Expr::new(
            ExprKind::Property {
                base: Box::new(var("p")),
                name: "rgb".into(),
            },
            Span::default(),
        );
        let argument = Expr::new(
            ExprKind::Call {
                name: "f".into(),
                args: vec![],
            },
            Span::default(),
        );
        let mut bindings = IndexMap::new();
        bindings.insert("p".to_string(), argument.clone());

        let expanded = body.substitute(&bindings);
        assert_eq!(
            expanded.kind,
            ExprKind::Property {
                base: Box::new(argument),
                name: "rgb".into()
            }
        );
    }

    #[test]
    fn test_assign_op_lowering() {
        assert_eq!(AssignOp::Assign.binary(), None);
        assert_eq!(AssignOp::Div.binary(), Some(BinaryOp::Div));
        assert_eq!(StepOp::Decrement.compound().binary(), Some(BinaryOp::Sub));
    }
}
