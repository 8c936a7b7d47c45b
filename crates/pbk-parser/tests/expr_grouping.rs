//! Expression grouping: flat, right-associative binary chains and the
//! assignment/ternary/unary levels around them.

use pbk_ast::{AssignOp, BinaryOp, Expr, ExprKind, Literal, StepOp, StmtKind, Type, UnaryOp};
use pbk_parser::parse;

/// Parse `expr;` as the only statement of a kernel function.
fn parse_expr_stmt(expr: &str) -> Expr {
    let source = format!("kernel K <> {{ output pixel4 dst; void f() {{ {expr}; }} }}");
    let output = parse(&source);
    assert!(!output.has_errors(), "{:?}", output.parse_errors);
    let kernel = output.kernel.unwrap();
    let body = &kernel.function("f").unwrap().body;
    match &body[0].kind {
        StmtKind::Expression(e) => e.clone(),
        other => panic!("expected expression statement, got {other:?}"),
    }
}

/// Render the grouping as a fully parenthesized string.
fn shape(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Int(n)) => n.to_string(),
        ExprKind::Literal(Literal::Float(x)) => format!("{x:?}"),
        ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Property { base, name } => format!("{}.{name}", shape(base)),
        ExprKind::Index { base, index } => format!("{}[{}]", shape(base), shape(index)),
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", shape(left), op.symbol(), shape(right))
        }
        ExprKind::Unary { op, operand } => {
            let sym = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            };
            format!("({sym}{})", shape(operand))
        }
        ExprKind::Ternary {
            condition,
            then_expr,
            else_expr,
        } => format!(
            "({} ? {} : {})",
            shape(condition),
            shape(then_expr),
            shape(else_expr)
        ),
        ExprKind::Paren(inner) => format!("[{}]", shape(inner)),
        ExprKind::Call { name, args } => {
            let args: Vec<_> = args.iter().map(shape).collect();
            format!("{name}({})", args.join(", "))
        }
        ExprKind::Construct { ty, args } => {
            let args: Vec<_> = args.iter().map(shape).collect();
            format!("{ty}({})", args.join(", "))
        }
        ExprKind::Assign { op, target, value } => {
            format!("{} {} {}", shape(target), op.symbol(), shape(value))
        }
        ExprKind::Step { op, prefix, target } => {
            let sym = match op {
                StepOp::Increment => "++",
                StepOp::Decrement => "--",
            };
            if *prefix {
                format!("({sym}{})", shape(target))
            } else {
                format!("({}{sym})", shape(target))
            }
        }
        other => format!("{other:?}"),
    }
}

// =============================================================================
// Binary chains
// =============================================================================

#[test]
fn test_subtraction_groups_right() {
    assert_eq!(shape(&parse_expr_stmt("a - b - c")), "(a - (b - c))");
}

#[test]
fn test_no_precedence_between_operators() {
    assert_eq!(shape(&parse_expr_stmt("a * b + c")), "(a * (b + c))");
    assert_eq!(shape(&parse_expr_stmt("a + b * c")), "(a + (b * c))");
}

#[test]
fn test_parentheses_force_grouping() {
    assert_eq!(shape(&parse_expr_stmt("(a * b) + c")), "([(a * b)] + c)");
}

#[test]
fn test_logical_and_comparison_chain() {
    assert_eq!(
        shape(&parse_expr_stmt("a < b && c ^^ d")),
        "(a < (b && (c ^^ d)))"
    );
}

#[test]
fn test_unary_binds_to_its_operand() {
    assert_eq!(shape(&parse_expr_stmt("-a + b")), "((-a) + b)");
    assert_eq!(shape(&parse_expr_stmt("!!a")), "(!(!a))");
}

// =============================================================================
// Ternary and assignment
// =============================================================================

#[test]
fn test_ternary_branches_are_full_expressions() {
    assert_eq!(
        shape(&parse_expr_stmt("c ? a + 1 : b - 2")),
        "(c ? (a + 1) : (b - 2))"
    );
}

#[test]
fn test_comparison_swallows_following_ternary() {
    assert_eq!(
        shape(&parse_expr_stmt("x > 0.5 ? a : b")),
        "(x > (0.5 ? a : b))"
    );
}

#[test]
fn test_compound_assignment() {
    let expr = parse_expr_stmt("color.rgb *= 0.5");
    let ExprKind::Assign { op, target, .. } = &expr.kind else {
        panic!("expected assignment");
    };
    assert_eq!(*op, AssignOp::Mul);
    assert!(matches!(&target.kind, ExprKind::Property { name, .. } if name == "rgb"));
}

#[test]
fn test_assignment_value_is_ternary() {
    assert_eq!(
        shape(&parse_expr_stmt("x = c ? 1 : 2")),
        "x = (c ? 1 : 2)"
    );
}

#[test]
fn test_equality_is_not_assignment() {
    let expr = parse_expr_stmt("x == y");
    assert!(matches!(
        expr.kind,
        ExprKind::Binary {
            op: BinaryOp::Eq,
            ..
        }
    ));
}

// =============================================================================
// Nullary forms
// =============================================================================

#[test]
fn test_constructor_call_and_index() {
    assert_eq!(
        shape(&parse_expr_stmt("float3(m[1], dot(a, b), 0)")),
        "float3(m[1], dot(a, b), 0)"
    );
    let expr = parse_expr_stmt("float2x2(1.0)");
    assert!(matches!(
        expr.kind,
        ExprKind::Construct {
            ty: Type::Matrix(2),
            ..
        }
    ));
}

#[test]
fn test_increment_forms() {
    assert_eq!(shape(&parse_expr_stmt("i++")), "(i++)");
    assert_eq!(shape(&parse_expr_stmt("--i")), "(--i)");
    assert_eq!(shape(&parse_expr_stmt("i++ + 1")), "((i++) + 1)");
}

#[test]
fn test_float_literal_forms() {
    assert_eq!(shape(&parse_expr_stmt("1.5e2")), "150.0");
    assert_eq!(shape(&parse_expr_stmt("2e-1")), "0.2");
}
