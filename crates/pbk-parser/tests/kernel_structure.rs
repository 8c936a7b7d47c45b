//! Kernel-level structure: tags, items and statements.

use pbk_ast::{ExprKind, KernelItem, Literal, Scalar, StmtKind, Type};
use pbk_parser::{ParseOutput, parse};

fn parse_ok(source: &str) -> ParseOutput {
    let output = parse(source);
    assert!(
        !output.has_errors(),
        "unexpected errors: {:?} {:?}",
        output.lex_errors,
        output.parse_errors
    );
    output
}

const INVERT: &str = r#"
<languageVersion : 1.0;>

kernel Invert
<   namespace : "pb2zig";
    vendor : "Example";
    version : 1;
    description : "Inverts colour channels";
>
{
    input image4 src;
    output pixel4 dst;

    parameter float amount
    <
        minValue: 0.0;
        maxValue: 1.0;
        defaultValue: 1.0;
        description: "Blend factor";
    >;

    parameter int passes;

    const float ONE = 1.0, HALF = 0.5;
    dependent float2 center, size;

    void evaluatePixel()
    {
        float4 p = sampleNearest(src, outCoord());
        dst = mix(p, float4(ONE) - p, amount);
    }
}
"#;

// =============================================================================
// Header and metadata
// =============================================================================

#[test]
fn test_header_and_metadata() {
    let kernel = parse_ok(INVERT).kernel.unwrap();
    assert_eq!(kernel.name, "Invert");
    assert!(kernel.header.contains_key("languageVersion"));
    let keys: Vec<_> = kernel.metadata.keys().cloned().collect();
    assert_eq!(keys, ["namespace", "vendor", "version", "description"]);
    assert!(matches!(
        kernel.metadata["version"].kind,
        ExprKind::Literal(Literal::Int(1))
    ));
}

#[test]
fn test_header_tag_is_optional() {
    let kernel = parse_ok("kernel K <> { output pixel4 dst; }").kernel.unwrap();
    assert!(kernel.header.is_empty());
    assert_eq!(kernel.outputs().count(), 1);
}

// =============================================================================
// Kernel items
// =============================================================================

#[test]
fn test_item_kinds_in_order() {
    let kernel = parse_ok(INVERT).kernel.unwrap();
    let kinds: Vec<&str> = kernel
        .items
        .iter()
        .map(|item| match item {
            KernelItem::Parameter(_) => "parameter",
            KernelItem::Input(_) => "input",
            KernelItem::Output(_) => "output",
            KernelItem::Constant(_) => "const",
            KernelItem::Dependent(_) => "dependent",
            KernelItem::Function(_) => "function",
        })
        .collect();
    assert_eq!(
        kinds,
        ["input", "output", "parameter", "parameter", "const", "dependent", "function"]
    );
}

#[test]
fn test_parameter_tag_split() {
    let kernel = parse_ok(INVERT).kernel.unwrap();
    let amount = kernel.parameters().next().unwrap();
    assert_eq!(amount.ty, Type::Float);
    assert!(amount.min_value.is_some());
    assert!(amount.max_value.is_some());
    assert!(amount.default_value.is_some());
    assert!(amount.step_interval.is_none());
    assert_eq!(amount.attributes.keys().collect::<Vec<_>>(), ["description"]);

    let passes = kernel.parameters().nth(1).unwrap();
    assert_eq!(passes.ty, Type::Int);
    assert!(passes.attributes.is_empty());
}

#[test]
fn test_inputs_outputs_and_dependents() {
    let kernel = parse_ok(INVERT).kernel.unwrap();
    let src = kernel.inputs().next().unwrap();
    assert_eq!(src.channels(), 4);
    let dst = kernel.outputs().next().unwrap();
    assert_eq!(dst.ty, Type::Vector(Scalar::Float, 4));

    let dependent = kernel.dependents().next().unwrap();
    assert_eq!(dependent.names, ["center", "size"]);
    assert_eq!(dependent.ty, Type::Vector(Scalar::Float, 2));
}

#[test]
fn test_constant_with_several_declarators() {
    let kernel = parse_ok(INVERT).kernel.unwrap();
    let constant = kernel.constants().next().unwrap();
    let names: Vec<_> = constant.declarators.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["ONE", "HALF"]);
}

#[test]
fn test_function_signature() {
    let source = r#"
        kernel K <> {
            output pixel4 dst;
            float3 blend(float3 a, float3 b, float t) { return mix(a, b, t); }
            void evaluatePixel() { dst = float4(blend(float3(0.0), float3(1.0), 0.5), 1.0); }
        }
    "#;
    let kernel = parse_ok(source).kernel.unwrap();
    let blend = kernel.function("blend").unwrap();
    assert_eq!(blend.return_type, Type::Vector(Scalar::Float, 3));
    let args: Vec<_> = blend.arguments.iter().map(|a| (a.name.as_str(), a.ty)).collect();
    assert_eq!(
        args,
        [
            ("a", Type::Vector(Scalar::Float, 3)),
            ("b", Type::Vector(Scalar::Float, 3)),
            ("t", Type::Float),
        ]
    );
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_control_flow_statements() {
    let source = r#"
        kernel K <> {
            output pixel4 dst;
            void evaluatePixel() {
                float total = 0.0;
                for (int i = 0; i < 4; i++) {
                    if (i == 2) continue;
                    total += 1.0;
                }
                int n = 3;
                while (n > 0) { n--; }
                do { n++; } while (n < 2);
                if (total > 2.0) { dst = float4(1.0); } else if (total > 1.0) dst = float4(0.5); else { dst = float4(0.0); }
                ;
            }
        }
    "#;
    let kernel = parse_ok(source).kernel.unwrap();
    let body = &kernel.function("evaluatePixel").unwrap().body;
    let kinds: Vec<&str> = body
        .iter()
        .map(|stmt| match &stmt.kind {
            StmtKind::Variable(_) => "var",
            StmtKind::For { .. } => "for",
            StmtKind::While { .. } => "while",
            StmtKind::DoWhile { .. } => "do",
            StmtKind::If { .. } => "if",
            StmtKind::Empty => "empty",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["var", "for", "var", "while", "do", "if", "empty"]);

    let StmtKind::If { else_branch, .. } = &body[5].kind else {
        panic!("expected if");
    };
    let nested = else_branch.as_ref().unwrap();
    assert!(matches!(nested.kind, StmtKind::If { else_branch: Some(_), .. }));
}

#[test]
fn test_dangling_else_binds_to_nearest_if() {
    let source = r#"
        kernel K <> {
            output pixel4 dst;
            void evaluatePixel() {
                if (true) if (false) dst = float4(1.0); else dst = float4(0.0);
            }
        }
    "#;
    let kernel = parse_ok(source).kernel.unwrap();
    let body = &kernel.function("evaluatePixel").unwrap().body;
    let StmtKind::If { then_branch, else_branch, .. } = &body[0].kind else {
        panic!("expected if");
    };
    assert!(else_branch.is_none());
    assert!(matches!(then_branch.kind, StmtKind::If { else_branch: Some(_), .. }));
}

#[test]
fn test_constructor_statement_is_expression() {
    let source = r#"
        kernel K <> {
            output pixel4 dst;
            void evaluatePixel() { float4(1.0); }
        }
    "#;
    let kernel = parse_ok(source).kernel.unwrap();
    let body = &kernel.function("evaluatePixel").unwrap().body;
    assert!(matches!(body[0].kind, StmtKind::Expression(_)));
}

#[test]
fn test_comments_are_collected() {
    let output = parse_ok("// leading\nkernel K <> { /* body */ output pixel4 dst; }");
    assert_eq!(output.comments.len(), 2);
    assert_eq!(output.comments[0].0, "// leading");
}
