//! `#define` handling inside full kernel sources.

use pbk_ast::ExprKind;
use pbk_parser::parse;

const SOURCE: &str = r#"
#define PI 3.14159
#define SQR(x) ((x) * (x))
#define HALF (0.5)
#ifdef USE_FAST
#endif

kernel K <> {
    output pixel4 dst;
    void evaluatePixel() { dst = float4(SQR(PI) * HALF); }
}
"#;

#[test]
fn test_defines_parsed_in_order() {
    let output = parse(SOURCE);
    assert!(!output.has_errors(), "{:?}", output.parse_errors);
    let names: Vec<_> = output
        .macro_definitions()
        .into_iter()
        .map(|m| { let arity = m.arity(); (m.name, arity) })
        .collect();
    assert_eq!(
        names,
        [
            ("PI".to_string(), 0),
            ("SQR".to_string(), 1),
            ("HALF".to_string(), 0)
        ]
    );
}

#[test]
fn test_other_directives_are_ignored() {
    let output = parse(SOURCE);
    assert_eq!(output.macros.len(), 3);
    assert!(output.kernel.is_some());
}

#[test]
fn test_macro_body_spans_are_in_source_coordinates() {
    let output = parse(SOURCE);
    let pi = output.macro_definitions().remove(0);
    let span = pi.body.span;
    assert_eq!(&SOURCE[span.start as usize..span.end as usize], "3.14159");
    assert!(matches!(pi.body.kind, ExprKind::Literal(_)));
}

#[test]
fn test_broken_macro_reports_and_continues() {
    let source = "#define BAD(x 1\n#define GOOD 2\nkernel K <> { output pixel4 dst; }";
    let output = parse(source);
    assert_eq!(output.parse_errors.len(), 1);
    assert_eq!(output.macros.len(), 2);
    assert!(output.macros[0].definition.is_none());
    assert_eq!(output.macro_definitions()[0].name, "GOOD");
    let span = output.parse_errors[0].span;
    assert_eq!(&source[span.start as usize..span.end as usize], "1");
}

#[test]
fn test_macro_lex_errors_are_collected() {
    let output = parse("#define BAD @\nkernel K <> { output pixel4 dst; }");
    assert_eq!(output.lex_errors.len(), 1);
    assert_eq!(output.lex_errors[0].span, 12..13);
}
