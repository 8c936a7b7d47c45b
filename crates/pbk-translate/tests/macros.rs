//! `#define` handling: constants, generic functions and inline expansion.

use pbk_translate::{TranslateError, TranslateOptions, Translator};

fn translate(source: &str) -> Result<String, TranslateError> {
    let output = pbk_parser::parse(source);
    assert!(!output.has_errors(), "unexpected parse errors: {:?}", output.parse_errors);
    let kernel = output.kernel.clone().unwrap();
    let options = TranslateOptions {
        include_driver: false,
        ..TranslateOptions::default()
    };
    Translator::new(options).translate(&kernel, &output.macro_definitions())
}

fn kernel(defines: &str, body: &str) -> String {
    format!(
        r#"
{defines}

kernel Macros <> {{
    input image4 src;
    output pixel4 dst;

    void evaluatePixel()
    {{
        {body}
    }}
}}
"#
    )
}

#[test]
fn test_literal_macro_becomes_namespace_constant() {
    let zig = translate(&kernel(
        "#define SCALE 2.0",
        "float4 p = sampleNearest(src, outCoord()); dst = p * SCALE;",
    ))
    .unwrap();
    assert!(zig.contains("pub const SCALE: f32 = 2.0;"));
    assert!(zig.contains("self.dst = p * @as(@Vector(4, f32), @splat(SCALE));"));
}

#[test]
fn test_helper_macro_becomes_instance_constant() {
    let zig = translate(&kernel("#define HALF sin(0.5)", "dst = float4(HALF);")).unwrap();
    assert!(zig.contains("const HALF: f32 = sin(@as(f32, 0.5));"));
    assert!(!zig.contains("pub const HALF"));
    assert!(zig.contains("fn sin("));
}

#[test]
fn test_macro_reading_instance_state_expands_inline() {
    let zig = translate(&kernel(
        "#define OFFSET (outCoord() + 1.0)\n#define AT(p) sampleNearest(src, p)",
        "dst = AT(OFFSET);",
    ))
    .unwrap();
    assert!(!zig.contains("const OFFSET"));
    assert!(!zig.contains("fn AT("));
    assert!(zig.contains(
        "self.dst = self.input.src.sampleNearest((self.outCoord() + @as(@Vector(2, f32), @splat(1.0))));"
    ));
}

#[test]
fn test_parameterized_macro_becomes_generic_function() {
    let zig = translate(&kernel(
        "#define SQR(x) ((x) * (x))",
        "float s = SQR(0.5); dst = float4(s);",
    ))
    .unwrap();
    assert!(zig.contains("fn SQR(x: anytype) "));
    assert!(zig.contains("return (x * x);"));
    assert!(zig.contains("const s: f32 = SQR(@as(f32, 0.5));"));
}

#[test]
fn test_unused_generic_parameter_is_discarded() {
    let zig = translate(&kernel(
        "#define FIRST(a, b) (a)",
        "float s = FIRST(1.0, 2.0); dst = float4(s);",
    ))
    .unwrap();
    assert!(zig.contains("fn FIRST(a: anytype, b: anytype) "));
    assert!(zig.contains("_ = b;"));
}

#[test]
fn test_generic_macro_needs_arguments() {
    let err = translate(&kernel("#define SQR(x) ((x) * (x))", "dst = float4(SQR);")).unwrap_err();
    assert!(matches!(err, TranslateError::UndefinedVariable { ref name, .. } if name == "SQR"));
}

#[test]
fn test_constant_macro_rejects_arguments() {
    let err = translate(&kernel("#define SCALE 2.0", "dst = float4(SCALE(1.0));")).unwrap_err();
    match err {
        TranslateError::WrongArgumentCount { name, found, .. } => {
            assert_eq!(name, "SCALE");
            assert_eq!(found, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_mutually_recursive_macros() {
    let err = translate(&kernel("#define A B\n#define B A", "dst = float4(A);")).unwrap_err();
    assert!(matches!(err, TranslateError::RecursiveMacro { .. }));
}

#[test]
fn test_macro_named_like_member_is_rejected() {
    let err = translate(&kernel("#define dst 1.0", "float x = 0.0;")).unwrap_err();
    assert!(matches!(err, TranslateError::ReservedName { ref name, .. } if name == "dst"));
}

#[test]
fn test_inline_increment_gets_a_temporary_per_use() {
    let zig = translate(&kernel(
        "#define INC(x) (x++)",
        "int n = 0; int a = INC(n); int b = INC(n); dst = float4(float(a + b));",
    ))
    .unwrap();
    assert!(!zig.contains("fn INC("));
    let lines: Vec<&str> = zig.lines().map(str::trim).collect();
    let expected = [
        "var n: i32 = 0;",
        "const tmp_1: i32 = n;",
        "n = n + 1;",
        "const a: i32 = tmp_1;",
        "const tmp_2: i32 = n;",
        "n = n + 1;",
        "const b: i32 = tmp_2;",
    ];
    assert!(
        lines.windows(expected.len()).any(|window| window == expected),
        "{zig}"
    );
}
