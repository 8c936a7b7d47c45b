//! End-to-end translation of small kernels.

use pbk_translate::{TranslateError, TranslateOptions, Translator};

fn translate_with(options: TranslateOptions, source: &str) -> Result<String, TranslateError> {
    let output = pbk_parser::parse(source);
    assert!(
        !output.has_errors(),
        "unexpected parse errors: {:?} {:?}",
        output.lex_errors,
        output.parse_errors
    );
    let kernel = output.kernel.clone().unwrap();
    Translator::new(options).translate(&kernel, &output.macro_definitions())
}

fn translate(source: &str) -> Result<String, TranslateError> {
    let options = TranslateOptions {
        include_driver: false,
        ..TranslateOptions::default()
    };
    translate_with(options, source)
}

/// Kernel with one image in and out around the given function body.
fn kernel(body: &str) -> String {
    format!(
        r#"
kernel Test
<   namespace : "test";
    vendor : "pb2zig";
    version : 1;
>
{{
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

/// Asserts `expected` appear as consecutive lines, ignoring indentation.
fn assert_lines(zig: &str, expected: &[&str]) {
    let lines: Vec<&str> = zig.lines().map(str::trim).collect();
    assert!(
        lines.windows(expected.len()).any(|window| window == expected),
        "expected consecutive lines:\n{}\nin:\n{zig}",
        expected.join("\n")
    );
}

const PASSTHROUGH: &str = r#"
<languageVersion : 1.0;>

kernel Passthrough
<   namespace : "test";
    vendor : "pb2zig";
    version : 1;
    description : "Copies the input";
>
{
    input image4 src;
    output pixel4 dst;

    parameter float amount
    <
        minValue: 0.0;
        maxValue: 1;
        defaultValue: 0.5;
        description: "Unused";
    >;

    void evaluatePixel()
    {
        dst = sample(src, outCoord());
    }
}
"#;

// =============================================================================
// Layout
// =============================================================================

#[test]
fn test_sample_kernel_layout() {
    let zig = translate(PASSTHROUGH).unwrap();

    assert!(zig.starts_with("// Pixel Bender kernel \"Passthrough\" (translated using pb2zig)\n"));
    assert!(zig.contains("// languageVersion: 1.0\n"));
    assert!(zig.contains("// description: Copies the input\n"));
    assert!(zig.contains("const std = @import(\"std\");"));
    assert!(zig.contains("pub const kernel = struct {"));
    assert!(zig.contains("pub const namespace = \"test\";"));
    assert!(zig.contains("pub const version = 1;"));

    assert!(zig.contains(".type = f32,"));
    assert!(zig.contains(".minValue = @as(f32, 0.0),"));
    assert!(zig.contains(".maxValue = @as(f32, 1.0),"));
    assert!(zig.contains(".defaultValue = @as(f32, 0.5),"));
    assert!(zig.contains(".description = \"Unused\","));
    assert!(zig.contains(".src = .{ .channels = 4 },"));
    assert!(zig.contains(".dst = .{ .channels = 4 },"));

    assert!(zig.contains("fn Instance(comptime InputStruct: type, comptime OutputStruct: type) type {"));
    assert!(zig.contains("amount: f32 = 0.5,"));
    assert!(zig.contains("dst: @Vector(4, f32) = undefined,"));
    assert!(zig.contains("pub fn evaluatePixel(self: *@This()) void {"));
    assert!(zig.contains("self.dst = self.input.src.sampleLinear(self.outCoord());"));
    assert!(zig.contains(
        "self.output.dst.setPixel(self.outputCoord[0], self.outputCoord[1], self.dst);"
    ));
    assert!(zig.contains("pub fn create(input: anytype, output: anytype, params: anytype)"));
    assert!(zig.ends_with("};\n"));
}

#[test]
fn test_image_methods_pull_in_no_helpers() {
    let zig = translate(PASSTHROUGH).unwrap();
    assert!(!zig.contains("fn sin("));
    assert!(!zig.contains("fn matrixOp("));
    assert!(!zig.contains("fn sampleLinear("));
}

#[test]
fn test_driver_appended_on_request() {
    let with_driver = translate_with(TranslateOptions::default(), PASSTHROUGH).unwrap();
    assert!(with_driver.contains("pub fn apply(input: anytype, output: anytype, params: anytype) void {"));
    let without = translate(PASSTHROUGH).unwrap();
    assert!(!without.contains("pub fn apply("));
}

#[test]
fn test_translation_is_deterministic() {
    let source = kernel("float4 p = sampleNearest(src, outCoord()); dst = sin(p) + cos(p);");
    let first = translate(&source).unwrap();
    let second = translate(&source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_indent_width_option() {
    let options = TranslateOptions {
        include_driver: false,
        indent_width: 2,
        ..TranslateOptions::default()
    };
    let zig = translate_with(options, PASSTHROUGH).unwrap();
    assert!(zig.contains("\n  pub const parameters = .{\n"));
}

// =============================================================================
// Types and conversions
// =============================================================================

#[test]
fn test_int_literal_in_float_context() {
    let zig = translate(&kernel("float x = 3; dst = float4(x);")).unwrap();
    assert!(zig.contains("const x: f32 = 3.0;"));
    assert!(zig.contains("self.dst = @as(@Vector(4, f32), @splat(x));"));
}

#[test]
fn test_mixed_int_float_arithmetic() {
    let zig = translate(&kernel("int n = 2; float x = 1.5 * float(n); dst = float4(x);")).unwrap();
    assert!(zig.contains("const n: i32 = 2;"));
    assert!(zig.contains("const x: f32 = 1.5 * @as(f32, @floatFromInt(n));"));
}

#[test]
fn test_integer_division_truncates() {
    let zig = translate(&kernel("int a = 7; int b = a / 2; dst = float4(float(b));")).unwrap();
    assert!(zig.contains("const b: i32 = @divTrunc(a, 2);"));
}

#[test]
fn test_vector_equality_reduces() {
    let zig = translate(&kernel(
        "float4 p = sampleNearest(src, outCoord()); if (p == float4(0.0)) { dst = p; } else { dst = float4(1.0); }",
    ))
    .unwrap();
    assert!(zig.contains("if (@reduce(.And, p == @as(@Vector(4, f32), @splat(0.0)))) {"));
    assert!(zig.contains("} else {"));
}

// =============================================================================
// Swizzles
// =============================================================================

#[test]
fn test_identity_swizzle_reads_vector() {
    let zig = translate(&kernel("float4 p = sampleNearest(src, outCoord()); dst = p.rgba;")).unwrap();
    assert!(zig.contains("self.dst = p;"));
}

#[test]
fn test_swizzle_read_shuffles() {
    let zig = translate(&kernel(
        "float4 p = sampleNearest(src, outCoord()); float2 q = p.ba; dst = float4(q, q);",
    ))
    .unwrap();
    assert!(zig.contains(
        "const q: @Vector(2, f32) = @shuffle(f32, p, undefined, @Vector(2, i32){ 2, 3 });"
    ));
}

#[test]
fn test_masked_self_swap() {
    let zig = translate(&kernel(
        "float4 p = sampleNearest(src, outCoord()); p.rg = p.gr; dst = p;",
    ))
    .unwrap();
    assert!(zig.contains("var p: @Vector(4, f32) = self.input.src.sampleNearest(self.outCoord());"));
    assert!(zig.contains("p = @shuffle(f32, p, p, @Vector(4, i32){ -2, -1, 2, 3 });"));
}

#[test]
fn test_write_mask_order() {
    let zig = translate(&kernel(
        "float4 p = sampleNearest(src, outCoord()); p.bgr = float3(1.0, 2.0, 3.0); dst = p;",
    ))
    .unwrap();
    assert!(zig.contains(
        "p = @shuffle(f32, p, @Vector(3, f32){ 1.0, 2.0, 3.0 }, @Vector(4, i32){ -3, -2, -1, 3 });"
    ));
}

#[test]
fn test_single_lane_write() {
    let zig = translate(&kernel("float4 p = float4(0.0); p.a = 1.0; dst = p;")).unwrap();
    assert!(zig.contains("p[3] = 1.0;"));
}

#[test]
fn test_duplicate_write_mask_rejected() {
    let err = translate(&kernel("float4 p = float4(0.0); p.rr = float2(1.0); dst = p;")).unwrap_err();
    assert!(matches!(err, TranslateError::InvalidSwizzle { .. }));
}

// =============================================================================
// Calls and overloads
// =============================================================================

#[test]
fn test_overload_match_includes_helper() {
    let zig = translate(&kernel("float3 a = float3(1.0); float d = dot(a, a); dst = float4(d);")).unwrap();
    assert!(zig.contains("const d: f32 = dot(a, a);"));
    assert!(zig.contains("fn dot("));
    assert!(!zig.contains("pub fn dot("));
    assert!(!zig.contains("fn cross("));
}

#[test]
fn test_overload_mismatch_reports_position() {
    let err = translate(&kernel(
        "float3 a = float3(1.0); float2 b = float2(1.0); float d = dot(a, b); dst = float4(d);",
    ))
    .unwrap_err();
    match err {
        TranslateError::WrongArgumentType { name, position, .. } => {
            assert_eq!(name, "dot");
            assert_eq!(position, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_undeclared_function() {
    let err = translate(&kernel("dst = frobnicate(1.0);")).unwrap_err();
    assert!(matches!(err, TranslateError::UndeclaredFunction { ref name, .. } if name == "frobnicate"));
}

#[test]
fn test_kernel_functions_are_methods() {
    let source = r#"
kernel Calls <> {
    output pixel4 dst;
    float4 shade(float v) { return float4(v); }
    void evaluatePixel() { dst = shade(0.25); }
}
"#;
    let zig = translate(source).unwrap();
    assert!(zig.contains("fn shade(self: *@This(), v: f32) @Vector(4, f32) {"));
    assert!(zig.contains("_ = self;"));
    assert!(zig.contains("return @as(@Vector(4, f32), @splat(v));"));
    assert!(zig.contains("self.dst = self.shade(0.25);"));
}

#[test]
fn test_written_argument_is_copied() {
    let source = r#"
kernel Args <> {
    output pixel4 dst;
    float twice(float v) { v = v * 2.0; return v; }
    void evaluatePixel() { dst = float4(twice(1.0)); }
}
"#;
    let zig = translate(source).unwrap();
    assert!(zig.contains("fn twice(self: *@This(), v_in: f32) f32 {"));
    assert!(zig.contains("var v: f32 = v_in;"));
}

// =============================================================================
// Matrices
// =============================================================================

#[test]
fn test_matrix_addition_lowers_to_helper() {
    let source = r#"
kernel Matrix <> {
    output pixel4 dst;
    parameter float2x2 m;
    void evaluatePixel() {
        float2x2 t = m + m;
        dst = float4(t[0][0]);
    }
}
"#;
    let zig = translate(source).unwrap();
    assert!(zig.contains("const t: [2]@Vector(2, f32) = matrixOp(\"+\", self.m, self.m);"));
    assert!(zig.contains("m: [2]@Vector(2, f32) = std.mem.zeroes([2]@Vector(2, f32)),"));
    assert!(zig.contains("fn matrixOp("));
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_for_loop_with_update() {
    let zig = translate(&kernel(
        "float sum = 0.0; for (int i = 0; i < 4; i++) { sum += 0.25; } dst = float4(sum);",
    ))
    .unwrap();
    assert!(zig.contains("var sum: f32 = 0.0;"));
    assert!(zig.contains("var i: i32 = 0;"));
    assert!(zig.contains("while (i < 4) : (i = i + 1) {"));
    assert!(zig.contains("sum = sum + 0.25;"));
}

#[test]
fn test_do_while_continue_uses_label() {
    let zig = translate(&kernel(
        "int n = 0; do { n++; if (n < 2) continue; } while (n < 4); dst = float4(float(n));",
    ))
    .unwrap();
    assert!(zig.contains("while (true) {"));
    assert!(zig.contains(": {"));
    assert!(zig.contains("break :dw_"));
    assert!(zig.contains("if (!(n < 4)) break;"));
}

#[test]
fn test_unused_local_is_discarded() {
    let zig = translate(&kernel("float unused = 1.0; dst = float4(0.0);")).unwrap();
    assert!(zig.contains("const unused: f32 = 1.0;"));
    assert!(zig.contains("_ = unused;"));
}

#[test]
fn test_local_shadowing_helper_is_renamed() {
    let zig = translate(&kernel("float dot = 1.0; dst = float4(dot);")).unwrap();
    assert!(zig.contains("const dot_1: f32 = 1.0;"));
    assert!(zig.contains("self.dst = @as(@Vector(4, f32), @splat(dot_1));"));
}

// =============================================================================
// Side effects inside expressions
// =============================================================================

#[test]
fn test_used_assignment_reads_snapshot() {
    let zig = translate(&kernel("float x = 0.0; float r = (x = 1.0) + (x = 2.0); dst = float4(r);")).unwrap();
    assert_lines(
        &zig,
        &[
            "var x: f32 = 0.0;",
            "x = 1.0;",
            "const tmp_1: f32 = x;",
            "x = 2.0;",
            "const tmp_2: f32 = x;",
            "const r: f32 = tmp_1 + tmp_2;",
        ],
    );
}

#[test]
fn test_left_operand_pinned_before_right_side_effects() {
    let zig = translate(&kernel("float x = 1.0; float r = x + (x = 2.0); dst = float4(r);")).unwrap();
    assert_lines(
        &zig,
        &[
            "var x: f32 = 1.0;",
            "const tmp_2: f32 = x;",
            "x = 2.0;",
            "const tmp_1: f32 = x;",
            "const r: f32 = tmp_2 + tmp_1;",
        ],
    );
}

#[test]
fn test_swizzle_write_reads_back_written_lane() {
    let zig = translate(&kernel("float4 v = float4(0.0); float y = (v.x = 1.0); dst = v * y;")).unwrap();
    assert_lines(&zig, &["v[0] = 1.0;", "const tmp_1: f32 = v[0];", "const y: f32 = tmp_1;"]);
}

#[test]
fn test_used_postfix_increment_keeps_old_value() {
    let zig = translate(&kernel("int i = 0; int j = i++; dst = float4(float(i + j));")).unwrap();
    assert_lines(
        &zig,
        &[
            "var i: i32 = 0;",
            "const tmp_1: i32 = i;",
            "i = i + 1;",
            "const j: i32 = tmp_1;",
        ],
    );
}

#[test]
fn test_ternary_with_assignments_runs_one_branch() {
    let zig = translate(&kernel(
        "float c = 0.0; bool flip = c < 0.5; float r = flip ? (c = 1.0) : (c = 2.0); dst = float4(r);",
    ))
    .unwrap();
    assert_lines(
        &zig,
        &[
            "var c: f32 = 0.0;",
            "const flip: bool = c < 0.5;",
            "var tmp_3: f32 = undefined;",
            "if (flip) {",
            "c = 1.0;",
            "const tmp_1: f32 = c;",
            "tmp_3 = tmp_1;",
            "} else {",
            "c = 2.0;",
            "const tmp_2: f32 = c;",
            "tmp_3 = tmp_2;",
            "}",
            "const r: f32 = tmp_3;",
        ],
    );
}

#[test]
fn test_pure_ternary_stays_an_expression() {
    let zig = translate(&kernel("bool flip = true; float r = flip ? 1.0 : 0.0; dst = float4(r);")).unwrap();
    assert!(zig.contains("const r: f32 = if (flip) @as(f32, 1.0) else @as(f32, 0.0);"));
    assert!(!zig.contains("var tmp_"));
}

#[test]
fn test_and_skips_right_side_effects() {
    let zig = translate(&kernel("int i = 0; bool b = (i > 0) && (i++ > 0); dst = float4(float(i));")).unwrap();
    assert_lines(
        &zig,
        &[
            "var i: i32 = 0;",
            "var tmp_2: bool = (i > 0);",
            "if (tmp_2) {",
            "const tmp_1: i32 = i;",
            "i = i + 1;",
            "tmp_2 = (tmp_1 > 0);",
            "}",
            "const b: bool = tmp_2;",
            "_ = b;",
        ],
    );
}

#[test]
fn test_or_runs_right_side_only_when_left_is_false() {
    let zig = translate(&kernel("int i = 0; bool b = (i == 0) || (i++ > 0); dst = float4(float(i));")).unwrap();
    assert_lines(
        &zig,
        &[
            "var tmp_2: bool = (i == 0);",
            "if (!tmp_2) {",
            "const tmp_1: i32 = i;",
            "i = i + 1;",
            "tmp_2 = (tmp_1 > 0);",
            "}",
            "const b: bool = tmp_2;",
        ],
    );
}

#[test]
fn test_pure_logical_operands_stay_inline() {
    let zig = translate(&kernel("int i = 1; bool b = (i > 0) && (i < 4); dst = float4(float(i));")).unwrap();
    assert!(zig.contains("const b: bool = (i > 0) and (i < 4);"));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_integer_division_by_literal_zero() {
    let err = translate(&kernel("int x = 1 / 0; dst = float4(float(x));")).unwrap_err();
    assert!(matches!(err, TranslateError::DivisionByZero { .. }), "{err:?}");

    let err = translate(&kernel("int x = 4; x /= 0; dst = float4(float(x));")).unwrap_err();
    assert!(matches!(err, TranslateError::DivisionByZero { .. }), "{err:?}");

    let err = translate(&kernel("float y = 1.0 / 0.0; dst = float4(y);")).unwrap_err();
    assert!(matches!(err, TranslateError::DivisionByZero { .. }), "{err:?}");
}

#[test]
fn test_undefined_variable() {
    let err = translate(&kernel("dst = float4(nope);")).unwrap_err();
    assert!(matches!(err, TranslateError::UndefinedVariable { ref name, .. } if name == "nope"));
}

#[test]
fn test_misplaced_break() {
    let err = translate(&kernel("break; dst = float4(0.0);")).unwrap_err();
    assert!(matches!(err, TranslateError::MisplacedJump { keyword: "break", .. }));
}

#[test]
fn test_assignment_to_parameter_rejected() {
    let source = r#"
kernel Params <> {
    output pixel4 dst;
    parameter float amount;
    void evaluatePixel() { amount = 1.0; dst = float4(amount); }
}
"#;
    let err = translate(source).unwrap_err();
    assert!(matches!(err, TranslateError::NotAssignable { .. }));
}

#[test]
fn test_generated_member_names_are_reserved() {
    let source = r#"
kernel Clash <> {
    output pixel4 dst;
    parameter float outputCoord;
    void evaluatePixel() { dst = float4(0.0); }
}
"#;
    let err = translate(source).unwrap_err();
    assert!(matches!(err, TranslateError::ReservedName { ref name, .. } if name == "outputCoord"));
}
