//! End-to-end pipeline tests over complete Siml programs.

use simlc::frontend::parser::ast::{AttrRole, BlockKind};
use simlc::{compile_str, CompileError, ErrorCode};

/// The barrel-draining example: a tank model composed into a process.
const BARREL: &str = "\
class BarrelWithHole:
    data V, h: Real
    data A_bott, A_o, mu, q, g: Real param

    func dynamic():
        h := V / A_bott
        $V := q - mu*A_o*sqrt(2*g*h)

    func init():
        V := 0;
        A_bott := 1; A_o := 0.02; mu := 0.55;
        q := 0.05
        g := 9.81

process RunTest:
    data system: BarrelWithHole

    func dynamic():
        system.dynamic()

    func init():
        system.init()

compile RunTest
";

#[test]
fn test_barrel_model_compiles() {
    let objects = compile_str(BARREL, "barrel").expect("compilation failed");
    assert_eq!(objects.len(), 1);
    let object = &objects[0];
    assert_eq!(object.name, "RunTest");

    for name in [
        "system.V",
        "system.h",
        "system.A_bott",
        "system.A_o",
        "system.mu",
        "system.q",
        "system.g",
    ] {
        assert!(object.attrs.contains_key(name), "missing attribute '{}'", name);
    }
    assert_eq!(object.attr("system.V").unwrap().role, AttrRole::Variable);
    assert_eq!(object.attr("system.q").unwrap().role, AttrRole::Param);
    assert_eq!(
        object.attr("system.V").unwrap().origin_class,
        "BarrelWithHole"
    );

    let dynamic = object.function(BlockKind::Dynamic).expect("no dynamic");
    assert_eq!(dynamic.body.len(), 2);
    let init = object.function(BlockKind::Init).expect("no init");
    assert_eq!(init.body.len(), 6);
}

#[test]
fn test_barrel_usage_decorations() {
    let objects = compile_str(BARREL, "barrel").unwrap();
    let dynamic = objects[0].function(BlockKind::Dynamic).unwrap();
    assert_eq!(dynamic.usage.len(), dynamic.body.len());
    // h := V / A_bott
    assert_eq!(dynamic.usage[0].writes, ["system.h"]);
    assert_eq!(dynamic.usage[0].reads, ["system.V", "system.A_bott"]);
    // $V := q - mu*A_o*sqrt(2*g*h)
    assert_eq!(dynamic.usage[1].writes, ["system.V"]);
    assert!(dynamic.usage[1]
        .reads
        .iter()
        .any(|r| r == "system.g"));
}

#[test]
fn test_syntax_error_is_fatal_with_location() {
    let err = compile_str("class A:\n    data x Real\n", "bad").unwrap_err();
    match err {
        CompileError::Fatal(diag) => {
            assert_eq!(diag.code, ErrorCode::SyntaxError);
            assert_eq!(diag.span.start.line, 2);
        }
        other => panic!("expected fatal error, got {:?}", other),
    }
}

#[test]
fn test_inconsistent_indent_is_fatal() {
    let src = "class A:\n    data x: Real\n  data y: Real\n";
    let err = compile_str(src, "bad").unwrap_err();
    match err {
        CompileError::Fatal(diag) => assert_eq!(diag.code, ErrorCode::InconsistentIndent),
        other => panic!("expected fatal error, got {:?}", other),
    }
}

#[test]
fn test_unknown_base_class_is_fatal() {
    let src = "class A(Nowhere): pass\ncompile A\n";
    let err = compile_str(src, "bad").unwrap_err();
    match err {
        CompileError::Fatal(diag) => assert_eq!(diag.code, ErrorCode::UnknownBaseClass),
        other => panic!("expected fatal error, got {:?}", other),
    }
}

#[test]
fn test_usage_errors_accumulate() {
    let src = "\
class A:
    data a: Real
    data p: Real param

    func init():
        a := 0

    func dynamic():
        $a := 1
        p := 2

compile A
";
    let err = compile_str(src, "bad").unwrap_err();
    match err {
        CompileError::Usage(diags) => {
            let codes: Vec<ErrorCode> = diags.iter().map(|d| d.code).collect();
            assert_eq!(
                codes,
                [ErrorCode::IllegalWriteParam, ErrorCode::MissingParamAssign]
            );
        }
        other => panic!("expected usage errors, got {:?}", other),
    }
}

#[test]
fn test_multiple_compile_targets() {
    let src = "\
class A:
    data x: Real

    func init():
        x := 1

class B:
    data y: Real

    func init():
        y := 2

compile A, B
";
    let objects = compile_str(src, "multi").unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0].name, "A");
    assert_eq!(objects[1].name, "B");
}

#[test]
fn test_diagnostic_display_format() {
    let src = "\
class A:
    data a: Real

    func init():
        a := 0

    func dynamic():
        $a := 1
        a := 2

compile A
";
    let err = compile_str(src, "bad").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("error[E0403]"), "got: {}", text);
    assert!(text.contains("'a'"), "got: {}", text);
}

#[test]
fn test_module_without_compile_directive_yields_nothing() {
    let objects = compile_str("class A:\n    data x: Real\n", "quiet").unwrap();
    assert!(objects.is_empty());
}
