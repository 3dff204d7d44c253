//! Renderer snippets — AST fixtures → C text.

use prism_codegen::ast::{BinaryOp, Def, Expr, Program, Stmt, UnaryOp};
use prism_codegen::cgen::{render_expr, render_program};

fn ident(name: &str) -> Expr {
    Expr::Ident(name.to_string())
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[test]
fn every_subexpression_is_parenthesised() {
    let expr = binary(
        BinaryOp::Mul,
        binary(BinaryOp::Add, ident("a"), Expr::Int(2)),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(ident("b")),
        },
    );
    assert_eq!(render_expr(&expr), "((a + 2) * (-b))");
}

#[test]
fn literals_render_as_c() {
    assert_eq!(render_expr(&Expr::Bool(true)), "true");
    assert_eq!(render_expr(&Expr::Null), "NULL");
    assert_eq!(
        render_expr(&Expr::Str("line\none \"two\"".to_string())),
        "\"line\\none \\\"two\\\"\""
    );
    assert_eq!(render_expr(&Expr::Char('\n')), "'\\n'");
}

#[test]
fn struct_literals_support_named_fields() {
    let expr = Expr::StructInit {
        ty: "struct point".to_string(),
        args: vec![
            (Some("x".to_string()), Expr::Int(1)),
            (None, Expr::Int(2)),
        ],
    };
    assert_eq!(render_expr(&expr), "((struct point){ .x = 1, 2 })");
}

#[test]
fn programs_carry_the_preamble_and_guard() {
    let program = Program {
        unit: "unit_main_c".to_string(),
        defs: vec![Def {
            name: "clamp".to_string(),
            args: vec![
                ("x".to_string(), "int".to_string()),
                ("hi".to_string(), "int".to_string()),
            ],
            ret: "int".to_string(),
            exported: true,
            body: vec![
                Stmt::If {
                    cond: binary(BinaryOp::Gt, ident("x"), ident("hi")),
                    then: vec![Stmt::Return(Some(ident("hi")))],
                    else_ifs: vec![],
                    otherwise: None,
                },
                Stmt::Return(Some(ident("x"))),
            ],
        }],
    };

    let rendered = render_program(&program);
    let expected = "\
#include \"prism.h\"
#ifndef unit_main_c
#define unit_main_c
DLL_EXPORT int clamp(int x, int hi) {
    if ((x > hi)) {
        return hi;
    }
    return x;
}
#endif
";
    assert_eq!(rendered, expected);
}

#[test]
fn while_without_condition_loops_forever() {
    let program = Program {
        unit: "unit_spin_c".to_string(),
        defs: vec![Def {
            name: "spin".to_string(),
            args: vec![],
            ret: "void".to_string(),
            exported: false,
            body: vec![Stmt::While {
                cond: None,
                body: vec![Stmt::Expr(Expr::Call {
                    callee: Box::new(ident("poll")),
                    args: vec![],
                })],
            }],
        }],
    };
    let rendered = render_program(&program);
    assert!(rendered.contains("while (true) {\n        poll();\n    }\n"));
}
