//! Shape of the lowered IR and the diagnostics reported along the way.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use ripple_ast::{BinaryOp, SourceType, Span, SwitchCase};
use ripple_ir::validate::validate_module;
use ripple_ir::Expr as IrExpr;
use ripple_lower::{DiagnosticKind, LowerConfig, LowerError, Lowerer};

fn body_children(body: &IrExpr) -> &[IrExpr] {
    match body {
        IrExpr::Block { children, .. } => children,
        other => panic!("function body is not a block: {}", other),
    }
}

fn abc_switch_program() -> ripple_ast::Program {
    program(
        abc(),
        vec![func(
            "pick",
            vec![("n", SourceType::I32)],
            SourceType::Void,
            vec![switch(
                ident("n"),
                vec![
                    case(int(1), vec![call_stmt("a")]),
                    case(int(2), vec![call_stmt("b"), brk()]),
                    default(vec![call_stmt("c")]),
                ],
            )],
        )],
    )
}

#[test]
fn test_while_shape() {
    let program = program(
        vec![],
        vec![func(
            "count",
            vec![],
            SourceType::Void,
            vec![
                let_("x", Some(SourceType::I32), Some(int(0))),
                while_(
                    bin(ident("x"), BinaryOp::Lt, int(10)),
                    vec![expr_stmt(assign("x", bin(ident("x"), BinaryOp::Add, int(1))))],
                ),
            ],
        )],
    );

    let output = lower(&program);
    assert!(output.diagnostics.is_empty());
    let children = body_children(&output.module.functions[0].body);

    let expected = "\
(block $break$0
  (loop $continue$0
    (if
      (i32.lt_s
        (local.get 0)
        (i32.const 10))
      (then
        (block
          (block
            (local.set 0
              (i32.add
                (local.get 0)
                (i32.const 1))))
          (br $continue$0))))))";
    assert_eq!(children[1].to_string(), expected);
}

#[test]
fn test_switch_shape() {
    let output = lower(&abc_switch_program());
    assert!(output.diagnostics.is_empty());
    let func = &output.module.functions[0];
    assert_eq!(func.locals[1].name, "condition$0");
    let children = body_children(&func.body);

    let expected = "\
(block $break$0
  (block $default$0
    (block $case1$0
      (block $case0$0
        (local.set 1
          (local.get 0))
        (br_table $case0$0 $case1$0 $default$0
          (select
            (i32.const 0)
            (select
              (i32.const 1)
              (i32.const -1)
              (i32.eq
                (local.get 1)
                (i32.const 2)))
            (i32.eq
              (local.get 1)
              (i32.const 1)))))
      (call 0))
    (call 1)
    (br $break$0))
  (call 2))";
    assert_eq!(children[0].to_string(), expected);
}

#[test]
fn test_switch_without_default_falls_back_to_break() {
    let program = program(
        abc(),
        vec![func(
            "pick",
            vec![("n", SourceType::I32)],
            SourceType::Void,
            vec![switch(ident("n"), vec![case(int(7), vec![call_stmt("a")])])],
        )],
    );

    let output = lower(&program);
    let rendered = body_children(&output.module.functions[0].body)[0].to_string();
    assert!(rendered.contains("(br_table $case0$0 $break$0"));
}

#[test]
fn test_empty_switch_only_drops_discriminant() {
    let program = program(
        vec![import("next", vec![], SourceType::I32)],
        vec![func(
            "dispatch",
            vec![],
            SourceType::Void,
            vec![switch(call("next", vec![]), vec![])],
        )],
    );

    let output = lower(&program);
    let func = &output.module.functions[0];
    assert!(func.locals.is_empty());
    assert_eq!(body_children(&func.body)[0].to_string(), "(drop\n  (call 0))");
}

#[test]
fn test_duplicate_default_is_reported() {
    let program = program(
        abc(),
        vec![func(
            "pick",
            vec![("n", SourceType::I32)],
            SourceType::Void,
            vec![switch(
                ident("n"),
                vec![
                    default(vec![call_stmt("a")]),
                    SwitchCase {
                        span: Span::new(40, 52, 0),
                        ..default(vec![call_stmt("b")])
                    },
                ],
            )],
        )],
    );

    let output = lower(&program);
    assert_eq!(output.diagnostics.kinds(), vec![&DiagnosticKind::DuplicateDefault]);
    let reported: Vec<Span> = output.diagnostics.iter().map(|d| d.span).collect();
    assert_eq!(reported, vec![Span::new(40, 52, 0)]);
    assert!(validate_module(&output.module).is_ok());
}

#[test]
fn test_missing_return_value() {
    let program = program(
        vec![],
        vec![func("broken", vec![], SourceType::I32, vec![ret(None)])],
    );

    let output = lower(&program);
    assert_eq!(output.diagnostics.kinds(), vec![&DiagnosticKind::MissingReturnValue]);
    assert_eq!(
        output.module.functions[0].body,
        IrExpr::block(None, vec![IrExpr::unreachable()])
    );
}

#[test]
fn test_return_value_in_void_function() {
    let program = program(
        vec![],
        vec![func("noisy", vec![], SourceType::Void, vec![ret(Some(int(5)))])],
    );

    let output = lower(&program);
    assert_eq!(
        output.diagnostics.kinds(),
        vec![&DiagnosticKind::ReturnValueInVoidFunction]
    );
    assert_eq!(
        output.module.functions[0].body,
        IrExpr::block(None, vec![IrExpr::unreachable()])
    );
}

#[test]
fn test_poison_without_trap() {
    let program = program(
        vec![],
        vec![func("noisy", vec![], SourceType::Void, vec![ret(Some(int(5)))])],
    );

    let lowerer = Lowerer::new(LowerConfig::default().with_trap_on_error(false));
    let output = lowerer.lower_program(&program).expect("lowering failed");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(
        output.module.functions[0].body,
        IrExpr::block(None, vec![IrExpr::nop()])
    );
}

#[test]
fn test_implicit_narrowing_in_return_is_reported() {
    let program = program(
        vec![],
        vec![func(
            "narrow",
            vec![("n", SourceType::I64)],
            SourceType::I32,
            vec![ret(Some(ident("n")))],
        )],
    );

    let output = lower(&program);
    assert_eq!(
        output.diagnostics.kinds(),
        vec![&DiagnosticKind::ImplicitConversion {
            from: SourceType::I64,
            to: SourceType::I32,
        }]
    );
}

#[test]
fn test_break_outside_loop_is_an_error() {
    let program = program(
        vec![],
        vec![func("lost", vec![], SourceType::Void, vec![brk()])],
    );

    let result = Lowerer::default().lower_program(&program);
    assert_eq!(result.err(), Some(LowerError::BreakOutsideScope));
}

#[test]
fn test_continue_inside_bare_switch_is_an_error() {
    let program = program(
        vec![],
        vec![func(
            "lost",
            vec![("n", SourceType::I32)],
            SourceType::Void,
            vec![switch(ident("n"), vec![default(vec![cont()])])],
        )],
    );

    let result = Lowerer::default().lower_program(&program);
    assert_eq!(result.err(), Some(LowerError::ContinueOutsideLoop));
}

#[test]
fn test_labels_restart_per_function() {
    let looping = |name: &str| {
        func(
            name,
            vec![],
            SourceType::Void,
            vec![while_(boolean(false), vec![])],
        )
    };
    let program = program(vec![], vec![looping("first"), looping("second")]);

    let output = lower(&program);
    for func in &output.module.functions {
        let rendered = body_children(&func.body)[0].to_string();
        assert!(rendered.starts_with("(block $break$0"), "{}", rendered);
    }
}

#[test]
fn test_lowering_is_deterministic() {
    let program = abc_switch_program();

    let first = lower(&program);
    let second = lower(&program);
    assert_eq!(first.module.functions, second.module.functions);
    assert_eq!(first.module.to_string(), second.module.to_string());
}

#[test]
fn test_lowered_modules_validate() {
    let programs = [
        abc_switch_program(),
        program(
            vec![],
            vec![func(
                "nested",
                vec![("n", SourceType::I32)],
                SourceType::I32,
                vec![
                    let_("total", Some(SourceType::I32), Some(int(0))),
                    for_(
                        Some(let_("i", Some(SourceType::I32), Some(int(0)))),
                        Some(bin(ident("i"), BinaryOp::Lt, ident("n"))),
                        Some(assign_op("i", ripple_ast::AssignmentOp::AddAssign, int(1))),
                        vec![switch(
                            ident("i"),
                            vec![
                                case(int(0), vec![cont()]),
                                default(vec![expr_stmt(assign_op(
                                    "total",
                                    ripple_ast::AssignmentOp::AddAssign,
                                    ident("i"),
                                ))]),
                            ],
                        )],
                    ),
                    do_while(vec![brk()], boolean(true)),
                    ret(Some(ident("total"))),
                ],
            )],
        ),
    ];

    for program in &programs {
        let output = lower(program);
        assert!(output.diagnostics.is_empty());
        assert_eq!(validate_module(&output.module), Ok(()));
    }
}

#[test]
fn test_unknown_identifier_is_reported() {
    let program = program(
        vec![],
        vec![func(
            "lookup",
            vec![],
            SourceType::Void,
            vec![expr_stmt(assign("missing", int(1)))],
        )],
    );

    let output = lower(&program);
    assert_eq!(
        output.diagnostics.kinds(),
        vec![&DiagnosticKind::UnknownIdentifier("missing".to_string())]
    );
}

#[test]
fn test_out_of_range_literal_is_reported() {
    let program = program(
        vec![],
        vec![
            func("ret", vec![], SourceType::U8, vec![ret(Some(int(300)))]),
            func(
                "init",
                vec![],
                SourceType::Void,
                vec![let_("x", Some(SourceType::U8), Some(int(300)))],
            ),
            func(
                "negative",
                vec![],
                SourceType::U32,
                vec![ret(Some(int(-1)))],
            ),
        ],
    );

    let output = lower(&program);
    let narrowing = |from, to| DiagnosticKind::ImplicitConversion { from, to };
    assert_eq!(
        output.diagnostics.kinds(),
        vec![
            &narrowing(SourceType::I32, SourceType::U8),
            &narrowing(SourceType::I32, SourceType::U8),
            &narrowing(SourceType::I32, SourceType::U32),
        ]
    );
}

#[test]
fn test_in_range_literal_adopts_expected_type() {
    let program = program(
        vec![],
        vec![
            func("small", vec![], SourceType::U8, vec![ret(Some(int(255)))]),
            func("wide", vec![], SourceType::U32, vec![ret(Some(int(4_000_000_000)))]),
            func(
                "cast",
                vec![],
                SourceType::U8,
                vec![ret(Some(cast(int(300), SourceType::U8)))],
            ),
        ],
    );

    let output = lower(&program);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_switch_clause_bindings_end_with_switch() {
    let program = program(
        vec![],
        vec![func(
            "shadow",
            vec![("n", SourceType::I32)],
            SourceType::Void,
            vec![
                switch(
                    ident("n"),
                    vec![case(int(1), vec![let_("y", Some(SourceType::I32), Some(int(2)))])],
                ),
                let_("y", Some(SourceType::I32), Some(int(3))),
            ],
        )],
    );

    let output = lower(&program);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_switch_clause_binding_not_visible_after_switch() {
    let program = program(
        vec![],
        vec![func(
            "leak",
            vec![("n", SourceType::I32)],
            SourceType::Void,
            vec![
                switch(
                    ident("n"),
                    vec![
                        case(int(1), vec![let_("y", Some(SourceType::I32), Some(int(2)))]),
                        default(vec![expr_stmt(assign("y", int(4)))]),
                    ],
                ),
                expr_stmt(assign("y", int(5))),
            ],
        )],
    );

    let output = lower(&program);
    assert_eq!(
        output.diagnostics.kinds(),
        vec![&DiagnosticKind::UnknownIdentifier("y".to_string())]
    );
}
