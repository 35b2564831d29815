//! AST builders and an interpreter harness shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use ripple_ast::*;
use ripple_ir::interp::{Interpreter, Trap, Value};
use ripple_ir::IrModule;
use ripple_lower::{LowerOutput, Lowerer};

pub fn node<T>(value: T) -> Node<T> {
    Node::synthetic(value)
}

pub fn int(value: i64) -> Node<Expr> {
    node(Expr::Literal(Literal::Int(value)))
}

pub fn boolean(value: bool) -> Node<Expr> {
    node(Expr::Literal(Literal::Boolean(value)))
}

pub fn ident(name: &str) -> Node<Expr> {
    node(Expr::Ident(Ident::new(name)))
}

pub fn bin(left: Node<Expr>, op: BinaryOp, right: Node<Expr>) -> Node<Expr> {
    node(Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn assign_op(name: &str, op: AssignmentOp, value: Node<Expr>) -> Node<Expr> {
    node(Expr::Assignment {
        target: node(Ident::new(name)),
        op,
        value: Box::new(value),
    })
}

pub fn assign(name: &str, value: Node<Expr>) -> Node<Expr> {
    assign_op(name, AssignmentOp::Assign, value)
}

pub fn call(name: &str, args: Vec<Node<Expr>>) -> Node<Expr> {
    node(Expr::Call {
        callee: node(Ident::new(name)),
        args,
    })
}

pub fn cast(expr: Node<Expr>, ty: SourceType) -> Node<Expr> {
    node(Expr::TypeCast {
        expr: Box::new(expr),
        ty,
    })
}

pub fn expr_stmt(expr: Node<Expr>) -> Node<Stmt> {
    node(Stmt::Expr(expr))
}

pub fn call_stmt(name: &str) -> Node<Stmt> {
    expr_stmt(call(name, vec![]))
}

pub fn let_(name: &str, ty: Option<SourceType>, init: Option<Node<Expr>>) -> Node<Stmt> {
    node(Stmt::VarDecl(VarDecl {
        kind: VarDeclKind::Let,
        declarations: vec![VarDeclarator {
            name: node(Ident::new(name)),
            type_annotation: ty,
            init,
        }],
    }))
}

pub fn ret(value: Option<Node<Expr>>) -> Node<Stmt> {
    node(Stmt::Return(value))
}

pub fn block(stmts: Vec<Node<Stmt>>) -> Node<Stmt> {
    node(Stmt::Block(BlockStmt { stmts }))
}

pub fn if_(
    condition: Node<Expr>,
    then_stmt: Node<Stmt>,
    else_stmt: Option<Node<Stmt>>,
) -> Node<Stmt> {
    node(Stmt::If {
        condition,
        then_stmt: Box::new(then_stmt),
        else_stmt: else_stmt.map(Box::new),
    })
}

pub fn while_(condition: Node<Expr>, body: Vec<Node<Stmt>>) -> Node<Stmt> {
    node(Stmt::While {
        condition,
        body: Some(Box::new(block(body))),
    })
}

pub fn do_while(body: Vec<Node<Stmt>>, condition: Node<Expr>) -> Node<Stmt> {
    node(Stmt::DoWhile {
        body: Box::new(block(body)),
        condition,
    })
}

pub fn for_(
    init: Option<Node<Stmt>>,
    condition: Option<Node<Expr>>,
    update: Option<Node<Expr>>,
    body: Vec<Node<Stmt>>,
) -> Node<Stmt> {
    node(Stmt::For {
        init: init.map(Box::new),
        condition,
        update,
        body: Some(Box::new(block(body))),
    })
}

pub fn brk() -> Node<Stmt> {
    node(Stmt::Break)
}

pub fn cont() -> Node<Stmt> {
    node(Stmt::Continue)
}

pub fn case(test: Node<Expr>, consequent: Vec<Node<Stmt>>) -> SwitchCase {
    SwitchCase {
        test: Some(test),
        consequent,
        span: Span::default(),
    }
}

pub fn default(consequent: Vec<Node<Stmt>>) -> SwitchCase {
    SwitchCase {
        test: None,
        consequent,
        span: Span::default(),
    }
}

pub fn switch(discriminant: Node<Expr>, cases: Vec<SwitchCase>) -> Node<Stmt> {
    node(Stmt::Switch {
        discriminant,
        cases,
    })
}

pub fn func(
    name: &str,
    params: Vec<(&str, SourceType)>,
    return_type: SourceType,
    stmts: Vec<Node<Stmt>>,
) -> FunctionDecl {
    FunctionDecl {
        name: Ident::new(name),
        params: params
            .into_iter()
            .map(|(name, ty)| Param {
                name: Ident::new(name),
                ty,
            })
            .collect(),
        return_type,
        body: node(BlockStmt { stmts }),
        is_export: true,
        span: Span::default(),
    }
}

pub fn import(name: &str, params: Vec<SourceType>, return_type: SourceType) -> ImportDecl {
    ImportDecl {
        name: Ident::new(name),
        params,
        return_type,
    }
}

/// `a()`, `b()` and `c()`, the host functions switch tests observe.
pub fn abc() -> Vec<ImportDecl> {
    ["a", "b", "c"]
        .into_iter()
        .map(|name| import(name, vec![], SourceType::Void))
        .collect()
}

pub fn program(imports: Vec<ImportDecl>, functions: Vec<FunctionDecl>) -> Program {
    Program { imports, functions }
}

/// Result of a run and the host calls it made, in order.
pub type Outcome = (Result<Option<Value>, Trap>, Vec<String>);

pub fn lower(program: &Program) -> LowerOutput {
    Lowerer::default()
        .lower_program(program)
        .expect("lowering failed")
}

/// Runs `entry`, binding every import to a host that records its name and
/// returns zero. Returns the result and the host calls in order.
pub fn run(module: &IrModule, entry: &str, args: &[Value]) -> Outcome {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut interp = Interpreter::new(module).with_fuel(10_000);
    for import in &module.imports {
        let sink = Rc::clone(&calls);
        let name = import.name.clone();
        let result = Value::zero(import.result);
        interp
            .register_host(&import.name, move |_: &[Value]| -> Result<Option<Value>, Trap> {
                sink.borrow_mut().push(name.clone());
                Ok(result)
            })
            .expect("import exists");
    }
    let outcome = interp.invoke(entry, args);
    let calls = calls.borrow().clone();
    (outcome, calls)
}

/// Lowers `program`, requires it to be diagnostic free and runs `entry`.
pub fn execute(program: &Program, entry: &str, args: &[Value]) -> Outcome {
    let output = lower(program);
    assert!(
        output.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        output.diagnostics
    );
    run(&output.module, entry, args)
}
