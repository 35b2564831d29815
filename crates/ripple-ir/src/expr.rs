//! IR nodes and their constructors.
//!
//! Constructors are plain associated functions so lowering code composes trees
//! bottom-up without touching a shared builder state.

use crate::{BinOp, Constant, ConvertOp, FuncId, IrType, Label, LocalId, UnOp};

/// A node of the structured IR. Statements are nodes of type [`IrType::None`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Does nothing
    Nop,

    /// Traps when executed
    Unreachable,

    /// Sequence of children; a branch to `label` exits the block
    Block {
        label: Option<Label>,
        children: Vec<Expr>,
    },

    /// A branch to `label` restarts the body
    Loop {
        label: Label,
        body: Box<Expr>,
    },

    /// Two-armed conditional; `ty` is the result type when used as a value
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
        ty: IrType,
    },

    /// Evaluates both operands, then picks one by `cond`
    Select {
        cond: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },

    /// Branch to an enclosing label, conditionally when `cond` is present
    Br {
        label: Label,
        cond: Option<Box<Expr>>,
    },

    /// Multi-way branch: `index` selects from `labels`, out of range takes `default`
    BrTable {
        labels: Vec<Label>,
        default: Label,
        index: Box<Expr>,
    },

    /// Return from the function
    Return(Option<Box<Expr>>),

    /// Evaluate and discard
    Drop(Box<Expr>),

    /// Constant value
    Const(Constant),

    /// Read a local
    LocalGet {
        index: LocalId,
        ty: IrType,
    },

    /// Write a local
    LocalSet {
        index: LocalId,
        value: Box<Expr>,
    },

    /// Write a local and yield the written value
    LocalTee {
        index: LocalId,
        ty: IrType,
        value: Box<Expr>,
    },

    Unary {
        op: UnOp,
        operand: IrType,
        value: Box<Expr>,
    },

    Binary {
        op: BinOp,
        operand: IrType,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Convert {
        op: ConvertOp,
        value: Box<Expr>,
    },

    /// Direct call into the module's function space
    Call {
        func: FuncId,
        args: Vec<Expr>,
        ty: IrType,
    },
}

impl Expr {
    pub fn nop() -> Self {
        Expr::Nop
    }

    pub fn unreachable() -> Self {
        Expr::Unreachable
    }

    pub fn block(label: Option<Label>, children: Vec<Expr>) -> Self {
        Expr::Block { label, children }
    }

    pub fn loop_(label: Label, body: Expr) -> Self {
        Expr::Loop {
            label,
            body: Box::new(body),
        }
    }

    pub fn if_(cond: Expr, then_branch: Expr, else_branch: Option<Expr>) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            ty: IrType::None,
        }
    }

    /// Value-producing conditional; both arms must yield `ty`.
    pub fn if_value(cond: Expr, then_branch: Expr, else_branch: Expr, ty: IrType) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
            ty,
        }
    }

    pub fn select(cond: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Select {
            cond: Box::new(cond),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn br(label: Label) -> Self {
        Expr::Br { label, cond: None }
    }

    pub fn br_if(label: Label, cond: Expr) -> Self {
        Expr::Br {
            label,
            cond: Some(Box::new(cond)),
        }
    }

    pub fn br_table(labels: Vec<Label>, default: Label, index: Expr) -> Self {
        Expr::BrTable {
            labels,
            default,
            index: Box::new(index),
        }
    }

    pub fn return_(value: Option<Expr>) -> Self {
        Expr::Return(value.map(Box::new))
    }

    pub fn drop(value: Expr) -> Self {
        Expr::Drop(Box::new(value))
    }

    pub fn constant(value: Constant) -> Self {
        Expr::Const(value)
    }

    pub fn i32_const(value: i32) -> Self {
        Expr::Const(Constant::I32(value))
    }

    pub fn i64_const(value: i64) -> Self {
        Expr::Const(Constant::I64(value))
    }

    pub fn f32_const(value: f32) -> Self {
        Expr::Const(Constant::F32(value))
    }

    pub fn f64_const(value: f64) -> Self {
        Expr::Const(Constant::F64(value))
    }

    pub fn local_get(index: LocalId, ty: IrType) -> Self {
        Expr::LocalGet { index, ty }
    }

    pub fn local_set(index: LocalId, value: Expr) -> Self {
        Expr::LocalSet {
            index,
            value: Box::new(value),
        }
    }

    pub fn local_tee(index: LocalId, ty: IrType, value: Expr) -> Self {
        Expr::LocalTee {
            index,
            ty,
            value: Box::new(value),
        }
    }

    pub fn unary(op: UnOp, operand: IrType, value: Expr) -> Self {
        Expr::Unary {
            op,
            operand,
            value: Box::new(value),
        }
    }

    pub fn binary(op: BinOp, operand: IrType, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            operand,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn convert(op: ConvertOp, value: Expr) -> Self {
        Expr::Convert {
            op,
            value: Box::new(value),
        }
    }

    pub fn call(func: FuncId, args: Vec<Expr>, ty: IrType) -> Self {
        Expr::Call { func, args, ty }
    }

    /// Result type of this node.
    pub fn ty(&self) -> IrType {
        match self {
            Expr::Nop
            | Expr::Unreachable
            | Expr::Block { .. }
            | Expr::Loop { .. }
            | Expr::Br { .. }
            | Expr::BrTable { .. }
            | Expr::Return(_)
            | Expr::Drop(_)
            | Expr::LocalSet { .. } => IrType::None,
            Expr::If { ty, .. } => *ty,
            Expr::Select { if_true, .. } => if_true.ty(),
            Expr::Const(c) => c.ty(),
            Expr::LocalGet { ty, .. } | Expr::LocalTee { ty, .. } | Expr::Call { ty, .. } => *ty,
            Expr::Unary { op, operand, .. } => match op {
                UnOp::Eqz => IrType::I32,
                UnOp::Neg => *operand,
            },
            Expr::Binary { op, operand, .. } => {
                if op.is_comparison() {
                    IrType::I32
                } else {
                    *operand
                }
            }
            Expr::Convert { op, .. } => op.result_type(),
        }
    }

    /// Whether this node unconditionally transfers control away.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Expr::Unreachable
                | Expr::Return(_)
                | Expr::Br { cond: None, .. }
                | Expr::BrTable { .. }
        )
    }
}
