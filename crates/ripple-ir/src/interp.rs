//! Reference interpreter for IR modules.
//!
//! Evaluates the structured tree directly. Branches unwind through the Rust call
//! stack until the block or loop binding their label is reached, so `?` carries
//! breaks, returns and traps alike.

use std::fmt;

use thiserror::Error;
use tracing::trace;

use crate::{
    BinOp, Callee, Constant, ConvertOp, Expr, FuncId, IrFunction, IrModule, IrType, Label, LocalId,
    UnOp,
};

/// Maximum nesting of calls before the interpreter gives up.
const MAX_CALL_DEPTH: usize = 128;

/// A runtime value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn ty(&self) -> IrType {
        match self {
            Value::I32(_) => IrType::I32,
            Value::I64(_) => IrType::I64,
            Value::F32(_) => IrType::F32,
            Value::F64(_) => IrType::F64,
        }
    }

    /// Zero value of a type, `None` for the no-value type.
    pub fn zero(ty: IrType) -> Option<Value> {
        ty.zero().map(Value::from)
    }

    pub fn as_i32(&self) -> Result<i32, Trap> {
        match self {
            Value::I32(v) => Ok(*v),
            other => Err(Trap::TypeMismatch {
                expected: IrType::I32,
                found: other.ty(),
            }),
        }
    }
}

impl From<Constant> for Value {
    fn from(constant: Constant) -> Self {
        match constant {
            Constant::I32(v) => Value::I32(v),
            Constant::I64(v) => Value::I64(v),
            Constant::F32(v) => Value::F32(v),
            Constant::F64(v) => Value::F64(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Abnormal termination of an invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Trap {
    #[error("unreachable executed")]
    Unreachable,

    #[error("out of fuel")]
    OutOfFuel,

    #[error("integer divide by zero")]
    IntegerDivideByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("no host function registered for import `{0}`")]
    MissingHost(String),

    #[error("`{name}` expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: IrType, found: IrType },

    #[error("expression produced no value")]
    MissingValue,

    #[error("local {0} is not declared")]
    UnknownLocal(LocalId),

    #[error("branch to unbound label `{0}`")]
    UnboundLabel(String),

    #[error("call stack exhausted")]
    CallStackExhausted,

    #[error("host function failed: {0}")]
    Host(String),
}

/// A host function callable from IR through an import.
pub trait HostFn: 'static {
    fn call(&mut self, args: &[Value]) -> Result<Option<Value>, Trap>;
}

impl<F> HostFn for F
where
    F: for<'a> FnMut(&'a [Value]) -> Result<Option<Value>, Trap> + 'static,
{
    fn call(&mut self, args: &[Value]) -> Result<Option<Value>, Trap> {
        self(args)
    }
}

/// Non-local exits out of an expression.
enum Unwind {
    Break(Label),
    Return(Option<Value>),
    Trap(Trap),
}

impl From<Trap> for Unwind {
    fn from(trap: Trap) -> Self {
        Unwind::Trap(trap)
    }
}

type Eval = Result<Option<Value>, Unwind>;

struct Frame {
    locals: Vec<Value>,
}

/// Tree-walking interpreter over one module.
pub struct Interpreter<'m> {
    module: &'m IrModule,
    hosts: Vec<Option<Box<dyn HostFn>>>,
    fuel: Option<u64>,
    depth: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m IrModule) -> Self {
        let hosts = module.imports.iter().map(|_| None).collect();
        Self {
            module,
            hosts,
            fuel: None,
            depth: 0,
        }
    }

    /// Limits the number of loop iterations and calls an invocation may perform.
    pub fn with_fuel(mut self, fuel: u64) -> Self {
        self.fuel = Some(fuel);
        self
    }

    /// Binds a host function to the import named `name`.
    pub fn register_host(&mut self, name: &str, host: impl HostFn) -> Result<(), Trap> {
        let index = self
            .module
            .imports
            .iter()
            .position(|import| import.name == name)
            .ok_or_else(|| Trap::UnknownFunction(name.to_string()))?;
        self.hosts[index] = Some(Box::new(host));
        Ok(())
    }

    /// Calls the defined function `name` with `args`.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, Trap> {
        let module = self.module;
        let func = module
            .find_function(name)
            .ok_or_else(|| Trap::UnknownFunction(name.to_string()))?;
        self.call(func.id, args.to_vec())
    }

    fn consume_fuel(&mut self) -> Result<(), Trap> {
        match self.fuel.as_mut() {
            Some(0) => Err(Trap::OutOfFuel),
            Some(fuel) => {
                *fuel -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn call(&mut self, id: FuncId, args: Vec<Value>) -> Result<Option<Value>, Trap> {
        self.consume_fuel()?;
        let module = self.module;
        let callee = module
            .callee(id)
            .ok_or_else(|| Trap::UnknownFunction(id.to_string()))?;
        let (name, params) = match callee {
            Callee::Import(import) => (import.name.as_str(), callee.params()),
            Callee::Function(func) => (func.name.as_str(), callee.params()),
        };
        if params.len() != args.len() {
            return Err(Trap::ArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                found: args.len(),
            });
        }
        for (param, arg) in params.iter().zip(&args) {
            if *param != arg.ty() {
                return Err(Trap::TypeMismatch {
                    expected: *param,
                    found: arg.ty(),
                });
            }
        }
        trace!(function = name, ?args, "call");

        match callee {
            Callee::Import(import) => {
                let host = self.hosts[id.0]
                    .as_mut()
                    .ok_or_else(|| Trap::MissingHost(import.name.clone()))?;
                host.call(&args)
            }
            Callee::Function(func) => {
                if self.depth == MAX_CALL_DEPTH {
                    return Err(Trap::CallStackExhausted);
                }
                self.depth += 1;
                let result = self.run(func, args);
                self.depth -= 1;
                result
            }
        }
    }

    fn run(&mut self, func: &IrFunction, mut locals: Vec<Value>) -> Result<Option<Value>, Trap> {
        for local in &func.locals[func.params.len()..] {
            locals.push(Value::zero(local.ty).ok_or(Trap::MissingValue)?);
        }
        let mut frame = Frame { locals };
        let value = match self.eval(&mut frame, &func.body) {
            Ok(value) | Err(Unwind::Return(value)) => value,
            Err(Unwind::Break(label)) => return Err(Trap::UnboundLabel(label.to_string())),
            Err(Unwind::Trap(trap)) => return Err(trap),
        };
        if func.result == IrType::None {
            Ok(None)
        } else {
            value.map(Some).ok_or(Trap::MissingValue)
        }
    }

    fn value(&mut self, frame: &mut Frame, expr: &Expr) -> Result<Value, Unwind> {
        self.eval(frame, expr)?
            .ok_or(Unwind::Trap(Trap::MissingValue))
    }

    fn condition(&mut self, frame: &mut Frame, expr: &Expr) -> Result<bool, Unwind> {
        Ok(self.value(frame, expr)?.as_i32()? != 0)
    }

    fn eval(&mut self, frame: &mut Frame, expr: &Expr) -> Eval {
        match expr {
            Expr::Nop => Ok(None),
            Expr::Unreachable => Err(Trap::Unreachable.into()),
            Expr::Block { label, children } => {
                let mut last = None;
                for child in children {
                    match self.eval(frame, child) {
                        Ok(value) => last = value,
                        Err(Unwind::Break(target)) if Some(target) == *label => return Ok(None),
                        Err(unwind) => return Err(unwind),
                    }
                }
                Ok(last)
            }
            Expr::Loop { label, body } => loop {
                self.consume_fuel()?;
                match self.eval(frame, body) {
                    Err(Unwind::Break(target)) if target == *label => continue,
                    other => return other,
                }
            },
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                if self.condition(frame, cond)? {
                    self.eval(frame, then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.eval(frame, else_branch)
                } else {
                    Ok(None)
                }
            }
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => {
                let if_true = self.value(frame, if_true)?;
                let if_false = self.value(frame, if_false)?;
                let picked = if self.condition(frame, cond)? {
                    if_true
                } else {
                    if_false
                };
                Ok(Some(picked))
            }
            Expr::Br { label, cond } => {
                if let Some(cond) = cond {
                    if !self.condition(frame, cond)? {
                        return Ok(None);
                    }
                }
                Err(Unwind::Break(*label))
            }
            Expr::BrTable {
                labels,
                default,
                index,
            } => {
                let index = self.value(frame, index)?.as_i32()? as u32 as usize;
                Err(Unwind::Break(*labels.get(index).unwrap_or(default)))
            }
            Expr::Return(value) => {
                let value = match value {
                    Some(value) => Some(self.value(frame, value)?),
                    None => None,
                };
                Err(Unwind::Return(value))
            }
            Expr::Drop(value) => {
                self.eval(frame, value)?;
                Ok(None)
            }
            Expr::Const(constant) => Ok(Some(Value::from(*constant))),
            Expr::LocalGet { index, .. } => frame
                .locals
                .get(index.0)
                .copied()
                .map(Some)
                .ok_or(Unwind::Trap(Trap::UnknownLocal(*index))),
            Expr::LocalSet { index, value } => {
                let value = self.value(frame, value)?;
                store(frame, *index, value)?;
                Ok(None)
            }
            Expr::LocalTee { index, value, .. } => {
                let value = self.value(frame, value)?;
                store(frame, *index, value)?;
                Ok(Some(value))
            }
            Expr::Unary { op, value, .. } => {
                let value = self.value(frame, value)?;
                Ok(Some(unary(*op, value)?))
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.value(frame, left)?;
                let right = self.value(frame, right)?;
                Ok(Some(binary(*op, left, right)?))
            }
            Expr::Convert { op, value } => {
                let value = self.value(frame, value)?;
                Ok(Some(convert(*op, value)?))
            }
            Expr::Call { func, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.value(frame, arg)?);
                }
                Ok(self.call(*func, values)?)
            }
        }
    }
}

fn store(frame: &mut Frame, index: LocalId, value: Value) -> Result<(), Trap> {
    let slot = frame
        .locals
        .get_mut(index.0)
        .ok_or(Trap::UnknownLocal(index))?;
    if slot.ty() != value.ty() {
        return Err(Trap::TypeMismatch {
            expected: slot.ty(),
            found: value.ty(),
        });
    }
    *slot = value;
    Ok(())
}

fn mismatch(expected: IrType, found: Value) -> Trap {
    Trap::TypeMismatch {
        expected,
        found: found.ty(),
    }
}

fn unary(op: UnOp, value: Value) -> Result<Value, Trap> {
    match (op, value) {
        (UnOp::Eqz, Value::I32(v)) => Ok(Value::I32((v == 0) as i32)),
        (UnOp::Eqz, Value::I64(v)) => Ok(Value::I32((v == 0) as i32)),
        (UnOp::Neg, Value::F32(v)) => Ok(Value::F32(-v)),
        (UnOp::Neg, Value::F64(v)) => Ok(Value::F64(-v)),
        (UnOp::Eqz, other) => Err(mismatch(IrType::I32, other)),
        (UnOp::Neg, other) => Err(mismatch(IrType::F64, other)),
    }
}

macro_rules! int_binary {
    ($name:ident, $int:ty, $uint:ty, $variant:ident) => {
        fn $name(op: BinOp, a: $int, b: $int) -> Result<Value, Trap> {
            let flag = |c: bool| Value::I32(c as i32);
            let value = match op {
                BinOp::Add => Value::$variant(a.wrapping_add(b)),
                BinOp::Sub => Value::$variant(a.wrapping_sub(b)),
                BinOp::Mul => Value::$variant(a.wrapping_mul(b)),
                BinOp::DivS => {
                    if b == 0 {
                        return Err(Trap::IntegerDivideByZero);
                    }
                    Value::$variant(a.checked_div(b).ok_or(Trap::IntegerOverflow)?)
                }
                BinOp::DivU => {
                    if b == 0 {
                        return Err(Trap::IntegerDivideByZero);
                    }
                    Value::$variant(((a as $uint) / (b as $uint)) as $int)
                }
                BinOp::RemS => {
                    if b == 0 {
                        return Err(Trap::IntegerDivideByZero);
                    }
                    Value::$variant(a.wrapping_rem(b))
                }
                BinOp::RemU => {
                    if b == 0 {
                        return Err(Trap::IntegerDivideByZero);
                    }
                    Value::$variant(((a as $uint) % (b as $uint)) as $int)
                }
                BinOp::And => Value::$variant(a & b),
                BinOp::Or => Value::$variant(a | b),
                BinOp::Xor => Value::$variant(a ^ b),
                BinOp::Shl => Value::$variant(a.wrapping_shl(b as u32)),
                BinOp::ShrS => Value::$variant(a.wrapping_shr(b as u32)),
                BinOp::ShrU => Value::$variant((a as $uint).wrapping_shr(b as u32) as $int),
                BinOp::Eq => flag(a == b),
                BinOp::Ne => flag(a != b),
                BinOp::LtS => flag(a < b),
                BinOp::LtU => flag((a as $uint) < (b as $uint)),
                BinOp::LeS => flag(a <= b),
                BinOp::LeU => flag((a as $uint) <= (b as $uint)),
                BinOp::GtS => flag(a > b),
                BinOp::GtU => flag((a as $uint) > (b as $uint)),
                BinOp::GeS => flag(a >= b),
                BinOp::GeU => flag((a as $uint) >= (b as $uint)),
                BinOp::Div | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    return Err(Trap::TypeMismatch {
                        expected: IrType::F64,
                        found: Value::$variant(a).ty(),
                    })
                }
            };
            Ok(value)
        }
    };
}

int_binary!(binary_i32, i32, u32, I32);
int_binary!(binary_i64, i64, u64, I64);

macro_rules! float_binary {
    ($name:ident, $float:ty, $variant:ident) => {
        fn $name(op: BinOp, a: $float, b: $float) -> Result<Value, Trap> {
            let flag = |c: bool| Value::I32(c as i32);
            let value = match op {
                BinOp::Add => Value::$variant(a + b),
                BinOp::Sub => Value::$variant(a - b),
                BinOp::Mul => Value::$variant(a * b),
                BinOp::Div => Value::$variant(a / b),
                BinOp::Eq => flag(a == b),
                BinOp::Ne => flag(a != b),
                BinOp::Lt => flag(a < b),
                BinOp::Le => flag(a <= b),
                BinOp::Gt => flag(a > b),
                BinOp::Ge => flag(a >= b),
                _ => {
                    return Err(Trap::TypeMismatch {
                        expected: IrType::I32,
                        found: Value::$variant(a).ty(),
                    })
                }
            };
            Ok(value)
        }
    };
}

float_binary!(binary_f32, f32, F32);
float_binary!(binary_f64, f64, F64);

fn binary(op: BinOp, left: Value, right: Value) -> Result<Value, Trap> {
    match (left, right) {
        (Value::I32(a), Value::I32(b)) => binary_i32(op, a, b),
        (Value::I64(a), Value::I64(b)) => binary_i64(op, a, b),
        (Value::F32(a), Value::F32(b)) => binary_f32(op, a, b),
        (Value::F64(a), Value::F64(b)) => binary_f64(op, a, b),
        (left, right) => Err(mismatch(left.ty(), right)),
    }
}

fn convert(op: ConvertOp, value: Value) -> Result<Value, Trap> {
    use ConvertOp::*;
    // `as` from float to int saturates and maps NaN to zero.
    let converted = match (op, value) {
        (I32WrapI64, Value::I64(v)) => Value::I32(v as i32),
        (I64ExtendI32S, Value::I32(v)) => Value::I64(v as i64),
        (I64ExtendI32U, Value::I32(v)) => Value::I64(v as u32 as i64),
        (I32Extend8S, Value::I32(v)) => Value::I32(v as i8 as i32),
        (I32Extend16S, Value::I32(v)) => Value::I32(v as i16 as i32),
        (I32TruncSatF32S, Value::F32(v)) => Value::I32(v as i32),
        (I32TruncSatF32U, Value::F32(v)) => Value::I32(v as u32 as i32),
        (I32TruncSatF64S, Value::F64(v)) => Value::I32(v as i32),
        (I32TruncSatF64U, Value::F64(v)) => Value::I32(v as u32 as i32),
        (I64TruncSatF32S, Value::F32(v)) => Value::I64(v as i64),
        (I64TruncSatF32U, Value::F32(v)) => Value::I64(v as u64 as i64),
        (I64TruncSatF64S, Value::F64(v)) => Value::I64(v as i64),
        (I64TruncSatF64U, Value::F64(v)) => Value::I64(v as u64 as i64),
        (F32ConvertI32S, Value::I32(v)) => Value::F32(v as f32),
        (F32ConvertI32U, Value::I32(v)) => Value::F32(v as u32 as f32),
        (F32ConvertI64S, Value::I64(v)) => Value::F32(v as f32),
        (F32ConvertI64U, Value::I64(v)) => Value::F32(v as u64 as f32),
        (F64ConvertI32S, Value::I32(v)) => Value::F64(v as f64),
        (F64ConvertI32U, Value::I32(v)) => Value::F64(v as u32 as f64),
        (F64ConvertI64S, Value::I64(v)) => Value::F64(v as f64),
        (F64ConvertI64U, Value::I64(v)) => Value::F64(v as u64 as f64),
        (F32DemoteF64, Value::F64(v)) => Value::F32(v as f32),
        (F64PromoteF32, Value::F32(v)) => Value::F64(v as f64),
        (op, other) => return Err(mismatch(op.operand_type(), other)),
    };
    Ok(converted)
}
