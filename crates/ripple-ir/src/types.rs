//! IR value types, constants and operators.

use std::fmt;

/// IR value types. Everything narrower than 32 bits lives in an `i32` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// No value (statements)
    None,
    I32,
    I64,
    F32,
    F64,
}

impl IrType {
    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::I32 | IrType::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }

    /// Zero value of this type, `None` for the no-value type.
    pub fn zero(&self) -> Option<Constant> {
        match self {
            IrType::None => None,
            IrType::I32 => Some(Constant::I32(0)),
            IrType::I64 => Some(Constant::I64(0)),
            IrType::F32 => Some(Constant::F32(0.0)),
            IrType::F64 => Some(Constant::F64(0.0)),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IrType::None => "none",
            IrType::I32 => "i32",
            IrType::I64 => "i64",
            IrType::F32 => "f32",
            IrType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}

/// Compile-time constant values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Constant {
    pub fn ty(&self) -> IrType {
        match self {
            Constant::I32(_) => IrType::I32,
            Constant::I64(_) => IrType::I64,
            Constant::F32(_) => IrType::F32,
            Constant::F64(_) => IrType::F64,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::I32(v) => write!(f, "i32.const {}", v),
            Constant::I64(v) => write!(f, "i64.const {}", v),
            Constant::F32(v) => write!(f, "f32.const {}", v),
            Constant::F64(v) => write!(f, "f64.const {}", v),
        }
    }
}

/// Binary operators. The operand type is carried by the node; signed/unsigned
/// variants only apply to integers, the plain `Div`/`Lt`/... variants to floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    DivS,
    DivU,
    RemS,
    RemU,
    Div,

    // Bitwise
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,

    // Comparison
    Eq,
    Ne,
    LtS,
    LtU,
    LeS,
    LeU,
    GtS,
    GtU,
    GeS,
    GeU,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Comparisons always produce an `i32` truth value.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::Ne
                | BinOp::LtS
                | BinOp::LtU
                | BinOp::LeS
                | BinOp::LeU
                | BinOp::GtS
                | BinOp::GtU
                | BinOp::GeS
                | BinOp::GeU
                | BinOp::Lt
                | BinOp::Le
                | BinOp::Gt
                | BinOp::Ge
        )
    }

    /// Whether the operator is defined for the given operand type.
    pub fn accepts(&self, operand: IrType) -> bool {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Eq | BinOp::Ne => {
                operand != IrType::None
            }
            BinOp::Div | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => operand.is_float(),
            _ => operand.is_integer(),
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::DivS => "div_s",
            BinOp::DivU => "div_u",
            BinOp::RemS => "rem_s",
            BinOp::RemU => "rem_u",
            BinOp::Div => "div",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::ShrS => "shr_s",
            BinOp::ShrU => "shr_u",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::LtS => "lt_s",
            BinOp::LtU => "lt_u",
            BinOp::LeS => "le_s",
            BinOp::LeU => "le_u",
            BinOp::GtS => "gt_s",
            BinOp::GtU => "gt_u",
            BinOp::GeS => "ge_s",
            BinOp::GeU => "ge_u",
            BinOp::Lt => "lt",
            BinOp::Le => "le",
            BinOp::Gt => "gt",
            BinOp::Ge => "ge",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// Integer test for zero, produces `i32`
    Eqz,
    /// Float negation
    Neg,
}

impl UnOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            UnOp::Eqz => "eqz",
            UnOp::Neg => "neg",
        }
    }
}

/// Numeric conversion operators, named after their WebAssembly counterparts.
/// Float-to-int truncations saturate (NaN becomes zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertOp {
    I32WrapI64,
    I64ExtendI32S,
    I64ExtendI32U,
    I32Extend8S,
    I32Extend16S,
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,
    F32ConvertI32S,
    F32ConvertI32U,
    F32ConvertI64S,
    F32ConvertI64U,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    F32DemoteF64,
    F64PromoteF32,
}

impl ConvertOp {
    pub fn operand_type(&self) -> IrType {
        use ConvertOp::*;
        match self {
            I32WrapI64 | F32ConvertI64S | F32ConvertI64U | F64ConvertI64S | F64ConvertI64U => {
                IrType::I64
            }
            I64ExtendI32S | I64ExtendI32U | I32Extend8S | I32Extend16S | F32ConvertI32S
            | F32ConvertI32U | F64ConvertI32S | F64ConvertI32U => IrType::I32,
            I32TruncSatF32S | I32TruncSatF32U | I64TruncSatF32S | I64TruncSatF32U
            | F64PromoteF32 => IrType::F32,
            I32TruncSatF64S | I32TruncSatF64U | I64TruncSatF64S | I64TruncSatF64U
            | F32DemoteF64 => IrType::F64,
        }
    }

    pub fn result_type(&self) -> IrType {
        use ConvertOp::*;
        match self {
            I32WrapI64 | I32Extend8S | I32Extend16S | I32TruncSatF32S | I32TruncSatF32U
            | I32TruncSatF64S | I32TruncSatF64U => IrType::I32,
            I64ExtendI32S | I64ExtendI32U | I64TruncSatF32S | I64TruncSatF32U
            | I64TruncSatF64S | I64TruncSatF64U => IrType::I64,
            F32ConvertI32S | F32ConvertI32U | F32ConvertI64S | F32ConvertI64U
            | F32DemoteF64 => IrType::F32,
            F64ConvertI32S | F64ConvertI32U | F64ConvertI64S | F64ConvertI64U
            | F64PromoteF32 => IrType::F64,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        use ConvertOp::*;
        match self {
            I32WrapI64 => "i32.wrap_i64",
            I64ExtendI32S => "i64.extend_i32_s",
            I64ExtendI32U => "i64.extend_i32_u",
            I32Extend8S => "i32.extend8_s",
            I32Extend16S => "i32.extend16_s",
            I32TruncSatF32S => "i32.trunc_sat_f32_s",
            I32TruncSatF32U => "i32.trunc_sat_f32_u",
            I32TruncSatF64S => "i32.trunc_sat_f64_s",
            I32TruncSatF64U => "i32.trunc_sat_f64_u",
            I64TruncSatF32S => "i64.trunc_sat_f32_s",
            I64TruncSatF32U => "i64.trunc_sat_f32_u",
            I64TruncSatF64S => "i64.trunc_sat_f64_s",
            I64TruncSatF64U => "i64.trunc_sat_f64_u",
            F32ConvertI32S => "f32.convert_i32_s",
            F32ConvertI32U => "f32.convert_i32_u",
            F32ConvertI64S => "f32.convert_i64_s",
            F32ConvertI64U => "f32.convert_i64_u",
            F64ConvertI32S => "f64.convert_i32_s",
            F64ConvertI32U => "f64.convert_i32_u",
            F64ConvertI64S => "f64.convert_i64_s",
            F64ConvertI64U => "f64.convert_i64_u",
            F32DemoteF64 => "f32.demote_f64",
            F64PromoteF32 => "f64.promote_f32",
        }
    }
}
