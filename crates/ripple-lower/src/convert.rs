//! Conversions between source value types.
//!
//! Implicit conversions only go through when no value can change; explicit ones
//! (casts, conditions, switch discriminants and guards) always succeed using a
//! fixed rule per type pair.

use ripple_ast::SourceType;
use ripple_ir::{BinOp, ConvertOp, Expr as IrExpr, IrType};
use thiserror::Error;

use crate::{LowerConfig, PointerWidth};

/// A conversion the bridge refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("`void` has no value to convert to `{to}`")]
    FromVoid { to: SourceType },

    #[error("converting `{from}` to `{to}` can change the value")]
    Lossy { from: SourceType, to: SourceType },
}

/// Emits the IR for value conversions under one pointer width.
#[derive(Debug, Clone, Copy)]
pub struct ConversionBridge {
    pointer_width: PointerWidth,
}

impl ConversionBridge {
    pub fn new(config: &LowerConfig) -> Self {
        Self {
            pointer_width: config.pointer_width,
        }
    }

    fn resolve(&self, ty: SourceType) -> SourceType {
        ty.resolve(self.pointer_width.bits())
    }

    fn slot(&self, ty: SourceType) -> IrType {
        match self.resolve(ty) {
            SourceType::Void => IrType::None,
            SourceType::I64 | SourceType::U64 => IrType::I64,
            SourceType::F32 => IrType::F32,
            SourceType::F64 => IrType::F64,
            _ => IrType::I32,
        }
    }

    /// Whether every value of `from` survives conversion to `to` unchanged.
    pub fn is_lossless(&self, from: SourceType, to: SourceType) -> bool {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if from == to || to.is_void() {
            return true;
        }
        match (from, to) {
            (SourceType::Void, _) | (_, SourceType::Bool) => false,
            (SourceType::Bool, _) => true,
            (f, t) if f.is_integer() && t.is_integer() => {
                let (fb, tb) = (f.bits(0), t.bits(0));
                match (f.is_signed(), t.is_signed()) {
                    (true, false) => false,
                    (false, true) => tb > fb,
                    _ => tb >= fb,
                }
            }
            (f, SourceType::F32) if f.is_integer() => f.bits(0) <= 24,
            (f, SourceType::F64) if f.is_integer() => f.bits(0) <= 53,
            (SourceType::F32, SourceType::F64) => true,
            _ => false,
        }
    }

    /// Checks whether `from` converts to `to` without an explicit cast.
    pub fn check(&self, from: SourceType, to: SourceType) -> Result<(), ConversionError> {
        if from.is_void() && !to.is_void() {
            return Err(ConversionError::FromVoid { to });
        }
        if !self.is_lossless(from, to) {
            return Err(ConversionError::Lossy { from, to });
        }
        Ok(())
    }

    /// Converts `value`, refusing lossy conversions unless `explicit`.
    pub fn convert(
        &self,
        value: IrExpr,
        from: SourceType,
        to: SourceType,
        explicit: bool,
    ) -> Result<IrExpr, ConversionError> {
        if explicit {
            if from.is_void() && !to.is_void() {
                return Err(ConversionError::FromVoid { to });
            }
        } else {
            self.check(from, to)?;
        }
        Ok(self.coerce(value, from, to))
    }

    /// Unconditional conversion following the fixed rule for the type pair.
    pub fn coerce(&self, value: IrExpr, from: SourceType, to: SourceType) -> IrExpr {
        let (from, to) = (self.resolve(from), self.resolve(to));
        if from == to {
            return value;
        }
        if to.is_void() {
            return IrExpr::drop(value);
        }
        if from.is_void() {
            return IrExpr::block(None, vec![value, IrExpr::unreachable()]);
        }
        if to == SourceType::Bool {
            return self.truth_test(value, from);
        }

        let (src, dst) = (self.slot(from), self.slot(to));
        let converted = if from.is_float() && to.is_float() {
            match (src, dst) {
                (IrType::F32, IrType::F64) => IrExpr::convert(ConvertOp::F64PromoteF32, value),
                _ => IrExpr::convert(ConvertOp::F32DemoteF64, value),
            }
        } else if to.is_float() {
            IrExpr::convert(int_to_float(src, dst, from.is_signed()), value)
        } else if from.is_float() {
            IrExpr::convert(float_to_int(src, dst, to.is_signed()), value)
        } else {
            match (src, dst) {
                (IrType::I32, IrType::I64) if from.is_signed() => {
                    IrExpr::convert(ConvertOp::I64ExtendI32S, value)
                }
                (IrType::I32, IrType::I64) => IrExpr::convert(ConvertOp::I64ExtendI32U, value),
                (IrType::I64, IrType::I32) => IrExpr::convert(ConvertOp::I32WrapI64, value),
                _ => value,
            }
        };

        if to.bits(0) < 32 && !self.is_lossless(from, to) {
            normalize(converted, to)
        } else {
            converted
        }
    }

    fn truth_test(&self, value: IrExpr, from: SourceType) -> IrExpr {
        let slot = self.slot(from);
        let zero = match slot.zero() {
            Some(zero) => IrExpr::constant(zero),
            None => return IrExpr::block(None, vec![value, IrExpr::unreachable()]),
        };
        IrExpr::binary(BinOp::Ne, slot, value, zero)
    }

    /// Representation switch discriminants and guards are compared in.
    pub fn discriminant_type(&self, ty: SourceType) -> SourceType {
        match self.resolve(ty) {
            SourceType::I64 => SourceType::I64,
            SourceType::U64 => SourceType::U64,
            SourceType::U32 => SourceType::U32,
            _ => SourceType::I32,
        }
    }
}

fn int_to_float(src: IrType, dst: IrType, signed: bool) -> ConvertOp {
    match (src, dst, signed) {
        (IrType::I64, IrType::F32, true) => ConvertOp::F32ConvertI64S,
        (IrType::I64, IrType::F32, false) => ConvertOp::F32ConvertI64U,
        (IrType::I64, _, true) => ConvertOp::F64ConvertI64S,
        (IrType::I64, _, false) => ConvertOp::F64ConvertI64U,
        (_, IrType::F32, true) => ConvertOp::F32ConvertI32S,
        (_, IrType::F32, false) => ConvertOp::F32ConvertI32U,
        (_, _, true) => ConvertOp::F64ConvertI32S,
        (_, _, false) => ConvertOp::F64ConvertI32U,
    }
}

fn float_to_int(src: IrType, dst: IrType, signed: bool) -> ConvertOp {
    match (src, dst, signed) {
        (IrType::F32, IrType::I64, true) => ConvertOp::I64TruncSatF32S,
        (IrType::F32, IrType::I64, false) => ConvertOp::I64TruncSatF32U,
        (IrType::F32, _, true) => ConvertOp::I32TruncSatF32S,
        (IrType::F32, _, false) => ConvertOp::I32TruncSatF32U,
        (_, IrType::I64, true) => ConvertOp::I64TruncSatF64S,
        (_, IrType::I64, false) => ConvertOp::I64TruncSatF64U,
        (_, _, true) => ConvertOp::I32TruncSatF64S,
        (_, _, false) => ConvertOp::I32TruncSatF64U,
    }
}

/// Re-establishes the slot invariant of a sub-32-bit integer held in an `i32`.
pub fn normalize(value: IrExpr, ty: SourceType) -> IrExpr {
    match ty {
        SourceType::I8 => IrExpr::convert(ConvertOp::I32Extend8S, value),
        SourceType::I16 => IrExpr::convert(ConvertOp::I32Extend16S, value),
        SourceType::U8 => IrExpr::binary(BinOp::And, IrType::I32, value, IrExpr::i32_const(0xff)),
        SourceType::U16 => {
            IrExpr::binary(BinOp::And, IrType::I32, value, IrExpr::i32_const(0xffff))
        }
        SourceType::Bool => IrExpr::binary(BinOp::Ne, IrType::I32, value, IrExpr::i32_const(0)),
        _ => value,
    }
}
