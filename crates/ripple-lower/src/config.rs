//! Lowering configuration.

use ripple_ast::SourceType;
use ripple_ir::IrType;

/// Target pointer width; decides what `usize` lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerWidth {
    #[default]
    W32,
    W64,
}

impl PointerWidth {
    pub fn bits(&self) -> u32 {
        match self {
            PointerWidth::W32 => 32,
            PointerWidth::W64 => 64,
        }
    }
}

impl TryFrom<u32> for PointerWidth {
    type Error = u32;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(PointerWidth::W32),
            64 => Ok(PointerWidth::W64),
            other => Err(other),
        }
    }
}

/// Options for a lowering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerConfig {
    pub pointer_width: PointerWidth,
    /// Poisoned statements become `unreachable` when set, `nop` otherwise.
    pub trap_on_error: bool,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            pointer_width: PointerWidth::W32,
            trap_on_error: true,
        }
    }
}

impl LowerConfig {
    pub fn with_pointer_width(mut self, pointer_width: PointerWidth) -> Self {
        self.pointer_width = pointer_width;
        self
    }

    pub fn with_trap_on_error(mut self, trap_on_error: bool) -> Self {
        self.trap_on_error = trap_on_error;
        self
    }

    /// Replaces `usize` with its fixed-width counterpart.
    pub fn resolve(&self, ty: SourceType) -> SourceType {
        ty.resolve(self.pointer_width.bits())
    }

    /// IR slot type holding values of `ty`.
    pub fn ir_type(&self, ty: SourceType) -> IrType {
        match self.resolve(ty) {
            SourceType::Void => IrType::None,
            SourceType::Bool
            | SourceType::I8
            | SourceType::U8
            | SourceType::I16
            | SourceType::U16
            | SourceType::I32
            | SourceType::U32 => IrType::I32,
            SourceType::I64 | SourceType::U64 | SourceType::Usize => IrType::I64,
            SourceType::F32 => IrType::F32,
            SourceType::F64 => IrType::F64,
        }
    }
}
