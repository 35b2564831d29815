//! Source-level value types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric representation of a source value, as resolved by the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// No value
    Void,
    /// Boolean (stored as 0 or 1)
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// Pointer-sized unsigned integer; width comes from the lowering config
    Usize,
    F32,
    F64,
}

impl SourceType {
    pub fn is_void(&self) -> bool {
        matches!(self, SourceType::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SourceType::I8
                | SourceType::U8
                | SourceType::I16
                | SourceType::U16
                | SourceType::I32
                | SourceType::U32
                | SourceType::I64
                | SourceType::U64
                | SourceType::Usize
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SourceType::F32 | SourceType::F64)
    }

    /// Signed integers and floats. `bool` counts as unsigned.
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            SourceType::I8
                | SourceType::I16
                | SourceType::I32
                | SourceType::I64
                | SourceType::F32
                | SourceType::F64
        )
    }

    /// Number of value bits. `pointer_bits` resolves `usize`.
    pub fn bits(&self, pointer_bits: u32) -> u32 {
        match self {
            SourceType::Void => 0,
            SourceType::Bool => 1,
            SourceType::I8 | SourceType::U8 => 8,
            SourceType::I16 | SourceType::U16 => 16,
            SourceType::I32 | SourceType::U32 | SourceType::F32 => 32,
            SourceType::I64 | SourceType::U64 | SourceType::F64 => 64,
            SourceType::Usize => pointer_bits,
        }
    }

    /// Resolves `usize` to the fixed-width unsigned type for the given pointer width.
    pub fn resolve(self, pointer_bits: u32) -> SourceType {
        match self {
            SourceType::Usize if pointer_bits == 64 => SourceType::U64,
            SourceType::Usize => SourceType::U32,
            other => other,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::Void => "void",
            SourceType::Bool => "bool",
            SourceType::I8 => "i8",
            SourceType::U8 => "u8",
            SourceType::I16 => "i16",
            SourceType::U16 => "u16",
            SourceType::I32 => "i32",
            SourceType::U32 => "u32",
            SourceType::I64 => "i64",
            SourceType::U64 => "u64",
            SourceType::Usize => "usize",
            SourceType::F32 => "f32",
            SourceType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}
