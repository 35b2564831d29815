//! AST → IR lowering for Ripple.
//!
//! Translates typed `ripple_ast` programs into structured `ripple_ir` modules.
//! Each function body is lowered by a [`FunctionLowerer`] which owns the label
//! scopes `break`/`continue` resolve against; statements come out as single
//! composite IR nodes that nest anywhere.

pub mod config;
pub mod convert;
pub mod error;
pub mod expr;
pub mod function;
pub mod program;
pub mod scope;
pub mod stmt;

pub use config::{LowerConfig, PointerWidth};
pub use convert::{ConversionBridge, ConversionError};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, LowerError};
pub use function::{DeclareLocal, FunctionLowerer};
pub use program::{lower_program, FunctionTable, LowerOutput, Lowerer, Signature};
pub use scope::{LabelScope, LabelStack, ScopeKind};
