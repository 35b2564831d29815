//! Lowering errors and user diagnostics.
//!
//! [`LowerError`] is an internal invariant violation and aborts the pass.
//! [`Diagnostic`]s are problems in the program being lowered; they are collected
//! and lowering carries on with a poisoned node in place of the bad construct.

use std::fmt;

use ripple_ast::{SourceType, Span};
use thiserror::Error;
use tracing::debug;

/// Internal failure of the lowering pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("`break` outside of a loop or switch")]
    BreakOutsideScope,

    #[error("`continue` outside of a loop")]
    ContinueOutsideLoop,

    #[error("label scope stack underflow")]
    ScopeUnderflow,

    #[error("left label scope {found} while scope {expected} was innermost")]
    ScopeMismatch { expected: u32, found: u32 },

    #[error("function `{function}` finished with {depth} open label scopes")]
    UnbalancedScopes { function: String, depth: usize },

    #[error("label scope id {0} is already live")]
    LabelCollision(u32),

    #[error("label scope ids exhausted")]
    LabelOverflow,

    #[error("switch clause {0} does not fit a branch table index")]
    TooManyCases(usize),
}

/// What went wrong in the source program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    #[error("function cannot return a value")]
    ReturnValueInVoidFunction,

    #[error("function must return a value")]
    MissingReturnValue,

    #[error("cannot implicitly convert `{from}` to `{to}`")]
    ImplicitConversion { from: SourceType, to: SourceType },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("'{name}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("expression of type `void` used as a value")]
    VoidValue,

    #[error("function '{0}' is already defined")]
    DuplicateFunction(String),

    #[error("operator `{op}` cannot be applied to `{ty}`")]
    InvalidOperand { op: String, ty: SourceType },

    #[error("cannot assign to constant '{0}'")]
    AssignToConst(String),

    #[error("a switch can only have one default clause")]
    DuplicateDefault,

    #[error("'{0}' is already declared in this scope")]
    DuplicateVariable(String),

    #[error("cannot infer a type for '{0}'")]
    MissingType(String),
}

/// A located user-facing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.kind, self.span.start, self.span.end)
    }
}

/// Sink collecting diagnostics in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: Span) {
        debug!(%kind, start = span.start, end = span.end, "diagnostic");
        self.items.push(Diagnostic { kind, span });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn kinds(&self) -> Vec<&DiagnosticKind> {
        self.items.iter().map(|d| &d.kind).collect()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
