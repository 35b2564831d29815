//! Per-function lowering state.

use std::collections::HashMap;

use ripple_ast::{SourceType, Span};
use ripple_ir::{Expr as IrExpr, IrType, LocalId};

use crate::{
    ConversionBridge, ConversionError, DiagnosticKind, Diagnostics, FunctionTable, LabelScope,
    LabelStack, LowerConfig, LowerError, ScopeKind,
};

/// Callback allocating a function local; statements use it for source
/// variables and hidden temporaries alike.
pub type DeclareLocal<'a> = dyn FnMut(&str, IrType) -> LocalId + 'a;

/// Variable info tracked during lowering.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VarInfo {
    pub(crate) local: LocalId,
    pub(crate) ty: SourceType,
    pub(crate) is_const: bool,
}

/// Scope for tracking variable bindings.
#[derive(Default)]
struct VarScope {
    vars: HashMap<String, VarInfo>,
}

/// Lowers the statements of one function body.
///
/// Owns the function's label scopes, so every loop or switch it lowers gets
/// labels unique within the function, and the function's variable scopes.
pub struct FunctionLowerer<'a> {
    pub(crate) config: &'a LowerConfig,
    pub(crate) functions: &'a FunctionTable,
    pub(crate) bridge: ConversionBridge,
    pub(crate) diagnostics: &'a mut Diagnostics,
    labels: LabelStack,
    /// Scope stack (innermost last)
    scopes: Vec<VarScope>,
    name: String,
    pub(crate) return_type: SourceType,
}

impl<'a> FunctionLowerer<'a> {
    pub fn new(
        name: impl Into<String>,
        return_type: SourceType,
        config: &'a LowerConfig,
        functions: &'a FunctionTable,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            config,
            functions,
            bridge: ConversionBridge::new(config),
            diagnostics,
            labels: LabelStack::new(),
            scopes: vec![VarScope::default()],
            name: name.into(),
            return_type,
        }
    }

    /// Binds a source variable to an already allocated local.
    pub fn bind_variable(
        &mut self,
        name: &str,
        ty: SourceType,
        local: LocalId,
        is_const: bool,
        span: Span,
    ) {
        let info = VarInfo {
            local,
            ty,
            is_const,
        };
        if let Some(scope) = self.scopes.last_mut() {
            if scope.vars.insert(name.to_string(), info).is_some() {
                self.diagnostics
                    .report(DiagnosticKind::DuplicateVariable(name.to_string()), span);
            }
        }
    }

    pub(crate) fn lookup_var(&self, name: &str) -> Option<VarInfo> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.vars.get(name).copied())
    }

    /// Runs `f` inside a fresh variable scope.
    pub(crate) fn with_var_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, LowerError>,
    ) -> Result<T, LowerError> {
        self.scopes.push(VarScope::default());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Runs `f` with a label scope of `kind` open; the scope is closed on every
    /// exit path, including errors from `f`.
    pub(crate) fn with_scope<T>(
        &mut self,
        kind: ScopeKind,
        f: impl FnOnce(&mut Self, LabelScope) -> Result<T, LowerError>,
    ) -> Result<T, LowerError> {
        let scope = self.labels.enter(kind)?;
        let result = f(self, scope);
        let left = self.labels.leave(scope);
        let value = result?;
        left?;
        Ok(value)
    }

    pub(crate) fn labels(&self) -> &LabelStack {
        &self.labels
    }

    /// Node standing in for a construct that failed to lower.
    pub(crate) fn poison(&self) -> IrExpr {
        if self.config.trap_on_error {
            IrExpr::unreachable()
        } else {
            IrExpr::nop()
        }
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind, span: Span) {
        self.diagnostics.report(kind, span);
    }

    pub(crate) fn ir_type(&self, ty: SourceType) -> IrType {
        self.config.ir_type(ty)
    }

    /// Implicit conversion: a lossy pair is reported, then coerced anyway.
    pub(crate) fn convert_implicit(
        &mut self,
        value: IrExpr,
        from: SourceType,
        to: SourceType,
        span: Span,
    ) -> IrExpr {
        match self.bridge.check(from, to) {
            Ok(()) => {}
            Err(ConversionError::FromVoid { .. }) => self.report(DiagnosticKind::VoidValue, span),
            Err(ConversionError::Lossy { from, to }) => {
                self.report(DiagnosticKind::ImplicitConversion { from, to }, span)
            }
        }
        self.bridge.coerce(value, from, to)
    }

    /// Explicit conversion; only a missing value is an error.
    pub(crate) fn convert_explicit(
        &mut self,
        value: IrExpr,
        from: SourceType,
        to: SourceType,
        span: Span,
    ) -> IrExpr {
        if from.is_void() && !to.is_void() {
            self.report(DiagnosticKind::VoidValue, span);
        }
        self.bridge.coerce(value, from, to)
    }

    /// Poison usable in value position.
    pub(crate) fn poison_value(&self) -> IrExpr {
        IrExpr::unreachable()
    }

    /// Checks that every label scope opened while lowering was closed again.
    pub fn finish(self) -> Result<(), LowerError> {
        match self.labels.depth() {
            0 => Ok(()),
            depth => Err(LowerError::UnbalancedScopes {
                function: self.name,
                depth,
            }),
        }
    }
}
