use ripple_ast::{Expr, Node, Span};
use ripple_ir::Expr as IrExpr;

use crate::{DiagnosticKind, FunctionLowerer};

impl FunctionLowerer<'_> {
    /// `return` checked against the function's declared return type. A
    /// mismatch is reported and the statement poisoned.
    pub(crate) fn lower_return(&mut self, value: Option<&Node<Expr>>, span: Span) -> IrExpr {
        let return_type = self.return_type;
        match value {
            Some(value) if return_type.is_void() => {
                self.report(DiagnosticKind::ReturnValueInVoidFunction, value.span);
                self.poison()
            }
            None if !return_type.is_void() => {
                self.report(DiagnosticKind::MissingReturnValue, span);
                self.poison()
            }
            None => IrExpr::return_(None),
            Some(value) => {
                let (compiled, ty) = self.compile_expression(value, return_type);
                let compiled = self.convert_implicit(compiled, ty, return_type, value.span);
                IrExpr::return_(Some(compiled))
            }
        }
    }
}
