//! Expression compiler.
//!
//! Covers what statement lowering needs from expressions: literals, locals,
//! operators, assignments, calls and casts. Inference is local: literals take
//! the type the context expects when they fit it, binary operands meet at the
//! narrower type that holds both sides.

use ripple_ast::{AssignmentOp, BinaryOp, Expr, Ident, Literal, Node, SourceType, Span, UnaryOp};
use ripple_ir::{BinOp, Constant, Expr as IrExpr, UnOp};

use crate::convert::normalize;
use crate::{DiagnosticKind, FunctionLowerer};

impl FunctionLowerer<'_> {
    /// Compiles `expr`, steering literals towards `expected` (`void` means no
    /// preference). Returns the IR value and its source type.
    pub fn compile_expression(
        &mut self,
        expr: &Node<Expr>,
        expected: SourceType,
    ) -> (IrExpr, SourceType) {
        match &expr.value {
            Expr::Literal(literal) => self.compile_literal(literal, expected),
            Expr::Paren(inner) => self.compile_expression(inner, expected),
            Expr::Ident(ident) => match self.lookup_var(&ident.name) {
                Some(var) => (IrExpr::local_get(var.local, self.ir_type(var.ty)), var.ty),
                None => {
                    self.report(DiagnosticKind::UnknownIdentifier(ident.name.clone()), expr.span);
                    (self.poison_value(), self.fallback(expected))
                }
            },
            Expr::Unary { op, expr: operand } => {
                self.compile_unary(*op, operand, expected, expr.span)
            }
            Expr::Binary { left, op, right } => {
                self.compile_binary(*op, left, right, expected, expr.span)
            }
            Expr::Assignment { target, op, value } => {
                self.compile_assignment(target, *op, value, false, expr.span)
            }
            Expr::Call { callee, args } => self.compile_call(callee, args, expected, expr.span),
            Expr::TypeCast { expr: inner, ty } => {
                let (value, from) = self.compile_expression(inner, *ty);
                (self.convert_explicit(value, from, *ty, inner.span), *ty)
            }
        }
    }

    /// Compiles an expression whose value is discarded. Assignments become a
    /// plain `local.set`, other values are dropped.
    pub fn compile_discarded(&mut self, expr: &Node<Expr>) -> IrExpr {
        match &expr.value {
            Expr::Paren(inner) => self.compile_discarded(inner),
            Expr::Assignment { target, op, value } => {
                self.compile_assignment(target, *op, value, true, expr.span).0
            }
            _ => {
                let (value, ty) = self.compile_expression(expr, SourceType::Void);
                if ty.is_void() {
                    value
                } else {
                    IrExpr::drop(value)
                }
            }
        }
    }

    /// Compiles a truth value: any numeric type tests against zero.
    pub fn compile_condition(&mut self, expr: &Node<Expr>) -> IrExpr {
        let (value, ty) = self.compile_expression(expr, SourceType::Bool);
        self.convert_explicit(value, ty, SourceType::Bool, expr.span)
    }

    fn fallback(&self, expected: SourceType) -> SourceType {
        if expected.is_void() {
            SourceType::I32
        } else {
            self.config.resolve(expected)
        }
    }

    fn compile_literal(&self, literal: &Literal, expected: SourceType) -> (IrExpr, SourceType) {
        let expected = self.config.resolve(expected);
        match literal {
            Literal::Boolean(value) => (IrExpr::i32_const(*value as i32), SourceType::Bool),
            Literal::Float(value) if expected == SourceType::F32 => {
                (IrExpr::f32_const(*value as f32), SourceType::F32)
            }
            Literal::Float(value) => (IrExpr::f64_const(*value), SourceType::F64),
            Literal::Int(value) => {
                // An out-of-range literal keeps its natural type so the
                // conversion to `expected` is checked like any other value.
                let ty = if fits(*value, expected) {
                    expected
                } else if i32::try_from(*value).is_ok() {
                    SourceType::I32
                } else {
                    SourceType::I64
                };
                (IrExpr::constant(int_constant(*value, ty)), ty)
            }
        }
    }

    fn compile_unary(
        &mut self,
        op: UnaryOp,
        operand: &Node<Expr>,
        expected: SourceType,
        span: Span,
    ) -> (IrExpr, SourceType) {
        match op {
            UnaryOp::Plus => self.compile_expression(operand, expected),
            UnaryOp::Not => {
                let test = self.compile_condition(operand);
                (
                    IrExpr::unary(UnOp::Eqz, self.ir_type(SourceType::Bool), test),
                    SourceType::Bool,
                )
            }
            UnaryOp::Minus => {
                match &operand.value {
                    Expr::Literal(Literal::Int(value)) => {
                        return self.compile_literal(&Literal::Int(value.wrapping_neg()), expected)
                    }
                    Expr::Literal(Literal::Float(value)) => {
                        return self.compile_literal(&Literal::Float(-value), expected)
                    }
                    _ => {}
                }
                let (value, ty) = self.compile_expression(operand, expected);
                let ty = self.config.resolve(ty);
                let ir = self.ir_type(ty);
                if ty.is_float() {
                    (IrExpr::unary(UnOp::Neg, ir, value), ty)
                } else if ty.is_integer() {
                    let zero = ir.zero().map(IrExpr::constant).unwrap_or_else(IrExpr::nop);
                    (normalize(IrExpr::binary(BinOp::Sub, ir, zero, value), ty), ty)
                } else {
                    self.invalid_operand(&op.to_string(), ty, expected, span)
                }
            }
            UnaryOp::BitNot => {
                let (value, ty) = self.compile_expression(operand, expected);
                let ty = self.config.resolve(ty);
                let ir = self.ir_type(ty);
                let ones = match ty {
                    SourceType::I64 | SourceType::U64 => IrExpr::i64_const(-1),
                    t if t.is_integer() => IrExpr::i32_const(-1),
                    _ => return self.invalid_operand(&op.to_string(), ty, expected, span),
                };
                (normalize(IrExpr::binary(BinOp::Xor, ir, value, ones), ty), ty)
            }
        }
    }

    fn invalid_operand(
        &mut self,
        op: &str,
        ty: SourceType,
        expected: SourceType,
        span: Span,
    ) -> (IrExpr, SourceType) {
        self.report(
            DiagnosticKind::InvalidOperand {
                op: op.to_string(),
                ty,
            },
            span,
        );
        (self.poison_value(), self.fallback(expected))
    }

    /// Common type two operands are brought to.
    fn unify(&self, a: SourceType, b: SourceType) -> SourceType {
        let (a, b) = (self.config.resolve(a), self.config.resolve(b));
        if a == b || b.is_void() {
            return a;
        }
        if a.is_void() {
            return b;
        }
        if a.is_float() || b.is_float() {
            if a == SourceType::F64 || b == SourceType::F64 {
                return SourceType::F64;
            }
            let other = if a == SourceType::F32 { b } else { a };
            return if self.bridge.is_lossless(other, SourceType::F32) {
                SourceType::F32
            } else {
                SourceType::F64
            };
        }
        if self.bridge.is_lossless(a, b) {
            b
        } else if self.bridge.is_lossless(b, a) {
            a
        } else if a.bits(0).max(b.bits(0)) < 64 {
            SourceType::I64
        } else if a.bits(0) >= b.bits(0) {
            a
        } else {
            b
        }
    }

    fn compile_binary(
        &mut self,
        op: BinaryOp,
        left: &Node<Expr>,
        right: &Node<Expr>,
        expected: SourceType,
        span: Span,
    ) -> (IrExpr, SourceType) {
        if op.is_logical() {
            let lhs = self.compile_condition(left);
            let rhs = self.compile_condition(right);
            let bool_ty = self.ir_type(SourceType::Bool);
            let node = match op {
                BinaryOp::And => IrExpr::if_value(lhs, rhs, IrExpr::i32_const(0), bool_ty),
                _ => IrExpr::if_value(lhs, IrExpr::i32_const(1), rhs, bool_ty),
            };
            return (node, SourceType::Bool);
        }

        let hint = if op.is_comparison() {
            SourceType::Void
        } else {
            expected
        };
        let (mut lhs, mut lty) = self.compile_expression(left, hint);
        let right_hint = if is_literal(left) { hint } else { lty };
        let (mut rhs, mut rty) = self.compile_expression(right, right_hint);

        let common = self.unify(lty, rty);
        if common.is_void() {
            self.report(DiagnosticKind::VoidValue, span);
            return (self.poison_value(), self.fallback(expected));
        }
        // Literals have no side effects; recompiling retypes them exactly.
        if lty != common && is_literal(left) {
            (lhs, lty) = self.compile_expression(left, common);
        }
        if rty != common && is_literal(right) {
            (rhs, rty) = self.compile_expression(right, common);
        }

        let operand = if common == SourceType::Bool && !op.is_comparison() {
            SourceType::I32
        } else {
            common
        };
        let Some(bin) = binary_op(op, operand) else {
            return self.invalid_operand(&op.to_string(), operand, expected, span);
        };
        let lhs = self.convert_implicit(lhs, lty, operand, left.span);
        let rhs = self.convert_implicit(rhs, rty, operand, right.span);
        let node = IrExpr::binary(bin, self.ir_type(operand), lhs, rhs);

        if op.is_comparison() {
            (node, SourceType::Bool)
        } else {
            (normalize(node, operand), operand)
        }
    }

    fn compile_assignment(
        &mut self,
        target: &Node<Ident>,
        op: AssignmentOp,
        value: &Node<Expr>,
        discard: bool,
        span: Span,
    ) -> (IrExpr, SourceType) {
        let name = &target.value.name;
        let Some(var) = self.lookup_var(name) else {
            self.report(DiagnosticKind::UnknownIdentifier(name.clone()), target.span);
            return (self.poison_value(), SourceType::Void);
        };
        if var.is_const {
            self.report(DiagnosticKind::AssignToConst(name.clone()), target.span);
        }

        let (new_value, from) = match op.binary_op() {
            None => self.compile_expression(value, var.ty),
            Some(bin) => {
                let current = Node::new(Expr::Ident(target.value.clone()), target.span);
                self.compile_binary(bin, &current, value, var.ty, span)
            }
        };
        let new_value = self.convert_implicit(new_value, from, var.ty, value.span);

        if discard {
            (IrExpr::local_set(var.local, new_value), SourceType::Void)
        } else {
            (
                IrExpr::local_tee(var.local, self.ir_type(var.ty), new_value),
                var.ty,
            )
        }
    }

    fn compile_call(
        &mut self,
        callee: &Node<Ident>,
        args: &[Node<Expr>],
        expected: SourceType,
        span: Span,
    ) -> (IrExpr, SourceType) {
        let functions = self.functions;
        let name = &callee.value.name;
        let Some(signature) = functions.get(name) else {
            self.report(DiagnosticKind::UnknownFunction(name.clone()), callee.span);
            return (self.poison_value(), self.fallback(expected));
        };
        if signature.params.len() != args.len() {
            self.report(
                DiagnosticKind::ArityMismatch {
                    name: name.clone(),
                    expected: signature.params.len(),
                    found: args.len(),
                },
                span,
            );
            return (self.poison_value(), self.fallback(expected));
        }

        let mut values = Vec::with_capacity(args.len());
        for (arg, &param) in args.iter().zip(&signature.params) {
            let (value, ty) = self.compile_expression(arg, param);
            values.push(self.convert_implicit(value, ty, param, arg.span));
        }
        (
            IrExpr::call(signature.id, values, self.ir_type(signature.result)),
            signature.result,
        )
    }
}

fn is_literal(expr: &Node<Expr>) -> bool {
    match &expr.value {
        Expr::Literal(_) => true,
        Expr::Paren(inner) => is_literal(inner),
        Expr::Unary {
            op: UnaryOp::Minus | UnaryOp::Plus,
            expr,
        } => is_literal(expr),
        _ => false,
    }
}

/// Whether `value` is representable in `ty` without wrapping.
fn fits(value: i64, ty: SourceType) -> bool {
    match ty {
        SourceType::I8 => i8::try_from(value).is_ok(),
        SourceType::U8 => u8::try_from(value).is_ok(),
        SourceType::I16 => i16::try_from(value).is_ok(),
        SourceType::U16 => u16::try_from(value).is_ok(),
        SourceType::I32 => i32::try_from(value).is_ok(),
        SourceType::U32 => u32::try_from(value).is_ok(),
        SourceType::U64 => u64::try_from(value).is_ok(),
        SourceType::I64 => true,
        ty => ty.is_float(),
    }
}

/// Constant of type `ty` holding `value`, which is in range for `ty`.
fn int_constant(value: i64, ty: SourceType) -> Constant {
    match ty {
        SourceType::I8 => Constant::I32(value as i8 as i32),
        SourceType::U8 => Constant::I32(value as u8 as i32),
        SourceType::I16 => Constant::I32(value as i16 as i32),
        SourceType::U16 => Constant::I32(value as u16 as i32),
        SourceType::I64 | SourceType::U64 => Constant::I64(value),
        SourceType::F32 => Constant::F32(value as f32),
        SourceType::F64 => Constant::F64(value as f64),
        _ => Constant::I32(value as i32),
    }
}

fn binary_op(op: BinaryOp, ty: SourceType) -> Option<BinOp> {
    let float = ty.is_float();
    let signed = ty.is_signed();
    let bin = match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div if float => BinOp::Div,
        BinaryOp::Div if signed => BinOp::DivS,
        BinaryOp::Div => BinOp::DivU,
        BinaryOp::Mod if float => return None,
        BinaryOp::Mod if signed => BinOp::RemS,
        BinaryOp::Mod => BinOp::RemU,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::NotEq => BinOp::Ne,
        BinaryOp::Lt if float => BinOp::Lt,
        BinaryOp::Lt if signed => BinOp::LtS,
        BinaryOp::Lt => BinOp::LtU,
        BinaryOp::LtEq if float => BinOp::Le,
        BinaryOp::LtEq if signed => BinOp::LeS,
        BinaryOp::LtEq => BinOp::LeU,
        BinaryOp::Gt if float => BinOp::Gt,
        BinaryOp::Gt if signed => BinOp::GtS,
        BinaryOp::Gt => BinOp::GtU,
        BinaryOp::GtEq if float => BinOp::Ge,
        BinaryOp::GtEq if signed => BinOp::GeS,
        BinaryOp::GtEq => BinOp::GeU,
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift
        | BinaryOp::UnsignedRightShift
            if float =>
        {
            return None
        }
        BinaryOp::BitAnd => BinOp::And,
        BinaryOp::BitOr => BinOp::Or,
        BinaryOp::BitXor => BinOp::Xor,
        BinaryOp::LeftShift => BinOp::Shl,
        BinaryOp::RightShift if signed => BinOp::ShrS,
        BinaryOp::RightShift => BinOp::ShrU,
        BinaryOp::UnsignedRightShift => BinOp::ShrU,
        BinaryOp::And | BinaryOp::Or => return None,
    };
    Some(bin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Diagnostics, FunctionTable, LowerConfig, Signature};
    use pretty_assertions::assert_eq;
    use ripple_ir::{FuncId, IrType, LocalId};

    fn node(expr: Expr) -> Node<Expr> {
        Node::synthetic(expr)
    }

    fn ident(name: &str) -> Node<Expr> {
        node(Expr::Ident(Ident::new(name)))
    }

    fn int(value: i64) -> Node<Expr> {
        node(Expr::Literal(Literal::Int(value)))
    }

    fn binary(left: Node<Expr>, op: BinaryOp, right: Node<Expr>) -> Node<Expr> {
        node(Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn with_lowerer<R>(f: impl FnOnce(&mut FunctionLowerer<'_>) -> R) -> (R, Diagnostics) {
        let config = LowerConfig::default();
        let mut functions = FunctionTable::default();
        functions.insert(
            "next",
            Signature {
                id: FuncId(0),
                params: vec![SourceType::I32],
                result: SourceType::I64,
            },
        );
        let mut diagnostics = Diagnostics::new();
        let result = {
            let mut lowerer = FunctionLowerer::new(
                "test",
                SourceType::Void,
                &config,
                &functions,
                &mut diagnostics,
            );
            lowerer.bind_variable("x", SourceType::I64, LocalId(0), false, Span::default());
            lowerer.bind_variable("b", SourceType::U8, LocalId(1), false, Span::default());
            lowerer.bind_variable("k", SourceType::I32, LocalId(2), true, Span::default());
            f(&mut lowerer)
        };
        (result, diagnostics)
    }

    #[test]
    fn test_literal_adopts_operand_type() {
        let ((value, ty), diagnostics) = with_lowerer(|l| {
            l.compile_expression(&binary(ident("x"), BinaryOp::Lt, int(10)), SourceType::Void)
        });
        assert_eq!(ty, SourceType::Bool);
        assert_eq!(
            value,
            IrExpr::binary(
                BinOp::LtS,
                IrType::I64,
                IrExpr::local_get(LocalId(0), IrType::I64),
                IrExpr::i64_const(10)
            )
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_literal_on_left_is_retyped() {
        let ((value, _), _) = with_lowerer(|l| {
            l.compile_expression(&binary(int(1), BinaryOp::Add, ident("x")), SourceType::Void)
        });
        assert_eq!(
            value,
            IrExpr::binary(
                BinOp::Add,
                IrType::I64,
                IrExpr::i64_const(1),
                IrExpr::local_get(LocalId(0), IrType::I64)
            )
        );
    }

    #[test]
    fn test_small_arithmetic_is_normalized() {
        let ((value, ty), _) = with_lowerer(|l| {
            l.compile_expression(&binary(ident("b"), BinaryOp::Add, int(1)), SourceType::Void)
        });
        assert_eq!(ty, SourceType::U8);
        assert_eq!(
            value,
            IrExpr::binary(
                BinOp::And,
                IrType::I32,
                IrExpr::binary(
                    BinOp::Add,
                    IrType::I32,
                    IrExpr::local_get(LocalId(1), IrType::I32),
                    IrExpr::i32_const(1)
                ),
                IrExpr::i32_const(0xff)
            )
        );
    }

    #[test]
    fn test_implicit_narrowing_is_reported() {
        let assign = node(Expr::Assignment {
            target: Node::synthetic(Ident::new("b")),
            op: AssignmentOp::Assign,
            value: Box::new(ident("x")),
        });
        let (_, diagnostics) = with_lowerer(|l| l.compile_discarded(&assign));
        assert_eq!(
            diagnostics.kinds(),
            vec![&DiagnosticKind::ImplicitConversion {
                from: SourceType::I64,
                to: SourceType::U8
            }]
        );
    }

    #[test]
    fn test_assignment_value_uses_tee() {
        let assign = node(Expr::Assignment {
            target: Node::synthetic(Ident::new("x")),
            op: AssignmentOp::AddAssign,
            value: Box::new(int(2)),
        });
        let ((set, _), _) = with_lowerer(|l| (l.compile_discarded(&assign), ()));
        let ((tee, ty), _) = with_lowerer(|l| l.compile_expression(&assign, SourceType::I64));

        let sum = IrExpr::binary(
            BinOp::Add,
            IrType::I64,
            IrExpr::local_get(LocalId(0), IrType::I64),
            IrExpr::i64_const(2),
        );
        assert_eq!(set, IrExpr::local_set(LocalId(0), sum.clone()));
        assert_eq!(tee, IrExpr::local_tee(LocalId(0), IrType::I64, sum));
        assert_eq!(ty, SourceType::I64);
    }

    #[test]
    fn test_assign_to_const_is_reported() {
        let assign = node(Expr::Assignment {
            target: Node::synthetic(Ident::new("k")),
            op: AssignmentOp::Assign,
            value: Box::new(int(2)),
        });
        let (_, diagnostics) = with_lowerer(|l| l.compile_discarded(&assign));
        assert_eq!(
            diagnostics.kinds(),
            vec![&DiagnosticKind::AssignToConst("k".to_string())]
        );
    }

    #[test]
    fn test_call_converts_arguments() {
        let call = node(Expr::Call {
            callee: Node::synthetic(Ident::new("next")),
            args: vec![ident("b")],
        });
        let ((value, ty), diagnostics) =
            with_lowerer(|l| l.compile_expression(&call, SourceType::Void));
        assert_eq!(ty, SourceType::I64);
        assert_eq!(
            value,
            IrExpr::call(
                FuncId(0),
                vec![IrExpr::local_get(LocalId(1), IrType::I32)],
                IrType::I64
            )
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_names_poison() {
        let call = node(Expr::Call {
            callee: Node::synthetic(Ident::new("missing")),
            args: vec![],
        });
        let ((value, _), diagnostics) = with_lowerer(|l| {
            l.compile_expression(&binary(ident("y"), BinaryOp::Add, call), SourceType::Void)
        });
        assert_eq!(
            diagnostics.kinds(),
            vec![
                &DiagnosticKind::UnknownIdentifier("y".to_string()),
                &DiagnosticKind::UnknownFunction("missing".to_string())
            ]
        );
        assert_eq!(
            value,
            IrExpr::binary(
                BinOp::Add,
                IrType::I32,
                IrExpr::unreachable(),
                IrExpr::unreachable()
            )
        );
    }

    #[test]
    fn test_logical_and_short_circuits() {
        let ((value, ty), _) = with_lowerer(|l| {
            l.compile_expression(&binary(ident("k"), BinaryOp::And, ident("b")), SourceType::Void)
        });
        assert_eq!(ty, SourceType::Bool);
        let test = |local: usize| {
            IrExpr::binary(
                BinOp::Ne,
                IrType::I32,
                IrExpr::local_get(LocalId(local), IrType::I32),
                IrExpr::i32_const(0),
            )
        };
        assert_eq!(
            value,
            IrExpr::if_value(test(2), test(1), IrExpr::i32_const(0), IrType::I32)
        );
    }

    #[test]
    fn test_modulo_on_float_is_invalid() {
        let expr = binary(
            node(Expr::Literal(Literal::Float(1.5))),
            BinaryOp::Mod,
            int(2),
        );
        let (_, diagnostics) = with_lowerer(|l| l.compile_expression(&expr, SourceType::Void));
        assert_eq!(
            diagnostics.kinds(),
            vec![&DiagnosticKind::InvalidOperand {
                op: "%".to_string(),
                ty: SourceType::F64
            }]
        );
    }
}
