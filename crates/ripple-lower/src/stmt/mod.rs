//! Statement lowering.
//!
//! One routine per statement kind. Every routine returns exactly one IR node,
//! so the caller can nest the result anywhere.

mod loops;
mod ret;
mod switch;

use ripple_ast::{BlockStmt, Node, SourceType, Stmt, VarDecl, VarDeclKind};
use ripple_ir::Expr as IrExpr;
use tracing::trace;

use crate::{DeclareLocal, DiagnosticKind, FunctionLowerer, LowerError};

impl FunctionLowerer<'_> {
    /// Lowers one statement. Locals the statement needs, source variables and
    /// hidden temporaries alike, are allocated through `declare_local`.
    pub fn lower_statement(
        &mut self,
        stmt: &Node<Stmt>,
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        trace!(kind = %stmt.value.kind(), start = stmt.span.start, "lowering statement");
        match &stmt.value {
            Stmt::Expr(expr) => Ok(self.compile_discarded(expr)),
            Stmt::VarDecl(decl) => Ok(self.lower_var_decl(decl, declare_local)),
            Stmt::Return(value) => Ok(self.lower_return(value.as_ref(), stmt.span)),
            Stmt::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                let cond = self.compile_condition(condition);
                let then_branch = self.lower_statement(then_stmt, declare_local)?;
                let else_branch = match else_stmt {
                    Some(else_stmt) => Some(self.lower_statement(else_stmt, declare_local)?),
                    None => None,
                };
                Ok(IrExpr::if_(cond, then_branch, else_branch))
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.lower_for(
                init.as_deref(),
                condition.as_ref(),
                update.as_ref(),
                body.as_deref(),
                declare_local,
            ),
            Stmt::While { condition, body } => {
                self.lower_while(condition, body.as_deref(), declare_local)
            }
            Stmt::DoWhile { body, condition } => {
                self.lower_do_while(body, condition, declare_local)
            }
            Stmt::Block(block) => self.lower_block(block, declare_local),
            Stmt::Break => Ok(IrExpr::br(self.labels().break_target()?)),
            Stmt::Continue => Ok(IrExpr::br(self.labels().continue_target()?)),
            Stmt::Switch {
                discriminant,
                cases,
            } => self.lower_switch(discriminant, cases, declare_local),
            Stmt::Empty => Ok(IrExpr::nop()),
        }
    }

    fn lower_block(
        &mut self,
        block: &BlockStmt,
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        self.with_var_scope(|this| {
            let children = block
                .stmts
                .iter()
                .map(|stmt| this.lower_statement(stmt, declare_local))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(IrExpr::block(None, children))
        })
    }

    fn lower_var_decl(&mut self, decl: &VarDecl, declare_local: &mut DeclareLocal<'_>) -> IrExpr {
        let is_const = decl.kind == VarDeclKind::Const;
        let mut sets = Vec::with_capacity(decl.declarations.len());

        for declarator in &decl.declarations {
            let name = &declarator.name.value.name;
            let span = declarator.name.span;
            let annotation = declarator.type_annotation.filter(|ty| {
                if ty.is_void() {
                    self.diagnostics.report(DiagnosticKind::VoidValue, span);
                }
                !ty.is_void()
            });

            // The initializer is compiled before the name is bound, so it sees
            // any outer variable of the same name.
            let (init, ty) = match (&declarator.init, annotation) {
                (Some(init), Some(ty)) => {
                    let (value, from) = self.compile_expression(init, ty);
                    (Some(self.convert_implicit(value, from, ty, init.span)), ty)
                }
                (Some(init), None) => {
                    let (value, ty) = self.compile_expression(init, SourceType::Void);
                    if ty.is_void() {
                        let value =
                            self.convert_explicit(value, ty, SourceType::I32, init.span);
                        (Some(value), SourceType::I32)
                    } else {
                        (Some(value), ty)
                    }
                }
                (None, Some(ty)) => (None, ty),
                (None, None) => {
                    self.report(DiagnosticKind::MissingType(name.clone()), span);
                    (None, SourceType::I32)
                }
            };

            let ir_type = self.ir_type(ty);
            let local = declare_local(name, ir_type);
            self.bind_variable(name, ty, local, is_const, span);

            // Without an initializer the local restarts at zero each time the
            // declaration runs.
            let value = match init {
                Some(value) => value,
                None => match ir_type.zero() {
                    Some(zero) => IrExpr::constant(zero),
                    None => continue,
                },
            };
            sets.push(IrExpr::local_set(local, value));
        }

        match sets.len() {
            0 => IrExpr::nop(),
            1 => sets.remove(0),
            _ => IrExpr::block(None, sets),
        }
    }
}
