//! `while`, `do`/`while` and `for` loops.
//!
//! Each loop opens one label scope. `break` exits the outer `block $break`;
//! `continue` targets `$continue`, which is the loop head for `while` and a
//! block around the body for the other two, so the condition or update still
//! runs before the back edge `$loop`.

use ripple_ast::{Expr, Node, Stmt};
use ripple_ir::Expr as IrExpr;

use crate::{DeclareLocal, FunctionLowerer, LowerError, ScopeKind};

impl FunctionLowerer<'_> {
    fn lower_body(
        &mut self,
        body: Option<&Node<Stmt>>,
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        match body {
            Some(body) => self.lower_statement(body, declare_local),
            None => Ok(IrExpr::nop()),
        }
    }

    /// ```text
    /// block $break
    ///   loop $continue
    ///     if C
    ///       S
    ///       br $continue
    /// ```
    pub(crate) fn lower_while(
        &mut self,
        condition: &Node<Expr>,
        body: Option<&Node<Stmt>>,
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        self.with_scope(ScopeKind::Loop, |this, scope| {
            let body = this.lower_body(body, declare_local)?;
            let cond = this.compile_condition(condition);

            let repeat = IrExpr::br(scope.continue_label());
            let then_branch = match body {
                IrExpr::Nop => repeat,
                body => IrExpr::block(None, vec![body, repeat]),
            };
            let looped =
                IrExpr::loop_(scope.continue_label(), IrExpr::if_(cond, then_branch, None));
            Ok(IrExpr::block(Some(scope.break_label()), vec![looped]))
        })
    }

    /// ```text
    /// block $break
    ///   loop $loop
    ///     block $continue
    ///       S
    ///     br_if $loop C
    /// ```
    pub(crate) fn lower_do_while(
        &mut self,
        body: &Node<Stmt>,
        condition: &Node<Expr>,
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        self.with_scope(ScopeKind::Loop, |this, scope| {
            let body = this.lower_statement(body, declare_local)?;
            let cond = this.compile_condition(condition);

            let iteration = IrExpr::block(
                None,
                vec![
                    IrExpr::block(Some(scope.continue_label()), vec![body]),
                    IrExpr::br_if(scope.loop_label(), cond),
                ],
            );
            let looped = IrExpr::loop_(scope.loop_label(), iteration);
            Ok(IrExpr::block(Some(scope.break_label()), vec![looped]))
        })
    }

    /// ```text
    /// block $break
    ///   init
    ///   loop $loop
    ///     if C
    ///       block $continue
    ///         S
    ///       U
    ///       br $loop
    /// ```
    /// A missing condition leaves out the `if`.
    pub(crate) fn lower_for(
        &mut self,
        init: Option<&Node<Stmt>>,
        condition: Option<&Node<Expr>>,
        update: Option<&Node<Expr>>,
        body: Option<&Node<Stmt>>,
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        // Variables declared by the initializer live for the whole loop.
        self.with_var_scope(|this| {
            let init = match init {
                Some(init) => Some(this.lower_statement(init, declare_local)?),
                None => None,
            };
            this.with_scope(ScopeKind::Loop, |this, scope| {
                let body = this.lower_body(body, declare_local)?;
                let cond = condition.map(|condition| this.compile_condition(condition));
                let update = update.map(|update| this.compile_discarded(update));

                let mut iteration = vec![IrExpr::block(Some(scope.continue_label()), vec![body])];
                iteration.extend(update);
                iteration.push(IrExpr::br(scope.loop_label()));
                let iteration = IrExpr::block(None, iteration);

                let loop_body = match cond {
                    Some(cond) => IrExpr::if_(cond, iteration, None),
                    None => iteration,
                };
                let mut children: Vec<IrExpr> = init.into_iter().collect();
                children.push(IrExpr::loop_(scope.loop_label(), loop_body));
                Ok(IrExpr::block(Some(scope.break_label()), children))
            })
        })
    }
}
