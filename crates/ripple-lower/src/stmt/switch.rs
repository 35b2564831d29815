//! `switch` lowering.
//!
//! Clauses become a nest of labeled blocks, innermost first:
//!
//! ```text
//! block $break
//!   block $caseN-1
//!     ...
//!       block $case0
//!         local.set $condition (E)
//!         br_table $case.. default=$default|$break (select chain)
//!       clause 0 statements
//!     ...
//!   clause N-1 statements
//! ```
//!
//! Branching to a clause's label lands right after its block, where that
//! clause's statements start; falling off the end of a clause runs into the
//! next one. The branch index comes from a right-to-left `select` chain so the
//! first matching guard in source order wins.

use ripple_ast::{Expr, Node, SourceType, SwitchCase};
use ripple_ir::{BinOp, Expr as IrExpr, Label};
use tracing::trace;

use crate::{DeclareLocal, DiagnosticKind, FunctionLowerer, LabelScope, LowerError, ScopeKind};

/// A lowered clause. `guard` is absent for the default clause.
struct CaseClause {
    label: Label,
    guard: Option<IrExpr>,
    body: Vec<IrExpr>,
}

impl FunctionLowerer<'_> {
    pub(crate) fn lower_switch(
        &mut self,
        discriminant: &Node<Expr>,
        cases: &[SwitchCase],
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        if cases.is_empty() {
            // Nothing to dispatch to; keep the discriminant's side effects.
            let (value, ty) = self.compile_expression(discriminant, SourceType::Void);
            return Ok(if ty.is_void() {
                value
            } else {
                IrExpr::drop(value)
            });
        }

        self.with_scope(ScopeKind::Switch, |this, scope| {
            this.lower_switch_clauses(scope, discriminant, cases, declare_local)
        })
    }

    fn lower_switch_clauses(
        &mut self,
        scope: LabelScope,
        discriminant: &Node<Expr>,
        cases: &[SwitchCase],
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<IrExpr, LowerError> {
        let (value, ty) = self.compile_expression(discriminant, SourceType::Void);
        let repr = self.bridge.discriminant_type(ty);
        let value = self.convert_explicit(value, ty, repr, discriminant.span);
        let slot = self.ir_type(repr);
        let condition = declare_local(&format!("condition${}", scope.id), slot);
        trace!(scope = scope.id, clauses = cases.len(), %repr, "lowering switch");

        // The clauses share one lexical scope that ends with the switch.
        let (clauses, default) = self.with_var_scope(|this| {
            this.lower_clauses(scope, repr, cases, declare_local)
        })?;

        let guarded: Vec<(Label, &IrExpr)> = clauses
            .iter()
            .filter_map(|clause| clause.guard.as_ref().map(|guard| (clause.label, guard)))
            .collect();
        let table = guarded.iter().map(|(label, _)| *label).collect();
        let index = guarded
            .iter()
            .enumerate()
            .rev()
            .try_fold(IrExpr::i32_const(-1), |rest, (position, (_, guard))| {
                let position = table_position(position)?;
                let matches = IrExpr::binary(
                    BinOp::Eq,
                    slot,
                    IrExpr::local_get(condition, slot),
                    (*guard).clone(),
                );
                Ok::<_, LowerError>(IrExpr::select(matches, IrExpr::i32_const(position), rest))
            })?;
        let dispatch = IrExpr::br_table(table, default.unwrap_or(scope.break_label()), index);

        let mut clauses = clauses.into_iter();
        let mut previous = match clauses.next() {
            Some(first) => {
                let entry = IrExpr::block(
                    Some(first.label),
                    vec![IrExpr::local_set(condition, value), dispatch],
                );
                (entry, first.body)
            }
            None => return Ok(IrExpr::nop()),
        };
        for clause in clauses {
            let (inner, body) = previous;
            let mut children = vec![inner];
            children.extend(body);
            previous = (IrExpr::block(Some(clause.label), children), clause.body);
        }

        let (inner, body) = previous;
        let mut children = vec![inner];
        children.extend(body);
        Ok(IrExpr::block(Some(scope.break_label()), children))
    }

    /// Lowers every clause's guard and body. Returns the clauses in source
    /// order and the label of the default clause, if any.
    fn lower_clauses(
        &mut self,
        scope: LabelScope,
        repr: SourceType,
        cases: &[SwitchCase],
        declare_local: &mut DeclareLocal<'_>,
    ) -> Result<(Vec<CaseClause>, Option<Label>), LowerError> {
        let mut default = None;
        let mut clauses = Vec::with_capacity(cases.len());
        for (ordinal, case) in cases.iter().enumerate() {
            let (label, guard) = match &case.test {
                Some(test) => {
                    let (guard, ty) = self.compile_expression(test, repr);
                    let guard = self.convert_explicit(guard, ty, repr, test.span);
                    (scope.case_label(ordinal), Some(guard))
                }
                None if default.is_none() => {
                    default = Some(scope.default_label());
                    (scope.default_label(), None)
                }
                None => {
                    // Extra defaults keep their place in the fallthrough chain
                    // but are never dispatched to.
                    self.report(DiagnosticKind::DuplicateDefault, case.span);
                    (scope.case_label(ordinal), None)
                }
            };
            let body = case
                .consequent
                .iter()
                .map(|stmt| self.lower_statement(stmt, declare_local))
                .collect::<Result<Vec<_>, _>>()?;
            clauses.push(CaseClause { label, guard, body });
        }
        Ok((clauses, default))
    }
}

/// Branch table slot for the guarded clause at `position`.
fn table_position(position: usize) -> Result<i32, LowerError> {
    i32::try_from(position).map_err(|_| LowerError::TooManyCases(position))
}
