//! Label scopes for `break` and `continue` resolution.

use ripple_ir::{Label, LabelKind};

use crate::LowerError;

/// Construct that opened a label scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Loop,
    Switch,
}

/// One open loop or switch. `id` is unique within the enclosing function and
/// suffixes every label the scope hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelScope {
    pub id: u32,
    pub kind: ScopeKind,
}

impl LabelScope {
    pub fn break_label(&self) -> Label {
        Label::new(LabelKind::Break, self.id)
    }

    pub fn continue_label(&self) -> Label {
        Label::new(LabelKind::Continue, self.id)
    }

    /// Back edge of loops whose `continue` does not restart the loop directly.
    pub fn loop_label(&self) -> Label {
        Label::new(LabelKind::Loop, self.id)
    }

    pub fn case_label(&self, ordinal: usize) -> Label {
        Label::new(LabelKind::Case(ordinal), self.id)
    }

    pub fn default_label(&self) -> Label {
        Label::new(LabelKind::Default, self.id)
    }
}

/// Stack of open label scopes, innermost last.
#[derive(Debug, Default)]
pub struct LabelStack {
    scopes: Vec<LabelScope>,
    next_id: u32,
}

impl LabelStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope with a fresh id.
    pub fn enter(&mut self, kind: ScopeKind) -> Result<LabelScope, LowerError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(LowerError::LabelOverflow)?;
        if self.scopes.iter().any(|scope| scope.id == id) {
            return Err(LowerError::LabelCollision(id));
        }
        let scope = LabelScope { id, kind };
        self.scopes.push(scope);
        Ok(scope)
    }

    /// Closes `scope`, which must be the innermost one.
    pub fn leave(&mut self, scope: LabelScope) -> Result<(), LowerError> {
        let innermost = self.scopes.pop().ok_or(LowerError::ScopeUnderflow)?;
        if innermost.id != scope.id {
            return Err(LowerError::ScopeMismatch {
                expected: innermost.id,
                found: scope.id,
            });
        }
        Ok(())
    }

    /// Exit label of the innermost loop or switch.
    pub fn break_target(&self) -> Result<Label, LowerError> {
        self.scopes
            .last()
            .map(LabelScope::break_label)
            .ok_or(LowerError::BreakOutsideScope)
    }

    /// `continue` label of the innermost loop, skipping switches.
    pub fn continue_target(&self) -> Result<Label, LowerError> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.kind == ScopeKind::Loop)
            .map(LabelScope::continue_label)
            .ok_or(LowerError::ContinueOutsideLoop)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
