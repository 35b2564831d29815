//! Branch target labels.

use std::fmt;

/// Role of a label within the construct that binds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Exit of a loop or switch
    Break,
    /// Target of `continue`
    Continue,
    /// Back edge of loops whose `continue` target is not the loop head
    Loop,
    /// Entry of the switch clause with the given ordinal
    Case(usize),
    /// Entry of the switch's default clause
    Default,
}

/// A label bound by a `block` or `loop`. `scope` is the id of the label scope
/// that allocated it, unique within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    pub kind: LabelKind,
    pub scope: u32,
}

impl Label {
    pub fn new(kind: LabelKind, scope: u32) -> Self {
        Self { kind, scope }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LabelKind::Break => write!(f, "break${}", self.scope),
            LabelKind::Continue => write!(f, "continue${}", self.scope),
            LabelKind::Loop => write!(f, "loop${}", self.scope),
            LabelKind::Case(ordinal) => write!(f, "case{}${}", ordinal, self.scope),
            LabelKind::Default => write!(f, "default${}", self.scope),
        }
    }
}
