//! Structural checks over lowered functions.
//!
//! Lowering must only ever produce trees that pass these checks; a failure here
//! is a bug in the producer, never a user error.

use thiserror::Error;

use crate::{Callee, Expr, FuncId, IrFunction, IrModule, Label, LocalId};

/// A structural defect in an IR tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("branch to `{label}` is not enclosed by a block or loop binding it")]
    UnboundLabel { label: Label },

    #[error("label `{label}` is bound again while still in scope")]
    LabelCollision { label: Label },

    #[error("local {local} is not declared")]
    UnknownLocal { local: LocalId },

    #[error("call to unknown function {func}")]
    UnknownFunction { func: FuncId },

    #[error("call to function {func} passes {found} arguments, expected {expected}")]
    ArityMismatch {
        func: FuncId,
        expected: usize,
        found: usize,
    },
}

struct Validator<'a> {
    module: Option<&'a IrModule>,
    func: &'a IrFunction,
    labels: Vec<Label>,
}

impl<'a> Validator<'a> {
    fn bind(&mut self, label: Label) -> Result<(), ValidationError> {
        if self.labels.contains(&label) {
            return Err(ValidationError::LabelCollision { label });
        }
        self.labels.push(label);
        Ok(())
    }

    fn target(&self, label: &Label) -> Result<(), ValidationError> {
        if self.labels.contains(label) {
            Ok(())
        } else {
            Err(ValidationError::UnboundLabel { label: *label })
        }
    }

    fn local(&self, local: LocalId) -> Result<(), ValidationError> {
        if local.0 < self.func.locals.len() {
            Ok(())
        } else {
            Err(ValidationError::UnknownLocal { local })
        }
    }

    fn visit(&mut self, expr: &Expr) -> Result<(), ValidationError> {
        match expr {
            Expr::Nop | Expr::Unreachable | Expr::Const(_) | Expr::Return(None) => Ok(()),
            Expr::Block { label, children } => {
                if let Some(label) = label {
                    self.bind(*label)?;
                }
                for child in children {
                    self.visit(child)?;
                }
                if label.is_some() {
                    self.labels.pop();
                }
                Ok(())
            }
            Expr::Loop { label, body } => {
                self.bind(*label)?;
                self.visit(body)?;
                self.labels.pop();
                Ok(())
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.visit(cond)?;
                self.visit(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.visit(else_branch)?;
                }
                Ok(())
            }
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => {
                self.visit(if_true)?;
                self.visit(if_false)?;
                self.visit(cond)
            }
            Expr::Br { label, cond } => {
                self.target(label)?;
                match cond {
                    Some(cond) => self.visit(cond),
                    None => Ok(()),
                }
            }
            Expr::BrTable {
                labels,
                default,
                index,
            } => {
                for label in labels.iter().chain(std::iter::once(default)) {
                    self.target(label)?;
                }
                self.visit(index)
            }
            Expr::Return(Some(value)) | Expr::Drop(value) => self.visit(value),
            Expr::LocalGet { index, .. } => self.local(*index),
            Expr::LocalSet { index, value } | Expr::LocalTee { index, value, .. } => {
                self.local(*index)?;
                self.visit(value)
            }
            Expr::Unary { value, .. } | Expr::Convert { value, .. } => self.visit(value),
            Expr::Binary { left, right, .. } => {
                self.visit(left)?;
                self.visit(right)
            }
            Expr::Call { func, args, .. } => {
                if let Some(module) = self.module {
                    let callee: Callee<'_> = module
                        .callee(*func)
                        .ok_or(ValidationError::UnknownFunction { func: *func })?;
                    if callee.params().len() != args.len() {
                        return Err(ValidationError::ArityMismatch {
                            func: *func,
                            expected: callee.params().len(),
                            found: args.len(),
                        });
                    }
                }
                for arg in args {
                    self.visit(arg)?;
                }
                Ok(())
            }
        }
    }
}

/// Validates a function on its own; calls are not resolved.
pub fn validate_function(func: &IrFunction) -> Result<(), ValidationError> {
    Validator {
        module: None,
        func,
        labels: Vec::new(),
    }
    .visit(&func.body)
}

/// Validates every function of a module, resolving calls against it.
pub fn validate_module(module: &IrModule) -> Result<(), ValidationError> {
    for func in &module.functions {
        Validator {
            module: Some(module),
            func,
            labels: Vec::new(),
        }
        .visit(&func.body)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IrType, LabelKind};

    fn func_with(body: Expr) -> IrFunction {
        let mut func = IrFunction::new(FuncId(0), "f", vec![], IrType::None);
        func.body = body;
        func
    }

    #[test]
    fn test_accepts_enclosed_branch() {
        let exit = Label::new(LabelKind::Break, 0);
        let func = func_with(Expr::block(Some(exit), vec![Expr::br(exit)]));
        assert_eq!(validate_function(&func), Ok(()));
    }

    #[test]
    fn test_rejects_branch_outside_block() {
        let exit = Label::new(LabelKind::Break, 0);
        let func = func_with(Expr::block(
            None,
            vec![Expr::block(Some(exit), vec![]), Expr::br(exit)],
        ));
        assert_eq!(
            validate_function(&func),
            Err(ValidationError::UnboundLabel { label: exit })
        );
    }

    #[test]
    fn test_rejects_shadowed_label() {
        let exit = Label::new(LabelKind::Break, 0);
        let func = func_with(Expr::block(
            Some(exit),
            vec![Expr::block(Some(exit), vec![])],
        ));
        assert_eq!(
            validate_function(&func),
            Err(ValidationError::LabelCollision { label: exit })
        );
    }

    #[test]
    fn test_rejects_unknown_local() {
        let func = func_with(Expr::drop(Expr::local_get(LocalId(2), IrType::I32)));
        assert_eq!(
            validate_function(&func),
            Err(ValidationError::UnknownLocal { local: LocalId(2) })
        );
    }

    #[test]
    fn test_module_checks_call_arity() {
        let mut module = IrModule::new();
        let log = module.add_import("log", vec![IrType::I32], IrType::None);
        let id = module.next_function_id();
        let mut main = IrFunction::new(id, "main", vec![], IrType::None);
        main.body = Expr::call(log, vec![], IrType::None);
        module.add_function(main);

        assert_eq!(
            validate_module(&module),
            Err(ValidationError::ArityMismatch {
                func: log,
                expected: 1,
                found: 0
            })
        );
    }
}
