//! S-expression rendering of IR trees.
//!
//! Each node starts on its own line, children are indented two spaces and the
//! closing parenthesis follows the last child.

use std::fmt::{self, Write};

use crate::{Expr, IrFunction, IrModule, IrType};

fn newline(f: &mut impl Write, indent: usize) -> fmt::Result {
    writeln!(f)?;
    for _ in 0..indent {
        f.write_str("  ")?;
    }
    Ok(())
}

fn write_node(f: &mut impl Write, indent: usize, head: &str, children: &[&Expr]) -> fmt::Result {
    write!(f, "({}", head)?;
    for child in children {
        newline(f, indent + 1)?;
        write_expr(f, child, indent + 1)?;
    }
    f.write_str(")")
}

fn write_expr(f: &mut impl Write, expr: &Expr, indent: usize) -> fmt::Result {
    match expr {
        Expr::Nop => f.write_str("(nop)"),
        Expr::Unreachable => f.write_str("(unreachable)"),
        Expr::Block { label, children } => {
            let head = match label {
                Some(label) => format!("block ${}", label),
                None => "block".to_string(),
            };
            let children: Vec<&Expr> = children.iter().collect();
            write_node(f, indent, &head, &children)
        }
        Expr::Loop { label, body } => {
            write_node(f, indent, &format!("loop ${}", label), &[body.as_ref()])
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
            ty,
        } => {
            if *ty == IrType::None {
                f.write_str("(if")?;
            } else {
                write!(f, "(if (result {})", ty)?;
            }
            newline(f, indent + 1)?;
            write_expr(f, cond, indent + 1)?;
            newline(f, indent + 1)?;
            write_node(f, indent + 1, "then", &[then_branch.as_ref()])?;
            if let Some(else_branch) = else_branch {
                newline(f, indent + 1)?;
                write_node(f, indent + 1, "else", &[else_branch.as_ref()])?;
            }
            f.write_str(")")
        }
        Expr::Select {
            cond,
            if_true,
            if_false,
        } => write_node(f, indent, "select", &[if_true.as_ref(), if_false.as_ref(), cond.as_ref()]),
        Expr::Br { label, cond: None } => write!(f, "(br ${})", label),
        Expr::Br {
            label,
            cond: Some(cond),
        } => write_node(f, indent, &format!("br_if ${}", label), &[cond.as_ref()]),
        Expr::BrTable {
            labels,
            default,
            index,
        } => {
            let mut head = String::from("br_table");
            for label in labels.iter().chain(std::iter::once(default)) {
                write!(head, " ${}", label)?;
            }
            write_node(f, indent, &head, &[index.as_ref()])
        }
        Expr::Return(None) => f.write_str("(return)"),
        Expr::Return(Some(value)) => write_node(f, indent, "return", &[value.as_ref()]),
        Expr::Drop(value) => write_node(f, indent, "drop", &[value.as_ref()]),
        Expr::Const(constant) => write!(f, "({})", constant),
        Expr::LocalGet { index, .. } => write!(f, "(local.get {})", index),
        Expr::LocalSet { index, value } => {
            write_node(f, indent, &format!("local.set {}", index), &[value.as_ref()])
        }
        Expr::LocalTee { index, value, .. } => {
            write_node(f, indent, &format!("local.tee {}", index), &[value.as_ref()])
        }
        Expr::Unary { op, operand, value } => {
            write_node(f, indent, &format!("{}.{}", operand, op.mnemonic()), &[value.as_ref()])
        }
        Expr::Binary {
            op,
            operand,
            left,
            right,
        } => write_node(
            f,
            indent,
            &format!("{}.{}", operand, op.mnemonic()),
            &[left.as_ref(), right.as_ref()],
        ),
        Expr::Convert { op, value } => write_node(f, indent, op.mnemonic(), &[value.as_ref()]),
        Expr::Call { func, args, .. } => {
            let args: Vec<&Expr> = args.iter().collect();
            write_node(f, indent, &format!("call {}", func), &args)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, 0)
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(func ${}", self.name)?;
        if self.is_export {
            write!(f, " (export \"{}\")", self.name)?;
        }
        if !self.params.is_empty() {
            f.write_str(" (param")?;
            for param in &self.params {
                write!(f, " {}", param)?;
            }
            f.write_str(")")?;
        }
        if self.result != IrType::None {
            write!(f, " (result {})", self.result)?;
        }
        for local in &self.locals[self.params.len()..] {
            newline(f, 1)?;
            write!(f, "(local ${} {})", local.name, local.ty)?;
        }
        newline(f, 1)?;
        write_expr(f, &self.body, 1)?;
        f.write_str(")")
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            write!(f, "(import \"{}\"", import.name)?;
            if !import.params.is_empty() {
                f.write_str(" (param")?;
                for param in &import.params {
                    write!(f, " {}", param)?;
                }
                f.write_str(")")?;
            }
            if import.result != IrType::None {
                write!(f, " (result {})", import.result)?;
            }
            writeln!(f, ")")?;
        }
        for func in &self.functions {
            writeln!(f, "{}", func)?;
        }
        Ok(())
    }
}
