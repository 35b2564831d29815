//! Intermediate Representation (IR) for the Ripple compiler
//!
//! A structured, stack-machine-style IR in the WebAssembly mould: control flow is
//! expressed with labeled `block`/`loop` nodes, `br`/`br_if`/`br_table` branches to
//! enclosing labels, `if` and `select`. Every node is an expression tree node, so a
//! lowered statement is always one composite value that nests anywhere.

pub mod types;
pub mod label;
pub mod expr;
pub mod module;
pub mod print;
pub mod validate;
pub mod interp;

// ============================================================================
// ID Types (using newtype pattern for type safety)
// ============================================================================

/// Index of a local variable within a function (parameters first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub usize);

/// Index into a module's function space (imports first, then defined functions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub usize);

// ============================================================================
// Display Implementations for ID types
// ============================================================================

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for FuncId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Re-exports (public API)
// ============================================================================

pub use types::*;
pub use label::*;
pub use expr::*;
pub use module::*;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_creation() {
        let mut func = IrFunction::new(FuncId(0), "test", vec![], IrType::None);

        let local1 = func.add_local("a", IrType::I64);
        let local2 = func.add_local("b", IrType::I32);

        assert_eq!(local1, LocalId(0));
        assert_eq!(local2, LocalId(1));
        assert_eq!(func.locals.len(), 2);
    }

    #[test]
    fn test_params_are_first_locals() {
        let func = IrFunction::new(
            FuncId(3),
            "add",
            vec![("a".to_string(), IrType::I32), ("b".to_string(), IrType::I32)],
            IrType::I32,
        );
        assert_eq!(func.params, vec![IrType::I32, IrType::I32]);
        assert_eq!(func.local_type(LocalId(1)), Some(IrType::I32));
        assert_eq!(func.local_type(LocalId(2)), None);
    }

    #[test]
    fn test_function_space_resolution() {
        let mut module = IrModule::new();
        module.add_import("log", vec![IrType::I32], IrType::None);
        let id = module.next_function_id();
        module.add_function(IrFunction::new(id, "main", vec![], IrType::I32));

        assert_eq!(id, FuncId(1));
        assert!(matches!(module.callee(FuncId(0)), Some(Callee::Import(_))));
        assert!(matches!(module.callee(FuncId(1)), Some(Callee::Function(_))));
        assert!(module.callee(FuncId(2)).is_none());
        assert_eq!(module.find_function("main").map(|f| f.id), Some(FuncId(1)));
    }

    #[test]
    fn test_expr_types() {
        let cmp = Expr::binary(
            BinOp::LtS,
            IrType::I64,
            Expr::i64_const(1),
            Expr::i64_const(2),
        );
        assert_eq!(cmp.ty(), IrType::I32);

        let widened = Expr::convert(ConvertOp::I64ExtendI32S, Expr::i32_const(-1));
        assert_eq!(widened.ty(), IrType::I64);

        let block = Expr::block(None, vec![Expr::nop()]);
        assert_eq!(block.ty(), IrType::None);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::new(LabelKind::Break, 4).to_string(), "break$4");
        assert_eq!(Label::new(LabelKind::Case(2), 0).to_string(), "case2$0");
        assert_eq!(Label::new(LabelKind::Default, 1).to_string(), "default$1");
    }
}
