//! Whole-program lowering.

use std::collections::HashMap;

use ripple_ast::{FunctionDecl, Program, SourceType};
use ripple_ir::{Expr as IrExpr, FuncId, IrFunction, IrModule, LocalId};
use tracing::debug;

use crate::{DiagnosticKind, Diagnostics, FunctionLowerer, LowerConfig, LowerError};

/// Source-level signature of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub id: FuncId,
    pub params: Vec<SourceType>,
    pub result: SourceType,
}

/// Callables visible to expressions, by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: HashMap<String, Signature>,
}

impl FunctionTable {
    /// Registers `name`; returns `false` and keeps the first entry when the
    /// name is taken.
    pub fn insert(&mut self, name: &str, signature: Signature) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), signature);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.entries.get(name)
    }
}

/// Result of lowering a program. Lowering succeeded structurally; the program
/// is only sound when `diagnostics` is empty.
#[derive(Debug)]
pub struct LowerOutput {
    pub module: IrModule,
    pub diagnostics: Diagnostics,
}

/// Lowers programs into IR modules.
#[derive(Debug, Clone, Default)]
pub struct Lowerer {
    config: LowerConfig,
}

impl Lowerer {
    pub fn new(config: LowerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LowerConfig {
        &self.config
    }

    /// Lower an entire program into an IR module.
    pub fn lower_program(&self, program: &Program) -> Result<LowerOutput, LowerError> {
        debug!(
            imports = program.imports.len(),
            functions = program.functions.len(),
            "lowering program"
        );
        let mut module = IrModule::new();
        let mut diagnostics = Diagnostics::new();
        let mut functions = FunctionTable::default();

        for import in &program.imports {
            let params = import.params.iter().map(|&ty| self.config.ir_type(ty)).collect();
            let id = module.add_import(
                import.name.name.clone(),
                params,
                self.config.ir_type(import.return_type),
            );
            let signature = Signature {
                id,
                params: import.params.clone(),
                result: import.return_type,
            };
            if !functions.insert(&import.name.name, signature) {
                diagnostics.report(
                    DiagnosticKind::DuplicateFunction(import.name.name.clone()),
                    Default::default(),
                );
            }
        }

        // Every function gets its id up front so calls may refer forward.
        let first = module.next_function_id().0;
        for (offset, func) in program.functions.iter().enumerate() {
            let signature = Signature {
                id: FuncId(first + offset),
                params: func.params.iter().map(|p| p.ty).collect(),
                result: func.return_type,
            };
            if !functions.insert(&func.name.name, signature) {
                diagnostics.report(
                    DiagnosticKind::DuplicateFunction(func.name.name.clone()),
                    func.span,
                );
            }
        }

        for (offset, func) in program.functions.iter().enumerate() {
            let lowered = self.lower_function(
                func,
                FuncId(first + offset),
                &functions,
                &mut diagnostics,
            )?;
            module.add_function(lowered);
        }

        Ok(LowerOutput {
            module,
            diagnostics,
        })
    }

    fn lower_function(
        &self,
        func: &FunctionDecl,
        id: FuncId,
        functions: &FunctionTable,
        diagnostics: &mut Diagnostics,
    ) -> Result<IrFunction, LowerError> {
        debug!(function = %func.name, "lowering function");
        let params = func
            .params
            .iter()
            .map(|p| (p.name.name.clone(), self.config.ir_type(p.ty)))
            .collect();
        let mut ir_func = IrFunction::new(
            id,
            func.name.name.clone(),
            params,
            self.config.ir_type(func.return_type),
        );
        ir_func.is_export = func.is_export;

        let mut lowerer = FunctionLowerer::new(
            func.name.name.clone(),
            func.return_type,
            &self.config,
            functions,
            diagnostics,
        );
        for (index, param) in func.params.iter().enumerate() {
            lowerer.bind_variable(&param.name.name, param.ty, LocalId(index), false, func.span);
        }

        let mut declare_local = |name: &str, ty| ir_func.add_local(name, ty);
        let mut children = Vec::with_capacity(func.body.value.stmts.len() + 1);
        for stmt in &func.body.value.stmts {
            children.push(lowerer.lower_statement(stmt, &mut declare_local)?);
        }
        if !func.return_type.is_void() && !children.last().is_some_and(IrExpr::is_terminator) {
            // Falling off the end of a value-returning function traps.
            children.push(IrExpr::unreachable());
        }
        lowerer.finish()?;

        ir_func.body = IrExpr::block(None, children);
        Ok(ir_func)
    }
}

/// Lowers `program` with the default configuration.
pub fn lower_program(program: &Program) -> Result<LowerOutput, LowerError> {
    Lowerer::default().lower_program(program)
}
