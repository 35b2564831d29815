//! IR module and function definitions.

use crate::{Expr, FuncId, IrType, LocalId};

/// A named local slot.
#[derive(Debug, Clone, PartialEq)]
pub struct IrLocal {
    pub name: String,
    pub ty: IrType,
}

/// An IR function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    /// Position in the module's function space
    pub id: FuncId,

    /// Function name
    pub name: String,

    /// Parameter types (the first `params.len()` locals)
    pub params: Vec<IrType>,

    /// Result type
    pub result: IrType,

    /// All locals, parameters first
    pub locals: Vec<IrLocal>,

    /// Function body
    pub body: Expr,

    /// Whether this function is exported
    pub is_export: bool,
}

impl IrFunction {
    /// Creates a new function with an empty body.
    pub fn new(
        id: FuncId,
        name: impl Into<String>,
        params: Vec<(String, IrType)>,
        result: IrType,
    ) -> Self {
        let locals: Vec<IrLocal> = params
            .into_iter()
            .map(|(name, ty)| IrLocal { name, ty })
            .collect();
        IrFunction {
            id,
            name: name.into(),
            params: locals.iter().map(|l| l.ty).collect(),
            result,
            locals,
            body: Expr::Nop,
            is_export: false,
        }
    }

    /// Adds a new local variable.
    pub fn add_local(&mut self, name: impl Into<String>, ty: IrType) -> LocalId {
        let id = LocalId(self.locals.len());
        self.locals.push(IrLocal {
            name: name.into(),
            ty,
        });
        id
    }

    pub fn local_type(&self, id: LocalId) -> Option<IrType> {
        self.locals.get(id.0).map(|l| l.ty)
    }
}

/// A host function the module imports.
#[derive(Debug, Clone, PartialEq)]
pub struct IrImport {
    pub name: String,
    pub params: Vec<IrType>,
    pub result: IrType,
}

/// Resolved call target.
#[derive(Debug, Clone, Copy)]
pub enum Callee<'a> {
    Import(&'a IrImport),
    Function(&'a IrFunction),
}

impl Callee<'_> {
    pub fn params(&self) -> &[IrType] {
        match self {
            Callee::Import(import) => &import.params,
            Callee::Function(func) => &func.params,
        }
    }

    pub fn result(&self) -> IrType {
        match self {
            Callee::Import(import) => import.result,
            Callee::Function(func) => func.result,
        }
    }
}

/// A complete IR module: imports occupy the low end of the function space.
#[derive(Debug, Clone, Default)]
pub struct IrModule {
    pub imports: Vec<IrImport>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    /// Creates a new empty IR module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an import. Imports must be added before any function.
    pub fn add_import(
        &mut self,
        name: impl Into<String>,
        params: Vec<IrType>,
        result: IrType,
    ) -> FuncId {
        debug_assert!(self.functions.is_empty(), "imports must precede functions");
        let id = FuncId(self.imports.len());
        self.imports.push(IrImport {
            name: name.into(),
            params,
            result,
        });
        id
    }

    /// Id the next added function will receive.
    pub fn next_function_id(&self) -> FuncId {
        FuncId(self.imports.len() + self.functions.len())
    }

    /// Adds a function to the module.
    pub fn add_function(&mut self, function: IrFunction) -> FuncId {
        let id = function.id;
        self.functions.push(function);
        id
    }

    pub fn callee(&self, id: FuncId) -> Option<Callee<'_>> {
        if id.0 < self.imports.len() {
            return Some(Callee::Import(&self.imports[id.0]));
        }
        self.functions
            .get(id.0 - self.imports.len())
            .map(Callee::Function)
    }

    /// Finds a defined function by name.
    pub fn find_function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}
