//! Declaration definitions for the AST

use super::*;

/// Function declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: SourceType,
    pub body: Node<BlockStmt>,
    #[serde(default)]
    pub is_export: bool,
    #[serde(default)]
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub ty: SourceType,
}

/// Host function imported by the program: `declare function name(...): T`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<SourceType>,
    pub return_type: SourceType,
}

/// A compilation unit: host imports plus function declarations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}
