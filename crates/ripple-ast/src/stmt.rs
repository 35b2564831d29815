//! Statement definitions for the AST

use super::*;
use std::fmt;

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression statement
    Expr(Node<Expr>),

    /// Variable declaration: let/const name: Type = value
    VarDecl(VarDecl),

    /// Return statement
    Return(Option<Node<Expr>>),

    /// If statement
    If {
        condition: Node<Expr>,
        then_stmt: Box<Node<Stmt>>,
        else_stmt: Option<Box<Node<Stmt>>>,
    },

    /// For statement
    For {
        init: Option<Box<Node<Stmt>>>,
        condition: Option<Node<Expr>>,
        update: Option<Node<Expr>>,
        body: Option<Box<Node<Stmt>>>,
    },

    /// While statement (a missing body is the empty statement)
    While {
        condition: Node<Expr>,
        body: Option<Box<Node<Stmt>>>,
    },

    /// Do-while statement
    DoWhile {
        body: Box<Node<Stmt>>,
        condition: Node<Expr>,
    },

    /// Block statement: { stmts }
    Block(BlockStmt),

    /// Break statement
    Break,

    /// Continue statement
    Continue,

    /// Switch statement
    Switch {
        discriminant: Node<Expr>,
        cases: Vec<SwitchCase>,
    },

    /// Empty statement: ;
    Empty,
}

impl Stmt {
    /// Stable kind tag for this statement.
    pub fn kind(&self) -> StmtKind {
        match self {
            Stmt::Expr(_) => StmtKind::Expr,
            Stmt::VarDecl(_) => StmtKind::VarDecl,
            Stmt::Return(_) => StmtKind::Return,
            Stmt::If { .. } => StmtKind::If,
            Stmt::For { .. } => StmtKind::For,
            Stmt::While { .. } => StmtKind::While,
            Stmt::DoWhile { .. } => StmtKind::DoWhile,
            Stmt::Block(_) => StmtKind::Block,
            Stmt::Break => StmtKind::Break,
            Stmt::Continue => StmtKind::Continue,
            Stmt::Switch { .. } => StmtKind::Switch,
            Stmt::Empty => StmtKind::Empty,
        }
    }
}

/// Discriminating tag of a [`Stmt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StmtKind {
    Expr,
    VarDecl,
    Return,
    If,
    For,
    While,
    DoWhile,
    Block,
    Break,
    Continue,
    Switch,
    Empty,
}

/// Block statement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockStmt {
    pub stmts: Vec<Node<Stmt>>,
}

/// Variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub kind: VarDeclKind,
    pub declarations: Vec<VarDeclarator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarDeclKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclarator {
    pub name: Node<Ident>,
    #[serde(default)]
    pub type_annotation: Option<SourceType>,
    #[serde(default)]
    pub init: Option<Node<Expr>>,
}

/// A `case` or `default` clause. `test` is `None` for the default clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    #[serde(default)]
    pub test: Option<Node<Expr>>,
    #[serde(default)]
    pub consequent: Vec<Node<Stmt>>,
    #[serde(default)]
    pub span: Span,
}

impl SwitchCase {
    pub fn is_default(&self) -> bool {
        self.test.is_none()
    }
}

// Display implementations

impl fmt::Display for VarDeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarDeclKind::Let => write!(f, "let"),
            VarDeclKind::Const => write!(f, "const"),
            VarDeclKind::Var => write!(f, "var"),
        }
    }
}

impl fmt::Display for StmtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StmtKind::Expr => "expression",
            StmtKind::VarDecl => "variable declaration",
            StmtKind::Return => "return",
            StmtKind::If => "if",
            StmtKind::For => "for",
            StmtKind::While => "while",
            StmtKind::DoWhile => "do-while",
            StmtKind::Block => "block",
            StmtKind::Break => "break",
            StmtKind::Continue => "continue",
            StmtKind::Switch => "switch",
            StmtKind::Empty => "empty",
        };
        write!(f, "{}", s)
    }
}
