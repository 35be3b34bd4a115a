//! Abstract Syntax Tree types
//!
//! Every node carries its source span for diagnostics. Trees are owned
//! strictly top-down; class references (base classes, member types) stay
//! plain names here and are resolved by name lookup in the middle end.

use crate::util::span::Span;
use smallvec::SmallVec;
use std::fmt;

/// Dotted member-access path, e.g. `system.tank.h`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub segments: SmallVec<[String; 4]>,
    pub span: Span,
}

impl Path {
    pub fn single(name: impl Into<String>, span: Span) -> Self {
        let mut segments = SmallVec::new();
        segments.push(name.into());
        Self { segments, span }
    }

    pub fn push(&mut self, segment: impl Into<String>, span: Span) {
        self.segments.push(segment.into());
        self.span = self.span.merge(span);
    }

    /// The flat, dot-joined form used as attribute key after flattening
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
    /// Time differential `$x`
    TimeDeriv,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64, Span),
    Str(String, Span),
    /// Identifier or dotted member access
    Path(Path),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Path,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span) | Expr::Str(_, span) => *span,
            Expr::Path(path) => path.span,
            Expr::Unary { span, .. } | Expr::Binary { span, .. } | Expr::Call { span, .. } => *span,
        }
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// One `if`/`elif` arm
#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// Statement kind
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `target := expr;` — `differential` marks `$target := expr;`
    Assign {
        target: Path,
        differential: bool,
        value: Expr,
    },
    /// Bare call statement, e.g. `system.init();`
    Call { callee: Path, args: Vec<Expr> },
    If {
        branches: Vec<IfBranch>,
        else_body: Option<Vec<Stmt>>,
    },
    Pass,
}

/// Mutability category of a declared attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrRole {
    /// Plain (state or algebraic) variable
    Variable,
    Param,
    Const,
}

impl fmt::Display for AttrRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrRole::Variable => write!(f, "variable"),
            AttrRole::Param => write!(f, "param"),
            AttrRole::Const => write!(f, "const"),
        }
    }
}

/// `data name[, name...]: TypeName [param|const];`
#[derive(Debug, Clone, PartialEq)]
pub struct DataDecl {
    pub names: Vec<(String, Span)>,
    pub type_name: String,
    pub type_span: Span,
    pub role: AttrRole,
    pub span: Span,
}

/// The special block kinds with usage-checking rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Init,
    Dynamic,
    Final,
    User,
}

impl BlockKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "init" => BlockKind::Init,
            "dynamic" => BlockKind::Dynamic,
            "final" => BlockKind::Final,
            _ => BlockKind::User,
        }
    }
}

/// `func name(params):` or `block name:` body
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub kind: BlockKind,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Pragma flags that alter flattening behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pragmas {
    pub no_flatten: bool,
    pub built_in_type: bool,
}

/// What keyword introduced the class definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Model,
    Process,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Class => write!(f, "class"),
            ClassKind::Model => write!(f, "model"),
            ClassKind::Process => write!(f, "process"),
        }
    }
}

/// Class definition. The base class is a weak reference by name,
/// resolved against the class table in a later pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub base: Option<(String, Span)>,
    pub data: Vec<DataDecl>,
    pub funcs: Vec<FuncDef>,
    pub pragmas: Pragmas,
    pub span: Span,
}

/// Top-level owner of all class definitions of one compilation
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub classes: Vec<ClassDef>,
    /// Classes named by `compile` directives, in source order
    pub compile_targets: Vec<(String, Span)>,
    pub span: Span,
}
