use std::rc::Rc;

/// Identity of a breakable statement, assigned during parsing so `break` and
/// `continue` can name their target without searching at runtime.
pub type TargetId = usize;

/// A parsed script or function body with its hoisted declarations.
#[derive(Debug, Clone)]
pub struct ScriptBody {
    pub statements: Vec<Statement>,
    pub fun_decls: Vec<Rc<FunctionNode>>,
    pub var_decls: Vec<VarDecl>,
    pub source_name: Rc<str>,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub body: Rc<ScriptBody>,
}

impl Program {
    pub fn source_name(&self) -> &Rc<str> {
        &self.body.source_name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub read_only: bool,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionForm {
    /// Top-level `function f() {}` of a body; bound during hoisting.
    Declared,
    /// Appears in expression position.
    Expressed,
    /// A declaration nested inside a block; bound when executed.
    Statement,
}

#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: ScriptBody,
    pub form: FunctionForm,
    /// Source text of the whole definition.
    pub source_text: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: String,
    pub init: Option<Expr>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for the `default` clause.
    pub label: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: String,
    pub guard: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Var(Box<Statement>),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Empty,
    Expr(Expr),
    Var {
        decls: Vec<VarDeclarator>,
        read_only: bool,
    },
    Function(Rc<FunctionNode>),
    Block(Vec<Statement>),
    If {
        condition: Expr,
        then_part: Box<Statement>,
        else_part: Option<Box<Statement>>,
    },
    Switch {
        target: TargetId,
        discriminant: Expr,
        cases: Vec<SwitchCase>,
        default_index: Option<usize>,
    },
    For {
        target: TargetId,
        setup: Option<ForInit>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Statement>,
    },
    ForIn {
        target: TargetId,
        var_decl: Option<Box<Statement>>,
        iterator: Expr,
        object: Expr,
        body: Box<Statement>,
    },
    While {
        target: TargetId,
        condition: Expr,
        body: Box<Statement>,
    },
    DoWhile {
        target: TargetId,
        body: Box<Statement>,
        condition: Expr,
    },
    Break(TargetId),
    Continue(TargetId),
    Return(Option<Expr>),
    Throw(Expr),
    Try {
        block: Vec<Statement>,
        catch_clauses: Vec<CatchClause>,
        finally_block: Option<Vec<Statement>>,
    },
    With {
        object: Expr,
        body: Box<Statement>,
    },
    Labeled {
        label: String,
        target: TargetId,
        body: Box<Statement>,
    },
    Debugger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    BitNot,
    Plus,
    Minus,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    InstanceOf,
    Lsh,
    Rsh,
    Ursh,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum PropertyInit {
    Data(String, Expr),
    Getter(String, Rc<FunctionNode>),
    Setter(String, Rc<FunctionNode>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64),
    String(String),
    RegExp { pattern: String, flags: String },
    Boolean(bool),
    Null,
    This,
    Identifier(String),
    /// `None` entries are elisions.
    Array(Vec<Option<Expr>>),
    Object(Vec<PropertyInit>),
    Function(Rc<FunctionNode>),
    Group(Box<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    New(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    /// Left-associative chain `a op b op c ...`, flattened.
    Binary(BinaryOp, Vec<Expr>),
    Logical(LogicalOp, Vec<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Comma(Vec<Expr>),
}

impl Expr {
    /// Short rendering used in diagnostics such as "x.y is not a function".
    pub fn describe(&self) -> String {
        match self {
            Expr::Identifier(name) => name.clone(),
            Expr::Member(object, name) => format!("{}.{name}", object.describe()),
            Expr::Index(object, _) => format!("{}[...]", object.describe()),
            Expr::Group(inner) => inner.describe(),
            Expr::This => "this".to_string(),
            Expr::Call(callee, _) => format!("{}(...)", callee.describe()),
            Expr::Function(_) => "function".to_string(),
            Expr::String(s) => format!("\"{s}\""),
            Expr::Number(n) => crate::core::number::format_number(*n),
            Expr::Null => "null".to_string(),
            _ => "expression".to_string(),
        }
    }
}
