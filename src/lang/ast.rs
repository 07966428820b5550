/// Binary operators, in the order they are parsed (loosest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinOp {
    /// Source spelling of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `nil`
    Nil,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// String literal
    Text(String),
    /// Variable reference
    Ident {
        /// Variable name
        name: String,
        /// Source line
        line: usize,
    },
    /// `[a, b, ...]`
    Table(Vec<Expr>),
    /// `{ stmt; stmt }`, evaluating to its last statement
    Block {
        /// Statements in order
        body: Vec<Stmt>,
        /// Line of the opening brace
        line: usize,
    },
    /// Unary minus
    Neg(Box<Expr>),
    /// Binary operation
    Binary {
        /// Operator
        op: BinOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Line of the operator
        line: usize,
    },
    /// Builtin call `name(args)`
    Call {
        /// Function name
        name: String,
        /// Argument expressions
        args: Vec<Expr>,
        /// Line of the call
        line: usize,
    },
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `def name := value`
    Def {
        /// Name being introduced
        name: String,
        /// Initial value
        value: Expr,
    },
    /// `name := value`
    Assign {
        /// Existing variable
        name: String,
        /// New value
        value: Expr,
        /// Source line
        line: usize,
    },
    /// Bare expression
    Expr(Expr),
}

/// A parsed unit of source text, ready to hand to the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Where the source came from (file name, "console", ...)
    pub label: String,
    /// Top-level statements
    pub body: Vec<Stmt>,
    /// Source text the program was parsed from
    pub source: String,
}

impl Program {
    /// Construct a program from its parts
    pub fn new(label: impl Into<String>, source: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            body,
        }
    }
}
