use super::literals::Literal;
use super::operators::{BinaryOp, UnaryOp};
use super::span::{NodeId, Span};

/// Spelled-out type name as it appears in source (`int`, `bool`, `struct S`,
/// ...). Distinct from `ast::types::Type`, which is the resolved semantic
/// lattice name analysis/type check produce from this.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    Int,
    Bool,
    Void,
    String,
    Struct(String),
}

/// A single AST node: an opaque identity, a source coordinate, and a tagged
/// variant. Kept as one closed enum per spec §9's "Deep hierarchy of AST node
/// kinds" note — each pass dispatches on `kind` by tag; adding a construct
/// means adding a variant and a match arm in each pass, not a new type.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum NodeKind {
    /// An identifier *use* — resolved to a symbol by name analysis via
    /// `SymbolLinks`, keyed by this node's `id`.
    Id(String),

    Literal(Literal),

    /// `<unary-op> <expr>`
    Unary { op: UnaryOp, expr: Box<Node> },

    /// `<lhs> <binary-op> <rhs>`
    Binary { op: BinaryOp, lhs: Box<Node>, rhs: Box<Node> },

    /// `<target> = <value>` — an expression per spec §4.2 (its type is the
    /// type of `target`).
    Assign { target: Box<Node>, value: Box<Node> },

    /// `<callee>(<args>)`
    Call { callee: Box<Node>, args: Vec<Node> },

    /// `<base>.<field>`
    FieldAccess { base: Box<Node>, field: String },

    /// A statement list sharing one lexical scope (function bodies, and the
    /// bodies of `if`/`else`/`while`/`repeat`).
    Block(Vec<Node>),

    /// `T x;`
    VarDecl { name: String, ty: TypeName },

    /// A formal parameter inside a `FnDecl`'s parameter list. Structurally
    /// identical to `VarDecl` but kept separate so name analysis can apply
    /// the formal-specific duplicate-check wording from spec §4.1.
    FormalDecl { name: String, ty: TypeName },

    FnDecl {
        name: String,
        formals: Vec<Node>,
        ret_ty: TypeName,
        body: Box<Node>,
    },

    StructDecl {
        name: String,
        fields: Vec<Node>,
    },

    /// An expression evaluated only for its side effect (assignment
    /// statements, call statements). Spec §4.3: "A call-statement then pops
    /// the value and discards."
    ExprStmt(Box<Node>),

    /// `cout << <expr>;`
    Print(Box<Node>),

    /// `cin >> <expr>;`
    Read(Box<Node>),

    Return(Option<Box<Node>>),

    If {
        cond: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },

    While {
        cond: Box<Node>,
        body: Box<Node>,
    },

    /// `repeat <count> { <body> }` — type-checked per spec §4.2 (condition
    /// must be `int`); code-generated per the SPEC_FULL.md addition.
    Repeat {
        count: Box<Node>,
        body: Box<Node>,
    },

    /// `<target>++;`
    Incr(Box<Node>),

    /// `<target>--;`
    Decr(Box<Node>),

    /// The whole compilation unit: a flat list of top-level declarations
    /// (variables, functions, structs).
    Program(Vec<Node>),
}

impl Node {
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Id(name) => Some(name.as_str()),
            _ => None,
        }
    }
}
