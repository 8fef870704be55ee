// ast.rs
//
// The resolved syntax tree of a single class: expression and statement sums,
// class/method declarations, and the node identity used to key metadata.
//
// The tree arrives already parsed and name-resolved. Variable references
// carry their binding, declared types are arena handles, and every node has a
// stable NodeId. The checker never alters the tree structurally; all of its
// output goes through the metadata side store.

use crate::span::Span;
use crate::vars::VarId;
use quill_types::{ClassId, MethodId, TypeId};

/// Unique identifier for syntax-tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

impl Expr {
    /// True for a literal null constant.
    pub fn is_null_constant(&self) -> bool {
        matches!(self.kind, ExprKind::Const(ConstValue::Null))
    }

    /// Constant string text, for single-character cast checks and map keys.
    pub fn constant_text(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Const(ConstValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// Literal constants. Numeric literals carry their boxed type, the way the
/// runtime materializes them: `1` is an Integer, `1L` a Long, and a plain
/// decimal literal a BigDecimal.
#[derive(Debug, Clone)]
pub enum ConstValue {
    Int(i64),
    Long(i64),
    BigInt(String),
    Decimal(String),
    Float(f64),
    Double(f64),
    Bool(bool),
    Str(String),
    /// Interpolated string.
    GStr(String),
    Null,
}

/// Resolution result for a variable reference, produced by the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    This,
    Super,
    Var(VarId),
    /// Undeclared, or a member of a `with` receiver; dispatched dynamically.
    Dynamic,
}

/// A variable reference.
#[derive(Debug, Clone)]
pub struct VarRef {
    pub name: String,
    pub binding: Binding,
}

/// Binary operators, including assignment, `instanceof` and indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,
    Power,
    Equal,
    NotEqual,
    CompareTo,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    /// `=~`
    FindRegex,
    /// `==~`
    MatchRegex,
    /// `a[b]`
    Index,
    InstanceOf,
}

impl BinOp {
    pub fn is_assignment(self) -> bool {
        self == BinOp::Assign
    }

    /// The additive/multiplicative group sharing one promotion table.
    pub fn is_group_operation(self) -> bool {
        matches!(self, BinOp::Plus | BinOp::Minus | BinOp::Multiply | BinOp::Mod)
    }

    /// Operators that intrinsically produce a boolean.
    pub fn is_bool_intrinsic(self) -> bool {
        matches!(
            self,
            BinOp::Equal
                | BinOp::NotEqual
                | BinOp::LogicalAnd
                | BinOp::LogicalOr
                | BinOp::MatchRegex
                | BinOp::InstanceOf
        )
    }

    /// Ordered comparisons whose result is boolean.
    pub fn is_compare_to_boolean(self) -> bool {
        matches!(
            self,
            BinOp::Less | BinOp::LessEqual | BinOp::Greater | BinOp::GreaterEqual
        )
    }

    pub fn is_bit_operation(self) -> bool {
        matches!(self, BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor)
    }

    pub fn is_shift(self) -> bool {
        matches!(
            self,
            BinOp::LeftShift | BinOp::RightShift | BinOp::UnsignedRightShift
        )
    }

    /// Operator method consulted when the promotion tables don't apply.
    pub fn method_name(self) -> Option<&'static str> {
        Some(match self {
            BinOp::Plus => "plus",
            BinOp::Minus => "minus",
            BinOp::Multiply => "multiply",
            BinOp::Divide => "div",
            BinOp::Mod => "mod",
            BinOp::Power => "power",
            BinOp::LeftShift => "leftShift",
            BinOp::RightShift => "rightShift",
            BinOp::UnsignedRightShift => "rightShiftUnsigned",
            BinOp::BitAnd => "and",
            BinOp::BitOr => "or",
            BinOp::BitXor => "xor",
            BinOp::Index => "getAt",
            BinOp::Equal | BinOp::NotEqual => "equals",
            BinOp::CompareTo
            | BinOp::Less
            | BinOp::LessEqual
            | BinOp::Greater
            | BinOp::GreaterEqual => "compareTo",
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    /// True when this assignment is the variable's declaration site
    /// (`def x = ...`). A declaration with no initializer carries an
    /// `ExprKind::Empty` right-hand side.
    pub is_declaration: bool,
}

#[derive(Debug, Clone)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    pub if_true: Box<Expr>,
    pub if_false: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    BitwiseNegate,
}

impl UnaryOp {
    pub fn method_name(self) -> &'static str {
        match self {
            UnaryOp::Minus => "negative",
            UnaryOp::Plus => "positive",
            UnaryOp::BitwiseNegate => "bitwiseNegate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PropertyExpr {
    pub object: Box<Expr>,
    pub property: String,
    /// Attribute access (`o.@f`): direct field, no superclass walk.
    pub attribute: bool,
    /// Spread access (`xs*.p`).
    pub spread_safe: bool,
}

#[derive(Debug, Clone)]
pub struct MethodCallExpr {
    pub object: Box<Expr>,
    pub method: String,
    pub args: Vec<Expr>,
    /// Spread call (`xs*.m()`).
    pub spread_safe: bool,
}

#[derive(Debug, Clone)]
pub struct ConstructorCallExpr {
    pub ty: TypeId,
    pub args: Vec<Expr>,
    /// `new ArrayList<>()`: generic arguments elided, to be inferred from the
    /// assignment target or the first argument.
    pub diamond: bool,
}

#[derive(Debug, Clone)]
pub struct ClosureExpr {
    pub params: Vec<VarId>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub ty: TypeId,
    pub expr: Box<Expr>,
    /// `as`-style coercion, permitted unconditionally.
    pub coerce: bool,
}

#[derive(Debug, Clone)]
pub struct RangeExpr {
    pub from: Box<Expr>,
    pub to: Box<Expr>,
    pub inclusive: bool,
}

#[derive(Debug, Clone)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Const(ConstValue),
    Variable(VarRef),
    Property(PropertyExpr),
    Binary(BinaryExpr),
    Ternary(TernaryExpr),
    Unary { op: UnaryOp, operand: Box<Expr> },
    MethodCall(MethodCallExpr),
    ConstructorCall(ConstructorCallExpr),
    Closure(ClosureExpr),
    Cast(CastExpr),
    ListLiteral(Vec<Expr>),
    MapLiteral(Vec<MapEntry>),
    Range(RangeExpr),
    /// Destructuring target of a multiple assignment.
    Tuple(Vec<Expr>),
    /// A class used as an expression (`Foo.class`, the rhs of `instanceof`).
    ClassLiteral(TypeId),
    Empty,
}

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Expr(Expr),
    If {
        condition: Expr,
        then_block: Box<Stmt>,
        else_block: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    ForEach {
        variable: VarId,
        collection: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Empty,
}

/// A method body paired with its arena signature.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub id: MethodId,
    pub node: NodeId,
    pub span: Span,
    pub params: Vec<VarId>,
    pub body: Stmt,
}

/// The class under check: arena identity plus the method bodies to walk.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub id: ClassId,
    pub node: NodeId,
    pub span: Span,
    pub methods: Vec<MethodDecl>,
}
