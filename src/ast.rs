//! AST node definitions — the contract between the (external) parser and
//! this crate.
//!
//! The analyzer never constructs these nodes from source text; the parser
//! does, and hands the analyzer a tree to annotate in place. Every slot the
//! analyzer is responsible for filling (`NameResolution`, `FuncSigId`,
//! `semaCanRequestIntegerOperands`, ...) starts at its `NONE`/`Unresolved`
//! sentinel — the parser is expected to zero these slots before handing
//! the tree over.

use smallvec::SmallVec;

use crate::ids::{FuncSigId, LocalVarId, NameId, NodeId, ResolvedFuncSigId, SymId};
use crate::span::Span;

/// How a name reference was bound by the analyzer.
///
/// Exactly one of `Local`/`Sym` holds once analysis of the enclosing
/// expression completes; see first invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameResolution {
    #[default]
    Unresolved,
    Local(LocalVarId),
    Sym(SymId),
}

impl NameResolution {
    #[must_use]
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// An identifier use-site: a name plus its (eventually filled) resolution.
#[derive(Debug, Clone)]
pub struct Ident {
    pub id: NodeId,
    pub span: Span,
    pub name: NameId,
    pub resolution: NameResolution,
}

impl Ident {
    #[must_use]
    pub fn new(id: NodeId, span: Span, name: NameId) -> Self {
        Self {
            id,
            span,
            name,
            resolution: NameResolution::Unresolved,
        }
    }
}

/// A numeric literal as written in source, before type inference.
#[derive(Debug, Clone, Copy)]
pub enum NumericLiteral {
    /// A decimal literal (`1`, `2.5`, `3.0`). `value` is its parsed value;
    /// `is_integer_valued` records whether the source had no fractional part
    /// (`3.0` counts, `3.5` does not).
    Decimal { value: f64, is_integer_valued: bool },
    /// A non-decimal integer literal (hex/octal/binary), parsed into a u64.
    Radix { value: u64 },
}

#[derive(Debug, Clone)]
pub enum Literal {
    Number(NumericLiteral),
    Boolean(bool),
    /// A plain, non-interpolated string literal.
    StringLit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOperator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    BitNot,
    Not,
}

/// Target of an identifier-or-access-expr assignment lhs.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Ident(Ident),
    Access { left: Box<ExprLoc>, name: Ident },
    Index { left: Box<ExprLoc>, index: Box<ExprLoc> },
}

/// A declared parameter, with its declared type name if spec-ed.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub declared_type: Option<Ident>,
}

#[derive(Debug, Clone)]
pub struct FuncDef {
    pub id: NodeId,
    pub span: Span,
    pub name: Ident,
    pub params: Vec<Param>,
    pub declared_return_type: Option<Ident>,
    pub body: Vec<StmtLoc>,
    /// Filled once the block for this decl is pushed/closed.
    pub sema_block_id: Option<crate::ids::BlockId>,
    /// Local func sig interned for this declaration.
    pub sema_func_sig_id: FuncSigId,
}

/// A lambda expression's captured shape: just params + body, since lambdas
/// never have a binding name of their own.
#[derive(Debug, Clone)]
pub struct LambdaDef {
    pub id: NodeId,
    pub span: Span,
    pub params: Vec<Ident>,
    pub body: LambdaBody,
    pub sema_block_id: Option<crate::ids::BlockId>,
    /// The untyped `(any, ..., any) -> any` resolved sig of this lambda's arity.
    pub sema_resolved_func_sig: Option<ResolvedFuncSigId>,
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Box<ExprLoc>),
    Block(Vec<StmtLoc>),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Ident,
}

#[derive(Debug, Clone)]
pub struct ObjectMember {
    pub func: FuncDef,
}

#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub id: NodeId,
    pub span: Span,
    pub name: Ident,
    pub fields: Vec<FieldDef>,
    pub members: Vec<ObjectMember>,
}

#[derive(Debug, Clone)]
pub struct TagTypeDef {
    pub name: Ident,
    pub members: Vec<Ident>,
}

#[derive(Debug, Clone)]
pub struct IfBranch {
    pub cond: ExprLoc,
    pub body: Vec<StmtLoc>,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub first: IfBranch,
    pub else_ifs: Vec<IfBranch>,
    pub else_body: Option<Vec<StmtLoc>>,
}

#[derive(Debug, Clone)]
pub struct MatchCase {
    /// `None` marks the `else` arm.
    pub conditions: Vec<Option<ExprLoc>>,
    pub body: Vec<StmtLoc>,
}

#[derive(Debug, Clone)]
pub struct MatchNode {
    pub scrutinee: Box<ExprLoc>,
    pub cases: Vec<MatchCase>,
}

#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub binding_name: Ident,
    pub spec: String,
    /// `import *` form: import-all rather than a single named binding.
    pub import_all: bool,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Pass,
    Break,
    Continue,
    ReturnNoExpr,
    AtStmt,
    ExprStmt(ExprLoc),
    OpAssign { target: AssignTarget, op: Operator, rhs: ExprLoc },
    Assign { target: AssignTarget, rhs: ExprLoc },
    /// Top-level `var name: rhs` static variable declaration.
    VarDecl { name: Ident, rhs: ExprLoc },
    CaptureDecl { name: Ident, rhs: Option<ExprLoc> },
    StaticDecl { name: Ident, rhs: Option<ExprLoc> },
    TypeAliasDecl { name: Ident, rhs: ExprLoc },
    TagTypeDecl(TagTypeDef),
    ObjectDecl(ObjectDef),
    FuncDecl(FuncDef),
    FuncDeclWithInitializer { decl: FuncDef, initializer: ExprLoc },
    If(IfStmt),
    WhileCond { cond: ExprLoc, body: Vec<StmtLoc> },
    WhileInf { body: Vec<StmtLoc> },
    ForOpt { binding: Option<Ident>, iterable: ExprLoc, body: Vec<StmtLoc> },
    ForIter { value: Ident, key: Option<Ident>, iterable: ExprLoc, body: Vec<StmtLoc> },
    ForRange { each: Ident, start: ExprLoc, end: ExprLoc, body: Vec<StmtLoc> },
    MatchStmt(MatchNode),
    Import(ImportStmt),
    Export(Box<StmtLoc>),
    Return(ExprLoc),
}

#[derive(Debug, Clone)]
pub struct StmtLoc {
    pub id: NodeId,
    pub span: Span,
    pub stmt: Stmt,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    /// String template (possibly with interpolated sub-expressions).
    StringTemplate(Vec<ExprLoc>),
    /// `T#member` tag-literal initializer.
    TagInit { tag_name: Ident, member: Ident },
    Binary { op: Operator, lhs: Box<ExprLoc>, rhs: Box<ExprLoc> },
    Compare {
        op: CmpOperator,
        lhs: Box<ExprLoc>,
        rhs: Box<ExprLoc>,
        /// Filled by the analyzer: true iff both operands are integers or
        /// `NumberOrRequestInteger`.
        can_request_integer_operands: bool,
    },
    Logical { op: LogicalOperator, lhs: Box<ExprLoc>, rhs: Box<ExprLoc> },
    Unary { op: UnaryOperator, operand: Box<ExprLoc> },
    Ident(Ident),
    Call {
        callee: Box<ExprLoc>,
        args: SmallVec<[ExprLoc; 4]>,
        has_named_args: bool,
    },
    Access { left: Box<ExprLoc>, name: Ident, resolution: NameResolution },
    Index { left: Box<ExprLoc>, index: Box<ExprLoc> },
    ObjectInit {
        type_name: Ident,
        fields: Vec<(Ident, ExprLoc)>,
        resolution: NameResolution,
    },
    Lambda(Box<LambdaDef>),
    Coyield,
    Coresume(Box<ExprLoc>),
    Try(Box<ExprLoc>),
    Compt(Box<ExprLoc>),
    IfExpr { cond: Box<ExprLoc>, then: Box<ExprLoc>, else_: Box<ExprLoc> },
    MatchExpr(Box<MatchNode>),
}

#[derive(Debug, Clone)]
pub struct ExprLoc {
    pub id: NodeId,
    pub span: Span,
    pub expr: Expr,
}
