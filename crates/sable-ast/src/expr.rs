//! Value expressions.

use sable_common::Span;

use crate::node::{DeclId, ExprId, StmtId, TypeExprId};
use crate::tyexpr::TypeArgExpr;

/// An expression with its source span.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    BooleanLiteral(bool),
    /// The literal's spelling; evaluation happens downstream.
    IntegerLiteral(String),
    FloatLiteral(String),
    StringLiteral(String),
    /// A possibly-qualified name use, e.g. `x`, `a.b.c`, `Pair<Int, Bool>`.
    Name(NameExpr),
    /// A function call with labeled arguments.
    Call(CallExpr),
    /// A subscript call: `a[i]`.
    SubscriptCall(CallExpr),
    /// A lambda literal; the signature and body live on the underlying
    /// function declaration.
    Lambda(LambdaExpr),
    /// An explicit cast: `e as T`, `e as! T`, or a built-in pointer
    /// conversion.
    Cast(CastExpr),
    /// A mutation marker: `&e`.
    Inout(InoutExpr),
    /// An unfolded infix chain, folded by the checker using operator
    /// precedence.
    Sequence(SequenceExpr),
    /// A tuple of labeled elements.
    Tuple(Vec<TupleElemExpr>),
    /// An `if` expression; branches may be expressions or blocks.
    Conditional(ConditionalExpr),
}

/// The domain of a name expression.
#[derive(Clone, Debug)]
pub enum Domain {
    /// No domain: `x`.
    None,
    /// Implicit domain: `.x` (resolved against the expected type).
    Implicit,
    /// Explicit domain expression: `a.x`.
    Expr(ExprId),
}

#[derive(Clone, Debug)]
pub struct NameExpr {
    pub domain: Domain,
    pub identifier: String,
    /// Static (generic) arguments, e.g. `id<Int>`.
    pub arguments: Vec<TypeArgExpr>,
}

#[derive(Clone, Debug)]
pub struct LabeledArgument {
    pub label: Option<String>,
    pub value: ExprId,
}

#[derive(Clone, Debug)]
pub struct CallExpr {
    pub callee: ExprId,
    pub arguments: Vec<LabeledArgument>,
}

#[derive(Clone, Debug)]
pub struct LambdaExpr {
    /// The underlying function declaration (parameters, captures, body).
    pub decl: DeclId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CastDirection {
    Up,
    Down,
    /// Built-in pointer conversion; the operand must be `Builtin.ptr`.
    Pointer,
}

#[derive(Clone, Debug)]
pub struct CastExpr {
    pub subject: ExprId,
    pub target: TypeExprId,
    pub direction: CastDirection,
}

#[derive(Clone, Debug)]
pub struct InoutExpr {
    pub subject: ExprId,
}

#[derive(Clone, Debug)]
pub struct SequenceExpr {
    pub head: ExprId,
    pub tail: Vec<SequenceTail>,
}

#[derive(Clone, Debug)]
pub struct SequenceTail {
    /// The operator as a name expression (for binding and diagnostics).
    pub operator: ExprId,
    pub operand: ExprId,
}

#[derive(Clone, Debug)]
pub struct TupleElemExpr {
    pub label: Option<String>,
    pub value: ExprId,
}

/// A condition item: a boolean expression or a binding declaration.
#[derive(Clone, Debug)]
pub enum ConditionItem {
    Expr(ExprId),
    Decl(DeclId),
}

/// A conditional branch: a single expression or a brace statement.
#[derive(Clone, Debug)]
pub enum Branch {
    Expr(ExprId),
    Block(StmtId),
}

#[derive(Clone, Debug)]
pub struct ConditionalExpr {
    pub conditions: Vec<ConditionItem>,
    pub success: Branch,
    pub failure: Option<Branch>,
}
