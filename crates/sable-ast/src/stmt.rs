//! Statements.

use sable_common::Span;

use crate::expr::ConditionItem;
use crate::node::{DeclId, ExprId, StmtId};

/// A statement with its source span.
#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    /// A brace: a sequence of statements in a child scope.
    Brace(Vec<StmtId>),
    /// An assignment: `lhs = rhs`.
    Assign { left: ExprId, right: ExprId },
    /// A `while` loop; conditions are expressions or binding patterns.
    While { conditions: Vec<ConditionItem>, body: StmtId },
    /// A `do ... while` loop.
    DoWhile { body: StmtId, condition: ExprId },
    /// `return` with an optional value.
    Return { value: Option<ExprId> },
    /// `yield` of a projected value.
    Yield { value: ExprId },
    /// Explicitly discard a value: `_ = e`.
    Discard { expr: ExprId },
    /// A local declaration.
    Decl(DeclId),
    /// A bare expression in statement position.
    Expr(ExprId),
}
