//! Type expressions: the syntax of type annotations.
//!
//! Type expressions are realized into semantic types by the checker.
//! They form a separate little tree from value expressions, but a type
//! argument list may embed value expressions (for generic value
//! parameters), which stay symbolic.

use sable_common::Span;

use crate::lang::AccessEffect;
use crate::node::{ExprId, TypeExprId};

/// A type expression with its source span.
#[derive(Clone, Debug)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind {
    /// A possibly-qualified, possibly-parameterized name: `A`, `A.B`,
    /// `Map<Key, Value>`.
    Name(NameTypeExpr),
    /// A tuple of labeled elements: `(x: Int, Bool)`.
    Tuple(Vec<TupleTypeElem>),
    /// A lambda type: `[E](x: sink Int) -> Bool`.
    Lambda(LambdaTypeExpr),
    /// A parameter type: convention + bare type, e.g. `inout Int`.
    Parameter(ParameterTypeExpr),
    /// A conformance lens: `T::P` views `T` through trait `P`.
    Lens(LensTypeExpr),
}

/// A static argument to a generic type or value parameter.
#[derive(Clone, Debug)]
pub enum TypeArgExpr {
    Type(TypeExprId),
    /// A value-level argument; kept symbolic by the checker.
    Value(ExprId),
}

#[derive(Clone, Debug)]
pub struct NameTypeExpr {
    pub domain: Option<TypeExprId>,
    pub identifier: String,
    pub arguments: Vec<TypeArgExpr>,
}

#[derive(Clone, Debug)]
pub struct TupleTypeElem {
    pub label: Option<String>,
    pub type_expr: TypeExprId,
}

#[derive(Clone, Debug)]
pub struct LambdaTypeExpr {
    /// The receiver effect, when spelled (`inout` lambdas).
    pub receiver_effect: Option<AccessEffect>,
    /// The environment type, when spelled; `None` means thin (`[]`).
    pub environment: Option<TypeExprId>,
    pub inputs: Vec<LambdaTypeParam>,
    pub output: TypeExprId,
}

#[derive(Clone, Debug)]
pub struct LambdaTypeParam {
    pub label: Option<String>,
    pub convention: AccessEffect,
    pub type_expr: TypeExprId,
}

#[derive(Clone, Debug)]
pub struct ParameterTypeExpr {
    pub convention: AccessEffect,
    pub bare: TypeExprId,
}

#[derive(Clone, Debug)]
pub struct LensTypeExpr {
    pub subject: TypeExprId,
    pub lens: TypeExprId,
}
