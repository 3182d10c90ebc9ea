//! Patterns appearing in binding declarations and conditions.

use sable_common::Span;

use crate::lang::BindingIntroducer;
use crate::node::{DeclId, PatId, TypeExprId};

/// A pattern with its source span.
#[derive(Clone, Debug)]
pub struct Pat {
    pub kind: PatKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum PatKind {
    /// The root pattern of a binding declaration: introducer, optional
    /// annotation, and the pattern that names the parts.
    Binding(BindingPat),
    /// A pattern introducing a single variable declaration.
    Name(NamePat),
    /// A tuple of labeled subpatterns.
    Tuple(Vec<TuplePatElem>),
    /// Matches anything, binds nothing.
    Wildcard,
}

#[derive(Clone, Debug)]
pub struct BindingPat {
    pub introducer: BindingIntroducer,
    pub subpattern: PatId,
    pub annotation: Option<TypeExprId>,
}

#[derive(Clone, Debug)]
pub struct NamePat {
    /// The variable declaration introduced by this pattern.
    pub var: DeclId,
}

#[derive(Clone, Debug)]
pub struct TuplePatElem {
    pub label: Option<String>,
    pub pattern: PatId,
}
