//! Declarations.
//!
//! Declarations are a closed sum. Kinds that own members (products,
//! traits, extensions, namespaces) carry them as ordered id lists; the
//! scope tree built by `crate::scoped` makes the containment queryable
//! in the other direction.

use sable_common::Span;

use crate::lang::{AccessEffect, OperatorNotation, PrecedenceGroup};
use crate::node::{DeclId, ExprId, PatId, StmtId, TypeExprId};

/// A declaration with its source span.
#[derive(Clone, Debug)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum DeclKind {
    AssociatedType(AssociatedTypeDecl),
    AssociatedValue(AssociatedValueDecl),
    Binding(BindingDecl),
    Conformance(ConformanceDecl),
    Extension(ExtensionDecl),
    Function(FunctionDecl),
    GenericParameter(GenericParameterDecl),
    Initializer(InitializerDecl),
    MethodBundle(MethodBundleDecl),
    MethodImpl(MethodImplDecl),
    Namespace(NamespaceDecl),
    Operator(OperatorDecl),
    Parameter(ParameterDecl),
    Product(ProductDecl),
    Subscript(SubscriptDecl),
    SubscriptImpl(SubscriptImplDecl),
    Trait(TraitDecl),
    TypeAlias(TypeAliasDecl),
    Var(VarDecl),
}

impl DeclKind {
    /// Whether this declaration introduces a lexical scope of its own.
    pub fn introduces_scope(&self) -> bool {
        !matches!(
            self,
            DeclKind::AssociatedType(_)
                | DeclKind::AssociatedValue(_)
                | DeclKind::Binding(_)
                | DeclKind::GenericParameter(_)
                | DeclKind::Operator(_)
                | DeclKind::Parameter(_)
                | DeclKind::Var(_)
        )
    }

    /// Whether this declaration names a type space (member lookup can
    /// land inside it).
    pub fn is_type_scope(&self) -> bool {
        matches!(
            self,
            DeclKind::Product(_)
                | DeclKind::Trait(_)
                | DeclKind::TypeAlias(_)
                | DeclKind::Conformance(_)
                | DeclKind::Extension(_)
        )
    }

    /// Whether this declaration is overloadable (function-kind).
    /// Non-overloadable matches freeze name resolution in a scope.
    pub fn is_overloadable(&self) -> bool {
        matches!(
            self,
            DeclKind::Function(_)
                | DeclKind::Initializer(_)
                | DeclKind::MethodBundle(_)
                | DeclKind::Subscript(_)
        )
    }
}

// ── Generic clauses ──────────────────────────────────────────────────────

/// A generic clause: ordered parameters plus where-clause constraints.
#[derive(Clone, Debug, Default)]
pub struct GenericClause {
    pub parameters: Vec<DeclId>,
    pub constraints: Vec<WhereClause>,
}

/// One constraint of a where clause.
#[derive(Clone, Debug)]
pub enum WhereClause {
    /// `L == R`.
    Equality { lhs: TypeExprId, rhs: TypeExprId },
    /// `T: P & Q`.
    Bound { subject: TypeExprId, traits: Vec<TypeExprId> },
    /// A value-level predicate, kept symbolic.
    Value(ExprId),
}

// ── Single-entity declarations ──────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct AssociatedTypeDecl {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct AssociatedValueDecl {
    pub name: String,
    pub annotation: Option<TypeExprId>,
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct GenericParameterDecl {
    pub name: String,
    /// Bounds; a first annotation denoting a trait makes this a type
    /// parameter, any other first annotation a value parameter.
    pub annotations: Vec<TypeExprId>,
}

#[derive(Clone, Debug)]
pub struct ParameterDecl {
    /// The argument label, `None` for unlabeled parameters.
    pub label: Option<String>,
    pub name: String,
    pub convention: AccessEffect,
    pub annotation: Option<TypeExprId>,
    pub default: Option<ExprId>,
}

#[derive(Clone, Debug)]
pub struct OperatorDecl {
    pub notation: OperatorNotation,
    pub name: String,
    pub precedence: Option<PrecedenceGroup>,
}

// ── Bindings ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct BindingDecl {
    /// The root binding pattern (introducer + names + annotation).
    pub pattern: PatId,
    pub initializer: Option<ExprId>,
    pub is_static: bool,
}

// ── Callable declarations ───────────────────────────────────────────────

/// The body of a function-like declaration.
#[derive(Clone, Debug)]
pub enum FunctionBody {
    Expr(ExprId),
    Block(StmtId),
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    /// `None` for anonymous (lambda-underlying) functions.
    pub identifier: Option<String>,
    /// Set for operator member functions, e.g. `infix fun +`.
    pub notation: Option<OperatorNotation>,
    pub generic: Option<GenericClause>,
    /// Explicit capture list (binding declarations).
    pub explicit_captures: Vec<DeclId>,
    pub parameters: Vec<DeclId>,
    /// The receiver convention for non-static member functions.
    pub receiver_effect: Option<AccessEffect>,
    pub is_static: bool,
    pub output: Option<TypeExprId>,
    pub body: Option<FunctionBody>,
}

#[derive(Clone, Debug)]
pub struct InitializerDecl {
    pub generic: Option<GenericClause>,
    pub parameters: Vec<DeclId>,
    pub body: Option<StmtId>,
    /// Synthesized element-wise initializer of a product type.
    pub is_memberwise: bool,
}

#[derive(Clone, Debug)]
pub struct MethodBundleDecl {
    pub identifier: String,
    pub notation: Option<OperatorNotation>,
    pub generic: Option<GenericClause>,
    pub parameters: Vec<DeclId>,
    pub output: Option<TypeExprId>,
    /// The variant implementations (`MethodImpl` declarations).
    pub impls: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct MethodImplDecl {
    /// One of `let`, `inout`, `sink`, `set`.
    pub introducer: AccessEffect,
    pub body: Option<FunctionBody>,
}

#[derive(Clone, Debug)]
pub struct SubscriptDecl {
    /// `None` for unnamed subscripts (exposed as `[]`).
    pub identifier: Option<String>,
    /// Property subscripts have no parameter list at all.
    pub is_property: bool,
    pub generic: Option<GenericClause>,
    pub explicit_captures: Vec<DeclId>,
    pub parameters: Vec<DeclId>,
    pub output: TypeExprId,
    pub impls: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct SubscriptImplDecl {
    /// One of `let`, `inout`, `sink`, `set`, `yielded`.
    pub introducer: AccessEffect,
    pub body: Option<FunctionBody>,
}

// ── Type declarations ───────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct ProductDecl {
    pub name: String,
    pub generic: Option<GenericClause>,
    /// Declared conformances (`type A: P, Q`).
    pub conformances: Vec<TypeExprId>,
    pub members: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct TraitDecl {
    pub name: String,
    /// Refined traits (`trait Q: P`).
    pub refinements: Vec<TypeExprId>,
    pub members: Vec<DeclId>,
    /// The implicit `Self` parameter, synthesized during scoping.
    pub self_parameter: Option<DeclId>,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub name: String,
    pub generic: Option<GenericClause>,
    pub aliased: TypeExprId,
}

#[derive(Clone, Debug)]
pub struct ConformanceDecl {
    pub subject: TypeExprId,
    pub conformances: Vec<TypeExprId>,
    pub constraints: Vec<WhereClause>,
    pub members: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct ExtensionDecl {
    pub subject: TypeExprId,
    pub constraints: Vec<WhereClause>,
    pub members: Vec<DeclId>,
}

#[derive(Clone, Debug)]
pub struct NamespaceDecl {
    pub name: String,
    pub members: Vec<DeclId>,
}
