//! Type error types with provenance tracking.
//!
//! Every constraint-derived error carries a `ConstraintOrigin` recording
//! where the constraint came from, so diagnostics can point at the exact
//! source construct instead of a bare pair of types.

use std::fmt;

use sable_common::{Severity, Span};

use crate::ty::Ty;

/// The origin of a type constraint: which source construct decided that
/// two types must relate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// A type annotation.
    Annotation { span: Span },
    /// Argument `index` of a call.
    Argument { span: Span, index: usize },
    /// A binding initializer against its pattern.
    Binding { span: Span },
    /// An explicit cast.
    Cast { span: Span },
    /// A condition that must be boolean.
    Condition { span: Span },
    /// A literal expression.
    Literal { span: Span },
    /// A member access.
    Member { span: Span },
    /// An operator use in a folded sequence.
    Operator { span: Span },
    /// A return statement against the declared output.
    Return { span: Span },
    /// A yield statement against the projected type.
    Yield { span: Span },
    /// A structural requirement (tuple shapes, callee shapes).
    Structural { span: Span },
    /// A where-clause or generic-environment constraint.
    Environment { span: Span },
    /// Synthesized without a single source anchor.
    Internal,
}

impl ConstraintOrigin {
    pub fn span(&self) -> Span {
        match self {
            ConstraintOrigin::Annotation { span }
            | ConstraintOrigin::Argument { span, .. }
            | ConstraintOrigin::Binding { span }
            | ConstraintOrigin::Cast { span }
            | ConstraintOrigin::Condition { span }
            | ConstraintOrigin::Literal { span }
            | ConstraintOrigin::Member { span }
            | ConstraintOrigin::Operator { span }
            | ConstraintOrigin::Return { span }
            | ConstraintOrigin::Yield { span }
            | ConstraintOrigin::Structural { span }
            | ConstraintOrigin::Environment { span } => *span,
            ConstraintOrigin::Internal => Span::DUMMY,
        }
    }
}

/// A diagnostic produced during type checking.
///
/// Variants cover every kind the checker can surface; each carries the
/// data its rendering needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    // ── Name resolution ────────────────────────────────────────────────
    UndefinedName { name: String, span: Span },
    AmbiguousUse { name: String, span: Span },
    NameRefersToValue { name: String, span: Span },
    UndefinedOperator { name: String, span: Span },

    // ── Request cycles ─────────────────────────────────────────────────
    CircularDependency { span: Span },
    CircularRefinement { name: String, span: Span },

    // ── Constraint conflicts ───────────────────────────────────────────
    Mismatch { expected: Ty, found: Ty, origin: ConstraintOrigin },
    InfiniteType { ty: Ty, origin: ConstraintOrigin },
    TraitNotSatisfied { ty: Ty, trait_name: String, origin: ConstraintOrigin },
    NotEnoughContext { span: Span },

    // ── Structural violations ──────────────────────────────────────────
    NotCallable { ty: Ty, span: Span },
    ArityMismatch { expected: usize, found: usize, span: Span },
    LabelMismatch { expected: Vec<Option<String>>, found: Vec<Option<String>>, span: Span },
    InvalidGenericArgumentCount { expected: usize, found: usize, span: Span },
    ExpectedTypeAnnotation { span: Span },
    MissingReturnValue { span: Span },
    InvalidMethodBundleReturn { span: Span },
    DuplicateParameterName { name: String, span: Span },
    DuplicateCaptureName { name: String, span: Span },
    AmbiguousImplicitCapture { name: String, span: Span },

    // ── Types and type expressions ─────────────────────────────────────
    ConformanceToNonTrait { found: Ty, span: Span },
    NonTraitType { found: Ty, span: Span },
    InvalidSelfReference { span: Span },
    InvalidUseOfAssociatedType { name: String, span: Span },
    SumTypeZeroElements { span: Span },
    SumTypeSingleElement { span: Span },
    ValueInSumType { span: Span },
    InvalidConstraint { span: Span },
    CannotExtendBuiltin { span: Span },
    UnsupportedBufferType { span: Span },

    // ── Conformances and operators ─────────────────────────────────────
    RedundantConformance { trait_name: String, span: Span, previous: Span },
    RequirementNotSatisfied { requirement: String, trait_name: String, span: Span },
    AmbiguousRequirementWitness { requirement: String, trait_name: String, span: Span },
    DuplicateOperator { name: String, span: Span, previous: Span },
    ConformanceConditionUnchecked { span: Span },

    // ── Warnings ───────────────────────────────────────────────────────
    UnusedResult { ty: Ty, span: Span },
}

impl TypeError {
    /// Whether this diagnostic is an error or a warning.
    pub fn severity(&self) -> Severity {
        match self {
            TypeError::UnusedResult { .. }
            | TypeError::SumTypeZeroElements { .. }
            | TypeError::ConformanceConditionUnchecked { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The primary source anchor of the diagnostic.
    pub fn span(&self) -> Span {
        match self {
            TypeError::UndefinedName { span, .. }
            | TypeError::AmbiguousUse { span, .. }
            | TypeError::NameRefersToValue { span, .. }
            | TypeError::UndefinedOperator { span, .. }
            | TypeError::CircularDependency { span }
            | TypeError::CircularRefinement { span, .. }
            | TypeError::NotEnoughContext { span }
            | TypeError::NotCallable { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::LabelMismatch { span, .. }
            | TypeError::InvalidGenericArgumentCount { span, .. }
            | TypeError::ExpectedTypeAnnotation { span }
            | TypeError::MissingReturnValue { span }
            | TypeError::InvalidMethodBundleReturn { span }
            | TypeError::DuplicateParameterName { span, .. }
            | TypeError::DuplicateCaptureName { span, .. }
            | TypeError::AmbiguousImplicitCapture { span, .. }
            | TypeError::ConformanceToNonTrait { span, .. }
            | TypeError::NonTraitType { span, .. }
            | TypeError::InvalidSelfReference { span }
            | TypeError::InvalidUseOfAssociatedType { span, .. }
            | TypeError::SumTypeZeroElements { span }
            | TypeError::SumTypeSingleElement { span }
            | TypeError::ValueInSumType { span }
            | TypeError::InvalidConstraint { span }
            | TypeError::CannotExtendBuiltin { span }
            | TypeError::UnsupportedBufferType { span }
            | TypeError::RedundantConformance { span, .. }
            | TypeError::RequirementNotSatisfied { span, .. }
            | TypeError::AmbiguousRequirementWitness { span, .. }
            | TypeError::DuplicateOperator { span, .. }
            | TypeError::ConformanceConditionUnchecked { span }
            | TypeError::UnusedResult { span, .. } => *span,
            TypeError::Mismatch { origin, .. }
            | TypeError::InfiniteType { origin, .. }
            | TypeError::TraitNotSatisfied { origin, .. } => origin.span(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UndefinedName { name, .. } => {
                write!(f, "undefined name `{name}`")
            }
            TypeError::AmbiguousUse { name, .. } => {
                write!(f, "ambiguous use of `{name}`")
            }
            TypeError::NameRefersToValue { name, .. } => {
                write!(f, "`{name}` refers to a value, not a type")
            }
            TypeError::UndefinedOperator { name, .. } => {
                write!(f, "undefined operator `{name}`")
            }
            TypeError::CircularDependency { .. } => write!(f, "circular dependency"),
            TypeError::CircularRefinement { name, .. } => {
                write!(f, "circular trait refinement through `{name}`")
            }
            TypeError::Mismatch { expected, found, .. } => {
                write!(f, "expected `{expected}`, found `{found}`")
            }
            TypeError::InfiniteType { ty, .. } => {
                write!(f, "type `{ty}` would be infinite")
            }
            TypeError::TraitNotSatisfied { ty, trait_name, .. } => {
                write!(f, "`{ty}` does not conform to `{trait_name}`")
            }
            TypeError::NotEnoughContext { .. } => {
                write!(f, "not enough context to infer a type")
            }
            TypeError::NotCallable { ty, .. } => {
                write!(f, "cannot call value of non-callable type `{ty}`")
            }
            TypeError::ArityMismatch { expected, found, .. } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
            TypeError::LabelMismatch { expected, found, .. } => {
                write!(
                    f,
                    "incompatible labels: expected {}, found {}",
                    format_labels(expected),
                    format_labels(found)
                )
            }
            TypeError::InvalidGenericArgumentCount { expected, found, .. } => {
                write!(f, "expected {expected} generic argument(s), found {found}")
            }
            TypeError::ExpectedTypeAnnotation { .. } => {
                write!(f, "expected type annotation")
            }
            TypeError::MissingReturnValue { .. } => write!(f, "missing return value"),
            TypeError::InvalidMethodBundleReturn { .. } => {
                write!(f, "mutating method variant must return `(self, value)`")
            }
            TypeError::DuplicateParameterName { name, .. } => {
                write!(f, "duplicate parameter name `{name}`")
            }
            TypeError::DuplicateCaptureName { name, .. } => {
                write!(f, "duplicate capture name `{name}`")
            }
            TypeError::AmbiguousImplicitCapture { name, .. } => {
                write!(f, "ambiguous implicit capture of `{name}`")
            }
            TypeError::ConformanceToNonTrait { found, .. } => {
                write!(f, "conformance to non-trait type `{found}`")
            }
            TypeError::NonTraitType { found, .. } => {
                write!(f, "`{found}` is not a trait")
            }
            TypeError::InvalidSelfReference { .. } => {
                write!(f, "invalid reference to `Self` outside of a type scope")
            }
            TypeError::InvalidUseOfAssociatedType { name, .. } => {
                write!(f, "invalid use of associated type `{name}`")
            }
            TypeError::SumTypeZeroElements { .. } => {
                write!(f, "empty sum type is `Never`")
            }
            TypeError::SumTypeSingleElement { .. } => {
                write!(f, "sum type with a single element")
            }
            TypeError::ValueInSumType { .. } => {
                write!(f, "value in sum type elements")
            }
            TypeError::InvalidConstraint { .. } => {
                write!(f, "invalid equality or conformance constraint")
            }
            TypeError::CannotExtendBuiltin { .. } => {
                write!(f, "cannot extend a built-in type")
            }
            TypeError::UnsupportedBufferType { .. } => {
                write!(f, "buffer type expressions are not supported")
            }
            TypeError::RedundantConformance { trait_name, .. } => {
                write!(f, "redundant conformance to `{trait_name}`")
            }
            TypeError::RequirementNotSatisfied { requirement, trait_name, .. } => {
                write!(
                    f,
                    "requirement `{requirement}` of trait `{trait_name}` is not satisfied"
                )
            }
            TypeError::AmbiguousRequirementWitness { requirement, trait_name, .. } => {
                write!(
                    f,
                    "multiple witnesses match requirement `{requirement}` of trait `{trait_name}`"
                )
            }
            TypeError::DuplicateOperator { name, .. } => {
                write!(f, "duplicate operator declaration `{name}`")
            }
            TypeError::ConformanceConditionUnchecked { .. } => {
                write!(f, "conformance condition is not checked")
            }
            TypeError::UnusedResult { ty, .. } => {
                write!(f, "unused result of type `{ty}`")
            }
        }
    }
}

fn format_labels(labels: &[Option<String>]) -> String {
    let parts: Vec<&str> = labels
        .iter()
        .map(|l| l.as_deref().unwrap_or("_"))
        .collect();
    format!("({})", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_classification() {
        let warn = TypeError::UnusedResult { ty: Ty::void(), span: Span::DUMMY };
        let err = TypeError::CircularDependency { span: Span::DUMMY };
        assert_eq!(warn.severity(), Severity::Warning);
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn display_is_terse() {
        let e = TypeError::UndefinedName { name: "frobnicate".into(), span: Span::DUMMY };
        assert_eq!(e.to_string(), "undefined name `frobnicate`");
    }
}
