//! Typing constraints emitted by the expression walker.
//!
//! Constraints are data; the solver interprets them. Each carries a
//! `ConstraintOrigin` so conflicts surface as located diagnostics.

use std::fmt;

use sable_ast::{DeclId, ExprId};

use crate::error::ConstraintOrigin;
use crate::ty::{CallableParam, Ty};
use crate::DeclRef;

#[derive(Clone, Debug)]
pub enum Constraint {
    /// `lhs = rhs`.
    Equality { lhs: Ty, rhs: Ty, origin: ConstraintOrigin },
    /// `sub <: sup`.
    Subtyping { sub: Ty, sup: Ty, origin: ConstraintOrigin },
    /// `subject` conforms to every listed trait.
    Conformance { subject: Ty, traits: Vec<DeclId>, origin: ConstraintOrigin },
    /// Argument/parameter compatibility under the parameter's convention.
    Parameter { argument: Ty, parameter: Ty, origin: ConstraintOrigin },
    /// `callee` is callable with the given arguments and output.
    FunctionCall {
        callee: Ty,
        arguments: Vec<CallableParam>,
        output: Ty,
        origin: ConstraintOrigin,
    },
    /// `name` names a member of `base` whose type is `member`.
    Member {
        /// The name expression being resolved, for binding the referent.
        subject: ExprId,
        base: Ty,
        name: String,
        member: Ty,
        origin: ConstraintOrigin,
    },
    /// Disjunction over resolution candidates for a name expression.
    Overload {
        name: ExprId,
        /// The type assigned to the name expression.
        member: Ty,
        candidates: Vec<OverloadCandidate>,
        origin: ConstraintOrigin,
    },
    /// General weighted alternatives.
    Disjunction { choices: Vec<ConstraintChoice>, origin: ConstraintOrigin },
    /// `subject` defaults to `default` unless constrained to a type
    /// conforming to `literal_trait`.
    Literal {
        subject: Ty,
        default: Ty,
        literal_trait: Option<DeclId>,
        origin: ConstraintOrigin,
    },
    /// A symbolic value-level predicate, recorded for later evaluation.
    Predicate { expr: ExprId, origin: ConstraintOrigin },
}

/// One candidate of an overload constraint.
#[derive(Clone, Debug)]
pub struct OverloadCandidate {
    pub reference: DeclRef,
    pub ty: Ty,
    pub constraints: Vec<Constraint>,
    pub penalty: u32,
}

/// One branch of a general disjunction.
#[derive(Clone, Debug)]
pub struct ConstraintChoice {
    pub constraints: Vec<Constraint>,
    pub penalty: u32,
}

impl Constraint {
    pub fn origin(&self) -> &ConstraintOrigin {
        match self {
            Constraint::Equality { origin, .. }
            | Constraint::Subtyping { origin, .. }
            | Constraint::Conformance { origin, .. }
            | Constraint::Parameter { origin, .. }
            | Constraint::FunctionCall { origin, .. }
            | Constraint::Member { origin, .. }
            | Constraint::Overload { origin, .. }
            | Constraint::Disjunction { origin, .. }
            | Constraint::Literal { origin, .. }
            | Constraint::Predicate { origin, .. } => origin,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Equality { lhs, rhs, .. } => write!(f, "{lhs} = {rhs}"),
            Constraint::Subtyping { sub, sup, .. } => write!(f, "{sub} <: {sup}"),
            Constraint::Conformance { subject, traits, .. } => {
                write!(f, "{subject} : {{{} trait(s)}}", traits.len())
            }
            Constraint::Parameter { argument, parameter, .. } => {
                write!(f, "{argument} (argument of) {parameter}")
            }
            Constraint::FunctionCall { callee, arguments, output, .. } => {
                write!(f, "{callee} applied to {} argument(s) -> {output}", arguments.len())
            }
            Constraint::Member { base, name, member, .. } => {
                write!(f, "{base}.{name} = {member}")
            }
            Constraint::Overload { name, candidates, .. } => {
                write!(f, "overload({name}) among {} candidate(s)", candidates.len())
            }
            Constraint::Disjunction { choices, .. } => {
                write!(f, "disjunction of {} choice(s)", choices.len())
            }
            Constraint::Literal { subject, default, .. } => {
                write!(f, "{subject} defaults to {default}")
            }
            Constraint::Predicate { expr, .. } => write!(f, "predicate({expr})"),
        }
    }
}
