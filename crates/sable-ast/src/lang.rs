//! Language-level attribute enums shared across node kinds.

use std::fmt;

/// A parameter or receiver convention.
///
/// Conventions describe how a callee accesses an argument: borrowed
/// immutably (`let`), borrowed mutably (`inout`), consumed (`sink`),
/// initialized (`set`), or projected out of a subscript (`yielded`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessEffect {
    Let,
    Inout,
    Set,
    Sink,
    Yielded,
}

impl fmt::Display for AccessEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AccessEffect::Let => "let",
            AccessEffect::Inout => "inout",
            AccessEffect::Set => "set",
            AccessEffect::Sink => "sink",
            AccessEffect::Yielded => "yielded",
        };
        write!(f, "{text}")
    }
}

/// The introducer of a binding declaration or binding pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingIntroducer {
    Let,
    Var,
    SinkLet,
    Inout,
}

impl BindingIntroducer {
    /// The capture convention implied by this introducer when the bound
    /// name appears in a capture list.
    pub fn capture_effect(self) -> Option<AccessEffect> {
        match self {
            BindingIntroducer::Let => Some(AccessEffect::Let),
            BindingIntroducer::Inout => Some(AccessEffect::Inout),
            // `sink let` and `var` captures own their value outright.
            BindingIntroducer::SinkLet | BindingIntroducer::Var => None,
        }
    }
}

/// The notation of an operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperatorNotation {
    Infix,
    Prefix,
    Postfix,
}

impl fmt::Display for OperatorNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperatorNotation::Infix => "infix",
            OperatorNotation::Prefix => "prefix",
            OperatorNotation::Postfix => "postfix",
        };
        write!(f, "{text}")
    }
}

/// Precedence group of an infix operator declaration.
///
/// Variants are declared in ascending binding strength, so the derived
/// `Ord` is the folding order used for sequence expressions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrecedenceGroup {
    Assignment,
    Disjunction,
    Conjunction,
    Comparison,
    Fallback,
    Range,
    Addition,
    Multiplication,
    Shift,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_order_matches_binding_strength() {
        assert!(PrecedenceGroup::Addition < PrecedenceGroup::Multiplication);
        assert!(PrecedenceGroup::Comparison < PrecedenceGroup::Addition);
        assert!(PrecedenceGroup::Assignment < PrecedenceGroup::Disjunction);
    }

    #[test]
    fn capture_effects() {
        assert_eq!(
            BindingIntroducer::Let.capture_effect(),
            Some(AccessEffect::Let)
        );
        assert_eq!(BindingIntroducer::Var.capture_effect(), None);
    }
}
