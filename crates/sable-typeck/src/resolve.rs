//! Name-expression resolution: candidate construction for the solver
//! and the nominal-prefix walk.
//!
//! A dotted name is resolved component by component from the outermost
//! domain inward. Components with a unique, variable-free candidate fix
//! their type eagerly; the rest is left to the solver through overload
//! and member constraints.

use sable_ast::decl::DeclKind;
use sable_ast::expr::{Domain, ExprKind};
use sable_ast::{DeclId, ExprId, ScopeId};

use crate::constraint::Constraint;
use crate::env::EnvConstraint;
use crate::error::{ConstraintOrigin, TypeError};
use crate::subst::InstantiatedType;
use crate::ty::{BuiltinTy, Ty};
use crate::{DeclRef, TypeChecker};

/// The cumulative domain while walking a dotted name.
#[derive(Clone, Debug)]
pub(crate) enum Parent {
    /// Root component: unqualified lookup.
    None,
    /// A type domain: qualified member lookup.
    Type(Ty),
    /// A namespace domain: lookup in the namespace's scope.
    Namespace(DeclId),
    /// The `Builtin` module.
    BuiltinModule,
}

/// One resolution candidate: a referent and its instantiated type.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
    pub reference: DeclRef,
    pub ty: InstantiatedType,
}

impl<'p> TypeChecker<'p> {
    /// The chain of name components of a dotted name expression,
    /// outermost domain first. The returned chain covers the longest
    /// all-name prefix; a non-name root domain is returned separately.
    pub(crate) fn name_components(&self, expr: ExprId) -> (Option<ExprId>, Vec<ExprId>) {
        let mut components = vec![expr];
        let mut cursor = expr;
        loop {
            match &self.program.ast().expr(cursor).kind {
                ExprKind::Name(n) => match n.domain {
                    Domain::Expr(base) => {
                        if matches!(self.program.ast().expr(base).kind, ExprKind::Name(_)) {
                            components.push(base);
                            cursor = base;
                        } else {
                            components.reverse();
                            return (Some(base), components);
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        components.reverse();
        (None, components)
    }

    /// Build the resolution candidates for one name component against a
    /// parent. Diagnoses nothing on an empty result; callers decide.
    pub(crate) fn candidates_for(
        &mut self,
        expr: ExprId,
        parent: &Parent,
        scope: ScopeId,
    ) -> Vec<Candidate> {
        let (identifier, arguments) = match &self.program.ast().expr(expr).kind {
            ExprKind::Name(n) => (n.identifier.clone(), n.arguments.clone()),
            _ => return Vec::new(),
        };
        let span = self.program.ast().expr(expr).span;

        let decls: Vec<DeclId> = match parent {
            Parent::None => self.lookup_unqualified(&identifier, scope),
            Parent::Type(ty) => self.lookup_member(&ty.clone(), &identifier, scope),
            Parent::Namespace(ns) => {
                let Some(inner) = self.program.scope_introducing(*ns) else {
                    return Vec::new();
                };
                let table = self.names_in_scope(inner);
                table.get(&identifier).cloned().unwrap_or_default()
            }
            Parent::BuiltinModule => {
                return match self.resolve_builtin_member(&identifier) {
                    Some((reference, ty)) => vec![Candidate {
                        reference,
                        ty: InstantiatedType::monomorphic(ty),
                    }],
                    None => Vec::new(),
                };
            }
        };

        let mut candidates = Vec::new();
        for d in decls {
            if let Some(c) = self.candidate_for_decl(d, &arguments, parent, scope, span)
            {
                candidates.push(c);
            }
        }

        // Magic names resolve only when nothing in scope matched.
        if candidates.is_empty() && matches!(parent, Parent::None) {
            if let Some(c) = self.magic_expr_candidate(&identifier, scope, span) {
                candidates.push(c);
            }
        }
        candidates
    }

    fn candidate_for_decl(
        &mut self,
        d: DeclId,
        arguments: &[sable_ast::tyexpr::TypeArgExpr],
        parent: &Parent,
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Option<Candidate> {
        if matches!(self.program.ast().decl(d).kind, DeclKind::Namespace(_)) {
            // Namespaces carry no type; prefix threading handles them.
            return Some(Candidate {
                reference: DeclRef::Direct(d),
                ty: InstantiatedType::monomorphic(Ty::Error),
            });
        }
        let realized = self.realize_decl(d);
        if realized.is_error() {
            // The error was diagnosed at the declaration; sink it here
            // so the use site does not cascade.
            return Some(Candidate {
                reference: DeclRef::Direct(d),
                ty: InstantiatedType::monomorphic(Ty::Error),
            });
        }
        // Erase the outer parameter-convention wrapping of parameters.
        let realized = realized.bare().clone();

        // Apply static arguments, when present.
        let realized = if arguments.is_empty() {
            realized
        } else {
            match realized {
                Ty::Metatype(inner) => {
                    let applied = self.apply_type_arguments(*inner, arguments, scope, span);
                    if applied.is_error() {
                        return None;
                    }
                    Ty::Metatype(Box::new(applied))
                }
                other => {
                    self.report(TypeError::InvalidGenericArgumentCount {
                        expected: 0,
                        found: arguments.len(),
                        span,
                    });
                    return Some(Candidate {
                        reference: DeclRef::Direct(d),
                        ty: InstantiatedType::monomorphic(other),
                    });
                }
            }
        };

        // Instantiate in the introducing scope and carry the generic
        // environment's constraints along.
        let (shape, subs) = self.instantiate(&realized, scope);
        let mut constraints = Vec::new();
        if let Some(env) = self.environment_of(d) {
            let origin = ConstraintOrigin::Environment { span };
            for c in env.constraints.clone() {
                match c {
                    EnvConstraint::Conformance { subject, traits, .. } => {
                        let subject = self.specialize(&subject, &subs, scope);
                        constraints.push(Constraint::Conformance {
                            subject,
                            traits,
                            origin: origin.clone(),
                        });
                    }
                    EnvConstraint::Equality { lhs, rhs, .. } => {
                        let lhs = self.specialize(&lhs, &subs, scope);
                        let rhs = self.specialize(&rhs, &subs, scope);
                        constraints.push(Constraint::Equality {
                            lhs,
                            rhs,
                            origin: origin.clone(),
                        });
                    }
                    EnvConstraint::Predicate { expr, .. } => {
                        constraints.push(Constraint::Predicate {
                            expr,
                            origin: origin.clone(),
                        });
                    }
                }
            }
        }

        let is_member_use = matches!(parent, Parent::Type(_))
            || self.program.is_member_context(scope);
        let reference = if self.program.is_member(d) && is_member_use {
            DeclRef::Member(d)
        } else {
            DeclRef::Direct(d)
        };
        Some(Candidate { reference, ty: InstantiatedType { shape, constraints } })
    }

    /// Magic type names usable in expression position.
    fn magic_expr_candidate(
        &mut self,
        identifier: &str,
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Option<Candidate> {
        match identifier {
            "Self" => {
                let owner = self.program.innermost_type(scope);
                let ty = self.resolve_self(scope, span)?;
                let reference = match owner {
                    Some(o) => DeclRef::Direct(o),
                    None => return None,
                };
                Some(Candidate {
                    reference,
                    ty: InstantiatedType::monomorphic(Ty::Metatype(Box::new(ty))),
                })
            }
            "Builtin" if self.builtin_visible() => Some(Candidate {
                reference: DeclRef::BuiltinType(BuiltinTy::Module),
                ty: InstantiatedType::monomorphic(Ty::Builtin(BuiltinTy::Module)),
            }),
            _ => None,
        }
    }

    /// Thread the parent for the next component after resolving one
    /// uniquely: a candidate naming a nominal type contributes its
    /// instance type, everything else its own shape.
    pub(crate) fn threaded_parent(&mut self, candidate: &Candidate) -> Parent {
        if let Some(d) = candidate.reference.decl() {
            if matches!(self.program.ast().decl(d).kind, DeclKind::Namespace(_)) {
                return Parent::Namespace(d);
            }
        }
        if let DeclRef::BuiltinType(BuiltinTy::Module) = candidate.reference {
            return Parent::BuiltinModule;
        }
        match &candidate.ty.shape {
            Ty::Metatype(inner) => Parent::Type((**inner).clone()),
            other => Parent::Type(other.clone()),
        }
    }
}
