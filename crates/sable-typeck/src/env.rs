//! Generic environments: the declared constraints of a generic
//! declaration, in declaration order.
//!
//! Environments are memoized with an in-progress marker so cyclic
//! requests (a trait refining itself) resolve to `None` instead of
//! looping.

use std::rc::Rc;

use sable_ast::decl::{DeclKind, GenericClause, WhereClause};
use sable_ast::{DeclId, ExprId, ScopeId};
use sable_common::Span;

use crate::error::TypeError;
use crate::ty::Ty;
use crate::TypeChecker;

/// One constraint of a generic environment.
#[derive(Clone, Debug)]
pub enum EnvConstraint {
    Conformance { subject: Ty, traits: Vec<DeclId>, span: Span },
    Equality { lhs: Ty, rhs: Ty, span: Span },
    Predicate { expr: ExprId, span: Span },
}

/// The generic environment of a declaration.
#[derive(Clone, Debug)]
pub struct GenericEnvironment {
    pub decl: DeclId,
    /// Generic parameters, in declaration order.
    pub parameters: Vec<DeclId>,
    pub constraints: Vec<EnvConstraint>,
}

/// Memoization state of an environment request.
#[derive(Clone, Debug)]
pub enum EnvEntry {
    InProgress,
    Done(Option<Rc<GenericEnvironment>>),
}

impl<'p> TypeChecker<'p> {
    /// The generic environment of `d`, or `None` when the declaration
    /// has no generic clause or its environment failed to build.
    pub(crate) fn environment_of(&mut self, d: DeclId) -> Option<Rc<GenericEnvironment>> {
        match self.environments.get(&d) {
            Some(EnvEntry::Done(env)) => return env.clone(),
            Some(EnvEntry::InProgress) => return None,
            None => {}
        }
        self.environments.insert(d, EnvEntry::InProgress);
        let env = self.build_environment(d);
        self.environments.insert(d, EnvEntry::Done(env.clone()));
        env
    }

    fn build_environment(&mut self, d: DeclId) -> Option<Rc<GenericEnvironment>> {
        let kind = self.program.ast().decl(d).kind.clone();
        let scope = self
            .program
            .scope_introducing(d)
            .unwrap_or_else(|| self.program.decl_scope(d));
        match kind {
            DeclKind::Trait(_) => self.build_trait_environment(d),
            DeclKind::Product(p) => self.build_clause_environment(d, p.generic.as_ref(), scope),
            DeclKind::TypeAlias(a) => {
                self.build_clause_environment(d, a.generic.as_ref(), scope)
            }
            DeclKind::Function(f) => {
                self.build_clause_environment(d, f.generic.as_ref(), scope)
            }
            DeclKind::Initializer(i) => {
                self.build_clause_environment(d, i.generic.as_ref(), scope)
            }
            DeclKind::MethodBundle(m) => {
                self.build_clause_environment(d, m.generic.as_ref(), scope)
            }
            DeclKind::Subscript(s) => {
                self.build_clause_environment(d, s.generic.as_ref(), scope)
            }
            DeclKind::Conformance(c) => {
                let env = self.build_where_environment(d, &c.constraints, scope);
                Some(Rc::new(env))
            }
            DeclKind::Extension(e) => {
                let env = self.build_where_environment(d, &e.constraints, scope);
                Some(Rc::new(env))
            }
            _ => None,
        }
    }

    /// The trait environment: `Self` conforms to the trait itself (and
    /// its refinements), plus the member constraints.
    fn build_trait_environment(&mut self, d: DeclId) -> Option<Rc<GenericEnvironment>> {
        let self_param = self.program.trait_self(d)?;
        let errors_before = self.errors.len();
        let mut closure = Vec::new();
        self.trait_closure(d, &mut closure, &mut Vec::new());
        if self.errors.len() > errors_before {
            // A refinement cycle makes the environment unusable.
            return None;
        }
        let span = self.program.ast().decl(d).span;
        let constraints = vec![EnvConstraint::Conformance {
            subject: Ty::GenericTypeParam(self_param),
            traits: closure,
            span,
        }];
        Some(Rc::new(GenericEnvironment { decl: d, parameters: vec![self_param], constraints }))
    }

    fn build_clause_environment(
        &mut self,
        d: DeclId,
        clause: Option<&GenericClause>,
        scope: ScopeId,
    ) -> Option<Rc<GenericEnvironment>> {
        let clause = clause?;
        let mut env = GenericEnvironment {
            decl: d,
            parameters: clause.parameters.clone(),
            constraints: Vec::new(),
        };
        // Declared bounds on each type parameter.
        for &p in &clause.parameters {
            let annotations = match &self.program.ast().decl(p).kind {
                DeclKind::GenericParameter(g) => g.annotations.clone(),
                _ => Vec::new(),
            };
            let span = self.program.ast().decl(p).span;
            let mut traits = Vec::new();
            for a in annotations {
                let realized = self.realize_type_expr(a, scope);
                match realized {
                    Ty::Trait(t) => traits.push(t),
                    // Non-trait first annotations make a value
                    // parameter; later ones were already diagnosed.
                    _ => {}
                }
            }
            if !traits.is_empty() {
                env.constraints.push(EnvConstraint::Conformance {
                    subject: Ty::GenericTypeParam(p),
                    traits,
                    span,
                });
            }
        }
        let where_env = self.build_where_environment(d, &clause.constraints, scope);
        env.constraints.extend(where_env.constraints);
        Some(Rc::new(env))
    }

    fn build_where_environment(
        &mut self,
        d: DeclId,
        clauses: &[WhereClause],
        scope: ScopeId,
    ) -> GenericEnvironment {
        let mut env =
            GenericEnvironment { decl: d, parameters: Vec::new(), constraints: Vec::new() };
        for clause in clauses {
            match clause {
                WhereClause::Equality { lhs, rhs } => {
                    let span = self.program.ast().type_expr(*lhs).span;
                    let lhs_ty = self.realize_type_expr(*lhs, scope);
                    let rhs_ty = self.realize_type_expr(*rhs, scope);
                    if lhs_ty.is_error() || rhs_ty.is_error() {
                        continue;
                    }
                    if !lhs_ty.has_generic_param() && !rhs_ty.has_generic_param() {
                        self.report(TypeError::InvalidConstraint { span });
                        continue;
                    }
                    env.constraints.push(EnvConstraint::Equality {
                        lhs: lhs_ty,
                        rhs: rhs_ty,
                        span,
                    });
                }
                WhereClause::Bound { subject, traits } => {
                    let span = self.program.ast().type_expr(*subject).span;
                    let subject_ty = self.realize_type_expr(*subject, scope);
                    if subject_ty.is_error() {
                        continue;
                    }
                    let mut bounds = Vec::new();
                    for t in traits {
                        let realized = self.realize_type_expr(*t, scope);
                        match realized {
                            Ty::Trait(td) => bounds.push(td),
                            found => {
                                if !found.has_error() {
                                    let tspan = self.program.ast().type_expr(*t).span;
                                    self.report(TypeError::NonTraitType {
                                        found,
                                        span: tspan,
                                    });
                                }
                            }
                        }
                    }
                    if !bounds.is_empty() {
                        env.constraints.push(EnvConstraint::Conformance {
                            subject: subject_ty,
                            traits: bounds,
                            span,
                        });
                    }
                }
                WhereClause::Value(e) => {
                    let span = self.program.ast().expr(*e).span;
                    env.constraints.push(EnvConstraint::Predicate { expr: *e, span });
                }
            }
        }
        env
    }
}
