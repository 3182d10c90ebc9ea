//! Declaration and statement checking.
//!
//! Checking assumes realization is complete and verifies bodies and
//! members. Each statement's expressions form their own constraint
//! system; bindings infer their pattern shape and reify their variables
//! under the chosen solution.

use sable_ast::decl::{DeclKind, FunctionBody};
use sable_ast::expr::ConditionItem;
use sable_ast::pat::PatKind;
use sable_ast::stmt::StmtKind;
use sable_ast::{AccessEffect, DeclId, ExprId, PatId, ScopeId, StmtId};

use crate::constraint::{Constraint, ConstraintChoice};
use crate::error::{ConstraintOrigin, TypeError};
use crate::infer::Obligations;
use crate::subst::substitute_vars;
use crate::ty::{TransformAction, TupleElem, Ty};
use crate::{DeclRequest, TypeChecker};

/// How a checked expression must relate to its expected type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Relation {
    None,
    Subtype,
    Equal,
}

impl<'p> TypeChecker<'p> {
    // ── Expression entry ───────────────────────────────────────────────

    /// Infer, solve, and commit one expression tree. Returns the
    /// reified type of the root.
    pub(crate) fn check_expr(
        &mut self,
        e: ExprId,
        expected: Option<&Ty>,
        relation: Relation,
    ) -> Ty {
        let scope = self.program.expr_scope(e);
        let span = self.program.ast().expr(e).span;
        let mut obligations = Obligations::default();
        let ty = self.infer_expr(e, expected, &mut obligations);
        if let (Some(expected), rel) = (expected, relation) {
            let origin = ConstraintOrigin::Structural { span };
            match rel {
                Relation::Subtype => obligations.constraints.push(Constraint::Subtyping {
                    sub: ty.clone(),
                    sup: expected.clone(),
                    origin,
                }),
                Relation::Equal => obligations.constraints.push(Constraint::Equality {
                    lhs: ty.clone(),
                    rhs: expected.clone(),
                    origin,
                }),
                Relation::None => {}
            }
        }
        self.solve_and_commit(obligations, scope, span);
        self.expr_types.get(&e).cloned().unwrap_or(Ty::Error)
    }

    // ── Declaration entry ──────────────────────────────────────────────

    /// Verify a declaration's body and members. Realization runs first
    /// if it has not already.
    pub fn check_decl(&mut self, d: DeclId) {
        if matches!(self.program.ast().decl(d).kind, DeclKind::Binding(_)) {
            self.check_binding_decl(d);
            return;
        }
        self.realize_decl(d);
        match self.request_state(d) {
            Some(DeclRequest::Success) | Some(DeclRequest::Failure) => return,
            Some(DeclRequest::TypeCheckingStarted) => {
                let span = self.program.ast().decl(d).span;
                self.report(TypeError::CircularDependency { span });
                self.decl_requests.insert(d, DeclRequest::Failure);
                return;
            }
            _ => {}
        }
        self.decl_requests.insert(d, DeclRequest::TypeCheckingStarted);
        let errors_before = self.errors.len();
        self.check_decl_members(d);
        let state = if self.errors.len() == errors_before {
            DeclRequest::Success
        } else {
            DeclRequest::Failure
        };
        // A deferred lambda check may have recorded a final state.
        if self.request_state(d) == Some(DeclRequest::TypeCheckingStarted) {
            self.decl_requests.insert(d, state);
        }
    }

    fn check_decl_members(&mut self, d: DeclId) {
        let kind = self.program.ast().decl(d).kind.clone();
        match kind {
            DeclKind::Product(p) => {
                self.environment_of(d);
                let inner = self.program.scope_introducing(d).expect("product scope");
                for m in self.program.decls_in(inner).to_vec() {
                    self.check_decl(m);
                }
                let model = self.self_type_of(d);
                let scope = self.program.decl_scope(d);
                self.check_conformance_list(d, &model, &p.conformances, scope);
            }
            DeclKind::Trait(_) => {
                self.environment_of(d);
                let inner = self.program.scope_introducing(d).expect("trait scope");
                for m in self.program.decls_in(inner).to_vec() {
                    self.check_decl(m);
                }
            }
            DeclKind::Conformance(c) => {
                if !c.constraints.is_empty() {
                    // Conditional conformance constraints are accepted
                    // without checking until symbolic evaluation lands.
                    let span = self.program.ast().decl(d).span;
                    self.report(TypeError::ConformanceConditionUnchecked { span });
                }
                let inner = self.program.scope_introducing(d).expect("conformance scope");
                for m in self.program.decls_in(inner).to_vec() {
                    self.check_decl(m);
                }
                let model = self.self_type_of(d);
                let scope = self.program.decl_scope(d);
                self.check_conformance_list(d, &model, &c.conformances, scope);
            }
            DeclKind::Extension(_) => {
                let inner = self.program.scope_introducing(d).expect("extension scope");
                for m in self.program.decls_in(inner).to_vec() {
                    self.check_decl(m);
                }
            }
            DeclKind::Namespace(n) => {
                for m in n.members {
                    self.check_decl(m);
                }
            }
            DeclKind::Function(f) => {
                self.environment_of(d);
                let output = match self.decl_types.get(&d) {
                    Some(Ty::Lambda(l)) => l.output.clone(),
                    _ => Ty::Error,
                };
                self.check_callable_body(f.body.as_ref(), output, None);
            }
            DeclKind::Initializer(i) => {
                self.environment_of(d);
                if let Some(body) = i.body {
                    self.return_type_stack.push(Ty::void());
                    self.check_stmt(body);
                    self.return_type_stack.pop();
                }
            }
            DeclKind::MethodBundle(m) => {
                self.environment_of(d);
                for i in m.impls {
                    self.check_decl(i);
                }
            }
            DeclKind::MethodImpl(mi) => {
                let output = match self.decl_types.get(&d) {
                    Some(Ty::Lambda(l)) => l.output.clone(),
                    _ => Ty::Error,
                };
                let mutating = matches!(mi.introducer, AccessEffect::Inout | AccessEffect::Set);
                self.check_callable_body(mi.body.as_ref(), output, mutating.then_some(()));
            }
            DeclKind::Subscript(s) => {
                self.environment_of(d);
                for i in s.impls {
                    self.check_decl(i);
                }
            }
            DeclKind::SubscriptImpl(si) => {
                let output = match self.decl_types.get(&d) {
                    Some(Ty::Subscript(s)) => s.output.clone(),
                    _ => Ty::Error,
                };
                if let Some(body) = si.body {
                    self.yield_type_stack.push(output.clone());
                    self.return_type_stack.push(output);
                    match body {
                        FunctionBody::Block(s) => self.check_stmt(s),
                        FunctionBody::Expr(e) => {
                            let expected = self.yield_type_stack.last().cloned();
                            self.check_expr(e, expected.as_ref(), Relation::Subtype);
                        }
                    }
                    self.return_type_stack.pop();
                    self.yield_type_stack.pop();
                }
            }
            // Leaf declarations are fully handled by realization.
            DeclKind::AssociatedType(_)
            | DeclKind::AssociatedValue(_)
            | DeclKind::GenericParameter(_)
            | DeclKind::Operator(_)
            | DeclKind::Parameter(_)
            | DeclKind::TypeAlias(_)
            | DeclKind::Var(_) => {}
            DeclKind::Binding(_) => unreachable!("bindings checked through their own path"),
        }
    }

    /// Check a function-like body against its declared output.
    fn check_callable_body(
        &mut self,
        body: Option<&FunctionBody>,
        output: Ty,
        mutating: Option<()>,
    ) {
        let Some(body) = body else { return };
        match body {
            FunctionBody::Block(s) => {
                self.return_type_stack.push(output);
                self.check_stmt(*s);
                self.return_type_stack.pop();
            }
            FunctionBody::Expr(e) => {
                if mutating.is_some() {
                    // A mutating variant must produce `(self, value)`.
                    let shape_ok = matches!(
                        (&self.program.ast().expr(*e).kind, &output),
                        (sable_ast::expr::ExprKind::Tuple(elems), Ty::Tuple(expected))
                            if elems.len() == expected.len()
                    );
                    if !shape_ok {
                        let span = self.program.ast().expr(*e).span;
                        self.report(TypeError::InvalidMethodBundleReturn { span });
                        return;
                    }
                }
                // A single-expression body may alternatively diverge;
                // the declared output is preferred by one penalty unit.
                let scope = self.program.expr_scope(*e);
                let span = self.program.ast().expr(*e).span;
                let mut obligations = Obligations::default();
                let ty = self.infer_expr(*e, Some(&output), &mut obligations);
                let origin = ConstraintOrigin::Return { span };
                obligations.constraints.push(Constraint::Disjunction {
                    choices: vec![
                        ConstraintChoice {
                            constraints: vec![Constraint::Subtyping {
                                sub: ty.clone(),
                                sup: output.clone(),
                                origin: origin.clone(),
                            }],
                            penalty: 0,
                        },
                        ConstraintChoice {
                            constraints: vec![Constraint::Equality {
                                lhs: ty.clone(),
                                rhs: Ty::never(),
                                origin,
                            }],
                            penalty: 1,
                        },
                    ],
                    origin: ConstraintOrigin::Return { span },
                });
                self.solve_and_commit(obligations, scope, span);
            }
        }
    }

    // ── Bindings ───────────────────────────────────────────────────────

    /// Infer and check a binding declaration, reifying the types of the
    /// variables its pattern introduces. Returns the binding's type.
    pub(crate) fn check_binding_decl(&mut self, d: DeclId) -> Ty {
        match self.request_state(d) {
            Some(DeclRequest::TypeRealizationStarted)
            | Some(DeclRequest::TypeCheckingStarted) => {
                let span = self.program.ast().decl(d).span;
                self.report(TypeError::CircularDependency { span });
                self.decl_types.insert(d, Ty::Error);
                self.decl_requests.insert(d, DeclRequest::Failure);
                return Ty::Error;
            }
            Some(_) => return self.decl_types.get(&d).cloned().unwrap_or(Ty::Error),
            None => {}
        }
        self.decl_requests.insert(d, DeclRequest::TypeRealizationStarted);
        self.bindings_under_checking.insert(d);
        let errors_before = self.errors.len();
        let ty = self.check_binding_inner(d);
        // The guard must drop on every exit path; the inner function
        // never early-returns past this point.
        self.bindings_under_checking.remove(&d);
        self.decl_types.insert(d, ty.clone());
        let failed = self.errors.len() != errors_before || ty.is_error();
        self.decl_requests.insert(
            d,
            if failed { DeclRequest::Failure } else { DeclRequest::Success },
        );
        ty
    }

    fn check_binding_inner(&mut self, d: DeclId) -> Ty {
        let binding = match self.program.ast().decl(d).kind.clone() {
            DeclKind::Binding(b) => b,
            _ => return Ty::Error,
        };
        let scope = self.program.decl_scope(d);
        let span = self.program.ast().decl(d).span;

        let mut obligations = Obligations::default();
        let mut var_shapes: Vec<(DeclId, Ty)> = Vec::new();
        let mut annotated = false;
        let shape = self.infer_pattern(
            binding.pattern,
            None,
            scope,
            &mut var_shapes,
            &mut annotated,
        );

        match binding.initializer {
            Some(init) => {
                let init_ty = self.infer_expr(init, Some(&shape), &mut obligations);
                let origin = ConstraintOrigin::Binding { span };
                let constraint = if annotated {
                    Constraint::Subtyping { sub: init_ty, sup: shape.clone(), origin }
                } else {
                    Constraint::Equality { lhs: init_ty, rhs: shape.clone(), origin }
                };
                obligations.constraints.push(constraint);
                let solution = self.solve_and_commit(obligations, scope, span);
                // Reify every declared variable under the solution.
                let mut failed = false;
                for (var, tentative) in var_shapes {
                    let mut reified = substitute_vars(tentative, &solution.assignments);
                    if reified.has_variable() {
                        failed = true;
                        reified = reified.transform(&mut |t| match t {
                            Ty::Var(_) => TransformAction::StepOver(Ty::Error),
                            _ => TransformAction::StepInto,
                        });
                    }
                    self.decl_types.insert(var, reified);
                }
                let reified = substitute_vars(shape, &solution.assignments);
                if failed || !solution.errors.is_empty() {
                    return reified;
                }
                reified
            }
            None => {
                if !annotated || shape.has_variable() {
                    self.report(TypeError::ExpectedTypeAnnotation { span });
                    for (var, _) in var_shapes {
                        self.decl_types.insert(var, Ty::Error);
                    }
                    return Ty::Error;
                }
                for (var, ty) in var_shapes {
                    self.decl_types.insert(var, ty);
                }
                shape
            }
        }
    }

    /// The shape type of a pattern: annotations stay authoritative,
    /// names get tentative variables, tuples recurse.
    fn infer_pattern(
        &mut self,
        p: PatId,
        expected: Option<&Ty>,
        scope: ScopeId,
        var_shapes: &mut Vec<(DeclId, Ty)>,
        annotated: &mut bool,
    ) -> Ty {
        let kind = self.program.ast().pat(p).kind.clone();
        match kind {
            PatKind::Binding(b) => {
                let expected_here = match b.annotation {
                    Some(ann) => {
                        *annotated = true;
                        Some(self.realize_type_expr(ann, scope))
                    }
                    None => expected.cloned(),
                };
                self.infer_pattern(
                    b.subpattern,
                    expected_here.as_ref(),
                    scope,
                    var_shapes,
                    annotated,
                )
            }
            PatKind::Name(n) => {
                let ty = match expected {
                    Some(t) => t.clone(),
                    None => self.fresh_var(),
                };
                var_shapes.push((n.var, ty.clone()));
                ty
            }
            PatKind::Tuple(elems) => {
                let parts: Vec<Option<Ty>> = match expected {
                    Some(Ty::Tuple(ex)) if ex.len() == elems.len() => {
                        ex.iter().map(|e| Some(e.ty.clone())).collect()
                    }
                    _ => vec![None; elems.len()],
                };
                let mut out = Vec::new();
                for (el, part) in elems.iter().zip(parts) {
                    let ty = self.infer_pattern(
                        el.pattern,
                        part.as_ref(),
                        scope,
                        var_shapes,
                        annotated,
                    );
                    out.push(TupleElem { label: el.label.clone(), ty });
                }
                Ty::Tuple(out)
            }
            PatKind::Wildcard => match expected {
                Some(t) => t.clone(),
                None => self.fresh_var(),
            },
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    pub(crate) fn check_stmt(&mut self, s: StmtId) {
        let kind = self.program.ast().stmt(s).kind.clone();
        let span = self.program.ast().stmt(s).span;
        match kind {
            StmtKind::Brace(children) => {
                for c in children {
                    self.check_stmt(c);
                }
            }
            StmtKind::Assign { left, right } => {
                let left_ty = self.check_expr(left, None, Relation::None);
                let scope = self.program.expr_scope(right);
                let rspan = self.program.ast().expr(right).span;
                let mut obligations = Obligations::default();
                let right_ty = self.infer_expr(right, Some(&left_ty), &mut obligations);
                obligations.constraints.push(Constraint::Subtyping {
                    sub: right_ty,
                    sup: left_ty.clone(),
                    origin: ConstraintOrigin::Structural { span },
                });
                // The target must be sinkable to receive a new value.
                if let Some(sinkable) = self.core_trait("Sinkable", scope) {
                    obligations.constraints.push(Constraint::Conformance {
                        subject: left_ty,
                        traits: vec![sinkable],
                        origin: ConstraintOrigin::Structural { span },
                    });
                }
                self.solve_and_commit(obligations, scope, rspan);
            }
            StmtKind::While { conditions, body } => {
                for c in &conditions {
                    self.check_condition(c);
                }
                self.check_stmt(body);
            }
            StmtKind::DoWhile { body, condition } => {
                self.check_stmt(body);
                self.check_condition(&ConditionItem::Expr(condition));
            }
            StmtKind::Return { value } => {
                let expected = self.return_type_stack.last().cloned();
                match (value, expected) {
                    (Some(v), Some(ret)) => {
                        self.check_expr(v, Some(&ret), Relation::Subtype);
                    }
                    (Some(v), None) => {
                        self.check_expr(v, None, Relation::None);
                    }
                    (None, Some(ret)) => {
                        if !ret.is_void() && !ret.has_error() {
                            self.report(TypeError::MissingReturnValue { span });
                        }
                    }
                    (None, None) => {}
                }
            }
            StmtKind::Yield { value } => {
                let expected = self.yield_type_stack.last().cloned();
                match expected {
                    Some(out) => {
                        self.check_expr(value, Some(&out), Relation::Subtype);
                    }
                    None => {
                        self.check_expr(value, None, Relation::None);
                    }
                }
            }
            StmtKind::Discard { expr } => {
                self.check_expr(expr, None, Relation::None);
            }
            StmtKind::Decl(d) => self.check_decl(d),
            StmtKind::Expr(e) => {
                let ty = self.check_expr(e, None, Relation::None);
                if !ty.is_void() && !ty.is_never() && !ty.has_error() {
                    let espan = self.program.ast().expr(e).span;
                    self.report(TypeError::UnusedResult { ty, span: espan });
                }
            }
        }
    }

    fn check_condition(&mut self, c: &ConditionItem) {
        match c {
            ConditionItem::Expr(e) => {
                let scope = self.program.expr_scope(*e);
                let bool_ty = self.core_type("Bool", scope);
                match bool_ty {
                    Some(b) => {
                        self.check_expr(*e, Some(&b), Relation::Equal);
                    }
                    None => {
                        self.check_expr(*e, None, Relation::None);
                    }
                }
            }
            ConditionItem::Decl(d) => {
                self.check_binding_decl(*d);
            }
        }
    }
}
