//! The constraint solver.
//!
//! Solving explores disjunctions depth-first with branch-and-bound over
//! `(error count, penalty sum)`, using the unification table's snapshot
//! machinery to roll branches back. Constraints that cannot make
//! progress yet (a member lookup on a still-unknown base, a literal
//! waiting for context) are postponed and retried; literals then
//! default, and leftovers surface as "not enough context".

use std::collections::VecDeque;

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;
use sable_ast::{ExprId, ScopeId};
use sable_common::Span;

use crate::constraint::{Constraint, ConstraintChoice};
use crate::error::{ConstraintOrigin, TypeError};
use crate::infer::{DeferredQuery, Obligations};
use crate::subst::substitute_vars;
use crate::ty::{CallableParam, TransformAction, Ty, TyVar};
use crate::{DeclRef, DeclRequest, TypeChecker};

/// The outcome of a solver run: variable assignments, name bindings,
/// and the diagnostics of the chosen branch.
#[derive(Clone, Debug, Default)]
pub(crate) struct Solution {
    pub assignments: FxHashMap<TyVar, Ty>,
    pub bindings: FxHashMap<ExprId, DeclRef>,
    pub errors: Vec<TypeError>,
    pub penalties: u32,
}

impl Solution {
    fn score(&self) -> (usize, u32) {
        (self.errors.len(), self.penalties)
    }
}

/// Mutable per-branch state, cloned at each disjunction.
#[derive(Clone, Debug, Default)]
struct BranchState {
    work: VecDeque<Constraint>,
    postponed: Vec<Constraint>,
    errors: Vec<TypeError>,
    penalties: u32,
    bindings: FxHashMap<ExprId, DeclRef>,
    defaults_applied: bool,
    finalized: bool,
}

struct Solver<'a, 'p> {
    tc: &'a mut TypeChecker<'p>,
    table: InPlaceUnificationTable<TyVar>,
    scope: ScopeId,
    trace: bool,
}

impl<'p> TypeChecker<'p> {
    /// Solve the obligations of one expression tree and commit the best
    /// solution: reified expression types, resolved referents, solver
    /// diagnostics, and deferred queries.
    pub(crate) fn solve_and_commit(
        &mut self,
        obligations: Obligations,
        scope: ScopeId,
        span: Span,
    ) -> Solution {
        let trace = self.should_trace(span);
        let mut solver =
            Solver { tc: self, table: InPlaceUnificationTable::new(), scope, trace };
        solver.ensure_keys();
        let mut state = BranchState::default();
        state.work.extend(obligations.constraints.iter().cloned());
        let solution = solver.solve(state);
        if trace {
            tracing::debug!(
                errors = solution.errors.len(),
                penalties = solution.penalties,
                "solution chosen"
            );
        }
        self.commit_solution(&obligations, &solution);
        solution
    }

    fn commit_solution(&mut self, obligations: &Obligations, solution: &Solution) {
        // Reify every inferred expression type under the solution.
        let had_errors = !solution.errors.is_empty();
        let mut unresolved: Vec<(ExprId, Span)> = Vec::new();
        for (&e, ty) in &obligations.expr_types {
            let mut reified = substitute_vars(ty.clone(), &solution.assignments);
            if reified.has_variable() {
                if !had_errors {
                    unresolved.push((e, self.program.ast().expr(e).span));
                }
                reified = reified.transform(&mut |t| match t {
                    Ty::Var(_) => TransformAction::StepOver(Ty::Error),
                    _ => TransformAction::StepInto,
                });
            }
            self.expr_types.insert(e, reified);
        }
        // Stable order for the not-enough-context reports.
        unresolved.sort_by_key(|&(e, _)| e);
        for (_, span) in unresolved {
            self.report(TypeError::NotEnoughContext { span });
        }

        for (&e, reference) in &obligations.bindings {
            self.referred_decls.insert(e, reference.clone());
        }
        for (&e, reference) in &solution.bindings {
            self.referred_decls.insert(e, reference.clone());
        }
        for err in &solution.errors {
            self.report(err.clone());
        }

        // Drain deferred queries with the solution in hand.
        for query in &obligations.deferred {
            match query {
                DeferredQuery::CheckLambda { decl, body_checked } => {
                    if let Some(ty) = self.decl_types.get(decl).cloned() {
                        let reified = substitute_vars(ty, &solution.assignments);
                        self.decl_types.insert(*decl, reified);
                    }
                    let params: Vec<sable_ast::DeclId> =
                        match &self.program.ast().decl(*decl).kind {
                            sable_ast::decl::DeclKind::Function(f) => f.parameters.clone(),
                            _ => Vec::new(),
                        };
                    for p in params {
                        if let Some(ty) = self.decl_types.get(&p).cloned() {
                            let reified = substitute_vars(ty, &solution.assignments);
                            self.decl_types.insert(p, reified);
                        }
                    }
                    if *body_checked {
                        self.decl_requests.insert(*decl, DeclRequest::Success);
                    } else {
                        self.check_decl(*decl);
                    }
                }
                DeferredQuery::CheckBrace { stmt } => {
                    self.check_stmt(*stmt);
                }
            }
        }
    }
}

/// What discharging one constraint produced.
enum Step {
    Done,
    Postpone(Constraint),
    Branch(Vec<ConstraintChoice>, Option<BindingPlan>),
}

/// A name binding attached to each choice of a branch.
#[derive(Clone)]
struct BindingPlan {
    expr: ExprId,
    references: Vec<DeclRef>,
}

impl<'a, 'p> Solver<'a, 'p> {
    fn ensure_keys(&mut self) {
        while self.table.len() < self.tc.next_var as usize {
            self.table.new_key(None);
        }
    }

    /// Substitute solved variables into a type, following the table.
    fn resolve(&mut self, ty: Ty) -> Ty {
        self.ensure_keys();
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            other => {
                let mut resolved_children: Vec<(TyVar, Ty)> = Vec::new();
                let scanned = other.transform(&mut |t| {
                    if let Ty::Var(v) = t {
                        resolved_children.push((*v, Ty::Var(*v)));
                    }
                    TransformAction::StepInto
                });
                if resolved_children.is_empty() {
                    return scanned;
                }
                let mut map = FxHashMap::default();
                for (v, _) in resolved_children {
                    let r = self.resolve(Ty::Var(v));
                    map.insert(v, r);
                }
                substitute_vars(scanned, &map)
            }
        }
    }

    /// Bind a result variable to `Error` so downstream reification does
    /// not mistake a sunk failure for missing context.
    fn sink_error(&mut self, ty: Ty) {
        if let Ty::Var(v) = self.resolve(ty) {
            self.table
                .unify_var_value(v, Some(Ty::Error))
                .expect("binding an unbound variable cannot fail");
        }
    }

    fn occurs(&mut self, v: TyVar, ty: &Ty) -> bool {
        let root = self.table.find(v);
        let mut found = false;
        let _ = ty.clone().transform(&mut |t| {
            if let Ty::Var(other) = t {
                if self.table.find(*other) == root {
                    found = true;
                }
            }
            TransformAction::StepInto
        });
        found
    }

    // ── Exploration ────────────────────────────────────────────────────

    fn solve(&mut self, mut state: BranchState) -> Solution {
        loop {
            self.ensure_keys();
            let Some(constraint) = state.work.pop_front() else {
                if self.retry_postponed(&mut state) {
                    continue;
                }
                return self.finish(state);
            };
            if self.trace {
                tracing::trace!(constraint = %constraint, "solving");
            }
            match self.discharge(constraint, &mut state) {
                Step::Done => {}
                Step::Postpone(c) => state.postponed.push(c),
                Step::Branch(choices, binding) => {
                    return self.explore(choices, binding, state);
                }
            }
        }
    }

    fn explore(
        &mut self,
        choices: Vec<ConstraintChoice>,
        binding: Option<BindingPlan>,
        state: BranchState,
    ) -> Solution {
        let mut best: Option<Solution> = None;
        for (index, choice) in choices.into_iter().enumerate() {
            // Branch-and-bound: a branch cannot beat a perfect solution.
            if let Some(b) = &best {
                if b.score() == (state.errors.len(), state.penalties) {
                    break;
                }
            }
            let snapshot = self.table.snapshot();
            let mut child = state.clone();
            child.penalties += choice.penalty;
            if let Some(plan) = &binding {
                child.bindings.insert(plan.expr, plan.references[index].clone());
            }
            for c in choice.constraints {
                child.work.push_back(c);
            }
            let candidate = self.solve(child);
            self.table.rollback_to(snapshot);
            let better = match &best {
                None => true,
                // Strict comparison keeps the first discovery on ties.
                Some(b) => candidate.score() < b.score(),
            };
            if better {
                best = Some(candidate);
            }
        }
        best.unwrap_or_default()
    }

    /// Move postponed constraints whose scrutinee became known back to
    /// the worklist; then default literals; then degrade leftover
    /// subtyping to equality. Returns whether any progress was made.
    fn retry_postponed(&mut self, state: &mut BranchState) -> bool {
        if state.postponed.is_empty() {
            return false;
        }
        let postponed = std::mem::take(&mut state.postponed);
        let mut moved = false;
        for c in postponed {
            if self.is_ready(&c) {
                state.work.push_back(c);
                moved = true;
            } else {
                state.postponed.push(c);
            }
        }
        if moved {
            return true;
        }

        if !state.defaults_applied {
            state.defaults_applied = true;
            let postponed = std::mem::take(&mut state.postponed);
            for c in postponed {
                match c {
                    Constraint::Literal { subject, default, literal_trait, origin } => {
                        let resolved = self.resolve(subject);
                        if let Ty::Var(_) = resolved {
                            state.work.push_back(Constraint::Equality {
                                lhs: resolved,
                                rhs: default,
                                origin,
                            });
                        } else {
                            state.work.push_back(Constraint::Literal {
                                subject: resolved,
                                default,
                                literal_trait,
                                origin,
                            });
                        }
                        moved = true;
                    }
                    other => state.postponed.push(other),
                }
            }
            if moved {
                return true;
            }
        }

        if !state.finalized {
            state.finalized = true;
            let postponed = std::mem::take(&mut state.postponed);
            for c in postponed {
                match c {
                    Constraint::Subtyping { sub, sup, origin } => {
                        state.work.push_back(Constraint::Equality {
                            lhs: sub,
                            rhs: sup,
                            origin,
                        });
                        moved = true;
                    }
                    other => state.postponed.push(other),
                }
            }
            if moved {
                return true;
            }
        }

        // Whatever is left has no way to make progress.
        let postponed = std::mem::take(&mut state.postponed);
        for c in postponed {
            match c {
                // An unconstrained predicate or literal is fine.
                Constraint::Predicate { .. } | Constraint::Literal { .. } => {}
                other => {
                    state
                        .errors
                        .push(TypeError::NotEnoughContext { span: other.origin().span() });
                }
            }
        }
        true
    }

    fn is_ready(&mut self, c: &Constraint) -> bool {
        let gate = match c {
            Constraint::Member { base, .. } => base.clone(),
            Constraint::FunctionCall { callee, .. } => callee.clone(),
            Constraint::Parameter { parameter, .. } => parameter.clone(),
            Constraint::Conformance { subject, .. } => subject.clone(),
            Constraint::Literal { subject, .. } => subject.clone(),
            Constraint::Subtyping { sub, sup, .. } => {
                let sup = self.resolve(sup.clone());
                if matches!(sup, Ty::Var(_)) {
                    return false;
                }
                // A sum supertype cannot decide membership until the
                // subtype is fully known.
                let ast = self.tc.program.ast();
                if matches!(crate::relations::canonical(&sup, ast), Ty::Sum(_)) {
                    return !self.resolve(sub.clone()).has_variable();
                }
                return true;
            }
            _ => return true,
        };
        !matches!(self.resolve(gate), Ty::Var(_))
    }

    fn finish(&mut self, state: BranchState) -> Solution {
        let mut assignments = FxHashMap::default();
        for index in 0..self.table.len() as u32 {
            let v = TyVar(index);
            let resolved = self.resolve(Ty::Var(v));
            let still_unbound =
                matches!(&resolved, Ty::Var(root) if self.table.find(v) == *root);
            if !still_unbound {
                assignments.insert(v, resolved);
            }
        }
        Solution {
            assignments,
            bindings: state.bindings,
            errors: state.errors,
            penalties: state.penalties,
        }
    }

    // ── Discharge ──────────────────────────────────────────────────────

    fn discharge(&mut self, constraint: Constraint, state: &mut BranchState) -> Step {
        match constraint {
            Constraint::Equality { lhs, rhs, origin } => {
                let lhs = self.resolve(lhs);
                let rhs = self.resolve(rhs);
                self.unify(lhs, rhs, &origin, state);
                Step::Done
            }
            Constraint::Subtyping { sub, sup, origin } => {
                self.discharge_subtyping(sub, sup, origin, state)
            }
            Constraint::Parameter { argument, parameter, origin } => {
                let parameter = self.resolve(parameter);
                match parameter {
                    Ty::Var(_) => Step::Postpone(Constraint::Parameter {
                        argument,
                        parameter,
                        origin,
                    }),
                    Ty::Param { convention, bare } => {
                        use sable_ast::AccessEffect::*;
                        let next = match convention {
                            Let | Sink => Constraint::Subtyping {
                                sub: argument,
                                sup: *bare,
                                origin,
                            },
                            Inout | Set | Yielded => Constraint::Equality {
                                lhs: argument,
                                rhs: *bare,
                                origin,
                            },
                        };
                        state.work.push_back(next);
                        Step::Done
                    }
                    Ty::Error => Step::Done,
                    other => {
                        state.work.push_back(Constraint::Equality {
                            lhs: argument,
                            rhs: other,
                            origin,
                        });
                        Step::Done
                    }
                }
            }
            Constraint::Conformance { subject, traits, origin } => {
                let resolved = self.resolve(subject);
                match resolved {
                    Ty::Var(_) => Step::Postpone(Constraint::Conformance {
                        subject: resolved,
                        traits,
                        origin,
                    }),
                    Ty::Error => Step::Done,
                    subject => {
                        let conformed = self.tc.conformed_traits(&subject, self.scope);
                        let registered = |t: &sable_ast::DeclId| {
                            let canonical = self.tc.canonical(&subject);
                            self.tc.relations.contains(&canonical, *t)
                        };
                        for t in &traits {
                            if !conformed.contains(t) && !registered(t) {
                                state.errors.push(TypeError::TraitNotSatisfied {
                                    ty: subject.clone(),
                                    trait_name: self.tc.trait_name(*t),
                                    origin: origin.clone(),
                                });
                            }
                        }
                        Step::Done
                    }
                }
            }
            Constraint::FunctionCall { callee, arguments, output, origin } => {
                self.discharge_call(callee, arguments, output, origin, state)
            }
            Constraint::Member { subject, base, name, member, origin } => {
                self.discharge_member(subject, base, name, member, origin, state)
            }
            Constraint::Overload { name, member, candidates, origin } => {
                let mut choices = Vec::new();
                let mut references = Vec::new();
                for c in candidates {
                    let mut constraints = vec![Constraint::Equality {
                        lhs: member.clone(),
                        rhs: c.ty,
                        origin: origin.clone(),
                    }];
                    constraints.extend(c.constraints);
                    choices.push(ConstraintChoice { constraints, penalty: c.penalty });
                    references.push(c.reference);
                }
                Step::Branch(choices, Some(BindingPlan { expr: name, references }))
            }
            Constraint::Disjunction { choices, .. } => Step::Branch(choices, None),
            Constraint::Literal { subject, default, literal_trait, origin } => {
                // Literals wait for another source to fix their type;
                // `retry_postponed` applies defaults at the end.
                let resolved = self.resolve(subject);
                match resolved {
                    Ty::Var(_) => Step::Postpone(Constraint::Literal {
                        subject: resolved,
                        default,
                        literal_trait,
                        origin,
                    }),
                    Ty::Error => Step::Done,
                    concrete => {
                        let ast = self.tc.program.ast();
                        if crate::relations::equivalent(&concrete, &default, ast) {
                            return Step::Done;
                        }
                        match literal_trait {
                            Some(t) => {
                                state.work.push_back(Constraint::Conformance {
                                    subject: concrete,
                                    traits: vec![t],
                                    origin,
                                });
                            }
                            None => {
                                state.errors.push(TypeError::Mismatch {
                                    expected: default,
                                    found: concrete,
                                    origin,
                                });
                            }
                        }
                        Step::Done
                    }
                }
            }
            Constraint::Predicate { .. } => Step::Done,
        }
    }

    fn discharge_subtyping(
        &mut self,
        sub: Ty,
        sup: Ty,
        origin: ConstraintOrigin,
        state: &mut BranchState,
    ) -> Step {
        let sub = self.resolve(sub);
        let sup = self.resolve(sup);
        if sub.is_error() || sup.is_error() {
            return Step::Done;
        }
        if matches!(sup, Ty::Any) {
            return Step::Done;
        }
        if sub.is_never() {
            return Step::Done;
        }
        if let Ty::Var(_) = sup {
            return Step::Postpone(Constraint::Subtyping { sub, sup, origin });
        }
        let ast = self.tc.program.ast();
        if crate::relations::equivalent(&sub, &sup, ast) {
            return Step::Done;
        }
        if let Ty::Sum(elems) = &self.tc.canonical(&sup) {
            let canonical_sub = self.tc.canonical(&sub);
            match &canonical_sub {
                Ty::Sum(sub_elems) => {
                    if sub_elems.iter().all(|e| elems.contains(e)) {
                        return Step::Done;
                    }
                }
                other => {
                    if elems.contains(other) {
                        return Step::Done;
                    }
                    if other.has_variable() {
                        return Step::Postpone(Constraint::Subtyping { sub, sup, origin });
                    }
                }
            }
            state.errors.push(TypeError::Mismatch { expected: sup, found: sub, origin });
            return Step::Done;
        }
        // No other strict supertypes exist; fall back to unification.
        self.unify(sub, sup, &origin, state);
        Step::Done
    }

    fn discharge_call(
        &mut self,
        callee: Ty,
        arguments: Vec<CallableParam>,
        output: Ty,
        origin: ConstraintOrigin,
        state: &mut BranchState,
    ) -> Step {
        let callee = self.resolve(callee);
        let (inputs, callee_output) = match &callee {
            Ty::Var(_) => {
                return Step::Postpone(Constraint::FunctionCall {
                    callee,
                    arguments,
                    output,
                    origin,
                })
            }
            Ty::Error => {
                self.sink_error(output);
                return Step::Done;
            }
            Ty::Lambda(l) => (l.inputs.clone(), l.output.clone()),
            Ty::Method(m) => (m.inputs.clone(), m.output.clone()),
            Ty::Subscript(s) => (s.inputs.clone(), s.output.clone()),
            other => {
                state.errors.push(TypeError::NotCallable {
                    ty: other.clone(),
                    span: origin.span(),
                });
                self.sink_error(output);
                return Step::Done;
            }
        };
        if inputs.len() != arguments.len() {
            state.errors.push(TypeError::ArityMismatch {
                expected: inputs.len(),
                found: arguments.len(),
                span: origin.span(),
            });
            return Step::Done;
        }
        let labels_ok = inputs
            .iter()
            .zip(arguments.iter())
            .all(|(p, a)| p.label == a.label);
        if !labels_ok {
            state.errors.push(TypeError::LabelMismatch {
                expected: inputs.iter().map(|p| p.label.clone()).collect(),
                found: arguments.iter().map(|a| a.label.clone()).collect(),
                span: origin.span(),
            });
            return Step::Done;
        }
        for (a, p) in arguments.into_iter().zip(inputs.into_iter()) {
            state.work.push_back(Constraint::Parameter {
                argument: a.ty,
                parameter: p.ty,
                origin: origin.clone(),
            });
        }
        state.work.push_back(Constraint::Equality {
            lhs: output,
            rhs: callee_output,
            origin,
        });
        Step::Done
    }

    fn discharge_member(
        &mut self,
        subject: ExprId,
        base: Ty,
        name: String,
        member: Ty,
        origin: ConstraintOrigin,
        state: &mut BranchState,
    ) -> Step {
        let base = self.resolve(base);
        match base {
            Ty::Var(_) => Step::Postpone(Constraint::Member {
                subject,
                base,
                name,
                member,
                origin,
            }),
            Ty::Error => {
                self.sink_error(member);
                Step::Done
            }
            base => {
                let found = self.tc.lookup_member(&base, &name, self.scope);
                let mut choices = Vec::new();
                let mut references = Vec::new();
                for d in found {
                    let realized = self.tc.realize_decl(d);
                    if realized.is_error() {
                        continue;
                    }
                    let bare = realized.bare().clone();
                    let (shape, _) = self.tc.instantiate(&bare, self.scope);
                    choices.push(ConstraintChoice {
                        constraints: vec![Constraint::Equality {
                            lhs: member.clone(),
                            rhs: shape,
                            origin: origin.clone(),
                        }],
                        penalty: 0,
                    });
                    references.push(DeclRef::Member(d));
                }
                match choices.len() {
                    0 => {
                        state.errors.push(TypeError::UndefinedName {
                            name,
                            span: origin.span(),
                        });
                        Step::Done
                    }
                    1 => {
                        state.bindings.insert(subject, references.remove(0));
                        let choice = choices.remove(0);
                        for c in choice.constraints {
                            state.work.push_back(c);
                        }
                        Step::Done
                    }
                    _ => Step::Branch(
                        choices,
                        Some(BindingPlan { expr: subject, references }),
                    ),
                }
            }
        }
    }

    // ── Unification ────────────────────────────────────────────────────

    fn unify(&mut self, a: Ty, b: Ty, origin: &ConstraintOrigin, state: &mut BranchState) {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a == b {
            return;
        }
        match (a, b) {
            (Ty::Error, _) | (_, Ty::Error) => {}
            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table
                    .unify_var_var(v1, v2)
                    .expect("unifying two unbound variables cannot fail");
            }
            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs(v, &ty) {
                    state.errors.push(TypeError::InfiniteType {
                        ty,
                        origin: origin.clone(),
                    });
                } else {
                    self.table
                        .unify_var_value(v, Some(ty))
                        .expect("binding an unbound variable cannot fail");
                }
            }
            (Ty::Lambda(l1), Ty::Lambda(l2)) => {
                let (l1, l2) = (*l1, *l2);
                if l1.inputs.len() != l2.inputs.len() {
                    state.errors.push(TypeError::ArityMismatch {
                        expected: l1.inputs.len(),
                        found: l2.inputs.len(),
                        span: origin.span(),
                    });
                    return;
                }
                let labels_ok = l1
                    .inputs
                    .iter()
                    .zip(l2.inputs.iter())
                    .all(|(p, q)| p.label == q.label);
                if !labels_ok || l1.receiver_effect != l2.receiver_effect {
                    state.errors.push(TypeError::Mismatch {
                        expected: Ty::Lambda(Box::new(l1)),
                        found: Ty::Lambda(Box::new(l2)),
                        origin: origin.clone(),
                    });
                    return;
                }
                for (p, q) in l1.inputs.into_iter().zip(l2.inputs.into_iter()) {
                    self.unify(p.ty, q.ty, origin, state);
                }
                self.unify(l1.environment, l2.environment, origin, state);
                self.unify(l1.output, l2.output, origin, state);
            }
            (
                Ty::Param { convention: c1, bare: b1 },
                Ty::Param { convention: c2, bare: b2 },
            ) => {
                if c1 != c2 {
                    state.errors.push(TypeError::Mismatch {
                        expected: Ty::Param { convention: c1, bare: b1 },
                        found: Ty::Param { convention: c2, bare: b2 },
                        origin: origin.clone(),
                    });
                    return;
                }
                self.unify(*b1, *b2, origin, state);
            }
            (Ty::Remote { access: a1, bare: b1 }, Ty::Remote { access: a2, bare: b2 }) => {
                if a1 != a2 {
                    state.errors.push(TypeError::Mismatch {
                        expected: Ty::Remote { access: a1, bare: b1 },
                        found: Ty::Remote { access: a2, bare: b2 },
                        origin: origin.clone(),
                    });
                    return;
                }
                self.unify(*b1, *b2, origin, state);
            }
            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                if e1.len() != e2.len()
                    || e1.iter().zip(e2.iter()).any(|(x, y)| x.label != y.label)
                {
                    state.errors.push(TypeError::Mismatch {
                        expected: Ty::Tuple(e1),
                        found: Ty::Tuple(e2),
                        origin: origin.clone(),
                    });
                    return;
                }
                for (x, y) in e1.into_iter().zip(e2.into_iter()) {
                    self.unify(x.ty, y.ty, origin, state);
                }
            }
            (
                Ty::BoundGeneric { base: base1, arguments: args1 },
                Ty::BoundGeneric { base: base2, arguments: args2 },
            ) => {
                if args1.len() != args2.len() {
                    state.errors.push(TypeError::Mismatch {
                        expected: Ty::BoundGeneric { base: base1, arguments: args1 },
                        found: Ty::BoundGeneric { base: base2, arguments: args2 },
                        origin: origin.clone(),
                    });
                    return;
                }
                self.unify(*base1, *base2, origin, state);
                for (x, y) in args1.into_iter().zip(args2.into_iter()) {
                    use crate::ty::TyArg;
                    match (x, y) {
                        (TyArg::Type(t1), TyArg::Type(t2)) => {
                            self.unify(t1, t2, origin, state)
                        }
                        (TyArg::Value(v1), TyArg::Value(v2)) if v1 == v2 => {}
                        (x, y) => {
                            let _ = (x, y);
                            state.errors.push(TypeError::InvalidConstraint {
                                span: origin.span(),
                            });
                        }
                    }
                }
            }
            (Ty::Metatype(t1), Ty::Metatype(t2)) => self.unify(*t1, *t2, origin, state),
            (
                Ty::AssocType { decl: d1, domain: dom1 },
                Ty::AssocType { decl: d2, domain: dom2 },
            ) if d1 == d2 => {
                self.unify(*dom1, *dom2, origin, state);
            }
            (a, b) => {
                // Alias unfolding may still reveal equality.
                let ast = self.tc.program.ast();
                if crate::relations::equivalent(&a, &b, ast) {
                    return;
                }
                state.errors.push(TypeError::Mismatch {
                    expected: a,
                    found: b,
                    origin: origin.clone(),
                });
            }
        }
    }
}
