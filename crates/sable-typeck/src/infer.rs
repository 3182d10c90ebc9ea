//! Constraint generation: one walk over an expression tree emitting
//! typing constraints for the solver.
//!
//! The walker carries an optional expected type propagated top-down and
//! records a (possibly variable-carrying) type for every visited
//! expression. Late obligations (lambda bodies, block branches) are
//! queued as deferred queries and run after the solver commits.

use rustc_hash::FxHashMap;
use sable_ast::decl::DeclKind;
use sable_ast::expr::{
    Branch, CallExpr, CastDirection, ConditionItem, ExprKind, LabeledArgument,
};
use sable_ast::{DeclId, ExprId, OperatorNotation, ScopeId, StmtId};
use sable_common::Span;

use crate::constraint::{Constraint, OverloadCandidate};
use crate::error::{ConstraintOrigin, TypeError};
use crate::resolve::Parent;
use crate::ty::{CallableParam, LambdaTy, Ty};
use crate::{DeclRef, FoldedSequence, TypeChecker};

/// Everything one generation pass produces for the solver.
#[derive(Debug, Default)]
pub(crate) struct Obligations {
    pub constraints: Vec<Constraint>,
    pub expr_types: FxHashMap<ExprId, Ty>,
    /// Name bindings fixed during generation (unique candidates).
    pub bindings: FxHashMap<ExprId, DeclRef>,
    pub deferred: Vec<DeferredQuery>,
}

/// A typing obligation scheduled during generation and resolved after
/// the solver returns.
#[derive(Clone, Debug)]
pub(crate) enum DeferredQuery {
    /// Check the body of a lambda's underlying declaration.
    CheckLambda { decl: DeclId, body_checked: bool },
    /// Check a block branch of a conditional.
    CheckBrace { stmt: StmtId },
}

impl Obligations {
    pub(crate) fn assign(&mut self, e: ExprId, ty: Ty) -> Ty {
        self.expr_types.insert(e, ty.clone());
        ty
    }
}

impl<'p> TypeChecker<'p> {
    /// Infer a type for `e`, emitting constraints into `obligations`.
    pub(crate) fn infer_expr(
        &mut self,
        e: ExprId,
        expected: Option<&Ty>,
        obligations: &mut Obligations,
    ) -> Ty {
        let span = self.program.ast().expr(e).span;
        if self.should_trace(span) {
            tracing::debug!(expr = %e, expected = ?expected.map(|t| t.to_string()),
                "generating constraints");
        }
        let kind = self.program.ast().expr(e).kind.clone();
        let ty = match kind {
            ExprKind::BooleanLiteral(_) => {
                self.infer_literal(e, "Bool", None, expected, span, obligations)
            }
            ExprKind::IntegerLiteral(_) => self.infer_literal(
                e,
                "Int",
                Some("ExpressibleByIntegerLiteral"),
                expected,
                span,
                obligations,
            ),
            ExprKind::FloatLiteral(_) => self.infer_literal(
                e,
                "Double",
                Some("ExpressibleByFloatLiteral"),
                expected,
                span,
                obligations,
            ),
            ExprKind::StringLiteral(_) => self.infer_literal(
                e,
                "String",
                Some("ExpressibleByStringLiteral"),
                expected,
                span,
                obligations,
            ),
            ExprKind::Name(_) => self.infer_name(e, obligations),
            ExprKind::Call(call) => self.infer_call(&call, obligations, span),
            ExprKind::SubscriptCall(call) => {
                self.infer_subscript_call(&call, obligations, span)
            }
            ExprKind::Lambda(l) => self.infer_lambda(l.decl, expected, obligations, span),
            ExprKind::Cast(c) => {
                let scope = self.program.expr_scope(e);
                let target = self.realize_type_expr(c.target, scope);
                let subject = self.infer_expr(c.subject, None, obligations);
                let origin = ConstraintOrigin::Cast { span };
                match c.direction {
                    CastDirection::Up => {
                        obligations.constraints.push(Constraint::Subtyping {
                            sub: subject,
                            sup: target.clone(),
                            origin,
                        });
                    }
                    CastDirection::Down => {}
                    CastDirection::Pointer => {
                        obligations.constraints.push(Constraint::Equality {
                            lhs: subject,
                            rhs: Ty::Builtin(crate::ty::BuiltinTy::Ptr),
                            origin,
                        });
                    }
                }
                target
            }
            ExprKind::Inout(i) => self.infer_expr(i.subject, expected, obligations),
            ExprKind::Sequence(s) => {
                let scope = self.program.expr_scope(e);
                let folded = self.fold_sequence(s.head, &s.tail, scope);
                self.folded_sequence_exprs.insert(e, folded.clone());
                self.infer_folded(&folded, obligations)
            }
            ExprKind::Tuple(elems) => {
                let expected_elems: Vec<Option<Ty>> = match expected {
                    Some(Ty::Tuple(ex)) if ex.len() == elems.len() => {
                        ex.iter().map(|el| Some(el.ty.clone())).collect()
                    }
                    _ => vec![None; elems.len()],
                };
                let mut out = Vec::new();
                for (el, ex) in elems.iter().zip(expected_elems) {
                    let ty = self.infer_expr(el.value, ex.as_ref(), obligations);
                    out.push(crate::ty::TupleElem { label: el.label.clone(), ty });
                }
                Ty::Tuple(out)
            }
            ExprKind::Conditional(c) => {
                self.infer_conditional(e, &c.conditions, &c.success, c.failure.as_ref(),
                    expected, obligations, span)
            }
        };
        obligations.assign(e, ty)
    }

    // ── Literals ───────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn infer_literal(
        &mut self,
        e: ExprId,
        core_name: &str,
        trait_name: Option<&str>,
        expected: Option<&Ty>,
        span: Span,
        obligations: &mut Obligations,
    ) -> Ty {
        let scope = self.program.expr_scope(e);
        let default = match self.core_type(core_name, scope) {
            Some(t) => t,
            None => {
                self.report(TypeError::UndefinedName {
                    name: core_name.to_string(),
                    span,
                });
                return Ty::Error;
            }
        };
        match expected {
            Some(expected) if !expected.has_error() => {
                let literal_trait = trait_name.and_then(|n| self.core_trait(n, scope));
                let subject = expected.clone();
                obligations.constraints.push(Constraint::Literal {
                    subject: subject.clone(),
                    default,
                    literal_trait,
                    origin: ConstraintOrigin::Literal { span },
                });
                subject
            }
            _ => default,
        }
    }

    /// A core type by unqualified lookup from the module root.
    pub(crate) fn core_type(&mut self, name: &str, scope: ScopeId) -> Option<Ty> {
        let found = self.lookup_unqualified(name, scope);
        for d in found {
            if let Ty::Metatype(t) = self.realize_decl(d) {
                return Some(*t);
            }
        }
        None
    }

    /// A core trait by name, if one is in scope.
    pub(crate) fn core_trait(&mut self, name: &str, scope: ScopeId) -> Option<DeclId> {
        let found = self.lookup_unqualified(name, scope);
        found.into_iter().find(|&d| {
            matches!(self.program.ast().decl(d).kind, DeclKind::Trait(_))
        })
    }

    // ── Names ──────────────────────────────────────────────────────────

    fn infer_name(&mut self, e: ExprId, obligations: &mut Obligations) -> Ty {
        let (root_domain, components) = self.name_components(e);
        let mut parent = match root_domain {
            Some(base) => {
                let base_ty = self.infer_expr(base, None, obligations);
                Parent::Type(base_ty)
            }
            None => Parent::None,
        };

        let mut last_ty = Ty::Error;
        let mut index = 0;
        while index < components.len() {
            let comp = components[index];
            let scope = self.program.expr_scope(comp);
            let span = self.program.ast().expr(comp).span;
            let name = match &self.program.ast().expr(comp).kind {
                ExprKind::Name(n) => n.identifier.clone(),
                _ => String::new(),
            };

            // A variable-typed parent cannot be searched; the solver
            // finishes through member constraints.
            let parent_is_variable =
                matches!(&parent, Parent::Type(t) if t.has_variable());
            if parent_is_variable {
                break;
            }
            if matches!(&parent, Parent::Type(t) if t.has_error()) {
                for &rest in &components[index..] {
                    obligations.assign(rest, Ty::Error);
                }
                return Ty::Error;
            }

            let candidates = self.candidates_for(comp, &parent, scope);
            match candidates.len() {
                0 => {
                    self.report(TypeError::UndefinedName { name, span });
                    for &rest in &components[index..] {
                        obligations.assign(rest, Ty::Error);
                    }
                    return Ty::Error;
                }
                1 if !candidates[0].ty.shape.has_variable() => {
                    let candidate = &candidates[0];
                    obligations
                        .constraints
                        .extend(candidate.ty.constraints.iter().cloned());
                    obligations.bindings.insert(comp, candidate.reference.clone());
                    last_ty = obligations.assign(comp, candidate.ty.shape.clone());
                    parent = self.threaded_parent(candidate);
                    index += 1;
                }
                _ => {
                    let member_ty = self.fresh_var();
                    let overload_candidates = candidates
                        .into_iter()
                        .map(|c| OverloadCandidate {
                            reference: c.reference,
                            ty: c.ty.shape,
                            constraints: c.ty.constraints,
                            penalty: 0,
                        })
                        .collect();
                    obligations.constraints.push(Constraint::Overload {
                        name: comp,
                        member: member_ty.clone(),
                        candidates: overload_candidates,
                        origin: ConstraintOrigin::Member { span },
                    });
                    last_ty = obligations.assign(comp, member_ty.clone());
                    parent = Parent::Type(member_ty);
                    index += 1;
                    break;
                }
            }
        }

        // Unresolved suffix: one member constraint per component.
        while index < components.len() {
            let comp = components[index];
            let span = self.program.ast().expr(comp).span;
            let name = match &self.program.ast().expr(comp).kind {
                ExprKind::Name(n) => n.identifier.clone(),
                _ => String::new(),
            };
            let base = match &parent {
                Parent::Type(t) => t.clone(),
                _ => Ty::Error,
            };
            let member_ty = self.fresh_var();
            obligations.constraints.push(Constraint::Member {
                subject: comp,
                base,
                name,
                member: member_ty.clone(),
                origin: ConstraintOrigin::Member { span },
            });
            last_ty = obligations.assign(comp, member_ty.clone());
            parent = Parent::Type(member_ty);
            index += 1;
        }

        last_ty
    }

    // ── Calls ──────────────────────────────────────────────────────────

    fn infer_call(
        &mut self,
        call: &CallExpr,
        obligations: &mut Obligations,
        span: Span,
    ) -> Ty {
        let callee_ty = self.infer_expr(call.callee, None, obligations);
        match callee_ty {
            Ty::Error => Ty::Error,
            Ty::Var(_) => {
                let mut arguments = Vec::new();
                for a in &call.arguments {
                    let ty = self.infer_expr(a.value, None, obligations);
                    arguments.push(CallableParam { label: a.label.clone(), ty });
                }
                let output = self.fresh_var();
                obligations.constraints.push(Constraint::FunctionCall {
                    callee: callee_ty,
                    arguments,
                    output: output.clone(),
                    origin: ConstraintOrigin::Structural { span },
                });
                output
            }
            Ty::Lambda(l) => {
                self.apply_callable(&l.inputs, &l.output, &call.arguments, obligations, span)
            }
            Ty::Method(m) => {
                self.apply_callable(&m.inputs, &m.output, &call.arguments, obligations, span)
            }
            Ty::Metatype(instance) => {
                // Only a name naming a nominal type rewrites to `init`.
                let callee_is_name = matches!(
                    self.program.ast().expr(call.callee).kind,
                    ExprKind::Name(_)
                );
                if !callee_is_name {
                    self.report(TypeError::NotCallable {
                        ty: Ty::Metatype(instance),
                        span,
                    });
                    return Ty::Error;
                }
                self.infer_initializer_call(call, *instance, obligations, span)
            }
            other => {
                self.report(TypeError::NotCallable { ty: other, span });
                Ty::Error
            }
        }
    }

    /// Labels checked, arguments visited with parameter types expected.
    fn apply_callable(
        &mut self,
        inputs: &[CallableParam],
        output: &Ty,
        arguments: &[LabeledArgument],
        obligations: &mut Obligations,
        span: Span,
    ) -> Ty {
        if !self.check_labels(inputs, arguments, span) {
            return Ty::Error;
        }
        for (index, (a, p)) in arguments.iter().zip(inputs.iter()).enumerate() {
            let expected = p.ty.bare().clone();
            let arg_ty = self.infer_expr(a.value, Some(&expected), obligations);
            obligations.constraints.push(Constraint::Parameter {
                argument: arg_ty,
                parameter: p.ty.clone(),
                origin: ConstraintOrigin::Argument { span, index },
            });
        }
        output.clone()
    }

    fn check_labels(
        &mut self,
        inputs: &[CallableParam],
        arguments: &[LabeledArgument],
        span: Span,
    ) -> bool {
        let expected: Vec<Option<String>> =
            inputs.iter().map(|p| p.label.clone()).collect();
        let found: Vec<Option<String>> =
            arguments.iter().map(|a| a.label.clone()).collect();
        if expected.len() != found.len() {
            self.report(TypeError::ArityMismatch {
                expected: expected.len(),
                found: found.len(),
                span,
            });
            return false;
        }
        if expected != found {
            self.report(TypeError::LabelMismatch { expected, found, span });
            return false;
        }
        true
    }

    /// Rewrite `T(...)` as a call to an initializer of `T`.
    fn infer_initializer_call(
        &mut self,
        call: &CallExpr,
        instance: Ty,
        obligations: &mut Obligations,
        span: Span,
    ) -> Ty {
        let scope = self.program.expr_scope(call.callee);
        let inits = self.lookup_member(&instance, "init", scope);
        let mut candidates: Vec<(DeclId, LambdaTy)> = Vec::new();
        for d in inits {
            let realized = self.realize_decl(d);
            let Ty::Lambda(l) = realized else { continue };
            // Strip the `self: set Self` parameter: the caller provides
            // storage implicitly.
            let mut l = *l;
            if l.inputs.first().is_some_and(|p| p.label.as_deref() == Some("self")) {
                l.inputs.remove(0);
            }
            l.output = instance.clone();
            let constructor = Ty::Lambda(Box::new(l.clone()));
            // Constructors always open: the caller never shares the
            // product's generic scope.
            let (opened, _) = self.open(&constructor);
            if let Ty::Lambda(opened) = opened {
                // Label pre-filter keeps the overload set tight.
                let labels_match = opened.inputs.len() == call.arguments.len()
                    && opened
                        .inputs
                        .iter()
                        .zip(call.arguments.iter())
                        .all(|(p, a)| p.label == a.label);
                if labels_match {
                    candidates.push((d, *opened));
                }
            }
        }
        match candidates.len() {
            0 => {
                self.report(TypeError::UndefinedName { name: "init".into(), span });
                Ty::Error
            }
            1 => {
                let (d, constructor) = candidates.pop().expect("just checked length");
                obligations.bindings.insert(call.callee, DeclRef::Member(d));
                obligations
                    .assign(call.callee, Ty::Lambda(Box::new(constructor.clone())));
                self.apply_callable(
                    &constructor.inputs,
                    &constructor.output,
                    &call.arguments,
                    obligations,
                    span,
                )
            }
            _ => {
                let member_ty = self.fresh_var();
                let output = self.fresh_var();
                let overload = candidates
                    .into_iter()
                    .map(|(d, l)| OverloadCandidate {
                        reference: DeclRef::Member(d),
                        ty: Ty::Lambda(Box::new(l)),
                        constraints: Vec::new(),
                        penalty: 0,
                    })
                    .collect();
                obligations.constraints.push(Constraint::Overload {
                    name: call.callee,
                    member: member_ty.clone(),
                    candidates: overload,
                    origin: ConstraintOrigin::Member { span },
                });
                obligations.assign(call.callee, member_ty.clone());
                let mut arguments = Vec::new();
                for a in &call.arguments {
                    let ty = self.infer_expr(a.value, None, obligations);
                    arguments.push(CallableParam { label: a.label.clone(), ty });
                }
                obligations.constraints.push(Constraint::FunctionCall {
                    callee: member_ty,
                    arguments,
                    output: output.clone(),
                    origin: ConstraintOrigin::Structural { span },
                });
                output
            }
        }
    }

    fn infer_subscript_call(
        &mut self,
        call: &CallExpr,
        obligations: &mut Obligations,
        span: Span,
    ) -> Ty {
        let callee_ty = self.infer_expr(call.callee, None, obligations);
        match callee_ty {
            Ty::Error => Ty::Error,
            Ty::Var(_) => {
                let mut arguments = Vec::new();
                for a in &call.arguments {
                    let ty = self.infer_expr(a.value, None, obligations);
                    arguments.push(CallableParam { label: a.label.clone(), ty });
                }
                let output = self.fresh_var();
                obligations.constraints.push(Constraint::FunctionCall {
                    callee: callee_ty,
                    arguments,
                    output: output.clone(),
                    origin: ConstraintOrigin::Structural { span },
                });
                output
            }
            Ty::Subscript(s) => {
                self.apply_callable(&s.inputs, &s.output, &call.arguments, obligations, span)
            }
            Ty::Metatype(_) => {
                // Buffer-type sugar is a placeholder until symbolic
                // evaluation exists.
                self.report(TypeError::UnsupportedBufferType { span });
                Ty::Error
            }
            other => {
                self.report(TypeError::NotCallable { ty: other, span });
                Ty::Error
            }
        }
    }

    // ── Lambdas ────────────────────────────────────────────────────────

    fn infer_lambda(
        &mut self,
        decl: DeclId,
        expected: Option<&Ty>,
        obligations: &mut Obligations,
        span: Span,
    ) -> Ty {
        let f = match self.program.ast().decl(decl).kind.clone() {
            DeclKind::Function(f) => f,
            _ => return Ty::Error,
        };
        let expected_lambda = match expected {
            Some(Ty::Lambda(l)) => Some((**l).clone()),
            _ => None,
        };
        if let Some(el) = &expected_lambda {
            if el.inputs.len() != f.parameters.len() {
                self.report(TypeError::ArityMismatch {
                    expected: el.inputs.len(),
                    found: f.parameters.len(),
                    span,
                });
                return Ty::Error;
            }
        }

        // Seed parameter types: declared annotations stay authoritative,
        // missing ones take the caller-supplied parameter types or fresh
        // variables.
        let mut inputs = Vec::new();
        for (index, &p) in f.parameters.iter().enumerate() {
            let pd = match &self.program.ast().decl(p).kind {
                DeclKind::Parameter(pd) => pd.clone(),
                _ => continue,
            };
            let ty = match pd.annotation {
                Some(ann) => {
                    let scope = self.program.decl_scope(p);
                    let bare = self.realize_type_expr(ann, scope);
                    Ty::param(pd.convention, bare)
                }
                None => match expected_lambda.as_ref().map(|el| &el.inputs[index].ty) {
                    Some(expected_param) => expected_param.clone(),
                    None => Ty::param(pd.convention, self.fresh_var()),
                },
            };
            self.decl_types.insert(p, ty.clone());
            self.decl_requests
                .insert(p, crate::DeclRequest::TypeRealizationCompleted);
            inputs.push(CallableParam { label: pd.label.clone(), ty });
        }

        let declared_output = f.output.map(|out| {
            let scope = self.program.scope_introducing(decl).expect("lambda scope");
            self.realize_type_expr(out, scope)
        });
        let output = match (&declared_output, &expected_lambda) {
            (Some(out), _) => out.clone(),
            (None, Some(el)) => el.output.clone(),
            (None, None) => self.fresh_var(),
        };

        let environment = {
            let mut elems = self.capture_environment_for_lambda(&f.explicit_captures);
            if self.program.is_local(decl) {
                elems.extend(self.collect_implicit_captures(decl));
            }
            Ty::Tuple(elems)
        };

        let lambda_ty = Ty::Lambda(Box::new(LambdaTy {
            receiver_effect: f.receiver_effect,
            environment,
            inputs,
            output: output.clone(),
        }));
        self.decl_types.insert(decl, lambda_ty.clone());
        self.decl_requests
            .insert(decl, crate::DeclRequest::TypeRealizationCompleted);

        // A single-expression body with unknown return is constrained
        // against the lambda's output inside this system; block bodies
        // are checked after solving.
        let mut body_checked = false;
        if declared_output.is_none() {
            if let Some(sable_ast::decl::FunctionBody::Expr(body)) = f.body {
                let body_ty = self.infer_expr(body, Some(&output), obligations);
                obligations.constraints.push(Constraint::Equality {
                    lhs: body_ty,
                    rhs: output.clone(),
                    origin: ConstraintOrigin::Return { span },
                });
                body_checked = true;
            }
        }
        obligations
            .deferred
            .push(DeferredQuery::CheckLambda { decl, body_checked });

        if let Some(expected) = expected {
            obligations.constraints.push(Constraint::Equality {
                lhs: lambda_ty.clone(),
                rhs: expected.clone(),
                origin: ConstraintOrigin::Structural { span },
            });
        }
        lambda_ty
    }

    fn capture_environment_for_lambda(
        &mut self,
        captures: &[DeclId],
    ) -> Vec<crate::ty::TupleElem> {
        use sable_ast::pat::PatKind;
        let mut elems = Vec::new();
        for &b in captures {
            let introducer = match &self.program.ast().decl(b).kind {
                DeclKind::Binding(bd) => match &self.program.ast().pat(bd.pattern).kind {
                    PatKind::Binding(bp) => bp.introducer,
                    _ => sable_ast::BindingIntroducer::Let,
                },
                _ => continue,
            };
            self.realize_decl(b);
            for &var in self.program.vars_of_binding(b).to_vec().iter() {
                let name = match &self.program.ast().decl(var).kind {
                    DeclKind::Var(v) => v.name.clone(),
                    _ => continue,
                };
                let var_ty = self.decl_types.get(&var).cloned().unwrap_or(Ty::Error);
                let elem_ty = match introducer.capture_effect() {
                    Some(access) => Ty::Remote { access, bare: Box::new(var_ty) },
                    None => var_ty,
                };
                elems.push(crate::ty::TupleElem { label: Some(name), ty: elem_ty });
            }
        }
        elems
    }

    // ── Conditionals ───────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn infer_conditional(
        &mut self,
        e: ExprId,
        conditions: &[ConditionItem],
        success: &Branch,
        failure: Option<&Branch>,
        expected: Option<&Ty>,
        obligations: &mut Obligations,
        span: Span,
    ) -> Ty {
        let scope = self.program.expr_scope(e);
        let bool_ty = self.core_type("Bool", scope);
        for c in conditions {
            match c {
                ConditionItem::Expr(cond) => {
                    let ty = self.infer_expr(*cond, bool_ty.as_ref(), obligations);
                    if let Some(b) = &bool_ty {
                        obligations.constraints.push(Constraint::Equality {
                            lhs: ty,
                            rhs: b.clone(),
                            origin: ConstraintOrigin::Condition { span },
                        });
                    }
                }
                ConditionItem::Decl(d) => {
                    self.check_binding_decl(*d);
                }
            }
        }

        match (success, failure) {
            (Branch::Expr(then), Some(Branch::Expr(els))) => {
                let merged = self.fresh_var();
                let then_ty = self.infer_expr(*then, expected, obligations);
                let else_ty = self.infer_expr(*els, expected, obligations);
                obligations.constraints.push(Constraint::Equality {
                    lhs: then_ty,
                    rhs: merged.clone(),
                    origin: ConstraintOrigin::Structural { span },
                });
                obligations.constraints.push(Constraint::Equality {
                    lhs: else_ty,
                    rhs: merged.clone(),
                    origin: ConstraintOrigin::Structural { span },
                });
                merged
            }
            _ => {
                // Block branches check independently after solving.
                for branch in std::iter::once(success).chain(failure) {
                    match branch {
                        Branch::Expr(b) => {
                            self.infer_expr(*b, None, obligations);
                        }
                        Branch::Block(s) => {
                            obligations.deferred.push(DeferredQuery::CheckBrace { stmt: *s });
                        }
                    }
                }
                Ty::void()
            }
        }
    }

    // ── Sequence folding ───────────────────────────────────────────────

    /// Fold an infix chain into a binary tree by operator precedence.
    pub(crate) fn fold_sequence(
        &mut self,
        head: ExprId,
        tail: &[sable_ast::expr::SequenceTail],
        scope: ScopeId,
    ) -> FoldedSequence {
        let mut cursor = 0;
        self.fold_with_precedence(
            FoldedSequence::Leaf(head),
            tail,
            &mut cursor,
            sable_ast::PrecedenceGroup::Assignment,
            scope,
        )
    }

    fn operator_name(&self, op: ExprId) -> String {
        match &self.program.ast().expr(op).kind {
            ExprKind::Name(n) => n.identifier.clone(),
            _ => String::new(),
        }
    }

    fn precedence_of(&mut self, op: ExprId, scope: ScopeId) -> sable_ast::PrecedenceGroup {
        let name = self.operator_name(op);
        match self.lookup_operator(&name, OperatorNotation::Infix, scope) {
            Some(d) => self.operator_precedence(d),
            None => {
                let span = self.program.ast().expr(op).span;
                self.report(TypeError::UndefinedOperator { name, span });
                sable_ast::PrecedenceGroup::Addition
            }
        }
    }

    fn fold_with_precedence(
        &mut self,
        mut lhs: FoldedSequence,
        tail: &[sable_ast::expr::SequenceTail],
        cursor: &mut usize,
        min_precedence: sable_ast::PrecedenceGroup,
        scope: ScopeId,
    ) -> FoldedSequence {
        while *cursor < tail.len() {
            let op = tail[*cursor].operator;
            let precedence = self.precedence_of(op, scope);
            if precedence < min_precedence {
                break;
            }
            let operand = tail[*cursor].operand;
            *cursor += 1;
            let mut rhs = FoldedSequence::Leaf(operand);
            while *cursor < tail.len() {
                let next = tail[*cursor].operator;
                let next_precedence = self.precedence_of(next, scope);
                if next_precedence > precedence {
                    rhs = self.fold_with_precedence(rhs, tail, cursor, next_precedence, scope);
                } else {
                    break;
                }
            }
            lhs = FoldedSequence::Node {
                operator: op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        lhs
    }

    /// Constraints for a folded tree: the left operand's operator member
    /// is the callee, the right operand its single argument.
    fn infer_folded(&mut self, tree: &FoldedSequence, obligations: &mut Obligations) -> Ty {
        match tree {
            FoldedSequence::Leaf(e) => self.infer_expr(*e, None, obligations),
            FoldedSequence::Node { operator, lhs, rhs } => {
                let span = self.program.ast().expr(*operator).span;
                let lhs_ty = self.infer_folded(lhs, obligations);
                let rhs_ty = self.infer_folded(rhs, obligations);
                let name = self.operator_name(*operator);
                let callee = self.fresh_var();
                obligations.constraints.push(Constraint::Member {
                    subject: *operator,
                    base: lhs_ty,
                    name,
                    member: callee.clone(),
                    origin: ConstraintOrigin::Operator { span },
                });
                obligations.assign(*operator, callee.clone());
                let output = self.fresh_var();
                obligations.constraints.push(Constraint::FunctionCall {
                    callee,
                    arguments: vec![CallableParam { label: None, ty: rhs_ty }],
                    output: output.clone(),
                    origin: ConstraintOrigin::Operator { span },
                });
                output
            }
        }
    }
}
