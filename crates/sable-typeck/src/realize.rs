//! Declaration realization: computing overarching types.
//!
//! Realization answers "what is the type of the entity this declaration
//! introduces" without entering bodies. Every request is memoized
//! through the per-declaration request state; re-entry while a
//! realization is in flight is a circular dependency.

use sable_ast::decl::{DeclKind, FunctionDecl, MethodBundleDecl, SubscriptDecl};
use sable_ast::tyexpr::{TypeArgExpr, TypeExprKind};
use sable_ast::{AccessEffect, DeclId, ScopeId, ScopeKind, TypeExprId};

use crate::error::TypeError;
use crate::relations::generic_param_count;
use crate::ty::{
    CallableParam, CapabilitySet, LambdaTy, MethodTy, SubscriptTy, TupleElem, Ty, TyArg,
};
use crate::{DeclRequest, TypeChecker};

impl<'p> TypeChecker<'p> {
    /// Realize the overarching type of a declaration.
    pub fn realize_decl(&mut self, d: DeclId) -> Ty {
        // Bindings and their variables have no realize/check split:
        // realizing either runs the binding check.
        match &self.program.ast().decl(d).kind {
            DeclKind::Binding(_) => return self.check_binding_decl(d),
            DeclKind::Var(_) => {
                if let Some(ty) = self.decl_types.get(&d) {
                    return ty.clone();
                }
                if let Some(b) = self.program.var_to_binding(d) {
                    self.check_binding_decl(b);
                }
                return self.decl_types.get(&d).cloned().unwrap_or(Ty::Error);
            }
            _ => {}
        }

        match self.request_state(d) {
            Some(DeclRequest::TypeRealizationStarted) => {
                let span = self.program.ast().decl(d).span;
                self.report(TypeError::CircularDependency { span });
                self.decl_types.insert(d, Ty::Error);
                self.decl_requests.insert(d, DeclRequest::Failure);
                return Ty::Error;
            }
            Some(_) => {
                return self.decl_types.get(&d).cloned().unwrap_or(Ty::Error);
            }
            None => {}
        }

        self.decl_requests.insert(d, DeclRequest::TypeRealizationStarted);
        let ty = self.compute_overarching_type(d);
        if self.request_state(d) == Some(DeclRequest::TypeRealizationStarted) {
            self.decl_types.insert(d, ty.clone());
            self.decl_requests.insert(d, DeclRequest::TypeRealizationCompleted);
            ty
        } else {
            // A nested cycle already recorded a failure for `d`.
            self.decl_types.get(&d).cloned().unwrap_or(Ty::Error)
        }
    }

    fn compute_overarching_type(&mut self, d: DeclId) -> Ty {
        let kind = self.program.ast().decl(d).kind.clone();
        match kind {
            DeclKind::AssociatedType(_) => {
                let domain = self.enclosing_trait_self(d);
                Ty::Metatype(Box::new(Ty::AssocType { decl: d, domain: Box::new(domain) }))
            }
            DeclKind::AssociatedValue(_) => {
                let domain = self.enclosing_trait_self(d);
                Ty::Metatype(Box::new(Ty::AssocValue { decl: d, domain: Box::new(domain) }))
            }
            DeclKind::GenericParameter(g) => {
                let scope = self.program.decl_scope(d);
                if g.annotations.is_empty() {
                    return Ty::Metatype(Box::new(Ty::GenericTypeParam(d)));
                }
                let first = self.realize_type_expr(g.annotations[0], scope);
                if matches!(first, Ty::Trait(_)) {
                    // A trait bound makes this a type parameter; the
                    // bound itself lands in the generic environment.
                    Ty::Metatype(Box::new(Ty::GenericTypeParam(d)))
                } else {
                    if g.annotations.len() > 1 {
                        let span = self.program.ast().decl(d).span;
                        self.report(TypeError::InvalidConstraint { span });
                        return Ty::Error;
                    }
                    // A value parameter has the type of its annotation.
                    first
                }
            }
            DeclKind::Conformance(c) => {
                let scope = self.program.decl_scope(d);
                let subject = self.realize_type_expr(c.subject, scope);
                self.reject_builtin_extension(&subject, d);
                Ty::Metatype(Box::new(subject))
            }
            DeclKind::Extension(e) => {
                let scope = self.program.decl_scope(d);
                let subject = self.realize_type_expr(e.subject, scope);
                self.reject_builtin_extension(&subject, d);
                Ty::Metatype(Box::new(subject))
            }
            DeclKind::Function(f) => self.realize_function(d, &f),
            DeclKind::Initializer(_) => self.realize_initializer(d),
            DeclKind::MethodBundle(m) => self.realize_method_bundle(d, &m),
            DeclKind::MethodImpl(_) => self.realize_method_variant(d),
            DeclKind::Subscript(s) => self.realize_subscript(d, &s),
            DeclKind::SubscriptImpl(_) => {
                // Variants share the bundle's type; they are reached
                // through the subscript declaration.
                self.parent_subscript_type(d)
            }
            DeclKind::Product(_) => Ty::Metatype(Box::new(Ty::Product(d))),
            DeclKind::Trait(_) => Ty::Metatype(Box::new(Ty::Trait(d))),
            DeclKind::TypeAlias(a) => {
                let inner = self.program.scope_introducing(d).expect("alias has a scope");
                let aliased = self.realize_type_expr(a.aliased, inner);
                Ty::Metatype(Box::new(Ty::Alias { decl: d, aliased: Box::new(aliased) }))
            }
            DeclKind::Parameter(p) => {
                let scope = self.program.decl_scope(d);
                match p.annotation {
                    Some(ann) => {
                        let bare = self.realize_type_expr(ann, scope);
                        if bare.has_variable() {
                            let span = self.program.ast().decl(d).span;
                            self.report(TypeError::ExpectedTypeAnnotation { span });
                            return Ty::Error;
                        }
                        match bare {
                            already @ Ty::Param { .. } => already,
                            bare => Ty::param(p.convention, bare),
                        }
                    }
                    None => {
                        let span = self.program.ast().decl(d).span;
                        self.report(TypeError::ExpectedTypeAnnotation { span });
                        Ty::Error
                    }
                }
            }
            DeclKind::Namespace(_) | DeclKind::Operator(_) => Ty::Error,
            DeclKind::Binding(_) | DeclKind::Var(_) => {
                unreachable!("bindings are realized through their check")
            }
        }
    }

    fn reject_builtin_extension(&mut self, subject: &Ty, d: DeclId) {
        if matches!(subject, Ty::Builtin(_)) {
            let span = self.program.ast().decl(d).span;
            self.report(TypeError::CannotExtendBuiltin { span });
        }
    }

    /// The `Self` type parameter of the trait enclosing `d`.
    fn enclosing_trait_self(&mut self, d: DeclId) -> Ty {
        let scope = self.program.decl_scope(d);
        if let ScopeKind::Decl(owner) = self.program.scope_kind(scope) {
            if let Some(self_param) = self.program.trait_self(*owner) {
                return Ty::GenericTypeParam(self_param);
            }
        }
        Ty::Error
    }

    /// The instance type a type declaration denotes for itself.
    pub(crate) fn self_type_of(&mut self, d: DeclId) -> Ty {
        let kind = self.program.ast().decl(d).kind.clone();
        match kind {
            DeclKind::Product(p) => {
                let params: Vec<DeclId> =
                    p.generic.as_ref().map(|g| g.parameters.clone()).unwrap_or_default();
                if params.is_empty() {
                    Ty::Product(d)
                } else {
                    Ty::BoundGeneric {
                        base: Box::new(Ty::Product(d)),
                        arguments: params
                            .into_iter()
                            .map(|p| TyArg::Type(Ty::GenericTypeParam(p)))
                            .collect(),
                    }
                }
            }
            DeclKind::Trait(_) => match self.program.trait_self(d) {
                Some(sp) => Ty::GenericTypeParam(sp),
                None => Ty::Error,
            },
            DeclKind::Conformance(c) => {
                let scope = self.program.decl_scope(d);
                self.realize_type_expr(c.subject, scope)
            }
            DeclKind::Extension(e) => {
                let scope = self.program.decl_scope(d);
                self.realize_type_expr(e.subject, scope)
            }
            DeclKind::TypeAlias(_) => match self.realize_decl(d) {
                Ty::Metatype(inner) => *inner,
                _ => Ty::Error,
            },
            _ => Ty::Error,
        }
    }

    /// The receiver type of a member of `owner`, or `Error` outside a
    /// type scope.
    fn receiver_type(&mut self, member: DeclId) -> Ty {
        let scope = self.program.decl_scope(member);
        match self.program.innermost_type(scope) {
            Some(owner) => self.self_type_of(owner),
            None => Ty::Error,
        }
    }

    // ── Functions ──────────────────────────────────────────────────────

    /// Realize a parameter declaration, recording its type.
    pub(crate) fn realize_parameter(&mut self, p: DeclId) -> Ty {
        self.realize_decl(p)
    }

    fn check_duplicate_parameters(&mut self, params: &[DeclId]) {
        let mut seen: Vec<String> = Vec::new();
        for &p in params {
            let (name, span) = match &self.program.ast().decl(p).kind {
                DeclKind::Parameter(pd) => {
                    (pd.name.clone(), self.program.ast().decl(p).span)
                }
                _ => continue,
            };
            if seen.contains(&name) {
                self.report(TypeError::DuplicateParameterName { name, span });
            } else {
                seen.push(name);
            }
        }
    }

    fn realize_inputs(&mut self, params: &[DeclId]) -> Vec<CallableParam> {
        params
            .iter()
            .map(|&p| {
                let ty = self.realize_parameter(p);
                let label = match &self.program.ast().decl(p).kind {
                    DeclKind::Parameter(pd) => pd.label.clone(),
                    _ => None,
                };
                CallableParam { label, ty }
            })
            .collect()
    }

    /// The environment elements of explicit captures, in list order.
    fn capture_environment(&mut self, captures: &[DeclId]) -> Vec<TupleElem> {
        use sable_ast::pat::PatKind;
        let mut elems = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for &b in captures {
            let introducer = match &self.program.ast().decl(b).kind {
                DeclKind::Binding(bd) => match &self.program.ast().pat(bd.pattern).kind {
                    PatKind::Binding(bp) => bp.introducer,
                    _ => sable_ast::BindingIntroducer::Let,
                },
                _ => continue,
            };
            let ty = self.realize_decl(b);
            for &var in self.program.vars_of_binding(b).to_vec().iter() {
                let name = match &self.program.ast().decl(var).kind {
                    DeclKind::Var(v) => v.name.clone(),
                    _ => continue,
                };
                if seen.contains(&name) {
                    let span = self.program.ast().decl(b).span;
                    self.report(TypeError::DuplicateCaptureName { name: name.clone(), span });
                    continue;
                }
                seen.push(name.clone());
                let var_ty = self.decl_types.get(&var).cloned().unwrap_or(ty.clone());
                let elem_ty = match introducer.capture_effect() {
                    Some(access) => Ty::Remote { access, bare: Box::new(var_ty) },
                    None => var_ty,
                };
                elems.push(TupleElem { label: Some(name), ty: elem_ty });
            }
        }
        elems
    }

    /// The single-element receiver environment of a non-static member.
    fn receiver_environment(&mut self, member: DeclId, effect: AccessEffect) -> Ty {
        let receiver = self.receiver_type(member);
        let elem_ty = match effect {
            AccessEffect::Sink => receiver,
            access => Ty::Remote { access, bare: Box::new(receiver) },
        };
        Ty::Tuple(vec![TupleElem { label: Some("self".into()), ty: elem_ty }])
    }

    fn realize_function(&mut self, d: DeclId, f: &FunctionDecl) -> Ty {
        self.check_duplicate_parameters(&f.parameters);
        let inputs = self.realize_inputs(&f.parameters);
        let output = match f.output {
            Some(out) => {
                let scope = self.program.scope_introducing(d).expect("function scope");
                self.realize_type_expr(out, scope)
            }
            None => Ty::void(),
        };

        let environment = if self.program.is_non_static_member(d) {
            self.receiver_environment(d, f.receiver_effect.unwrap_or(AccessEffect::Let))
        } else {
            let mut elems = self.capture_environment(&f.explicit_captures);
            if self.program.is_local(d) {
                let implicit = self.collect_implicit_captures(d);
                elems.extend(implicit);
            }
            Ty::Tuple(elems)
        };

        Ty::Lambda(Box::new(LambdaTy {
            receiver_effect: if self.program.is_non_static_member(d) {
                Some(f.receiver_effect.unwrap_or(AccessEffect::Let))
            } else {
                None
            },
            environment,
            inputs,
            output,
        }))
    }

    fn realize_initializer(&mut self, d: DeclId) -> Ty {
        let kind = self.program.ast().decl(d).kind.clone();
        let DeclKind::Initializer(init) = kind else { return Ty::Error };
        let receiver = self.receiver_type(d);
        let self_param = CallableParam {
            label: Some("self".into()),
            ty: Ty::param(AccessEffect::Set, receiver),
        };
        let mut inputs = vec![self_param];
        if init.is_memberwise {
            // One `sink` parameter per stored binding, in order.
            let owner_scope = self.program.decl_scope(d);
            let members: Vec<DeclId> = self.program.decls_in(owner_scope).to_vec();
            for m in members {
                let is_stored = matches!(
                    &self.program.ast().decl(m).kind,
                    DeclKind::Binding(b) if !b.is_static
                );
                if !is_stored {
                    continue;
                }
                self.realize_decl(m);
                for &var in self.program.vars_of_binding(m).to_vec().iter() {
                    let name = match &self.program.ast().decl(var).kind {
                        DeclKind::Var(v) => v.name.clone(),
                        _ => continue,
                    };
                    let ty = self.decl_types.get(&var).cloned().unwrap_or(Ty::Error);
                    inputs.push(CallableParam {
                        label: Some(name),
                        ty: Ty::param(AccessEffect::Sink, ty),
                    });
                }
            }
        } else {
            self.check_duplicate_parameters(&init.parameters);
            inputs.extend(self.realize_inputs(&init.parameters));
        }
        Ty::Lambda(Box::new(LambdaTy {
            receiver_effect: None,
            environment: Ty::void(),
            inputs,
            output: Ty::void(),
        }))
    }

    fn realize_method_bundle(&mut self, d: DeclId, m: &MethodBundleDecl) -> Ty {
        self.check_duplicate_parameters(&m.parameters);
        let inputs = self.realize_inputs(&m.parameters);
        let output = match m.output {
            Some(out) => {
                let scope = self.program.scope_introducing(d).expect("bundle scope");
                self.realize_type_expr(out, scope)
            }
            None => Ty::void(),
        };
        let receiver = self.receiver_type(d);
        let mut capabilities = CapabilitySet::empty();
        for &i in &m.impls {
            if let DeclKind::MethodImpl(mi) = &self.program.ast().decl(i).kind {
                capabilities |= CapabilitySet::of(mi.introducer);
            }
        }
        Ty::Method(Box::new(MethodTy { capabilities, receiver, inputs, output }))
    }

    /// The variant lambda of one method implementation.
    fn realize_method_variant(&mut self, d: DeclId) -> Ty {
        let introducer = match &self.program.ast().decl(d).kind {
            DeclKind::MethodImpl(mi) => mi.introducer,
            _ => return Ty::Error,
        };
        // The enclosing bundle provides inputs and output.
        let bundle = match self.program.scope_kind(self.program.decl_scope(d)) {
            ScopeKind::Decl(b) => *b,
            _ => return Ty::Error,
        };
        let bundle_ty = match self.realize_decl(bundle) {
            Ty::Method(m) => *m,
            _ => return Ty::Error,
        };
        let environment = match introducer {
            AccessEffect::Sink => Ty::Tuple(vec![TupleElem {
                label: Some("self".into()),
                ty: bundle_ty.receiver.clone(),
            }]),
            access => Ty::Tuple(vec![TupleElem {
                label: Some("self".into()),
                ty: Ty::Remote { access, bare: Box::new(bundle_ty.receiver.clone()) },
            }]),
        };
        // Mutating variants yield back the receiver with the value.
        let output = match introducer {
            AccessEffect::Inout | AccessEffect::Set => Ty::Tuple(vec![
                TupleElem { label: None, ty: bundle_ty.receiver.clone() },
                TupleElem { label: None, ty: bundle_ty.output.clone() },
            ]),
            _ => bundle_ty.output.clone(),
        };
        Ty::Lambda(Box::new(LambdaTy {
            receiver_effect: Some(introducer),
            environment,
            inputs: bundle_ty.inputs,
            output,
        }))
    }

    fn realize_subscript(&mut self, d: DeclId, s: &SubscriptDecl) -> Ty {
        self.check_duplicate_parameters(&s.parameters);
        let inputs =
            if s.is_property { Vec::new() } else { self.realize_inputs(&s.parameters) };
        let scope = self.program.scope_introducing(d).expect("subscript scope");
        let output = self.realize_type_expr(s.output, scope);
        let mut capabilities = CapabilitySet::empty();
        for &i in &s.impls {
            if let DeclKind::SubscriptImpl(si) = &self.program.ast().decl(i).kind {
                capabilities |= CapabilitySet::of(si.introducer);
            }
        }
        let environment = if self.program.is_non_static_member(d) {
            self.receiver_environment(d, AccessEffect::Let)
        } else {
            Ty::Tuple(self.capture_environment(&s.explicit_captures))
        };
        Ty::Subscript(Box::new(SubscriptTy {
            is_property: s.is_property,
            capabilities,
            environment,
            inputs,
            output,
        }))
    }

    fn parent_subscript_type(&mut self, d: DeclId) -> Ty {
        match self.program.scope_kind(self.program.decl_scope(d)) {
            ScopeKind::Decl(s) => self.realize_decl(*s),
            _ => Ty::Error,
        }
    }

    // ── Type expressions ───────────────────────────────────────────────

    /// Realize the type denoted by a type expression.
    pub fn realize_type_expr(&mut self, t: TypeExprId, scope: ScopeId) -> Ty {
        let kind = self.program.ast().type_expr(t).kind.clone();
        let span = self.program.ast().type_expr(t).span;
        match kind {
            TypeExprKind::Name(n) => {
                let domain = match n.domain {
                    Some(dom) => Some(self.realize_type_expr(dom, scope)),
                    None => None,
                };
                self.realize_name_type(domain, &n.identifier, &n.arguments, scope, span)
            }
            TypeExprKind::Tuple(elems) => Ty::Tuple(
                elems
                    .iter()
                    .map(|e| TupleElem {
                        label: e.label.clone(),
                        ty: self.realize_type_expr(e.type_expr, scope),
                    })
                    .collect(),
            ),
            TypeExprKind::Lambda(l) => {
                let environment = match l.environment {
                    Some(env) => self.realize_type_expr(env, scope),
                    None => Ty::void(),
                };
                let inputs = l
                    .inputs
                    .iter()
                    .map(|p| CallableParam {
                        label: p.label.clone(),
                        ty: Ty::param(
                            p.convention,
                            self.realize_type_expr(p.type_expr, scope),
                        ),
                    })
                    .collect();
                let output = self.realize_type_expr(l.output, scope);
                Ty::Lambda(Box::new(LambdaTy {
                    receiver_effect: l.receiver_effect,
                    environment,
                    inputs,
                    output,
                }))
            }
            TypeExprKind::Parameter(p) => {
                let bare = self.realize_type_expr(p.bare, scope);
                Ty::param(p.convention, bare)
            }
            TypeExprKind::Lens(l) => {
                let subject = self.realize_type_expr(l.subject, scope);
                let lens = self.realize_type_expr(l.lens, scope);
                match lens {
                    Ty::Trait(td) => Ty::Lens { subject: Box::new(subject), lens: td },
                    found => {
                        if !found.has_error() {
                            self.report(TypeError::NonTraitType { found, span });
                        }
                        Ty::Error
                    }
                }
            }
        }
    }

    fn realize_name_type(
        &mut self,
        domain: Option<Ty>,
        identifier: &str,
        arguments: &[TypeArgExpr],
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Ty {
        let base = match domain {
            None => self.realize_unqualified_type_name(identifier, arguments, scope, span),
            Some(domain_ty) => {
                self.realize_member_type_name(domain_ty, identifier, scope, span)
            }
        };
        let base = match base {
            Some(t) => t,
            None => return Ty::Error,
        };
        self.apply_type_arguments(base, arguments, scope, span)
    }

    fn realize_unqualified_type_name(
        &mut self,
        identifier: &str,
        arguments: &[TypeArgExpr],
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Option<Ty> {
        let found = self.lookup_unqualified(identifier, scope);
        let mut types: Vec<Ty> = Vec::new();
        let mut value_hit = false;
        let mut error_hit = false;
        for d in found {
            match self.realize_decl(d) {
                Ty::Metatype(inner) => types.push(*inner),
                Ty::Error => error_hit = true,
                _ => value_hit = true,
            }
        }
        match types.len() {
            0 => {
                if error_hit {
                    // Diagnosed at the declaration already.
                    return None;
                }
                if value_hit {
                    self.report(TypeError::NameRefersToValue {
                        name: identifier.to_string(),
                        span,
                    });
                    return None;
                }
                self.realize_magic_type_name(identifier, arguments, scope, span)
            }
            1 => Some(types.pop().expect("just checked length")),
            _ => {
                self.report(TypeError::AmbiguousUse {
                    name: identifier.to_string(),
                    span,
                });
                None
            }
        }
    }

    fn realize_member_type_name(
        &mut self,
        domain: Ty,
        identifier: &str,
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Option<Ty> {
        if domain.has_error() {
            return None;
        }
        // `Builtin.<name>` goes through the builtin table.
        if matches!(domain, Ty::Builtin(crate::ty::BuiltinTy::Module)) {
            if let Some(b) = crate::ty::BuiltinTy::parse(identifier) {
                return Some(Ty::Builtin(b));
            }
            self.report(TypeError::UndefinedName { name: identifier.to_string(), span });
            return None;
        }
        let members = self.lookup_member(&domain, identifier, scope);
        let mut types: Vec<Ty> = Vec::new();
        let mut error_hit = false;
        for m in members {
            match &self.program.ast().decl(m).kind {
                DeclKind::AssociatedType(_) => {
                    // Re-anchor the projection at the given domain.
                    types.push(Ty::AssocType { decl: m, domain: Box::new(domain.clone()) });
                }
                _ => match self.realize_decl(m) {
                    Ty::Metatype(inner) => types.push(*inner),
                    Ty::Error => error_hit = true,
                    _ => {}
                },
            }
        }
        match types.len() {
            0 => {
                if !error_hit {
                    self.report(TypeError::UndefinedName {
                        name: identifier.to_string(),
                        span,
                    });
                }
                None
            }
            1 => {
                let ty = types.pop().expect("just checked length");
                // A projection out of a concrete domain resolves now.
                let resolved = self.resolve_projections(ty, scope);
                if let Ty::AssocType { domain, .. } = &resolved {
                    let concrete = !domain.has_generic_param()
                        && !domain.has_variable()
                        && !domain.has_skolem();
                    if concrete {
                        self.report(TypeError::InvalidUseOfAssociatedType {
                            name: identifier.to_string(),
                            span,
                        });
                        return None;
                    }
                }
                Some(resolved)
            }
            _ => {
                self.report(TypeError::AmbiguousUse { name: identifier.to_string(), span });
                None
            }
        }
    }

    fn realize_magic_type_name(
        &mut self,
        identifier: &str,
        arguments: &[TypeArgExpr],
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Option<Ty> {
        match identifier {
            "Any" => Some(Ty::Any),
            "Never" => Some(Ty::never()),
            "Builtin" if self.builtin_visible() => {
                Some(Ty::Builtin(crate::ty::BuiltinTy::Module))
            }
            "Metatype" => {
                let mut element = Ty::Any;
                if let Some(TypeArgExpr::Type(t)) = arguments.first() {
                    element = self.realize_type_expr(*t, scope);
                }
                Some(Ty::Metatype(Box::new(element)))
            }
            "Sum" => {
                let mut elems = Vec::new();
                for a in arguments {
                    match a {
                        TypeArgExpr::Type(t) => {
                            elems.push(self.realize_type_expr(*t, scope))
                        }
                        TypeArgExpr::Value(_) => {
                            self.report(TypeError::ValueInSumType { span });
                            return None;
                        }
                    }
                }
                match elems.len() {
                    0 => {
                        self.report(TypeError::SumTypeZeroElements { span });
                        Some(Ty::never())
                    }
                    1 => {
                        self.report(TypeError::SumTypeSingleElement { span });
                        None
                    }
                    _ => Some(Ty::Sum(elems)),
                }
            }
            "Self" => self.resolve_self(scope, span),
            _ => {
                self.report(TypeError::UndefinedName {
                    name: identifier.to_string(),
                    span,
                });
                None
            }
        }
    }

    /// Resolve the magic `Self` by walking outward to the first type
    /// scope.
    pub(crate) fn resolve_self(
        &mut self,
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Option<Ty> {
        match self.program.innermost_type(scope) {
            Some(owner) => Some(self.self_type_of(owner)),
            None => {
                self.report(TypeError::InvalidSelfReference { span });
                None
            }
        }
    }

    /// Apply static arguments to a realized base type.
    pub(crate) fn apply_type_arguments(
        &mut self,
        base: Ty,
        arguments: &[TypeArgExpr],
        scope: ScopeId,
        span: sable_common::Span,
    ) -> Ty {
        if arguments.is_empty() {
            return base;
        }
        // Magic names consumed their arguments during resolution.
        if matches!(base, Ty::Sum(_) | Ty::Metatype(_) | Ty::Any | Ty::Builtin(_)) {
            return base;
        }
        if base.is_never() {
            return base;
        }
        let Some(head) = self.head_decl(&base) else {
            self.report(TypeError::InvalidGenericArgumentCount {
                expected: 0,
                found: arguments.len(),
                span,
            });
            return Ty::Error;
        };
        let expected = generic_param_count(self.program.ast(), head);
        if expected != arguments.len() {
            self.report(TypeError::InvalidGenericArgumentCount {
                expected,
                found: arguments.len(),
                span,
            });
            return Ty::Error;
        }
        let args = arguments
            .iter()
            .map(|a| match a {
                TypeArgExpr::Type(t) => TyArg::Type(self.realize_type_expr(*t, scope)),
                TypeArgExpr::Value(e) => TyArg::Value(*e),
            })
            .collect();
        Ty::BoundGeneric { base: Box::new(base), arguments: args }
    }
}
