//! Conformance checking: matching trait requirements against members of
//! a conforming type and maintaining the registry.

use rustc_hash::FxHashMap;
use sable_ast::decl::DeclKind;
use sable_ast::{DeclId, ScopeId, TypeExprId};
use sable_common::Span;

use crate::error::TypeError;
use crate::relations::{equivalent, Conformance};
use crate::ty::Ty;
use crate::TypeChecker;

impl<'p> TypeChecker<'p> {
    /// Check a declared conformance list and register each proven
    /// conformance. `source` is the declaration carrying the list,
    /// `model` the conforming type.
    pub(crate) fn check_conformance_list(
        &mut self,
        source: DeclId,
        model: &Ty,
        conformances: &[TypeExprId],
        scope: ScopeId,
    ) {
        for &listed in conformances {
            let span = self.program.ast().type_expr(listed).span;
            // Realize where the list was written; generic parameters of
            // the subject stay in scope there.
            let listed_scope = self.program.type_expr_scope(listed);
            let realized = self.realize_type_expr(listed, listed_scope);
            let trait_decl = match realized {
                Ty::Trait(t) => t,
                found => {
                    if !found.has_error() {
                        self.report(TypeError::ConformanceToNonTrait { found, span });
                    }
                    continue;
                }
            };
            self.check_one_conformance(source, model, trait_decl, scope, span);
        }
    }

    fn check_one_conformance(
        &mut self,
        source: DeclId,
        model: &Ty,
        trait_decl: DeclId,
        scope: ScopeId,
        span: Span,
    ) {
        let canonical_model = self.canonical(model);
        self.check_requirements(&canonical_model, trait_decl, scope, span);

        let conformance = Conformance {
            model: canonical_model,
            trait_decl,
            source,
            scope,
            span,
        };
        let program = self.program;
        let result = self.relations.insert(conformance, |a, b| {
            program.scopes_from(a).any(|s| s == b)
                || program.scopes_from(b).any(|s| s == a)
        });
        if let Err(previous) = result {
            let trait_name = self.trait_name(trait_decl);
            self.report(TypeError::RedundantConformance { trait_name, span, previous });
        }
    }

    /// Match every requirement of `trait_decl` against a member of the
    /// model, under `Self := model`.
    fn check_requirements(
        &mut self,
        model: &Ty,
        trait_decl: DeclId,
        scope: ScopeId,
        span: Span,
    ) {
        let Some(trait_scope) = self.program.scope_introducing(trait_decl) else { return };
        let self_param = self.program.trait_self(trait_decl);
        let requirements: Vec<DeclId> = self.program.decls_in(trait_scope).to_vec();
        for req in requirements {
            if Some(req) == self_param {
                continue;
            }
            let Some(name) = self.names_of_decl(req) else { continue };
            if !self.is_checkable_requirement(req) {
                continue;
            }

            // The requirement's type with the model substituted for Self.
            let req_ty = self.realize_decl(req);
            let mut map: FxHashMap<DeclId, Ty> = FxHashMap::default();
            if let Some(sp) = self_param {
                map.insert(sp, model.clone());
            }
            let specialized = self.specialize(&req_ty, &map, scope);

            match &self.program.ast().decl(req).kind {
                DeclKind::AssociatedType(_) => {
                    // Satisfied by any member type declaration.
                    let witnesses: Vec<DeclId> = self
                        .lookup_member(model, &name, scope)
                        .into_iter()
                        .filter(|&m| {
                            matches!(self.realize_decl(m), Ty::Metatype(_))
                        })
                        .collect();
                    if witnesses.is_empty() {
                        self.note_unsatisfied(req, trait_decl, &name, span);
                    }
                }
                _ => {
                    let members = self.lookup_member(model, &name, scope);
                    let mut witnesses = Vec::new();
                    for m in members {
                        let member_ty = self.realize_decl(m);
                        if member_ty.has_error() {
                            continue;
                        }
                        if equivalent(&member_ty, &specialized, self.program.ast()) {
                            witnesses.push(m);
                        }
                    }
                    match witnesses.len() {
                        1 => {}
                        0 => {
                            if !self.program.is_synthesizable(req) {
                                self.note_unsatisfied(req, trait_decl, &name, span);
                            }
                        }
                        _ => {
                            // Ranking among witnesses is not
                            // implemented; erroring is the deliberate
                            // behavior.
                            let trait_name = self.trait_name(trait_decl);
                            self.report(TypeError::AmbiguousRequirementWitness {
                                requirement: name.clone(),
                                trait_name,
                                span,
                            });
                        }
                    }
                }
            }
        }
    }

    fn is_checkable_requirement(&self, req: DeclId) -> bool {
        matches!(
            self.program.ast().decl(req).kind,
            DeclKind::AssociatedType(_)
                | DeclKind::AssociatedValue(_)
                | DeclKind::Function(_)
                | DeclKind::MethodBundle(_)
                | DeclKind::Subscript(_)
                | DeclKind::Initializer(_)
        )
    }

    fn note_unsatisfied(
        &mut self,
        _req: DeclId,
        trait_decl: DeclId,
        name: &str,
        span: Span,
    ) {
        let trait_name = self.trait_name(trait_decl);
        self.report(TypeError::RequirementNotSatisfied {
            requirement: name.to_string(),
            trait_name,
            span,
        });
    }

    pub(crate) fn trait_name(&self, t: DeclId) -> String {
        match &self.program.ast().decl(t).kind {
            DeclKind::Trait(tr) => tr.name.clone(),
            _ => String::new(),
        }
    }
}
