//! Substitution over types: specialization, opening, skolemization,
//! and instantiation at a use site.

use rustc_hash::FxHashMap;
use sable_ast::{DeclId, ScopeId};

use crate::constraint::Constraint;
use crate::ty::{TransformAction, Ty, TyVar};
use crate::TypeChecker;

/// A type together with the constraints its instantiation incurred.
/// The constraints are added verbatim to the constraint system of the
/// expression that named the declaration.
#[derive(Clone, Debug)]
pub struct InstantiatedType {
    pub shape: Ty,
    pub constraints: Vec<Constraint>,
}

impl InstantiatedType {
    pub fn monomorphic(shape: Ty) -> Self {
        InstantiatedType { shape, constraints: Vec::new() }
    }
}

/// Substitute solved inference variables into a type; unassigned
/// variables are left in place.
pub fn substitute_vars(ty: Ty, assignments: &FxHashMap<TyVar, Ty>) -> Ty {
    ty.transform(&mut |t| match t {
        Ty::Var(v) => match assignments.get(v) {
            Some(replacement) => {
                // The assignment itself may contain variables.
                TransformAction::StepOver(substitute_vars(replacement.clone(), assignments))
            }
            None => TransformAction::StepInto,
        },
        _ => TransformAction::StepInto,
    })
}

impl<'p> TypeChecker<'p> {
    /// Substitute generic parameters according to `map`. Associated-type
    /// projections whose domain becomes concrete are resolved through
    /// member lookup in the substituted domain.
    pub(crate) fn specialize(
        &mut self,
        ty: &Ty,
        map: &FxHashMap<DeclId, Ty>,
        scope: ScopeId,
    ) -> Ty {
        let specialized = ty.clone().transform(&mut |t| match t {
            Ty::GenericTypeParam(d) | Ty::GenericValueParam(d) => match map.get(d) {
                Some(replacement) => TransformAction::StepOver(replacement.clone()),
                None => TransformAction::StepInto,
            },
            _ => TransformAction::StepInto,
        });
        self.resolve_projections(specialized, scope)
    }

    /// Resolve `A.B` projections whose domain is concrete by looking up
    /// `B` as a member of the domain and continuing with its realized
    /// type.
    pub(crate) fn resolve_projections(&mut self, ty: Ty, scope: ScopeId) -> Ty {
        match ty {
            Ty::AssocType { decl, domain } => {
                let domain = self.resolve_projections(*domain, scope);
                if domain.has_generic_param() || domain.has_variable() || domain.has_skolem()
                {
                    return Ty::AssocType { decl, domain: Box::new(domain) };
                }
                let name = self.assoc_name(decl);
                let members = self.lookup_member(&domain, &name, scope);
                let mut witnesses = Vec::new();
                for m in members {
                    let realized = self.realize_decl(m);
                    if let Ty::Metatype(inner) = realized {
                        witnesses.push(*inner);
                    }
                }
                match witnesses.len() {
                    1 => witnesses.pop().expect("just checked length"),
                    _ => Ty::AssocType { decl, domain: Box::new(domain) },
                }
            }
            other => {
                let mut projections: Vec<Ty> = Vec::new();
                let scanned = other.transform(&mut |t| {
                    if let Ty::AssocType { .. } = t {
                        projections.push(t.clone());
                        TransformAction::StepOver(t.clone())
                    } else {
                        TransformAction::StepInto
                    }
                });
                if projections.is_empty() {
                    return scanned;
                }
                // Resolve each collected projection, then splice the
                // results back in a second pass.
                let mut resolved: Vec<Ty> = Vec::with_capacity(projections.len());
                for p in &projections {
                    let r = self.resolve_projections(p.clone(), scope);
                    resolved.push(r);
                }
                let mut index = 0;
                scanned.transform(&mut |t| {
                    if let Ty::AssocType { .. } = t {
                        let r = resolved[index].clone();
                        index += 1;
                        TransformAction::StepOver(r)
                    } else {
                        TransformAction::StepInto
                    }
                })
            }
        }
    }

    /// Replace every generic type parameter with a fresh variable,
    /// reusing the same variable for repeat occurrences.
    pub(crate) fn open(&mut self, ty: &Ty) -> (Ty, FxHashMap<DeclId, Ty>) {
        let mut subs: FxHashMap<DeclId, Ty> = FxHashMap::default();
        let mut next = Vec::new();
        // Pre-collect the parameters so the fold itself stays pure.
        let _ = ty.clone().transform(&mut |t| {
            if let Ty::GenericTypeParam(d) = t {
                if !next.contains(d) {
                    next.push(*d);
                }
            }
            TransformAction::StepInto
        });
        for d in next {
            let var = self.fresh_var();
            subs.insert(d, var);
        }
        let shape = ty.clone().transform(&mut |t| match t {
            Ty::GenericTypeParam(d) => match subs.get(d) {
                Some(v) => TransformAction::StepOver(v.clone()),
                None => TransformAction::StepInto,
            },
            _ => TransformAction::StepInto,
        });
        (shape, subs)
    }

    /// Instantiate a type at a use site: parameters introduced by a
    /// scope containing the use site become skolems (they are rigid for
    /// the caller); all others become fresh variables.
    pub(crate) fn instantiate(
        &mut self,
        ty: &Ty,
        use_site: ScopeId,
    ) -> (Ty, FxHashMap<DeclId, Ty>) {
        let mut params = Vec::new();
        let _ = ty.clone().transform(&mut |t| {
            if let Ty::GenericTypeParam(d) = t {
                if !params.contains(d) {
                    params.push(*d);
                }
            }
            TransformAction::StepInto
        });
        let mut subs: FxHashMap<DeclId, Ty> = FxHashMap::default();
        for d in params {
            let intro = self.program.decl_scope(d);
            let rigid = self.program.scopes_from(use_site).any(|s| s == intro);
            let replacement = if rigid {
                Ty::Skolem(Box::new(Ty::GenericTypeParam(d)))
            } else {
                self.fresh_var()
            };
            subs.insert(d, replacement);
        }
        let shape = ty.clone().transform(&mut |t| match t {
            Ty::GenericTypeParam(d) => match subs.get(d) {
                Some(r) => TransformAction::StepOver(r.clone()),
                None => TransformAction::StepInto,
            },
            _ => TransformAction::StepInto,
        });
        (shape, subs)
    }

    fn assoc_name(&self, d: DeclId) -> String {
        use sable_ast::decl::DeclKind;
        match &self.program.ast().decl(d).kind {
            DeclKind::AssociatedType(a) => a.name.clone(),
            DeclKind::AssociatedValue(v) => v.name.clone(),
            _ => String::new(),
        }
    }
}
