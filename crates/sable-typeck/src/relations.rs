//! Type canonicalization and the conformance registry.
//!
//! Canonicalization unfolds type aliases, sorts sum elements, and
//! normalizes bound generics whose base has no parameters. Two types are
//! equivalent iff their canonical forms are structurally equal. The
//! registry stores proven conformances indexed by canonical model and
//! rejects duplicates in overlapping scopes.

use rustc_hash::FxHashMap;
use sable_ast::decl::DeclKind;
use sable_ast::node::Ast;
use sable_ast::{DeclId, ScopeId};
use sable_common::Span;

use crate::ty::{CallableParam, LambdaTy, MethodTy, SubscriptTy, TupleElem, Ty, TyArg};

/// Number of explicit generic parameters a nominal declaration takes.
pub fn generic_param_count(ast: &Ast, d: DeclId) -> usize {
    match &ast.decl(d).kind {
        DeclKind::Product(p) => p.generic.as_ref().map_or(0, |g| g.parameters.len()),
        DeclKind::TypeAlias(a) => a.generic.as_ref().map_or(0, |g| g.parameters.len()),
        _ => 0,
    }
}

fn nominal_decl(ty: &Ty) -> Option<DeclId> {
    match ty {
        Ty::Product(d) | Ty::Trait(d) => Some(*d),
        _ => None,
    }
}

fn canonical_params(params: &[CallableParam], ast: &Ast) -> Vec<CallableParam> {
    params
        .iter()
        .map(|p| CallableParam { label: p.label.clone(), ty: canonical(&p.ty, ast) })
        .collect()
}

/// The canonical form of a type. Stable: canonicalizing twice is the
/// identity on the first result.
pub fn canonical(ty: &Ty, ast: &Ast) -> Ty {
    match ty {
        Ty::Alias { aliased, .. } => canonical(aliased, ast),
        Ty::BoundGeneric { base, arguments } => {
            let base = canonical(base, ast);
            if nominal_decl(&base).is_some_and(|d| generic_param_count(ast, d) == 0) {
                return base;
            }
            let arguments = arguments
                .iter()
                .map(|a| match a {
                    TyArg::Type(t) => TyArg::Type(canonical(t, ast)),
                    TyArg::Value(e) => TyArg::Value(*e),
                })
                .collect();
            Ty::BoundGeneric { base: Box::new(base), arguments }
        }
        Ty::Sum(elems) => {
            let mut elems: Vec<Ty> = elems.iter().map(|e| canonical(e, ast)).collect();
            elems.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
            elems.dedup();
            if elems.len() == 1 {
                elems.pop().expect("just checked length")
            } else {
                Ty::Sum(elems)
            }
        }
        Ty::Skolem(base) => Ty::Skolem(Box::new(canonical(base, ast))),
        Ty::AssocType { decl, domain } => Ty::AssocType {
            decl: *decl,
            domain: Box::new(canonical(domain, ast)),
        },
        Ty::AssocValue { decl, domain } => Ty::AssocValue {
            decl: *decl,
            domain: Box::new(canonical(domain, ast)),
        },
        Ty::Lambda(l) => Ty::Lambda(Box::new(LambdaTy {
            receiver_effect: l.receiver_effect,
            environment: canonical(&l.environment, ast),
            inputs: canonical_params(&l.inputs, ast),
            output: canonical(&l.output, ast),
        })),
        Ty::Method(m) => Ty::Method(Box::new(MethodTy {
            capabilities: m.capabilities,
            receiver: canonical(&m.receiver, ast),
            inputs: canonical_params(&m.inputs, ast),
            output: canonical(&m.output, ast),
        })),
        Ty::Subscript(s) => Ty::Subscript(Box::new(SubscriptTy {
            is_property: s.is_property,
            capabilities: s.capabilities,
            environment: canonical(&s.environment, ast),
            inputs: canonical_params(&s.inputs, ast),
            output: canonical(&s.output, ast),
        })),
        Ty::Param { convention, bare } => Ty::Param {
            convention: *convention,
            bare: Box::new(canonical(bare, ast)),
        },
        Ty::Remote { access, bare } => Ty::Remote {
            access: *access,
            bare: Box::new(canonical(bare, ast)),
        },
        Ty::Tuple(elems) => Ty::Tuple(
            elems
                .iter()
                .map(|e| TupleElem { label: e.label.clone(), ty: canonical(&e.ty, ast) })
                .collect(),
        ),
        Ty::Lens { subject, lens } => Ty::Lens {
            subject: Box::new(canonical(subject, ast)),
            lens: *lens,
        },
        Ty::Metatype(t) => Ty::Metatype(Box::new(canonical(t, ast))),
        Ty::Var(_)
        | Ty::GenericTypeParam(_)
        | Ty::GenericValueParam(_)
        | Ty::Product(_)
        | Ty::Trait(_)
        | Ty::Builtin(_)
        | Ty::Any
        | Ty::Error => ty.clone(),
    }
}

/// Whether two types denote the same canonical type.
pub fn equivalent(a: &Ty, b: &Ty, ast: &Ast) -> bool {
    canonical(a, ast) == canonical(b, ast)
}

// ── Conformance registry ────────────────────────────────────────────────

/// A proven conformance of a model to a trait, with the declaration that
/// established it and the scope it is exposed in.
#[derive(Clone, Debug)]
pub struct Conformance {
    /// Canonical model type.
    pub model: Ty,
    pub trait_decl: DeclId,
    /// The declaration that established the conformance.
    pub source: DeclId,
    pub scope: ScopeId,
    pub span: Span,
}

/// Canonicalization table plus registered conformances, indexed by
/// canonical subject.
#[derive(Debug, Default)]
pub struct TypeRelations {
    conformances: FxHashMap<Ty, Vec<Conformance>>,
}

impl TypeRelations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conformances registered for a canonical model.
    pub fn conformances_of(&self, canonical_model: &Ty) -> &[Conformance] {
        self.conformances
            .get(canonical_model)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Register a conformance. `overlaps` decides whether two exposure
    /// scopes overlap; a duplicate in an overlapping scope is rejected
    /// with the previously recorded site.
    pub fn insert(
        &mut self,
        conformance: Conformance,
        overlaps: impl Fn(ScopeId, ScopeId) -> bool,
    ) -> Result<(), Span> {
        let entry = self.conformances.entry(conformance.model.clone()).or_default();
        for existing in entry.iter() {
            if existing.trait_decl == conformance.trait_decl
                && overlaps(existing.scope, conformance.scope)
            {
                return Err(existing.span);
            }
        }
        entry.push(conformance);
        Ok(())
    }

    /// Whether a conformance of `model` to `trait_decl` is registered.
    pub fn contains(&self, canonical_model: &Ty, trait_decl: DeclId) -> bool {
        self.conformances_of(canonical_model)
            .iter()
            .any(|c| c.trait_decl == trait_decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_sorts_and_dedups_sums() {
        let ast = Ast::new();
        let a = Ty::Sum(vec![Ty::Any, Ty::Builtin(crate::ty::BuiltinTy::Word), Ty::Any]);
        let b = Ty::Sum(vec![Ty::Builtin(crate::ty::BuiltinTy::Word), Ty::Any]);
        assert_eq!(canonical(&a, &ast), canonical(&b, &ast));
    }

    #[test]
    fn canonical_is_idempotent() {
        let ast = Ast::new();
        let t = Ty::Sum(vec![Ty::Any, Ty::Builtin(crate::ty::BuiltinTy::Ptr)]);
        let once = canonical(&t, &ast);
        assert_eq!(canonical(&once, &ast), once);
    }

    #[test]
    fn singleton_sum_collapses() {
        let ast = Ast::new();
        let t = Ty::Sum(vec![Ty::Any, Ty::Any]);
        assert_eq!(canonical(&t, &ast), Ty::Any);
    }

    #[test]
    fn registry_rejects_overlapping_duplicates() {
        let mut relations = TypeRelations::new();
        let model = Ty::Any;
        let first = Conformance {
            model: model.clone(),
            trait_decl: DeclId(1),
            source: DeclId(2),
            scope: ScopeId(0),
            span: Span::new(0, 1),
        };
        let second = Conformance {
            model: model.clone(),
            trait_decl: DeclId(1),
            source: DeclId(3),
            scope: ScopeId(0),
            span: Span::new(5, 6),
        };
        assert!(relations.insert(first, |a, b| a == b).is_ok());
        let err = relations.insert(second, |a, b| a == b);
        assert_eq!(err, Err(Span::new(0, 1)));
        assert!(relations.contains(&model, DeclId(1)));
    }
}
