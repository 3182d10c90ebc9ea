//! Type representation for the Sable type system.
//!
//! Defines the core `Ty` enum, inference variables (`TyVar`), capability
//! sets, and the structural `transform` fold used by substitution. Types
//! are a closed algebra; every composite query (flags, substitution,
//! canonicalization) is a fold over this enum.

use std::fmt;

use bitflags::bitflags;
use sable_ast::{AccessEffect, DeclId, ExprId};

/// A type (inference) variable, identified by a `u32` index into the
/// solver's unification table. Equality is identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

bitflags! {
    /// Structural properties of a type, closed under composition.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
    pub struct TyFlags: u8 {
        const HAS_ERROR               = 1 << 0;
        const HAS_VARIABLE            = 1 << 1;
        const HAS_SKOLEM              = 1 << 2;
        const HAS_GENERIC_TYPE_PARAM  = 1 << 3;
        const HAS_GENERIC_VALUE_PARAM = 1 << 4;
    }
}

bitflags! {
    /// The set of access effects a method bundle or subscript exposes.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CapabilitySet: u8 {
        const LET     = 1 << 0;
        const INOUT   = 1 << 1;
        const SET     = 1 << 2;
        const SINK    = 1 << 3;
        const YIELDED = 1 << 4;
    }
}

impl CapabilitySet {
    pub fn of(effect: AccessEffect) -> CapabilitySet {
        match effect {
            AccessEffect::Let => CapabilitySet::LET,
            AccessEffect::Inout => CapabilitySet::INOUT,
            AccessEffect::Set => CapabilitySet::SET,
            AccessEffect::Sink => CapabilitySet::SINK,
            AccessEffect::Yielded => CapabilitySet::YIELDED,
        }
    }

    pub fn from_effects(effects: impl IntoIterator<Item = AccessEffect>) -> CapabilitySet {
        effects
            .into_iter()
            .fold(CapabilitySet::empty(), |acc, e| acc | CapabilitySet::of(e))
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (CapabilitySet::LET, "let"),
            (CapabilitySet::INOUT, "inout"),
            (CapabilitySet::SET, "set"),
            (CapabilitySet::SINK, "sink"),
            (CapabilitySet::YIELDED, "yielded"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.contains(bit) {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A built-in type, available when the `Builtin` module is visible.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinTy {
    /// The `Builtin` module itself, used as the domain of builtin names.
    Module,
    /// A raw pointer.
    Ptr,
    /// An integer of the given bit width.
    I(u16),
    /// A pointer-sized integer.
    Word,
    Float16,
    Float32,
    Float64,
}

impl BuiltinTy {
    /// Parse a builtin type name (`ptr`, `word`, `i64`, `float32`, ...).
    pub fn parse(name: &str) -> Option<BuiltinTy> {
        match name {
            "ptr" => Some(BuiltinTy::Ptr),
            "word" => Some(BuiltinTy::Word),
            "float16" => Some(BuiltinTy::Float16),
            "float32" => Some(BuiltinTy::Float32),
            "float64" => Some(BuiltinTy::Float64),
            _ => {
                let width = name.strip_prefix('i')?.parse().ok()?;
                Some(BuiltinTy::I(width))
            }
        }
    }
}

impl fmt::Display for BuiltinTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinTy::Module => write!(f, "Builtin"),
            BuiltinTy::Ptr => write!(f, "Builtin.ptr"),
            BuiltinTy::I(w) => write!(f, "Builtin.i{w}"),
            BuiltinTy::Word => write!(f, "Builtin.word"),
            BuiltinTy::Float16 => write!(f, "Builtin.float16"),
            BuiltinTy::Float32 => write!(f, "Builtin.float32"),
            BuiltinTy::Float64 => write!(f, "Builtin.float64"),
        }
    }
}

/// A static argument of a bound generic type.
///
/// Value arguments are symbolic: they keep the argument expression and
/// are never evaluated by the checker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TyArg {
    Type(Ty),
    Value(ExprId),
}

/// A labeled element of a tuple type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleElem {
    pub label: Option<String>,
    pub ty: Ty,
}

/// A labeled input of a callable type. The type is usually a
/// `Ty::Param` carrying the convention.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallableParam {
    pub label: Option<String>,
    pub ty: Ty,
}

/// A lambda type: receiver effect, environment, labeled inputs, output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LambdaTy {
    pub receiver_effect: Option<AccessEffect>,
    pub environment: Ty,
    pub inputs: Vec<CallableParam>,
    pub output: Ty,
}

/// A method-bundle type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodTy {
    pub capabilities: CapabilitySet,
    pub receiver: Ty,
    pub inputs: Vec<CallableParam>,
    pub output: Ty,
}

/// A subscript type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptTy {
    pub is_property: bool,
    pub capabilities: CapabilitySet,
    pub environment: Ty,
    pub inputs: Vec<CallableParam>,
    pub output: Ty,
}

/// A Sable type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A fresh inference hole.
    Var(TyVar),
    /// A rigid, quantified placeholder standing for the boxed base.
    Skolem(Box<Ty>),
    /// A generic type parameter, referencing its declaration.
    GenericTypeParam(DeclId),
    /// A generic value parameter, referencing its declaration.
    GenericValueParam(DeclId),
    /// An associated type projected out of a domain.
    AssocType { decl: DeclId, domain: Box<Ty> },
    /// An associated value projected out of a domain.
    AssocValue { decl: DeclId, domain: Box<Ty> },
    /// A nominal product type.
    Product(DeclId),
    /// A nominal trait type.
    Trait(DeclId),
    /// A nominal alias; unfolds to the boxed type.
    Alias { decl: DeclId, aliased: Box<Ty> },
    /// A base type applied to ordered static arguments.
    BoundGeneric { base: Box<Ty>, arguments: Vec<TyArg> },
    Lambda(Box<LambdaTy>),
    Method(Box<MethodTy>),
    Subscript(Box<SubscriptTy>),
    /// A parameter type: access effect plus bare type.
    Param { convention: AccessEffect, bare: Box<Ty> },
    /// A projection of a remote part with a given access.
    Remote { access: AccessEffect, bare: Box<Ty> },
    /// An ordered labeled tuple. `()` is `Void`.
    Tuple(Vec<TupleElem>),
    /// An unordered union. The empty sum is `Never`.
    Sum(Vec<Ty>),
    /// A view of `subject` through the witness of trait `lens`.
    Lens { subject: Box<Ty>, lens: DeclId },
    /// The type of a type.
    Metatype(Box<Ty>),
    Builtin(BuiltinTy),
    /// The top type.
    Any,
    /// The bottom marker; propagates without further diagnosing.
    Error,
}

/// The action a transform callback takes at each node.
pub enum TransformAction {
    /// Recurse into the node's children.
    StepInto,
    /// Replace the whole node and stop descending.
    StepOver(Ty),
}

impl Ty {
    /// The unit type `()`.
    pub fn void() -> Ty {
        Ty::Tuple(Vec::new())
    }

    /// The bottom type, represented as the empty sum.
    pub fn never() -> Ty {
        Ty::Sum(Vec::new())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Tuple(elems) if elems.is_empty())
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Ty::Sum(elems) if elems.is_empty())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    pub fn has_error(&self) -> bool {
        self.flags().contains(TyFlags::HAS_ERROR)
    }

    pub fn has_variable(&self) -> bool {
        self.flags().contains(TyFlags::HAS_VARIABLE)
    }

    pub fn has_skolem(&self) -> bool {
        self.flags().contains(TyFlags::HAS_SKOLEM)
    }

    pub fn has_generic_param(&self) -> bool {
        self.flags().intersects(
            TyFlags::HAS_GENERIC_TYPE_PARAM | TyFlags::HAS_GENERIC_VALUE_PARAM,
        )
    }

    /// Strip the parameter-convention wrapper, if any.
    pub fn bare(&self) -> &Ty {
        match self {
            Ty::Param { bare, .. } => bare,
            other => other,
        }
    }

    /// Wrap a bare type in a parameter convention.
    pub fn param(convention: AccessEffect, bare: Ty) -> Ty {
        Ty::Param { convention, bare: Box::new(bare) }
    }

    /// A thin lambda (void environment, no receiver effect).
    pub fn thin_lambda(inputs: Vec<CallableParam>, output: Ty) -> Ty {
        Ty::Lambda(Box::new(LambdaTy {
            receiver_effect: None,
            environment: Ty::void(),
            inputs,
            output,
        }))
    }

    /// Structural flags, computed bottom-up.
    pub fn flags(&self) -> TyFlags {
        match self {
            Ty::Var(_) => TyFlags::HAS_VARIABLE,
            Ty::Skolem(base) => TyFlags::HAS_SKOLEM | base.flags(),
            Ty::GenericTypeParam(_) => TyFlags::HAS_GENERIC_TYPE_PARAM,
            Ty::GenericValueParam(_) => TyFlags::HAS_GENERIC_VALUE_PARAM,
            Ty::AssocType { domain, .. } | Ty::AssocValue { domain, .. } => domain.flags(),
            Ty::Product(_) | Ty::Trait(_) | Ty::Builtin(_) | Ty::Any => TyFlags::empty(),
            Ty::Alias { aliased, .. } => aliased.flags(),
            Ty::BoundGeneric { base, arguments } => arguments
                .iter()
                .filter_map(|a| match a {
                    TyArg::Type(t) => Some(t.flags()),
                    TyArg::Value(_) => None,
                })
                .fold(base.flags(), |acc, f| acc | f),
            Ty::Lambda(l) => {
                l.environment.flags()
                    | l.output.flags()
                    | fold_params(&l.inputs)
            }
            Ty::Method(m) => m.receiver.flags() | m.output.flags() | fold_params(&m.inputs),
            Ty::Subscript(s) => {
                s.environment.flags() | s.output.flags() | fold_params(&s.inputs)
            }
            Ty::Param { bare, .. } | Ty::Remote { bare, .. } => bare.flags(),
            Ty::Tuple(elems) => elems
                .iter()
                .fold(TyFlags::empty(), |acc, e| acc | e.ty.flags()),
            Ty::Sum(elems) => elems.iter().fold(TyFlags::empty(), |acc, e| acc | e.flags()),
            Ty::Lens { subject, .. } => subject.flags(),
            Ty::Metatype(t) => t.flags(),
            Ty::Error => TyFlags::HAS_ERROR,
        }
    }

    /// Fold with a per-node action. The callback sees each node before
    /// its children; `StepOver` short-circuits the subtree.
    pub fn transform(self, f: &mut impl FnMut(&Ty) -> TransformAction) -> Ty {
        match f(&self) {
            TransformAction::StepOver(replacement) => replacement,
            TransformAction::StepInto => match self {
                Ty::Var(_)
                | Ty::GenericTypeParam(_)
                | Ty::GenericValueParam(_)
                | Ty::Product(_)
                | Ty::Trait(_)
                | Ty::Builtin(_)
                | Ty::Any
                | Ty::Error => self,
                Ty::Skolem(base) => Ty::Skolem(Box::new(base.transform(f))),
                Ty::AssocType { decl, domain } => Ty::AssocType {
                    decl,
                    domain: Box::new(domain.transform(f)),
                },
                Ty::AssocValue { decl, domain } => Ty::AssocValue {
                    decl,
                    domain: Box::new(domain.transform(f)),
                },
                Ty::Alias { decl, aliased } => Ty::Alias {
                    decl,
                    aliased: Box::new(aliased.transform(f)),
                },
                Ty::BoundGeneric { base, arguments } => Ty::BoundGeneric {
                    base: Box::new(base.transform(f)),
                    arguments: arguments
                        .into_iter()
                        .map(|a| match a {
                            TyArg::Type(t) => TyArg::Type(t.transform(f)),
                            value => value,
                        })
                        .collect(),
                },
                Ty::Lambda(l) => {
                    let l = *l;
                    Ty::Lambda(Box::new(LambdaTy {
                        receiver_effect: l.receiver_effect,
                        environment: l.environment.transform(f),
                        inputs: transform_params(l.inputs, f),
                        output: l.output.transform(f),
                    }))
                }
                Ty::Method(m) => {
                    let m = *m;
                    Ty::Method(Box::new(MethodTy {
                        capabilities: m.capabilities,
                        receiver: m.receiver.transform(f),
                        inputs: transform_params(m.inputs, f),
                        output: m.output.transform(f),
                    }))
                }
                Ty::Subscript(s) => {
                    let s = *s;
                    Ty::Subscript(Box::new(SubscriptTy {
                        is_property: s.is_property,
                        capabilities: s.capabilities,
                        environment: s.environment.transform(f),
                        inputs: transform_params(s.inputs, f),
                        output: s.output.transform(f),
                    }))
                }
                Ty::Param { convention, bare } => Ty::Param {
                    convention,
                    bare: Box::new(bare.transform(f)),
                },
                Ty::Remote { access, bare } => Ty::Remote {
                    access,
                    bare: Box::new(bare.transform(f)),
                },
                Ty::Tuple(elems) => Ty::Tuple(
                    elems
                        .into_iter()
                        .map(|e| TupleElem { label: e.label, ty: e.ty.transform(f) })
                        .collect(),
                ),
                Ty::Sum(elems) => {
                    Ty::Sum(elems.into_iter().map(|e| e.transform(f)).collect())
                }
                Ty::Lens { subject, lens } => Ty::Lens {
                    subject: Box::new(subject.transform(f)),
                    lens,
                },
                Ty::Metatype(t) => Ty::Metatype(Box::new(t.transform(f))),
            },
        }
    }

    /// Collect the distinct inference variables occurring in the type,
    /// in order of first appearance.
    pub fn collect_vars(&self, out: &mut Vec<TyVar>) {
        let _ = self.clone().transform(&mut |t| {
            if let Ty::Var(v) = t {
                if !out.contains(v) {
                    out.push(*v);
                }
            }
            TransformAction::StepInto
        });
    }
}

fn fold_params(params: &[CallableParam]) -> TyFlags {
    params
        .iter()
        .fold(TyFlags::empty(), |acc, p| acc | p.ty.flags())
}

fn transform_params(
    params: Vec<CallableParam>,
    f: &mut impl FnMut(&Ty) -> TransformAction,
) -> Vec<CallableParam> {
    params
        .into_iter()
        .map(|p| CallableParam { label: p.label, ty: p.ty.transform(f) })
        .collect()
}

// ── Display ─────────────────────────────────────────────────────────────

fn write_params(f: &mut fmt::Formatter<'_>, params: &[CallableParam]) -> fmt::Result {
    write!(f, "(")?;
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        if let Some(label) = &p.label {
            write!(f, "{label}: ")?;
        }
        write!(f, "{}", p.ty)?;
    }
    write!(f, ")")
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "%{}", v.0),
            Ty::Skolem(base) => write!(f, "${base}"),
            Ty::GenericTypeParam(d) => write!(f, "@T{d}"),
            Ty::GenericValueParam(d) => write!(f, "@v{d}"),
            Ty::AssocType { decl, domain } => write!(f, "{domain}.@A{decl}"),
            Ty::AssocValue { decl, domain } => write!(f, "{domain}.@a{decl}"),
            Ty::Product(d) => write!(f, "#P{d}"),
            Ty::Trait(d) => write!(f, "#T{d}"),
            Ty::Alias { decl, .. } => write!(f, "#A{decl}"),
            Ty::BoundGeneric { base, arguments } => {
                write!(f, "{base}<")?;
                for (i, a) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match a {
                        TyArg::Type(t) => write!(f, "{t}")?,
                        TyArg::Value(e) => write!(f, "value({e})")?,
                    }
                }
                write!(f, ">")
            }
            Ty::Lambda(l) => {
                write!(f, "[{}]", l.environment)?;
                write_params(f, &l.inputs)?;
                if let Some(e) = l.receiver_effect {
                    write!(f, " {e}")?;
                }
                write!(f, " -> {}", l.output)
            }
            Ty::Method(m) => {
                write!(f, "method[{}]", m.receiver)?;
                write_params(f, &m.inputs)?;
                write!(f, " -> {} {{{}}}", m.output, m.capabilities)
            }
            Ty::Subscript(s) => {
                if s.is_property {
                    write!(f, "property[{}]", s.environment)?;
                } else {
                    write!(f, "subscript[{}]", s.environment)?;
                    write_params(f, &s.inputs)?;
                }
                write!(f, ": {} {{{}}}", s.output, s.capabilities)
            }
            Ty::Param { convention, bare } => write!(f, "{convention} {bare}"),
            Ty::Remote { access, bare } => write!(f, "remote {access} {bare}"),
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(label) = &e.label {
                        write!(f, "{label}: ")?;
                    }
                    write!(f, "{}", e.ty)?;
                }
                write!(f, ")")
            }
            Ty::Sum(elems) => {
                if elems.is_empty() {
                    return write!(f, "Never");
                }
                write!(f, "Sum<")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ">")
            }
            Ty::Lens { subject, lens } => write!(f, "{subject}::#T{lens}"),
            Ty::Metatype(t) => write!(f, "Metatype<{t}>"),
            Ty::Builtin(b) => write!(f, "{b}"),
            Ty::Any => write!(f, "Any"),
            Ty::Error => write!(f, "_error"),
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_propagate_through_composites() {
        let t = Ty::Tuple(vec![
            TupleElem { label: None, ty: Ty::Var(TyVar(0)) },
            TupleElem { label: None, ty: Ty::Error },
        ]);
        assert!(t.has_variable());
        assert!(t.has_error());
        assert!(!t.has_skolem());
    }

    #[test]
    fn transform_step_over_short_circuits() {
        let t = Ty::Metatype(Box::new(Ty::Var(TyVar(3))));
        let replaced = t.transform(&mut |node| match node {
            Ty::Var(_) => TransformAction::StepOver(Ty::Any),
            _ => TransformAction::StepInto,
        });
        assert_eq!(replaced, Ty::Metatype(Box::new(Ty::Any)));
    }

    #[test]
    fn collect_vars_dedups_in_first_use_order() {
        let t = Ty::Tuple(vec![
            TupleElem { label: None, ty: Ty::Var(TyVar(7)) },
            TupleElem { label: None, ty: Ty::Var(TyVar(2)) },
            TupleElem { label: None, ty: Ty::Var(TyVar(7)) },
        ]);
        let mut vars = Vec::new();
        t.collect_vars(&mut vars);
        assert_eq!(vars, vec![TyVar(7), TyVar(2)]);
    }

    #[test]
    fn never_is_the_empty_sum() {
        assert!(Ty::never().is_never());
        assert_eq!(format!("{}", Ty::never()), "Never");
    }

    #[test]
    fn builtin_parsing() {
        assert_eq!(BuiltinTy::parse("i64"), Some(BuiltinTy::I(64)));
        assert_eq!(BuiltinTy::parse("ptr"), Some(BuiltinTy::Ptr));
        assert_eq!(BuiltinTy::parse("zorp"), None);
    }
}
