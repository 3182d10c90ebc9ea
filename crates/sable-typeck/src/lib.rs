//! Sable type checker: constraint-based inference over a scoped AST.
//!
//! The checker is a single stateful engine ([`TypeChecker`]) borrowing an
//! immutable [`ScopedProgram`]. It realizes declaration types on demand,
//! checks bodies and members recursively, and infers expression types by
//! generating constraints and solving them with branch-and-bound search
//! over overload disjunctions.
//!
//! # Architecture
//!
//! - [`ty`]: the type algebra (terms, flags, transform fold)
//! - [`relations`]: canonicalization and the conformance registry
//! - [`subst`]: specialization, opening, skolemization, instantiation
//! - [`lookup`]: unqualified and member lookup, conformance closure
//! - [`resolve`]: nominal-prefix resolution, candidates, magic names
//! - [`realize`]: overarching types of declarations
//! - [`check`]: declaration and statement checking
//! - [`traits`]: conformance checking against trait requirements
//! - [`env`]: generic environments
//! - [`constraint`], [`infer`], [`solve`]: the expression layer
//! - [`captures`]: implicit-capture analysis for local functions
//! - [`error`], [`diagnostics`]: diagnostics and their rendering
//! - [`builtins`]: the `Builtin` module surface

pub mod builtins;
pub mod captures;
pub mod check;
pub mod constraint;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod infer;
pub mod lookup;
pub mod realize;
pub mod relations;
pub mod resolve;
pub mod solve;
pub mod subst;
pub mod traits;
pub mod ty;

use rustc_hash::{FxHashMap, FxHashSet};
use sable_ast::{AccessEffect, DeclId, ExprId, ScopeId, ScopedProgram};
use sable_common::{Severity, Span};

use crate::env::EnvEntry;
use crate::error::TypeError;
use crate::relations::TypeRelations;
use crate::ty::{BuiltinTy, Ty, TyVar};

/// Configuration of a checking run, fixed at construction.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Enables resolution of `Builtin` as a module and of builtin
    /// function and type names.
    pub is_builtin_module_visible: bool,
    /// When a subject's span contains this byte offset, constraint
    /// generation and solving emit `tracing` events for it.
    pub trace_inference_at: Option<u32>,
}

/// How a name expression refers to its declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclRef {
    Direct(DeclId),
    Member(DeclId),
    BuiltinType(BuiltinTy),
    BuiltinFunction(String),
}

impl DeclRef {
    /// The referenced declaration, when the referent is user code.
    pub fn decl(&self) -> Option<DeclId> {
        match self {
            DeclRef::Direct(d) | DeclRef::Member(d) => Some(*d),
            _ => None,
        }
    }
}

/// Request state of a declaration; doubles as the re-entrancy guard.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclRequest {
    TypeRealizationStarted,
    TypeRealizationCompleted,
    TypeCheckingStarted,
    Success,
    Failure,
}

/// One implicit capture of a local function or subscript.
#[derive(Clone, Debug)]
pub struct ImplicitCapture {
    pub name: String,
    pub access: AccessEffect,
    pub referent: DeclRef,
}

/// The binary-tree view of an infix chain after precedence folding.
#[derive(Clone, Debug)]
pub enum FoldedSequence {
    Leaf(ExprId),
    Node {
        /// The operator name expression.
        operator: ExprId,
        lhs: Box<FoldedSequence>,
        rhs: Box<FoldedSequence>,
    },
}

/// The diagnostics of a run, in stable emission order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<TypeError>,
    pub warnings: Vec<TypeError>,
}

/// The product of a successful (or partially successful) run.
#[derive(Debug)]
pub struct TypedProgram {
    pub decl_types: FxHashMap<DeclId, Ty>,
    pub expr_types: FxHashMap<ExprId, Ty>,
    pub referred_decls: FxHashMap<ExprId, DeclRef>,
    pub implicit_captures: FxHashMap<DeclId, Vec<ImplicitCapture>>,
    pub folded_sequence_exprs: FxHashMap<ExprId, FoldedSequence>,
    pub relations: TypeRelations,
}

/// The type checker: one value owning every piece of mutable state of a
/// run over an immutable scoped program.
pub struct TypeChecker<'p> {
    pub(crate) program: &'p ScopedProgram,
    pub(crate) config: Config,

    // Outputs.
    pub(crate) decl_types: FxHashMap<DeclId, Ty>,
    pub(crate) expr_types: FxHashMap<ExprId, Ty>,
    pub(crate) referred_decls: FxHashMap<ExprId, DeclRef>,
    pub(crate) implicit_captures: FxHashMap<DeclId, Vec<ImplicitCapture>>,
    pub(crate) folded_sequence_exprs: FxHashMap<ExprId, FoldedSequence>,
    pub(crate) relations: TypeRelations,

    // Request tracking.
    pub(crate) decl_requests: FxHashMap<DeclId, DeclRequest>,
    pub(crate) environments: FxHashMap<DeclId, EnvEntry>,
    pub(crate) bindings_under_checking: FxHashSet<DeclId>,
    pub(crate) extensions_under_binding: FxHashSet<DeclId>,
    pub(crate) member_lookup_tables:
        FxHashMap<(Ty, ScopeId), FxHashMap<String, Vec<DeclId>>>,
    pub(crate) operator_table:
        FxHashMap<(sable_ast::OperatorNotation, String, ScopeId), DeclId>,

    // Expression-layer state.
    pub(crate) next_var: u32,
    pub(crate) return_type_stack: Vec<Ty>,
    pub(crate) yield_type_stack: Vec<Ty>,

    // Diagnostics, in emission order per severity.
    pub(crate) errors: Vec<TypeError>,
    pub(crate) warnings: Vec<TypeError>,
}

impl<'p> TypeChecker<'p> {
    /// Create a checker over a scoped program.
    pub fn new(program: &'p ScopedProgram, config: Config) -> Self {
        TypeChecker {
            program,
            config,
            decl_types: FxHashMap::default(),
            expr_types: FxHashMap::default(),
            referred_decls: FxHashMap::default(),
            implicit_captures: FxHashMap::default(),
            folded_sequence_exprs: FxHashMap::default(),
            relations: TypeRelations::new(),
            decl_requests: FxHashMap::default(),
            environments: FxHashMap::default(),
            bindings_under_checking: FxHashSet::default(),
            extensions_under_binding: FxHashSet::default(),
            member_lookup_tables: FxHashMap::default(),
            operator_table: FxHashMap::default(),
            next_var: 0,
            return_type_stack: Vec::new(),
            yield_type_stack: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Type-check every declaration of the given module. Returns `true`
    /// when no error was produced by this call.
    pub fn check_module(&mut self, module: ScopeId) -> bool {
        let errors_before = self.errors.len();
        for m in self.program.module_scope_ids().to_vec() {
            self.register_operators(m);
        }
        let mut decls: Vec<DeclId> = Vec::new();
        for &unit in self.unit_scopes(module).iter() {
            decls.extend_from_slice(self.program.decls_in(unit));
        }
        for d in decls {
            self.check_decl(d);
        }
        // No declaration may be left mid-request once checking returns.
        let stuck: Vec<DeclId> = self
            .decl_requests
            .iter()
            .filter(|(_, s)| {
                matches!(
                    s,
                    DeclRequest::TypeRealizationStarted | DeclRequest::TypeCheckingStarted
                )
            })
            .map(|(d, _)| *d)
            .collect();
        for d in stuck {
            self.decl_requests.insert(d, DeclRequest::Failure);
        }
        self.errors.len() == errors_before
    }

    /// Finish the run, moving out the typed program and diagnostics.
    pub fn finish(self) -> (TypedProgram, Diagnostics) {
        (
            TypedProgram {
                decl_types: self.decl_types,
                expr_types: self.expr_types,
                referred_decls: self.referred_decls,
                implicit_captures: self.implicit_captures,
                folded_sequence_exprs: self.folded_sequence_exprs,
                relations: self.relations,
            },
            Diagnostics { errors: self.errors, warnings: self.warnings },
        )
    }

    pub fn errors(&self) -> &[TypeError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[TypeError] {
        &self.warnings
    }

    /// The request state of a declaration, if any request has run.
    pub fn request_state(&self, d: DeclId) -> Option<DeclRequest> {
        self.decl_requests.get(&d).copied()
    }

    /// The recorded overarching type of a declaration, if realized.
    pub fn decl_type(&self, d: DeclId) -> Option<&Ty> {
        self.decl_types.get(&d)
    }

    /// The recorded type of an expression, if inferred.
    pub fn expr_type(&self, e: ExprId) -> Option<&Ty> {
        self.expr_types.get(&e)
    }

    /// The declaration a name expression was bound to, if resolved.
    pub fn referred_decl(&self, e: ExprId) -> Option<&DeclRef> {
        self.referred_decls.get(&e)
    }

    // ── Shared plumbing ────────────────────────────────────────────────

    pub(crate) fn report(&mut self, err: TypeError) {
        match err.severity() {
            Severity::Error => self.errors.push(err),
            Severity::Warning => self.warnings.push(err),
        }
    }

    /// A fresh inference variable.
    pub(crate) fn fresh_var(&mut self) -> Ty {
        let v = TyVar(self.next_var);
        self.next_var += 1;
        Ty::Var(v)
    }

    pub(crate) fn canonical(&self, ty: &Ty) -> Ty {
        relations::canonical(ty, self.program.ast())
    }

    /// Whether two scopes overlap (one contains the other).
    pub(crate) fn scopes_overlap(&self, a: ScopeId, b: ScopeId) -> bool {
        self.program.scopes_from(a).any(|s| s == b)
            || self.program.scopes_from(b).any(|s| s == a)
    }

    /// All translation-unit scopes of a module, in creation order.
    pub(crate) fn unit_scopes(&self, module: ScopeId) -> Vec<ScopeId> {
        (0..self.program.scope_count() as u32)
            .map(ScopeId)
            .filter(|&s| {
                matches!(self.program.scope_kind(s), sable_ast::ScopeKind::TranslationUnit)
                    && self.program.parent(s) == Some(module)
            })
            .collect()
    }

    /// Whether tracing is requested for a subject at `span`.
    pub(crate) fn should_trace(&self, span: Span) -> bool {
        self.config
            .trace_inference_at
            .is_some_and(|offset| span.contains(offset))
    }
}
