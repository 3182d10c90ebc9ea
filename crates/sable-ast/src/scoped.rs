//! Scope construction and the `ScopedProgram` queries.
//!
//! `ScopedProgram::new` consumes an [`Ast`], runs the pre-checking
//! synthesis pass (memberwise initializers, implicit trait `Self`
//! parameters), then walks every module to build the scope tree and the
//! node-to-scope maps. The result is immutable; the type checker only
//! reads it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::decl::{
    DeclKind, FunctionBody, GenericClause, GenericParameterDecl, InitializerDecl, WhereClause,
};
use crate::expr::{Branch, ConditionItem, Domain, ExprKind};
use crate::node::{Ast, DeclId, ExprId, PatId, ScopeId, StmtId, TypeExprId};
use crate::pat::PatKind;
use crate::stmt::StmtKind;
use crate::tyexpr::{TypeArgExpr, TypeExprKind};
use sable_common::Span;

/// What a scope was introduced by.
#[derive(Clone, Debug)]
pub enum ScopeKind {
    Module { name: String },
    TranslationUnit,
    Decl(DeclId),
    Brace(StmtId),
    Loop(StmtId),
    Conditional(ExprId),
}

#[derive(Clone, Debug)]
struct ScopeData {
    kind: ScopeKind,
    parent: Option<ScopeId>,
}

/// A scoped program: the AST plus every containment relation the
/// checker queries.
#[derive(Debug)]
pub struct ScopedProgram {
    ast: Ast,
    scopes: Vec<ScopeData>,
    scope_decls: Vec<Vec<DeclId>>,
    decl_scope: FxHashMap<DeclId, ScopeId>,
    introduced: FxHashMap<DeclId, ScopeId>,
    expr_scope: FxHashMap<ExprId, ScopeId>,
    type_expr_scope: FxHashMap<TypeExprId, ScopeId>,
    brace_scope: FxHashMap<StmtId, ScopeId>,
    var_binding: FxHashMap<DeclId, DeclId>,
    binding_vars: FxHashMap<DeclId, Vec<DeclId>>,
    trait_self: FxHashMap<DeclId, DeclId>,
    module_scopes: FxHashMap<String, ScopeId>,
    module_scope_list: Vec<ScopeId>,
    unit_imports: FxHashMap<ScopeId, Vec<String>>,
    synthesizable: FxHashSet<DeclId>,
}

impl ScopedProgram {
    /// Prepare and scope a program.
    pub fn new(mut ast: Ast) -> Self {
        prepare(&mut ast);
        let mut scoper = Scoper {
            program: ScopedProgram {
                ast,
                scopes: Vec::new(),
                scope_decls: Vec::new(),
                decl_scope: FxHashMap::default(),
                introduced: FxHashMap::default(),
                expr_scope: FxHashMap::default(),
                type_expr_scope: FxHashMap::default(),
                brace_scope: FxHashMap::default(),
                var_binding: FxHashMap::default(),
                binding_vars: FxHashMap::default(),
                trait_self: FxHashMap::default(),
                module_scopes: FxHashMap::default(),
                module_scope_list: Vec::new(),
                unit_imports: FxHashMap::default(),
                synthesizable: FxHashSet::default(),
            },
        };
        scoper.run();
        scoper.program
    }

    // ── Node access ────────────────────────────────────────────────────

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    // ── Scope queries ──────────────────────────────────────────────────

    pub fn scope_kind(&self, s: ScopeId) -> &ScopeKind {
        &self.scopes[s.index()].kind
    }

    /// Total number of scopes.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn parent(&self, s: ScopeId) -> Option<ScopeId> {
        self.scopes[s.index()].parent
    }

    /// The scope and all its ancestors, innermost first.
    pub fn scopes_from(&self, s: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(s), |&cur| self.parent(cur))
    }

    /// Declarations directly contained in a scope, in source order.
    pub fn decls_in(&self, s: ScopeId) -> &[DeclId] {
        &self.scope_decls[s.index()]
    }

    /// The scope a declaration is declared in.
    pub fn decl_scope(&self, d: DeclId) -> ScopeId {
        self.decl_scope[&d]
    }

    /// The scope a declaration introduces, if it introduces one.
    pub fn scope_introducing(&self, d: DeclId) -> Option<ScopeId> {
        self.introduced.get(&d).copied()
    }

    /// The scope an expression occurs in.
    pub fn expr_scope(&self, e: ExprId) -> ScopeId {
        self.expr_scope[&e]
    }

    /// The scope a type expression occurs in.
    pub fn type_expr_scope(&self, t: TypeExprId) -> ScopeId {
        self.type_expr_scope[&t]
    }

    /// The scope introduced by a brace statement.
    pub fn brace_scope(&self, s: StmtId) -> ScopeId {
        self.brace_scope[&s]
    }

    /// The module scope enclosing `s`.
    pub fn module_containing(&self, s: ScopeId) -> ScopeId {
        self.scopes_from(s)
            .find(|&cur| matches!(self.scope_kind(cur), ScopeKind::Module { .. }))
            .expect("every scope is contained in a module")
    }

    /// All module scopes, in declaration order.
    pub fn module_scope_ids(&self) -> &[ScopeId] {
        &self.module_scope_list
    }

    /// The module scope with the given name.
    pub fn module_named(&self, name: &str) -> Option<ScopeId> {
        self.module_scopes.get(name).copied()
    }

    /// Module names imported by the translation unit enclosing `s`.
    pub fn imports_visible_from(&self, s: ScopeId) -> &[String] {
        self.scopes_from(s)
            .find_map(|cur| self.unit_imports.get(&cur))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `scope` lies within the scope introduced by `decl`.
    pub fn is_contained(&self, scope: ScopeId, decl: DeclId) -> bool {
        match self.scope_introducing(decl) {
            Some(root) => self.scopes_from(scope).any(|s| s == root),
            None => false,
        }
    }

    /// The innermost type declaration whose scope contains `s`.
    pub fn innermost_type(&self, s: ScopeId) -> Option<DeclId> {
        self.scopes_from(s).find_map(|cur| match self.scope_kind(cur) {
            ScopeKind::Decl(d) if self.ast.decl(*d).kind.is_type_scope() => Some(*d),
            _ => None,
        })
    }

    // ── Declaration predicates ─────────────────────────────────────────

    /// Whether `d` is a member of a type declaration.
    pub fn is_member(&self, d: DeclId) -> bool {
        if matches!(self.ast.decl(d).kind, DeclKind::GenericParameter(_)) {
            return false;
        }
        match self.scope_kind(self.decl_scope(d)) {
            ScopeKind::Decl(owner) => matches!(
                self.ast.decl(*owner).kind,
                DeclKind::Product(_)
                    | DeclKind::Trait(_)
                    | DeclKind::Conformance(_)
                    | DeclKind::Extension(_)
            ),
            _ => false,
        }
    }

    /// Whether lookups from `s` happen in a member context.
    pub fn is_member_context(&self, s: ScopeId) -> bool {
        self.innermost_type(s).is_some()
    }

    /// Whether `d` is a requirement of a trait.
    pub fn is_requirement(&self, d: DeclId) -> bool {
        match self.scope_kind(self.decl_scope(d)) {
            ScopeKind::Decl(owner) => {
                matches!(self.ast.decl(*owner).kind, DeclKind::Trait(_))
            }
            _ => false,
        }
    }

    /// Whether a missing witness for requirement `d` may be synthesized.
    pub fn is_synthesizable(&self, d: DeclId) -> bool {
        self.synthesizable.contains(&d)
    }

    /// Flag a requirement as synthesizable. Must be called before type
    /// checking begins.
    pub fn mark_synthesizable(&mut self, d: DeclId) {
        self.synthesizable.insert(d);
    }

    /// Whether `d` is a non-static member (receives a receiver).
    pub fn is_non_static_member(&self, d: DeclId) -> bool {
        if !self.is_member(d) {
            return false;
        }
        match &self.ast.decl(d).kind {
            DeclKind::Function(f) => !f.is_static,
            DeclKind::MethodBundle(_) | DeclKind::Subscript(_) => true,
            DeclKind::Binding(b) => !b.is_static,
            DeclKind::Var(_) => true,
            _ => false,
        }
    }

    /// Whether `d` is local to a function-like body.
    pub fn is_local(&self, d: DeclId) -> bool {
        self.scopes_from(self.decl_scope(d)).any(|s| match self.scope_kind(s) {
            ScopeKind::Brace(_) | ScopeKind::Loop(_) | ScopeKind::Conditional(_) => true,
            ScopeKind::Decl(owner) => matches!(
                self.ast.decl(*owner).kind,
                DeclKind::Function(_)
                    | DeclKind::Initializer(_)
                    | DeclKind::MethodBundle(_)
                    | DeclKind::MethodImpl(_)
                    | DeclKind::Subscript(_)
                    | DeclKind::SubscriptImpl(_)
            ),
            _ => false,
        })
    }

    /// Whether `d` is reachable without a receiver or enclosing frame.
    pub fn is_global(&self, d: DeclId) -> bool {
        if self.is_local(d) {
            return false;
        }
        match self.scope_kind(self.decl_scope(d)) {
            ScopeKind::Module { .. } | ScopeKind::TranslationUnit => true,
            ScopeKind::Decl(owner) => match &self.ast.decl(*owner).kind {
                DeclKind::Namespace(_) => true,
                DeclKind::Product(_)
                | DeclKind::Trait(_)
                | DeclKind::Conformance(_)
                | DeclKind::Extension(_) => match &self.ast.decl(d).kind {
                    DeclKind::Function(f) => f.is_static,
                    DeclKind::Binding(b) => b.is_static,
                    DeclKind::Product(_)
                    | DeclKind::Trait(_)
                    | DeclKind::TypeAlias(_)
                    | DeclKind::Initializer(_) => true,
                    _ => false,
                },
                _ => false,
            },
            _ => false,
        }
    }

    // ── Binding structure ──────────────────────────────────────────────

    /// The binding declaration that introduces variable `v`.
    pub fn var_to_binding(&self, v: DeclId) -> Option<DeclId> {
        self.var_binding.get(&v).copied()
    }

    /// The variables introduced by binding `b`, in pattern order.
    pub fn vars_of_binding(&self, b: DeclId) -> &[DeclId] {
        self.binding_vars.get(&b).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The implicit `Self` parameter of a trait.
    pub fn trait_self(&self, t: DeclId) -> Option<DeclId> {
        self.trait_self.get(&t).copied()
    }
}

// ── Synthesis pass ──────────────────────────────────────────────────────

/// Pre-checking synthesis: memberwise initializers for products and the
/// implicit `Self` parameter of traits. Runs before scoping so the
/// checker never mutates the AST.
fn prepare(ast: &mut Ast) {
    for d in ast.decl_ids().collect::<Vec<_>>() {
        match &ast.decl(d).kind {
            DeclKind::Product(p) => {
                let has_init = p.members.iter().any(|&m| {
                    matches!(ast.decl(m).kind, DeclKind::Initializer(_))
                });
                if !has_init {
                    let init = ast.push_decl(
                        DeclKind::Initializer(InitializerDecl {
                            generic: None,
                            parameters: Vec::new(),
                            body: None,
                            is_memberwise: true,
                        }),
                        Span::DUMMY,
                    );
                    if let DeclKind::Product(p) = &mut ast.decl_mut(d).kind {
                        p.members.push(init);
                    }
                }
            }
            DeclKind::Trait(t) => {
                if t.self_parameter.is_none() {
                    let self_param = ast.push_decl(
                        DeclKind::GenericParameter(GenericParameterDecl {
                            name: "Self".into(),
                            annotations: Vec::new(),
                        }),
                        Span::DUMMY,
                    );
                    if let DeclKind::Trait(t) = &mut ast.decl_mut(d).kind {
                        t.self_parameter = Some(self_param);
                        t.members.insert(0, self_param);
                    }
                }
            }
            _ => {}
        }
    }
}

// ── The walker ──────────────────────────────────────────────────────────

struct Scoper {
    program: ScopedProgram,
}

impl Scoper {
    fn run(&mut self) {
        for m in 0..self.program.ast.modules.len() {
            let module = self.program.ast.modules[m].clone();
            let module_scope = self.new_scope(
                ScopeKind::Module { name: module.name.clone() },
                None,
            );
            self.program
                .module_scopes
                .insert(module.name.clone(), module_scope);
            self.program.module_scope_list.push(module_scope);
            for unit in &module.units {
                let unit_scope =
                    self.new_scope(ScopeKind::TranslationUnit, Some(module_scope));
                self.program
                    .unit_imports
                    .insert(unit_scope, unit.imports.clone());
                for &d in &unit.decls {
                    self.walk_decl(d, unit_scope);
                }
            }
        }
    }

    fn new_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.program.scopes.len() as u32);
        self.program.scopes.push(ScopeData { kind, parent });
        self.program.scope_decls.push(Vec::new());
        id
    }

    fn introduce(&mut self, d: DeclId, parent: ScopeId) -> ScopeId {
        let s = self.new_scope(ScopeKind::Decl(d), Some(parent));
        self.program.introduced.insert(d, s);
        s
    }

    fn walk_decl(&mut self, d: DeclId, scope: ScopeId) {
        self.program.decl_scope.insert(d, scope);
        self.program.scope_decls[scope.index()].push(d);

        let kind = self.program.ast.decl(d).kind.clone();
        match kind {
            DeclKind::Product(p) => {
                let inner = self.introduce(d, scope);
                self.walk_generic_clause(p.generic.as_ref(), inner);
                for t in &p.conformances {
                    self.walk_type_expr(*t, inner);
                }
                for &m in &p.members {
                    self.walk_decl(m, inner);
                }
            }
            DeclKind::Trait(t) => {
                let inner = self.introduce(d, scope);
                for r in &t.refinements {
                    self.walk_type_expr(*r, inner);
                }
                if let Some(sp) = t.self_parameter {
                    self.program.trait_self.insert(d, sp);
                }
                for &m in &t.members {
                    self.walk_decl(m, inner);
                }
            }
            DeclKind::TypeAlias(a) => {
                let inner = self.introduce(d, scope);
                self.walk_generic_clause(a.generic.as_ref(), inner);
                self.walk_type_expr(a.aliased, inner);
            }
            DeclKind::Conformance(c) => {
                // The subject is named from outside the extension body.
                self.walk_type_expr(c.subject, scope);
                let inner = self.introduce(d, scope);
                for t in &c.conformances {
                    self.walk_type_expr(*t, inner);
                }
                self.walk_where_clauses(&c.constraints, inner);
                for &m in &c.members {
                    self.walk_decl(m, inner);
                }
            }
            DeclKind::Extension(e) => {
                self.walk_type_expr(e.subject, scope);
                let inner = self.introduce(d, scope);
                self.walk_where_clauses(&e.constraints, inner);
                for &m in &e.members {
                    self.walk_decl(m, inner);
                }
            }
            DeclKind::Namespace(n) => {
                let inner = self.introduce(d, scope);
                for &m in &n.members {
                    self.walk_decl(m, inner);
                }
            }
            DeclKind::Function(f) => {
                let inner = self.introduce(d, scope);
                self.walk_generic_clause(f.generic.as_ref(), inner);
                for &c in &f.explicit_captures {
                    self.walk_decl(c, inner);
                }
                for &p in &f.parameters {
                    self.walk_decl(p, inner);
                }
                if let Some(out) = f.output {
                    self.walk_type_expr(out, inner);
                }
                if let Some(body) = &f.body {
                    self.walk_function_body(body, inner);
                }
            }
            DeclKind::Initializer(i) => {
                let inner = self.introduce(d, scope);
                self.walk_generic_clause(i.generic.as_ref(), inner);
                for &p in &i.parameters {
                    self.walk_decl(p, inner);
                }
                if let Some(body) = i.body {
                    self.walk_stmt(body, inner);
                }
            }
            DeclKind::MethodBundle(m) => {
                let inner = self.introduce(d, scope);
                self.walk_generic_clause(m.generic.as_ref(), inner);
                for &p in &m.parameters {
                    self.walk_decl(p, inner);
                }
                if let Some(out) = m.output {
                    self.walk_type_expr(out, inner);
                }
                for &i in &m.impls {
                    self.walk_decl(i, inner);
                }
            }
            DeclKind::MethodImpl(i) => {
                let inner = self.introduce(d, scope);
                if let Some(body) = &i.body {
                    self.walk_function_body(body, inner);
                }
            }
            DeclKind::Subscript(s) => {
                let inner = self.introduce(d, scope);
                self.walk_generic_clause(s.generic.as_ref(), inner);
                for &c in &s.explicit_captures {
                    self.walk_decl(c, inner);
                }
                for &p in &s.parameters {
                    self.walk_decl(p, inner);
                }
                self.walk_type_expr(s.output, inner);
                for &i in &s.impls {
                    self.walk_decl(i, inner);
                }
            }
            DeclKind::SubscriptImpl(i) => {
                let inner = self.introduce(d, scope);
                if let Some(body) = &i.body {
                    self.walk_function_body(body, inner);
                }
            }
            DeclKind::Binding(b) => {
                self.walk_pattern(b.pattern, scope, d);
                if let Some(init) = b.initializer {
                    self.walk_expr(init, scope);
                }
            }
            DeclKind::Parameter(p) => {
                if let Some(ann) = p.annotation {
                    self.walk_type_expr(ann, scope);
                }
                if let Some(def) = p.default {
                    self.walk_expr(def, scope);
                }
            }
            DeclKind::GenericParameter(g) => {
                for a in &g.annotations {
                    self.walk_type_expr(*a, scope);
                }
            }
            DeclKind::AssociatedValue(v) => {
                if let Some(ann) = v.annotation {
                    self.walk_type_expr(ann, scope);
                }
            }
            DeclKind::AssociatedType(_)
            | DeclKind::Operator(_)
            | DeclKind::Var(_) => {}
        }
    }

    fn walk_generic_clause(&mut self, clause: Option<&GenericClause>, scope: ScopeId) {
        let Some(clause) = clause else { return };
        for &p in &clause.parameters {
            self.walk_decl(p, scope);
        }
        self.walk_where_clauses(&clause.constraints, scope);
    }

    fn walk_where_clauses(&mut self, clauses: &[WhereClause], scope: ScopeId) {
        for c in clauses {
            match c {
                WhereClause::Equality { lhs, rhs } => {
                    self.walk_type_expr(*lhs, scope);
                    self.walk_type_expr(*rhs, scope);
                }
                WhereClause::Bound { subject, traits } => {
                    self.walk_type_expr(*subject, scope);
                    for t in traits {
                        self.walk_type_expr(*t, scope);
                    }
                }
                WhereClause::Value(e) => self.walk_expr(*e, scope),
            }
        }
    }

    fn walk_function_body(&mut self, body: &FunctionBody, scope: ScopeId) {
        match body {
            FunctionBody::Expr(e) => self.walk_expr(*e, scope),
            FunctionBody::Block(s) => self.walk_stmt(*s, scope),
        }
    }

    fn walk_pattern(&mut self, p: PatId, scope: ScopeId, binding: DeclId) {
        let kind = self.program.ast.pat(p).kind.clone();
        match kind {
            PatKind::Binding(b) => {
                if let Some(ann) = b.annotation {
                    self.walk_type_expr(ann, scope);
                }
                self.walk_pattern(b.subpattern, scope, binding);
            }
            PatKind::Name(n) => {
                self.program.decl_scope.insert(n.var, scope);
                self.program.scope_decls[scope.index()].push(n.var);
                self.program.var_binding.insert(n.var, binding);
                self.program
                    .binding_vars
                    .entry(binding)
                    .or_default()
                    .push(n.var);
            }
            PatKind::Tuple(elems) => {
                for e in &elems {
                    self.walk_pattern(e.pattern, scope, binding);
                }
            }
            PatKind::Wildcard => {}
        }
    }

    fn walk_stmt(&mut self, s: StmtId, scope: ScopeId) {
        let kind = self.program.ast.stmt(s).kind.clone();
        match kind {
            StmtKind::Brace(children) => {
                let inner = self.new_scope(ScopeKind::Brace(s), Some(scope));
                self.program.brace_scope.insert(s, inner);
                for c in children {
                    self.walk_stmt(c, inner);
                }
            }
            StmtKind::Assign { left, right } => {
                self.walk_expr(left, scope);
                self.walk_expr(right, scope);
            }
            StmtKind::While { conditions, body } => {
                let inner = self.new_scope(ScopeKind::Loop(s), Some(scope));
                for c in &conditions {
                    self.walk_condition(c, inner);
                }
                self.walk_stmt(body, inner);
            }
            StmtKind::DoWhile { body, condition } => {
                self.walk_stmt(body, scope);
                // The condition sees bindings introduced in the body.
                let body_scope = self
                    .program
                    .brace_scope
                    .get(&body)
                    .copied()
                    .unwrap_or(scope);
                self.walk_expr(condition, body_scope);
            }
            StmtKind::Return { value } => {
                if let Some(v) = value {
                    self.walk_expr(v, scope);
                }
            }
            StmtKind::Yield { value } => self.walk_expr(value, scope),
            StmtKind::Discard { expr } => self.walk_expr(expr, scope),
            StmtKind::Decl(d) => self.walk_decl(d, scope),
            StmtKind::Expr(e) => self.walk_expr(e, scope),
        }
    }

    fn walk_condition(&mut self, c: &ConditionItem, scope: ScopeId) {
        match c {
            ConditionItem::Expr(e) => self.walk_expr(*e, scope),
            ConditionItem::Decl(d) => self.walk_decl(*d, scope),
        }
    }

    fn walk_expr(&mut self, e: ExprId, scope: ScopeId) {
        self.program.expr_scope.insert(e, scope);
        let kind = self.program.ast.expr(e).kind.clone();
        match kind {
            ExprKind::BooleanLiteral(_)
            | ExprKind::IntegerLiteral(_)
            | ExprKind::FloatLiteral(_)
            | ExprKind::StringLiteral(_) => {}
            ExprKind::Name(n) => {
                if let Domain::Expr(d) = n.domain {
                    self.walk_expr(d, scope);
                }
                for a in &n.arguments {
                    self.walk_type_arg(a, scope);
                }
            }
            ExprKind::Call(c) | ExprKind::SubscriptCall(c) => {
                self.walk_expr(c.callee, scope);
                for a in &c.arguments {
                    self.walk_expr(a.value, scope);
                }
            }
            ExprKind::Lambda(l) => {
                self.walk_decl(l.decl, scope);
            }
            ExprKind::Cast(c) => {
                self.walk_expr(c.subject, scope);
                self.walk_type_expr(c.target, scope);
            }
            ExprKind::Inout(i) => self.walk_expr(i.subject, scope),
            ExprKind::Sequence(s) => {
                self.walk_expr(s.head, scope);
                for t in &s.tail {
                    self.walk_expr(t.operator, scope);
                    self.walk_expr(t.operand, scope);
                }
            }
            ExprKind::Tuple(elems) => {
                for el in &elems {
                    self.walk_expr(el.value, scope);
                }
            }
            ExprKind::Conditional(c) => {
                let inner = self.new_scope(ScopeKind::Conditional(e), Some(scope));
                for cond in &c.conditions {
                    self.walk_condition(cond, inner);
                }
                self.walk_branch(&c.success, inner);
                if let Some(f) = &c.failure {
                    self.walk_branch(f, scope);
                }
            }
        }
    }

    fn walk_branch(&mut self, b: &Branch, scope: ScopeId) {
        match b {
            Branch::Expr(e) => self.walk_expr(*e, scope),
            Branch::Block(s) => self.walk_stmt(*s, scope),
        }
    }

    fn walk_type_arg(&mut self, a: &TypeArgExpr, scope: ScopeId) {
        match a {
            TypeArgExpr::Type(t) => self.walk_type_expr(*t, scope),
            TypeArgExpr::Value(e) => self.walk_expr(*e, scope),
        }
    }

    fn walk_type_expr(&mut self, t: TypeExprId, scope: ScopeId) {
        self.program.type_expr_scope.insert(t, scope);
        let kind = self.program.ast.type_expr(t).kind.clone();
        match kind {
            TypeExprKind::Name(n) => {
                if let Some(d) = n.domain {
                    self.walk_type_expr(d, scope);
                }
                for a in &n.arguments {
                    self.walk_type_arg(a, scope);
                }
            }
            TypeExprKind::Tuple(elems) => {
                for e in &elems {
                    self.walk_type_expr(e.type_expr, scope);
                }
            }
            TypeExprKind::Lambda(l) => {
                if let Some(env) = l.environment {
                    self.walk_type_expr(env, scope);
                }
                for p in &l.inputs {
                    self.walk_type_expr(p.type_expr, scope);
                }
                self.walk_type_expr(l.output, scope);
            }
            TypeExprKind::Parameter(p) => self.walk_type_expr(p.bare, scope),
            TypeExprKind::Lens(l) => {
                self.walk_type_expr(l.subject, scope);
                self.walk_type_expr(l.lens, scope);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{FunctionDecl, ParameterDecl, ProductDecl, TraitDecl};
    use crate::lang::AccessEffect;
    use crate::node::{Module, TranslationUnit};

    fn one_module(ast: Ast, decls: Vec<DeclId>) -> ScopedProgram {
        let mut ast = ast;
        ast.modules.push(Module {
            name: "Main".into(),
            units: vec![TranslationUnit { decls, imports: Vec::new(), span: Span::DUMMY }],
            span: Span::DUMMY,
        });
        ScopedProgram::new(ast)
    }

    #[test]
    fn function_parameters_live_in_the_function_scope() {
        let mut ast = Ast::new();
        let p = ast.push_decl(
            DeclKind::Parameter(ParameterDecl {
                label: None,
                name: "x".into(),
                convention: AccessEffect::Let,
                annotation: None,
                default: None,
            }),
            Span::DUMMY,
        );
        let f = ast.push_decl(
            DeclKind::Function(FunctionDecl {
                identifier: Some("f".into()),
                notation: None,
                generic: None,
                explicit_captures: Vec::new(),
                parameters: vec![p],
                receiver_effect: None,
                is_static: false,
                output: None,
                body: None,
            }),
            Span::DUMMY,
        );
        let program = one_module(ast, vec![f]);
        let f_scope = program.scope_introducing(f).unwrap();
        assert_eq!(program.decl_scope(p), f_scope);
        assert!(program.is_local(p));
        assert!(!program.is_member(p));
    }

    #[test]
    fn products_get_a_memberwise_initializer() {
        let mut ast = Ast::new();
        let a = ast.push_decl(
            DeclKind::Product(ProductDecl {
                name: "A".into(),
                generic: None,
                conformances: Vec::new(),
                members: Vec::new(),
            }),
            Span::DUMMY,
        );
        let program = one_module(ast, vec![a]);
        let inner = program.scope_introducing(a).unwrap();
        let has_init = program.decls_in(inner).iter().any(|&m| {
            matches!(program.ast().decl(m).kind, DeclKind::Initializer(ref i) if i.is_memberwise)
        });
        assert!(has_init);
    }

    #[test]
    fn traits_get_an_implicit_self_parameter() {
        let mut ast = Ast::new();
        let t = ast.push_decl(
            DeclKind::Trait(TraitDecl {
                name: "P".into(),
                refinements: Vec::new(),
                members: Vec::new(),
                self_parameter: None,
            }),
            Span::DUMMY,
        );
        let program = one_module(ast, vec![t]);
        let self_param = program.trait_self(t).expect("Self must be synthesized");
        assert_eq!(
            program.decl_scope(self_param),
            program.scope_introducing(t).unwrap()
        );
    }
}
