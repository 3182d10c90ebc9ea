//! Name lookup: unqualified, member, and operator lookup, plus the
//! conformance closure.
//!
//! Unqualified lookup walks outer scopes from the use site, skipping
//! file scopes, honoring shadowing by non-overloadable matches, and
//! finishing with the module root and imported modules. Member lookup
//! is memoized by `(canonical type, scope)` and broadened by extensions
//! and, when nothing froze the result, by inherited trait members.

use rustc_hash::FxHashMap;
use sable_ast::decl::DeclKind;
use sable_ast::{DeclId, OperatorNotation, PrecedenceGroup, ScopeId, ScopeKind};

use crate::error::TypeError;
use crate::ty::Ty;
use crate::TypeChecker;

impl<'p> TypeChecker<'p> {
    // ── Names introduced in a scope ────────────────────────────────────

    /// The names a single declaration contributes to its scope.
    pub(crate) fn names_of_decl(&self, d: DeclId) -> Option<String> {
        match &self.program.ast().decl(d).kind {
            DeclKind::Product(p) => Some(p.name.clone()),
            DeclKind::Trait(t) => Some(t.name.clone()),
            DeclKind::TypeAlias(a) => Some(a.name.clone()),
            DeclKind::Namespace(n) => Some(n.name.clone()),
            DeclKind::Var(v) => Some(v.name.clone()),
            DeclKind::Parameter(p) => Some(p.name.clone()),
            DeclKind::GenericParameter(g) => Some(g.name.clone()),
            DeclKind::AssociatedType(a) => Some(a.name.clone()),
            DeclKind::AssociatedValue(v) => Some(v.name.clone()),
            DeclKind::Function(f) => f.identifier.clone(),
            DeclKind::Initializer(_) => Some("init".into()),
            DeclKind::MethodBundle(m) => Some(m.identifier.clone()),
            DeclKind::Subscript(s) => {
                Some(s.identifier.clone().unwrap_or_else(|| "[]".into()))
            }
            // Bindings expose their variables, which are separate
            // declarations; extensions, implementations and operator
            // declarations contribute nothing.
            DeclKind::Binding(_)
            | DeclKind::Conformance(_)
            | DeclKind::Extension(_)
            | DeclKind::MethodImpl(_)
            | DeclKind::SubscriptImpl(_)
            | DeclKind::Operator(_) => None,
        }
    }

    /// The names introduced in a scope, as a name-to-declarations table.
    /// For a module scope, the union of all its translation units.
    pub(crate) fn names_in_scope(&self, s: ScopeId) -> FxHashMap<String, Vec<DeclId>> {
        let mut table: FxHashMap<String, Vec<DeclId>> = FxHashMap::default();
        if matches!(self.program.scope_kind(s), ScopeKind::Module { .. }) {
            for unit in self.unit_scopes(s) {
                self.collect_names(unit, &mut table);
            }
        } else {
            self.collect_names(s, &mut table);
        }
        table
    }

    fn collect_names(&self, s: ScopeId, table: &mut FxHashMap<String, Vec<DeclId>>) {
        for &d in self.program.decls_in(s) {
            if let Some(name) = self.names_of_decl(d) {
                table.entry(name).or_default().push(d);
            }
        }
    }

    fn is_overloadable(&self, d: DeclId) -> bool {
        self.program.ast().decl(d).kind.is_overloadable()
    }

    /// Filter out variables whose binding initializer is currently
    /// being inferred: an initializer cannot see its own variables.
    fn visible_under_binding_guard(&self, d: DeclId) -> bool {
        match self.program.var_to_binding(d) {
            Some(b) => !self.bindings_under_checking.contains(&b),
            None => true,
        }
    }

    // ── Unqualified lookup ─────────────────────────────────────────────

    /// Look up `name` from `scope`, walking outward. Returns every
    /// matching declaration, shadowing included.
    pub(crate) fn lookup_unqualified(&mut self, name: &str, scope: ScopeId) -> Vec<DeclId> {
        let mut matches: Vec<DeclId> = Vec::new();
        let scopes: Vec<ScopeId> = self.program.scopes_from(scope).collect();
        let mut module_scope = None;
        for s in scopes {
            if matches!(self.program.scope_kind(s), ScopeKind::TranslationUnit) {
                // File scopes are searched through their module so that
                // sibling units are not traversed twice.
                continue;
            }
            if matches!(self.program.scope_kind(s), ScopeKind::Module { .. }) {
                module_scope = Some(s);
            }
            let table = self.names_in_scope(s);
            let Some(found) = table.get(name) else { continue };
            let mut froze = false;
            for &d in found {
                if !self.visible_under_binding_guard(d) {
                    continue;
                }
                if !matches.contains(&d) {
                    matches.push(d);
                }
                if !self.is_overloadable(d) {
                    froze = true;
                }
            }
            if froze {
                return matches;
            }
        }
        // Other imported modules, after the innermost module root.
        if let Some(module) = module_scope {
            for import in self.program.imports_visible_from(scope).to_vec() {
                let Some(imported) = self.program.module_named(&import) else { continue };
                if imported == module {
                    continue;
                }
                let table = self.names_in_scope(imported);
                if let Some(found) = table.get(name) {
                    for &d in found {
                        if !matches.contains(&d) {
                            matches.push(d);
                        }
                    }
                }
            }
        }
        matches
    }

    // ── Member lookup ──────────────────────────────────────────────────

    /// The nominal declaration a type is headed by, if any.
    pub(crate) fn head_decl(&self, ty: &Ty) -> Option<DeclId> {
        match ty {
            Ty::Product(d) | Ty::Trait(d) => Some(*d),
            Ty::Alias { aliased, .. } => self.head_decl(aliased),
            Ty::BoundGeneric { base, .. } => self.head_decl(base),
            Ty::Skolem(base) => self.head_decl(base),
            Ty::Metatype(inner) => self.head_decl(inner),
            Ty::Lens { lens, .. } => Some(*lens),
            _ => None,
        }
    }

    /// Members of `ty` named `name`, visible from `scope`.
    pub(crate) fn lookup_member(
        &mut self,
        ty: &Ty,
        name: &str,
        scope: ScopeId,
    ) -> Vec<DeclId> {
        let canonical = self.canonical(ty);
        let table = self.member_table(&canonical, scope);
        let mut out = table.get(name).cloned().unwrap_or_default();
        let frozen = out.iter().any(|&d| !self.is_overloadable(d));
        if !frozen {
            for trait_decl in self.conformed_traits(&canonical, scope) {
                let Some(trait_scope) = self.program.scope_introducing(trait_decl) else {
                    continue;
                };
                let inherited = self.names_in_scope(trait_scope);
                if let Some(found) = inherited.get(name) {
                    for &d in found {
                        if !out.contains(&d) {
                            out.push(d);
                        }
                    }
                }
            }
        }
        out
    }

    /// The direct-plus-extension member table of a canonical type,
    /// memoized per `(type, scope)` when complete.
    fn member_table(
        &mut self,
        canonical: &Ty,
        scope: ScopeId,
    ) -> FxHashMap<String, Vec<DeclId>> {
        let key = (canonical.clone(), scope);
        if let Some(table) = self.member_lookup_tables.get(&key) {
            return table.clone();
        }
        let (table, complete) = self.compute_member_table(canonical, scope);
        if complete {
            self.member_lookup_tables.insert(key, table.clone());
        }
        table
    }

    fn compute_member_table(
        &mut self,
        canonical: &Ty,
        scope: ScopeId,
    ) -> (FxHashMap<String, Vec<DeclId>>, bool) {
        match canonical {
            Ty::BoundGeneric { base, .. } => {
                return self.compute_member_table(&base.clone(), scope)
            }
            Ty::Metatype(inner) => return self.compute_member_table(&inner.clone(), scope),
            _ => {}
        }
        let mut table: FxHashMap<String, Vec<DeclId>> = FxHashMap::default();
        if let Some(head) = self.head_decl(canonical) {
            if let Some(inner) = self.program.scope_introducing(head) {
                self.collect_names(inner, &mut table);
            }
        }
        let (extensions, complete) = self.extensions_of(canonical, scope);
        for ext in extensions {
            if let Some(inner) = self.program.scope_introducing(ext) {
                self.collect_names(inner, &mut table);
            }
        }
        (table, complete)
    }

    /// Extension and conformance declarations of a canonical type that
    /// are exposed at `scope`. The second component is `false` when an
    /// extension was skipped because its subject is being bound, in
    /// which case the result must not be memoized.
    pub(crate) fn extensions_of(
        &mut self,
        canonical: &Ty,
        scope: ScopeId,
    ) -> (Vec<DeclId>, bool) {
        let Some(target) = self.head_decl(canonical) else {
            return (Vec::new(), true);
        };
        let mut out = Vec::new();
        let mut complete = true;

        let mut candidate_scopes: Vec<ScopeId> = self.program.scopes_from(scope).collect();
        for import in self.program.imports_visible_from(scope).to_vec() {
            if let Some(m) = self.program.module_named(&import) {
                if !candidate_scopes.contains(&m) {
                    candidate_scopes.push(m);
                }
            }
        }

        let mut decls: Vec<DeclId> = Vec::new();
        for s in candidate_scopes {
            if matches!(self.program.scope_kind(s), ScopeKind::Module { .. }) {
                for unit in self.unit_scopes(s) {
                    decls.extend_from_slice(self.program.decls_in(unit));
                }
            } else {
                decls.extend_from_slice(self.program.decls_in(s));
            }
        }

        for d in decls {
            let subject = match &self.program.ast().decl(d).kind {
                DeclKind::Conformance(c) => c.subject,
                DeclKind::Extension(e) => e.subject,
                _ => continue,
            };
            if self.extensions_under_binding.contains(&d) {
                complete = false;
                continue;
            }
            self.extensions_under_binding.insert(d);
            let subject_scope = self.program.decl_scope(d);
            let realized = self.realize_type_expr(subject, subject_scope);
            self.extensions_under_binding.remove(&d);
            let subject_ty = match realized {
                Ty::Metatype(inner) => *inner,
                other => other,
            };
            if self.head_decl(&subject_ty) == Some(target) && !out.contains(&d) {
                out.push(d);
            }
        }
        (out, complete)
    }

    // ── Conformance closure ────────────────────────────────────────────

    /// The traits `ty` conforms to, closed over refinements. Order is
    /// deterministic: declaration order, then extension order.
    pub(crate) fn conformed_traits(&mut self, ty: &Ty, scope: ScopeId) -> Vec<DeclId> {
        let canonical = self.canonical(ty);
        let mut out: Vec<DeclId> = Vec::new();
        match &canonical {
            Ty::GenericTypeParam(d) => {
                let param_scope = self.program.decl_scope(*d);
                // A generic parameter declared at trait scope conforms
                // to the enclosing trait alone (plus refinements).
                if let ScopeKind::Decl(owner) = self.program.scope_kind(param_scope) {
                    if matches!(self.program.ast().decl(*owner).kind, DeclKind::Trait(_)) {
                        self.trait_closure(*owner, &mut out, &mut Vec::new());
                        return out;
                    }
                }
                let annotations = match &self.program.ast().decl(*d).kind {
                    DeclKind::GenericParameter(g) => g.annotations.clone(),
                    _ => Vec::new(),
                };
                for a in annotations {
                    let realized = self.realize_type_expr(a, param_scope);
                    if let Some(t) = self.trait_of(&realized) {
                        self.trait_closure(t, &mut out, &mut Vec::new());
                    }
                }
            }
            Ty::Skolem(base) => {
                let base = base.clone();
                return self.conformed_traits(&base, scope);
            }
            Ty::Product(d) => {
                let conformances = match &self.program.ast().decl(*d).kind {
                    DeclKind::Product(p) => p.conformances.clone(),
                    _ => Vec::new(),
                };
                let inner = self.program.scope_introducing(*d).unwrap_or(scope);
                for c in conformances {
                    let realized = self.realize_type_expr(c, inner);
                    if let Some(t) = self.trait_of(&realized) {
                        self.trait_closure(t, &mut out, &mut Vec::new());
                    }
                }
                // Conformances declared by extensions.
                let (extensions, _) = self.extensions_of(&canonical, scope);
                for ext in extensions {
                    let listed = match &self.program.ast().decl(ext).kind {
                        DeclKind::Conformance(c) => c.conformances.clone(),
                        _ => continue,
                    };
                    let ext_scope = self.program.scope_introducing(ext).unwrap_or(scope);
                    for c in listed {
                        let realized = self.realize_type_expr(c, ext_scope);
                        if let Some(t) = self.trait_of(&realized) {
                            self.trait_closure(t, &mut out, &mut Vec::new());
                        }
                    }
                }
            }
            Ty::Trait(d) => {
                self.trait_closure(*d, &mut out, &mut Vec::new());
            }
            Ty::BoundGeneric { base, .. } => {
                let base = base.clone();
                return self.conformed_traits(&base, scope);
            }
            Ty::Lens { lens, .. } => {
                self.trait_closure(*lens, &mut out, &mut Vec::new());
            }
            _ => {}
        }
        out
    }

    fn trait_of(&self, ty: &Ty) -> Option<DeclId> {
        match ty {
            Ty::Metatype(inner) => self.trait_of(inner),
            Ty::Trait(d) => Some(*d),
            _ => None,
        }
    }

    /// Close `t` over its refinement list, erroring on self-refinement
    /// cycles; includes the trait itself.
    pub(crate) fn trait_closure(
        &mut self,
        t: DeclId,
        out: &mut Vec<DeclId>,
        stack: &mut Vec<DeclId>,
    ) {
        if stack.contains(&t) {
            let decl = self.program.ast().decl(t);
            let name = match &decl.kind {
                DeclKind::Trait(tr) => tr.name.clone(),
                _ => String::new(),
            };
            let span = decl.span;
            self.report(TypeError::CircularRefinement { name, span });
            return;
        }
        if out.contains(&t) {
            return;
        }
        out.push(t);
        stack.push(t);
        let refinements = match &self.program.ast().decl(t).kind {
            DeclKind::Trait(tr) => tr.refinements.clone(),
            _ => Vec::new(),
        };
        let inner = self
            .program
            .scope_introducing(t)
            .unwrap_or_else(|| self.program.decl_scope(t));
        for r in refinements {
            let realized = self.realize_type_expr(r, inner);
            if let Some(refined) = self.trait_of(&realized) {
                self.trait_closure(refined, out, stack);
            }
        }
        stack.pop();
    }

    // ── Operator lookup ────────────────────────────────────────────────

    /// Register the operator declarations of a module, rejecting
    /// duplicates per `(notation, name, module)`.
    pub(crate) fn register_operators(&mut self, module: ScopeId) {
        let mut decls = Vec::new();
        for unit in self.unit_scopes(module) {
            decls.extend_from_slice(self.program.decls_in(unit));
        }
        for d in decls {
            let (notation, name, span) = match &self.program.ast().decl(d).kind {
                DeclKind::Operator(o) => {
                    (o.notation, o.name.clone(), self.program.ast().decl(d).span)
                }
                _ => continue,
            };
            let key = (notation, name.clone(), module);
            if let Some(&previous) = self.operator_table.get(&key) {
                if previous == d {
                    continue;
                }
                let previous_span = self.program.ast().decl(previous).span;
                self.report(TypeError::DuplicateOperator {
                    name,
                    span,
                    previous: previous_span,
                });
            } else {
                self.operator_table.insert(key, d);
            }
        }
    }

    /// Find the operator declaration for `name` with the given notation,
    /// searching the enclosing module then imported modules.
    pub(crate) fn lookup_operator(
        &mut self,
        name: &str,
        notation: OperatorNotation,
        scope: ScopeId,
    ) -> Option<DeclId> {
        let module = self.program.module_containing(scope);
        let key = (notation, name.to_string(), module);
        if let Some(&d) = self.operator_table.get(&key) {
            return Some(d);
        }
        for import in self.program.imports_visible_from(scope).to_vec() {
            let Some(m) = self.program.module_named(&import) else { continue };
            let key = (notation, name.to_string(), m);
            if let Some(&d) = self.operator_table.get(&key) {
                return Some(d);
            }
        }
        None
    }

    /// The precedence group of an infix operator declaration.
    pub(crate) fn operator_precedence(&self, d: DeclId) -> PrecedenceGroup {
        match &self.program.ast().decl(d).kind {
            DeclKind::Operator(o) => o.precedence.unwrap_or(PrecedenceGroup::Addition),
            _ => PrecedenceGroup::Addition,
        }
    }
}
