//! Implicit-capture analysis for local functions and subscripts.
//!
//! The walker collects undomained name uses in a declaration's body,
//! marks the roots of `&` expressions as mutable uses, and does not
//! descend into nested type scopes. Uses that resolve to declarations
//! neither contained in the subject nor global become captures, one per
//! name, `inout` iff any use was mutable.

use sable_ast::decl::{DeclKind, FunctionBody};
use sable_ast::expr::{Branch, ConditionItem, Domain, ExprKind};
use sable_ast::stmt::StmtKind;
use sable_ast::{AccessEffect, DeclId, ExprId, StmtId};
use sable_common::Span;

use crate::error::TypeError;
use crate::ty::{TupleElem, Ty};
use crate::{DeclRef, ImplicitCapture, TypeChecker};

/// One raw name use collected from a body.
struct NameUse {
    name: String,
    site: ExprId,
    span: Span,
    mutable: bool,
}

impl<'p> TypeChecker<'p> {
    /// Discover the implicit captures of a local function or subscript,
    /// record them, and return their environment elements in first-use
    /// order.
    pub(crate) fn collect_implicit_captures(&mut self, d: DeclId) -> Vec<TupleElem> {
        let mut walker = UseWalker { program: self.program, uses: Vec::new() };
        match &self.program.ast().decl(d).kind {
            DeclKind::Function(f) => {
                if let Some(body) = &f.body {
                    walker.walk_body(body);
                }
            }
            DeclKind::Subscript(s) => {
                for &i in &s.impls {
                    if let DeclKind::SubscriptImpl(si) = &self.program.ast().decl(i).kind {
                        if let Some(body) = &si.body {
                            walker.walk_body(body);
                        }
                    }
                }
            }
            _ => return Vec::new(),
        }
        let uses = walker.uses;

        // Collapse uses to one capture per name, in first-use order.
        let mut names: Vec<String> = Vec::new();
        for u in &uses {
            if !names.contains(&u.name) {
                names.push(u.name.clone());
            }
        }

        let mut captures: Vec<ImplicitCapture> = Vec::new();
        let mut elems: Vec<TupleElem> = Vec::new();
        for name in names {
            let name_uses: Vec<&NameUse> = uses.iter().filter(|u| u.name == name).collect();
            let first = name_uses[0];
            let scope = self.program.expr_scope(first.site);
            let found = self.lookup_unqualified(&name, scope);
            let mut candidates: Vec<DeclId> = Vec::new();
            for c in found {
                if c == d {
                    continue;
                }
                if self.program.is_contained(self.program.decl_scope(c), d) {
                    continue;
                }
                if self.program.is_global(c) {
                    continue;
                }
                // A member seen from a local function is a cross-receiver
                // reference; it is filtered out, not diagnosed here.
                if self.program.is_member(c) {
                    continue;
                }
                if self.is_captureless_function(c) {
                    continue;
                }
                candidates.push(c);
            }
            match candidates.len() {
                0 => {}
                1 => {
                    let referent = candidates[0];
                    let mutable = name_uses.iter().any(|u| u.mutable);
                    let access =
                        if mutable { AccessEffect::Inout } else { AccessEffect::Let };
                    let bare = self.realize_decl(referent).bare().clone();
                    elems.push(TupleElem {
                        label: Some(name.clone()),
                        ty: Ty::Remote { access, bare: Box::new(bare) },
                    });
                    captures.push(ImplicitCapture {
                        name,
                        access,
                        referent: DeclRef::Direct(referent),
                    });
                }
                _ => {
                    self.report(TypeError::AmbiguousImplicitCapture {
                        name,
                        span: first.span,
                    });
                }
            }
        }
        self.implicit_captures.insert(d, captures);
        elems
    }

    /// A function whose environment is void captures nothing and is
    /// never itself captured.
    fn is_captureless_function(&mut self, d: DeclId) -> bool {
        if !matches!(self.program.ast().decl(d).kind, DeclKind::Function(_)) {
            return false;
        }
        match self.realize_decl(d) {
            Ty::Lambda(l) => l.environment.is_void(),
            _ => false,
        }
    }
}

/// Pure AST walk collecting name uses; no checker state involved.
struct UseWalker<'p> {
    program: &'p sable_ast::ScopedProgram,
    uses: Vec<NameUse>,
}

impl<'p> UseWalker<'p> {
    fn walk_body(&mut self, body: &FunctionBody) {
        match body {
            FunctionBody::Expr(e) => self.walk_expr(*e),
            FunctionBody::Block(s) => self.walk_stmt(*s),
        }
    }

    fn walk_stmt(&mut self, s: StmtId) {
        match &self.program.ast().stmt(s).kind {
            StmtKind::Brace(children) => {
                for &c in children {
                    self.walk_stmt(c);
                }
            }
            StmtKind::Assign { left, right } => {
                self.mark_mutable_root(*left);
                self.walk_expr(*left);
                self.walk_expr(*right);
            }
            StmtKind::While { conditions, body } => {
                for c in conditions {
                    self.walk_condition(c);
                }
                self.walk_stmt(*body);
            }
            StmtKind::DoWhile { body, condition } => {
                self.walk_stmt(*body);
                self.walk_expr(*condition);
            }
            StmtKind::Return { value } => {
                if let Some(v) = value {
                    self.walk_expr(*v);
                }
            }
            StmtKind::Yield { value } => self.walk_expr(*value),
            StmtKind::Discard { expr } => self.walk_expr(*expr),
            StmtKind::Decl(d) => self.walk_decl(*d),
            StmtKind::Expr(e) => self.walk_expr(*e),
        }
    }

    fn walk_decl(&mut self, d: DeclId) {
        match &self.program.ast().decl(d).kind {
            DeclKind::Binding(b) => {
                if let Some(init) = b.initializer {
                    self.walk_expr(init);
                }
            }
            DeclKind::Function(f) => {
                // Nested functions still use names from this frame.
                if let Some(body) = &f.body {
                    self.walk_body(body);
                }
            }
            // Nested type scopes are not entered.
            _ => {}
        }
    }

    fn walk_condition(&mut self, c: &ConditionItem) {
        match c {
            ConditionItem::Expr(e) => self.walk_expr(*e),
            ConditionItem::Decl(d) => self.walk_decl(*d),
        }
    }

    /// Mark the root name of a mutated expression, recursing through
    /// subscript callees.
    fn mark_mutable_root(&mut self, e: ExprId) {
        match &self.program.ast().expr(e).kind {
            ExprKind::Name(n) => {
                if let Domain::None = n.domain {
                    let expr = self.program.ast().expr(e);
                    self.uses.push(NameUse {
                        name: n.identifier.clone(),
                        site: e,
                        span: expr.span,
                        mutable: true,
                    });
                }
                if let Domain::Expr(base) = n.domain {
                    self.mark_mutable_root(base);
                }
            }
            ExprKind::SubscriptCall(c) => self.mark_mutable_root(c.callee),
            ExprKind::Inout(i) => self.mark_mutable_root(i.subject),
            _ => {}
        }
    }

    fn walk_expr(&mut self, e: ExprId) {
        match &self.program.ast().expr(e).kind {
            ExprKind::BooleanLiteral(_)
            | ExprKind::IntegerLiteral(_)
            | ExprKind::FloatLiteral(_)
            | ExprKind::StringLiteral(_) => {}
            ExprKind::Name(n) => {
                match n.domain {
                    Domain::None => {
                        let span = self.program.ast().expr(e).span;
                        self.uses.push(NameUse {
                            name: n.identifier.clone(),
                            site: e,
                            span,
                            mutable: false,
                        });
                    }
                    Domain::Expr(base) => self.walk_expr(base),
                    Domain::Implicit => {}
                }
            }
            ExprKind::Call(c) | ExprKind::SubscriptCall(c) => {
                self.walk_expr(c.callee);
                for a in &c.arguments {
                    self.walk_expr(a.value);
                }
            }
            ExprKind::Lambda(l) => self.walk_decl(l.decl),
            ExprKind::Cast(c) => self.walk_expr(c.subject),
            ExprKind::Inout(i) => {
                self.mark_mutable_root(i.subject);
                self.walk_expr(i.subject);
            }
            ExprKind::Sequence(s) => {
                self.walk_expr(s.head);
                for t in &s.tail {
                    self.walk_expr(t.operand);
                }
            }
            ExprKind::Tuple(elems) => {
                for el in elems {
                    self.walk_expr(el.value);
                }
            }
            ExprKind::Conditional(c) => {
                for cond in &c.conditions {
                    self.walk_condition(cond);
                }
                self.walk_branch(&c.success);
                if let Some(f) = &c.failure {
                    self.walk_branch(f);
                }
            }
        }
    }

    fn walk_branch(&mut self, b: &Branch) {
        match b {
            Branch::Expr(e) => self.walk_expr(*e),
            Branch::Block(s) => self.walk_stmt(*s),
        }
    }
}
