//! The node arena and its typed indices.
//!
//! All AST nodes live in flat vectors owned by [`Ast`] and refer to each
//! other through `u32` index newtypes. Back-pointers are never stored;
//! parent/child relations are recovered by the scoper
//! (`crate::scoped::ScopedProgram`).

use std::fmt;

use sable_common::Span;

use crate::decl::{Decl, DeclKind};
use crate::expr::{Expr, ExprKind};
use crate::pat::{Pat, PatKind};
use crate::stmt::{Stmt, StmtKind};
use crate::tyexpr::{TypeExpr, TypeExprKind};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Index into the owning arena vector.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Index of a declaration node.
    DeclId
);
define_id!(
    /// Index of an expression node.
    ExprId
);
define_id!(
    /// Index of a pattern node.
    PatId
);
define_id!(
    /// Index of a statement node.
    StmtId
);
define_id!(
    /// Index of a type-expression node.
    TypeExprId
);
define_id!(
    /// Index of a lexical scope.
    ScopeId
);

/// A module: a named collection of translation units.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub units: Vec<TranslationUnit>,
    pub span: Span,
}

/// One translation unit (source file) of a module.
#[derive(Clone, Debug, Default)]
pub struct TranslationUnit {
    /// Top-level declarations, in source order.
    pub decls: Vec<DeclId>,
    /// Names of modules imported by this unit.
    pub imports: Vec<String>,
    pub span: Span,
}

/// The arena owning every AST node of a program.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    pub modules: Vec<Module>,
    decls: Vec<Decl>,
    exprs: Vec<Expr>,
    pats: Vec<Pat>,
    stmts: Vec<Stmt>,
    type_exprs: Vec<TypeExpr>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Insertion ──────────────────────────────────────────────────────

    pub fn push_decl(&mut self, kind: DeclKind, span: Span) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl { kind, span });
        id
    }

    pub fn push_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr { kind, span });
        id
    }

    pub fn push_pat(&mut self, kind: PatKind, span: Span) -> PatId {
        let id = PatId(self.pats.len() as u32);
        self.pats.push(Pat { kind, span });
        id
    }

    pub fn push_stmt(&mut self, kind: StmtKind, span: Span) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt { kind, span });
        id
    }

    pub fn push_type_expr(&mut self, kind: TypeExprKind, span: Span) -> TypeExprId {
        let id = TypeExprId(self.type_exprs.len() as u32);
        self.type_exprs.push(TypeExpr { kind, span });
        id
    }

    // ── Access ─────────────────────────────────────────────────────────

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn pat(&self, id: PatId) -> &Pat {
        &self.pats[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn type_expr(&self, id: TypeExprId) -> &TypeExpr {
        &self.type_exprs[id.index()]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Iterate all declaration ids.
    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len() as u32).map(DeclId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::VarDecl;

    #[test]
    fn arena_hands_out_sequential_ids() {
        let mut ast = Ast::new();
        let a = ast.push_decl(DeclKind::Var(VarDecl { name: "a".into() }), Span::DUMMY);
        let b = ast.push_decl(DeclKind::Var(VarDecl { name: "b".into() }), Span::DUMMY);
        assert_eq!(a, DeclId(0));
        assert_eq!(b, DeclId(1));
        assert!(matches!(&ast.decl(a).kind, DeclKind::Var(v) if v.name == "a"));
    }
}
