//! Scoped abstract syntax tree for the Sable compiler.
//!
//! The AST is an arena of nodes addressed by typed indices. Drivers (or
//! tests) assemble an [`Ast`] bottom-up, wrap it in modules, and call
//! [`ScopedProgram::new`], which runs the pre-checking synthesis pass
//! and builds the scope tree. The type checker consumes the resulting
//! `ScopedProgram` immutably.
//!
//! # Layout
//!
//! - [`node`]: the arena, typed indices, modules and translation units
//! - [`lang`]: attribute enums (access effects, introducers, operators)
//! - [`decl`], [`expr`], [`pat`], [`stmt`], [`tyexpr`]: node kinds
//! - [`scoped`]: scope construction and containment queries

pub mod decl;
pub mod expr;
pub mod lang;
pub mod node;
pub mod pat;
pub mod scoped;
pub mod stmt;
pub mod tyexpr;

pub use lang::{AccessEffect, BindingIntroducer, OperatorNotation, PrecedenceGroup};
pub use node::{Ast, DeclId, ExprId, Module, PatId, ScopeId, StmtId, TranslationUnit, TypeExprId};
pub use scoped::{ScopeKind, ScopedProgram};
