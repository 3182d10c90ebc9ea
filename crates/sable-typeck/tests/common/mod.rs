#![allow(dead_code)]

//! Shared helpers for assembling scoped programs by hand.
//!
//! Parsing is outside this crate, so tests build ASTs through the arena
//! API and wrap them in a single `Main` module.

use sable_ast::decl::{
    BindingDecl, DeclKind, FunctionBody, FunctionDecl, GenericClause, GenericParameterDecl,
    OperatorDecl, ParameterDecl, ProductDecl, TraitDecl, TypeAliasDecl, VarDecl,
};
use sable_ast::expr::{
    CallExpr, Domain, ExprKind, LabeledArgument, NameExpr, SequenceExpr, SequenceTail,
};
use sable_ast::pat::{BindingPat, NamePat, PatKind};
use sable_ast::stmt::StmtKind;
use sable_ast::tyexpr::{NameTypeExpr, TypeArgExpr, TypeExprKind};
use sable_ast::{
    AccessEffect, Ast, BindingIntroducer, DeclId, ExprId, Module, OperatorNotation,
    PrecedenceGroup, ScopedProgram, StmtId, TranslationUnit, TypeExprId,
};
use sable_common::Span;

// ── Type expressions ───────────────────────────────────────────────────

pub fn name_ty(ast: &mut Ast, identifier: &str) -> TypeExprId {
    ast.push_type_expr(
        TypeExprKind::Name(NameTypeExpr {
            domain: None,
            identifier: identifier.into(),
            arguments: Vec::new(),
        }),
        Span::DUMMY,
    )
}

pub fn applied_name_ty(ast: &mut Ast, identifier: &str, args: Vec<TypeExprId>) -> TypeExprId {
    ast.push_type_expr(
        TypeExprKind::Name(NameTypeExpr {
            domain: None,
            identifier: identifier.into(),
            arguments: args.into_iter().map(TypeArgExpr::Type).collect(),
        }),
        Span::DUMMY,
    )
}

// ── Expressions ────────────────────────────────────────────────────────

pub fn name_expr(ast: &mut Ast, identifier: &str) -> ExprId {
    ast.push_expr(
        ExprKind::Name(NameExpr {
            domain: Domain::None,
            identifier: identifier.into(),
            arguments: Vec::new(),
        }),
        Span::DUMMY,
    )
}

pub fn member_expr(ast: &mut Ast, base: ExprId, identifier: &str) -> ExprId {
    ast.push_expr(
        ExprKind::Name(NameExpr {
            domain: Domain::Expr(base),
            identifier: identifier.into(),
            arguments: Vec::new(),
        }),
        Span::DUMMY,
    )
}

pub fn int_lit(ast: &mut Ast, spelling: &str) -> ExprId {
    ast.push_expr(ExprKind::IntegerLiteral(spelling.into()), Span::DUMMY)
}

pub fn call(ast: &mut Ast, callee: ExprId, args: Vec<(Option<&str>, ExprId)>) -> ExprId {
    let arguments = args
        .into_iter()
        .map(|(label, value)| LabeledArgument { label: label.map(String::from), value })
        .collect();
    ast.push_expr(ExprKind::Call(CallExpr { callee, arguments }), Span::DUMMY)
}

/// `head <op> operand` as an unfolded sequence.
pub fn infix(ast: &mut Ast, head: ExprId, operator: &str, operand: ExprId) -> ExprId {
    let op = name_expr(ast, operator);
    ast.push_expr(
        ExprKind::Sequence(SequenceExpr {
            head,
            tail: vec![SequenceTail { operator: op, operand }],
        }),
        Span::DUMMY,
    )
}

// ── Statements ─────────────────────────────────────────────────────────

pub fn ret(ast: &mut Ast, value: Option<ExprId>) -> StmtId {
    ast.push_stmt(StmtKind::Return { value }, Span::DUMMY)
}

pub fn expr_stmt(ast: &mut Ast, e: ExprId) -> StmtId {
    ast.push_stmt(StmtKind::Expr(e), Span::DUMMY)
}

pub fn decl_stmt(ast: &mut Ast, d: DeclId) -> StmtId {
    ast.push_stmt(StmtKind::Decl(d), Span::DUMMY)
}

pub fn block(ast: &mut Ast, stmts: Vec<StmtId>) -> StmtId {
    ast.push_stmt(StmtKind::Brace(stmts), Span::DUMMY)
}

// ── Declarations ───────────────────────────────────────────────────────

pub fn param(ast: &mut Ast, name: &str, annotation: Option<TypeExprId>) -> DeclId {
    ast.push_decl(
        DeclKind::Parameter(ParameterDecl {
            label: None,
            name: name.into(),
            convention: AccessEffect::Let,
            annotation,
            default: None,
        }),
        Span::DUMMY,
    )
}

pub fn labeled_param(
    ast: &mut Ast,
    label: &str,
    name: &str,
    annotation: Option<TypeExprId>,
) -> DeclId {
    ast.push_decl(
        DeclKind::Parameter(ParameterDecl {
            label: Some(label.into()),
            name: name.into(),
            convention: AccessEffect::Let,
            annotation,
            default: None,
        }),
        Span::DUMMY,
    )
}

pub fn fun(
    ast: &mut Ast,
    name: &str,
    generic: Option<GenericClause>,
    parameters: Vec<DeclId>,
    output: Option<TypeExprId>,
    body: Option<FunctionBody>,
) -> DeclId {
    ast.push_decl(
        DeclKind::Function(FunctionDecl {
            identifier: Some(name.into()),
            notation: None,
            generic,
            explicit_captures: Vec::new(),
            parameters,
            receiver_effect: None,
            is_static: false,
            output,
            body,
        }),
        Span::DUMMY,
    )
}

/// An anonymous function underlying a lambda expression.
pub fn lambda_fun(
    ast: &mut Ast,
    parameters: Vec<DeclId>,
    output: Option<TypeExprId>,
    body: FunctionBody,
) -> DeclId {
    ast.push_decl(
        DeclKind::Function(FunctionDecl {
            identifier: None,
            notation: None,
            generic: None,
            explicit_captures: Vec::new(),
            parameters,
            receiver_effect: None,
            is_static: false,
            output,
            body: Some(body),
        }),
        Span::DUMMY,
    )
}

/// An infix operator member function, e.g. `infix fun + (other: Int) -> Int`.
pub fn member_operator(
    ast: &mut Ast,
    name: &str,
    parameters: Vec<DeclId>,
    output: TypeExprId,
) -> DeclId {
    ast.push_decl(
        DeclKind::Function(FunctionDecl {
            identifier: Some(name.into()),
            notation: Some(OperatorNotation::Infix),
            generic: None,
            explicit_captures: Vec::new(),
            parameters,
            receiver_effect: Some(AccessEffect::Let),
            is_static: false,
            output: Some(output),
            body: None,
        }),
        Span::DUMMY,
    )
}

pub fn generic_param(ast: &mut Ast, name: &str) -> DeclId {
    ast.push_decl(
        DeclKind::GenericParameter(GenericParameterDecl {
            name: name.into(),
            annotations: Vec::new(),
        }),
        Span::DUMMY,
    )
}

pub fn product(ast: &mut Ast, name: &str, members: Vec<DeclId>) -> DeclId {
    ast.push_decl(
        DeclKind::Product(ProductDecl {
            name: name.into(),
            generic: None,
            conformances: Vec::new(),
            members,
        }),
        Span::DUMMY,
    )
}

pub fn conforming_product(
    ast: &mut Ast,
    name: &str,
    conformances: Vec<TypeExprId>,
    members: Vec<DeclId>,
) -> DeclId {
    ast.push_decl(
        DeclKind::Product(ProductDecl {
            name: name.into(),
            generic: None,
            conformances,
            members,
        }),
        Span::DUMMY,
    )
}

pub fn trait_decl(
    ast: &mut Ast,
    name: &str,
    refinements: Vec<TypeExprId>,
    members: Vec<DeclId>,
) -> DeclId {
    ast.push_decl(
        DeclKind::Trait(TraitDecl {
            name: name.into(),
            refinements,
            members,
            self_parameter: None,
        }),
        Span::DUMMY,
    )
}

pub fn type_alias(ast: &mut Ast, name: &str, aliased: TypeExprId) -> DeclId {
    ast.push_decl(
        DeclKind::TypeAlias(TypeAliasDecl { name: name.into(), generic: None, aliased }),
        Span::DUMMY,
    )
}

pub fn operator(ast: &mut Ast, name: &str, precedence: PrecedenceGroup) -> DeclId {
    ast.push_decl(
        DeclKind::Operator(OperatorDecl {
            notation: OperatorNotation::Infix,
            name: name.into(),
            precedence: Some(precedence),
        }),
        Span::DUMMY,
    )
}

/// A `let`-introduced binding with one named variable.
pub fn let_binding(
    ast: &mut Ast,
    var_name: &str,
    annotation: Option<TypeExprId>,
    initializer: Option<ExprId>,
) -> (DeclId, DeclId) {
    let var = ast.push_decl(DeclKind::Var(VarDecl { name: var_name.into() }), Span::DUMMY);
    let name_pat = ast.push_pat(PatKind::Name(NamePat { var }), Span::DUMMY);
    let pattern = ast.push_pat(
        PatKind::Binding(BindingPat {
            introducer: BindingIntroducer::Let,
            subpattern: name_pat,
            annotation,
        }),
        Span::DUMMY,
    );
    let binding = ast.push_decl(
        DeclKind::Binding(BindingDecl { pattern, initializer, is_static: false }),
        Span::DUMMY,
    );
    (binding, var)
}

/// A `var`-introduced stored field without an initializer.
pub fn var_field(ast: &mut Ast, name: &str, annotation: TypeExprId) -> (DeclId, DeclId) {
    let var = ast.push_decl(DeclKind::Var(VarDecl { name: name.into() }), Span::DUMMY);
    let name_pat = ast.push_pat(PatKind::Name(NamePat { var }), Span::DUMMY);
    let pattern = ast.push_pat(
        PatKind::Binding(BindingPat {
            introducer: BindingIntroducer::Var,
            subpattern: name_pat,
            annotation: Some(annotation),
        }),
        Span::DUMMY,
    );
    let binding = ast.push_decl(
        DeclKind::Binding(BindingDecl { pattern, initializer: None, is_static: false }),
        Span::DUMMY,
    );
    (binding, var)
}

// ── Core fixtures ──────────────────────────────────────────────────────

/// A minimal core: `Int` with an infix `+`, plus the `+` operator
/// declaration. Returns `(int_decl, plus_fn, operator_decl)`.
pub fn core_int(ast: &mut Ast) -> (DeclId, DeclId, DeclId) {
    let rhs_ty = name_ty(ast, "Int");
    let out_ty = name_ty(ast, "Int");
    let rhs = param(ast, "other", Some(rhs_ty));
    let plus = member_operator(ast, "+", vec![rhs], out_ty);
    let int = product(ast, "Int", vec![plus]);
    let plus_op = operator(ast, "+", PrecedenceGroup::Addition);
    (int, plus, plus_op)
}

/// Wrap top-level declarations into a single-unit `Main` module and
/// build the scoped program.
pub fn scoped(mut ast: Ast, decls: Vec<DeclId>) -> ScopedProgram {
    ast.modules.push(Module {
        name: "Main".into(),
        units: vec![TranslationUnit { decls, imports: Vec::new(), span: Span::DUMMY }],
        span: Span::DUMMY,
    });
    ScopedProgram::new(ast)
}
