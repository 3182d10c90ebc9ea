//! Function checking: bodies, operators, generic calls, lambdas.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sable_ast::decl::{FunctionBody, GenericClause};
use sable_ast::expr::{ExprKind, LambdaExpr};
use sable_ast::tyexpr::{LambdaTypeExpr, LambdaTypeParam, TypeExprKind};
use sable_ast::{AccessEffect, Ast};
use sable_common::Span;
use sable_typeck::error::TypeError;
use sable_typeck::ty::{CallableParam, LambdaTy, Ty};
use sable_typeck::{Config, DeclRef, DeclRequest, TypeChecker};

/// `public fun main() {}` checks with no diagnostics and the type
/// `() -> Void`.
#[test]
fn empty_main_checks() {
    let mut ast = Ast::new();
    let body = block(&mut ast, Vec::new());
    let main = fun(&mut ast, "main", None, Vec::new(), None, Some(FunctionBody::Block(body)));
    let program = scoped(ast, vec![main]);

    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module));
    assert!(checker.errors().is_empty());
    assert!(checker.warnings().is_empty());

    let expected = Ty::Lambda(Box::new(LambdaTy {
        receiver_effect: None,
        environment: Ty::void(),
        inputs: Vec::new(),
        output: Ty::void(),
    }));
    assert_eq!(checker.decl_type(main), Some(&expected));
}

/// `fun f(x: Int) -> Int { return x + 1 }` with a core `Int` carrying
/// an infix `+`: the sequence types as `Int` and the operator binds to
/// the member function.
#[test]
fn operator_chain_resolves_through_member_lookup() {
    let mut ast = Ast::new();
    let (int, plus, plus_op) = core_int(&mut ast);

    let x_ann = name_ty(&mut ast, "Int");
    let x = param(&mut ast, "x", Some(x_ann));
    let x_ref = name_expr(&mut ast, "x");
    let one = int_lit(&mut ast, "1");
    let sum = infix(&mut ast, x_ref, "+", one);
    let ret_stmt = ret(&mut ast, Some(sum));
    let body = block(&mut ast, vec![ret_stmt]);
    let out = name_ty(&mut ast, "Int");
    let f = fun(&mut ast, "f", None, vec![x], Some(out), Some(FunctionBody::Block(body)));

    let program = scoped(ast, vec![int, plus_op, f]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());

    assert_eq!(checker.expr_type(sum), Some(&Ty::Product(int)));
    // The operator name expression is the head of the sequence's tail.
    let op_expr = match &program.ast().expr(sum).kind {
        ExprKind::Sequence(s) => s.tail[0].operator,
        _ => unreachable!(),
    };
    assert_eq!(checker.referred_decl(op_expr), Some(&DeclRef::Member(plus)));
}

/// `fun id<T>(x: T) -> T { return x }` called as `id(42)`: the opened
/// parameter is constrained to `Int` and the binding reifies to `Int`.
#[test]
fn generic_identity_call_reifies_to_int() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);

    let t = generic_param(&mut ast, "T");
    let t_ann = name_ty(&mut ast, "T");
    let x = param(&mut ast, "x", Some(t_ann));
    let x_ref = name_expr(&mut ast, "x");
    let ret_stmt = ret(&mut ast, Some(x_ref));
    let id_body = block(&mut ast, vec![ret_stmt]);
    let t_out = name_ty(&mut ast, "T");
    let id = fun(
        &mut ast,
        "id",
        Some(GenericClause { parameters: vec![t], constraints: Vec::new() }),
        vec![x],
        Some(t_out),
        Some(FunctionBody::Block(id_body)),
    );

    let id_ref = name_expr(&mut ast, "id");
    let forty_two = int_lit(&mut ast, "42");
    let call_expr = call(&mut ast, id_ref, vec![(None, forty_two)]);
    let (binding, r_var) = let_binding(&mut ast, "r", None, Some(call_expr));
    let binding_stmt = decl_stmt(&mut ast, binding);
    let main_body = block(&mut ast, vec![binding_stmt]);
    let main = fun(&mut ast, "main", None, Vec::new(), None, Some(FunctionBody::Block(main_body)));

    let program = scoped(ast, vec![int, plus_op, id, main]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());

    assert_eq!(checker.decl_type(r_var), Some(&Ty::Product(int)));
    assert_eq!(checker.expr_type(call_expr), Some(&Ty::Product(int)));
}

/// A lambda `{ (x) in x + 1 }` against an expected `(Int) -> Int`:
/// the parameter and body infer to `Int` and the deferred body check
/// succeeds.
#[test]
fn lambda_infers_against_expected_type() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);

    // Annotation: [](let Int) -> Int.
    let in_ty = name_ty(&mut ast, "Int");
    let out_ty = name_ty(&mut ast, "Int");
    let annotation = ast.push_type_expr(
        TypeExprKind::Lambda(LambdaTypeExpr {
            receiver_effect: None,
            environment: None,
            inputs: vec![LambdaTypeParam {
                label: None,
                convention: AccessEffect::Let,
                type_expr: in_ty,
            }],
            output: out_ty,
        }),
        Span::DUMMY,
    );

    // Lambda: unannotated parameter, single-expression body `x + 1`.
    let x = param(&mut ast, "x", None);
    let x_ref = name_expr(&mut ast, "x");
    let one = int_lit(&mut ast, "1");
    let body = infix(&mut ast, x_ref, "+", one);
    let underlying = lambda_fun(&mut ast, vec![x], None, FunctionBody::Expr(body));
    let lambda = ast.push_expr(ExprKind::Lambda(LambdaExpr { decl: underlying }), Span::DUMMY);

    let (binding, g_var) = let_binding(&mut ast, "g", Some(annotation), Some(lambda));

    let program = scoped(ast, vec![int, plus_op, binding]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());

    let expected = Ty::Lambda(Box::new(LambdaTy {
        receiver_effect: None,
        environment: Ty::void(),
        inputs: vec![CallableParam {
            label: None,
            ty: Ty::param(AccessEffect::Let, Ty::Product(int)),
        }],
        output: Ty::Product(int),
    }));
    assert_eq!(checker.decl_type(g_var), Some(&expected));
    assert_eq!(checker.request_state(underlying), Some(DeclRequest::Success));
}

/// Checking a module twice is a no-op with success.
#[test]
fn check_module_is_idempotent() {
    let mut ast = Ast::new();
    let body = block(&mut ast, Vec::new());
    let main = fun(&mut ast, "main", None, Vec::new(), None, Some(FunctionBody::Block(body)));
    let program = scoped(ast, vec![main]);

    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module));
    assert!(checker.check_module(module));
    assert!(checker.errors().is_empty());
}

/// The same program produces the same types and diagnostics on every
/// run.
#[test]
fn checking_is_deterministic() {
    fn build() -> (sable_ast::ScopedProgram, sable_ast::DeclId, sable_ast::ExprId) {
        let mut ast = Ast::new();
        let (int, _, plus_op) = core_int(&mut ast);
        let x_ann = name_ty(&mut ast, "Int");
        let x = param(&mut ast, "x", Some(x_ann));
        let x_ref = name_expr(&mut ast, "x");
        let one = int_lit(&mut ast, "1");
        let sum = infix(&mut ast, x_ref, "+", one);
        let ret_stmt = ret(&mut ast, Some(sum));
        let body = block(&mut ast, vec![ret_stmt]);
        let out = name_ty(&mut ast, "Int");
        let f = fun(&mut ast, "f", None, vec![x], Some(out), Some(FunctionBody::Block(body)));
        (scoped(ast, vec![int, plus_op, f]), f, sum)
    }

    let (program_a, f_a, sum_a) = build();
    let (program_b, f_b, sum_b) = build();
    assert_eq!(f_a, f_b);

    let mut checker_a = TypeChecker::new(&program_a, Config::default());
    let mut checker_b = TypeChecker::new(&program_b, Config::default());
    checker_a.check_module(program_a.module_named("Main").unwrap());
    checker_b.check_module(program_b.module_named("Main").unwrap());

    assert_eq!(checker_a.errors(), checker_b.errors());
    assert_eq!(checker_a.warnings(), checker_b.warnings());
    assert_eq!(checker_a.decl_type(f_a), checker_b.decl_type(f_b));
    assert_eq!(checker_a.expr_type(sum_a), checker_b.expr_type(sum_b));
}

/// Two operator declarations for the same `(notation, name)` in one
/// module are rejected.
#[test]
fn duplicate_operator_declarations_error() {
    let mut ast = Ast::new();
    let first = operator(&mut ast, "+", sable_ast::PrecedenceGroup::Addition);
    let second = operator(&mut ast, "+", sable_ast::PrecedenceGroup::Multiplication);
    let program = scoped(ast, vec![first, second]);

    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker
        .errors()
        .iter()
        .any(|e| matches!(e, TypeError::DuplicateOperator { name, .. } if name == "+")));
}
