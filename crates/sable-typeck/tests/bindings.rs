//! Bindings: initializer inference, self-reference isolation, cycles.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sable_ast::Ast;
use sable_typeck::error::TypeError;
use sable_typeck::ty::Ty;
use sable_typeck::{Config, DeclRequest, TypeChecker};

/// An annotated binding accepts an initializer of the annotated type.
#[test]
fn annotated_binding_checks_subtyping() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let ann = name_ty(&mut ast, "Int");
    let one = int_lit(&mut ast, "1");
    let (binding, y_var) = let_binding(&mut ast, "y", Some(ann), Some(one));

    let program = scoped(ast, vec![int, plus_op, binding]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());
    assert_eq!(checker.decl_type(y_var), Some(&Ty::Product(int)));
}

/// A binding's initializer cannot see the binding's own variables:
/// `let x = x` is an undefined name, not an infinite loop.
#[test]
fn binding_initializer_cannot_see_own_variables() {
    let mut ast = Ast::new();
    let x_ref = name_expr(&mut ast, "x");
    let (binding, _x_var) = let_binding(&mut ast, "x", None, Some(x_ref));

    let program = scoped(ast, vec![binding]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker.errors().iter().any(|e| matches!(
        e,
        TypeError::UndefinedName { name, .. } if name == "x"
    )));
    assert_eq!(checker.request_state(binding), Some(DeclRequest::Failure));
}

/// `type alias X = X` is a circular dependency; the engine terminates
/// and no declaration is left mid-request.
#[test]
fn alias_cycle_is_detected() {
    let mut ast = Ast::new();
    let x_ref = name_ty(&mut ast, "X");
    let alias = type_alias(&mut ast, "X", x_ref);

    let program = scoped(ast, vec![alias]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker
        .errors()
        .iter()
        .any(|e| matches!(e, TypeError::CircularDependency { .. })));
    assert!(matches!(
        checker.request_state(alias),
        Some(DeclRequest::Failure) | Some(DeclRequest::TypeRealizationCompleted)
    ));
}

/// A bare expression statement with a non-void value warns.
#[test]
fn unused_result_warns() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let out = name_ty(&mut ast, "Int");
    let f = fun(&mut ast, "f", None, Vec::new(), Some(out), None);

    let f_ref = name_expr(&mut ast, "f");
    let call_expr = call(&mut ast, f_ref, Vec::new());
    let stmt = expr_stmt(&mut ast, call_expr);
    let body = block(&mut ast, vec![stmt]);
    let main = fun(
        &mut ast,
        "main",
        None,
        Vec::new(),
        None,
        Some(sable_ast::decl::FunctionBody::Block(body)),
    );

    let program = scoped(ast, vec![int, plus_op, f, main]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());
    assert!(checker
        .warnings()
        .iter()
        .any(|e| matches!(e, TypeError::UnusedResult { .. })));
}

/// A binding without annotation or initializer cannot be typed.
#[test]
fn binding_without_annotation_or_initializer_errors() {
    let mut ast = Ast::new();
    let (binding, x_var) = let_binding(&mut ast, "x", None, None);

    let program = scoped(ast, vec![binding]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker
        .errors()
        .iter()
        .any(|e| matches!(e, TypeError::ExpectedTypeAnnotation { .. })));
    assert_eq!(checker.decl_type(x_var), Some(&Ty::Error));
}
