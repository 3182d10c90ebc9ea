//! Product types: memberwise initializers, construction, field access.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sable_ast::decl::{DeclKind, FunctionBody};
use sable_ast::Ast;
use sable_typeck::ty::Ty;
use sable_typeck::{Config, DeclRef, TypeChecker};

/// `type A { var x: Int }` gets a memberwise initializer with the
/// labels `[self, x]`.
#[test]
fn memberwise_initializer_is_synthesized() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let x_ann = name_ty(&mut ast, "Int");
    let (field, _x_var) = var_field(&mut ast, "x", x_ann);
    let a = product(&mut ast, "A", vec![field]);
    let program = scoped(ast, vec![int, plus_op, a]);

    let mut checker = TypeChecker::new(&program, Config::default());
    let inner = program.scope_introducing(a).unwrap();
    let init = program
        .decls_in(inner)
        .iter()
        .copied()
        .find(|&m| matches!(program.ast().decl(m).kind, DeclKind::Initializer(_)))
        .expect("memberwise initializer must be synthesized");

    let ty = checker.realize_decl(init);
    let Ty::Lambda(l) = ty else { panic!("expected a lambda, got {ty}") };
    let labels: Vec<Option<&str>> = l.inputs.iter().map(|p| p.label.as_deref()).collect();
    assert_eq!(labels, vec![Some("self"), Some("x")]);
    assert_eq!(l.output, Ty::void());
}

/// `let a = A(x: 1)` type-checks through the synthesized initializer
/// and binds `a` to `A`.
#[test]
fn memberwise_initializer_call_checks() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let x_ann = name_ty(&mut ast, "Int");
    let (field, _) = var_field(&mut ast, "x", x_ann);
    let a = product(&mut ast, "A", vec![field]);

    let a_ref = name_expr(&mut ast, "A");
    let one = int_lit(&mut ast, "1");
    let ctor_call = call(&mut ast, a_ref, vec![(Some("x"), one)]);
    let (binding, a_var) = let_binding(&mut ast, "a", None, Some(ctor_call));

    let program = scoped(ast, vec![int, plus_op, a, binding]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());

    assert_eq!(checker.decl_type(a_var), Some(&Ty::Product(a)));
    assert_eq!(checker.expr_type(ctor_call), Some(&Ty::Product(a)));
    // The callee name is rebound to the initializer.
    let init_binding = checker.referred_decl(a_ref);
    assert!(
        matches!(init_binding, Some(DeclRef::Member(d))
            if matches!(program.ast().decl(*d).kind, DeclKind::Initializer(_))),
        "callee should bind to the initializer, got {init_binding:?}"
    );
}

/// Wrong labels on a constructor call are rejected.
#[test]
fn initializer_call_with_wrong_label_fails() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let x_ann = name_ty(&mut ast, "Int");
    let (field, _) = var_field(&mut ast, "x", x_ann);
    let a = product(&mut ast, "A", vec![field]);

    let a_ref = name_expr(&mut ast, "A");
    let one = int_lit(&mut ast, "1");
    let ctor_call = call(&mut ast, a_ref, vec![(Some("y"), one)]);
    let (binding, _) = let_binding(&mut ast, "a", None, Some(ctor_call));

    let program = scoped(ast, vec![int, plus_op, a, binding]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
}

/// An extension broadens member lookup: a method added by an extension
/// of `A` is callable on values of `A`.
#[test]
fn extension_members_are_found() {
    use sable_ast::decl::{ExtensionDecl, FunctionDecl};
    use sable_common::Span;

    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let a = product(&mut ast, "A", Vec::new());

    let out = name_ty(&mut ast, "Int");
    let one = int_lit(&mut ast, "1");
    let ret_stmt = ret(&mut ast, Some(one));
    let body = block(&mut ast, vec![ret_stmt]);
    let double = ast.push_decl(
        DeclKind::Function(FunctionDecl {
            identifier: Some("double".into()),
            notation: None,
            generic: None,
            explicit_captures: Vec::new(),
            parameters: Vec::new(),
            receiver_effect: Some(sable_ast::AccessEffect::Let),
            is_static: false,
            output: Some(out),
            body: Some(FunctionBody::Block(body)),
        }),
        Span::DUMMY,
    );
    let subject = name_ty(&mut ast, "A");
    let ext = ast.push_decl(
        DeclKind::Extension(ExtensionDecl {
            subject,
            constraints: Vec::new(),
            members: vec![double],
        }),
        Span::DUMMY,
    );

    let a_ann = name_ty(&mut ast, "A");
    let p = param(&mut ast, "a", Some(a_ann));
    let a_ref = name_expr(&mut ast, "a");
    let access = member_expr(&mut ast, a_ref, "double");
    let call_expr = call(&mut ast, access, Vec::new());
    let ret_call = ret(&mut ast, Some(call_expr));
    let f_body = block(&mut ast, vec![ret_call]);
    let f_out = name_ty(&mut ast, "Int");
    let f = fun(&mut ast, "f", None, vec![p], Some(f_out), Some(FunctionBody::Block(f_body)));

    let program = scoped(ast, vec![int, plus_op, a, ext, f]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());
    assert_eq!(checker.expr_type(call_expr), Some(&Ty::Product(int)));
    assert_eq!(checker.referred_decl(access), Some(&DeclRef::Member(double)));
}

/// Member access `a.x` on a parameter of product type resolves to the
/// stored field.
#[test]
fn field_access_resolves_member() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let x_ann = name_ty(&mut ast, "Int");
    let (field, x_var) = var_field(&mut ast, "x", x_ann);
    let a = product(&mut ast, "A", vec![field]);

    let a_ann = name_ty(&mut ast, "A");
    let p = param(&mut ast, "a", Some(a_ann));
    let a_ref = name_expr(&mut ast, "a");
    let access = member_expr(&mut ast, a_ref, "x");
    let ret_stmt = ret(&mut ast, Some(access));
    let body = block(&mut ast, vec![ret_stmt]);
    let out = name_ty(&mut ast, "Int");
    let get = fun(&mut ast, "get", None, vec![p], Some(out), Some(FunctionBody::Block(body)));

    let program = scoped(ast, vec![int, plus_op, a, get]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());

    assert_eq!(checker.expr_type(access), Some(&Ty::Product(int)));
    assert_eq!(checker.referred_decl(access), Some(&DeclRef::Member(x_var)));
}
