//! Traits: conformance registration, requirements, refinement cycles.

mod common;

use common::*;
use sable_ast::decl::{DeclKind, FunctionBody, FunctionDecl};
use sable_ast::{AccessEffect, Ast, OperatorNotation};
use sable_common::Span;
use sable_typeck::error::TypeError;
use sable_typeck::ty::Ty;
use sable_typeck::{Config, TypeChecker};

/// A requirement: a bodiless member function inside a trait.
fn requirement(ast: &mut Ast, name: &str, output: &str) -> sable_ast::DeclId {
    let out = name_ty(ast, output);
    ast.push_decl(
        DeclKind::Function(FunctionDecl {
            identifier: Some(name.into()),
            notation: None::<OperatorNotation>,
            generic: None,
            explicit_captures: Vec::new(),
            parameters: Vec::new(),
            receiver_effect: Some(AccessEffect::Let),
            is_static: false,
            output: Some(out),
            body: None,
        }),
        Span::DUMMY,
    )
}

/// `trait P {}`, `type B: P {}`: the conformance is registered exactly
/// once under the canonical model.
#[test]
fn conformance_is_registered_once() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let p = trait_decl(&mut ast, "P", Vec::new(), Vec::new());
    let p_ref = name_ty(&mut ast, "P");
    let b = conforming_product(&mut ast, "B", vec![p_ref], Vec::new());

    let program = scoped(ast, vec![int, plus_op, p, b]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());

    let (typed, diagnostics) = checker.finish();
    assert!(diagnostics.errors.is_empty());
    assert!(typed.relations.contains(&Ty::Product(b), p));
    assert_eq!(typed.relations.conformances_of(&Ty::Product(b)).len(), 1);
}

/// A requirement is satisfied by a member whose type matches under
/// `Self := model`.
#[test]
fn requirement_satisfied_by_matching_member() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let req = requirement(&mut ast, "value", "Int");
    let p = trait_decl(&mut ast, "P", Vec::new(), vec![req]);

    // Witness: fun value() -> Int { return 1 } as a non-static member.
    let one = int_lit(&mut ast, "1");
    let ret_stmt = ret(&mut ast, Some(one));
    let body = block(&mut ast, vec![ret_stmt]);
    let out = name_ty(&mut ast, "Int");
    let witness = ast.push_decl(
        DeclKind::Function(FunctionDecl {
            identifier: Some("value".into()),
            notation: None,
            generic: None,
            explicit_captures: Vec::new(),
            parameters: Vec::new(),
            receiver_effect: Some(AccessEffect::Let),
            is_static: false,
            output: Some(out),
            body: Some(FunctionBody::Block(body)),
        }),
        Span::DUMMY,
    );
    let p_ref = name_ty(&mut ast, "P");
    let b = conforming_product(&mut ast, "B", vec![p_ref], vec![witness]);

    let program = scoped(ast, vec![int, plus_op, p, b]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());
    let (typed, _) = checker.finish();
    assert!(typed.relations.contains(&Ty::Product(b), p));
}

/// A missing requirement witness is diagnosed.
#[test]
fn missing_requirement_is_diagnosed() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let req = requirement(&mut ast, "value", "Int");
    let p = trait_decl(&mut ast, "P", Vec::new(), vec![req]);
    let p_ref = name_ty(&mut ast, "P");
    let b = conforming_product(&mut ast, "B", vec![p_ref], Vec::new());

    let program = scoped(ast, vec![int, plus_op, p, b]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker.errors().iter().any(|e| matches!(
        e,
        TypeError::RequirementNotSatisfied { requirement, .. } if requirement == "value"
    )));
}

/// A synthesizable requirement does not error when no witness exists.
#[test]
fn synthesizable_requirement_is_accepted() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let req = requirement(&mut ast, "value", "Int");
    let p = trait_decl(&mut ast, "P", Vec::new(), vec![req]);
    let p_ref = name_ty(&mut ast, "P");
    let b = conforming_product(&mut ast, "B", vec![p_ref], Vec::new());

    let mut program = scoped(ast, vec![int, plus_op, p, b]);
    program.mark_synthesizable(req);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(checker.check_module(module), "errors: {:?}", checker.errors());
}

/// `trait R: R {}` reports a circular refinement and terminates;
/// later uses of `R` keep erroring without looping.
#[test]
fn self_refining_trait_is_rejected() {
    let mut ast = Ast::new();
    let r_ref = name_ty(&mut ast, "R");
    let r = trait_decl(&mut ast, "R", vec![r_ref], Vec::new());
    let r_bound = name_ty(&mut ast, "R");
    let b = conforming_product(&mut ast, "B", vec![r_bound], Vec::new());

    let program = scoped(ast, vec![r, b]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker.errors().iter().any(|e| matches!(
        e,
        TypeError::CircularRefinement { name, .. } if name == "R"
    )));
}

/// Declaring the same conformance twice in overlapping scopes is
/// redundant.
#[test]
fn redundant_conformance_is_rejected() {
    let mut ast = Ast::new();
    let p = trait_decl(&mut ast, "P", Vec::new(), Vec::new());
    let first = name_ty(&mut ast, "P");
    let second = name_ty(&mut ast, "P");
    let b = conforming_product(&mut ast, "B", vec![first, second], Vec::new());

    let program = scoped(ast, vec![p, b]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker.errors().iter().any(|e| matches!(
        e,
        TypeError::RedundantConformance { trait_name, .. } if trait_name == "P"
    )));
}

/// Conformance to something that is not a trait is diagnosed.
#[test]
fn conformance_to_non_trait_is_rejected() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let int_ref = name_ty(&mut ast, "Int");
    let b = conforming_product(&mut ast, "B", vec![int_ref], Vec::new());

    let program = scoped(ast, vec![int, plus_op, b]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker
        .errors()
        .iter()
        .any(|e| matches!(e, TypeError::ConformanceToNonTrait { .. })));
}
