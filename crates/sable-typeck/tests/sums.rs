//! Sum types and the `Sum` magic type name.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sable_ast::decl::FunctionBody;
use sable_ast::Ast;
use sable_typeck::error::TypeError;
use sable_typeck::ty::Ty;
use sable_typeck::{Config, TypeChecker};

/// `type alias Pair = Sum<Int, Bool>` realizes to a two-element sum.
#[test]
fn two_element_sum_realizes() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let bool_decl = product(&mut ast, "Bool", Vec::new());
    let int_ref = name_ty(&mut ast, "Int");
    let bool_ref = name_ty(&mut ast, "Bool");
    let sum_ty = applied_name_ty(&mut ast, "Sum", vec![int_ref, bool_ref]);
    let alias = type_alias(&mut ast, "Pair", sum_ty);

    let program = scoped(ast, vec![int, plus_op, bool_decl, alias]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let ty = checker.realize_decl(alias);
    assert!(checker.errors().is_empty(), "errors: {:?}", checker.errors());

    let Ty::Metatype(inner) = ty else { panic!("expected a metatype, got {ty}") };
    let Ty::Alias { aliased, .. } = *inner else { panic!("expected an alias") };
    match *aliased {
        Ty::Sum(elems) => {
            assert_eq!(elems.len(), 2);
            assert!(elems.contains(&Ty::Product(int)));
            assert!(elems.contains(&Ty::Product(bool_decl)));
        }
        other => panic!("expected a sum, got {other}"),
    }
}

/// A single-element `Sum` errors; the containing type still checks its
/// other members.
#[test]
fn single_element_sum_is_rejected() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);

    let int_ref = name_ty(&mut ast, "Int");
    let bad_out = applied_name_ty(&mut ast, "Sum", vec![int_ref]);
    let f = fun(&mut ast, "f", None, Vec::new(), Some(bad_out), None);

    let one = int_lit(&mut ast, "1");
    let ret_stmt = ret(&mut ast, Some(one));
    let body = block(&mut ast, vec![ret_stmt]);
    let g_out = name_ty(&mut ast, "Int");
    let g = fun(&mut ast, "g", None, Vec::new(), Some(g_out), Some(FunctionBody::Block(body)));

    let c = product(&mut ast, "C", vec![f, g]);
    let program = scoped(ast, vec![int, plus_op, c]);

    let mut checker = TypeChecker::new(&program, Config::default());
    let module = program.module_named("Main").unwrap();
    assert!(!checker.check_module(module));
    assert!(checker
        .errors()
        .iter()
        .any(|e| matches!(e, TypeError::SumTypeSingleElement { .. })));

    // `g` still realizes and checks.
    match checker.decl_type(g) {
        Some(Ty::Lambda(l)) => assert_eq!(l.output, Ty::Product(int)),
        other => panic!("expected g to realize to a lambda, got {other:?}"),
    }
}

/// `Sum<>` warns and collapses to `Never`.
#[test]
fn empty_sum_is_never_with_warning() {
    let mut ast = Ast::new();
    let sum_ty = applied_name_ty(&mut ast, "Sum", Vec::new());
    let alias = type_alias(&mut ast, "Empty", sum_ty);
    let program = scoped(ast, vec![alias]);

    let mut checker = TypeChecker::new(&program, Config::default());
    let ty = checker.realize_decl(alias);
    assert!(checker
        .warnings()
        .iter()
        .any(|e| matches!(e, TypeError::SumTypeZeroElements { .. })));

    let Ty::Metatype(inner) = ty else { panic!("expected a metatype, got {ty}") };
    let Ty::Alias { aliased, .. } = *inner else { panic!("expected an alias") };
    assert!(aliased.is_never());
}

/// Duplicate elements collapse under canonicalization, so a sum of two
/// spellings of the same type is equivalent to that type.
#[test]
fn sum_canonicalization_dedups() {
    let mut ast = Ast::new();
    let (int, _, plus_op) = core_int(&mut ast);
    let first = name_ty(&mut ast, "Int");
    let second = name_ty(&mut ast, "Int");
    let sum_ty = applied_name_ty(&mut ast, "Sum", vec![first, second]);
    let alias = type_alias(&mut ast, "Twice", sum_ty);

    let program = scoped(ast, vec![int, plus_op, alias]);
    let mut checker = TypeChecker::new(&program, Config::default());
    let ty = checker.realize_decl(alias);
    let Ty::Metatype(inner) = ty else { panic!("expected a metatype, got {ty}") };
    assert_eq!(
        sable_typeck::relations::canonical(&inner, program.ast()),
        Ty::Product(int)
    );
}
