//! The `Builtin` module surface.
//!
//! When `Config::is_builtin_module_visible` is set, the name `Builtin`
//! resolves to a module whose members are raw machine types and a small
//! table of intrinsic functions. Nothing here is reachable otherwise.

use crate::ty::{BuiltinTy, CallableParam, Ty};
use crate::TypeChecker;

fn unlabeled(tys: Vec<Ty>) -> Vec<CallableParam> {
    tys.into_iter()
        .map(|t| CallableParam {
            label: None,
            ty: Ty::param(sable_ast::AccessEffect::Let, t),
        })
        .collect()
}

/// The type of a builtin function, by name. The table is intentionally
/// small; lowering recognizes the same names.
pub fn builtin_function_type(name: &str) -> Option<Ty> {
    let word = Ty::Builtin(BuiltinTy::Word);
    let ptr = Ty::Builtin(BuiltinTy::Ptr);
    let i1 = Ty::Builtin(BuiltinTy::I(1));
    let ty = match name {
        "add_word" | "sub_word" | "mul_word" | "sdiv_word" => {
            Ty::thin_lambda(unlabeled(vec![word.clone(), word.clone()]), word)
        }
        "icmp_eq_word" | "icmp_slt_word" => {
            Ty::thin_lambda(unlabeled(vec![word.clone(), word]), i1)
        }
        "zeroinitializer_word" => Ty::thin_lambda(Vec::new(), word),
        "ptr_offset" => Ty::thin_lambda(unlabeled(vec![ptr.clone(), word]), ptr),
        "load_word" => Ty::thin_lambda(unlabeled(vec![ptr]), word),
        "store_word" => Ty::thin_lambda(unlabeled(vec![word, ptr]), Ty::void()),
        _ => return None,
    };
    Some(ty)
}

impl<'p> TypeChecker<'p> {
    /// Whether `Builtin` is nameable from this run.
    pub(crate) fn builtin_visible(&self) -> bool {
        self.config.is_builtin_module_visible
    }

    /// Resolve a member of the `Builtin` module: a machine type or an
    /// intrinsic function.
    pub(crate) fn resolve_builtin_member(&self, name: &str) -> Option<(crate::DeclRef, Ty)> {
        if !self.builtin_visible() {
            return None;
        }
        if let Some(b) = BuiltinTy::parse(name) {
            return Some((
                crate::DeclRef::BuiltinType(b),
                Ty::Metatype(Box::new(Ty::Builtin(b))),
            ));
        }
        builtin_function_type(name)
            .map(|ty| (crate::DeclRef::BuiltinFunction(name.to_string()), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_arithmetic_has_word_shape() {
        let ty = builtin_function_type("add_word").unwrap();
        match ty {
            Ty::Lambda(l) => {
                assert_eq!(l.inputs.len(), 2);
                assert_eq!(l.output, Ty::Builtin(BuiltinTy::Word));
            }
            other => panic!("expected lambda, got {other}"),
        }
    }

    #[test]
    fn unknown_intrinsics_are_absent() {
        assert!(builtin_function_type("launch_missiles").is_none());
    }
}
