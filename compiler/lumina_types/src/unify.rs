//! Unification (§4.4 "Unification").
//!
//! Occurs-check enabled; ADTs unify structurally by constructor name and
//! arity; function types unify arg-wise; const-generic parameters unify
//! only with equal integer payloads. Grounded in the teacher's
//! `ori_types::unify` engine, simplified to the substitution-map
//! representation decided on in `SPEC_FULL.md` §13.

use lumina_ir::Location;

use crate::subst::Substitution;
use crate::ty::{Type, VarId};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArityKind {
    Function,
    TypeArgs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnifyError {
    Mismatch { expected: Type, found: Type, location: Location },
    InfiniteType { var: VarId, containing: Type, location: Location },
    ArityMismatch { expected: usize, found: usize, kind: ArityKind, location: Location },
    ConstMismatch { expected: i64, found: i64, location: Location },
}

/// Unifies `a` and `b` in place against `subst`, resolving through existing
/// bindings first. On success both sides denote the same type afterward.
pub fn unify(subst: &mut Substitution, a: &Type, b: &Type, location: Location) -> Result<(), UnifyError> {
    let a = subst.resolve(a);
    let b = subst.resolve(b);
    match (&a, &b) {
        (Type::Var(v1), Type::Var(v2)) if v1 == v2 => Ok(()),
        (Type::Var(v), other) | (other, Type::Var(v)) => bind_var(subst, *v, other, location),
        (Type::Primitive(n1), Type::Primitive(n2)) => {
            if n1 == n2 {
                Ok(())
            } else {
                Err(UnifyError::Mismatch { expected: a, found: b, location })
            }
        }
        (Type::Const(v1), Type::Const(v2)) => {
            if v1 == v2 {
                Ok(())
            } else {
                Err(UnifyError::ConstMismatch { expected: *v1, found: *v2, location })
            }
        }
        (Type::Adt(n1, p1), Type::Adt(n2, p2)) => {
            if n1 != n2 {
                return Err(UnifyError::Mismatch { expected: a.clone(), found: b.clone(), location });
            }
            if p1.len() != p2.len() {
                return Err(UnifyError::ArityMismatch { expected: p1.len(), found: p2.len(), kind: ArityKind::TypeArgs, location });
            }
            for (x, y) in p1.iter().zip(p2.iter()) {
                unify(subst, x, y, location)?;
            }
            Ok(())
        }
        (Type::Function(p1, r1), Type::Function(p2, r2)) => {
            if p1.len() != p2.len() {
                return Err(UnifyError::ArityMismatch { expected: p1.len(), found: p2.len(), kind: ArityKind::Function, location });
            }
            for (x, y) in p1.iter().zip(p2.iter()) {
                unify(subst, x, y, location)?;
            }
            unify(subst, r1, r2, location)
        }
        _ => Err(UnifyError::Mismatch { expected: a, found: b, location }),
    }
}

fn bind_var(subst: &mut Substitution, var: VarId, ty: &Type, location: Location) -> Result<(), UnifyError> {
    if let Type::Var(other) = ty {
        if *other == var {
            return Ok(());
        }
    }
    if occurs(subst, var, ty) {
        return Err(UnifyError::InfiniteType { var, containing: ty.clone(), location });
    }
    subst.bind(var, ty.clone());
    Ok(())
}

fn occurs(subst: &Substitution, var: VarId, ty: &Type) -> bool {
    match subst.resolve(ty) {
        Type::Var(id) => id == var,
        Type::Adt(_, params) => params.iter().any(|p| occurs(subst, var, p)),
        Type::Function(params, ret) => params.iter().any(|p| occurs(subst, var, p)) || occurs(subst, var, &ret),
        Type::Scheme(_, _, body) => occurs(subst, var, &body),
        Type::Primitive(_) | Type::Const(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Symbol;

    fn loc() -> Location {
        Location::DUMMY
    }

    #[test]
    fn unifies_var_with_concrete_type() {
        let mut subst = Substitution::default();
        unify(&mut subst, &Type::Var(0), &Type::Primitive(Symbol::intern("int")), loc()).unwrap();
        assert_eq!(subst.resolve(&Type::Var(0)), Type::Primitive(Symbol::intern("int")));
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut subst = Substitution::default();
        let list_of_var0 = Type::Adt(Symbol::intern("List"), vec![Type::Var(0)]);
        let err = unify(&mut subst, &Type::Var(0), &list_of_var0, loc()).unwrap_err();
        assert!(matches!(err, UnifyError::InfiniteType { .. }));
    }

    #[test]
    fn function_arity_mismatch_is_reported() {
        let mut subst = Substitution::default();
        let int = Type::Primitive(Symbol::intern("int"));
        let f1 = Type::Function(vec![int.clone()], Box::new(int.clone()));
        let f2 = Type::Function(vec![int.clone(), int.clone()], Box::new(int));
        let err = unify(&mut subst, &f1, &f2, loc()).unwrap_err();
        assert!(matches!(err, UnifyError::ArityMismatch { kind: ArityKind::Function, .. }));
    }

    #[test]
    fn const_generics_unify_only_on_equal_value() {
        let mut subst = Substitution::default();
        assert!(unify(&mut subst, &Type::Const(3), &Type::Const(3), loc()).is_ok());
        assert!(unify(&mut subst, &Type::Const(3), &Type::Const(5), loc()).is_err());
    }
}
