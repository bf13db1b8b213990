//! Substitution map for unification variables.
//!
//! A flat `var -> Type` binding table with chain resolution, grounded in
//! the teacher's link-based `UnifyEngine` but using an explicit map instead
//! of in-place pool links, matching the non-interned [`crate::Type`]
//! representation.

use rustc_hash::FxHashMap;

use crate::ty::{Type, VarId};

#[derive(Default, Debug)]
pub struct Substitution {
    bindings: FxHashMap<VarId, Type>,
}

impl Substitution {
    pub fn bind(&mut self, var: VarId, ty: Type) {
        self.bindings.insert(var, ty);
    }

    /// Follows var -> var -> ... chains and recursively resolves any bound
    /// type variables appearing inside compound types, returning a type
    /// with no resolvable `Var` left in it.
    pub fn resolve(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(id) => match self.bindings.get(id) {
                Some(bound) => self.resolve(bound),
                None => ty.clone(),
            },
            Type::Adt(name, params) => Type::Adt(*name, params.iter().map(|p| self.resolve(p)).collect()),
            Type::Function(params, ret) => {
                Type::Function(params.iter().map(|p| self.resolve(p)).collect(), Box::new(self.resolve(ret)))
            }
            Type::Scheme(vars, bounds, body) => Type::Scheme(vars.clone(), bounds.clone(), Box::new(self.resolve(body))),
            Type::Primitive(_) | Type::Const(_) => ty.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_chained_vars() {
        let mut subst = Substitution::default();
        subst.bind(0, Type::Var(1));
        subst.bind(1, Type::Primitive(lumina_ir::Symbol::intern("int")));
        assert_eq!(subst.resolve(&Type::Var(0)), Type::Primitive(lumina_ir::Symbol::intern("int")));
    }

    #[test]
    fn resolves_inside_compound_types() {
        let mut subst = Substitution::default();
        subst.bind(0, Type::Primitive(lumina_ir::Symbol::intern("int")));
        let adt = Type::Adt(lumina_ir::Symbol::intern("List"), vec![Type::Var(0)]);
        assert_eq!(subst.resolve(&adt), Type::Adt(lumina_ir::Symbol::intern("List"), vec![Type::Primitive(lumina_ir::Symbol::intern("int"))]));
    }
}
