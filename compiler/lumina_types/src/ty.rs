//! HM type representation (§3.3).
//!
//! Per `SPEC_FULL.md` §13's open-question decision, this is a directly
//! `Box`-recursive enum rather than the teacher's `Idx`-into-`Pool`
//! interning scheme: the core's types are small and short-lived per file
//! analysis, so the extra layer of indirection doesn't pay for itself here.
//! `TypeFlags` is kept from the teacher (`ori_types::flags`) as a cheap
//! summary computed bottom-up on construction rather than cached per `Idx`.

use bitflags::bitflags;
use lumina_ir::Symbol;

bitflags! {
    /// Bottom-up summary bits over a [`Type`], grounded in `ori_types`'
    /// `TypeFlags` (used there to skip occurs-check traversal when no
    /// variable is present at all).
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct TypeFlags: u8 {
        const HAS_VAR          = 0b0000_0001;
        const HAS_CONST_PARAM  = 0b0000_0010;
    }
}

/// A unification variable identity.
pub type VarId = u32;

/// §3.3: `Primitive(name) | Adt(name, params) | Function(params, return) |
/// Var(id) | Scheme(quantified vars, bounds, body)`. Const-generic
/// parameters carry integer values and unify only structurally.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Primitive(Symbol),
    Adt(Symbol, Vec<Type>),
    Function(Vec<Type>, Box<Type>),
    Var(VarId),
    /// An integer const-generic argument, e.g. the `3` in `zeros<i32,3>`.
    Const(i64),
    Scheme(Vec<VarId>, Vec<Symbol>, Box<Type>),
}

impl Type {
    pub fn unit() -> Type {
        Type::Primitive(Symbol::intern("unit"))
    }

    pub fn any() -> Type {
        Type::Primitive(Symbol::intern("any"))
    }

    pub fn flags(&self) -> TypeFlags {
        match self {
            Type::Primitive(_) | Type::Const(_) => TypeFlags::empty(),
            Type::Var(_) => TypeFlags::HAS_VAR,
            Type::Adt(_, params) => params.iter().fold(TypeFlags::empty(), |f, p| f | p.flags()),
            Type::Function(params, ret) => {
                params.iter().fold(ret.flags(), |f, p| f | p.flags())
            }
            Type::Scheme(_, _, body) => body.flags() & !TypeFlags::HAS_VAR,
        }
    }

    /// Free (unquantified) variables, used by let-generalization to decide
    /// which vars are safe to bind in a `Scheme`.
    pub fn free_vars(&self, out: &mut rustc_hash::FxHashSet<VarId>) {
        match self {
            Type::Primitive(_) | Type::Const(_) => {}
            Type::Var(id) => {
                out.insert(*id);
            }
            Type::Adt(_, params) => params.iter().for_each(|p| p.free_vars(out)),
            Type::Function(params, ret) => {
                params.iter().for_each(|p| p.free_vars(out));
                ret.free_vars(out);
            }
            Type::Scheme(quantified, _, body) => {
                let mut inner = rustc_hash::FxHashSet::default();
                body.free_vars(&mut inner);
                for q in quantified {
                    inner.remove(q);
                }
                out.extend(inner);
            }
        }
    }

    pub fn display(&self) -> String {
        match self {
            Type::Primitive(name) => name.to_string(),
            Type::Adt(name, params) if params.is_empty() => name.to_string(),
            Type::Adt(name, params) => {
                format!("{name}<{}>", params.iter().map(Type::display).collect::<Vec<_>>().join(", "))
            }
            Type::Function(params, ret) => {
                format!("fn({}) -> {}", params.iter().map(Type::display).collect::<Vec<_>>().join(", "), ret.display())
            }
            Type::Var(id) => format!("?{id}"),
            Type::Const(v) => v.to_string(),
            Type::Scheme(vars, bounds, body) => {
                let bound_str = if bounds.is_empty() {
                    String::new()
                } else {
                    format!(" where {}", bounds.iter().map(Symbol::to_string).collect::<Vec<_>>().join(" + "))
                };
                format!("forall {:?}. {}{}", vars, body.display(), bound_str)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_propagate_from_nested_var() {
        let ty = Type::Adt(Symbol::intern("List"), vec![Type::Var(0)]);
        assert!(ty.flags().contains(TypeFlags::HAS_VAR));
    }

    #[test]
    fn scheme_quantified_vars_are_not_free() {
        let body = Type::Function(vec![Type::Var(0)], Box::new(Type::Var(0)));
        let scheme = Type::Scheme(vec![0], vec![], Box::new(body));
        let mut free = rustc_hash::FxHashSet::default();
        scheme.free_vars(&mut free);
        assert!(free.is_empty());
    }
}
