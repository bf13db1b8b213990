//! Process-wide trait-impl registry (§5 "Shared-resource policy", §9
//! "Global mutable state").
//!
//! Grounded in the teacher's registry modules and the interning pattern of
//! `lumina_ir::interner`: a single append-only table behind a
//! `parking_lot::RwLock`, initialized lazily and never cleared. Records
//! which concrete types satisfy which trait bound (`Hash`/`Eq`/`Ord`, or
//! any user trait declared via `impl Trait for Type`).

use std::sync::OnceLock;

use lumina_ir::Symbol;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

fn table() -> &'static RwLock<FxHashSet<(Symbol, Symbol)>> {
    static TABLE: OnceLock<RwLock<FxHashSet<(Symbol, Symbol)>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(FxHashSet::default()))
}

/// Records that `ty` implements `trait_name`. Called once per `ImplDecl`
/// seen across the whole process; never removed.
pub fn register_impl(ty: Symbol, trait_name: Symbol) {
    table().write().insert((ty, trait_name));
}

/// §4.4 "Trait bounds": true if `ty` has a registered impl of `bound`.
pub fn satisfies(ty: Symbol, bound: Symbol) -> bool {
    table().read().contains(&(ty, bound))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_impl_satisfies_bound_afterward() {
        let ty = Symbol::intern("lumina_types_test_registry_ty");
        let bound = Symbol::intern("lumina_types_test_registry_bound");
        assert!(!satisfies(ty, bound));
        register_impl(ty, bound);
        assert!(satisfies(ty, bound));
    }
}
