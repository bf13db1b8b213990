//! HM type representation, unification, generalization, and the
//! process-wide trait-impl registry for the Lumina compiler (C4, §3.3,
//! §4.4).
//!
//! `lumina_types` owns constraint generation/solving (`infer`), the `Type`
//! representation (`ty`), the substitution map unification resolves
//! through (`subst`), unification itself (`unify`), and the append-only
//! trait-bound registry (`registry`) described in §5/§9.

pub mod infer;
pub mod registry;
pub mod subst;
pub mod ty;
pub mod unify;

pub use infer::{InferEngine, InferenceResult};
pub use ty::{Type, TypeFlags, VarId};
