//! Module registry and graph (C2, §4.2, §3.5).
//!
//! Resolves imports against the `@std` prelude, the project lockfile, and
//! relative specifiers, producing per-file module bindings. Pure and
//! read-only after construction — no filesystem access lives here; the
//! host reads lockfiles and module sources and feeds them in.

mod lockfile;
mod registry;

pub use lockfile::{Lockfile, LockedPackage, LockfileError, LuminaEntry};
pub use registry::{ModuleExport, ModuleRegistry};
