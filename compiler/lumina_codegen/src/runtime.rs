//! Runtime surface (§6.4): the exact names generated code references from
//! the `lumina-runtime` package. These are part of the ABI between
//! generated JS and the runtime library, not re-specified here — the
//! emitter's only job is to import them under the right module system.

pub const RUNTIME_NAMES: &[&str] = &[
    "io",
    "str",
    "math",
    "list",
    "vec",
    "hashmap",
    "hashset",
    "channel",
    "thread",
    "sync",
    "fs",
    "http",
    "time",
    "regex",
    "crypto",
    "Result",
    "Option",
    "__set",
    "formatValue",
    "__lumina_stringify",
    "__lumina_range",
    "__lumina_slice",
    "__lumina_index",
    "LuminaPanic",
    "__lumina_try",
];

pub const RUNTIME_PACKAGE: &str = "lumina-runtime";
