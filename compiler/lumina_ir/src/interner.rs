//! Global string interner.
//!
//! Grounded on the teacher's `ori_ir::interner`: identifiers and type names
//! are interned once into a process-wide, append-only table so that
//! `Symbol` comparisons are integer comparisons rather than string
//! comparisons. Per §9 ("Global mutable state ... should be an append-only
//! structure initialized during program startup ... init-once, never
//! cleared"), this uses a `parking_lot::RwLock` behind a `OnceLock`, not a
//! per-analysis table.

use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// An interned string. Cheap to copy and compare.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub struct Symbol(u32);

struct Interner {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Interner { strings: Vec::new(), lookup: FxHashMap::default() }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.lookup.get(s) {
            return Symbol(id);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, id);
        Symbol(id)
    }

    fn resolve(&self, sym: Symbol) -> &'static str {
        self.strings[sym.0 as usize]
    }
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| RwLock::new(Interner::new()))
}

impl Symbol {
    pub fn intern(s: &str) -> Symbol {
        interner().write().intern(s)
    }

    pub fn as_str(&self) -> &'static str {
        interner().read().resolve(*self)
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::intern(&s)
    }
}

// A `Symbol`'s `u32` id is only stable within one process's interner, so
// the cache (§11.4) serializes it as the string it resolves to and
// re-interns on load rather than persisting the raw id.
#[cfg(feature = "cache")]
impl serde::Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "cache")]
impl<'de> serde::Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_symbol() {
        let a = Symbol::intern("double");
        let b = Symbol::intern("double");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "double");
    }

    #[test]
    fn different_text_interns_to_different_symbols() {
        assert_ne!(Symbol::intern("foo"), Symbol::intern("bar"));
    }
}
