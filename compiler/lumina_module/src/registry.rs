//! Module registry and resolution (C2, §4.2).
//!
//! Resolution is pure: given the project root, a [`Lockfile`], and a
//! file's import list, the registry produces [`ModuleExport`]s and local
//! bindings. It never touches the filesystem itself — the host supplies
//! already-read module sources through [`ModuleRegistry::register`].

use lumina_diagnostic::{Diagnostic, ErrorCode};
use lumina_ir::ast::{Import, ImportKind};
use lumina_ir::{Location, Symbol};
use rustc_hash::FxHashMap;

use crate::lockfile::Lockfile;

/// A single exported member of a module (§3.5).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ModuleExport {
    Function { param_types: Vec<Symbol>, param_names: Vec<Symbol>, return_type: Symbol },
    Type,
    Value,
    Module { exports: FxHashMap<Symbol, ModuleExport> },
}

/// Registry owning resolved module export sets, keyed by specifier
/// (`@std/math`, `my-lib`, `my-lib/sub`). Read-only after construction
/// (§5: "the module registry is read-only after construction").
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<String, FxHashMap<Symbol, ModuleExport>>,
}

fn std_prelude() -> FxHashMap<Symbol, ModuleExport> {
    // Minimal prelude mirroring the runtime surface named in §6.4; the
    // registry only needs to know these are *callable* exports, not their
    // exact signatures, since the runtime itself is an external collaborator.
    let mut exports = FxHashMap::default();
    for name in ["print", "read_line"] {
        exports.insert(
            Symbol::intern(name),
            ModuleExport::Function {
                param_types: vec![Symbol::intern("any")],
                param_names: vec![Symbol::intern("x")],
                return_type: Symbol::intern("unit"),
            },
        );
    }
    exports
}

impl ModuleRegistry {
    pub fn new() -> Self {
        let mut modules = FxHashMap::default();
        modules.insert("@std".to_string(), std_prelude());
        ModuleRegistry { modules }
    }

    /// Registers a resolved module's export set under `specifier`. Used
    /// by the host after reading and analyzing a module's own file.
    pub fn register(&mut self, specifier: impl Into<String>, exports: FxHashMap<Symbol, ModuleExport>) {
        self.modules.insert(specifier.into(), exports);
    }

    pub fn exports_of(&self, specifier: &str) -> Option<&FxHashMap<Symbol, ModuleExport>> {
        self.modules.get(specifier)
    }

    fn resolve_specifier<'a>(
        &'a self,
        lockfile: &Lockfile,
        specifier: &str,
        location: Location,
    ) -> Result<&'a FxHashMap<Symbol, ModuleExport>, Diagnostic> {
        if let Some(stripped) = specifier.strip_prefix("@std") {
            let key = format!("@std{stripped}");
            return self
                .modules
                .get("@std")
                .filter(|_| stripped.is_empty() || stripped.starts_with('/'))
                .ok_or_else(|| pkg_001(location, &key));
        }
        let (package, subpath) = match specifier.split_once('/') {
            Some((pkg, sub)) => (pkg, Some(sub)),
            None => (specifier, None),
        };
        if lockfile.resolve_entry(package, subpath.map(|s| format!("./{s}")).as_deref()).is_none()
            && !lockfile.packages.contains_key(package)
        {
            return Err(pkg_001(location, package));
        }
        self.modules.get(specifier).or_else(|| self.modules.get(package)).ok_or_else(|| pkg_003(location, specifier))
    }

    /// Resolves one file's imports into local name bindings (§4.2),
    /// producing a fresh `moduleBindings` map (§3.5: "derived fresh per
    /// analysis") plus the prelude unless shadowed.
    pub fn resolve_imports(
        &self,
        lockfile: &Lockfile,
        imports: &[Import],
    ) -> (FxHashMap<Symbol, ModuleExport>, Vec<Diagnostic>) {
        let mut bindings = std_prelude();
        let mut diagnostics = Vec::new();

        for import in imports {
            let exports = match self.resolve_specifier(lockfile, &import.specifier, import.location) {
                Ok(e) => e,
                Err(d) => {
                    diagnostics.push(d);
                    continue;
                }
            };
            match &import.kind {
                ImportKind::Namespace { alias } => {
                    bindings.insert(*alias, ModuleExport::Module { exports: exports.clone() });
                }
                ImportKind::Named { items } => {
                    for (name, alias) in items {
                        let Some(export) = exports.get(name) else {
                            diagnostics.push(pkg_003(import.location, &name.to_string()));
                            continue;
                        };
                        bindings.insert(alias.unwrap_or(*name), export.clone());
                    }
                }
            }
        }
        (bindings, diagnostics)
    }
}

fn pkg_001(location: Location, package: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::Pkg001, location, format!("unknown package `{package}`"))
}

fn pkg_003(location: Location, what: &str) -> Diagnostic {
    Diagnostic::error(ErrorCode::Pkg003, location, format!("missing export `{what}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Position;

    fn loc() -> Location {
        Location::new(Position::default(), Position::default())
    }

    #[test]
    fn resolves_namespace_import_to_module_export() {
        let registry = ModuleRegistry::new();
        let lockfile = Lockfile::empty();
        let imports = vec![Import {
            specifier: "@std".to_string(),
            kind: ImportKind::Namespace { alias: Symbol::intern("io") },
            location: loc(),
        }];
        let (bindings, diags) = registry.resolve_imports(&lockfile, &imports);
        assert!(diags.is_empty());
        assert!(matches!(bindings.get(&Symbol::intern("io")), Some(ModuleExport::Module { .. })));
    }

    #[test]
    fn unknown_package_is_pkg_001() {
        let registry = ModuleRegistry::new();
        let lockfile = Lockfile::empty();
        let imports = vec![Import {
            specifier: "nope".to_string(),
            kind: ImportKind::Namespace { alias: Symbol::intern("ns") },
            location: loc(),
        }];
        let (_bindings, diags) = registry.resolve_imports(&lockfile, &imports);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, ErrorCode::Pkg001);
    }

    #[test]
    fn named_import_renames_binding() {
        let mut registry = ModuleRegistry::new();
        let mut exports = FxHashMap::default();
        exports.insert(Symbol::intern("helper"), ModuleExport::Value);
        registry.register("my-lib", exports);
        let mut lockfile = Lockfile::empty();
        lockfile.packages.insert(
            "my-lib".to_string(),
            crate::lockfile::LockedPackage {
                version: "1.0.0".to_string(),
                resolved: "/pkgs/my-lib".to_string(),
                lumina: crate::lockfile::LuminaEntry::Single("./index.lm".to_string()),
            },
        );
        let imports = vec![Import {
            specifier: "my-lib".to_string(),
            kind: ImportKind::Named { items: vec![(Symbol::intern("helper"), Some(Symbol::intern("h")))] },
            location: loc(),
        }];
        let (bindings, diags) = registry.resolve_imports(&lockfile, &imports);
        assert!(diags.is_empty());
        assert!(bindings.contains_key(&Symbol::intern("h")));
    }
}
