//! Project lockfile model (§6.2).
//!
//! `lumina.lock.json` enumerates the packages a project depends on and
//! where each package's exports live. This is read-only, pure data — the
//! registry never writes it back.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A package's `lumina` field: either a single entry file, or a map from
/// subpath specifier to entry file (§6.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LuminaEntry {
    Single(String),
    Subpaths(FxHashMap<String, String>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub version: String,
    pub resolved: String,
    pub lumina: LuminaEntry,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(rename = "lockfileVersion")]
    pub lockfile_version: u32,
    pub packages: FxHashMap<String, LockedPackage>,
}

#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("failed to read lockfile at {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("failed to parse lockfile at {path}: {source}")]
    Parse { path: String, #[source] source: serde_json::Error },
}

impl Lockfile {
    pub fn empty() -> Self {
        Lockfile { lockfile_version: 1, packages: FxHashMap::default() }
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, LockfileError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| LockfileError::Io { path: path.display().to_string(), source })?;
        Self::parse(&text).map_err(|source| LockfileError::Parse { path: path.display().to_string(), source })
    }

    /// Resolves `specifier`'s entry file for the given package, honoring
    /// the subpath form of the `lumina` field.
    pub fn resolve_entry<'a>(&'a self, package: &str, subpath: Option<&str>) -> Option<&'a str> {
        let locked = self.packages.get(package)?;
        match (&locked.lumina, subpath) {
            (LuminaEntry::Single(path), None) => Some(path.as_str()),
            (LuminaEntry::Single(path), Some(_)) => Some(path.as_str()),
            (LuminaEntry::Subpaths(map), Some(sub)) => map.get(sub).map(String::as_str),
            (LuminaEntry::Subpaths(_), None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_entry_package() {
        let json = r#"{
            "lockfileVersion": 1,
            "packages": { "my-lib": { "version": "1.0.0", "resolved": "/pkgs/my-lib", "lumina": "./index.lm" } }
        }"#;
        let lock = Lockfile::parse(json).unwrap();
        assert_eq!(lock.resolve_entry("my-lib", None), Some("./index.lm"));
    }

    #[test]
    fn resolves_subpath_entry() {
        let json = r#"{
            "lockfileVersion": 1,
            "packages": { "my-lib": { "version": "1.0.0", "resolved": "/pkgs/my-lib", "lumina": { "./sub": "./sub.lm" } } }
        }"#;
        let lock = Lockfile::parse(json).unwrap();
        assert_eq!(lock.resolve_entry("my-lib", Some("./sub")), Some("./sub.lm"));
        assert_eq!(lock.resolve_entry("my-lib", Some("./missing")), None);
    }

    #[test]
    fn missing_package_resolves_to_none() {
        let lock = Lockfile::empty();
        assert_eq!(lock.resolve_entry("nope", None), None);
    }
}
