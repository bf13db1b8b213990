//! Module-level compilation cache (`SPEC_FULL.md` §11.4).
//!
//! `spec.md` §1's Non-goal excludes "incremental compilation beyond
//! module-level caching" — module-level caching itself is in scope. This
//! is whole-file memoization, not fine-grained incremental re-analysis: a
//! cache entry is keyed by a content hash of the source bytes *and* the
//! resolved lockfile's fingerprint (§13: "a module's bindings can change
//! without its own text changing"), and a hit replays the entire stored
//! [`crate::pipeline::PipelineOutput`] rather than resuming mid-pipeline.

#![cfg(feature = "cache")]

use std::path::{Path, PathBuf};

use lumina_diagnostic::Diagnostic;
use lumina_module::{Lockfile, ModuleExport};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::pipeline::PipelineOutput;

/// The persisted half of a [`PipelineOutput`] — everything needed to
/// replay a cache hit without re-running C1–C9.
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    fingerprint: u64,
    diagnostics: Vec<Diagnostic>,
    js: Option<String>,
    source_map: Option<String>,
    exports: FxHashMap<lumina_ir::Symbol, ModuleExport>,
}

/// Computes the fingerprint a cache entry is keyed by: the source bytes'
/// hash folded with the lockfile's own fingerprint, so a lockfile edit
/// invalidates every file's cache entry even though none of their own text
/// changed (§13's open-question decision).
pub fn fingerprint(source: &str, lockfile: &Lockfile) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    source.hash(&mut hasher);
    lockfile_fingerprint(lockfile).hash(&mut hasher);
    hasher.finish()
}

fn lockfile_fingerprint(lockfile: &Lockfile) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    lockfile.lockfile_version.hash(&mut hasher);
    let mut names: Vec<&String> = lockfile.packages.keys().collect();
    names.sort();
    for name in names {
        let pkg = &lockfile.packages[name];
        name.hash(&mut hasher);
        pkg.version.hash(&mut hasher);
        pkg.resolved.hash(&mut hasher);
    }
    hasher.finish()
}

fn entry_path(cache_dir: &Path, fingerprint: u64) -> PathBuf {
    cache_dir.join(format!("{fingerprint:016x}.bincode"))
}

/// Looks up a cache entry for `fingerprint` under `cache_dir`. Returns
/// `Ok(None)` on a plain miss (no file present); an I/O error distinct
/// from "missing" or a decode failure is reported so the caller can choose
/// to fall back to a fresh compile rather than hard-fail.
pub fn lookup(cache_dir: &Path, fingerprint: u64) -> Result<Option<PipelineOutput>, CacheError> {
    let path = entry_path(cache_dir, fingerprint);
    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::Read { path: path.display().to_string(), source: e }),
    };
    let entry: CacheEntry =
        bincode::deserialize(&bytes).map_err(|e| CacheError::Decode { path: path.display().to_string(), source: e })?;
    if entry.fingerprint != fingerprint {
        // A hash collision or a truncated/corrupt write — treat as a miss
        // rather than replaying data for the wrong file.
        return Ok(None);
    }
    Ok(Some(PipelineOutput {
        diagnostics: entry.diagnostics,
        js: entry.js,
        source_map: entry.source_map,
        exports: entry.exports,
    }))
}

/// Persists `output` under `cache_dir`, keyed by `fingerprint`.
pub fn store(cache_dir: &Path, fingerprint: u64, output: &PipelineOutput) -> Result<(), CacheError> {
    std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Write { path: cache_dir.display().to_string(), source: e })?;
    let entry = CacheEntry {
        fingerprint,
        diagnostics: output.diagnostics.clone(),
        js: output.js.clone(),
        source_map: output.source_map.clone(),
        exports: output.exports.clone(),
    };
    let bytes = bincode::serialize(&entry).map_err(CacheError::Encode)?;
    let path = entry_path(cache_dir, fingerprint);
    std::fs::write(&path, bytes).map_err(|e| CacheError::Write { path: path.display().to_string(), source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{compile_source, CompileOptions};
    use lumina_module::ModuleRegistry;

    #[test]
    fn same_source_and_lockfile_fingerprint_the_same() {
        let lockfile = Lockfile::empty();
        assert_eq!(fingerprint("fn main()->int { 0 }", &lockfile), fingerprint("fn main()->int { 0 }", &lockfile));
    }

    #[test]
    fn different_source_fingerprints_differently() {
        let lockfile = Lockfile::empty();
        assert_ne!(fingerprint("fn main()->int { 0 }", &lockfile), fingerprint("fn main()->int { 1 }", &lockfile));
    }

    #[test]
    fn store_then_lookup_round_trips_a_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModuleRegistry::new();
        let lockfile = Lockfile::empty();
        let src = "fn main()->int { return 3 |> id(); } fn id(x:int)->int { x }";
        let output = compile_source(src, "test.lm", &registry, &lockfile, &CompileOptions::default());
        let fp = fingerprint(src, &lockfile);
        store(dir.path(), fp, &output).unwrap();
        let replayed = lookup(dir.path(), fp).unwrap().unwrap();
        assert_eq!(replayed.js, output.js);
        assert_eq!(replayed.diagnostics.len(), output.diagnostics.len());
    }

    #[test]
    fn lookup_of_missing_entry_is_a_plain_miss() {
        let dir = tempfile::tempdir().unwrap();
        assert!(lookup(dir.path(), 0xdead_beef).unwrap().is_none());
    }
}
