//! Project-wide state shared across a multi-file analysis run (§5, §3.5).
//!
//! `spec.md` §5 draws the line precisely: "the `ProjectContext` holds
//! per-file state as an ordinary map mutated by the host (LSP or CLI)
//! between analyses." [`ProjectContext`] is that map. The [`ModuleRegistry`]
//! it owns is read-only once a file starts analyzing (§5: "the module
//! registry is read-only after construction"); registering a file's own
//! exports for the benefit of files that import it is the one mutation the
//! host performs, and it always happens between analyses, never during one.

use std::path::PathBuf;

use lumina_diagnostic::Diagnostic;
use lumina_module::{Lockfile, ModuleExport, ModuleRegistry};
use rustc_hash::FxHashMap;

/// Per-file record the host keeps between analyses.
#[derive(Debug, Clone, Default)]
pub struct FileRecord {
    pub diagnostics: Vec<Diagnostic>,
    pub js: Option<String>,
    pub source_map: Option<String>,
}

/// Shared state for analyzing a multi-file Lumina project.
///
/// Holds the project lockfile and the module registry every file's import
/// resolution reads from, plus a flat per-file record map. Nothing here is
/// shared *during* a single file's analysis (§5: "analysis of a file is
/// sequential" — "no shared mutable data structures between files within
/// a run"); files register their exports into `registry` once their own
/// analysis completes so that dependents can resolve them.
#[derive(Debug)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub lockfile: Lockfile,
    registry: ModuleRegistry,
    files: FxHashMap<String, FileRecord>,
}

impl ProjectContext {
    pub fn new(root: impl Into<PathBuf>, lockfile: Lockfile) -> Self {
        ProjectContext { root: root.into(), lockfile, registry: ModuleRegistry::new(), files: FxHashMap::default() }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Registers a file's export set under its module specifier so that
    /// other files in the project can import it. Called by the host after
    /// a file's own analysis has produced its exports — this is the one
    /// registry mutation §5 reserves for the host, between analyses.
    pub fn register_module(&mut self, specifier: impl Into<String>, exports: FxHashMap<lumina_ir::Symbol, ModuleExport>) {
        self.registry.register(specifier, exports);
    }

    pub fn record(&mut self, path: impl Into<String>, record: FileRecord) {
        self.files.insert(path.into(), record);
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Drops a pending file's record. §5: "Cancellation is advisory at
    /// file granularity: the host may drop a pending analysis result;
    /// in-progress analyses run to completion." This only ever removes an
    /// already-completed record the host has decided to discard — it
    /// cannot reach into a still-running analysis.
    pub fn cancel(&mut self, path: &str) {
        self.files.remove(path);
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_no_files() {
        let ctx = ProjectContext::new(".", Lockfile::empty());
        assert_eq!(ctx.file_count(), 0);
    }

    #[test]
    fn recording_and_fetching_a_file_round_trips() {
        let mut ctx = ProjectContext::new(".", Lockfile::empty());
        ctx.record("a.lm", FileRecord { js: Some("1".into()), ..Default::default() });
        assert_eq!(ctx.get("a.lm").unwrap().js.as_deref(), Some("1"));
    }

    #[test]
    fn cancel_drops_the_record() {
        let mut ctx = ProjectContext::new(".", Lockfile::empty());
        ctx.record("a.lm", FileRecord::default());
        ctx.cancel("a.lm");
        assert!(ctx.get("a.lm").is_none());
    }

    #[test]
    fn registering_a_module_makes_it_importable() {
        let mut ctx = ProjectContext::new(".", Lockfile::empty());
        let mut exports = FxHashMap::default();
        exports.insert(lumina_ir::Symbol::intern("helper"), ModuleExport::Value);
        ctx.register_module("my-lib", exports);
        assert!(ctx.registry().exports_of("my-lib").is_some());
    }
}
