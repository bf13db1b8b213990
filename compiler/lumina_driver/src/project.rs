//! Multi-file project analysis (§5, §3.5).
//!
//! §5 draws two lines at once: analysis of a single file is strictly
//! sequential (C1 through C9, in order), but "between files, there is no
//! guaranteed order" — independent files in a multi-file run are
//! embarrassingly parallel. [`analyze_project`] is the host-side driver
//! that exploits that: it batches a project's files by their import
//! dependencies on *other files in the same project* (topological order),
//! runs every file within a batch through [`compile_source`] concurrently
//! with `rayon`, and only mutates the shared [`ModuleRegistry`] — via
//! [`ProjectContext::register_module`] — in the sequential gap between
//! batches, never while a batch's files are analyzing.

use rustc_hash::{FxHashMap, FxHashSet};

use lumina_ir::ast::Stmt;

use crate::context::{FileRecord, ProjectContext};
use crate::pipeline::{compile_source, CompileOptions, PipelineOutput};

/// One file of a multi-file project: its module specifier (what other
/// files in the project import it as), a display origin for diagnostics,
/// and its source text. The host (CLI or embedder) is responsible for
/// reading files off disk and assigning specifiers per its own package
/// layout (§1's "package resolution file-system layout" Non-goal).
pub struct ProjectFile {
    pub specifier: String,
    pub origin: String,
    pub source: String,
}

/// Runs every file in `files` through the full C1–C9 pipeline, batching
/// independent files for concurrent analysis and registering each file's
/// exports into `ctx` before the batch of its dependents starts.
///
/// A cyclic import graph among project files has no valid topological
/// order; the cycle's remaining files are simply run in one final batch
/// in input order. Any import that targets a not-yet-registered module
/// resolves as an ordinary unknown-package diagnostic (`PKG-001`) rather
/// than a special cycle error — §5 never promises cross-file cycle
/// detection, only that "in-progress analyses run to completion."
pub fn analyze_project(ctx: &mut ProjectContext, files: &[ProjectFile], options: &CompileOptions) -> FxHashMap<String, PipelineOutput> {
    let mut results: FxHashMap<String, PipelineOutput> = FxHashMap::default();
    let local_specifiers: FxHashSet<&str> = files.iter().map(|f| f.specifier.as_str()).collect();
    let mut remaining: Vec<&ProjectFile> = files.iter().collect();

    while !remaining.is_empty() {
        let mut ready: Vec<&ProjectFile> = remaining
            .iter()
            .filter(|f| local_imports(&f.source, &local_specifiers).into_iter().all(|dep| results.contains_key(dep)))
            .copied()
            .collect();
        // A cycle among the remaining files leaves `ready` empty with
        // files still outstanding; take all of them as one final batch
        // so the loop always terminates.
        if ready.is_empty() {
            ready = remaining.clone();
        }
        let ready_specifiers: FxHashSet<&str> = ready.iter().map(|f| f.specifier.as_str()).collect();
        remaining.retain(|f| !ready_specifiers.contains(f.specifier.as_str()));

        let outputs: Vec<(String, PipelineOutput)> = {
            let registry = ctx.registry();
            let lockfile = &ctx.lockfile;
            use rayon::prelude::*;
            ready
                .par_iter()
                .map(|f| (f.specifier.clone(), compile_source(&f.source, &f.origin, registry, lockfile, options)))
                .collect()
        };

        for (specifier, output) in outputs {
            ctx.register_module(specifier.clone(), output.exports.clone());
            ctx.record(
                specifier.clone(),
                FileRecord { diagnostics: output.diagnostics.clone(), js: output.js.clone(), source_map: output.source_map.clone() },
            );
            results.insert(specifier, output);
        }
    }

    results
}

/// Scans a file's import statements for specifiers that name another file
/// in this same project (as opposed to `@std` or a lockfile package),
/// without running full C1–C5 analysis on it — just enough structure to
/// order the batches. A parse failure here yields no dependencies; the
/// real parse happens inside [`compile_source`] and reports the syntax
/// diagnostic normally.
fn local_imports<'a>(source: &str, local_specifiers: &FxHashSet<&'a str>) -> Vec<&'a str> {
    let Ok(program) = lumina_parse::parse(source) else {
        return Vec::new();
    };
    program
        .items
        .iter()
        .filter_map(|item| match item {
            Stmt::Import(import) => local_specifiers.get(import.specifier.as_str()).copied(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_module::Lockfile;

    #[test]
    fn independent_files_all_analyze() {
        let mut ctx = ProjectContext::new(".", Lockfile::empty());
        let files = vec![
            ProjectFile { specifier: "a".into(), origin: "a.lm".into(), source: "pub fn f()->int { 1 }".into() },
            ProjectFile { specifier: "b".into(), origin: "b.lm".into(), source: "pub fn g()->int { 2 }".into() },
        ];
        let results = analyze_project(&mut ctx, &files, &CompileOptions::default());
        assert_eq!(results.len(), 2);
        assert!(!results["a"].has_errors());
        assert!(!results["b"].has_errors());
    }

    #[test]
    fn dependent_file_sees_producer_export() {
        let mut ctx = ProjectContext::new(".", Lockfile::empty());
        let files = vec![
            ProjectFile { specifier: "dep".into(), origin: "dep.lm".into(), source: "pub fn helper()->int { 42 }".into() },
            ProjectFile {
                specifier: "main".into(),
                origin: "main.lm".into(),
                source: "import { helper } from \"dep\" fn main()->int { helper() }".into(),
            },
        ];
        let results = analyze_project(&mut ctx, &files, &CompileOptions::default());
        assert!(!results["dep"].has_errors());
        assert!(!results["main"].has_errors(), "{:?}", results["main"].diagnostics);
    }

    #[test]
    fn cyclic_imports_still_terminate() {
        let mut ctx = ProjectContext::new(".", Lockfile::empty());
        let files = vec![
            ProjectFile {
                specifier: "a".into(),
                origin: "a.lm".into(),
                source: "import { g } from \"b\" pub fn f()->int { g() }".into(),
            },
            ProjectFile {
                specifier: "b".into(),
                origin: "b.lm".into(),
                source: "import { f } from \"a\" pub fn g()->int { f() }".into(),
            },
        ];
        let results = analyze_project(&mut ctx, &files, &CompileOptions::default());
        assert_eq!(results.len(), 2);
    }
}
