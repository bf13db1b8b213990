//! Pipeline orchestration, project context, module-level cache, and CLI
//! for the Lumina compiler (§5, §6.5, `SPEC_FULL.md` §10–§11).
//!
//! This crate is the only one in the workspace that knows about *all*
//! nine components: it reads source text and a lockfile, drives C1
//! through C9 in the order §2's data-flow line specifies, and hands back
//! diagnostics plus emitted JS. Everything phase-specific (parsing,
//! inference, codegen, ...) lives in its own crate; this one just wires
//! them together and owns the ambient concerns — tracing setup, the
//! project-wide per-file state map, and the optional module-level cache.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod testing;
pub mod tracing_setup;

#[cfg(feature = "cache")]
pub mod cache;

mod cli;

pub use context::{FileRecord, ProjectContext};
pub use error::ProjectError;
pub use pipeline::{compile_source, import_aliases, CompileOptions, PipelineOutput};
pub use project::{analyze_project, ProjectFile};

/// Entry point for the `lumina` binary.
pub fn run_cli() {
    cli::main();
}
