//! Leaf I/O errors at the driver's true boundaries (§11.2). These never
//! flow into the diagnostics engine directly; callers adapt them into a
//! [`lumina_diagnostic::Diagnostic`] with an appropriate code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read source file {path}: {source}")]
    ReadSource { path: String, #[source] source: std::io::Error },
    #[error("failed to read lockfile: {0}")]
    Lockfile(#[from] lumina_module::LockfileError),
    #[error("no lockfile found at {0}; pass --lockfile or add lumina.lock.json")]
    MissingLockfile(String),
}

#[cfg(feature = "cache")]
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache entry at {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("failed to write cache entry at {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },
    #[error("failed to deserialize cache entry at {path}: {source}")]
    Decode { path: String, #[source] source: bincode::Error },
    #[error("failed to serialize cache entry: {0}")]
    Encode(#[source] bincode::Error),
}
