//! CLI error types.

use std::path::PathBuf;

use markdata_config::ConfigError;
use markdata_core::ResolveError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("failed to load directives from {}: {source}", path.display())]
    Directives {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} files failed")]
    Batch { failed: usize, total: usize },

    #[error("{0}")]
    Validation(String),
}
