//! Error type for document resolution.

use std::io;
use std::path::PathBuf;

use crate::directive::{ArgsError, DirectiveError};
use crate::front_matter::FrontMatterError;

/// Failure resolving one document.
///
/// Resolution is all-or-nothing: any of these means no output was produced.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The declared front matter block is malformed.
    #[error("{0}")]
    Metadata(#[from] FrontMatterError),

    /// A directive's argument literal is not a static data literal.
    #[error("invalid arguments for `{name}` on line {line}: {source}")]
    Arguments {
        /// Directive name.
        name: String,
        /// Line of the invocation (1-indexed).
        line: usize,
        #[source]
        source: ArgsError,
    },

    /// A directive handler failed.
    #[error("directive `{name}` on line {line} failed: {source}")]
    Directive {
        /// Directive name.
        name: String,
        /// Line of the invocation (1-indexed).
        line: usize,
        #[source]
        source: DirectiveError,
    },

    /// The source document could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
