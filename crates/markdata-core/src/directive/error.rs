//! Errors raised by directive handlers.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Invocation form of a directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationKind {
    /// `` `name{...}` ``
    Inline,
    /// ```` ``name{...}\ncontent\n``` ````
    Block,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => f.write_str("inline"),
            Self::Block => f.write_str("block"),
        }
    }
}

/// Failure reported by a directive handler.
///
/// The resolution engine wraps these in
/// [`ResolveError::Directive`](crate::ResolveError::Directive) together with
/// the directive name and line.
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    /// A required keyword argument was not supplied.
    #[error("missing required argument `{0}`")]
    MissingArgument(String),

    /// A keyword argument the handler does not accept.
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    /// A keyword argument has the wrong shape.
    #[error("argument `{name}` {message}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// What was wrong with it (e.g., "must be a string").
        message: String,
    },

    /// The handler was invoked in a form it does not support.
    #[error("{0} invocation is not supported by this directive")]
    UnsupportedForm(InvocationKind),

    /// Reading a referenced file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Resolved path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A referenced data file could not be parsed.
    #[error("failed to parse {}: {source}", path.display())]
    Data {
        /// Resolved path of the file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An external command could not be started or waited on.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Command line or program path.
        command: String,
        #[source]
        source: io::Error,
    },

    /// An external command exited unsuccessfully.
    #[error("command `{command}` failed: {message}")]
    Command {
        /// Command line or program path.
        command: String,
        /// Exit status and captured stderr.
        message: String,
    },

    /// Any other handler failure.
    #[error("{0}")]
    Other(String),
}

impl DirectiveError {
    /// Create an [`InvalidArgument`](Self::InvalidArgument) error.
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an [`Other`](Self::Other) error from a message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
