//! Directive processing context.
//!
//! Provides document metadata, the resolution base and file access to
//! directive handlers.

use std::io;
use std::path::{Path, PathBuf};

use crate::Metadata;

use super::DirectiveError;

/// Context provided to a directive handler for one invocation.
///
/// Relative paths in directive arguments are resolved against
/// [`base_dir`](Self::base_dir), never against the process working directory.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use markdata_core::Metadata;
/// use markdata_core::directive::DirectiveContext;
///
/// let metadata = Metadata::new();
/// let ctx = DirectiveContext {
///     name: "document",
///     metadata: &metadata,
///     source_path: Some(Path::new("docs/guide.md")),
///     base_dir: Path::new("docs"),
///     line: 42,
///     read_file: &|path| std::fs::read_to_string(path),
/// };
///
/// let resolved = ctx.resolve_path("snippets/example.py");
/// assert_eq!(resolved, Path::new("docs/snippets/example.py"));
/// ```
pub struct DirectiveContext<'a> {
    /// Name the directive was invoked under.
    pub name: &'a str,
    /// Front matter of the document being resolved.
    pub metadata: &'a Metadata,
    /// Path to the document (if it came from a file).
    pub source_path: Option<&'a Path>,
    /// Base directory for resolving relative paths.
    pub base_dir: &'a Path,
    /// Line number where the directive appears (1-indexed).
    pub line: usize,
    /// Callback to read a text file.
    pub read_file: &'a dyn Fn(&Path) -> io::Result<String>,
}

impl DirectiveContext<'_> {
    /// Resolve a path against the base directory.
    ///
    /// Absolute paths are returned unchanged.
    #[must_use]
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Read a text file relative to the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::Io`] carrying the resolved path.
    pub fn read_to_string(&self, path: impl AsRef<Path>) -> Result<String, DirectiveError> {
        let path = self.resolve_path(path);
        (self.read_file)(&path).map_err(|source| DirectiveError::Io { path, source })
    }

    /// Read a binary file relative to the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::Io`] carrying the resolved path.
    pub fn read_bytes(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, DirectiveError> {
        let path = self.resolve_path(path);
        std::fs::read(&path).map_err(|source| DirectiveError::Io { path, source })
    }
}
