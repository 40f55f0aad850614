//! Directory mode: resolve every matching document under a source tree.
//!
//! Documents are resolved in parallel on the rayon pool, then written. A
//! failed document is reported and left unwritten; the others still complete.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use markdata_core::{Session, Source};
use rayon::prelude::*;

use crate::error::CliError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Outcome of a directory run.
#[derive(Debug, Default)]
pub(crate) struct Report {
    /// Documents resolved and written.
    pub resolved: usize,
    /// Non-document files copied into the destination tree.
    pub copied: usize,
    /// Files that failed, relative to the source directory.
    pub failures: Vec<(PathBuf, CliError)>,
}

impl Report {
    pub(crate) fn total(&self) -> usize {
        self.resolved + self.failures.len()
    }
}

/// Resolves a source tree in place or into a mirrored destination.
pub(crate) struct Batch<'a> {
    session: &'a Session,
    patterns: Vec<Pattern>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(session: &'a Session, patterns: &[String]) -> Result<Self, CliError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p)
                    .map_err(|e| CliError::Validation(format!("invalid pattern {p:?}: {e}")))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { session, patterns })
    }

    /// Whether `relative` is a document to resolve.
    fn is_document(&self, relative: &Path) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Resolve every document under `source`.
    ///
    /// Without `destination` documents are rewritten in place. With it the
    /// tree is mirrored there: documents are written resolved and other files
    /// are copied unchanged.
    pub(crate) fn run(&self, source: &Path, destination: Option<&Path>) -> Result<Report, CliError> {
        let exclude = destination.and_then(|d| fs::canonicalize(d).ok());
        let files = collect_files(source, exclude.as_deref())?;
        let (documents, others): (Vec<_>, Vec<_>) =
            files.into_iter().partition(|rel| self.is_document(rel));

        let target = |rel: &Path| destination.unwrap_or(source).join(rel);

        // Every document is read before any is written, so includes of
        // other documents see their unresolved text.
        let resolved: Vec<_> = documents
            .par_iter()
            .map(|rel| (rel, self.session.resolve(Source::File(&source.join(rel)))))
            .collect();

        let mut report = Report::default();
        for (rel, result) in resolved {
            match result.map_err(CliError::from).and_then(|text| write_file(&target(rel), &text)) {
                Ok(()) => report.resolved += 1,
                Err(err) => report.failures.push((rel.clone(), err)),
            }
        }

        if destination.is_some() {
            for rel in others {
                match copy_file(&source.join(&rel), &target(&rel)) {
                    Ok(()) => report.copied += 1,
                    Err(err) => report.failures.push((rel, err)),
                }
            }
        }

        Ok(report)
    }
}

/// Write `contents` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_file(from: &Path, to: &Path) -> Result<(), CliError> {
    tracing::debug!(from = %from.display(), to = %to.display(), "Copying file");
    let copy = || -> io::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to).map(|_| ())
    };
    copy().map_err(|source| CliError::Write {
        path: to.to_path_buf(),
        source,
    })
}

/// Files under `root`, relative to it and sorted.
///
/// Hidden entries are skipped, as is the `exclude` directory.
fn collect_files(root: &Path, exclude: Option<&Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(root.join(&dir))? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let relative = dir.join(entry.file_name());
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if exclude.is_some_and(|ex| fs::canonicalize(entry.path()).is_ok_and(|p| p == ex)) {
                    continue;
                }
                pending.push(relative);
            } else if file_type.is_file() {
                files.push(relative);
            }
        }
    }

    files.sort();
    Ok(files)
}
