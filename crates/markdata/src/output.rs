//! Status messages on stderr.
//!
//! Stdout is reserved for resolved documents.

use std::fmt::Display;
use std::path::Path;

use console::{Style, Term};

use crate::batch::Report;

/// Terminal reporter for single-document and directory runs.
pub(crate) struct Output {
    term: Term,
    path: Style,
    green: Style,
    yellow: Style,
    red: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            path: Style::new().bold(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
        }
    }

    /// Print the error that stopped the run.
    pub(crate) fn fatal(&self, err: &impl Display) {
        self.line(&format!("{} {err}", self.red.apply_to("error:")));
    }

    /// Print one document or file that failed in a directory run.
    pub(crate) fn failure(&self, path: &Path, err: &impl Display) {
        self.line(&format!(
            "{} {}: {}",
            self.red.apply_to("failed"),
            self.path.apply_to(path.display()),
            err
        ));
    }

    /// Print the outcome of a directory run.
    ///
    /// Failures are listed first, then one summary line colored by outcome.
    pub(crate) fn report(&self, report: &Report, source: &Path, patterns: &[String]) {
        for (path, err) in &report.failures {
            self.failure(path, err);
        }

        let summary = summarize(report);
        if !report.failures.is_empty() {
            self.line(&self.red.apply_to(summary).to_string());
        } else if report.total() == 0 {
            let msg = format!(
                "No documents matching {} under {}",
                patterns.join(", "),
                source.display()
            );
            self.line(&self.yellow.apply_to(msg).to_string());
        } else {
            self.line(&self.green.apply_to(summary).to_string());
        }
    }

    fn line(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }
}

/// One-line summary of a directory run.
fn summarize(report: &Report) -> String {
    let mut summary = format!("Resolved {}", count(report.resolved, "document"));
    if report.copied > 0 {
        summary.push_str(&format!(", copied {}", count(report.copied, "other file")));
    }
    if !report.failures.is_empty() {
        summary.push_str(&format!(", {} failed", report.failures.len()));
    }
    summary
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
