//! Command-backed directives.
//!
//! An external program acts as a directive handler. It receives a JSON
//! payload on stdin:
//!
//! ```json
//! {"directive": "name", "metadata": {...}, "arguments": {...}, "content": "..." | null}
//! ```
//!
//! and whatever it writes to stdout (minus one trailing newline) replaces
//! the invocation. The program runs in the resolution base directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::directive::{
    BlockDirective, DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective,
};

/// Directive handler backed by an external program.
///
/// Accepts both invocation forms; `content` is `null` for inline calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandDirective {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDirective {
    /// Create a handler that runs `program` with no extra arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Set arguments passed to the program before it reads the payload.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Collect the executables in `dir` as directives named by file stem.
    ///
    /// Hidden files and subdirectories are skipped. Results are sorted by
    /// name.
    pub fn discover(dir: &Path) -> io::Result<Vec<(String, Self)>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') || !entry.file_type()?.is_file() {
                continue;
            }
            if !is_executable(&entry.metadata()?) {
                tracing::warn!(path = %path.display(), "Skipping non-executable file in directives directory");
                continue;
            }
            found.push((name.to_owned(), Self::new(&path)));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    fn run(
        &self,
        content: Option<&str>,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let command = self.program.display().to_string();
        let spawn_error = |source: io::Error| DirectiveError::Spawn {
            command: command.clone(),
            source,
        };

        let payload = serde_json::json!({
            "directive": ctx.name,
            "metadata": ctx.metadata,
            "arguments": args.into_map(),
            "content": content,
        });
        let payload = serde_json::to_vec(&payload).map_err(|e| spawn_error(e.into()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(ctx.base_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        // Stdin is written while output is collected.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            if let Some(mut stdin) = stdin {
                scope.spawn(move || {
                    if let Err(e) = stdin.write_all(&payload)
                        && e.kind() != io::ErrorKind::BrokenPipe
                    {
                        tracing::warn!(error = %e, "Failed to write directive payload");
                    }
                });
            }
            child.wait_with_output()
        })
        .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(DirectiveError::Command {
                command,
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.strip_suffix('\n').unwrap_or(&stdout);
        Ok(trimmed.strip_suffix('\r').unwrap_or(trimmed).to_owned())
    }
}

impl InlineDirective for CommandDirective {
    fn process(
        &self,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        self.run(None, args, ctx)
    }
}

impl BlockDirective for CommandDirective {
    fn process(
        &self,
        content: &str,
        args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        self.run(Some(content), args, ctx)
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}
