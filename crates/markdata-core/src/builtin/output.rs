//! `output` directive.

use std::path::Path;
use std::process::{Command, Output};

use crate::directive::{DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective};

/// Runs a shell command and inserts its standard output.
///
/// ```text
/// `output{'cmd': 'git describe --tags'}`
/// ```
///
/// The command runs in the resolution base directory. Surrounding
/// whitespace is trimmed unless `strip` is `False`.
pub struct OutputDirective;

impl InlineDirective for OutputDirective {
    fn process(
        &self,
        mut args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let cmd = args.require_str("cmd")?;
        let strip = args.take_bool("strip")?.unwrap_or(true);
        args.finish()?;

        let output = run_shell(&cmd, ctx.base_dir).map_err(|source| DirectiveError::Spawn {
            command: cmd.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(DirectiveError::Command {
                command: cmd,
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(if strip {
            stdout.trim().to_owned()
        } else {
            stdout.into_owned()
        })
    }
}

fn run_shell(cmd: &str, cwd: &Path) -> std::io::Result<Output> {
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd").args(["/C", cmd]).current_dir(cwd).output()
    }
    #[cfg(not(target_os = "windows"))]
    {
        Command::new("sh").args(["-c", cmd]).current_dir(cwd).output()
    }
}
