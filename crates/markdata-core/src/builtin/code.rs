//! `code` directive.

use std::path::Path;

use crate::directive::{DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective};

use super::document::{dedent, select_lines, take_span};

/// Includes a file, or a line range of it, as a fenced code block.
///
/// ```text
/// `code{'path': 'src/lib.rs', 'span': [1, 20], 'lang': 'rust'}`
/// ```
///
/// `lang` defaults to the file extension.
pub struct CodeDirective;

impl InlineDirective for CodeDirective {
    fn process(
        &self,
        mut args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let path = args.require_str("path")?;
        let span = take_span(&mut args)?;
        let lang = match args.take_str("lang")? {
            Some(lang) => lang,
            None => Path::new(&path)
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        args.finish()?;

        let text = ctx.read_to_string(&path)?;
        let snippet = dedent(&select_lines(&text, span));
        Ok(format!("```{lang}\n{}\n```", snippet.trim_end_matches('\n')))
    }
}
