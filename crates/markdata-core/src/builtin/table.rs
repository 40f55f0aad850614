//! `table` directive.

use crate::directive::{DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective};
use crate::html::to_html_table;

use super::data::load_records;

/// Renders a CSV, JSON or YAML file as an HTML table.
///
/// ```text
/// `table{'path': 'fruit.csv', 'classes': ['table'], 'caption': 'Fruit'}`
/// ```
///
/// Arguments:
/// - `path` (required): data file, relative to the document
/// - `classes`: class names for the `<table>` element
/// - `caption`: table caption
pub struct TableDirective;

impl InlineDirective for TableDirective {
    fn process(
        &self,
        mut args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let path = args.require_str("path")?;
        let classes = args.take_str_list("classes")?;
        let caption = args.take_str("caption")?.unwrap_or_default();
        args.finish()?;

        let text = ctx.read_to_string(&path)?;
        let records = load_records(&ctx.resolve_path(&path), &text)?;
        Ok(to_html_table(
            &records.headers,
            &records.rows,
            &caption,
            &classes,
        ))
    }
}
