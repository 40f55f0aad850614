//! `image` directive.

use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

use crate::directive::{DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective};
use crate::html::escape_html;

/// Embeds an image file as a base64 data URI.
///
/// ```text
/// `image{'path': 'diagram.png', 'alt': 'Architecture', 'classes': ['wide']}`
/// ```
pub struct ImageDirective;

impl InlineDirective for ImageDirective {
    fn process(
        &self,
        mut args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let path = args.require_str("path")?;
        let alt = args.take_str("alt")?.unwrap_or_default();
        let classes = args.take_str_list("classes")?;
        args.finish()?;

        let mime = mime_type(Path::new(&path)).ok_or_else(|| {
            DirectiveError::invalid("path", "must be a .png, .jpg, .jpeg, .gif, .svg or .webp file")
        })?;
        let data = ctx.read_bytes(&path)?;

        let mut html = format!(
            "<img src=\"data:{mime};base64,{}\" alt=\"{}\"",
            BASE64_STANDARD.encode(&data),
            escape_html(&alt)
        );
        if !classes.is_empty() {
            html.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
        }
        html.push('>');
        Ok(html)
    }
}

fn mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
