//! Built-in directives.
//!
//! | Name       | Output                                         |
//! |------------|------------------------------------------------|
//! | `table`    | HTML table from a CSV, JSON or YAML file       |
//! | `document` | File contents, optionally a line range         |
//! | `code`     | Like `document`, wrapped in a fenced code block |
//! | `output`   | Standard output of a shell command             |
//! | `image`    | `<img>` with the file inlined as a data URI    |
//!
//! [`CommandDirective`] is not registered by default; it wraps external
//! programs supplied by the caller.

mod code;
mod command;
mod data;
mod document;
mod image;
mod output;
mod table;

pub use code::CodeDirective;
pub use command::CommandDirective;
pub use document::DocumentDirective;
pub use image::ImageDirective;
pub use output::OutputDirective;
pub use table::TableDirective;

use crate::directive::{DirectiveRegistry, Handler};

/// Register every built-in directive under its default name.
pub(crate) fn register_all(registry: &mut DirectiveRegistry) {
    registry.register("table", Handler::inline(TableDirective));
    registry.register("document", Handler::inline(DocumentDirective));
    registry.register("code", Handler::inline(CodeDirective));
    registry.register("output", Handler::inline(OutputDirective));
    registry.register("image", Handler::inline(ImageDirective));
}
