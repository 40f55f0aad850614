//! Directive scanner.
//!
//! Recognizes inline (`` `name{...}` ``) and block
//! (```` ``name{...}\ncontent\n``` ````) invocations in a single left-to-right
//! pass. Matches never overlap, and block content is not re-scanned.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::InvocationKind;

/// Block alternative first so that a block head is never read as an inline
/// invocation. Arguments and content match non-greedily.
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)``(?P<block_name>\w+)(?P<block_args>\{.*?\})\r?\n(?P<content>.*?)\r?\n```|`(?P<name>\w+)(?P<args>\{.*?\})`",
    )
    .unwrap()
});

/// One directive invocation found in a document body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveMatch<'a> {
    /// Directive name.
    pub name: &'a str,
    /// Argument literal, braces included.
    pub arguments: &'a str,
    /// Block content, `None` for inline invocations.
    pub content: Option<&'a str>,
    /// Byte range of the whole invocation in the scanned text.
    pub range: Range<usize>,
    /// Line of the opening backtick (1-indexed).
    pub line: usize,
}

impl DirectiveMatch<'_> {
    #[must_use]
    pub fn kind(&self) -> InvocationKind {
        if self.content.is_some() {
            InvocationKind::Block
        } else {
            InvocationKind::Inline
        }
    }
}

/// Find every directive invocation in `text`, in order of appearance.
///
/// Names are not checked against any registry; callers decide which
/// matches to act on.
///
/// # Example
///
/// ```
/// use markdata_core::directive::scan;
///
/// let matches = scan("See `table{'path': 'a.csv'}` and\n`document{'path': 'b.txt'}`.");
/// assert_eq!(matches.len(), 2);
/// assert_eq!(matches[0].name, "table");
/// assert_eq!(matches[1].line, 2);
/// ```
#[must_use]
pub fn scan(text: &str) -> Vec<DirectiveMatch<'_>> {
    let mut line = 1;
    let mut counted = 0;

    DIRECTIVE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            line += text[counted..whole.start()].matches('\n').count();
            counted = whole.start();

            let (name, arguments, content) = match caps.name("block_name") {
                Some(name) => (
                    name,
                    caps.name("block_args")?,
                    caps.name("content").map(|c| c.as_str()),
                ),
                None => (caps.name("name")?, caps.name("args")?, None),
            };

            Some(DirectiveMatch {
                name: name.as_str(),
                arguments: arguments.as_str(),
                content,
                range: whole.range(),
                line,
            })
        })
        .collect()
}
