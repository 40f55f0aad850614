//! `document` directive and line-span helpers shared with `code`.

use serde_json::Value;

use crate::directive::{DirectiveArgs, DirectiveContext, DirectiveError, InlineDirective};

/// Includes a file, or an inclusive 1-based line range of it.
///
/// ```text
/// `document{'path': 'src/main.py', 'span': [10, 13]}`
/// ```
///
/// Common leading indentation is removed, so a snippet cut from the middle
/// of a function lines up at column zero.
pub struct DocumentDirective;

impl InlineDirective for DocumentDirective {
    fn process(
        &self,
        mut args: DirectiveArgs,
        ctx: &DirectiveContext,
    ) -> Result<String, DirectiveError> {
        let path = args.require_str("path")?;
        let span = take_span(&mut args)?;
        args.finish()?;

        let text = ctx.read_to_string(&path)?;
        Ok(dedent(&select_lines(&text, span)))
    }
}

/// Take the optional `span` argument: `[begin, end]`, 1-based and inclusive.
/// An absent or empty span selects the whole file.
pub(crate) fn take_span(
    args: &mut DirectiveArgs,
) -> Result<Option<(usize, usize)>, DirectiveError> {
    let invalid = || DirectiveError::invalid("span", "must be a [begin, end] pair of line numbers");

    let items = match args.take("span") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid()),
    };

    match items.as_slice() {
        [] => Ok(None),
        [begin, end] => {
            let line_number = |v: &Value| v.as_u64().and_then(|n| usize::try_from(n).ok());
            let (Some(begin), Some(end)) = (line_number(begin), line_number(end)) else {
                return Err(invalid());
            };
            if begin == 0 {
                return Err(DirectiveError::invalid("span", "line numbers start at 1"));
            }
            Ok(Some((begin, end)))
        }
        _ => Err(invalid()),
    }
}

/// Slice `text` to the given lines, joined with `\n`.
///
/// `end` past the last line is clamped; `end < begin` selects nothing.
pub(crate) fn select_lines(text: &str, span: Option<(usize, usize)>) -> String {
    let Some((begin, end)) = span else {
        return text.to_owned();
    };
    if end < begin {
        return String::new();
    }
    text.lines()
        .skip(begin.saturating_sub(1))
        .take((end - begin).saturating_add(1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove indentation common to every non-blank line.
///
/// Lines holding only spaces and tabs are emptied and do not count towards
/// the margin. Line endings are kept as they are.
pub(crate) fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        let content = line.trim_start_matches([' ', '\t']);
        if content.trim_end().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - content.len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or_default();

    let mut result = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let body = line.trim_end_matches(['\r', '\n']);
        let ending = &line[body.len()..];
        if !body.trim_matches([' ', '\t']).is_empty() {
            result.push_str(body.strip_prefix(margin).unwrap_or(body));
        }
        result.push_str(ending);
    }
    result
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
