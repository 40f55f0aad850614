//! HTML formatting helpers.

use std::fmt::Write;

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Render a table with one header row.
///
/// Every cell, the caption and the class names are escaped. An empty
/// `classes` list omits the `class` attribute and an empty caption omits
/// the `<caption>` element.
///
/// # Example
///
/// ```
/// use markdata_core::html::to_html_table;
///
/// let html = to_html_table(
///     &["a".to_owned(), "b".to_owned()],
///     &[vec!["1".to_owned(), "2".to_owned()]],
///     "",
///     &["t".to_owned()],
/// );
/// assert_eq!(
///     html,
///     "<table class=\"t\">\n<thead>\n<tr><th>a</th><th>b</th></tr>\n</thead>\n\
///      <tbody>\n<tr><td>1</td><td>2</td></tr>\n</tbody>\n</table>"
/// );
/// ```
#[must_use]
pub fn to_html_table(
    headers: &[String],
    rows: &[Vec<String>],
    caption: &str,
    classes: &[String],
) -> String {
    let mut html = String::from("<table");
    if !classes.is_empty() {
        let _ = write!(html, " class=\"{}\"", escape_html(&classes.join(" ")));
    }
    html.push_str(">\n");

    if !caption.is_empty() {
        let _ = writeln!(html, "<caption>{}</caption>", escape_html(caption));
    }

    html.push_str("<thead>\n");
    push_row(&mut html, "th", headers);
    html.push_str("</thead>\n<tbody>\n");
    for row in rows {
        push_row(&mut html, "td", row);
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn push_row(html: &mut String, tag: &str, cells: &[String]) {
    html.push_str("<tr>");
    for cell in cells {
        let _ = write!(html, "<{tag}>{}</{tag}>", escape_html(cell));
    }
    html.push_str("</tr>\n");
}
