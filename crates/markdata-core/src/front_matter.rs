//! Front matter extraction.
//!
//! A document may open with a metadata block:
//!
//! - YAML between `---` lines
//! - TOML between `+++` lines
//! - JSON as an object whose `{` and `}` sit on their own lines
//!
//! The block must start on the first line. Its contents become the
//! document's [`Metadata`], passed read-only to every directive handler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Metadata;

/// Declared front matter format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontMatterFormat {
    Yaml,
    Toml,
    Json,
}

impl FrontMatterFormat {
    /// Opening and closing delimiter lines.
    fn fences(self) -> (&'static str, &'static str) {
        match self {
            Self::Yaml => ("---", "---"),
            Self::Toml => ("+++", "+++"),
            Self::Json => ("{", "}"),
        }
    }
}

impl fmt::Display for FrontMatterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => f.write_str("YAML"),
            Self::Toml => f.write_str("TOML"),
            Self::Json => f.write_str("JSON"),
        }
    }
}

impl FromStr for FrontMatterFormat {
    type Err = FrontMatterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(FrontMatterError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Error type for front matter extraction.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// The opening delimiter has no matching closing line.
    #[error("unclosed {0} front matter block")]
    Unclosed(FrontMatterFormat),

    /// The YAML block does not parse.
    #[error("invalid YAML front matter: {0}")]
    Yaml(#[source] serde_yaml::Error),

    /// The TOML block does not parse.
    #[error("invalid TOML front matter: {0}")]
    Toml(#[source] toml::de::Error),

    /// The JSON block does not parse.
    #[error("invalid JSON front matter: {0}")]
    Json(#[source] serde_json::Error),

    /// The block parsed, but not to a mapping.
    #[error("{0} front matter must be a mapping")]
    NotMapping(FrontMatterFormat),

    /// Unrecognized format name.
    #[error("unknown front matter format `{0}` (expected yaml, toml or json)")]
    UnknownFormat(String),
}

/// A document split into its front matter and body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrontMatter<'a> {
    /// The block exactly as written, delimiters and trailing newline
    /// included. Empty when the document has no block.
    pub raw: &'a str,
    /// Everything after the block.
    pub body: &'a str,
    /// Parsed contents of the block.
    pub metadata: Metadata,
}

/// Split a leading metadata block off `text`.
///
/// With no declared format, or when the document does not open with the
/// format's delimiter, the metadata is empty and the body is the whole text.
///
/// # Errors
///
/// Returns [`FrontMatterError`] if a block is opened but never closed, does
/// not parse, or is not a mapping.
///
/// # Example
///
/// ```
/// use markdata_core::front_matter::{FrontMatterFormat, extract};
///
/// let doc = extract("---\ntitle: Guide\n---\n# Guide\n", Some(FrontMatterFormat::Yaml)).unwrap();
/// assert_eq!(doc.metadata["title"], "Guide");
/// assert_eq!(doc.raw, "---\ntitle: Guide\n---\n");
/// assert_eq!(doc.body, "# Guide\n");
/// ```
pub fn extract(
    text: &str,
    format: Option<FrontMatterFormat>,
) -> Result<FrontMatter<'_>, FrontMatterError> {
    let unsplit = FrontMatter {
        raw: "",
        body: text,
        metadata: Metadata::new(),
    };
    let Some(format) = format else {
        return Ok(unsplit);
    };
    let (open, close) = format.fences();

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(unsplit);
    };
    if first.trim_end() != open {
        return Ok(unsplit);
    }

    let mut offset = first.len();
    for line in lines {
        let end = offset + line.len();
        if line.trim_end() == close {
            let source = match format {
                FrontMatterFormat::Json => &text[..end],
                _ => &text[first.len()..offset],
            };
            return Ok(FrontMatter {
                raw: &text[..end],
                body: &text[end..],
                metadata: parse(source, format)?,
            });
        }
        offset = end;
    }

    Err(FrontMatterError::Unclosed(format))
}

/// Parse the contents of a block into a mapping.
fn parse(source: &str, format: FrontMatterFormat) -> Result<Metadata, FrontMatterError> {
    let value: Value = match format {
        FrontMatterFormat::Yaml => {
            if source.trim().is_empty() {
                return Ok(Metadata::new());
            }
            serde_yaml::from_str(source).map_err(FrontMatterError::Yaml)?
        }
        FrontMatterFormat::Toml => {
            let table: toml::Table = toml::from_str(source).map_err(FrontMatterError::Toml)?;
            return Ok(toml_table(table));
        }
        FrontMatterFormat::Json => serde_json::from_str(source).map_err(FrontMatterError::Json)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        _ => Err(FrontMatterError::NotMapping(format)),
    }
}

fn toml_table(table: toml::Table) -> Metadata {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_value(value)))
        .collect()
}

/// Datetimes become their RFC 3339 text; non-finite floats become null.
fn toml_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_value).collect()),
        toml::Value::Table(table) => Value::Object(toml_table(table)),
    }
}
