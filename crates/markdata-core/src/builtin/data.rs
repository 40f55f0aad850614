//! Structured data loading for the `table` directive.
//!
//! CSV, JSON and YAML files are read as a list of records. The first
//! record's keys become the header row.

use std::error::Error;
use std::path::Path;

use serde_json::Value;

use crate::directive::DirectiveError;

/// A header row and the data rows aligned to it.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Records {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Data file formats, chosen by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DataFormat {
    Csv,
    Json,
    Yaml,
}

impl DataFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Parse `text`, read from `path`, into records.
pub(crate) fn load_records(path: &Path, text: &str) -> Result<Records, DirectiveError> {
    let data_error = |source: Box<dyn Error + Send + Sync>| DirectiveError::Data {
        path: path.to_path_buf(),
        source,
    };

    let format = DataFormat::from_path(path)
        .ok_or_else(|| DirectiveError::invalid("path", "must be a .csv, .json, .yml or .yaml file"))?;

    let records = match format {
        DataFormat::Csv => read_csv(text).map_err(|e| data_error(e.into()))?,
        DataFormat::Json => {
            let value: Value = serde_json::from_str(text).map_err(|e| data_error(e.into()))?;
            from_value(value).map_err(|e| data_error(e.into()))?
        }
        DataFormat::Yaml => {
            let value: Value = serde_yaml::from_str(text).map_err(|e| data_error(e.into()))?;
            from_value(value).map_err(|e| data_error(e.into()))?
        }
    };

    if records.rows.is_empty() {
        return Err(data_error("no records".into()));
    }
    Ok(records)
}

/// Read CSV with a header row. Short rows are padded with empty cells and
/// cells past the header width are dropped.
fn read_csv(text: &str) -> Result<Records, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let width = headers.len();
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|record| {
            record.map(|r| {
                let mut row: Vec<String> = r.iter().take(width).map(str::to_owned).collect();
                row.resize(width, String::new());
                row
            })
        })
        .collect::<Result<_, _>>()?;
    Ok(Records { headers, rows })
}

/// Convert a list of mappings into records keyed by the first mapping.
fn from_value(value: Value) -> Result<Records, String> {
    let Value::Array(items) = value else {
        return Err("expected a list of records".to_owned());
    };

    let mut records = Records::default();
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(mut record) = item else {
            return Err(format!("record {} is not a mapping", index + 1));
        };
        if index == 0 {
            records.headers = record.keys().cloned().collect();
        }
        let row = records
            .headers
            .iter()
            .map(|key| record.remove(key).map(cell_text).unwrap_or_default())
            .collect();
        records.rows.push(row);
    }
    Ok(records)
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
