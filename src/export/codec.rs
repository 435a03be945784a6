use std::borrow::Cow;

use serde_json::Value;

use crate::error::{Context, Result};

/// A single exported value. The server sends JSON scalars (strings, numbers,
/// booleans, null); anything else is rendered as compact JSON.
pub type Cell = Value;
pub type Row = Vec<Cell>;

const NEEDS_QUOTING: &[char] = &['"', ',', '\n'];

pub fn cell_to_string(cell: &Cell) -> Cow<'_, str> {
    match cell {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Quote a field when it contains a quote, comma or newline; inner quotes are doubled.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(NEEDS_QUOTING) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Encode rows as CSV text: fields joined by `,`, records by `\n`, no trailing newline.
pub fn encode(rows: &[Row]) -> String {
    encode_records(rows.iter().map(Vec::as_slice))
}

/// Same as [`encode`] but accepts any sequence of borrowed records, so a header
/// row can be chained in front of a dataset without cloning it.
pub fn encode_records<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a [Cell]>,
{
    let mut out = String::new();
    for (index, record) in records.into_iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        for (column, cell) in record.iter().enumerate() {
            if column > 0 {
                out.push(',');
            }
            out.push_str(&escape_field(&cell_to_string(cell)));
        }
    }
    out
}

/// Read exported CSV text back into plain string records.
pub fn decode(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}
