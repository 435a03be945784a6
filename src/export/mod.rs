use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Context, Result};
use crate::utils::export_date_stamp;

pub mod codec;
pub mod delivery;

pub use codec::{decode, encode, encode_records, Cell, Row};
pub use delivery::{save, DownloadDir, FileSink, CSV_MIME};

pub const PLAYLISTS_PREFIX: &str = "playlists_";
pub const TRACKS_PREFIX: &str = "tracks_";

/// Datasets carried by the final frame of an export stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExportPayload {
    pub playlists: Vec<Row>,
    #[serde(default)]
    pub playlists_headers: Row,
    pub tracks: Vec<Row>,
}

/// One encoded file ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

pub fn export_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}{}.csv", prefix, export_date_stamp(date))
}

/// Encode both datasets. The playlists file is led by its header row when the
/// server sent one; the tracks dataset already carries its own header.
pub fn build_export_files(payload: &ExportPayload, date: NaiveDate) -> [ExportFile; 2] {
    let header = (!payload.playlists_headers.is_empty())
        .then_some(payload.playlists_headers.as_slice());
    let playlists = encode_records(
        header
            .into_iter()
            .chain(payload.playlists.iter().map(Vec::as_slice)),
    );
    let tracks = encode(&payload.tracks);

    [
        ExportFile {
            filename: export_filename(PLAYLISTS_PREFIX, date),
            content: playlists,
        },
        ExportFile {
            filename: export_filename(TRACKS_PREFIX, date),
            content: tracks,
        },
    ]
}

/// Encode and hand both files to the sink, returning the filenames in delivery order.
pub fn deliver_export(sink: &dyn FileSink, payload: &ExportPayload, date: NaiveDate) -> Vec<String> {
    build_export_files(payload, date)
        .into_iter()
        .map(|file| {
            save(sink, &file.content, &file.filename, CSV_MIME);
            file.filename
        })
        .collect()
}

/// Shape of a delivered CSV file, as reported by the `inspect` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSummary {
    pub records: usize,
    pub max_columns: usize,
    pub first_record: Vec<String>,
}

pub fn summarize_csv_file(path: &Path) -> Result<CsvSummary> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = decode(&text)?;

    Ok(CsvSummary {
        records: records.len(),
        max_columns: records.iter().map(Vec::len).max().unwrap_or(0),
        first_record: records.into_iter().next().unwrap_or_default(),
    })
}
