use chrono::{DateTime, Local, NaiveDate, Utc};
use std::time::SystemTime;

pub fn format_file_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Calendar date used in export filenames, `YYYY-MM-DD`.
pub fn export_date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Export filenames carry the UTC calendar date, whatever the local zone.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
