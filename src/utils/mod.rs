pub mod file;
pub mod text;
pub mod time;

pub use file::{list_csv_files, FileEntry};
pub use text::sanitize_file_name;
pub use time::{export_date_stamp, format_file_modified, today};
