use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A file found in the download directory.
#[derive(Clone, Debug)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// List files with the given extension, newest first. Unreadable entries are skipped.
pub fn list_files_with_extension(dir: impl AsRef<Path>, extension: &str) -> Vec<FileEntry> {
    let mut entries = Vec::new();

    if let Ok(read_dir) = fs::read_dir(dir.as_ref()) {
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };

            let Some(name) = path
                .file_name()
                .and_then(|segment| segment.to_str())
                .map(|s| s.to_string())
            else {
                continue;
            };

            entries.push(FileEntry {
                name,
                path,
                modified: metadata.modified().unwrap_or(UNIX_EPOCH),
                size: metadata.len(),
            });
        }
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    entries
}

pub fn list_csv_files(dir: impl AsRef<Path>) -> Vec<FileEntry> {
    list_files_with_extension(dir, "csv")
}
