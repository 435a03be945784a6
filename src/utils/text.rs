use std::path::{Component, Path};

/// Reduce a requested download name to its final path component.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    match Path::new(trimmed).components().next_back()? {
        Component::Normal(segment) => {
            let segment = segment.to_str()?;
            if segment.is_empty() {
                None
            } else {
                Some(segment.to_string())
            }
        }
        _ => None,
    }
}
