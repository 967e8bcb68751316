use std::path::Path;

/// Lowercased extension of a file, if it has one.
#[must_use]
pub fn lowercase_extension(file: &Path) -> Option<String> {
    file.extension().map(|e| e.to_string_lossy().to_lowercase())
}
