use color_eyre::eyre::{Result, eyre};
use std::ffi::OsString;
use std::path::Path;
use tempfile::TempDir;

/// Converts a `Path` to an `OsString` for use in command-line arguments.
pub fn path_to_os_string(p: &Path) -> OsString {
    p.as_os_str().to_owned()
}

/// Creates a hidden temporary directory next to `output`, so a finished file can be
/// renamed into place without crossing file systems.
pub fn temp_dir_beside(output: &Path) -> Result<TempDir> {
    let parent = match output.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(eyre!("{} has no parent directory", output.display())),
    };
    Ok(tempfile::Builder::new()
        .prefix(".media_prep-")
        .tempdir_in(parent)?)
}
