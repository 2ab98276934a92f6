//! File utility functions for listing and filtering files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File names written by operating systems and file managers that never hold user data.
pub const HOUSEKEEPING_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Returns true for platform housekeeping entries, including AppleDouble `._*` files.
pub fn is_housekeeping_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };
    HOUSEKEEPING_FILES.contains(&name) || name.starts_with("._")
}

/// Returns paths to all regular files in a directory, skipping housekeeping files.
/// The result is sorted so repeated listings of the same directory agree.
pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && !is_housekeeping_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Returns the final path component as a string, if it is valid UTF-8.
pub fn base_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}
