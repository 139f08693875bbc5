//! Artifact handles — short-lived composited images on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Handle to one composited reply image.
///
/// The file never outlives the processing pass that created it: the poll
/// loop discards the handle right after publishing, and dropping it removes
/// the file on every failure path as well.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
}

impl Artifact {
    pub fn new(path: PathBuf) -> Self {
        Artifact { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file now, consuming the handle.
    pub fn discard(self) {
        // Drop does the actual removal.
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(artifact = %self.path.display(), "Failed to remove artifact: {e}");
            }
        }
    }
}

/// Removes leftover artifacts (e.g. from an unclean shutdown of a previous
/// run) from the content directory. Returns how many files were removed.
pub fn clear_content_dir(dir: &Path) -> std::io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("png") {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
