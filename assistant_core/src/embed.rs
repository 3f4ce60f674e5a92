//! Local file lookup for the `>` directive.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result};

/// A file matched under the search root, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    /// Path relative to the search root.
    pub path: PathBuf,
    pub contents: String,
}

impl EmbeddedFile {
    /// Final path component, used when listing matches back to the user.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Answer recorded alongside the file contents.
    #[must_use]
    pub fn marker(&self) -> String {
        format!("File Contents of {}", self.path.display())
    }
}

/// Read every regular file under `root` whose relative path contains `token`.
///
/// Results are in lexical walk order. Nothing outside `root` is visited and
/// symlinks are not followed. Any walk or read failure aborts the whole
/// lookup so callers never act on a partial set.
pub fn collect_matching_files(root: &Path, token: &str) -> Result<Vec<EmbeddedFile>> {
    let mut matches = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| Error::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path());
        if !relative.to_string_lossy().contains(token) {
            continue;
        }

        let bytes = std::fs::read(entry.path()).map_err(|source| Error::ReadFile {
            path: entry.path().to_path_buf(),
            source,
        })?;
        debug!("Embedding {} ({} bytes)", relative.display(), bytes.len());

        matches.push(EmbeddedFile {
            path: relative.to_path_buf(),
            contents: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(matches)
}
