use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::paths::{display_label, normalize_path};
use crate::CritiqueError;

/// A text file read for critique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub content: String,
    /// The path as the user wrote it, for display
    pub label: String,
    pub resolved_path: PathBuf,
}

impl LoadedFile {
    /// Lines as counted for the large-file threshold
    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }
}

/// Resolve `raw` against `cwd` and read it as text.
///
/// Fails when the path is missing, not a regular file, unreadable, or
/// contains NUL characters once decoded.
pub fn load_file(raw: &str, cwd: &Path) -> Result<LoadedFile, CritiqueError> {
    let label = display_label(raw);
    let resolved_path = normalize_path(raw, cwd);

    let metadata = fs::metadata(&resolved_path).map_err(|source| CritiqueError::Access {
        path: label.clone(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(CritiqueError::NotAFile { path: label });
    }

    let bytes = fs::read(&resolved_path).map_err(|source| CritiqueError::Read {
        path: label.clone(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    if content.contains('\0') {
        return Err(CritiqueError::Binary { path: label });
    }

    debug!(
        path = %resolved_path.display(),
        bytes = bytes.len(),
        "Loaded file for critique"
    );

    Ok(LoadedFile {
        content,
        label,
        resolved_path,
    })
}
