use std::path::{Path, PathBuf};

use gentx_types::constants::GENTX_EXTENSION;

use crate::error::CheckError;

fn has_gentx_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == GENTX_EXTENSION)
}

/// Resolve the candidate gentx files under `path`.
///
/// A file must carry the `.json` extension. A directory yields its `.json`
/// entries (non-recursive) sorted by file name; an empty result is not an
/// error.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>, CheckError> {
    let metadata = std::fs::metadata(path).map_err(|e| CheckError::Discovery {
        reason: format!("cannot access {}: {}", path.display(), e),
    })?;

    if !metadata.is_dir() {
        if !has_gentx_extension(path) {
            return Err(CheckError::Discovery {
                reason: format!("{} is not a .{} file", path.display(), GENTX_EXTENSION),
            });
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|e| CheckError::Discovery {
        reason: format!("cannot read directory {}: {}", path.display(), e),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CheckError::Discovery {
            reason: format!("cannot read directory {}: {}", path.display(), e),
        })?;
        let candidate = entry.path();
        if candidate.is_dir() || !has_gentx_extension(&candidate) {
            continue;
        }
        files.push(candidate);
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(dir = %path.display(), count = files.len(), "discovered gentx files");
    Ok(files)
}
