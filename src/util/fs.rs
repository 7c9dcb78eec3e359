//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_path() {
        let base = Path::new("/proj");
        let path = Path::new("/proj/analysis/model.R");
        assert_eq!(relative_path(base, path), Path::new("analysis/model.R"));
    }

    #[test]
    fn test_read_to_string_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_to_string(&tmp.path().join("nope.R")).unwrap_err();
        assert!(err.to_string().contains("nope.R"));
    }
}
