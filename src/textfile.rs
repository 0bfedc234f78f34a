//! Whole-read, whole-write access to line-oriented store files.

use std::fs;
use std::path::Path;

use reconcile::{Error, Result};

/// Read a store file into lines. A missing or unreadable store is fatal.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Rewrite a store file in one shot: write a sibling temp file, then
/// rename it over the original so readers never observe a partial store.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut text = lines.join("\n");
    if !lines.is_empty() {
        text.push('\n');
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, text).map_err(|source| Error::FileAccess {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
