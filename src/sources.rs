use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Lists the `.json` exports directly inside `dir`, sorted by file name.
///
/// Exports are named after the time they were taken, so name order is also
/// the order they should be merged in.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("failed to list exports in {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let is_json = path.extension().map_or(false, |ext| ext == "json");
        if is_json && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Expands directories among `inputs`, keeping files as given and in order.
pub fn resolve(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_dir() {
            sources.extend(discover(input)?);
        } else {
            sources.push(input.clone());
        }
    }
    Ok(sources)
}
