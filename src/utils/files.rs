use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Modification time of a file, or the Unix epoch when the platform cannot report it
pub fn modified_time(metadata: &Metadata) -> DateTime<Utc> {
    metadata.modified().map(DateTime::<Utc>::from).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Creation time of a file, falling back to its modification time
pub fn created_time(metadata: &Metadata) -> DateTime<Utc> {
    metadata.created().map(DateTime::<Utc>::from).unwrap_or_else(|_| modified_time(metadata))
}

/// Files directly inside `dir` whose name satisfies `keep`, sorted by file name
pub fn list_files<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| entry.file_name().to_str().is_some_and(&keep))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Reads and deserializes a single JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

/// File name without its extension, if it is valid UTF-8
pub fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for name in ["b.json", "a.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").expect("Failed to write file");
        }
        fs::create_dir(dir.path().join("c.json")).expect("Failed to create dir");

        let files = list_files(dir.path(), |name| name.ends_with(".json")).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_list_files_missing_dir() {
        let err = list_files(Path::new("/nonexistent/dir"), |_| true).unwrap_err();
        assert!(err.to_string().contains("Failed to read directory"));
    }

    #[test]
    fn test_read_json() {
        #[derive(Debug, Deserialize)]
        struct Doc {
            id: String,
        }

        let dir = TempDir::new().expect("Failed to create temp dir");
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, r#"{"id":"x"}"#).unwrap();
        fs::write(&bad, r#"{"id":"#).unwrap();

        assert_eq!(read_json::<Doc>(&good).unwrap().id, "x");
        assert!(read_json::<Doc>(&bad).unwrap_err().to_string().contains("Failed to parse JSON"));
    }
}
