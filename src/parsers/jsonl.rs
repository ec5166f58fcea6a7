use std::fs;
use std::marker::PhantomData;
use std::path::Path;
use std::str::Lines;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Reads a whole log file, replacing invalid UTF-8 rather than failing
pub fn read_log_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read log file: {}", path.display()))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Iterator over the records of a JSONL document
///
/// Blank lines are ignored. A line that is not valid JSON, or does not match `T`, is logged at
/// debug level and skipped; iteration always continues with the next line.
pub struct JsonLines<'a, T> {
    lines: Lines<'a>,
    source: &'a Path,
    line_num: usize,
    skipped: usize,
    _record: PhantomData<T>,
}

impl<'a, T> JsonLines<'a, T> {
    /// Number of malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<T: DeserializeOwned> Iterator for JsonLines<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        for line in self.lines.by_ref() {
            self.line_num += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(line) {
                Ok(record) => return Some(record),
                Err(e) => {
                    self.skipped += 1;
                    debug!(
                        path = %self.source.display(),
                        line = self.line_num,
                        error = %e,
                        "skipping malformed log line"
                    );
                }
            }
        }
        None
    }
}

/// Parses `content` line by line; `source` is only used for log messages
pub fn json_lines<'a, T: DeserializeOwned>(content: &'a str, source: &'a Path) -> JsonLines<'a, T> {
    JsonLines { lines: content.lines(), source, line_num: 0, skipped: 0, _record: PhantomData }
}
