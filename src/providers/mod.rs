//! Format parsers, one per provider log layout
//!
//! # Error Handling Strategy
//!
//! Every provider implements fallible `scan_*` methods that return `anyhow::Result`. Callers use
//! the provided `list_*` wrappers instead, which never fail:
//!
//! - **Scan failures** (unreadable root, bad project id, I/O errors) are logged with `warn!` and
//!   reported as [`ScanOutcome::Failed`]; [`ScanOutcome::into_items`] turns that into an empty
//!   list so the UI stays usable.
//! - **Per-file failures** inside a scan (one corrupt session file) are logged at debug level
//!   and the file is skipped; the scan itself still succeeds.
//! - **Availability** is a plain `bool`: any I/O error while probing means "not available".

pub mod claude;
pub mod codex;
pub mod opencode;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::warn;

use crate::models::{Message, Project, ProviderId, ProviderInfo, Session};

pub use claude::ClaudeProvider;
pub use codex::CodexProvider;
pub use opencode::OpenCodeProvider;

/// Result of a listing call: the items found, or the reason the scan failed
#[derive(Debug)]
pub enum ScanOutcome<T> {
    Complete(Vec<T>),
    Failed(anyhow::Error),
}

impl<T> ScanOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, ScanOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            ScanOutcome::Complete(_) => None,
            ScanOutcome::Failed(e) => Some(e),
        }
    }

    /// Items found; empty if the scan failed
    pub fn items(&self) -> &[T] {
        match self {
            ScanOutcome::Complete(items) => items,
            ScanOutcome::Failed(_) => &[],
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ScanOutcome::Complete(items) => items,
            ScanOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Capability set every provider log format implements
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Configured root directory of this provider's history
    fn root(&self) -> &Path;

    /// Directory whose accessibility decides availability
    fn storage_dir(&self) -> PathBuf;

    fn scan_projects(&self) -> Result<Vec<Project>>;

    fn scan_sessions(&self, project_id: &str) -> Result<Vec<Session>>;

    fn scan_messages(&self, project_id: &str, session_id: &str) -> Result<Vec<Message>>;

    /// True iff the storage directory exists and can be listed
    fn is_available(&self) -> bool {
        fs::read_dir(self.storage_dir()).is_ok()
    }

    fn info(&self) -> ProviderInfo {
        let id = self.id();
        ProviderInfo {
            id,
            name: id.display_name().to_string(),
            description: id.description().to_string(),
            icon: id.icon().to_string(),
            base_dir: self.root().to_path_buf(),
            available: self.is_available(),
        }
    }

    /// Projects ordered by last modification, newest first
    fn list_projects(&self) -> ScanOutcome<Project> {
        let outcome = into_outcome(self.id(), "projects", self.scan_projects());
        sort_newest_first(outcome, |p| p.last_modified)
    }

    /// Sessions of one project ordered by last modification, newest first
    fn list_sessions(&self, project_id: &str) -> ScanOutcome<Session> {
        let outcome = into_outcome(self.id(), "sessions", self.scan_sessions(project_id));
        sort_newest_first(outcome, |s| s.last_modified)
    }

    /// Messages of one session in log order
    fn list_messages(&self, project_id: &str, session_id: &str) -> ScanOutcome<Message> {
        into_outcome(self.id(), "messages", self.scan_messages(project_id, session_id))
    }
}

fn into_outcome<T>(provider: ProviderId, what: &str, result: Result<Vec<T>>) -> ScanOutcome<T> {
    match result {
        Ok(items) => ScanOutcome::Complete(items),
        Err(e) => {
            warn!(provider = %provider, error = %format_args!("{:#}", e), "failed to list {}", what);
            ScanOutcome::Failed(e)
        }
    }
}

fn sort_newest_first<T, K, F>(outcome: ScanOutcome<T>, key: F) -> ScanOutcome<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    match outcome {
        ScanOutcome::Complete(mut items) => {
            items.sort_by(|a, b| key(b).cmp(&key(a)));
            ScanOutcome::Complete(items)
        }
        failed => failed,
    }
}
