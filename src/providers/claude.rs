//! Claude Code: one JSONL file per session under `<root>/projects/<encoded-path>/`.
//!
//! Each line is a standalone record with `type` (`user`, `assistant`, `file-history-snapshot`,
//! ...), `uuid`, `timestamp`, optional `message.content` (string or content-block list),
//! `cwd` and `gitBranch`. Files named `agent-*.jsonl` are sub-agent sessions and are not listed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::Provider;
use crate::models::{Message, Project, ProviderId, Role, Session, ToolCall, ToolResult};
use crate::parsers::deserializers::deserialize_optional_timestamp;
use crate::parsers::reconstruct::flatten_tool_output;
use crate::parsers::text::{self, UNTITLED_SESSION};
use crate::parsers::{
    Block, MessageAssembler, MessageDraft, ReconstructPolicy, json_lines, read_log_file,
};
use crate::utils::{
    created_time, decode_path, file_stem, list_files, modified_time, project_name, validate_id,
};

const PROJECTS_DIRNAME: &str = "projects";
const SESSION_EXTENSION: &str = ".jsonl";
const INTERNAL_SESSION_PREFIX: &str = "agent-";

const RECORD_USER: &str = "user";
const RECORD_ASSISTANT: &str = "assistant";

#[derive(Debug, Deserialize)]
struct ClaudeRecord {
    #[serde(rename = "type", default)]
    record_type: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    message: Option<ClaudeMessage>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(rename = "gitBranch", default)]
    git_branch: Option<String>,
}

impl ClaudeRecord {
    fn role(&self) -> Option<Role> {
        match self.record_type.as_str() {
            RECORD_USER => Some(Role::User),
            RECORD_ASSISTANT => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeMessage {
    #[serde(default)]
    content: Option<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClaudeContent {
    Text(String),
    Blocks(Vec<Value>),
}

/// Whether `name` is a listable session file
fn is_session_file(name: &str) -> bool {
    name.ends_with(SESSION_EXTENSION) && !name.starts_with(INTERNAL_SESSION_PREFIX)
}

/// Maps one native content block; `None` for kinds with no normalized form
fn native_block(block: &Value) -> Option<Block> {
    let str_field = |key: &str| block.get(key).and_then(Value::as_str);

    match str_field("type")? {
        "text" => str_field("text").filter(|t| !t.is_empty()).map(|t| Block::Text(t.to_string())),
        "thinking" => {
            str_field("thinking").filter(|t| !t.is_empty()).map(|t| Block::Thinking(t.to_string()))
        }
        "tool_use" => {
            let id = str_field("id")?;
            let name = str_field("name")?;
            let input = block.get("input").filter(|v| !v.is_null()).cloned().unwrap_or(json!({}));
            Some(Block::ToolUse(ToolCall { id: id.to_string(), name: name.to_string(), input }))
        }
        "tool_result" => {
            let tool_call_id = str_field("tool_use_id")?;
            let content = block.get("content").map(flatten_tool_output).unwrap_or_default();
            let is_error = block.get("is_error").and_then(Value::as_bool).unwrap_or(false);
            Some(Block::ToolResult(ToolResult {
                tool_call_id: tool_call_id.to_string(),
                content,
                is_error,
            }))
        }
        _ => None,
    }
}

fn draft_from_record(
    record: ClaudeRecord,
    role: Role,
    fallback_id: String,
    timestamp: DateTime<Utc>,
) -> MessageDraft {
    let mut draft = MessageDraft::new(record.uuid.unwrap_or(fallback_id), role, timestamp);
    match record.message.and_then(|m| m.content) {
        Some(ClaudeContent::Text(text)) => {
            draft.push_native((!text.is_empty()).then_some(Block::Text(text)));
        }
        Some(ClaudeContent::Blocks(blocks)) => {
            for block in &blocks {
                draft.push_native(native_block(block));
            }
        }
        None => {}
    }
    draft
}

/// Line-oriented JSON-log provider (Claude Code)
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    root: PathBuf,
}

impl ClaudeProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIRNAME)
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf> {
        validate_id(project_id)?;
        Ok(self.projects_dir().join(project_id))
    }

    fn summarize_session(&self, project_id: &str, path: &Path) -> Result<Session> {
        let session_id = file_stem(path)
            .with_context(|| format!("Invalid session file name: {}", path.display()))?;
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
        let content = read_log_file(path)?;

        let mut preview: Option<String> = None;
        let mut message_count = 0;
        let mut created_at: Option<DateTime<Utc>> = None;
        let mut cwd: Option<String> = None;
        let mut git_branch: Option<String> = None;

        for record in json_lines::<ClaudeRecord>(&content, path) {
            let role = record.role();
            created_at = created_at.or(record.timestamp);
            if cwd.is_none() {
                cwd = record.cwd;
            }
            if git_branch.is_none() {
                git_branch = record.git_branch;
            }

            let Some(role) = role else { continue };
            message_count += 1;

            if role == Role::User
                && preview.is_none()
                && let Some(ClaudeContent::Text(text)) = record.message.and_then(|m| m.content)
                && !text.is_empty()
            {
                preview = Some(text::preview(&text));
            }
        }

        Ok(Session {
            id: session_id.to_string(),
            provider_id: ProviderId::Claude,
            project_id: project_id.to_string(),
            title: text::session_title(None, preview.as_deref(), UNTITLED_SESSION),
            first_message_preview: preview,
            message_count,
            cwd,
            git_branch,
            model: None,
            created_at: created_at.unwrap_or_else(|| created_time(&metadata)),
            last_modified: modified_time(&metadata),
        })
    }
}

impl Provider for ClaudeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn storage_dir(&self) -> PathBuf {
        self.projects_dir()
    }

    fn scan_projects(&self) -> Result<Vec<Project>> {
        let projects_dir = self.projects_dir();
        let entries = fs::read_dir(&projects_dir).with_context(|| {
            format!("Failed to read projects directory: {}", projects_dir.display())
        })?;

        let mut projects = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(encoded_name) = path.file_name().and_then(|n| n.to_str()) else {
                debug!(path = %path.display(), "skipping project directory with non-UTF-8 name");
                continue;
            };

            let session_count = match list_files(&path, is_session_file) {
                Ok(files) => files.len(),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable project directory");
                    continue;
                }
            };
            if session_count == 0 {
                continue;
            }

            let last_modified = match fs::metadata(&path) {
                Ok(metadata) => modified_time(&metadata),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping project directory");
                    continue;
                }
            };

            let decoded_path = decode_path(encoded_name);
            projects.push(Project {
                id: encoded_name.to_string(),
                provider_id: ProviderId::Claude,
                name: project_name(&decoded_path),
                path: decoded_path,
                session_count,
                last_modified,
            });
        }

        Ok(projects)
    }

    fn scan_sessions(&self, project_id: &str) -> Result<Vec<Session>> {
        let project_dir = self.project_dir(project_id)?;
        let files = list_files(&project_dir, is_session_file)?;

        let sessions = files
            .iter()
            .filter_map(|path| match self.summarize_session(project_id, path) {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping session file");
                    None
                }
            })
            .collect();

        Ok(sessions)
    }

    fn scan_messages(&self, project_id: &str, session_id: &str) -> Result<Vec<Message>> {
        validate_id(session_id)?;
        let path =
            self.project_dir(project_id)?.join(format!("{}{}", session_id, SESSION_EXTENSION));
        let content = read_log_file(&path)?;

        let mut assembler = MessageAssembler::new(ReconstructPolicy::default());
        for (index, record) in json_lines::<ClaudeRecord>(&content, &path).enumerate() {
            let Some(role) = record.role() else { continue };
            if record.message.is_none() {
                continue;
            }
            let timestamp = assembler.timestamp_or_previous(record.timestamp);
            let draft = draft_from_record(record, role, format!("record-{}", index), timestamp);
            assembler.push(draft);
        }

        Ok(assembler.finish())
    }
}
