//! Codex-family rollout logs: `<root>/sessions/YYYY/MM/DD/rollout-*.jsonl`.
//!
//! Each line is `{ "type": "session_meta" | "event_msg" | "response_item", "timestamp", "payload" }`.
//! There is no native project concept: sessions are grouped by the `cwd` in their
//! `session_meta` record, and the project id is the base64url encoding of that `cwd`.
//!
//! Conversation content arrives in two shapes, and a file may mix them:
//!
//! - `event_msg` with `payload.type` of `user_message` / `agent_message` (`payload.message`) or
//!   `agent_reasoning` (`payload.text`)
//! - `response_item` with `payload.role` and `payload.content` blocks (`input_text`, `text`,
//!   `output_text`, `function_call`), or a standalone `function_call` /
//!   `function_call_output` item correlated by `call_id`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use walkdir::WalkDir;

use super::Provider;
use crate::models::{Message, Project, ProviderId, Role, Session, ToolCall, ToolResult};
use crate::parsers::deserializers::deserialize_optional_timestamp;
use crate::parsers::reconstruct::flatten_tool_output;
use crate::parsers::text;
use crate::parsers::{
    Block, MessageAssembler, MessageDraft, ReconstructPolicy, json_lines, read_log_file,
};
use crate::utils::{decode_cwd, encode_cwd, modified_time, project_name};

const SESSIONS_DIRNAME: &str = "sessions";
const ROLLOUT_PREFIX: &str = "rollout-";
const ROLLOUT_EXTENSION: &str = ".jsonl";
/// sessions/YYYY/MM/DD/rollout-*.jsonl
const ROLLOUT_DEPTH: usize = 4;

/// Project key for sessions whose metadata carries no working directory
const UNKNOWN_CWD: &str = "unknown";

const RECORD_SESSION_META: &str = "session_meta";
const RECORD_EVENT_MSG: &str = "event_msg";
const RECORD_RESPONSE_ITEM: &str = "response_item";

#[derive(Debug, Deserialize)]
struct RolloutRecord {
    #[serde(rename = "type", default)]
    record_type: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct SessionMeta {
    id: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    model_provider: Option<String>,
    #[serde(default)]
    git: Option<GitInfo>,
}

impl SessionMeta {
    fn project_cwd(&self) -> &str {
        self.cwd.as_deref().filter(|c| !c.is_empty()).unwrap_or(UNKNOWN_CWD)
    }
}

#[derive(Debug, Deserialize)]
struct GitInfo {
    #[serde(default)]
    branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventMsg {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    arguments: Option<Value>,
    #[serde(default)]
    output: Option<Value>,
}

/// One record classified by shape; unknown record types map to `None`
enum RolloutEvent {
    SessionMeta(SessionMeta),
    Event(EventMsg),
    Response(ResponseItem),
}

impl RolloutRecord {
    fn classify(&self) -> Option<RolloutEvent> {
        let parsed = match self.record_type.as_str() {
            RECORD_SESSION_META => {
                SessionMeta::deserialize(&self.payload).map(RolloutEvent::SessionMeta)
            }
            RECORD_EVENT_MSG => EventMsg::deserialize(&self.payload).map(RolloutEvent::Event),
            RECORD_RESPONSE_ITEM => {
                ResponseItem::deserialize(&self.payload).map(RolloutEvent::Response)
            }
            _ => return None,
        };
        match parsed {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(record_type = %self.record_type, error = %e, "skipping malformed payload");
                None
            }
        }
    }
}

/// A rollout file and the `YYYY-MM-DD` date of its shard
#[derive(Debug, Clone)]
struct RolloutFile {
    path: PathBuf,
    date: String,
}

fn is_rollout_file(name: &str) -> bool {
    name.starts_with(ROLLOUT_PREFIX) && name.ends_with(ROLLOUT_EXTENSION)
}

fn is_text_block(kind: &str) -> bool {
    matches!(kind, "input_text" | "text" | "output_text")
}

/// Parses `function_call.arguments`, a JSON-encoded string in practice
fn parse_arguments(arguments: Option<&Value>) -> Value {
    match arguments {
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).unwrap_or_else(|_| json!({ "raw": raw }))
        }
        Some(value) if !value.is_null() => value.clone(),
        _ => json!({}),
    }
}

fn output_text(output: Option<&Value>) -> String {
    match output {
        Some(Value::Object(fields)) => fields
            .get("content")
            .or_else(|| fields.get("output"))
            .map(flatten_tool_output)
            .unwrap_or_default(),
        Some(value) => flatten_tool_output(value),
        None => String::new(),
    }
}

fn content_block(block: &Value) -> Option<Block> {
    let str_field = |key: &str| block.get(key).and_then(Value::as_str);
    let kind = str_field("type")?;

    if is_text_block(kind) {
        return str_field("text").filter(|t| !t.is_empty()).map(|t| Block::Text(t.to_string()));
    }
    if kind == "function_call" {
        let name = str_field("name")?;
        let call_id = str_field("call_id")?;
        return Some(Block::ToolUse(ToolCall {
            id: call_id.to_string(),
            name: name.to_string(),
            input: parse_arguments(block.get("arguments")),
        }));
    }
    None
}

/// First user text of a `response_item`, used for previews
fn first_user_text(item: &ResponseItem) -> Option<&str> {
    item.content.iter().find_map(|block| {
        let kind = block.get("type").and_then(Value::as_str)?;
        if kind == "input_text" || kind == "text" {
            block.get("text").and_then(Value::as_str)
        } else {
            None
        }
    })
}

/// Message draft for one event or response item, if it carries conversation content
fn draft_from_event(
    event: RolloutEvent,
    index: usize,
    timestamp: DateTime<Utc>,
) -> Option<MessageDraft> {
    let draft =
        |role: Role| MessageDraft::new(format!("{}-{}", role.as_str(), index), role, timestamp);

    match event {
        RolloutEvent::SessionMeta(_) => None,
        RolloutEvent::Event(event) => {
            let (role, body) = match event.kind.as_str() {
                "user_message" => (Role::User, event.message),
                "agent_message" => (Role::Assistant, event.message),
                "agent_reasoning" => (Role::Assistant, event.text),
                _ => return None,
            };
            let body = body.filter(|b| !b.is_empty())?;
            Some(draft(role).with_block(Block::Text(body)))
        }
        RolloutEvent::Response(item) => match item.kind.as_str() {
            "function_call" => {
                let call = ToolCall {
                    id: item.call_id?,
                    name: item.name?,
                    input: parse_arguments(item.arguments.as_ref()),
                };
                Some(draft(Role::Assistant).with_block(Block::ToolUse(call)))
            }
            "function_call_output" => {
                let result = ToolResult {
                    tool_call_id: item.call_id?,
                    content: output_text(item.output.as_ref()),
                    is_error: false,
                };
                Some(draft(Role::User).with_block(Block::ToolResult(result)))
            }
            _ => {
                let role = match item.role.as_deref() {
                    Some("user") => Role::User,
                    Some("assistant") => Role::Assistant,
                    _ => return None,
                };
                let mut message = draft(role);
                for block in &item.content {
                    message.push_native(content_block(block));
                }
                message.has_content().then_some(message)
            }
        },
    }
}

/// Date-sharded rollout-log provider (Codex and its forks)
#[derive(Debug, Clone)]
pub struct CodexProvider {
    id: ProviderId,
    root: PathBuf,
}

impl CodexProvider {
    pub fn new(id: ProviderId, root: impl Into<PathBuf>) -> Self {
        Self { id, root: root.into() }
    }

    /// OpenAI Codex CLI (`~/.codex`)
    pub fn codex(root: impl Into<PathBuf>) -> Self {
        Self::new(ProviderId::Codex, root)
    }

    /// just-every/code CLI (`~/.code`)
    pub fn code(root: impl Into<PathBuf>) -> Self {
        Self::new(ProviderId::Code, root)
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIRNAME)
    }

    /// Every rollout file across all date shards, in path order
    fn rollout_files(&self) -> Result<Vec<RolloutFile>> {
        let sessions_dir = self.sessions_dir();
        fs::read_dir(&sessions_dir).with_context(|| {
            format!("Failed to read sessions directory: {}", sessions_dir.display())
        })?;

        let files = WalkDir::new(&sessions_dir)
            .min_depth(ROLLOUT_DEPTH)
            .max_depth(ROLLOUT_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "skipping unreadable rollout shard");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_str().is_some_and(is_rollout_file))
            .map(|entry| {
                let date = entry
                    .path()
                    .strip_prefix(&sessions_dir)
                    .ok()
                    .map(|relative| {
                        relative
                            .components()
                            .take(ROLLOUT_DEPTH - 1)
                            .map(|c| c.as_os_str().to_string_lossy())
                            .collect::<Vec<_>>()
                            .join("-")
                    })
                    .unwrap_or_default();
                RolloutFile { path: entry.into_path(), date }
            })
            .collect();

        Ok(files)
    }

    /// First `session_meta` of a rollout file, with the file's modification time
    fn read_head(path: &Path) -> Result<Option<(SessionMeta, DateTime<Utc>)>> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
        let content = read_log_file(path)?;

        let meta = json_lines::<RolloutRecord>(&content, path)
            .filter(|record| record.record_type == RECORD_SESSION_META)
            .find_map(|record| match record.classify() {
                Some(RolloutEvent::SessionMeta(meta)) => Some(meta),
                _ => None,
            });
        Ok(meta.map(|meta| (meta, modified_time(&metadata))))
    }

    fn summarize_rollout(
        &self,
        project_id: &str,
        cwd: &str,
        file: &RolloutFile,
    ) -> Result<Option<Session>> {
        let metadata = fs::metadata(&file.path)
            .with_context(|| format!("Failed to read file metadata: {}", file.path.display()))?;
        let content = read_log_file(&file.path)?;

        let mut meta: Option<SessionMeta> = None;
        let mut preview: Option<String> = None;
        let mut message_count = 0;

        for record in json_lines::<RolloutRecord>(&content, &file.path) {
            match record.classify() {
                Some(RolloutEvent::SessionMeta(next)) => {
                    match meta.as_ref().map(|current| current.id != next.id) {
                        None => meta = Some(next),
                        Some(true) => break,
                        Some(false) => {}
                    }
                }
                Some(RolloutEvent::Event(event)) => match event.kind.as_str() {
                    "user_message" => {
                        message_count += 1;
                        if preview.is_none()
                            && let Some(message) = event.message.as_deref()
                            && !message.is_empty()
                        {
                            preview = Some(text::preview(message));
                        }
                    }
                    "agent_message" | "agent_reasoning" => message_count += 1,
                    _ => {}
                },
                Some(RolloutEvent::Response(item)) => {
                    let role = item.role.as_deref();
                    if role == Some("user") || role == Some("assistant") {
                        message_count += 1;
                        if preview.is_none()
                            && role == Some("user")
                            && let Some(first) = first_user_text(&item).filter(|t| !t.is_empty())
                        {
                            preview = Some(text::preview(first));
                        }
                    }
                }
                None => {}
            }
        }

        let Some(meta) = meta.filter(|meta| meta.project_cwd() == cwd) else {
            return Ok(None);
        };

        let placeholder = format!("Session {}", file.date);
        Ok(Some(Session {
            id: meta.id.clone(),
            provider_id: self.id,
            project_id: project_id.to_string(),
            title: text::session_title(None, preview.as_deref(), &placeholder),
            first_message_preview: preview,
            message_count,
            git_branch: meta.git.as_ref().and_then(|g| g.branch.clone()),
            model: meta.model_provider.clone(),
            created_at: meta.timestamp.unwrap_or_else(|| modified_time(&metadata)),
            last_modified: modified_time(&metadata),
            cwd: meta.cwd,
        }))
    }

    /// Messages of `session_id` if `path` holds that session
    ///
    /// Reading stops at the first `session_meta` of a different session.
    fn read_session_messages(path: &Path, session_id: &str) -> Result<Option<Vec<Message>>> {
        let content = read_log_file(path)?;
        let mut assembler = MessageAssembler::new(ReconstructPolicy::default());
        let mut found = false;

        for record in json_lines::<RolloutRecord>(&content, path) {
            let Some(event) = record.classify() else { continue };

            if let RolloutEvent::SessionMeta(meta) = &event {
                if meta.id == session_id {
                    found = true;
                    continue;
                }
                break;
            }
            if !found {
                continue;
            }

            let timestamp = assembler.timestamp_or_previous(record.timestamp);
            if let Some(draft) = draft_from_event(event, assembler.len(), timestamp) {
                assembler.push(draft);
            }
        }

        Ok(found.then(|| assembler.finish()))
    }
}

impl Provider for CodexProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn storage_dir(&self) -> PathBuf {
        self.sessions_dir()
    }

    fn scan_projects(&self) -> Result<Vec<Project>> {
        let files = self.rollout_files()?;

        let heads: Vec<(SessionMeta, DateTime<Utc>)> = files
            .par_iter()
            .filter_map(|file| match Self::read_head(&file.path) {
                Ok(head) => head,
                Err(e) => {
                    debug!(path = %file.path.display(), error = %e, "skipping rollout file");
                    None
                }
            })
            .collect();

        let mut by_cwd: BTreeMap<String, (usize, DateTime<Utc>)> = BTreeMap::new();
        for (meta, modified) in heads {
            let entry = by_cwd.entry(meta.project_cwd().to_string()).or_insert((0, modified));
            entry.0 += 1;
            entry.1 = entry.1.max(modified);
        }

        let projects = by_cwd
            .into_iter()
            .map(|(cwd, (session_count, last_modified))| Project {
                id: encode_cwd(&cwd),
                provider_id: self.id,
                name: project_name(&cwd),
                path: cwd,
                session_count,
                last_modified,
            })
            .collect();

        Ok(projects)
    }

    fn scan_sessions(&self, project_id: &str) -> Result<Vec<Session>> {
        let cwd = decode_cwd(project_id)?;
        let files = self.rollout_files()?;

        let sessions = files
            .par_iter()
            .filter_map(|file| match self.summarize_rollout(project_id, &cwd, file) {
                Ok(session) => session,
                Err(e) => {
                    debug!(path = %file.path.display(), error = %e, "skipping rollout file");
                    None
                }
            })
            .collect();

        Ok(sessions)
    }

    fn scan_messages(&self, _project_id: &str, session_id: &str) -> Result<Vec<Message>> {
        for file in self.rollout_files()? {
            match Self::read_session_messages(&file.path, session_id) {
                Ok(Some(messages)) => return Ok(messages),
                Ok(None) => {}
                Err(e) => {
                    debug!(path = %file.path.display(), error = %e, "skipping rollout file");
                }
            }
        }
        Ok(Vec::new())
    }
}
