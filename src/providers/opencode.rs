//! OpenCode: a structured store of one JSON file per entity under `<root>/storage/`.
//!
//! ```text
//! storage/project/<projectID>.json
//! storage/session/<projectID>/<sessionID>.json
//! storage/message/<sessionID>/<messageID>.json
//! storage/part/<messageID>/<partID>.json
//! ```
//!
//! Entities link by id. Message and part files are read in file-name order, which OpenCode's
//! ids keep chronological. Times are epoch milliseconds.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::Provider;
use crate::models::{
    Message, MessageMetadata, Project, ProviderId, Role, Session, TokenUsage, ToolCall, ToolResult,
};
use crate::parsers::deserializers::deserialize_optional_timestamp;
use crate::parsers::text::{self, UNTITLED_SESSION};
use crate::parsers::reconstruct::flatten_tool_output;
use crate::parsers::{Block, MessageAssembler, MessageDraft, ReconstructPolicy, ThinkingPolicy};
use crate::utils::{created_time, list_files, modified_time, project_name, read_json, validate_id};

const STORAGE_DIRNAME: &str = "storage";
const PROJECT_DIRNAME: &str = "project";
const SESSION_DIRNAME: &str = "session";
const MESSAGE_DIRNAME: &str = "message";
const PART_DIRNAME: &str = "part";
const ENTITY_EXTENSION: &str = ".json";

/// Tool result content when a finished tool reported neither output nor error
const COMPLETED_PLACEHOLDER: &str = "(completed)";

const STATUS_COMPLETED: &str = "completed";
const STATUS_ERROR: &str = "error";

const POLICY: ReconstructPolicy =
    ReconstructPolicy { thinking: ThinkingPolicy::LastWins, tool_results_on_any_role: true };

#[derive(Debug, Default, Deserialize)]
struct TimeInfo {
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ProjectFile {
    id: String,
    worktree: String,
    #[serde(default)]
    time: TimeInfo,
}

#[derive(Debug, Deserialize)]
struct ModelRef {
    #[serde(rename = "modelID", default)]
    model_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionFile {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    directory: Option<String>,
    #[serde(default)]
    model: Option<ModelRef>,
    #[serde(default)]
    time: TimeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct CacheTokens {
    #[serde(default)]
    read: u64,
    #[serde(default)]
    write: u64,
}

#[derive(Debug, Deserialize)]
struct TokenCounts {
    #[serde(default)]
    input: u64,
    #[serde(default)]
    output: u64,
    #[serde(default)]
    reasoning: u64,
    #[serde(default)]
    cache: CacheTokens,
}

impl From<TokenCounts> for TokenUsage {
    fn from(tokens: TokenCounts) -> Self {
        TokenUsage {
            input: tokens.input,
            output: tokens.output,
            reasoning: tokens.reasoning,
            cache_read: tokens.cache.read,
            cache_write: tokens.cache.write,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageFile {
    id: String,
    role: String,
    #[serde(default)]
    time: TimeInfo,
    #[serde(rename = "modelID", default)]
    model_id: Option<String>,
    #[serde(rename = "providerID", default)]
    provider_id: Option<String>,
    #[serde(default)]
    tokens: Option<TokenCounts>,
}

impl MessageFile {
    fn metadata(&mut self) -> Option<MessageMetadata> {
        let metadata = MessageMetadata {
            model: self.model_id.take(),
            provider: self.provider_id.take(),
            tokens: self.tokens.take().map(TokenUsage::from),
        };
        (metadata != MessageMetadata::default()).then_some(metadata)
    }
}

#[derive(Debug, Deserialize)]
struct ToolState {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    input: Option<Value>,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartFile {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(rename = "callID", default)]
    call_id: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    state: Option<ToolState>,
}

impl PartFile {
    /// Normalized blocks of one part: a tool part may yield both a call and its result
    fn into_blocks(self) -> Vec<Block> {
        match self.kind.as_str() {
            "text" => non_empty(self.text).map(Block::Text).into_iter().collect(),
            "thinking" => non_empty(self.thinking).map(Block::Thinking).into_iter().collect(),
            "reasoning" => non_empty(self.text).map(Block::Thinking).into_iter().collect(),
            "tool" => {
                let (Some(name), Some(state)) = (self.tool, self.state) else {
                    return Vec::new();
                };
                let call_id = self.call_id.unwrap_or(self.id);
                let mut blocks = Vec::new();

                if let Some(input) = state.input.filter(|input| !input.is_null()) {
                    blocks.push(Block::ToolUse(ToolCall { id: call_id.clone(), name, input }));
                }

                let status = state.status.as_deref();
                let finished = matches!(status, Some(STATUS_COMPLETED | STATUS_ERROR));
                let output = tool_text(state.output);
                if finished || output.is_some() {
                    let content = output
                        .or_else(|| tool_text(state.error))
                        .unwrap_or_else(|| COMPLETED_PLACEHOLDER.to_string());
                    blocks.push(Block::ToolResult(ToolResult {
                        tool_call_id: call_id,
                        content,
                        is_error: status == Some(STATUS_ERROR),
                    }));
                }
                blocks
            }
            _ => Vec::new(),
        }
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

/// Tool output or error as display text; structured values are kept as compact JSON
fn tool_text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        value @ (Value::String(_) | Value::Array(_)) => flatten_tool_output(&value),
        value => value.to_string(),
    };
    non_empty(Some(text))
}

fn is_entity_file(name: &str) -> bool {
    name.ends_with(ENTITY_EXTENSION)
}

/// Directory-sharded structured-store provider
#[derive(Debug, Clone)]
pub struct OpenCodeProvider {
    root: PathBuf,
}

impl OpenCodeProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entity_dir(&self, kind: &str) -> PathBuf {
        self.root.join(STORAGE_DIRNAME).join(kind)
    }

    /// `storage/<kind>/<owner_id>`, rejecting ids that are not a single path component
    fn owned_dir(&self, kind: &str, owner_id: &str) -> Result<PathBuf> {
        validate_id(owner_id)?;
        Ok(self.entity_dir(kind).join(owner_id))
    }

    /// Entity files under `dir`; a missing directory means "no entities yet"
    fn entity_files(dir: &Path) -> Vec<PathBuf> {
        list_files(dir, is_entity_file).unwrap_or_default()
    }

    fn read_parts(&self, message_id: &str) -> Vec<PartFile> {
        let Ok(part_dir) = self.owned_dir(PART_DIRNAME, message_id) else {
            debug!(message_id, "skipping parts of message with invalid id");
            return Vec::new();
        };
        Self::entity_files(&part_dir)
            .iter()
            .filter_map(|path| match read_json::<PartFile>(path) {
                Ok(part) => Some(part),
                Err(e) => {
                    debug!(path = %path.display(), error = %format_args!("{:#}", e), "skipping part");
                    None
                }
            })
            .collect()
    }

    /// Text of the first `text` part of the first user message in the session
    fn first_user_text(&self, message_files: &[PathBuf]) -> Option<String> {
        message_files
            .iter()
            .filter_map(|path| read_json::<MessageFile>(path).ok())
            .filter(|message| message.role == "user")
            .find_map(|message| {
                self.read_parts(&message.id)
                    .into_iter()
                    .filter(|part| part.kind == "text")
                    .find_map(|part| part.text.filter(|t| !t.is_empty()))
            })
    }

    fn summarize_project(&self, project: ProjectFile) -> Project {
        let session_files = self
            .owned_dir(SESSION_DIRNAME, &project.id)
            .map(|dir| Self::entity_files(&dir))
            .unwrap_or_default();

        let created = project.time.created.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let last_modified = session_files
            .iter()
            .filter_map(|path| fs::metadata(path).ok())
            .map(|metadata| modified_time(&metadata))
            .fold(created, DateTime::max);

        Project {
            name: project_name(&project.worktree),
            provider_id: ProviderId::OpenCode,
            path: project.worktree,
            id: project.id,
            session_count: session_files.len(),
            last_modified,
        }
    }

    fn summarize_session(&self, project_id: &str, path: &Path) -> Result<Session> {
        let session: SessionFile = read_json(path)?;
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

        let message_files = self
            .owned_dir(MESSAGE_DIRNAME, &session.id)
            .map(|dir| Self::entity_files(&dir))
            .unwrap_or_default();
        let preview = self.first_user_text(&message_files).map(|t| text::preview(&t));

        Ok(Session {
            title: text::session_title(
                session.title.as_deref(),
                preview.as_deref(),
                UNTITLED_SESSION,
            ),
            first_message_preview: preview,
            message_count: message_files.len(),
            provider_id: ProviderId::OpenCode,
            project_id: project_id.to_string(),
            cwd: session.directory,
            git_branch: None,
            model: session.model.and_then(|m| m.model_id),
            created_at: session.time.created.unwrap_or_else(|| created_time(&metadata)),
            last_modified: session.time.updated.unwrap_or_else(|| modified_time(&metadata)),
            id: session.id,
        })
    }
}

impl Provider for OpenCodeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenCode
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn storage_dir(&self) -> PathBuf {
        self.root.join(STORAGE_DIRNAME)
    }

    fn scan_projects(&self) -> Result<Vec<Project>> {
        let files = list_files(&self.entity_dir(PROJECT_DIRNAME), is_entity_file)?;

        let projects = files
            .iter()
            .filter_map(|path| match read_json::<ProjectFile>(path) {
                Ok(project) => Some(self.summarize_project(project)),
                Err(e) => {
                    debug!(path = %path.display(), error = %format_args!("{:#}", e), "skipping project");
                    None
                }
            })
            .collect();

        Ok(projects)
    }

    fn scan_sessions(&self, project_id: &str) -> Result<Vec<Session>> {
        let session_dir = self.owned_dir(SESSION_DIRNAME, project_id)?;
        let files = list_files(&session_dir, is_entity_file)?;

        let sessions = files
            .iter()
            .filter_map(|path| match self.summarize_session(project_id, path) {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(path = %path.display(), error = %format_args!("{:#}", e), "skipping session");
                    None
                }
            })
            .collect();

        Ok(sessions)
    }

    fn scan_messages(&self, _project_id: &str, session_id: &str) -> Result<Vec<Message>> {
        let message_dir = self.owned_dir(MESSAGE_DIRNAME, session_id)?;
        let files = list_files(&message_dir, is_entity_file)?;
        let mut assembler = MessageAssembler::new(POLICY);

        for path in &files {
            let mut message = match read_json::<MessageFile>(path) {
                Ok(message) => message,
                Err(e) => {
                    debug!(path = %path.display(), error = %format_args!("{:#}", e), "skipping message");
                    continue;
                }
            };
            let Some(role) = Role::parse(&message.role) else {
                debug!(path = %path.display(), role = %message.role, "skipping unknown role");
                continue;
            };

            let timestamp = assembler.timestamp_or_previous(message.time.created);
            let mut draft = MessageDraft::new(message.id.clone(), role, timestamp);
            for part in self.read_parts(&message.id) {
                draft.push_native_group(part.into_blocks());
            }
            if let Some(metadata) = message.metadata() {
                draft = draft.with_metadata(metadata);
            }
            assembler.push(draft);
        }

        Ok(assembler.finish())
    }
}
