//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// Builder for a Claude Code root (`projects/<encoded-path>/<session>.jsonl`)
pub struct ClaudeDirBuilder {
    temp_dir: TempDir,
}

impl ClaudeDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("projects")).expect("Failed to create projects dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add a session file with raw JSONL content under the given project directory name
    pub fn with_session(self, encoded_project: &str, file_name: &str, content: &str) -> Self {
        let project_dir = self.temp_dir.path().join("projects").join(encoded_project);
        fs::create_dir_all(&project_dir).expect("Failed to create project dir");
        fs::write(project_dir.join(file_name), content).expect("Failed to write session file");
        self
    }

    /// Add a session built from records
    pub fn with_records(self, encoded_project: &str, session_id: &str, records: &[Value]) -> Self {
        let content = records.iter().map(Value::to_string).collect::<Vec<_>>().join("\n");
        self.with_session(encoded_project, &format!("{}.jsonl", session_id), &content)
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for ClaudeDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Claude `user` record with plain-string content
pub fn claude_user(uuid: &str, timestamp: &str, text: &str) -> Value {
    json!({
        "type": "user",
        "uuid": uuid,
        "timestamp": timestamp,
        "message": {"role": "user", "content": text}
    })
}

/// A Claude `assistant` record with content blocks
pub fn claude_assistant(uuid: &str, timestamp: &str, blocks: Value) -> Value {
    json!({
        "type": "assistant",
        "uuid": uuid,
        "timestamp": timestamp,
        "message": {"role": "assistant", "content": blocks}
    })
}

/// Builder for a Codex-family root (`sessions/YYYY/MM/DD/rollout-*.jsonl`)
pub struct CodexDirBuilder {
    temp_dir: TempDir,
}

impl CodexDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("sessions")).expect("Failed to create sessions dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add a rollout under `sessions/<date>/` where `date` is `YYYY/MM/DD`
    pub fn with_rollout(self, date: &str, name: &str, records: &[Value]) -> Self {
        let shard = self.temp_dir.path().join("sessions").join(date);
        fs::create_dir_all(&shard).expect("Failed to create shard dir");
        let content = records.iter().map(Value::to_string).collect::<Vec<_>>().join("\n");
        fs::write(shard.join(name), content).expect("Failed to write rollout");
        self
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for CodexDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn codex_meta(id: &str, cwd: &str) -> Value {
    json!({
        "type": "session_meta",
        "timestamp": "2025-02-01T08:00:00Z",
        "payload": {"id": id, "timestamp": "2025-02-01T08:00:00Z", "cwd": cwd}
    })
}

pub fn codex_event(kind: &str, timestamp: &str, message: &str) -> Value {
    json!({
        "type": "event_msg",
        "timestamp": timestamp,
        "payload": {"type": kind, "message": message}
    })
}

/// Builder for an OpenCode data root (`storage/{project,session,message,part}/...`)
pub struct OpenCodeDirBuilder {
    temp_dir: TempDir,
}

impl OpenCodeDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join("storage").join("project"))
            .expect("Failed to create storage dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn write(&self, dir: PathBuf, id: &str, value: Value) {
        fs::create_dir_all(&dir).expect("Failed to create entity dir");
        fs::write(dir.join(format!("{}.json", id)), value.to_string())
            .expect("Failed to write entity");
    }

    fn storage(&self) -> PathBuf {
        self.temp_dir.path().join("storage")
    }

    pub fn with_project(self, id: &str, worktree: &str) -> Self {
        self.write(
            self.storage().join("project"),
            id,
            json!({"id": id, "worktree": worktree, "time": {"created": 1_700_000_000_000_i64}}),
        );
        self
    }

    pub fn with_session(self, project_id: &str, id: &str, title: &str) -> Self {
        self.write(
            self.storage().join("session").join(project_id),
            id,
            json!({
                "id": id,
                "projectID": project_id,
                "title": title,
                "time": {"created": 1_700_000_100_000_i64, "updated": 1_700_000_200_000_i64}
            }),
        );
        self
    }

    /// Add a message with one `text` part
    pub fn with_text_message(self, session_id: &str, id: &str, role: &str, text: &str) -> Self {
        self.write(
            self.storage().join("message").join(session_id),
            id,
            json!({"id": id, "sessionID": session_id, "role": role, "time": {"created": 1_700_000_150_000_i64}}),
        );
        self.write(
            self.storage().join("part").join(id),
            "prt_0001",
            json!({"id": "prt_0001", "messageID": id, "type": "text", "text": text}),
        );
        self
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for OpenCodeDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}
