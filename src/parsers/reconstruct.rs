//! Message reconstruction shared by all providers.
//!
//! Each provider maps its native content into [`Block`]s and hands a [`MessageDraft`] to a
//! [`MessageAssembler`]. The assembler deduplicates drafts by message id and turns each one into
//! a normalized [`Message`]:
//!
//! 1. Duplicate ids: the first draft is kept; a later draft with the same id replaces it (in
//!    place) only if it has strictly more native content blocks.
//! 2. Text blocks are joined with a blank line, in block order.
//! 3. Thinking: first block wins, or last block wins, per [`ThinkingPolicy`].
//! 4. Tool invocations become [`ToolCall`]s, only on assistant messages.
//! 5. Tool results are kept only on user messages unless the policy allows any role.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{Message, MessageMetadata, Role, ToolCall, ToolResult};

const TEXT_SEPARATOR: &str = "\n\n";

/// Provider-independent content fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(String),
    Thinking(String),
    ToolUse(ToolCall),
    ToolResult(ToolResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingPolicy {
    FirstWins,
    LastWins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructPolicy {
    pub thinking: ThinkingPolicy,
    pub tool_results_on_any_role: bool,
}

impl Default for ReconstructPolicy {
    fn default() -> Self {
        Self { thinking: ThinkingPolicy::FirstWins, tool_results_on_any_role: false }
    }
}

/// One provider-native message before normalization
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub id: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    pub blocks: Vec<Block>,
    /// Count of native content blocks, including ones that map to no [`Block`]
    pub native_block_count: usize,
    pub metadata: Option<MessageMetadata>,
}

impl MessageDraft {
    pub fn new(id: impl Into<String>, role: Role, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            role,
            timestamp,
            blocks: Vec::new(),
            native_block_count: 0,
            metadata: None,
        }
    }

    /// Adds a native block; `block` is `None` for native kinds with no normalized form
    pub fn push_native(&mut self, block: Option<Block>) {
        self.native_block_count += 1;
        if let Some(block) = block {
            self.blocks.push(block);
        }
    }

    /// Adds one native block that maps to several normalized blocks
    pub fn push_native_group(&mut self, blocks: Vec<Block>) {
        self.native_block_count += 1;
        self.blocks.extend(blocks);
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.push_native(Some(block));
        self
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn has_content(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Normalizes a single draft
pub fn reconstruct(draft: MessageDraft, policy: &ReconstructPolicy) -> Message {
    let mut texts: Vec<String> = Vec::new();
    let mut thinking: Option<String> = None;
    let mut tool_calls = Vec::new();
    let mut tool_results = Vec::new();

    let calls_allowed = draft.role == Role::Assistant;
    let results_allowed = policy.tool_results_on_any_role || draft.role == Role::User;

    for block in draft.blocks {
        match block {
            Block::Text(text) => texts.push(text),
            Block::Thinking(text) => match policy.thinking {
                ThinkingPolicy::FirstWins => {
                    thinking.get_or_insert(text);
                }
                ThinkingPolicy::LastWins => thinking = Some(text),
            },
            Block::ToolUse(call) if calls_allowed => tool_calls.push(call),
            Block::ToolResult(result) if results_allowed => tool_results.push(result),
            Block::ToolUse(_) | Block::ToolResult(_) => {}
        }
    }

    Message {
        id: draft.id,
        role: draft.role,
        timestamp: draft.timestamp,
        text_content: texts.join(TEXT_SEPARATOR),
        thinking,
        tool_calls,
        tool_results,
        metadata: draft.metadata,
    }
}

/// Collects drafts in log order, resolving duplicate ids
#[derive(Debug)]
pub struct MessageAssembler {
    policy: ReconstructPolicy,
    messages: Vec<Message>,
    block_counts: Vec<usize>,
    positions: HashMap<String, usize>,
}

impl MessageAssembler {
    pub fn new(policy: ReconstructPolicy) -> Self {
        Self { policy, messages: Vec::new(), block_counts: Vec::new(), positions: HashMap::new() }
    }

    pub fn push(&mut self, draft: MessageDraft) {
        if let Some(&idx) = self.positions.get(&draft.id) {
            if draft.native_block_count > self.block_counts[idx] {
                self.block_counts[idx] = draft.native_block_count;
                self.messages[idx] = reconstruct(draft, &self.policy);
            }
            return;
        }

        self.positions.insert(draft.id.clone(), self.messages.len());
        self.block_counts.push(draft.native_block_count);
        self.messages.push(reconstruct(draft, &self.policy));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `timestamp`, or the latest message's timestamp when the record carried none
    pub fn timestamp_or_previous(&self, timestamp: Option<DateTime<Utc>>) -> DateTime<Utc> {
        timestamp
            .or_else(|| self.messages.last().map(|m| m.timestamp))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn finish(self) -> Vec<Message> {
        self.messages
    }
}

/// Flattens tool output that is either a string or a list of `{type: "text", text}` blocks
pub fn flatten_tool_output(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn call(id: &str) -> ToolCall {
        ToolCall { id: id.to_string(), name: "Read".to_string(), input: json!({"path": "a.rs"}) }
    }

    fn result(id: &str) -> ToolResult {
        ToolResult { tool_call_id: id.to_string(), content: "done".to_string(), is_error: false }
    }

    #[test]
    fn test_text_joined_with_blank_line() {
        let draft = MessageDraft::new("m1", Role::Assistant, ts(1))
            .with_block(Block::Text("one".to_string()))
            .with_block(Block::ToolUse(call("t1")))
            .with_block(Block::Text("two".to_string()));

        let message = reconstruct(draft, &ReconstructPolicy::default());
        assert_eq!(message.text_content, "one\n\ntwo");
        assert_eq!(message.tool_calls.len(), 1);
    }

    #[test]
    fn test_thinking_first_wins() {
        let draft = MessageDraft::new("m1", Role::Assistant, ts(1))
            .with_block(Block::Thinking("first".to_string()))
            .with_block(Block::Thinking("second".to_string()));

        let message = reconstruct(draft, &ReconstructPolicy::default());
        assert_eq!(message.thinking.as_deref(), Some("first"));
    }

    #[test]
    fn test_thinking_last_wins() {
        let draft = MessageDraft::new("m1", Role::Assistant, ts(1))
            .with_block(Block::Thinking("first".to_string()))
            .with_block(Block::Thinking("second".to_string()));
        let policy = ReconstructPolicy { thinking: ThinkingPolicy::LastWins, ..Default::default() };

        let message = reconstruct(draft, &policy);
        assert_eq!(message.thinking.as_deref(), Some("second"));
    }

    #[test]
    fn test_tool_calls_only_on_assistant() {
        let draft = MessageDraft::new("m1", Role::User, ts(1)).with_block(Block::ToolUse(call("t1")));
        let message = reconstruct(draft, &ReconstructPolicy::default());
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_results_respect_role_policy() {
        let draft = || {
            MessageDraft::new("m1", Role::Assistant, ts(1)).with_block(Block::ToolResult(result("t1")))
        };

        let strict = reconstruct(draft(), &ReconstructPolicy::default());
        assert!(strict.tool_results.is_empty());

        let policy = ReconstructPolicy { tool_results_on_any_role: true, ..Default::default() };
        let relaxed = reconstruct(draft(), &policy);
        assert_eq!(relaxed.tool_results, vec![result("t1")]);
    }

    #[test]
    fn test_duplicate_with_more_blocks_replaces_in_place() {
        let mut assembler = MessageAssembler::new(ReconstructPolicy::default());
        assembler.push(
            MessageDraft::new("a", Role::Assistant, ts(1)).with_block(Block::Text("partial".into())),
        );
        assembler.push(MessageDraft::new("b", Role::User, ts(2)).with_block(Block::Text("next".into())));
        assembler.push(
            MessageDraft::new("a", Role::Assistant, ts(1))
                .with_block(Block::Text("complete".into()))
                .with_block(Block::ToolUse(call("t1"))),
        );

        let messages = assembler.finish();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "a");
        assert_eq!(messages[0].text_content, "complete");
        assert_eq!(messages[0].tool_calls.len(), 1);
        assert_eq!(messages[1].id, "b");
    }

    #[test]
    fn test_duplicate_with_equal_or_fewer_blocks_is_ignored() {
        let mut assembler = MessageAssembler::new(ReconstructPolicy::default());
        assembler.push(
            MessageDraft::new("a", Role::Assistant, ts(1))
                .with_block(Block::Text("first".into()))
                .with_block(Block::Text("kept".into())),
        );
        assembler.push(
            MessageDraft::new("a", Role::Assistant, ts(1))
                .with_block(Block::Text("same".into()))
                .with_block(Block::Text("size".into())),
        );
        assembler.push(
            MessageDraft::new("a", Role::Assistant, ts(1)).with_block(Block::Text("smaller".into())),
        );

        let messages = assembler.finish();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text_content, "first\n\nkept");
    }

    #[test]
    fn test_unmapped_native_blocks_count_toward_completeness() {
        let mut assembler = MessageAssembler::new(ReconstructPolicy::default());
        assembler.push(
            MessageDraft::new("a", Role::Assistant, ts(1)).with_block(Block::Text("v1".into())),
        );
        let mut revised = MessageDraft::new("a", Role::Assistant, ts(1));
        revised.push_native(Some(Block::Text("v2".into())));
        revised.push_native(None);
        assembler.push(revised);

        assert_eq!(assembler.finish()[0].text_content, "v2");
    }

    #[test]
    fn test_timestamp_or_previous() {
        let mut assembler = MessageAssembler::new(ReconstructPolicy::default());
        assert_eq!(assembler.timestamp_or_previous(None), DateTime::<Utc>::UNIX_EPOCH);

        assembler.push(MessageDraft::new("a", Role::User, ts(10)));
        assert_eq!(assembler.timestamp_or_previous(None), ts(10));
        assert_eq!(assembler.timestamp_or_previous(Some(ts(20))), ts(20));
    }

    #[test]
    fn test_flatten_tool_output() {
        assert_eq!(flatten_tool_output(&json!("plain")), "plain");
        assert_eq!(
            flatten_tool_output(&json!([
                {"type": "text", "text": "line 1"},
                {"type": "image", "source": {}},
                {"type": "text", "text": "line 2"}
            ])),
            "line 1\nline 2"
        );
        assert_eq!(flatten_tool_output(&json!(null)), "");
    }
}
