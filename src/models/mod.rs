//! Data models shared by every provider.
//!
//! All types are immutable values rebuilt from disk on every query:
//!
//! - [`Project`] / [`UnifiedProject`] - working directories, per provider and merged by path
//! - [`Session`] - one conversation thread
//! - [`Message`] - one normalized message with tool calls, tool results and thinking
//! - [`ProviderId`] / [`ProviderInfo`] - provider identity and availability
//!
//! Types serialize with camelCase field names for `--json` output.

pub mod message;
pub mod project;
pub mod provider;
pub mod session;

pub use message::{Message, MessageMetadata, Role, TokenUsage, ToolCall, ToolResult};
pub use project::{Project, ProviderProjectSummary, UnifiedProject};
pub use provider::{ProviderId, ProviderInfo};
pub use session::Session;
