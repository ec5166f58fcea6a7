//! Shared parsing machinery for provider log formats
//!
//! # Error Handling Strategy
//!
//! Provider logs are foreign files that the originating CLI may still be writing, so parsing
//! degrades instead of failing:
//!
//! - **Individual line failures**: malformed or truncated JSON lines are logged at debug level
//!   and skipped ([`jsonl::JsonLines`]); the rest of the file is still processed.
//! - **Unusable fields**: timestamps that cannot be interpreted become `None`
//!   ([`deserializers`]) rather than discarding the record.
//! - **Partial records**: repeated writes of the same message are resolved by
//!   [`reconstruct::MessageAssembler`], never reported as errors.
//!
//! File-level failures (unreadable files, missing directories) are returned as
//! `anyhow::Result` to the provider, which decides whether to skip the file or fail the scan.

pub mod deserializers;
pub mod jsonl;
pub mod reconstruct;
pub mod text;

pub use jsonl::{json_lines, read_log_file};
pub use reconstruct::{Block, MessageAssembler, MessageDraft, ReconstructPolicy, ThinkingPolicy};
