//! Agent Log Viewer - Browse the local conversation history of AI coding CLIs
//!
//! This library reads the on-disk logs of several coding assistants and normalizes them into
//! one data model. It supports:
//!
//! - Claude Code (`~/.claude/projects/<encoded-path>/<session>.jsonl`)
//! - Codex and Code rollouts (`~/.codex/sessions/YYYY/MM/DD/rollout-*.jsonl`)
//! - OpenCode's structured store (`~/.local/share/opencode/storage/`)
//! - A unified project view that merges providers by working directory
//!
//! Everything is read fresh from disk on each call; nothing is cached or written.
//!
//! # Example
//!
//! ```no_run
//! use agent_log_viewer::ProviderRegistry;
//!
//! let registry = ProviderRegistry::from_env()?;
//! for project in registry.unified_projects() {
//!     println!("{} ({} sessions)", project.path, project.total_sessions);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod models;
pub mod parsers;
pub mod providers;
pub mod registry;
pub mod utils;

// Re-export commonly used types
pub use models::{Message, Project, ProviderId, ProviderInfo, Session, UnifiedProject};
pub use providers::{Provider, ScanOutcome};
pub use registry::ProviderRegistry;
pub use utils::ProviderRoots;
pub use utils::paths::{decode_path, encode_path, format_path_with_tilde};
