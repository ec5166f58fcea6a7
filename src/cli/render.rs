//! Plain-text rendering of listings for the terminal

use std::fmt::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::models::{Message, Project, ProviderInfo, Session, UnifiedProject};
use crate::utils::format_path_with_tilde;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn time(ts: &DateTime<Utc>) -> String {
    ts.format(TIME_FORMAT).to_string()
}

fn tilde(path: &str) -> String {
    format_path_with_tilde(Path::new(path))
}

pub fn providers(infos: &[ProviderInfo]) -> String {
    let mut out = String::new();
    for info in infos {
        let status = if info.available { "available" } else { "not found" };
        let _ = writeln!(
            out,
            "[{}] {:<10} {:<12} {:<10} {}",
            info.icon,
            info.id.as_str(),
            info.name,
            status,
            format_path_with_tilde(&info.base_dir)
        );
    }
    out
}

pub fn unified_projects(projects: &[UnifiedProject]) -> String {
    if projects.is_empty() {
        return "No projects found\n".to_string();
    }

    let mut out = String::new();
    for project in projects {
        let badges: Vec<String> = project
            .providers
            .iter()
            .map(|p| format!("{}:{}", p.provider_icon, p.session_count))
            .collect();
        let _ = writeln!(
            out,
            "{}  {:>4} sessions  [{}]  {}",
            time(&project.last_modified),
            project.total_sessions,
            badges.join(" "),
            tilde(&project.path)
        );
    }
    out
}

pub fn projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found\n".to_string();
    }

    let mut out = String::new();
    for project in projects {
        let _ = writeln!(
            out,
            "{}  {:>4} sessions  {}  ({})",
            time(&project.last_modified),
            project.session_count,
            tilde(&project.path),
            project.id
        );
    }
    out
}

pub fn sessions(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No sessions found\n".to_string();
    }

    let mut out = String::new();
    for session in sessions {
        let _ = writeln!(
            out,
            "{}  {:>4} msgs  {}  ({})",
            time(&session.last_modified),
            session.message_count,
            session.title,
            session.id
        );
        if let Some(branch) = &session.git_branch {
            let _ = writeln!(out, "    branch: {}", branch);
        }
    }
    out
}

/// Conversation transcript; thinking is only shown when `show_thinking` is set
pub fn messages(messages: &[Message], show_thinking: bool) -> String {
    if messages.is_empty() {
        return "No messages found\n".to_string();
    }

    let mut out = String::new();
    for message in messages {
        let _ = writeln!(out, "--- {} [{}] ---", message.role.as_str(), time(&message.timestamp));

        if show_thinking && let Some(thinking) = &message.thinking {
            let _ = writeln!(out, "(thinking) {}", thinking);
        }
        if !message.text_content.is_empty() {
            let _ = writeln!(out, "{}", message.text_content);
        }
        for call in &message.tool_calls {
            let _ = writeln!(out, "> tool {} ({}): {}", call.name, call.id, call.input);
        }
        for result in &message.tool_results {
            let marker = if result.is_error { "error" } else { "result" };
            let _ = writeln!(
                out,
                "< {} {}: {}",
                marker,
                result.tool_call_id,
                result.display_content()
            );
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Role, ToolCall, ToolResult};

    fn message(role: Role) -> Message {
        Message {
            id: "m1".to_string(),
            role,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            text_content: String::new(),
            thinking: None,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            metadata: None,
        }
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(projects(&[]), "No projects found\n");
        assert_eq!(sessions(&[]), "No sessions found\n");
        assert_eq!(messages(&[], false), "No messages found\n");
    }

    #[test]
    fn test_thinking_hidden_by_default() {
        let mut reply = message(Role::Assistant);
        reply.text_content = "answer".to_string();
        reply.thinking = Some("secret plan".to_string());

        assert!(!messages(std::slice::from_ref(&reply), false).contains("secret plan"));
        assert!(messages(&[reply], true).contains("(thinking) secret plan"));
    }

    #[test]
    fn test_tool_output_is_truncated_for_display() {
        let mut reply = message(Role::Assistant);
        reply.tool_calls.push(ToolCall {
            id: "t1".to_string(),
            name: "Bash".to_string(),
            input: json!({"cmd": "cat big"}),
        });
        let mut result = message(Role::User);
        result.tool_results.push(ToolResult {
            tool_call_id: "t1".to_string(),
            content: "x".repeat(1500),
            is_error: false,
        });

        let rendered = messages(&[reply, result], false);
        assert!(rendered.contains("> tool Bash (t1)"));
        assert!(rendered.contains(&format!("< result t1: {}...", "x".repeat(1000))));
        assert!(!rendered.contains(&"x".repeat(1001)));
    }
}
