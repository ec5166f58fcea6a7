use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Identifies one supported AI coding CLI and its on-disk log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    Codex,
    Code,
    OpenCode,
}

impl ProviderId {
    /// All providers in tab-display order
    pub const ALL: [ProviderId; 4] =
        [ProviderId::Claude, ProviderId::Codex, ProviderId::Code, ProviderId::OpenCode];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Claude => "claude",
            ProviderId::Codex => "codex",
            ProviderId::Code => "code",
            ProviderId::OpenCode => "opencode",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Claude => "Claude Code",
            ProviderId::Codex => "Codex",
            ProviderId::Code => "Code",
            ProviderId::OpenCode => "OpenCode",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProviderId::Claude => "Anthropic Claude Code CLI",
            ProviderId::Codex => "OpenAI Codex CLI",
            ProviderId::Code => "just-every/code CLI",
            ProviderId::OpenCode => "OpenCode AI CLI",
        }
    }

    /// Single-letter badge shown next to unified projects
    pub fn icon(&self) -> &'static str {
        match self {
            ProviderId::Claude => "C",
            ProviderId::Codex => "X",
            ProviderId::Code => "J",
            ProviderId::OpenCode => "O",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ProviderId::ALL.iter().find(|id| id.as_str() == s) {
            Some(id) => Ok(*id),
            None => bail!("Unknown provider '{}' (expected one of: claude, codex, code, opencode)", s),
        }
    }
}

/// Availability status of one registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub base_dir: PathBuf,
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parses_known_ids() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
    }

    #[test]
    fn test_provider_id_rejects_unknown() {
        let err = "gemini".parse::<ProviderId>().unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn test_provider_id_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProviderId::OpenCode).unwrap(), r#""opencode""#);
    }
}
