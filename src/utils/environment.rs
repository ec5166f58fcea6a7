//! Storage root resolution for each provider

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::ProviderId;

/// Root directory of each provider's on-disk history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRoots {
    pub claude: PathBuf,
    pub codex: PathBuf,
    pub code: PathBuf,
    pub opencode: PathBuf,
}

impl ProviderRoots {
    /// Historical default locations under `home`
    pub fn under_home(home: &Path) -> Self {
        Self {
            claude: home.join(".claude"),
            codex: home.join(".codex"),
            code: home.join(".code"),
            opencode: home.join(".local").join("share").join("opencode"),
        }
    }

    /// Defaults for the current user, with environment overrides applied
    ///
    /// Overrides: `CLAUDE_CONFIG_DIR`, `CODEX_HOME`, `CODE_HOME`, and `XDG_DATA_HOME`
    /// (OpenCode data lives in `$XDG_DATA_HOME/opencode`).
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::under_home(&home).with_overrides(|key| env::var(key).ok()))
    }

    /// Applies overrides looked up through `var` (empty values are ignored)
    pub fn with_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| var(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        if let Some(dir) = lookup("CLAUDE_CONFIG_DIR") {
            self.claude = dir;
        }
        if let Some(dir) = lookup("CODEX_HOME") {
            self.codex = dir;
        }
        if let Some(dir) = lookup("CODE_HOME") {
            self.code = dir;
        }
        if let Some(dir) = lookup("XDG_DATA_HOME") {
            self.opencode = dir.join("opencode");
        }
        self
    }

    pub fn get(&self, id: ProviderId) -> &Path {
        match id {
            ProviderId::Claude => &self.claude,
            ProviderId::Codex => &self.codex,
            ProviderId::Code => &self.code,
            ProviderId::OpenCode => &self.opencode,
        }
    }

    pub fn set(&mut self, id: ProviderId, root: PathBuf) {
        match id {
            ProviderId::Claude => self.claude = root,
            ProviderId::Codex => self.codex = root,
            ProviderId::Code => self.code = root,
            ProviderId::OpenCode => self.opencode = root,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_under_home_defaults() {
        let roots = ProviderRoots::under_home(Path::new("/Users/testuser"));
        assert_eq!(roots.claude, PathBuf::from("/Users/testuser/.claude"));
        assert_eq!(roots.codex, PathBuf::from("/Users/testuser/.codex"));
        assert_eq!(roots.code, PathBuf::from("/Users/testuser/.code"));
        assert_eq!(roots.opencode, PathBuf::from("/Users/testuser/.local/share/opencode"));
    }

    #[test]
    fn test_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CLAUDE_CONFIG_DIR", "/cfg/claude"),
            ("CODEX_HOME", "/cfg/codex"),
            ("XDG_DATA_HOME", "/xdg"),
            ("CODE_HOME", "  "),
        ]);

        let roots = ProviderRoots::under_home(Path::new("/home/u"))
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(roots.claude, PathBuf::from("/cfg/claude"));
        assert_eq!(roots.codex, PathBuf::from("/cfg/codex"));
        assert_eq!(roots.code, PathBuf::from("/home/u/.code"));
        assert_eq!(roots.opencode, PathBuf::from("/xdg/opencode"));
    }

    #[test]
    fn test_get_and_set_by_provider() {
        let mut roots = ProviderRoots::under_home(Path::new("/home/u"));
        roots.set(ProviderId::Code, PathBuf::from("/elsewhere"));
        assert_eq!(roots.get(ProviderId::Code), Path::new("/elsewhere"));
        assert_eq!(roots.get(ProviderId::Claude), Path::new("/home/u/.claude"));
    }
}
