use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use super::render;
use crate::models::ProviderId;
use crate::providers::Provider;
use crate::registry::ProviderRegistry;
use crate::utils::ProviderRoots;

#[derive(Parser)]
#[command(name = "agent-log-viewer")]
#[command(version = "0.1.0")]
#[command(about = "Browse local conversation logs of AI coding CLIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log skipped records and files to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Claude Code history root (default: $CLAUDE_CONFIG_DIR or ~/.claude)
    #[arg(long, global = true, value_name = "DIR")]
    pub claude_dir: Option<PathBuf>,

    /// Codex history root (default: $CODEX_HOME or ~/.codex)
    #[arg(long, global = true, value_name = "DIR")]
    pub codex_dir: Option<PathBuf>,

    /// Code history root (default: $CODE_HOME or ~/.code)
    #[arg(long, global = true, value_name = "DIR")]
    pub code_dir: Option<PathBuf>,

    /// OpenCode data root (default: $XDG_DATA_HOME/opencode or ~/.local/share/opencode)
    #[arg(long, global = true, value_name = "DIR")]
    pub opencode_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported providers and whether their history was found
    Providers,
    /// List projects, merged across providers unless one is given
    Projects {
        #[arg(long)]
        provider: Option<ProviderId>,
    },
    /// List the sessions of one project
    Sessions { provider: ProviderId, project_id: String },
    /// Show the messages of one session
    Messages {
        provider: ProviderId,
        project_id: String,
        session_id: String,
        /// Include thinking blocks
        #[arg(long)]
        thinking: bool,
    },
}

impl Cli {
    /// Provider roots from the environment, with command-line overrides applied
    fn roots(&self) -> Result<ProviderRoots> {
        let overrides = [
            (ProviderId::Claude, &self.claude_dir),
            (ProviderId::Codex, &self.codex_dir),
            (ProviderId::Code, &self.code_dir),
            (ProviderId::OpenCode, &self.opencode_dir),
        ];

        // A home directory is only needed when some root is left to its default
        let mut roots = if overrides.iter().all(|(_, dir)| dir.is_some()) {
            ProviderRoots::under_home(&PathBuf::new())
        } else {
            ProviderRoots::from_env()?
        };
        for (id, dir) in overrides {
            if let Some(dir) = dir {
                roots.set(id, dir.clone());
            }
        }
        Ok(roots)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let registry = ProviderRegistry::with_roots(&cli.roots()?);

    match &cli.command {
        Some(Commands::Providers) => {
            let infos = registry.available_providers();
            emit(cli.json, &infos, render::providers)?;
        }
        Some(Commands::Projects { provider: None }) => {
            let projects = registry.unified_projects();
            emit(cli.json, &projects, render::unified_projects)?;
        }
        Some(Commands::Projects { provider: Some(id) }) => {
            let projects = lookup(&registry, *id)?.list_projects().into_items();
            emit(cli.json, &projects, render::projects)?;
        }
        Some(Commands::Sessions { provider, project_id }) => {
            let sessions = lookup(&registry, *provider)?.list_sessions(project_id).into_items();
            emit(cli.json, &sessions, render::sessions)?;
        }
        Some(Commands::Messages { provider, project_id, session_id, thinking }) => {
            let messages =
                lookup(&registry, *provider)?.list_messages(project_id, session_id).into_items();
            emit(cli.json, &messages, |m| render::messages(m, *thinking))?;
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn lookup(registry: &ProviderRegistry, id: ProviderId) -> Result<&dyn Provider> {
    registry.get(id).with_context(|| format!("Provider not registered: {}", id))
}

fn emit<T, F>(json: bool, items: &[T], text: F) -> Result<()>
where
    T: Serialize,
    F: Fn(&[T]) -> String,
{
    if json {
        let out = serde_json::to_string_pretty(items).context("Failed to serialize output")?;
        println!("{}", out);
    } else {
        print!("{}", text(items));
    }
    Ok(())
}
