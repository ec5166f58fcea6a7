//! Fixed set of providers and the cross-provider views built on them
//!
//! # Error Handling Strategy
//!
//! Fan-out calls never fail as a whole. Each provider runs behind its own panic boundary:
//!
//! - A provider whose availability probe panics is reported unavailable.
//! - A provider whose project listing fails or panics contributes no projects; the other
//!   providers' results are still returned.
//!
//! Failures are logged (`warn!` by the provider layer, `error!` for panics) and never surfaced.

pub mod unified;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;
use tracing::error;

use crate::models::{ProviderId, ProviderInfo, UnifiedProject};
use crate::providers::{ClaudeProvider, CodexProvider, OpenCodeProvider, Provider};
use crate::utils::ProviderRoots;

pub use unified::unify;

/// Registered providers in tab-display order
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl ProviderRegistry {
    /// Registry over an explicit provider list, kept in the given order
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Self {
        Self { providers }
    }

    /// The standard providers (`claude`, `codex`, `code`, `opencode`) rooted at `roots`
    pub fn with_roots(roots: &ProviderRoots) -> Self {
        Self::new(ProviderId::ALL.iter().map(|&id| provider_at(id, roots.get(id))).collect())
    }

    /// Standard providers at their default or environment-configured roots
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_roots(&ProviderRoots::from_env()?))
    }

    pub fn get(&self, id: ProviderId) -> Option<&dyn Provider> {
        self.providers.iter().find(|p| p.id() == id).map(|p| p.as_ref())
    }

    /// Status of every registered provider, probed in parallel, in registration order
    pub fn available_providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .par_iter()
            .map(|provider| {
                isolate(provider.id(), "availability probe", || provider.info())
                    .unwrap_or_else(|| fallback_info(provider.as_ref()))
            })
            .collect()
    }

    /// Projects of every available provider, grouped by working-directory path
    pub fn unified_projects(&self) -> Vec<UnifiedProject> {
        let per_provider = self
            .providers
            .par_iter()
            .map(|provider| {
                isolate(provider.id(), "project listing", || {
                    if provider.is_available() {
                        provider.list_projects().into_items()
                    } else {
                        Vec::new()
                    }
                })
                .unwrap_or_default()
            })
            .collect();

        unify(per_provider)
    }
}

/// Description of a provider that could not be probed
fn fallback_info(provider: &dyn Provider) -> ProviderInfo {
    let id = provider.id();
    ProviderInfo {
        id,
        name: id.display_name().to_string(),
        description: id.description().to_string(),
        icon: id.icon().to_string(),
        base_dir: provider.root().to_path_buf(),
        available: false,
    }
}

fn provider_at(id: ProviderId, root: &Path) -> Box<dyn Provider> {
    match id {
        ProviderId::Claude => Box::new(ClaudeProvider::new(root)),
        ProviderId::Codex | ProviderId::Code => Box::new(CodexProvider::new(id, root)),
        ProviderId::OpenCode => Box::new(OpenCodeProvider::new(root)),
    }
}

/// Runs `f`, turning a panic into `None`
fn isolate<T, F>(provider: ProviderId, what: &str, f: F) -> Option<T>
where
    F: FnOnce() -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(provider = %provider, reason = %reason, "{} panicked", what);
            None
        }
    }
}
