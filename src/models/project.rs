use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ProviderId;

/// One provider's view of a working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub provider_id: ProviderId,
    pub path: String,
    pub name: String,
    pub session_count: usize,
    pub last_modified: DateTime<Utc>,
}

/// Per-provider contribution to a [`UnifiedProject`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProjectSummary {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub provider_icon: String,
    pub project_id: String,
    pub session_count: usize,
}

/// Same-path projects from several providers merged into one display row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedProject {
    pub path: String,
    pub name: String,
    pub total_sessions: usize,
    pub last_modified: DateTime<Utc>,
    pub providers: Vec<ProviderProjectSummary>,
}
