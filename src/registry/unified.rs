//! Cross-provider project grouping keyed by working-directory path

use std::collections::HashMap;

use crate::models::{Project, ProviderProjectSummary, UnifiedProject};

/// Merges per-provider project lists into one row per path
///
/// `per_provider` is in registration order, which is also the order of each row's provider
/// summaries. Paths are compared as exact strings: `/a` and `/a/` are different projects.
/// Rows are ordered by `last_modified`, newest first; ties keep first-seen order.
pub fn unify(per_provider: Vec<Vec<Project>>) -> Vec<UnifiedProject> {
    let mut rows: Vec<UnifiedProject> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();

    for project in per_provider.into_iter().flatten() {
        let summary = ProviderProjectSummary {
            provider_id: project.provider_id,
            provider_name: project.provider_id.display_name().to_string(),
            provider_icon: project.provider_id.icon().to_string(),
            project_id: project.id,
            session_count: project.session_count,
        };

        match by_path.get(&project.path) {
            Some(&idx) => {
                let row = &mut rows[idx];
                row.total_sessions += project.session_count;
                row.last_modified = row.last_modified.max(project.last_modified);
                row.providers.push(summary);
            }
            None => {
                by_path.insert(project.path.clone(), rows.len());
                rows.push(UnifiedProject {
                    path: project.path,
                    name: project.name,
                    total_sessions: project.session_count,
                    last_modified: project.last_modified,
                    providers: vec![summary],
                });
            }
        }
    }

    rows.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
    rows
}
