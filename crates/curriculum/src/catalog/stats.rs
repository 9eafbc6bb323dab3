use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Resource, ResourceId};
use super::model::Catalog;

/// Length of each ranked list in [`CatalogStats`] unless the caller asks otherwise.
pub const STATS_TOP: usize = 5;

/// One row of a ranked resource list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    pub id: ResourceId,
    pub title: String,
    pub subject: String,
    pub uploaded_at: DateTime<Utc>,
    pub view_count: u64,
    pub download_count: u64,
}

/// Portal-wide counters. Resource figures cover active resources only; hidden ones are counted
/// separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub education_levels: usize,
    pub grades: usize,
    pub categories: usize,
    pub subjects: usize,
    pub pathways: usize,
    pub resource_types: usize,
    pub resources: usize,
    pub hidden_resources: usize,
    pub total_views: u64,
    pub total_downloads: u64,
    pub recent_uploads: Vec<ResourceSummary>,
    pub most_viewed: Vec<ResourceSummary>,
    pub most_downloaded: Vec<ResourceSummary>,
}

fn newest_first(a: &Resource, b: &Resource) -> Ordering {
    b.uploaded_at
        .cmp(&a.uploaded_at)
        .then_with(|| b.id.cmp(&a.id))
}

impl Catalog {
    pub fn stats(&self, top: usize) -> CatalogStats {
        let active: Vec<&Resource> = self.resources().filter(|r| r.is_active).collect();

        let ranked = |key: fn(&Resource) -> u64| -> Vec<ResourceSummary> {
            let mut sorted = active.clone();
            sorted.sort_by(|a, b| key(b).cmp(&key(a)).then_with(|| newest_first(a, b)));
            sorted
                .into_iter()
                .take(top)
                .map(|resource| self.summarize(resource))
                .collect()
        };

        CatalogStats {
            education_levels: self.levels().len(),
            grades: self.grades().count(),
            categories: self.categories().len(),
            subjects: self.subjects().count(),
            pathways: self.pathways().count(),
            resource_types: self.resource_types().len(),
            resources: active.len(),
            hidden_resources: self.resource_count() - active.len(),
            total_views: active.iter().map(|r| r.view_count).sum(),
            total_downloads: active.iter().map(|r| r.download_count).sum(),
            recent_uploads: ranked(|_| 0),
            most_viewed: ranked(|r| r.view_count),
            most_downloaded: ranked(|r| r.download_count),
        }
    }

    fn summarize(&self, resource: &Resource) -> ResourceSummary {
        ResourceSummary {
            id: resource.id,
            title: resource.title.clone(),
            subject: self
                .subject(resource.subject)
                .map(|subject| subject.name.clone())
                .unwrap_or_default(),
            uploaded_at: resource.uploaded_at,
            view_count: resource.view_count,
            download_count: resource.download_count,
        }
    }
}
