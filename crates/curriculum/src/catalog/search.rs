use serde::Serialize;

use super::domain::{EducationLevel, Grade, Resource, ResourceTypeId, Subject};
use super::model::Catalog;

/// Maximum hits returned per entity kind.
pub const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub resources: Vec<Resource>,
    pub subjects: Vec<Subject>,
    pub grades: Vec<Grade>,
    pub levels: Vec<EducationLevel>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
            && self.subjects.is_empty()
            && self.grades.is_empty()
            && self.levels.is_empty()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Catalog {
    /// Case-insensitive substring search over names, titles and descriptions.
    ///
    /// A blank query returns nothing. Only active resources are considered, optionally narrowed
    /// to a single resource type.
    pub fn search(&self, query: &str, resource_type: Option<ResourceTypeId>) -> SearchResults {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return SearchResults::default();
        }

        let resources = self
            .resources()
            .filter(|resource| resource.is_active)
            .filter(|resource| resource_type.map_or(true, |kind| resource.resource_type == kind))
            .filter(|resource| {
                contains_ignore_case(&resource.title, &needle)
                    || contains_ignore_case(&resource.description, &needle)
            })
            .take(SEARCH_LIMIT)
            .cloned()
            .collect();

        let subjects = self
            .categories()
            .into_iter()
            .flat_map(|category| self.subjects_of_category(category.id))
            .filter(|subject| {
                contains_ignore_case(&subject.name, &needle)
                    || contains_ignore_case(&subject.description, &needle)
            })
            .take(SEARCH_LIMIT)
            .cloned()
            .collect();

        let grades = self
            .levels()
            .into_iter()
            .flat_map(|level| self.grades_of_level(level.id))
            .filter(|grade| {
                contains_ignore_case(&grade.name, &needle)
                    || contains_ignore_case(&grade.description, &needle)
            })
            .take(SEARCH_LIMIT)
            .cloned()
            .collect();

        let levels = self
            .levels()
            .into_iter()
            .filter(|level| {
                contains_ignore_case(&level.name, &needle)
                    || contains_ignore_case(&level.description, &needle)
            })
            .take(SEARCH_LIMIT)
            .cloned()
            .collect();

        SearchResults {
            resources,
            subjects,
            grades,
            levels,
        }
    }
}
