use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id!(
    /// Identifier wrapper for education levels.
    LevelId
);
catalog_id!(
    /// Identifier wrapper for grades.
    GradeId
);
catalog_id!(
    /// Identifier wrapper for subject categories.
    CategoryId
);
catalog_id!(
    /// Identifier wrapper for subjects.
    SubjectId
);
catalog_id!(
    /// Identifier wrapper for senior-level pathways.
    PathwayId
);
catalog_id!(
    /// Identifier wrapper for resource types.
    ResourceTypeId
);
catalog_id!(
    /// Identifier wrapper for uploaded resources.
    ResourceId
);

/// Identity of the actor that uploaded a resource, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploaderId(pub String);

pub const DEFAULT_LEVEL_ICON: &str = "fas fa-graduation-cap";
pub const DEFAULT_CATEGORY_ICON: &str = "fas fa-book";
pub const DEFAULT_RESOURCE_TYPE_ICON: &str = "fas fa-file";

/// Top tier of the curriculum hierarchy (Pre-Primary, Junior Secondary, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationLevel {
    pub id: LevelId,
    pub name: String,
    pub order: u32,
    pub description: String,
    pub icon: String,
}

/// A year or stage within an education level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub id: GradeId,
    pub name: String,
    pub education_level: LevelId,
    pub order: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCategory {
    pub id: CategoryId,
    pub name: String,
    pub icon: String,
    pub description: String,
}

/// A teachable course. The same subject may be linked to grades across several levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub category: CategoryId,
    pub grades: BTreeSet<GradeId>,
    pub description: String,
}

impl Subject {
    pub fn is_linked_to(&self, grade: GradeId) -> bool {
        self.grades.contains(&grade)
    }
}

/// Elective track bundling subjects for a single (senior) grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    pub id: PathwayId,
    pub name: String,
    pub grade: GradeId,
    pub subjects: BTreeSet<SubjectId>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: ResourceTypeId,
    pub name: String,
    pub icon: String,
    pub description: String,
}

/// An uploaded learning artifact attached to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    pub subject: SubjectId,
    pub resource_type: ResourceTypeId,
    pub uploaded_by: UploaderId,
    pub uploaded_at: DateTime<Utc>,
    pub file_path: String,
    pub file_url: String,
    pub file_size: u64,
    pub description: String,
    pub allow_download: bool,
    pub is_premium: bool,
    pub is_active: bool,
    pub download_count: u64,
    pub view_count: u64,
}

impl Resource {
    /// Upper-cased extension of the stored file, empty when the file has none.
    pub fn file_extension(&self) -> String {
        std::path::Path::new(&self.file_path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_uppercase())
            .unwrap_or_default()
    }
}

/// Outcome of a get-or-create lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Created(T),
}

impl<T> Lookup<T> {
    pub fn was_created(&self) -> bool {
        matches!(self, Lookup::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Lookup::Found(value) | Lookup::Created(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Lookup::Found(value) | Lookup::Created(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLevel {
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGrade {
    pub name: String,
    pub education_level: LevelId,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub category: CategoryId,
    #[serde(default)]
    pub grades: Vec<GradeId>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResourceType {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPathway {
    pub name: String,
    pub grade: GradeId,
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
    #[serde(default)]
    pub description: String,
}

/// Resource row about to be inserted; the catalog assigns id, timestamp, and counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub title: String,
    pub subject: SubjectId,
    pub resource_type: ResourceTypeId,
    pub uploaded_by: UploaderId,
    pub file_path: String,
    pub file_url: String,
    pub file_size: u64,
    pub description: String,
    pub allow_download: bool,
    pub is_premium: bool,
}

/// Partial edit of an education level; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelUpdate {
    pub name: Option<String>,
    pub order: Option<u32>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeUpdate {
    pub name: Option<String>,
    pub education_level: Option<LevelId>,
    pub order: Option<u32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// `grades`, when present, replaces the whole set of linked grades.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub category: Option<CategoryId>,
    pub grades: Option<Vec<GradeId>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTypeUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// `subjects`, when present, replaces the pathway's subject bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayUpdate {
    pub name: Option<String>,
    pub grade: Option<GradeId>,
    pub subjects: Option<Vec<SubjectId>>,
    pub description: Option<String>,
}

/// Metadata edit of an uploaded resource. The stored file never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subject: Option<SubjectId>,
    pub resource_type: Option<ResourceTypeId>,
    pub allow_download: Option<bool>,
    pub is_premium: Option<bool>,
}
