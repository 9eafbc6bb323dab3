//! Curriculum taxonomy: education levels, grades, subject categories, subjects, pathways,
//! resource types, and the resources attached to them.

pub mod domain;
pub mod model;
pub mod repository;
mod search;
pub mod seed;
pub mod service;
mod stats;

pub use domain::{
    CategoryId, CategoryUpdate, EducationLevel, Grade, GradeId, GradeUpdate, LevelId, LevelUpdate,
    Lookup, NewCategory, NewGrade, NewLevel, NewPathway, NewResource, NewResourceType, NewSubject,
    Pathway, PathwayId, PathwayUpdate, Resource, ResourceId, ResourceType, ResourceTypeId,
    ResourceTypeUpdate, ResourceUpdate, Subject, SubjectCategory, SubjectId, SubjectUpdate,
    UploaderId,
};
pub use model::{Catalog, CatalogError};
pub use repository::{
    CatalogRepository, InMemoryCatalogRepository, JsonCatalogRepository, RepositoryError,
    UnitOfWork,
};
pub use search::{SearchResults, SEARCH_LIMIT};
pub use seed::{standard_curriculum, SeedSummary};
pub use service::CatalogService;
pub use stats::{CatalogStats, ResourceSummary, STATS_TOP};
