//! Filename heuristics that place bulk-imported files onto the curriculum taxonomy.

mod category;
mod matcher;
pub mod rules;
mod title;

pub use category::{classify_category, OTHER_CATEGORY};
pub use matcher::{
    Classification, Classifier, ConfigurationIssue, Placement, ProvisionSummary, DEFAULT_STORAGE_PREFIX,
    DEFAULT_SUBJECT, DEFAULT_SUBJECT_DESCRIPTION,
};
pub use rules::{ClassificationRule, RuleError, RuleSpec, RuleTable};
pub use title::{title_from_filename, UNTITLED_DOCUMENT};
