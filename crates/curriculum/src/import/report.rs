use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::classifier::{ConfigurationIssue, Placement, ProvisionSummary};

/// Per-file decision taken by the bulk importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportDecision {
    Imported,
    WouldImport,
    SkippedDuplicate,
    SkippedError,
    /// Neither a rule nor the default subject could place the file.
    Unplaced,
}

impl ImportDecision {
    pub fn label(&self) -> &'static str {
        match self {
            ImportDecision::Imported => "imported",
            ImportDecision::WouldImport => "would import",
            ImportDecision::SkippedDuplicate => "skipped (duplicate)",
            ImportDecision::SkippedError => "skipped (error)",
            ImportDecision::Unplaced => "unplaced",
        }
    }

    pub fn counts_as_import(&self) -> bool {
        matches!(self, ImportDecision::Imported | ImportDecision::WouldImport)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub decision: ImportDecision,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub grade: Option<String>,
    pub storage_path: Option<String>,
    pub fallback: bool,
    pub detail: Option<String>,
}

impl FileOutcome {
    pub(crate) fn new(file_name: &str, decision: ImportDecision) -> Self {
        Self {
            file_name: file_name.to_string(),
            decision,
            title: None,
            subject: None,
            category: None,
            grade: None,
            storage_path: None,
            fallback: false,
            detail: None,
        }
    }

    pub(crate) fn placed(file_name: &str, decision: ImportDecision, placement: &Placement) -> Self {
        Self {
            title: Some(placement.title.clone()),
            subject: Some(placement.subject_name.clone()),
            category: Some(placement.category.clone()),
            grade: placement.grade_name.clone(),
            storage_path: Some(placement.storage_path.clone()),
            fallback: placement.is_fallback(),
            ..Self::new(file_name, decision)
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub(crate) fn with_storage_path(mut self, path: &str) -> Self {
        self.storage_path = Some(path.to_string());
        self
    }
}

/// Result of a bulk import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub committed: bool,
    pub outcomes: Vec<FileOutcome>,
    /// Distinct rule misconfigurations met during the run.
    pub issues: Vec<ConfigurationIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned: Option<ProvisionSummary>,
}

impl ImportReport {
    pub fn count(&self, decision: ImportDecision) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.decision == decision)
            .count()
    }

    /// Imported files, or files that would be imported in a dry run.
    pub fn imported(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.decision.counts_as_import())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.imported()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        for outcome in &self.outcomes {
            writer.serialize(outcome)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}
