use crate::infra::{catalog_repository, file_storage};
use clap::Args;
use curriculum::catalog::{standard_curriculum, UnitOfWork, UploaderId};
use curriculum::classifier::RuleTable;
use curriculum::config::AppConfig;
use curriculum::error::AppError;
use curriculum::import::{BulkImporter, ImportDecision, ImportOptions, ImportReport};
use curriculum::telemetry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Directory holding the PDF files to import
    #[arg(long)]
    pub(crate) pdf_dir: PathBuf,
    /// Report what would be imported without writing anything
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Identity recorded as uploader (defaults to APP_IMPORT_UPLOADER)
    #[arg(long)]
    pub(crate) uploaded_by: Option<String>,
    /// JSON rule table replacing the configured one
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Create every rule's subject and link it to all grades of its level first
    #[arg(long)]
    pub(crate) provision_subjects: bool,
    /// Write per-file decisions to this CSV file
    #[arg(long)]
    pub(crate) report_csv: Option<PathBuf>,
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let ImportArgs {
        pdf_dir,
        dry_run,
        uploaded_by,
        rules,
        provision_subjects,
        report_csv,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let rules = match rules {
        Some(path) => RuleTable::from_path(path)?,
        None => config.import.rule_table()?,
    };
    let uploaded_by = uploaded_by
        .map(UploaderId)
        .unwrap_or_else(|| config.import.uploader.clone());

    let importer = BulkImporter::new(
        Arc::new(catalog_repository(&config)),
        Arc::new(file_storage(&config)),
        &rules,
    );
    let report = importer.run(&ImportOptions {
        source_dir: pdf_dir,
        dry_run,
        uploaded_by,
        provision_subjects,
    })?;

    render_import_report(&report);
    if let Some(path) = report_csv {
        report.write_csv_path(&path)?;
        info!(path = %path.display(), "wrote import report");
    }
    Ok(())
}

pub(crate) fn run_seed() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let repository = catalog_repository(&config);
    let mut work = UnitOfWork::begin(&repository)?;
    let summary = standard_curriculum(work.catalog_mut())?;
    if summary.is_empty() {
        work.rollback();
        println!("Curriculum already seeded; nothing to create");
        return Ok(());
    }
    work.commit()?;

    println!("Seeded curriculum into {}", config.storage.data_path.display());
    println!(
        "- {} resource types | {} categories | {} levels | {} grades | {} pathways",
        summary.resource_types,
        summary.categories,
        summary.levels,
        summary.grades,
        summary.pathways
    );
    Ok(())
}

fn render_import_report(report: &ImportReport) {
    if report.dry_run {
        println!("Bulk import (dry run, nothing will be written)");
    } else {
        println!("Bulk import");
    }
    if report.outcomes.is_empty() {
        println!("No PDF files found");
        return;
    }

    if let Some(provisioned) = &report.provisioned {
        println!(
            "- provisioned {} subjects, {} grade links",
            provisioned.subjects_created, provisioned.links_added
        );
    }
    for outcome in &report.outcomes {
        let target = match (&outcome.subject, &outcome.grade) {
            (Some(subject), Some(grade)) => format!("{subject} / {grade}"),
            (Some(subject), None) => subject.clone(),
            _ => "-".to_string(),
        };
        match &outcome.detail {
            Some(detail) => println!(
                "  - {}: {} [{}] ({})",
                outcome.file_name,
                outcome.decision.label(),
                target,
                detail
            ),
            None => println!(
                "  - {}: {} [{}]",
                outcome.file_name,
                outcome.decision.label(),
                target
            ),
        }
    }

    if !report.issues.is_empty() {
        println!("Configuration issues:");
        for issue in &report.issues {
            println!("  - {issue}");
        }
    }

    let verb = if report.dry_run { "would import" } else { "imported" };
    println!(
        "Summary: {} {verb}, {} skipped ({} duplicates)",
        report.imported(),
        report.skipped(),
        report.count(ImportDecision::SkippedDuplicate)
    );
}
