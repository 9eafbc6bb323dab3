//! Bulk PDF import: classify every file of a directory onto the catalog in one unit of work.

mod report;

pub use report::{FileOutcome, ImportDecision, ImportReport};

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{
    Catalog, CatalogError, CatalogRepository, NewResource, NewResourceType, RepositoryError,
    ResourceTypeId, UnitOfWork, UploaderId,
};
use crate::classifier::{Classifier, ConfigurationIssue, Placement, RuleTable};
use crate::resources::FileStorage;

pub const PDF_RESOURCE_TYPE: &str = "PDF";
pub const PDF_ICON: &str = "fas fa-file-pdf";
pub const PDF_DESCRIPTION: &str = "Portable Document Format files";

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub source_dir: PathBuf,
    pub dry_run: bool,
    pub uploaded_by: UploaderId,
    /// Create every rule's subject and link it to all grades of its level before importing.
    pub provision_subjects: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("import commit failed, no rows persisted and {removed} stored files removed: {source}")]
    Commit {
        removed: usize,
        #[source]
        source: RepositoryError,
    },
}

/// Runs a batch import against a repository and a file store.
pub struct BulkImporter<'a, R, S> {
    repository: Arc<R>,
    storage: Arc<S>,
    rules: &'a RuleTable,
}

impl<'a, R, S> BulkImporter<'a, R, S>
where
    R: CatalogRepository,
    S: FileStorage,
{
    pub fn new(repository: Arc<R>, storage: Arc<S>, rules: &'a RuleTable) -> Self {
        Self {
            repository,
            storage,
            rules,
        }
    }

    /// Classify and import every PDF in `options.source_dir`.
    ///
    /// Per-file failures are recorded and the batch continues. The catalog is committed once at
    /// the end; a dry run never commits and never writes to storage.
    pub fn run(&self, options: &ImportOptions) -> Result<ImportReport, ImportError> {
        let files = pdf_files(&options.source_dir)?;
        let mut report = ImportReport {
            dry_run: options.dry_run,
            ..ImportReport::default()
        };
        if files.is_empty() {
            warn!(dir = %options.source_dir.display(), "no PDF files found");
            return Ok(report);
        }
        info!(
            dir = %options.source_dir.display(),
            files = files.len(),
            dry_run = options.dry_run,
            "starting bulk import"
        );

        let mut work = UnitOfWork::begin(self.repository.as_ref())?;
        let classifier = Classifier::new(self.rules);
        let mut issues = BTreeSet::new();

        if options.provision_subjects {
            let summary = classifier.provision_subjects(work.catalog_mut())?;
            info!(
                subjects_created = summary.subjects_created,
                links_added = summary.links_added,
                "provisioned rule subjects"
            );
            issues.extend(summary.issues.iter().cloned());
            report.provisioned = Some(summary);
        }

        let pdf_type = work
            .catalog_mut()
            .find_or_create_resource_type(NewResourceType {
                name: PDF_RESOURCE_TYPE.to_string(),
                icon: Some(PDF_ICON.to_string()),
                description: PDF_DESCRIPTION.to_string(),
            })
            .get()
            .id;

        let mut stored = Vec::new();
        for path in &files {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let step = FileImport {
                classifier: &classifier,
                storage: self.storage.as_ref(),
                pdf_type,
                options,
                path,
                file_name: &file_name,
            };
            let outcome = step.run(work.catalog_mut(), &mut issues, &mut stored);
            report.outcomes.push(outcome);
        }
        report.issues = issues.into_iter().collect();

        if options.dry_run {
            work.rollback();
            info!(
                would_import = report.imported(),
                skipped = report.skipped(),
                "dry run complete; nothing persisted"
            );
            return Ok(report);
        }

        if let Err(source) = work.commit() {
            let removed = self.remove_stored(&stored);
            warn!(error = %source, removed, "import commit failed");
            return Err(ImportError::Commit { removed, source });
        }
        report.committed = true;
        info!(
            imported = report.imported(),
            skipped = report.skipped(),
            "bulk import committed"
        );
        Ok(report)
    }

    fn remove_stored(&self, paths: &[String]) -> usize {
        paths
            .iter()
            .filter(|path| match self.storage.delete(path) {
                Ok(()) => true,
                Err(error) => {
                    warn!(path = path.as_str(), %error, "failed to remove stored file");
                    false
                }
            })
            .count()
    }
}

struct FileImport<'i, 'r, S: ?Sized> {
    classifier: &'i Classifier<'r>,
    storage: &'i S,
    pdf_type: ResourceTypeId,
    options: &'i ImportOptions,
    path: &'i Path,
    file_name: &'i str,
}

impl<S: FileStorage + ?Sized> FileImport<'_, '_, S> {
    fn run(
        &self,
        catalog: &mut Catalog,
        issues: &mut BTreeSet<ConfigurationIssue>,
        stored: &mut Vec<String>,
    ) -> FileOutcome {
        let file_name = self.file_name;
        let classification = match self.classifier.classify(catalog, file_name) {
            Ok(classification) => classification,
            Err(error) => {
                warn!(file = file_name, %error, "file could not be placed");
                return FileOutcome::new(file_name, ImportDecision::Unplaced).with_detail(error);
            }
        };
        issues.extend(classification.issues);
        let placement = classification.placement;

        if catalog.resource_exists(&placement.title, placement.subject) {
            info!(
                file = file_name,
                title = %placement.title,
                subject = %placement.subject_name,
                "skipping duplicate resource"
            );
            return FileOutcome::placed(file_name, ImportDecision::SkippedDuplicate, &placement);
        }

        let bytes = match fs::read(self.path) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(file = file_name, %error, "failed to read file");
                return FileOutcome::placed(file_name, ImportDecision::SkippedError, &placement)
                    .with_detail(error);
            }
        };

        if self.options.dry_run {
            let resource = self.new_resource(
                &placement,
                placement.storage_path.clone(),
                String::new(),
                bytes.len() as u64,
            );
            if let Err(error) = catalog.insert_resource(resource) {
                warn!(file = file_name, %error, "dry run could not plan resource");
                return FileOutcome::placed(file_name, ImportDecision::SkippedError, &placement)
                    .with_detail(error);
            }
            info!(
                file = file_name,
                subject = %placement.subject_name,
                path = %placement.storage_path,
                "would import"
            );
            return FileOutcome::placed(file_name, ImportDecision::WouldImport, &placement);
        }

        let file = match self.storage.save(&placement.storage_path, &bytes) {
            Ok(file) => file,
            Err(error) => {
                warn!(file = file_name, %error, "failed to store file");
                return FileOutcome::placed(file_name, ImportDecision::SkippedError, &placement)
                    .with_detail(error);
            }
        };

        let resource = self.new_resource(&placement, file.path.clone(), file.url.clone(), file.size);
        match catalog.insert_resource(resource) {
            Ok(resource) => {
                stored.push(file.path.clone());
                info!(
                    file = file_name,
                    resource = %resource.id,
                    subject = %placement.subject_name,
                    path = %file.path,
                    "imported resource"
                );
                FileOutcome::placed(file_name, ImportDecision::Imported, &placement)
                    .with_storage_path(&file.path)
            }
            Err(error) => {
                if let Err(cleanup) = self.storage.delete(&file.path) {
                    warn!(path = %file.path, error = %cleanup, "failed to remove stored file");
                }
                warn!(file = file_name, %error, "failed to record resource");
                FileOutcome::placed(file_name, ImportDecision::SkippedError, &placement)
                    .with_detail(error)
            }
        }
    }

    fn new_resource(
        &self,
        placement: &Placement,
        file_path: String,
        file_url: String,
        file_size: u64,
    ) -> NewResource {
        NewResource {
            title: placement.title.clone(),
            subject: placement.subject,
            resource_type: self.pdf_type,
            uploaded_by: self.options.uploaded_by.clone(),
            file_path,
            file_url,
            file_size,
            description: format!("Imported from {}", self.file_name),
            allow_download: true,
            is_premium: false,
        }
    }
}

/// Regular `.pdf` files (any case) directly inside `dir`, sorted by file name.
fn pdf_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::MissingDirectory(dir.to_path_buf()));
    }
    let io_error = |source| ImportError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let is_pdf = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));
        if is_pdf && entry.file_type().map_err(io_error)?.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
