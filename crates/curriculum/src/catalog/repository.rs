use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::model::Catalog;

/// Storage abstraction for the catalog. A unit of work loads a working copy and commits it whole.
pub trait CatalogRepository: Send + Sync {
    fn load(&self) -> Result<Catalog, RepositoryError>;
    fn commit(&self, catalog: &Catalog) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("catalog snapshot i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog snapshot at {path} is malformed: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Working copy of the catalog. Dropping it without calling [`UnitOfWork::commit`] discards
/// every change made through it.
pub struct UnitOfWork<'a, R: CatalogRepository + ?Sized> {
    repository: &'a R,
    catalog: Catalog,
}

impl<'a, R: CatalogRepository + ?Sized> UnitOfWork<'a, R> {
    pub fn begin(repository: &'a R) -> Result<Self, RepositoryError> {
        let catalog = repository.load()?;
        Ok(Self {
            repository,
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn commit(self) -> Result<Catalog, RepositoryError> {
        self.repository.commit(&self.catalog)?;
        Ok(self.catalog)
    }

    pub fn rollback(self) {
        debug!("catalog unit of work rolled back");
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalogRepository {
    catalog: Mutex<Catalog>,
}

impl InMemoryCatalogRepository {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Mutex::new(catalog),
        }
    }

    pub fn snapshot(&self) -> Result<Catalog, RepositoryError> {
        self.load()
    }
}

impl CatalogRepository for InMemoryCatalogRepository {
    fn load(&self) -> Result<Catalog, RepositoryError> {
        let guard = self
            .catalog
            .lock()
            .map_err(|_| RepositoryError::Unavailable("catalog mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn commit(&self, catalog: &Catalog) -> Result<(), RepositoryError> {
        let mut guard = self
            .catalog
            .lock()
            .map_err(|_| RepositoryError::Unavailable("catalog mutex poisoned".to_string()))?;
        *guard = catalog.clone();
        Ok(())
    }
}

/// Catalog persisted as a single JSON snapshot. A missing file reads as an empty catalog.
#[derive(Debug, Clone)]
pub struct JsonCatalogRepository {
    path: PathBuf,
}

impl JsonCatalogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CatalogRepository for JsonCatalogRepository {
    fn load(&self) -> Result<Catalog, RepositoryError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "catalog snapshot missing; starting empty");
                return Ok(Catalog::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_slice(&bytes).map_err(|source| RepositoryError::Snapshot {
            path: self.path.clone(),
            source,
        })
    }

    fn commit(&self, catalog: &Catalog) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }

        let payload =
            serde_json::to_vec_pretty(catalog).map_err(|source| RepositoryError::Snapshot {
                path: self.path.clone(),
                source,
            })?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(|err| self.io_error(err))?;
        fs::rename(&staging, &self.path).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), "catalog snapshot committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_unit_of_work_leaves_repository_untouched() {
        let repository = InMemoryCatalogRepository::default();
        {
            let mut work = UnitOfWork::begin(&repository).expect("begin");
            work.catalog_mut().find_or_create_category("Arts");
        }
        assert!(repository.snapshot().unwrap().categories().is_empty());

        let mut work = UnitOfWork::begin(&repository).expect("begin");
        work.catalog_mut().find_or_create_category("Arts");
        work.commit().expect("commit");
        assert_eq!(repository.snapshot().unwrap().categories().len(), 1);
    }

    #[test]
    fn json_repository_persists_commits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repository = JsonCatalogRepository::new(dir.path().join("data").join("catalog.json"));

        let empty = repository.load().expect("missing snapshot loads empty");
        assert_eq!(empty, Catalog::new());

        let mut work = UnitOfWork::begin(&repository).expect("begin");
        work.catalog_mut().find_or_create_category("Languages");
        let committed = work.commit().expect("commit");

        let reopened = JsonCatalogRepository::new(repository.path().to_path_buf());
        assert_eq!(reopened.load().expect("reload"), committed);
    }

    #[test]
    fn json_repository_reports_malformed_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(&path, b"{ not json").expect("write");

        let error = JsonCatalogRepository::new(&path)
            .load()
            .expect_err("malformed");
        assert!(matches!(error, RepositoryError::Snapshot { .. }));
    }
}
