use std::sync::{Arc, Mutex};

use super::model::Catalog;
use super::repository::{CatalogRepository, RepositoryError, UnitOfWork};

/// Serialises load→mutate→commit cycles against a shared repository.
pub struct CatalogService<R: ?Sized> {
    repository: Arc<R>,
    write_lock: Mutex<()>,
}

impl<R> CatalogService<R>
where
    R: CatalogRepository + ?Sized,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Run a read-only query against a fresh snapshot.
    pub fn read<T>(&self, query: impl FnOnce(&Catalog) -> T) -> Result<T, RepositoryError> {
        let catalog = self.repository.load()?;
        Ok(query(&catalog))
    }

    /// Apply a mutation and commit it; an `Err` from the mutation discards the working copy.
    pub fn write<T, E>(&self, mutation: impl FnOnce(&mut Catalog) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepositoryError>,
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("catalog write lock poisoned".to_string()))?;

        let mut work = UnitOfWork::begin(self.repository.as_ref())?;
        match mutation(work.catalog_mut()) {
            Ok(value) => {
                work.commit()?;
                Ok(value)
            }
            Err(err) => {
                work.rollback();
                Err(err)
            }
        }
    }
}
