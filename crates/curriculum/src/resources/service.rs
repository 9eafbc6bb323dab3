use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::storage::{FileStorage, StorageError};
use super::upload::{
    content_type_for, validate_title, validate_upload, UploadError, UploadRequest, ViewerKind,
};
use crate::catalog::{
    CatalogError, CatalogRepository, CatalogService, CatalogStats, CategoryId, CategoryUpdate,
    EducationLevel, Grade, GradeId, GradeUpdate, LevelId, LevelUpdate, NewCategory, NewGrade,
    NewLevel, NewPathway, NewResource, NewResourceType, NewSubject, Pathway, PathwayId,
    PathwayUpdate, RepositoryError, Resource, ResourceId, ResourceType, ResourceTypeId,
    ResourceTypeUpdate, ResourceUpdate, SearchResults, Subject, SubjectCategory, SubjectId,
    SubjectUpdate, UploaderId,
};

#[derive(Debug, thiserror::Error)]
pub enum ResourceServiceError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("downloads are not permitted for resource {0}")]
    DownloadForbidden(ResourceId),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a client needs to render a resource page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    pub resource: Resource,
    pub viewer: ViewerKind,
    pub file_url: String,
    pub file_extension: String,
    pub can_download: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Premium resources are only downloadable by an identified caller.
pub fn can_download(resource: &Resource, authenticated: bool) -> bool {
    resource.allow_download && (!resource.is_premium || authenticated)
}

/// Browsing, upload, view/download tracking and administration over the catalog.
pub struct ResourceService<R, S> {
    catalog: CatalogService<R>,
    storage: Arc<S>,
}

impl<R, S> ResourceService<R, S>
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    pub fn new(repository: Arc<R>, storage: Arc<S>) -> Self {
        Self {
            catalog: CatalogService::new(repository),
            storage,
        }
    }

    pub fn catalog(&self) -> &CatalogService<R> {
        &self.catalog
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    // Browsing

    pub fn levels(&self) -> Result<Vec<EducationLevel>, ResourceServiceError> {
        Ok(self
            .catalog
            .read(|catalog| catalog.levels().into_iter().cloned().collect())?)
    }

    pub fn grades_of_level(&self, level: LevelId) -> Result<Vec<Grade>, ResourceServiceError> {
        self.catalog.read(|catalog| -> Result<_, ResourceServiceError> {
            catalog
                .level(level)
                .ok_or_else(|| not_found("education level", level))?;
            Ok(catalog.grades_of_level(level).into_iter().cloned().collect())
        })?
    }

    pub fn subjects_of_grade(&self, grade: GradeId) -> Result<Vec<Subject>, ResourceServiceError> {
        self.catalog.read(|catalog| -> Result<_, ResourceServiceError> {
            catalog.grade(grade).ok_or_else(|| not_found("grade", grade))?;
            Ok(catalog.subjects_of_grade(grade).into_iter().cloned().collect())
        })?
    }

    pub fn pathways_of_grade(&self, grade: GradeId) -> Result<Vec<Pathway>, ResourceServiceError> {
        self.catalog.read(|catalog| -> Result<_, ResourceServiceError> {
            catalog.grade(grade).ok_or_else(|| not_found("grade", grade))?;
            Ok(catalog.pathways_of_grade(grade).into_iter().cloned().collect())
        })?
    }

    pub fn subjects_of_pathway(
        &self,
        pathway: PathwayId,
    ) -> Result<Vec<Subject>, ResourceServiceError> {
        self.catalog.read(|catalog| -> Result<_, ResourceServiceError> {
            catalog
                .pathway(pathway)
                .ok_or_else(|| not_found("pathway", pathway))?;
            Ok(catalog.subjects_of_pathway(pathway).into_iter().cloned().collect())
        })?
    }

    pub fn categories(&self) -> Result<Vec<SubjectCategory>, ResourceServiceError> {
        Ok(self
            .catalog
            .read(|catalog| catalog.categories().into_iter().cloned().collect())?)
    }

    pub fn resource_types(&self) -> Result<Vec<ResourceType>, ResourceServiceError> {
        Ok(self
            .catalog
            .read(|catalog| catalog.resource_types().into_iter().cloned().collect())?)
    }

    /// Active resources of a subject, reachable only through a grade the subject is linked to.
    pub fn subject_resources(
        &self,
        grade: GradeId,
        subject: SubjectId,
    ) -> Result<Vec<Resource>, ResourceServiceError> {
        self.catalog.read(|catalog| -> Result<_, ResourceServiceError> {
            if !catalog.is_linked(subject, grade) {
                return Err(not_found("subject", format!("{subject} in grade {grade}")).into());
            }
            Ok(catalog
                .resources_of_subject(subject)
                .into_iter()
                .cloned()
                .collect())
        })?
    }

    pub fn search(
        &self,
        query: &str,
        resource_type: Option<ResourceTypeId>,
    ) -> Result<SearchResults, ResourceServiceError> {
        Ok(self
            .catalog
            .read(|catalog| catalog.search(query, resource_type))?)
    }

    pub fn stats(&self, top: usize) -> Result<CatalogStats, ResourceServiceError> {
        Ok(self.catalog.read(|catalog| catalog.stats(top))?)
    }

    /// Everything `uploader` has uploaded, hidden resources included.
    pub fn uploads_of(&self, uploader: &UploaderId) -> Result<Vec<Resource>, ResourceServiceError> {
        Ok(self.catalog.read(|catalog| {
            catalog
                .resources_uploaded_by(uploader)
                .into_iter()
                .cloned()
                .collect()
        })?)
    }

    // Upload, view, download

    /// Validate, store the payload, and insert the row in one catalog write. A failed write
    /// removes the stored file again.
    pub fn upload(
        &self,
        uploader: UploaderId,
        request: UploadRequest,
    ) -> Result<Resource, ResourceServiceError> {
        let mut stored_path = None;

        let result = self.catalog.write(|catalog| -> Result<Resource, ResourceServiceError> {
            let validated = validate_upload(catalog, &request)?;
            let stored = self.storage.save(&validated.storage_path, &request.bytes)?;
            stored_path = Some(stored.path.clone());

            let resource = catalog.insert_resource(NewResource {
                title: validated.title,
                subject: validated.subject,
                resource_type: validated.resource_type,
                uploaded_by: uploader.clone(),
                file_path: stored.path,
                file_url: stored.url,
                file_size: stored.size,
                description: request.description.clone(),
                allow_download: request.allow_download,
                is_premium: request.is_premium,
            })?;
            Ok(resource)
        });

        match result {
            Ok(resource) => {
                info!(
                    resource = %resource.id,
                    subject = %resource.subject,
                    uploaded_by = %uploader.0,
                    "resource uploaded"
                );
                Ok(resource)
            }
            Err(err) => {
                if let Some(path) = stored_path {
                    self.discard(&path);
                }
                Err(err)
            }
        }
    }

    /// Record a view of an active resource.
    pub fn view(
        &self,
        id: ResourceId,
        authenticated: bool,
    ) -> Result<ResourceView, ResourceServiceError> {
        let resource = self
            .catalog
            .write(|catalog| catalog.record_view(id).map_err(ResourceServiceError::from))?;

        Ok(ResourceView {
            viewer: ViewerKind::for_path(&resource.file_path),
            file_url: resource.file_url.clone(),
            file_extension: resource.file_extension(),
            can_download: can_download(&resource, authenticated),
            resource,
        })
    }

    /// Read the payload of an active, downloadable resource and count the download.
    pub fn download(
        &self,
        id: ResourceId,
        authenticated: bool,
    ) -> Result<Download, ResourceServiceError> {
        let download = self.catalog.write(|catalog| -> Result<Download, ResourceServiceError> {
            let resource = catalog
                .resource(id)
                .filter(|resource| resource.is_active)
                .ok_or_else(|| not_found("resource", id))?;
            if !can_download(resource, authenticated) {
                return Err(ResourceServiceError::DownloadForbidden(id));
            }

            let bytes = self.storage.read(&resource.file_path)?;
            let resource = catalog.record_download(id)?;
            let file_name = resource
                .file_path
                .rsplit('/')
                .next()
                .unwrap_or(resource.file_path.as_str())
                .to_string();
            Ok(Download {
                content_type: content_type_for(&resource.file_path).to_string(),
                file_name,
                bytes,
            })
        })?;

        info!(resource = %id, authenticated, "resource downloaded");
        Ok(download)
    }

    // Administration

    pub fn toggle_download(&self, id: ResourceId) -> Result<Resource, ResourceServiceError> {
        self.catalog.write(|catalog| -> Result<Resource, ResourceServiceError> {
            let allow = !catalog
                .resource(id)
                .ok_or_else(|| not_found("resource", id))?
                .allow_download;
            Ok(catalog.set_allow_download(id, allow)?)
        })
    }

    /// Show a hidden resource or hide a visible one.
    pub fn toggle_visibility(&self, id: ResourceId) -> Result<Resource, ResourceServiceError> {
        let resource = self.catalog.write(|catalog| -> Result<Resource, ResourceServiceError> {
            let active = !catalog
                .resource(id)
                .ok_or_else(|| not_found("resource", id))?
                .is_active;
            Ok(catalog.set_active(id, active)?)
        })?;
        info!(resource = %id, active = resource.is_active, "resource visibility changed");
        Ok(resource)
    }

    /// Edit resource metadata. A new title goes through the upload title rules.
    pub fn update_resource(
        &self,
        id: ResourceId,
        mut update: ResourceUpdate,
    ) -> Result<Resource, ResourceServiceError> {
        if let Some(title) = &update.title {
            update.title = Some(validate_title(title)?);
        }
        self.catalog
            .write(|catalog| catalog.update_resource(id, update).map_err(Into::into))
    }

    /// Remove the row, then its stored file. A missing file does not fail the delete.
    pub fn delete_resource(&self, id: ResourceId) -> Result<Resource, ResourceServiceError> {
        let removed = self
            .catalog
            .write(|catalog| catalog.remove_resource(id).map_err(ResourceServiceError::from))?;
        self.discard(&removed.file_path);
        info!(resource = %id, "resource deleted");
        Ok(removed)
    }

    pub fn create_level(&self, input: NewLevel) -> Result<EducationLevel, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.create_level(input).map_err(Into::into))
    }

    pub fn create_grade(&self, input: NewGrade) -> Result<Grade, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.create_grade(input).map_err(Into::into))
    }

    pub fn create_category(
        &self,
        input: NewCategory,
    ) -> Result<SubjectCategory, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.create_category(input).map_err(Into::into))
    }

    pub fn create_subject(&self, input: NewSubject) -> Result<Subject, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.create_subject(input).map_err(Into::into))
    }

    pub fn create_resource_type(
        &self,
        input: NewResourceType,
    ) -> Result<ResourceType, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.create_resource_type(input).map_err(Into::into))
    }

    pub fn create_pathway(&self, input: NewPathway) -> Result<Pathway, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.create_pathway(input).map_err(Into::into))
    }

    pub fn update_level(
        &self,
        id: LevelId,
        update: LevelUpdate,
    ) -> Result<EducationLevel, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.update_level(id, update).map_err(Into::into))
    }

    pub fn remove_level(&self, id: LevelId) -> Result<EducationLevel, ResourceServiceError> {
        let level = self
            .catalog
            .write(|catalog| catalog.remove_level(id).map_err(ResourceServiceError::from))?;
        info!(level = %id, name = %level.name, "education level removed");
        Ok(level)
    }

    pub fn update_grade(
        &self,
        id: GradeId,
        update: GradeUpdate,
    ) -> Result<Grade, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.update_grade(id, update).map_err(Into::into))
    }

    pub fn remove_grade(&self, id: GradeId) -> Result<Grade, ResourceServiceError> {
        let grade = self
            .catalog
            .write(|catalog| catalog.remove_grade(id).map_err(ResourceServiceError::from))?;
        info!(grade = %id, name = %grade.name, "grade removed");
        Ok(grade)
    }

    pub fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<SubjectCategory, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.update_category(id, update).map_err(Into::into))
    }

    pub fn remove_category(&self, id: CategoryId) -> Result<SubjectCategory, ResourceServiceError> {
        let category = self
            .catalog
            .write(|catalog| catalog.remove_category(id).map_err(ResourceServiceError::from))?;
        info!(category = %id, name = %category.name, "subject category removed");
        Ok(category)
    }

    pub fn update_subject(
        &self,
        id: SubjectId,
        update: SubjectUpdate,
    ) -> Result<Subject, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.update_subject(id, update).map_err(Into::into))
    }

    pub fn remove_subject(&self, id: SubjectId) -> Result<Subject, ResourceServiceError> {
        let subject = self
            .catalog
            .write(|catalog| catalog.remove_subject(id).map_err(ResourceServiceError::from))?;
        info!(subject = %id, name = %subject.name, "subject removed");
        Ok(subject)
    }

    pub fn update_resource_type(
        &self,
        id: ResourceTypeId,
        update: ResourceTypeUpdate,
    ) -> Result<ResourceType, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.update_resource_type(id, update).map_err(Into::into))
    }

    pub fn remove_resource_type(
        &self,
        id: ResourceTypeId,
    ) -> Result<ResourceType, ResourceServiceError> {
        let kind = self.catalog.write(|catalog| {
            catalog
                .remove_resource_type(id)
                .map_err(ResourceServiceError::from)
        })?;
        info!(resource_type = %id, name = %kind.name, "resource type removed");
        Ok(kind)
    }

    pub fn update_pathway(
        &self,
        id: PathwayId,
        update: PathwayUpdate,
    ) -> Result<Pathway, ResourceServiceError> {
        self.catalog
            .write(|catalog| catalog.update_pathway(id, update).map_err(Into::into))
    }

    pub fn remove_pathway(&self, id: PathwayId) -> Result<Pathway, ResourceServiceError> {
        let pathway = self
            .catalog
            .write(|catalog| catalog.remove_pathway(id).map_err(ResourceServiceError::from))?;
        info!(pathway = %id, name = %pathway.name, "pathway removed");
        Ok(pathway)
    }

    fn discard(&self, path: &str) {
        match self.storage.delete(path) {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(err) => warn!(path, error = %err, "failed to remove stored file"),
        }
    }
}

fn not_found(entity: &'static str, key: impl ToString) -> CatalogError {
    CatalogError::NotFound {
        entity,
        key: key.to_string(),
    }
}
