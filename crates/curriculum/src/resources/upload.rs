use mime_guess::mime::Mime;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, GradeId, ResourceTypeId, SubjectId};

pub const MAX_TITLE_LENGTH: usize = 200;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "jpg", "jpeg", "png", "gif", "mp4",
    "avi", "mov", "mp3", "wav",
];

/// Field-level rejection of an upload. Nothing is stored or created when one is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
}

impl UploadError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::Validation { field, .. } => field,
        }
    }
}

/// Interactive upload: the caller picks the subject and grade explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    pub title: String,
    pub subject: Option<SubjectId>,
    pub resource_type: Option<ResourceTypeId>,
    pub grade: Option<GradeId>,
    pub description: String,
    pub allow_download: bool,
    pub is_premium: bool,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// An upload that passed validation against a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub title: String,
    pub subject: SubjectId,
    pub resource_type: ResourceTypeId,
    pub grade: GradeId,
    pub storage_path: String,
}

/// Trimmed, non-empty title within [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<String, UploadError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(UploadError::validation("title", "A title is required."));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(UploadError::validation(
            "title",
            format!("Titles are limited to {MAX_TITLE_LENGTH} characters."),
        ));
    }
    Ok(title.to_string())
}

/// Checks every field, then the subject/grade linkage. Pure: the catalog is only read.
pub fn validate_upload(
    catalog: &Catalog,
    request: &UploadRequest,
) -> Result<ValidatedUpload, UploadError> {
    let title = validate_title(&request.title)?;

    let subject = request
        .subject
        .and_then(|id| catalog.subject(id))
        .ok_or_else(|| UploadError::validation("subject", "A subject is required to upload a resource."))?;
    let grade = request
        .grade
        .and_then(|id| catalog.grade(id))
        .ok_or_else(|| UploadError::validation("grade", "A grade is required to upload a resource."))?;
    let resource_type = request
        .resource_type
        .and_then(|id| catalog.resource_type(id))
        .ok_or_else(|| UploadError::validation("resource_type", "Select a valid resource type."))?;
    let level = catalog
        .level(grade.education_level)
        .ok_or_else(|| UploadError::validation("grade", "The selected grade has no education level."))?;

    let file_name = request.file_name.trim();
    if file_name.is_empty() || request.bytes.is_empty() {
        return Err(UploadError::validation("file", "A non-empty file is required."));
    }
    let extension = extension(file_name);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::validation(
            "file",
            format!(
                "File extension '{extension}' is not allowed. Allowed extensions are: {}.",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        ));
    }
    let file_name = file_name.rsplit('/').next().unwrap_or(file_name);

    if !subject.is_linked_to(grade.id) {
        return Err(UploadError::validation(
            "subject",
            "The selected subject does not belong to the selected grade.",
        ));
    }

    let storage_path = format!(
        "{}/{}/{}/{}",
        level.name, grade.name, resource_type.name, file_name
    )
    .replace(' ', "_")
    .to_lowercase();

    Ok(ValidatedUpload {
        title,
        subject: subject.id,
        resource_type: resource_type.id,
        grade: grade.id,
        storage_path,
    })
}

/// How a client should render a resource, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerKind {
    Pdf,
    Video,
    Image,
    Audio,
    Document,
    Other,
}

impl ViewerKind {
    pub fn for_path(path: &str) -> Self {
        match extension(path).as_str() {
            "pdf" => Self::Pdf,
            "mp4" | "webm" | "ogg" | "mov" => Self::Video,
            "png" | "jpg" | "jpeg" | "gif" => Self::Image,
            "mp3" | "wav" => Self::Audio,
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => Self::Document,
            _ => Self::Other,
        }
    }
}

/// Content type served for a stored file, guessed from its extension.
pub fn content_type_for(path: &str) -> Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}

fn extension(path: &str) -> String {
    path.rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}
