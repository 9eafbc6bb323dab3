//! Resource upload, storage, viewing and download tracking, plus the portal HTTP surface.

pub mod router;
pub mod service;
pub mod storage;
pub mod upload;

pub use router::{portal_router, IDENTITY_HEADER};
pub use service::{can_download, Download, ResourceService, ResourceServiceError, ResourceView};
pub use storage::{FileStorage, InMemoryFileStorage, LocalFileStorage, StorageError, StoredFile};
pub use upload::{
    content_type_for, validate_title, validate_upload, UploadError, UploadRequest, ValidatedUpload,
    ViewerKind,
};
