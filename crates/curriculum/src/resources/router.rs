use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::service::{ResourceService, ResourceServiceError};
use super::storage::{FileStorage, StorageError};
use super::upload::{UploadError, UploadRequest};
use crate::catalog::{
    CatalogError, CatalogRepository, CategoryId, CategoryUpdate, GradeId, GradeUpdate, LevelId,
    LevelUpdate, NewCategory, NewGrade, NewLevel, NewPathway, NewResourceType, NewSubject,
    PathwayId, PathwayUpdate, ResourceId, ResourceTypeId, ResourceTypeUpdate, ResourceUpdate,
    SubjectId, SubjectUpdate, UploaderId, STATS_TOP,
};

/// Header carrying the authenticated actor. Absent means anonymous.
pub const IDENTITY_HEADER: &str = "x-portal-user";

pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Router builder exposing the browse, upload, and admin endpoints.
pub fn portal_router<R, S>(service: Arc<ResourceService<R, S>>) -> Router
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    Router::new()
        .route("/api/v1/levels", get(levels_handler::<R, S>))
        .route("/api/v1/levels/:level_id/grades", get(level_grades_handler::<R, S>))
        .route("/api/v1/grades/:grade_id/subjects", get(grade_subjects_handler::<R, S>))
        .route("/api/v1/grades/:grade_id/pathways", get(grade_pathways_handler::<R, S>))
        .route(
            "/api/v1/grades/:grade_id/subjects/:subject_id/resources",
            get(subject_resources_handler::<R, S>),
        )
        .route(
            "/api/v1/pathways/:pathway_id/subjects",
            get(pathway_subjects_handler::<R, S>),
        )
        .route("/api/v1/categories", get(categories_handler::<R, S>))
        .route("/api/v1/resource-types", get(resource_types_handler::<R, S>))
        .route("/api/v1/search", get(search_handler::<R, S>))
        .route("/api/v1/stats", get(stats_handler::<R, S>))
        .route("/api/v1/me/uploads", get(my_uploads_handler::<R, S>))
        .route("/api/v1/resources", post(upload_handler::<R, S>))
        .route("/api/v1/resources/:resource_id", get(view_handler::<R, S>))
        .route(
            "/api/v1/resources/:resource_id/download",
            get(download_handler::<R, S>),
        )
        .route(
            "/api/v1/resources/:resource_id/visibility",
            post(visibility_handler::<R, S>),
        )
        .route("/api/v1/admin/levels", post(create_level_handler::<R, S>))
        .route("/api/v1/admin/grades", post(create_grade_handler::<R, S>))
        .route("/api/v1/admin/categories", post(create_category_handler::<R, S>))
        .route("/api/v1/admin/subjects", post(create_subject_handler::<R, S>))
        .route(
            "/api/v1/admin/resource-types",
            post(create_resource_type_handler::<R, S>),
        )
        .route("/api/v1/admin/pathways", post(create_pathway_handler::<R, S>))
        .route(
            "/api/v1/admin/levels/:level_id",
            patch(update_level_handler::<R, S>).delete(remove_level_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/grades/:grade_id",
            patch(update_grade_handler::<R, S>).delete(remove_grade_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/categories/:category_id",
            patch(update_category_handler::<R, S>).delete(remove_category_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/subjects/:subject_id",
            patch(update_subject_handler::<R, S>).delete(remove_subject_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/resource-types/:resource_type_id",
            patch(update_resource_type_handler::<R, S>)
                .delete(remove_resource_type_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/pathways/:pathway_id",
            patch(update_pathway_handler::<R, S>).delete(remove_pathway_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/resources/:resource_id/toggle-download",
            post(toggle_download_handler::<R, S>),
        )
        .route(
            "/api/v1/admin/resources/:resource_id",
            patch(update_resource_handler::<R, S>).delete(delete_resource_handler::<R, S>),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

type SharedService<R, S> = State<Arc<ResourceService<R, S>>>;

fn identity(headers: &HeaderMap) -> Option<UploaderId> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UploaderId(value.to_string()))
}

fn unauthorized() -> Response {
    let payload = json!({
        "error": format!("the {IDENTITY_HEADER} header is required"),
    });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn validation_response(field: &str, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
        "field": field,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

pub(crate) fn error_response(err: ResourceServiceError) -> Response {
    let status = match &err {
        ResourceServiceError::Upload(UploadError::Validation { field, message }) => {
            return validation_response(field, message.clone());
        }
        ResourceServiceError::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ResourceServiceError::Catalog(CatalogError::Conflict(_)) => StatusCode::CONFLICT,
        ResourceServiceError::DownloadForbidden(_) => StatusCode::FORBIDDEN,
        ResourceServiceError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
        ResourceServiceError::Storage(_) | ResourceServiceError::Repository(_) => {
            error!(error = %err, "portal request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, ResourceServiceError>,
) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn levels_handler<R, S>(State(service): SharedService<R, S>) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.levels())
}

pub(crate) async fn level_grades_handler<R, S>(
    State(service): SharedService<R, S>,
    Path(level_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.grades_of_level(LevelId(level_id)))
}

pub(crate) async fn grade_subjects_handler<R, S>(
    State(service): SharedService<R, S>,
    Path(grade_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.subjects_of_grade(GradeId(grade_id)))
}

pub(crate) async fn grade_pathways_handler<R, S>(
    State(service): SharedService<R, S>,
    Path(grade_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.pathways_of_grade(GradeId(grade_id)))
}

pub(crate) async fn pathway_subjects_handler<R, S>(
    State(service): SharedService<R, S>,
    Path(pathway_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.subjects_of_pathway(PathwayId(pathway_id)))
}

pub(crate) async fn subject_resources_handler<R, S>(
    State(service): SharedService<R, S>,
    Path((grade_id, subject_id)): Path<(u64, u64)>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(
        StatusCode::OK,
        service.subject_resources(GradeId(grade_id), SubjectId(subject_id)),
    )
}

pub(crate) async fn categories_handler<R, S>(State(service): SharedService<R, S>) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.categories())
}

pub(crate) async fn resource_types_handler<R, S>(State(service): SharedService<R, S>) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.resource_types())
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
    #[serde(default, rename = "type")]
    resource_type: Option<u64>,
}

pub(crate) async fn search_handler<R, S>(
    State(service): SharedService<R, S>,
    Query(params): Query<SearchParams>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(
        StatusCode::OK,
        service.search(&params.q, params.resource_type.map(ResourceTypeId)),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsParams {
    #[serde(default)]
    top: Option<usize>,
}

pub(crate) async fn stats_handler<R, S>(
    State(service): SharedService<R, S>,
    Query(params): Query<StatsParams>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    respond(StatusCode::OK, service.stats(params.top.unwrap_or(STATS_TOP)))
}

pub(crate) async fn my_uploads_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    let Some(uploader) = identity(&headers) else {
        return unauthorized();
    };
    respond(StatusCode::OK, service.uploads_of(&uploader))
}

fn parse_id(field: &'static str, value: &str) -> Result<Option<u64>, Response> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| validation_response(field, format!("'{value}' is not a valid {field} id.")))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, Response> {
    let mut request = UploadRequest::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let payload = json!({ "error": err.body_text() });
                return Err((err.status(), Json(payload)).into_response());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            request.file_name = field.file_name().unwrap_or_default().to_string();
            request.bytes = match field.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(err) => {
                    let payload = json!({ "error": err.body_text() });
                    return Err((err.status(), Json(payload)).into_response());
                }
            };
            continue;
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(err) => {
                let payload = json!({ "error": err.body_text() });
                return Err((err.status(), Json(payload)).into_response());
            }
        };
        match name.as_str() {
            "title" => request.title = value,
            "description" => request.description = value,
            "subject" => request.subject = parse_id("subject", &value)?.map(SubjectId),
            "grade" => request.grade = parse_id("grade", &value)?.map(GradeId),
            "resource_type" => {
                request.resource_type = parse_id("resource_type", &value)?.map(ResourceTypeId)
            }
            "allow_download" => request.allow_download = parse_flag(&value),
            "is_premium" => request.is_premium = parse_flag(&value),
            _ => {}
        }
    }

    Ok(request)
}

pub(crate) async fn upload_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    let Some(uploader) = identity(&headers) else {
        return unauthorized();
    };
    let request = match read_upload(multipart).await {
        Ok(request) => request,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.upload(uploader, request))
}

pub(crate) async fn view_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(resource_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    let authenticated = identity(&headers).is_some();
    respond(StatusCode::OK, service.view(ResourceId(resource_id), authenticated))
}

pub(crate) async fn download_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(resource_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    let authenticated = identity(&headers).is_some();
    match service.download(ResourceId(resource_id), authenticated) {
        Ok(download) => {
            let disposition = content_disposition(&download.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, download.content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                download.bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `attachment` disposition carrying an ASCII fallback name plus the exact name as an RFC 5987
/// `filename*` parameter.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

/// Runs `action` for an identified caller; anonymous callers get 401.
fn admin<R, S, U, F>(
    service: &ResourceService<R, S>,
    headers: &HeaderMap,
    status: StatusCode,
    action: F,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
    U: serde::Serialize,
    F: FnOnce(&ResourceService<R, S>) -> Result<U, ResourceServiceError>,
{
    if identity(headers).is_none() {
        return unauthorized();
    }
    respond(status, action(service))
}

/// Like [`admin`], answering 204 once the entity is gone.
fn admin_remove<R, S, U, F>(
    service: &ResourceService<R, S>,
    headers: &HeaderMap,
    action: F,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
    F: FnOnce(&ResourceService<R, S>) -> Result<U, ResourceServiceError>,
{
    if identity(headers).is_none() {
        return unauthorized();
    }
    match action(service) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_level_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Json(input): Json<NewLevel>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::CREATED, |service| {
        service.create_level(input)
    })
}

pub(crate) async fn create_grade_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Json(input): Json<NewGrade>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::CREATED, |service| {
        service.create_grade(input)
    })
}

pub(crate) async fn create_category_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Json(input): Json<NewCategory>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::CREATED, |service| {
        service.create_category(input)
    })
}

pub(crate) async fn create_subject_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Json(input): Json<NewSubject>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::CREATED, |service| {
        service.create_subject(input)
    })
}

pub(crate) async fn create_resource_type_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Json(input): Json<NewResourceType>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::CREATED, |service| {
        service.create_resource_type(input)
    })
}

pub(crate) async fn create_pathway_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Json(input): Json<NewPathway>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::CREATED, |service| {
        service.create_pathway(input)
    })
}

pub(crate) async fn update_level_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<LevelUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_level(LevelId(id), update)
    })
}

pub(crate) async fn remove_level_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| service.remove_level(LevelId(id)))
}

pub(crate) async fn update_grade_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<GradeUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_grade(GradeId(id), update)
    })
}

pub(crate) async fn remove_grade_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| service.remove_grade(GradeId(id)))
}

pub(crate) async fn update_category_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<CategoryUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_category(CategoryId(id), update)
    })
}

pub(crate) async fn remove_category_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| service.remove_category(CategoryId(id)))
}

pub(crate) async fn update_subject_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<SubjectUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_subject(SubjectId(id), update)
    })
}

pub(crate) async fn remove_subject_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| service.remove_subject(SubjectId(id)))
}

pub(crate) async fn update_resource_type_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<ResourceTypeUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_resource_type(ResourceTypeId(id), update)
    })
}

pub(crate) async fn remove_resource_type_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| {
        service.remove_resource_type(ResourceTypeId(id))
    })
}

pub(crate) async fn update_pathway_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<PathwayUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_pathway(PathwayId(id), update)
    })
}

pub(crate) async fn remove_pathway_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| service.remove_pathway(PathwayId(id)))
}

pub(crate) async fn update_resource_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(resource_id): Path<u64>,
    Json(update): Json<ResourceUpdate>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.update_resource(ResourceId(resource_id), update)
    })
}

pub(crate) async fn visibility_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(resource_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.toggle_visibility(ResourceId(resource_id))
    })
}

pub(crate) async fn toggle_download_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(resource_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin(service.as_ref(), &headers, StatusCode::OK, |service| {
        service.toggle_download(ResourceId(resource_id))
    })
}

pub(crate) async fn delete_resource_handler<R, S>(
    State(service): SharedService<R, S>,
    headers: HeaderMap,
    Path(resource_id): Path<u64>,
) -> Response
where
    R: CatalogRepository + 'static,
    S: FileStorage + 'static,
{
    admin_remove(service.as_ref(), &headers, |service| {
        service.delete_resource(ResourceId(resource_id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_plain_names() {
        assert_eq!(
            content_disposition("cells.pdf"),
            "attachment; filename=\"cells.pdf\"; filename*=UTF-8''cells.pdf"
        );
    }

    #[test]
    fn disposition_escapes_quotes_and_non_ascii() {
        let disposition = content_disposition("zoë's \"cells\".pdf");

        assert_eq!(
            disposition,
            "attachment; filename=\"zo_'s _cells_.pdf\"; \
             filename*=UTF-8''zo%C3%AB%27s%20%22cells%22.pdf"
        );
        assert!(header::HeaderValue::from_str(&disposition).is_ok());
    }
}
