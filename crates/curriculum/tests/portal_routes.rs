use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use curriculum::catalog::{
    standard_curriculum, Catalog, GradeId, InMemoryCatalogRepository, NewResource, ResourceTypeId,
    SubjectId, UnitOfWork, UploaderId,
};
use curriculum::resources::{
    portal_router, FileStorage, InMemoryFileStorage, ResourceService, IDENTITY_HEADER,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "portal-test-boundary";

struct Fixture {
    router: Router,
    repository: Arc<InMemoryCatalogRepository>,
    storage: Arc<InMemoryFileStorage>,
    g7: GradeId,
    biology: SubjectId,
    drama: SubjectId,
    pdf: ResourceTypeId,
}

fn fixture() -> Fixture {
    let mut catalog = Catalog::new();
    standard_curriculum(&mut catalog).expect("seed");

    let junior = catalog.find_level("Junior Secondary").expect("junior").id;
    let g7 = catalog.find_grade("G7", junior).expect("g7").id;
    let biology = catalog
        .subjects_of_grade(g7)
        .into_iter()
        .find(|subject| subject.name == "Biology")
        .expect("biology")
        .id;
    let arts = catalog.find_category("Arts").expect("arts").id;
    let drama = catalog.find_subject("Drama", arts).expect("drama").id;
    let pdf = catalog.find_resource_type("PDF").expect("pdf").id;

    let repository = Arc::new(InMemoryCatalogRepository::new(catalog));
    let storage = Arc::new(InMemoryFileStorage::default());
    let service = Arc::new(ResourceService::new(repository.clone(), storage.clone()));

    Fixture {
        router: portal_router(service),
        repository,
        storage,
        g7,
        biology,
        drama,
        pdf,
    }
}

fn multipart(fields: &[(&str, String)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(identity: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/resources")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(identity) = identity {
        builder = builder.header(IDENTITY_HEADER, identity);
    }
    builder.body(Body::from(body)).expect("request")
}

fn get(uri: &str, identity: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(identity) = identity {
        builder = builder.header(IDENTITY_HEADER, identity);
    }
    builder.body(Body::empty()).expect("request")
}

fn post_json(uri: &str, identity: Option<&str>, payload: Value) -> Request<Body> {
    send_json("POST", uri, identity, payload)
}

fn patch_json(uri: &str, identity: Option<&str>, payload: Value) -> Request<Body> {
    send_json("PATCH", uri, identity, payload)
}

fn delete(uri: &str, identity: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(identity) = identity {
        builder = builder.header(IDENTITY_HEADER, identity);
    }
    builder.body(Body::empty()).expect("request")
}

fn send_json(method: &str, uri: &str, identity: Option<&str>, payload: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(identity) = identity {
        builder = builder.header(IDENTITY_HEADER, identity);
    }
    builder
        .body(Body::from(serde_json::to_vec(&payload).expect("json")))
        .expect("request")
}

async fn read_json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn biology_fields(fixture: &Fixture, premium: bool) -> Vec<(&'static str, String)> {
    vec![
        ("title", "Cell Structure".to_string()),
        ("subject", fixture.biology.0.to_string()),
        ("grade", fixture.g7.0.to_string()),
        ("resource_type", fixture.pdf.0.to_string()),
        ("description", "Diagrams of plant and animal cells".to_string()),
        ("allow_download", "true".to_string()),
        ("is_premium", premium.to_string()),
    ]
}

async fn upload_biology(fixture: &Fixture, premium: bool) -> Value {
    let body = multipart(
        &biology_fields(fixture, premium),
        Some(("cells.pdf", b"%PDF-1.4 cells")),
    );
    let response = fixture
        .router
        .clone()
        .oneshot(upload_request(Some("teacher-42"), body))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

#[tokio::test]
async fn browse_routes_walk_the_taxonomy() {
    let fixture = fixture();

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/levels", None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let levels = read_json_body(response).await;
    let names: Vec<_> = levels
        .as_array()
        .expect("array")
        .iter()
        .map(|level| level["name"].as_str().expect("name").to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "Pre-Primary",
            "Lower Primary",
            "Upper Primary",
            "Junior Secondary",
            "Senior Secondary"
        ]
    );

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/grades/{}/subjects", fixture.g7.0), None))
        .await
        .expect("router dispatch");
    let subjects = read_json_body(response).await;
    assert!(subjects
        .as_array()
        .expect("array")
        .iter()
        .any(|subject| subject["name"] == "Biology"));

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/levels/999999/grades", None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_requires_identity() {
    let fixture = fixture();
    let body = multipart(
        &biology_fields(&fixture, false),
        Some(("cells.pdf", b"%PDF-1.4 cells")),
    );

    let response = fixture
        .router
        .clone()
        .oneshot(upload_request(None, body))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(fixture.storage.paths().is_empty());
}

#[tokio::test]
async fn upload_then_view_and_download() {
    let fixture = fixture();
    let created = upload_biology(&fixture, false).await;
    assert_eq!(created["file_path"], "junior_secondary/g7/pdf/cells.pdf");
    assert_eq!(created["uploaded_by"], "teacher-42");
    let id = created["id"].as_u64().expect("id");

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{id}"), None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let view = read_json_body(response).await;
    assert_eq!(view["viewer"], "pdf");
    assert_eq!(view["file_extension"], "PDF");
    assert_eq!(view["can_download"], true);
    assert_eq!(view["resource"]["view_count"], 1);

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{id}/download"), None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let bytes = to_bytes(response.into_body(), 1024).await.expect("body");
    assert_eq!(&bytes[..], b"%PDF-1.4 cells");

    let catalog = fixture.repository.snapshot().expect("snapshot");
    let resource = catalog
        .resources()
        .next()
        .expect("resource persisted");
    assert_eq!(resource.download_count, 1);

    let response = fixture
        .router
        .clone()
        .oneshot(get(
            &format!("/api/v1/grades/{}/subjects/{}/resources", fixture.g7.0, fixture.biology.0),
            None,
        ))
        .await
        .expect("router dispatch");
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/search?q=cell", None))
        .await
        .expect("router dispatch");
    let results = read_json_body(response).await;
    assert_eq!(results["resources"][0]["title"], "Cell Structure");
}

#[tokio::test]
async fn unlinked_subject_upload_is_unprocessable() {
    let fixture = fixture();
    let mut fields = biology_fields(&fixture, false);
    fields[1] = ("subject", fixture.drama.0.to_string());

    let response = fixture
        .router
        .clone()
        .oneshot(upload_request(
            Some("teacher-42"),
            multipart(&fields, Some(("drama.pdf", b"%PDF-1.4"))),
        ))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["field"], "subject");
    assert_eq!(
        fixture.repository.snapshot().expect("snapshot").resource_count(),
        0
    );
    assert!(fixture.storage.paths().is_empty());

    let response = fixture
        .router
        .clone()
        .oneshot(get(
            &format!("/api/v1/grades/{}/subjects/{}/resources", fixture.g7.0, fixture.drama.0),
            None,
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn premium_downloads_need_identity_until_toggled_off() {
    let fixture = fixture();
    let created = upload_biology(&fixture, true).await;
    let id = created["id"].as_u64().expect("id");

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{id}/download"), None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{id}/download"), Some("student-7")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/admin/resources/{id}/toggle-download"),
            Some("admin"),
            json!({}),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["allow_download"], false);

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{id}/download"), Some("student-7")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_routes_create_and_reject_duplicates() {
    let fixture = fixture();

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(
            "/api/v1/admin/levels",
            None,
            json!({ "name": "Tertiary", "order": 6 }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(
            "/api/v1/admin/levels",
            Some("admin"),
            json!({ "name": "Tertiary", "order": 6 }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json_body(response).await["name"], "Tertiary");

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(
            "/api/v1/admin/levels",
            Some("admin"),
            json!({ "name": "Tertiary" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_removes_row_and_file() {
    let fixture = fixture();
    let created = upload_biology(&fixture, false).await;
    let id = created["id"].as_u64().expect("id");

    let response = fixture
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/admin/resources/{id}"))
                .header(IDENTITY_HEADER, "admin")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(fixture.storage.paths().is_empty());
    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{id}"), None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_names_are_escaped_in_the_disposition_header() {
    let fixture = fixture();
    let path = "junior_secondary/g7/pdf/zoë's \"cells\".pdf";
    let stored = fixture.storage.save(path, b"%PDF-1.4 cells").expect("stored");
    let mut work = UnitOfWork::begin(fixture.repository.as_ref()).expect("begin");
    let resource = work
        .catalog_mut()
        .insert_resource(NewResource {
            title: "Cells".to_string(),
            subject: fixture.biology,
            resource_type: fixture.pdf,
            uploaded_by: UploaderId("teacher-42".to_string()),
            file_path: stored.path,
            file_url: stored.url,
            file_size: stored.size,
            description: String::new(),
            allow_download: true,
            is_premium: false,
        })
        .expect("resource");
    work.commit().expect("commit");

    let response = fixture
        .router
        .clone()
        .oneshot(get(&format!("/api/v1/resources/{}/download", resource.id.0), None))
        .await
        .expect("router dispatch");

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii header");
    assert_eq!(
        disposition,
        "attachment; filename=\"zo_'s _cells_.pdf\"; \
         filename*=UTF-8''zo%C3%AB%27s%20%22cells%22.pdf"
    );
}

#[tokio::test]
async fn hidden_resources_are_only_visible_to_their_uploader() {
    let fixture = fixture();
    let created = upload_biology(&fixture, false).await;
    let id = created["id"].as_u64().expect("id");

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(&format!("/api/v1/resources/{id}/visibility"), None, json!({})))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/resources/{id}/visibility"),
            Some("admin"),
            json!({}),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["is_active"], false);

    for uri in [
        format!("/api/v1/resources/{id}"),
        format!("/api/v1/resources/{id}/download"),
    ] {
        let response = fixture
            .router
            .clone()
            .oneshot(get(&uri, Some("teacher-42")))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/search?q=cell", None))
        .await
        .expect("router dispatch");
    assert_eq!(read_json_body(response).await["resources"], json!([]));

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/me/uploads", None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/me/uploads", Some("teacher-42")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let uploads = read_json_body(response).await;
    assert_eq!(uploads.as_array().map(Vec::len), Some(1));
    assert_eq!(uploads[0]["is_active"], false);

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/me/uploads", Some("student-7")))
        .await
        .expect("router dispatch");
    assert_eq!(read_json_body(response).await, json!([]));
}

#[tokio::test]
async fn admin_routes_edit_and_remove_taxonomy() {
    let fixture = fixture();
    let created = upload_biology(&fixture, false).await;
    let id = created["id"].as_u64().expect("id");

    let response = fixture
        .router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/admin/subjects/{}", fixture.biology.0),
            None,
            json!({ "description": "Living things" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/admin/subjects/{}", fixture.biology.0),
            Some("admin"),
            json!({ "description": "Living things" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let subject = read_json_body(response).await;
    assert_eq!(subject["description"], "Living things");
    assert_eq!(subject["name"], "Biology");

    let response = fixture
        .router
        .clone()
        .oneshot(delete(
            &format!("/api/v1/admin/subjects/{}", fixture.biology.0),
            Some("admin"),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = fixture
        .router
        .clone()
        .oneshot(delete(
            &format!("/api/v1/admin/grades/{}", fixture.g7.0),
            Some("admin"),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = fixture
        .router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/admin/resources/{id}"),
            Some("admin"),
            json!({ "title": "Cell Organelles", "is_premium": true }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let edited = read_json_body(response).await;
    assert_eq!(edited["title"], "Cell Organelles");
    assert_eq!(edited["is_premium"], true);

    let response = fixture
        .router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/admin/resources/{id}"),
            Some("admin"),
            json!({ "title": "" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json_body(response).await["field"], "title");

    let response = fixture
        .router
        .clone()
        .oneshot(post_json(
            "/api/v1/admin/levels",
            Some("admin"),
            json!({ "name": "Tertiary", "order": 6 }),
        ))
        .await
        .expect("router dispatch");
    let level = read_json_body(response).await["id"].as_u64().expect("level id");

    let response = fixture
        .router
        .clone()
        .oneshot(patch_json(
            &format!("/api/v1/admin/levels/{level}"),
            Some("admin"),
            json!({ "name": "Junior Secondary" }),
        ))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = fixture
        .router
        .clone()
        .oneshot(delete(&format!("/api/v1/admin/levels/{level}"), Some("admin")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = fixture
        .router
        .clone()
        .oneshot(delete(&format!("/api/v1/admin/levels/{level}"), Some("admin")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_count_views_and_downloads() {
    let fixture = fixture();
    let created = upload_biology(&fixture, false).await;
    let id = created["id"].as_u64().expect("id");
    for uri in [
        format!("/api/v1/resources/{id}"),
        format!("/api/v1/resources/{id}"),
        format!("/api/v1/resources/{id}/download"),
    ] {
        let response = fixture
            .router
            .clone()
            .oneshot(get(&uri, None))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = fixture
        .router
        .clone()
        .oneshot(get("/api/v1/stats?top=3", None))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    let stats = read_json_body(response).await;

    let catalog = fixture.repository.snapshot().expect("snapshot");
    assert_eq!(stats["education_levels"], catalog.levels().len());
    assert_eq!(stats["resources"], 1);
    assert_eq!(stats["hidden_resources"], 0);
    assert_eq!(stats["total_views"], 2);
    assert_eq!(stats["total_downloads"], 1);
    assert_eq!(stats["most_viewed"][0]["title"], "Cell Structure");
    assert_eq!(stats["most_viewed"][0]["subject"], "Biology");
    assert_eq!(stats["most_downloaded"][0]["download_count"], 1);
}
