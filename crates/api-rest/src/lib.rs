//! # filedock REST API
//!
//! REST API implementation for filedock.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status mapping)
//!
//! The storage logic itself lives in `filedock-store`; this crate only
//! parses requests, calls into the store, and renders each outcome as a
//! response body plus an HTTP status code.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use filedock_store::{FileStore, StoreError, UploadRequest};

/// Application state shared across REST API handlers
///
/// Holds the `FileStore` instance that performs all filesystem work.
#[derive(Clone)]
pub struct AppState {
    store: Arc<FileStore>,
}

/// Upload or update request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadReq {
    /// Base64 payload, optionally prefixed with `data:<mime>;base64,`
    pub base64: String,

    /// File name; optional for uploads (a random name is generated)
    #[serde(default)]
    pub file_name: Option<String>,

    /// Directory relative to the storage root; optional (defaults to root)
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Uniform response body for file operations
///
/// `content` carries base64 file content for the encoding read; it is a
/// dedicated field so the file name is never overloaded to smuggle payloads.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileRes {
    /// Mirrors the HTTP status code
    pub status: u16,

    /// Human-readable outcome description
    pub message: String,

    /// File name, including extension, when the operation has one
    pub file_name: Option<String>,

    /// Full resolved path on disk, when the operation has one
    pub file_path: Option<String>,

    /// Base64-encoded file content (encoding read only)
    pub content: Option<String>,
}

impl FileRes {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            file_name: None,
            file_path: None,
            content: None,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Query parameters naming a directory relative to the storage root
#[derive(Debug, Deserialize, IntoParams)]
pub struct DirQuery {
    /// Directory relative to the storage root
    pub path: Option<String>,
}

/// Query parameters naming a file path relative to the storage root
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatQuery {
    /// File path relative to the storage root, including the file name
    pub path: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, upload, update, stat, read_encoded, download, delete_file),
    components(schemas(UploadReq, FileRes, HealthRes))
)]
struct ApiDoc;

/// Builds the filedock REST router
///
/// All routes share the given store. The router carries Swagger UI at
/// `/swagger-ui` and a permissive CORS layer.
pub fn router(store: Arc<FileStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/files", post(upload).put(update).get(stat))
        .route("/files/:name", get(read_encoded).delete(delete_file))
        .route("/files/:name/download", get(download))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

/// Maps a store failure to a response body plus status code
///
/// `io_context` prefixes the message for I/O failures, matching the
/// per-operation wording of the responses ("Error saving file: ...").
fn failure(err: &StoreError, io_context: &str) -> (StatusCode, Json<FileRes>) {
    let (status, message) = match err {
        StoreError::InvalidEncoding(_) => (StatusCode::BAD_REQUEST, "Invalid Base64 string".into()),
        StoreError::PayloadTooLarge { .. } => {
            (StatusCode::BAD_REQUEST, "File size exceeds 5MB limit".into())
        }
        StoreError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "Invalid file path".into()),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found".into()),
        StoreError::AlreadyExists(name) => {
            (StatusCode::CONFLICT, format!("File already exists: {name}"))
        }
        StoreError::Io(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{io_context}: {e}"),
        ),
    };
    (status, Json(FileRes::new(status, message)))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "filedock is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/files",
    request_body = UploadReq,
    responses(
        (status = 200, description = "File saved", body = FileRes),
        (status = 400, description = "Invalid base64 or oversized payload", body = FileRes),
        (status = 409, description = "File already exists", body = FileRes),
        (status = 500, description = "Storage failure", body = FileRes)
    )
)]
/// Upload a base64 payload as a new file
///
/// Decodes the payload (stripping any `data:<mime>;base64,` prefix) and
/// writes it under the storage root. Uploads never overwrite: a file
/// already present at the resolved path is a conflict.
#[axum::debug_handler]
async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadReq>,
) -> (StatusCode, Json<FileRes>) {
    let request = UploadRequest {
        base64: req.base64,
        file_name: req.file_name,
        file_path: req.file_path,
    };

    match state.store.upload(&request) {
        Ok(stored) => (
            StatusCode::OK,
            Json(FileRes {
                file_name: Some(stored.file_name),
                file_path: Some(stored.path.display().to_string()),
                ..FileRes::new(StatusCode::OK, "File saved successfully")
            }),
        ),
        Err(e) => {
            tracing::error!("Upload error: {:?}", e);
            failure(&e, "Error saving file")
        }
    }
}

#[utoipa::path(
    put,
    path = "/files",
    request_body = UploadReq,
    responses(
        (status = 200, description = "File updated", body = FileRes),
        (status = 400, description = "Invalid base64 or oversized payload", body = FileRes),
        (status = 404, description = "File not found", body = FileRes),
        (status = 500, description = "Storage failure", body = FileRes)
    )
)]
/// Overwrite an existing file with a freshly decoded payload
///
/// The file name is required and must include its extension; the file must
/// already exist at the resolved path.
#[axum::debug_handler]
async fn update(
    State(state): State<AppState>,
    Json(req): Json<UploadReq>,
) -> (StatusCode, Json<FileRes>) {
    let request = UploadRequest {
        base64: req.base64,
        file_name: req.file_name,
        file_path: req.file_path,
    };

    match state.store.update(&request) {
        Ok(stored) => (
            StatusCode::OK,
            Json(FileRes {
                file_name: Some(stored.file_name),
                file_path: Some(stored.path.display().to_string()),
                ..FileRes::new(StatusCode::OK, "File updated successfully")
            }),
        ),
        Err(e) => {
            tracing::error!("Update error: {:?}", e);
            failure(&e, "Error updating file")
        }
    }
}

#[utoipa::path(
    get,
    path = "/files",
    params(StatQuery),
    responses(
        (status = 200, description = "File exists", body = FileRes),
        (status = 404, description = "File not found", body = FileRes)
    )
)]
/// Check whether a file exists at a path relative to the storage root
///
/// A pure existence check; no content is read.
#[axum::debug_handler]
async fn stat(
    State(state): State<AppState>,
    Query(query): Query<StatQuery>,
) -> (StatusCode, Json<FileRes>) {
    match state.store.stat(&query.path) {
        Ok(stored) => (
            StatusCode::OK,
            Json(FileRes {
                file_name: Some(stored.file_name),
                file_path: Some(stored.path.display().to_string()),
                ..FileRes::new(StatusCode::OK, "File selected")
            }),
        ),
        Err(e) => failure(&e, "Error selecting file"),
    }
}

#[utoipa::path(
    get,
    path = "/files/{name}",
    params(
        ("name" = String, Path, description = "File name, including extension"),
        DirQuery
    ),
    responses(
        (status = 200, description = "File content, base64-encoded", body = FileRes),
        (status = 404, description = "File not found", body = FileRes),
        (status = 500, description = "Read failure", body = FileRes)
    )
)]
/// Read a file and return its content base64-encoded
///
/// The encoded content is returned in the dedicated `content` field.
#[axum::debug_handler]
async fn read_encoded(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Query(query): Query<DirQuery>,
) -> (StatusCode, Json<FileRes>) {
    match state.store.read_encoded(&name, query.path.as_deref()) {
        Ok(encoded) => (
            StatusCode::OK,
            Json(FileRes {
                file_name: Some(encoded.file_name),
                file_path: Some(encoded.path.display().to_string()),
                content: Some(encoded.base64),
                ..FileRes::new(StatusCode::OK, "File found")
            }),
        ),
        Err(e) => {
            tracing::error!("Read error: {:?}", e);
            failure(&e, "Error reading file")
        }
    }
}

#[utoipa::path(
    get,
    path = "/files/{name}/download",
    params(
        ("name" = String, Path, description = "File name, including extension"),
        DirQuery
    ),
    responses(
        (status = 200, description = "Raw file bytes as an attachment"),
        (status = 404, description = "File not found", body = FileRes),
        (status = 500, description = "Read failure", body = FileRes)
    )
)]
/// Download a file's raw bytes
///
/// Bytes are served as an `application/octet-stream` attachment named
/// after the file; no base64 encoding is applied.
#[axum::debug_handler]
async fn download(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Query(query): Query<DirQuery>,
) -> Response {
    match state.store.read_raw(&name, query.path.as_deref()) {
        Ok(bytes) => (
            [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{name}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Download error: {:?}", e);
            failure(&e, "Error reading file").into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/files/{name}",
    params(
        ("name" = String, Path, description = "File name, including extension"),
        DirQuery
    ),
    responses(
        (status = 200, description = "File deleted", body = FileRes),
        (status = 404, description = "File not found", body = FileRes),
        (status = 500, description = "Delete failure", body = FileRes)
    )
)]
/// Delete a file
///
/// Removal failures (permissions, in-use handle) are reported, not retried.
#[axum::debug_handler]
async fn delete_file(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
    Query(query): Query<DirQuery>,
) -> (StatusCode, Json<FileRes>) {
    match state.store.delete(&name, query.path.as_deref()) {
        Ok(()) => (
            StatusCode::OK,
            Json(FileRes::new(StatusCode::OK, "File deleted successfully")),
        ),
        Err(e) => {
            tracing::error!("Delete error: {:?}", e);
            failure(&e, "Error deleting file")
        }
    }
}
