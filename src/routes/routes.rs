//! Defines routes for the share gateway.
//!
//! ## Structure
//! - `POST   /upload`                      — multipart upload, one or more `file` fields
//! - `GET    /download/{filename}/{token}` — fresh presigned URL for a valid token
//! - `DELETE /delete/{filename}/{token}`   — remove an object (status code only)
//! - `POST   /create-bucket`               — idempotent bucket creation
//! - `GET    /healthz`, `GET /readyz`      — probes

use crate::{
    handlers::{
        bucket_handlers::create_bucket,
        health_handlers::{healthz, readyz},
        share_handlers::{delete_file, download_link, upload_files},
    },
    services::share_service::ShareService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

/// Build the router. The upload body limit applies to the whole multipart
/// request, not per file.
pub fn routes(max_upload_bytes: usize) -> Router<ShareService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download/{filename}/{token}", get(download_link))
        .route("/delete/{filename}/{token}", delete(delete_file))
        .route("/create-bucket", post(create_bucket))
}
