//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the bucket is reachable

use crate::services::share_service::ShareService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Liveness probe. Always 200, never touches the object store.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Asks the object store whether the configured bucket exists. 200 when it
/// does, 503 when it is missing or the store cannot be reached. The number of
/// tracked uploads is reported either way.
pub async fn readyz(State(service): State<ShareService>) -> impl IntoResponse {
    let bucket = match service.store.bucket_exists().await {
        Ok(true) => CheckStatus {
            ok: true,
            error: None,
        },
        Ok(false) => CheckStatus {
            ok: false,
            error: Some("bucket does not exist".into()),
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("error: {}", e)),
        },
    };

    let status = if bucket.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if bucket.ok { "ok".into() } else { "error".into() },
        bucket,
        tracked_uploads: service.registry.len(),
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    bucket: CheckStatus,
    tracked_uploads: usize,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
