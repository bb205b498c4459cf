//! Token-gated sharing for an S3-compatible bucket.
//!
//! Files uploaded through the gateway are stored under generated names and
//! handed back with an HMAC access token. Presenting the name and token later
//! yields a fresh presigned URL, or deletes the object.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use axum::Router;
use services::share_service::ShareService;

/// Router with state attached, ready to serve.
pub fn app(service: ShareService, max_upload_bytes: usize) -> Router {
    routes::routes::routes(max_upload_bytes).with_state(service)
}
