//! Bucket provisioning endpoint.

use crate::{errors::AppError, services::share_service::ShareService};
use axum::extract::State;

/// POST `/create-bucket` — idempotent; answers with a plain-text confirmation.
pub async fn create_bucket(State(service): State<ShareService>) -> Result<&'static str, AppError> {
    if service.ensure_bucket().await? {
        Ok("Bucket created")
    } else {
        Ok("Bucket already exists")
    }
}
