//! HTTP handlers for uploading files and redeeming share tokens.
//! Token checks and store calls live in `ShareService`; these handlers only
//! translate between HTTP and the service.

use crate::{
    errors::{AppError, status_for},
    models::{
        link::{DownloadLink, UploadLink},
        upload::UploadFile,
    },
    services::share_service::ShareService,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

/// Multipart field carrying file payloads. May repeat.
const FILE_FIELD: &str = "file";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// POST `/upload` — store every `file` field and return one link per file.
pub async fn upload_files(
    State(service): State<ShareService>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadLink>>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().map(str::to_owned);
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        files.push(UploadFile::new(original_name, content_type, data));
    }

    if files.is_empty() {
        return Err(AppError::bad_request("missing `file` form field"));
    }

    let links = service.upload_batch(files).await?;
    Ok(Json(links))
}

/// GET `/download/{filename}/{token}` — fresh presigned URL for a valid token.
pub async fn download_link(
    State(service): State<ShareService>,
    Path((filename, token)): Path<(String, String)>,
) -> Result<Json<DownloadLink>, AppError> {
    let link = service.download_link(&filename, &token).await?;
    Ok(Json(link))
}

/// DELETE `/delete/{filename}/{token}` — status code only.
pub async fn delete_file(
    State(service): State<ShareService>,
    Path((filename, token)): Path<(String, String)>,
) -> StatusCode {
    match service.delete(&filename, &token).await {
        Ok(()) => StatusCode::OK,
        Err(err) => status_for(&err),
    }
}
