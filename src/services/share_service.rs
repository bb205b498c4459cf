//! ShareService — upload, link issuing, verification and delete.
//!
//! Ties the token authority and the upload registry to an [`ObjectStore`].
//! Tokens are checked before any backend call is made, so a bad token never
//! costs a round-trip to the store.

use crate::{
    models::{
        file_record::FileRecord,
        link::{DownloadLink, UploadLink},
        upload::UploadFile,
    },
    services::{
        object_store::{ObjectStore, StoreError},
        registry::UploadRegistry,
        token_service::{TokenAuthority, TokenError},
    },
};
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid token for `{0}`")]
    Unauthorized(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<TokenError> for GatewayError {
    fn from(err: TokenError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A batch upload that stopped early.
///
/// `completed` holds the links issued before `error` occurred. Files after the
/// failing one were never attempted, and already-stored objects stay in the
/// bucket.
#[derive(Debug)]
pub struct BatchFailure {
    pub completed: Vec<UploadLink>,
    pub error: GatewayError,
}

/// Link lifetimes used by the service.
#[derive(Clone, Copy, Debug)]
pub struct LinkPolicy {
    /// Validity of the presigned URL returned with an upload.
    pub upload_link_ttl: Duration,
    /// Validity of the presigned URL returned by a download request.
    pub download_link_ttl: Duration,
    /// Informational lifetime stamped on registry records.
    pub record_ttl: Duration,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            upload_link_ttl: Duration::from_secs(60 * 60),
            download_link_ttl: Duration::from_secs(60 * 60),
            record_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct ShareService {
    pub store: Arc<dyn ObjectStore>,
    pub registry: Arc<UploadRegistry>,
    tokens: TokenAuthority,
    policy: LinkPolicy,
}

impl ShareService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        registry: Arc<UploadRegistry>,
        tokens: TokenAuthority,
        policy: LinkPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            tokens,
            policy,
        }
    }

    /// Upload every file in order, stopping at the first failure.
    pub async fn upload_batch(&self, files: Vec<UploadFile>) -> Result<Vec<UploadLink>, BatchFailure> {
        let mut completed = Vec::with_capacity(files.len());
        for file in files {
            match self.upload_one(file).await {
                Ok(link) => completed.push(link),
                Err(error) => {
                    error!(
                        completed = completed.len(),
                        %error,
                        "upload batch aborted"
                    );
                    return Err(BatchFailure { completed, error });
                }
            }
        }
        Ok(completed)
    }

    /// Store one file and issue its token and presigned URL.
    pub async fn upload_one(&self, file: UploadFile) -> GatewayResult<UploadLink> {
        let object_name = generate_object_name();
        debug!(
            object = %object_name,
            original = file.original_name.as_deref().unwrap_or("<unnamed>"),
            size = file.size(),
            "uploading file"
        );

        self.store
            .put_object(&object_name, file.data, &file.content_type)
            .await
            .map_err(|err| backend_error(&object_name, err))?;

        let token = self.tokens.derive(&object_name)?;

        let url = self
            .store
            .presigned_get_url(&object_name, self.policy.upload_link_ttl)
            .await
            .map_err(|err| backend_error(&object_name, err))?;

        let record_ttl = TimeDelta::from_std(self.policy.record_ttl).unwrap_or(TimeDelta::MAX);
        let expired_at = Utc::now()
            .checked_add_signed(record_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.registry
            .record_upload(token.clone(), FileRecord::new(object_name.clone(), expired_at));

        info!(object = %object_name, "uploaded file");
        Ok(UploadLink {
            status: 200,
            token,
            file_name: object_name,
            url,
        })
    }

    /// Verify `token` and issue a fresh presigned URL for `object_name`.
    pub async fn download_link(&self, object_name: &str, token: &str) -> GatewayResult<DownloadLink> {
        self.authorize(object_name, token)?;

        let url = self
            .store
            .presigned_get_url(object_name, self.policy.download_link_ttl)
            .await
            .map_err(|err| backend_error(object_name, err))?;

        Ok(DownloadLink { status: 200, url })
    }

    /// Verify `token`, remove the object from the store and drop its records.
    pub async fn delete(&self, object_name: &str, token: &str) -> GatewayResult<()> {
        self.authorize(object_name, token)?;

        self.store
            .remove_object(object_name)
            .await
            .map_err(|err| backend_error(object_name, err))?;

        let removed = self.registry.remove_by_object_name(object_name);
        info!(object = %object_name, records = removed, "deleted file");
        Ok(())
    }

    /// Create the bucket if it is missing. Returns `true` when it was created.
    pub async fn ensure_bucket(&self) -> GatewayResult<bool> {
        let exists = self
            .store
            .bucket_exists()
            .await
            .map_err(|err| GatewayError::Backend(err.to_string()))?;
        if exists {
            return Ok(false);
        }
        self.store
            .make_bucket()
            .await
            .map_err(|err| GatewayError::Backend(err.to_string()))?;
        Ok(true)
    }

    fn authorize(&self, object_name: &str, token: &str) -> GatewayResult<()> {
        if self.tokens.verify(object_name, token)? {
            Ok(())
        } else {
            warn!(object = %object_name, "token mismatch");
            Err(GatewayError::Unauthorized(object_name.to_string()))
        }
    }
}

/// `<128-bit random hex>-<uuid v4>`.
pub fn generate_object_name() -> String {
    let mut id = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut id);
    format!("{}-{}", hex::encode(id), Uuid::new_v4())
}

fn backend_error(object_name: &str, err: StoreError) -> GatewayError {
    match err {
        StoreError::NotFound => GatewayError::NotFound(object_name.to_string()),
        other => {
            error!(object = %object_name, error = %other, "object store call failed");
            GatewayError::Backend(other.to_string())
        }
    }
}
