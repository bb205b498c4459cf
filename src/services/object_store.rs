//! Object store collaborator.
//!
//! [`ObjectStore`] is the narrow capability set the share service needs from
//! the backend. [`S3ObjectStore`] implements it on top of `rust-s3` and is the
//! only place that looks at backend-specific errors; everything past this
//! module sees the closed [`StoreError`] set.

use async_trait::async_trait;
use bytes::Bytes;
use s3::{Bucket, Region, bucket_ops::BucketConfiguration, creds::Credentials, error::S3Error};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,
    #[error("object store rejected the credentials")]
    Unauthorized,
    #[error("object store failure: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `object_name` with the given content type.
    async fn put_object(&self, object_name: &str, data: Bytes, content_type: &str)
    -> StoreResult<()>;

    /// Issue a presigned GET URL valid for `expiry`.
    async fn presigned_get_url(&self, object_name: &str, expiry: Duration) -> StoreResult<String>;

    /// Remove an object. Missing objects yield [`StoreError::NotFound`].
    async fn remove_object(&self, object_name: &str) -> StoreResult<()>;

    async fn bucket_exists(&self) -> StoreResult<bool>;

    async fn make_bucket(&self) -> StoreResult<()>;
}

/// Connection settings for [`S3ObjectStore`].
#[derive(Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    pub use_ssl: bool,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

impl S3Settings {
    /// Endpoint URL with a scheme, derived from `use_ssl` when none is given.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else if self.use_ssl {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

/// S3-compatible backend (AWS S3, MinIO, R2, ...) using path-style addressing.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    bucket_name: String,
    region: Region,
    credentials: Credentials,
}

/// Presign expiry is a `u32` of seconds in `rust-s3`; S3 caps it at 7 days.
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

impl S3ObjectStore {
    pub fn new(settings: &S3Settings) -> anyhow::Result<Self> {
        let region = Region::Custom {
            region: settings.region.clone(),
            endpoint: settings.endpoint_url(),
        };
        let credentials = Credentials::new(
            Some(settings.access_key.as_str()),
            Some(settings.secret_key.as_str()),
            None,
            None,
            None,
        )?;
        let bucket =
            Bucket::new(&settings.bucket, region.clone(), credentials.clone())?.with_path_style();

        Ok(Self {
            bucket,
            bucket_name: settings.bucket.clone(),
            region,
            credentials,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        object_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<()> {
        let response = self
            .bucket
            .put_object_with_content_type(object_name, &data, content_type)
            .await
            .map_err(map_s3_error)?;
        check_status(response.status_code())?;
        debug!(object = object_name, size = data.len(), "stored object");
        Ok(())
    }

    async fn presigned_get_url(&self, object_name: &str, expiry: Duration) -> StoreResult<String> {
        let secs = expiry.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32;
        self.bucket
            .presign_get(object_name, secs, None)
            .await
            .map_err(map_s3_error)
    }

    async fn remove_object(&self, object_name: &str) -> StoreResult<()> {
        // S3 DELETE answers 204 for missing keys, so probe first.
        let (_, head_status) = self
            .bucket
            .head_object(object_name)
            .await
            .map_err(map_s3_error)?;
        check_status(head_status)?;

        let response = self
            .bucket
            .delete_object(object_name)
            .await
            .map_err(map_s3_error)?;
        check_status(response.status_code())?;
        debug!(object = object_name, "removed object");
        Ok(())
    }

    async fn bucket_exists(&self) -> StoreResult<bool> {
        // GetBucketLocation addresses the bucket itself, unlike ListBuckets,
        // so credentials scoped to one bucket can still answer.
        let (_, status) = self.bucket.location().await.map_err(map_s3_error)?;
        match status {
            200..=299 => Ok(true),
            404 => Ok(false),
            code => Err(status_error(code, "")),
        }
    }

    async fn make_bucket(&self) -> StoreResult<()> {
        let response = Bucket::create_with_path_style(
            &self.bucket_name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(map_s3_error)?;

        match response.response_code {
            200..=299 => info!(bucket = %self.bucket_name, "created bucket"),
            // BucketAlreadyOwnedByYou / BucketAlreadyExists
            409 => info!(bucket = %self.bucket_name, "bucket already exists"),
            code => return Err(status_error(code, &response.response_text)),
        }
        Ok(())
    }
}

fn check_status(code: u16) -> StoreResult<()> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(status_error(code, ""))
    }
}

fn status_error(code: u16, body: &str) -> StoreError {
    match code {
        404 => StoreError::NotFound,
        401 | 403 => StoreError::Unauthorized,
        _ if body.is_empty() => StoreError::Internal(format!("unexpected status {code}")),
        _ => StoreError::Internal(format!("unexpected status {code}: {body}")),
    }
}

fn map_s3_error(err: S3Error) -> StoreError {
    match err {
        S3Error::HttpFailWithBody(code, body) => status_error(code, &body),
        other => StoreError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    fn settings(endpoint: &str, use_ssl: bool) -> S3Settings {
        S3Settings {
            endpoint: endpoint.into(),
            access_key: "ak".into(),
            secret_key: "very-secret".into(),
            bucket: "shares".into(),
            region: "us-east-1".into(),
            use_ssl,
        }
    }

    #[test]
    fn endpoint_scheme_follows_tls_flag() {
        assert_eq!(
            settings("s3.example.com", true).endpoint_url(),
            "https://s3.example.com"
        );
        assert_eq!(
            settings("localhost:9000", false).endpoint_url(),
            "http://localhost:9000"
        );
        assert_eq!(
            settings("http://minio:9000", true).endpoint_url(),
            "http://minio:9000"
        );
    }

    #[test]
    fn settings_debug_hides_secret_key() {
        let rendered = format!("{:?}", settings("localhost", false));
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn status_codes_map_to_closed_variants() {
        assert_eq!(check_status(200), Ok(()));
        assert_eq!(check_status(204), Ok(()));
        assert_eq!(check_status(404), Err(StoreError::NotFound));
        assert_eq!(check_status(403), Err(StoreError::Unauthorized));
        assert!(matches!(check_status(500), Err(StoreError::Internal(_))));
    }

    #[test]
    fn http_failures_map_by_status() {
        assert_eq!(
            map_s3_error(S3Error::HttpFailWithBody(404, "NoSuchKey".into())),
            StoreError::NotFound
        );
        assert_eq!(
            map_s3_error(S3Error::HttpFailWithBody(503, "SlowDown".into())),
            StoreError::Internal("unexpected status 503: SlowDown".into())
        );
    }

    #[tokio::test]
    async fn presigned_url_is_built_locally() {
        let store = S3ObjectStore::new(&settings("localhost:9000", false)).unwrap();
        let url = store
            .presigned_get_url("abc-123", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/shares/abc-123?"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    /// `(method, path, status, body)`; unmatched requests get an empty 200.
    type Route = (&'static str, &'static str, u16, &'static str);

    /// Minimal S3 stand-in on a local port. Records `METHOD /path` for every
    /// request, with the query string and trailing slash dropped.
    async fn mock_s3(routes: &[Route]) -> (S3ObjectStore, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let routes = routes.to_vec();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = Arc::clone(&log);
                tokio::spawn(async move { serve_one(socket, &routes, &log).await });
            }
        });

        let store = S3ObjectStore::new(&settings(&endpoint, false)).unwrap();
        (store, seen)
    }

    async fn serve_one(mut socket: TcpStream, routes: &[Route], log: &Mutex<Vec<String>>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }

        let mut request_line = head.lines().next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default();
        let path = target.split('?').next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        log.lock().push(format!("{method} {path}"));

        let (status, body) = routes
            .iter()
            .find(|(m, p, _, _)| *m == method && *p == path)
            .map(|(_, _, status, body)| (*status, *body))
            .unwrap_or((200, ""));
        let body = if method == "HEAD" { "" } else { body };
        let response = format!(
            "HTTP/1.1 {status} Mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    #[tokio::test]
    async fn bucket_exists_addresses_the_bucket_not_the_account() {
        // Account-wide listing is forbidden, the bucket itself is reachable.
        let (store, seen) = mock_s3(&[("GET", "/", 403, "")]).await;

        assert_eq!(store.bucket_exists().await, Ok(true));
        assert_eq!(*seen.lock(), vec!["GET /shares".to_string()]);
    }

    #[tokio::test]
    async fn bucket_exists_maps_status_codes() {
        let (store, _) = mock_s3(&[("GET", "/shares", 404, "<Error><Code>NoSuchBucket</Code></Error>")]).await;
        assert_eq!(store.bucket_exists().await, Ok(false));

        let (store, _) = mock_s3(&[("GET", "/shares", 403, "<Error><Code>AccessDenied</Code></Error>")]).await;
        assert_eq!(store.bucket_exists().await, Err(StoreError::Unauthorized));

        let (store, _) = mock_s3(&[("GET", "/shares", 500, "")]).await;
        assert!(matches!(store.bucket_exists().await, Err(StoreError::Internal(_))));
    }

    #[tokio::test]
    async fn remove_missing_object_is_not_found_without_delete() {
        let (store, seen) = mock_s3(&[("HEAD", "/shares/nope", 404, "")]).await;

        assert_eq!(store.remove_object("nope").await, Err(StoreError::NotFound));
        assert_eq!(*seen.lock(), vec!["HEAD /shares/nope".to_string()]);
    }

    #[tokio::test]
    async fn remove_existing_object_heads_then_deletes() {
        let (store, seen) = mock_s3(&[
            ("HEAD", "/shares/obj", 200, ""),
            ("DELETE", "/shares/obj", 204, ""),
        ])
        .await;

        assert_eq!(store.remove_object("obj").await, Ok(()));
        assert_eq!(
            *seen.lock(),
            vec!["HEAD /shares/obj".to_string(), "DELETE /shares/obj".to_string()]
        );
    }

    #[tokio::test]
    async fn put_failure_status_is_internal() {
        let (store, seen) = mock_s3(&[("PUT", "/shares/obj", 500, "InternalError")]).await;

        let result = store
            .put_object("obj", Bytes::from_static(b"hello"), "text/plain")
            .await;
        assert!(matches!(result, Err(StoreError::Internal(_))));
        assert_eq!(*seen.lock(), vec!["PUT /shares/obj".to_string()]);
    }

    #[tokio::test]
    async fn put_success_stores_object() {
        let (store, _) = mock_s3(&[("PUT", "/shares/obj", 200, "")]).await;

        let result = store
            .put_object("obj", Bytes::from_static(b"hello"), "text/plain")
            .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn make_bucket_treats_existing_bucket_as_success() {
        let (store, _) = mock_s3(&[("PUT", "/shares", 200, "")]).await;
        assert_eq!(store.make_bucket().await, Ok(()));

        let (store, _) = mock_s3(&[(
            "PUT",
            "/shares",
            409,
            "<Error><Code>BucketAlreadyOwnedByYou</Code></Error>",
        )])
        .await;
        assert_eq!(store.make_bucket().await, Ok(()));

        let (store, _) = mock_s3(&[("PUT", "/shares", 500, "boom")]).await;
        assert!(matches!(store.make_bucket().await, Err(StoreError::Internal(_))));
    }
}
