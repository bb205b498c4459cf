//! Shared fixtures: an in-memory object store that counts calls and can be
//! told to fail the n-th `put_object`.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use http_body_util::BodyExt;
use object_share::{
    models::upload::UploadFile,
    services::{
        object_store::{ObjectStore, StoreError, StoreResult},
        registry::UploadRegistry,
        share_service::{LinkPolicy, ShareService},
        token_service::TokenAuthority,
    },
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

pub const SECRET: &str = "sekret";

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    bucket: AtomicBool,
    calls: AtomicUsize,
    puts: AtomicUsize,
    /// 1-based index of the `put_object` call that should fail.
    fail_put_at: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_bucket() -> Arc<Self> {
        let store = Self::default();
        store.bucket.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn fail_put_at(&self, n: usize) {
        *self.fail_put_at.lock() = Some(n);
    }

    /// Total number of backend calls of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn put_attempts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.lock().contains_key(name)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn content_type_of(&self, name: &str) -> Option<String> {
        self.objects.lock().get(name).map(|(_, ct)| ct.clone())
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        object_name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<()> {
        self.tick();
        let attempt = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_put_at.lock() == Some(attempt) {
            return Err(StoreError::Internal("injected put failure".into()));
        }
        self.objects
            .lock()
            .insert(object_name.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn presigned_get_url(&self, object_name: &str, expiry: Duration) -> StoreResult<String> {
        self.tick();
        Ok(format!(
            "https://store.test/shares/{}?X-Amz-Expires={}",
            object_name,
            expiry.as_secs()
        ))
    }

    async fn remove_object(&self, object_name: &str) -> StoreResult<()> {
        self.tick();
        match self.objects.lock().remove(object_name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn bucket_exists(&self) -> StoreResult<bool> {
        self.tick();
        Ok(self.bucket.load(Ordering::SeqCst))
    }

    async fn make_bucket(&self) -> StoreResult<()> {
        self.tick();
        self.bucket.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn service_with(store: Arc<MemoryStore>, secret: Option<&str>) -> ShareService {
    ShareService::new(
        store,
        Arc::new(UploadRegistry::new()),
        TokenAuthority::new(secret.map(str::to_owned)),
        LinkPolicy::default(),
    )
}

pub fn text_file(name: &str, contents: &str) -> UploadFile {
    UploadFile::new(
        Some(name.to_string()),
        "text/plain",
        Bytes::from(contents.to_string()),
    )
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
