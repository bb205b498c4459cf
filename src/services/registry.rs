//! In-memory registry of issued tokens.
//!
//! Maps access token -> [`FileRecord`]. Populated on upload and cleaned up on
//! delete. Download verification never reads it; tokens are re-derived instead.
//!
//! All access goes through a single `parking_lot::Mutex`. Critical sections are
//! short and never held across an `.await`.

use crate::models::file_record::FileRecord;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct UploadRegistry {
    entries: Mutex<HashMap<String, FileRecord>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `token`. Last write wins.
    pub fn record_upload(&self, token: impl Into<String>, record: FileRecord) {
        self.entries.lock().insert(token.into(), record);
    }

    /// Remove every entry whose record points at `object_name`.
    ///
    /// Linear in the registry size. Returns the number of entries removed.
    pub fn remove_by_object_name(&self, object_name: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, record| record.file_name != object_name);
        before - entries.len()
    }

    pub fn contains_object(&self, object_name: &str) -> bool {
        self.entries
            .lock()
            .values()
            .any(|record| record.file_name == object_name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
