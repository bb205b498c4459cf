//! A stored object as tracked by the upload registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookkeeping entry created for every uploaded object.
///
/// Held in memory only, keyed by the access token issued for the object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    /// Generated object name in the bucket (`<hex id>-<uuid>`).
    pub file_name: String,

    /// When the record is considered stale. Informational; nothing enforces it.
    pub expired_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(file_name: impl Into<String>, expired_at: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name.into(),
            expired_at,
        }
    }
}
