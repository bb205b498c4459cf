//! Response payloads for the share endpoints.

use serde::{Deserialize, Serialize};

/// One entry of the `POST /upload` response array.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadLink {
    /// HTTP-style status of this item (200 on success).
    pub status: u16,

    /// Access token required to download or delete the object.
    pub token: String,

    /// Generated object name in the bucket.
    pub file_name: String,

    /// Presigned retrieval URL issued at upload time.
    pub url: String,
}

/// Body of a successful `GET /download/{filename}/{token}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DownloadLink {
    pub status: u16,
    pub url: String,
}
