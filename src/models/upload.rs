//! An uploaded file extracted from a multipart request.

use bytes::Bytes;

/// Raw file payload handed to the share service.
#[derive(Clone, Debug)]
pub struct UploadFile {
    /// Client-supplied file name, used only for logging.
    pub original_name: Option<String>,

    /// MIME type stored as object metadata.
    pub content_type: String,

    pub data: Bytes,
}

impl UploadFile {
    pub fn new(original_name: Option<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            original_name,
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}
