use serde::{Deserialize, Serialize};

/// Raw file handed to the asset-storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// Outbound hook for durable file storage (logos, resumes, profile photos).
pub trait AssetStore: Send + Sync {
    /// Store the upload and return a durable URL.
    fn upload(&self, upload: AssetUpload) -> Result<String, AssetError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("asset '{0}' is empty")]
    Empty(String),
    #[error("asset storage unavailable: {0}")]
    Unavailable(String),
}
