//! Evidence schema - Files attached to a step-2 record

use serde::{Deserialize, Serialize};

/// An uploaded file owned by exactly one step-2 record. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: u64,

    pub step_record_id: u64,

    pub case_id: u64,

    /// Name generated by the backend
    pub stored_name: String,

    /// Name of the file as uploaded
    pub original_name: String,

    /// Extension including the dot, e.g. ".pdf"
    pub extension: String,

    pub mime_type: String,

    pub size_bytes: u64,

    /// Storage path, e.g. uploads/casos/{id}/paso2/archivo.ext
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

/// A file selected for upload, not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceUpload {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl EvidenceUpload {
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        EvidenceUpload {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension with a leading dot, or empty when the name has none
    pub fn extension(&self) -> String {
        match self.original_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                format!(".{}", ext.to_ascii_lowercase())
            }
            _ => String::new(),
        }
    }

    /// Guess a MIME type from the file extension
    pub fn guess_mime(name: &str) -> &'static str {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            "application/pdf"
        } else if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else {
            "application/octet-stream"
        }
    }
}
