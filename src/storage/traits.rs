//! Storage abstraction traits
//!
//! Defines the interface for analysis history persistence. Records are
//! written once per successful analysis and never mutated afterwards.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extensions an upload keeps when stored; anything else is saved as `.jpg`
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// A persisted analysis record (the JSON sidecar)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    /// File name of the stored upload, relative to the uploads directory
    #[serde(default)]
    pub image_file: String,
    #[serde(default)]
    pub metrics: Value,
    /// Annotated image as a `data:` URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

/// History listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub timestamp: String,
    pub image_file: String,
}

/// Identifier and file name claimed for an upload
#[derive(Debug, Clone, PartialEq)]
pub struct StoredUpload {
    pub id: String,
    pub image_file: String,
}

impl StoredUpload {
    /// Identifier for an upload that could not be written to disk
    pub fn unsaved(filename: Option<&str>) -> Self {
        let id = timestamp_id();
        let image_file = format!("{}.{}", id, upload_extension(filename));
        Self { id, image_file }
    }
}

/// Record storage trait
/// Implementations must be thread-safe and async-compatible
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Store the raw upload under a fresh identifier
    async fn save_upload(&self, data: &[u8], filename: Option<&str>) -> Result<StoredUpload>;

    /// Write the sidecar for a finished analysis
    async fn save_record(&self, record: &StoredRecord) -> Result<()>;

    /// All readable records, newest first
    async fn list(&self) -> Result<Vec<RecordSummary>>;

    /// Load one record; unknown or malformed identifiers yield `None`
    async fn load(&self, id: &str) -> Result<Option<StoredRecord>>;

    /// Load the stored upload and its mime type
    async fn load_image(&self, id: &str) -> Result<Option<(Vec<u8>, &'static str)>>;
}

/// Identifiers only ever contain `[A-Za-z0-9_-]`
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `YYYYMMDD_HHMMSS` in local time
pub fn timestamp_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// ISO-8601 local timestamp stored in the sidecar
pub fn record_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Lowercased extension to store an upload under, without the dot
pub fn upload_extension(filename: Option<&str>) -> &'static str {
    let ext = filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some(ext) => IMAGE_EXTENSIONS
            .iter()
            .find(|known| **known == ext)
            .copied()
            .unwrap_or("jpg"),
        None => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("20240501_101500"));
        assert!(is_valid_id("20240501_101500_2"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../secrets"));
        assert!(!is_valid_id("a.json"));
    }

    #[test]
    fn test_upload_extension() {
        assert_eq!(upload_extension(Some("face.PNG")), "png");
        assert_eq!(upload_extension(Some("face.webp")), "webp");
        assert_eq!(upload_extension(Some("face.heic")), "jpg");
        assert_eq!(upload_extension(Some("face")), "jpg");
        assert_eq!(upload_extension(None), "jpg");
    }

    #[test]
    fn test_timestamp_id_shape() {
        let id = timestamp_id();
        assert_eq!(id.len(), 15);
        assert_eq!(&id[8..9], "_");
        assert!(is_valid_id(&id));
    }

    #[test]
    fn test_sidecar_without_image_omits_field() {
        let record = StoredRecord {
            id: "x".to_string(),
            timestamp: String::new(),
            image_file: "x.jpg".to_string(),
            metrics: serde_json::json!({}),
            image_base64: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("image_base64").is_none());
    }
}
