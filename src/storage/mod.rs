//! Storage module for analysis history persistence

pub mod files;
pub mod traits;

pub use files::FileStorage;
pub use traits::{is_valid_id, RecordStore, RecordSummary, StoredRecord, StoredUpload};
