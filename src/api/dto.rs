//! REST API request/response data transfer objects

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::{ComparisonRow, FlattenedMetric, RegionIndex};

/// Analyze response
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: String,
    /// Upstream response, unmodified
    pub metrics: Value,
    pub metric_rows: Vec<FlattenedMetric>,
    /// Annotated image as `data:image/png;base64,...`
    pub image_base64: String,
    pub regions: RegionIndex,
    pub image_width: u32,
    pub image_height: u32,
}

/// Reference to one stored analysis
#[derive(Debug, Serialize)]
pub struct RecordRef {
    pub id: String,
    pub timestamp: String,
}

/// Compare response
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub before: RecordRef,
    pub after: RecordRef,
    pub comparisons: Vec<ComparisonRow>,
}

/// Compare query parameters
#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    /// Comma-separated dotted metric paths
    pub keys: Option<String>,
}

impl CompareQuery {
    pub fn key_list(&self) -> Option<Vec<&str>> {
        let keys: Vec<&str> = self
            .keys
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();
        (!keys.is_empty()).then_some(keys)
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
    pub upstream_configured: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(detail: &str, code: &str) -> Self {
        Self {
            detail: detail.to_string(),
            code: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_query_keys() {
        let query = CompareQuery {
            keys: Some(" result.skin_age.value, ,custom.path ".to_string()),
        };
        assert_eq!(query.key_list(), Some(vec!["result.skin_age.value", "custom.path"]));
        assert_eq!(CompareQuery { keys: Some(" , ".to_string()) }.key_list(), None);
        assert_eq!(CompareQuery::default().key_list(), None);
    }
}
