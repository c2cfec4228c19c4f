//! Service layer types

use serde::Serialize;
use serde_json::Value;

use crate::engine::{FlattenedMetric, RegionIndex};

/// Successful analysis of one upload
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Raw upstream response
    pub metrics: Value,
    /// Annotated image, PNG encoded
    pub rendered_png: Vec<u8>,
    pub metric_rows: Vec<FlattenedMetric>,
    pub regions: RegionIndex,
    pub image_width: u32,
    pub image_height: u32,
}

/// Health check result
#[derive(Debug, Clone, Serialize)]
pub struct HealthResult {
    pub healthy: bool,
    pub version: String,
    pub upstream_configured: bool,
}
