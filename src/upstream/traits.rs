//! Upstream analyzer abstraction

use async_trait::async_trait;
use serde_json::Value;

use crate::service::AnalysisError;

/// A remote skin-analysis service.
/// Implementations must be thread-safe and async-compatible.
#[async_trait]
pub trait SkinAnalyzer: Send + Sync + 'static {
    /// Send one JPEG and return the raw response document.
    ///
    /// Transport failures map to `UpstreamUnavailable`, a missing API key to
    /// `Configuration`. API-level error codes are left in the document.
    async fn analyze(&self, jpeg: Vec<u8>) -> Result<Value, AnalysisError>;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;
}
