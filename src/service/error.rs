//! Request-level failure taxonomy

/// Why an analysis request failed. Every variant is terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Empty file")]
    EmptyInput,
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
    #[error("{0}")]
    UpstreamUnavailable(String),
    #[error("{0}")]
    UpstreamError(String),
    #[error("Visualization failed: {0}")]
    VisualizationFailed(String),
    #[error("{0}")]
    Configuration(String),
}

impl AnalysisError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::EmptyInput => "EMPTY_INPUT",
            AnalysisError::UnsupportedImage(_) => "UNSUPPORTED_IMAGE",
            AnalysisError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AnalysisError::UpstreamError(_) => "UPSTREAM_ERROR",
            AnalysisError::VisualizationFailed(_) => "VISUALIZATION_FAILED",
            AnalysisError::Configuration(_) => "NOT_CONFIGURED",
        }
    }
}
