//! Analysis Service - request orchestration
//!
//! Runs one upload through normalization, the upstream call and the
//! visualization steps. Each request is linear and nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use ab_glyph::FontVec;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{
    annotate, composite, flatten, font, normalize, panel_items, AnnotationStyle, NormalizedImage,
    RegionIndex,
};
use crate::upstream::SkinAnalyzer;
use crate::utils::image::encode_png;

use super::error::AnalysisError;
use super::types::*;

/// Skin analysis orchestrator
pub struct AnalysisService<U: SkinAnalyzer> {
    upstream: Arc<U>,
    style: AnnotationStyle,
    jpeg_quality: u8,
    font: Option<Arc<FontVec>>,
}

impl<U: SkinAnalyzer> AnalysisService<U> {
    /// Create a new analysis service
    pub fn new(upstream: Arc<U>, config: &Config) -> Self {
        let font = font::load_font(config.render.font_path.as_deref()).map(Arc::new);
        Self {
            upstream,
            style: AnnotationStyle::from(&config.render),
            jpeg_quality: config.render.jpeg_quality,
            font,
        }
    }

    /// Analyze one uploaded image
    pub async fn analyze(&self, image_data: &[u8]) -> Result<AnalysisOutcome, AnalysisError> {
        let start = Instant::now();

        let normalized = self.normalize(image_data).await?;
        let metrics = self.fetch(normalized.jpeg.clone()).await?;

        let style = self.style;
        let font = self.font.clone();
        let outcome = run_blocking(
            move || visualize(normalized, metrics, &style, font.as_deref()),
            AnalysisError::VisualizationFailed,
        )
        .await?;

        info!(
            "Analysis finished in {}ms ({}x{}, {} metrics, {} region categories)",
            start.elapsed().as_millis(),
            outcome.image_width,
            outcome.image_height,
            outcome.metric_rows.len(),
            outcome.regions.len()
        );
        Ok(outcome)
    }

    /// Analyze one image and render the side-by-side report, PNG encoded
    pub async fn render_report(&self, image_data: &[u8]) -> Result<Vec<u8>, AnalysisError> {
        let normalized = self.normalize(image_data).await?;
        let metrics = self.fetch(normalized.jpeg.clone()).await?;

        let style = self.style;
        let font = self.font.clone();
        run_blocking(
            move || {
                let annotated = annotate(&normalized.rgb, &metrics, &style, font.as_deref());
                let canvas = composite::render(&annotated, &panel_items(&metrics), font.as_deref());
                encode_png(&canvas).map_err(|e| AnalysisError::VisualizationFailed(format!("{:#}", e)))
            },
            AnalysisError::VisualizationFailed,
        )
        .await
    }

    /// Get health status
    pub fn health(&self) -> HealthResult {
        HealthResult {
            healthy: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            upstream_configured: self.upstream.is_configured(),
        }
    }

    async fn normalize(&self, image_data: &[u8]) -> Result<NormalizedImage, AnalysisError> {
        if image_data.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let data = image_data.to_vec();
        let quality = self.jpeg_quality;
        let normalized = run_blocking(
            move || {
                normalize(&data, quality).map_err(|e| AnalysisError::UnsupportedImage(format!("{:#}", e)))
            },
            AnalysisError::UnsupportedImage,
        )
        .await?;

        info!(
            "Normalized upload to {}x{} JPEG ({} bytes)",
            normalized.width(),
            normalized.height(),
            normalized.jpeg.len()
        );
        Ok(normalized)
    }

    async fn fetch(&self, jpeg: Vec<u8>) -> Result<Value, AnalysisError> {
        let start = Instant::now();
        let doc = self.upstream.analyze(jpeg).await.inspect_err(|e| {
            warn!("Upstream call failed: {}", e);
        })?;
        check_error_code(&doc)?;
        info!("Upstream analysis succeeded in {}ms", start.elapsed().as_millis());
        Ok(doc)
    }
}

/// Absent, null or numeric zero `error_code` is success; anything else
/// fails with the API's own message.
pub fn check_error_code(doc: &Value) -> Result<(), AnalysisError> {
    match doc.get("error_code") {
        None | Some(Value::Null) => Ok(()),
        Some(code) if code.as_f64() == Some(0.0) => Ok(()),
        Some(code) => {
            let message = doc
                .get("error_msg")
                .and_then(Value::as_str)
                .unwrap_or("API error")
                .to_string();
            warn!("Upstream returned error_code {}: {}", code, message);
            Err(AnalysisError::UpstreamError(message))
        }
    }
}

/// Run a CPU-bound step off the async runtime. A panic inside `task`
/// becomes the step's own failure kind.
async fn run_blocking<T, F>(task: F, on_panic: fn(String) -> AnalysisError) -> Result<T, AnalysisError>
where
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| on_panic(e.to_string()))?
}

/// Failures here carry only a message; the upstream metrics are dropped.
fn visualize(
    normalized: NormalizedImage,
    metrics: Value,
    style: &AnnotationStyle,
    font: Option<&FontVec>,
) -> Result<AnalysisOutcome, AnalysisError> {
    let annotated = annotate(&normalized.rgb, &metrics, style, font);
    let rendered_png =
        encode_png(&annotated).map_err(|e| AnalysisError::VisualizationFailed(format!("{:#}", e)))?;
    let metric_rows = flatten(&metrics);
    let regions = RegionIndex::build(&metrics);

    Ok(AnalysisOutcome {
        image_width: normalized.width(),
        image_height: normalized.height(),
        metrics,
        rendered_png,
        metric_rows,
        regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use serde_json::json;

    use crate::engine::RegionCategory;

    struct FakeAnalyzer {
        response: Result<Value, AnalysisError>,
        calls: AtomicUsize,
    }

    impl FakeAnalyzer {
        fn new(response: Result<Value, AnalysisError>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SkinAnalyzer for FakeAnalyzer {
        async fn analyze(&self, jpeg: Vec<u8>) -> Result<Value, AnalysisError> {
            assert_eq!(image::guess_format(&jpeg).unwrap(), image::ImageFormat::Jpeg);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(width, height, Rgb([120, 110, 100]))).unwrap()
    }

    fn service(upstream: Arc<FakeAnalyzer>) -> AnalysisService<FakeAnalyzer> {
        AnalysisService::new(upstream, &Config::default())
    }

    #[tokio::test]
    async fn test_empty_input_skips_upstream() {
        let upstream = FakeAnalyzer::new(Ok(json!({})));
        let err = service(upstream.clone()).analyze(&[]).await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyInput);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecodable_input_skips_upstream() {
        let upstream = FakeAnalyzer::new(Ok(json!({})));
        let err = service(upstream.clone()).analyze(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedImage(_)));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_api_error_code_passes_message() {
        let upstream = FakeAnalyzer::new(Ok(json!({"error_code": 90002, "error_msg": "No face in image"})));
        let err = service(upstream).analyze(&png(32, 32)).await.unwrap_err();
        assert_eq!(err, AnalysisError::UpstreamError("No face in image".to_string()));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let upstream = FakeAnalyzer::new(Err(AnalysisError::UpstreamUnavailable("connection reset".to_string())));
        let err = service(upstream.clone()).analyze(&png(8, 8)).await.unwrap_err();
        assert_eq!(err, AnalysisError::UpstreamUnavailable("connection reset".to_string()));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_successful_analysis() {
        let doc = json!({
            "error_code": 0,
            "face_rectangle": {"left": 4, "top": 4, "width": 20, "height": 20},
            "result": {"skin_age": {"value": 27}, "acne": {"count": 0, "rectangle": []}}
        });
        let upstream = FakeAnalyzer::new(Ok(doc.clone()));
        let outcome = service(upstream).analyze(&png(64, 48)).await.unwrap();

        assert_eq!(outcome.metrics, doc);
        assert_eq!((outcome.image_width, outcome.image_height), (64, 48));
        assert_eq!(image::guess_format(&outcome.rendered_png).unwrap(), image::ImageFormat::Png);
        assert!(outcome.regions.contains(RegionCategory::Face));
        assert!(!outcome.regions.contains(RegionCategory::Acne));
        assert!(outcome.metric_rows.iter().any(|m| m.key == "result.skin_age.value" && m.value == "27"));
    }

    #[tokio::test]
    async fn test_report_canvas_size() {
        let upstream = FakeAnalyzer::new(Ok(json!({"error_code": 0, "result": {}})));
        let report = service(upstream).render_report(&png(100, 60)).await.unwrap();
        let decoded = image::load_from_memory(&report).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 1200));
    }

    #[test]
    fn test_visualization_failure_discards_metrics() {
        let normalized = NormalizedImage {
            rgb: RgbImage::new(0, 0),
            jpeg: Vec::new(),
        };
        let metrics = json!({"error_code": 0, "request_id": "req-visual", "result": {}});

        let err = visualize(normalized, metrics, &AnnotationStyle::default(), None).unwrap_err();
        assert!(matches!(err, AnalysisError::VisualizationFailed(_)));
        assert!(!err.to_string().contains("req-visual"));
        assert_eq!(err.code(), "VISUALIZATION_FAILED");
    }

    #[tokio::test]
    async fn test_panicking_step_maps_to_its_failure() {
        let err = run_blocking(
            || -> Result<(), AnalysisError> { panic!("renderer crashed") },
            AnalysisError::VisualizationFailed,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AnalysisError::VisualizationFailed(_)));
    }

    #[test]
    fn test_check_error_code() {
        assert!(check_error_code(&json!({})).is_ok());
        assert!(check_error_code(&json!({"error_code": null})).is_ok());
        assert!(check_error_code(&json!({"error_code": 0})).is_ok());
        assert_eq!(
            check_error_code(&json!({"error_code": "0"})),
            Err(AnalysisError::UpstreamError("API error".to_string()))
        );
        assert_eq!(
            check_error_code(&json!({"error_code": 1, "error_msg": "bad"})),
            Err(AnalysisError::UpstreamError("bad".to_string()))
        );
    }
}
