//! Axum REST API handlers

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::engine::{compare, compare_keys};
use crate::service::{AnalysisError, AnalysisService};
use crate::storage::{RecordStore, StoredRecord, StoredUpload};
use crate::storage::traits::record_timestamp;
use crate::upstream::SkinAnalyzer;
use crate::utils::image::png_data_url;

use super::dto::*;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Application state shared across handlers
pub struct AppState<U: SkinAnalyzer> {
    pub service: Arc<AnalysisService<U>>,
    pub storage: Arc<dyn RecordStore>,
}

/// Create the REST API router
pub fn create_rest_router<U: SkinAnalyzer>(state: Arc<AppState<U>>, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/analyze", post(analyze_handler::<U>))
        .route("/history", get(history_handler::<U>))
        .route("/history/:id/thumb", get(thumb_handler::<U>))
        .route("/history/:id/data", get(data_handler::<U>))
        .route("/compare/:before_id/:after_id", get(compare_handler::<U>))
        .route("/health", get(health_handler::<U>));

    // Web viewer
    if let Some(dir) = config.static_dir.as_deref().filter(|dir| dir.is_dir()) {
        info!("Serving web viewer from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    router
        .layer(DefaultBodyLimit::max(config.body_limit_mb * 1024 * 1024))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Status and body for a failed analysis
pub fn analysis_error(e: &AnalysisError) -> ApiError {
    let status = match e {
        AnalysisError::EmptyInput => StatusCode::BAD_REQUEST,
        AnalysisError::UnsupportedImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::UpstreamUnavailable(_) | AnalysisError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::VisualizationFailed(_) | AnalysisError::Configuration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(&e.to_string(), e.code())))
}

fn storage_error(e: anyhow::Error) -> ApiError {
    error!("Storage failure: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(&e.to_string(), "STORAGE_ERROR")),
    )
}

fn not_found(detail: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(detail, "NOT_FOUND")))
}

/// Analyze an uploaded image
async fn analyze_handler<U: SkinAnalyzer>(
    State(state): State<Arc<AppState<U>>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&e.to_string(), "MULTIPART_ERROR")))
    })? {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        info!(
            "Incoming upload: filename={:?} content_type={:?}",
            filename, content_type
        );

        if let Some(content_type) = content_type.as_deref() {
            if !content_type.starts_with("image/") {
                warn!("Rejected: not an image (content-type: {})", content_type);
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("File must be an image (JPEG or PNG)", "NOT_AN_IMAGE")),
                ));
            }
        }

        let data = field.bytes().await.map_err(|e| {
            error!("Failed to read file: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(&format!("Failed to read file: {}", e), "READ_ERROR")),
            )
        })?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, image_data) = upload.ok_or_else(|| {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new("Missing image field", "MISSING_IMAGE")))
    })?;
    info!("Received image: {} bytes", image_data.len());

    if image_data.is_empty() {
        warn!("Rejected: empty file");
        return Err(analysis_error(&AnalysisError::EmptyInput));
    }

    let stored = match state.storage.save_upload(&image_data, filename.as_deref()).await {
        Ok(stored) => stored,
        Err(e) => {
            warn!("Could not save upload: {:#}", e);
            StoredUpload::unsaved(filename.as_deref())
        }
    };

    let outcome = state.service.analyze(&image_data).await.map_err(|e| {
        error!("Analysis {} failed: {}", stored.id, e);
        analysis_error(&e)
    })?;

    let image_base64 = png_data_url(&outcome.rendered_png);
    let record = StoredRecord {
        id: stored.id.clone(),
        timestamp: record_timestamp(),
        image_file: stored.image_file,
        metrics: outcome.metrics.clone(),
        image_base64: Some(image_base64.clone()),
    };
    if let Err(e) = state.storage.save_record(&record).await {
        warn!("Could not save analysis JSON: {:#}", e);
    }

    Ok(Json(AnalyzeResponse {
        id: stored.id,
        metrics: outcome.metrics,
        metric_rows: outcome.metric_rows,
        image_base64,
        regions: outcome.regions,
        image_width: outcome.image_width,
        image_height: outcome.image_height,
    }))
}

/// List past analyses, newest first
async fn history_handler<U: SkinAnalyzer>(
    State(state): State<Arc<AppState<U>>>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.storage.list().await.map_err(storage_error)?;
    Ok(Json(entries))
}

/// Original upload of one analysis
async fn thumb_handler<U: SkinAnalyzer>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (bytes, mime) = state
        .storage
        .load_image(&id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| not_found("Image not found"))?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes))
}

/// Stored analysis without the rendered image
async fn data_handler<U: SkinAnalyzer>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<String>,
) -> Result<Json<StoredRecord>, ApiError> {
    let mut record = state
        .storage
        .load(&id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| not_found("Analysis not found"))?;
    record.image_base64 = None;
    Ok(Json(record))
}

/// Compare two stored analyses
async fn compare_handler<U: SkinAnalyzer>(
    State(state): State<Arc<AppState<U>>>,
    Path((before_id, after_id)): Path<(String, String)>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<CompareResponse>, ApiError> {
    let before = load_for_compare(state.storage.as_ref(), &before_id).await?;
    let after = load_for_compare(state.storage.as_ref(), &after_id).await?;

    let comparisons = match query.key_list() {
        Some(keys) => compare_keys(&before.metrics, &after.metrics, &keys),
        None => compare(&before.metrics, &after.metrics),
    };
    info!(
        "Compared {} -> {}: {} rows",
        before.id,
        after.id,
        comparisons.len()
    );

    Ok(Json(CompareResponse {
        before: RecordRef {
            id: before_id,
            timestamp: before.timestamp,
        },
        after: RecordRef {
            id: after_id,
            timestamp: after.timestamp,
        },
        comparisons,
    }))
}

async fn load_for_compare(storage: &dyn RecordStore, id: &str) -> Result<StoredRecord, ApiError> {
    storage
        .load(id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| not_found(&format!("Analysis '{}' not found", id)))
}

/// Health check
async fn health_handler<U: SkinAnalyzer>(
    State(state): State<Arc<AppState<U>>>,
) -> Json<HealthResponse> {
    let health = state.service.health();

    Json(HealthResponse {
        healthy: health.healthy,
        version: health.version,
        upstream_configured: health.upstream_configured,
    })
}
