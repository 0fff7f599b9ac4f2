use actix_web::{get, web, HttpResponse};
use visionprobe_common::{MAX_RUNS, MIN_RUNS};

use crate::state::AppState;
use crate::types::{ConfigResponse, HealthResponse};

/// Liveness probe
#[get("/health")]
pub async fn health() -> actix_web::Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    }))
}

/// Defaults for the UI form fields
#[get("/api/config")]
pub async fn get_config(state: web::Data<std::sync::Arc<AppState>>) -> actix_web::Result<HttpResponse> {
    let ocr_available = state.ocr.is_available().await;

    Ok(HttpResponse::Ok().json(ConfigResponse {
        server_url: state.config.ollama_base_url.clone(),
        model: state.config.model.clone(),
        default_runs: state.config.default_runs,
        min_runs: MIN_RUNS,
        max_runs: MAX_RUNS,
        ocr_available,
    }))
}
