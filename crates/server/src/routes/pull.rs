use actix_web::{post, web, HttpResponse};
use tracing::info;

use crate::state::AppState;
use crate::types::{PullModelRequest, ResultResponse};

/// Model pull tab
#[post("/api/pull")]
pub async fn pull(
    req: web::Json<PullModelRequest>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let model = state.resolve_model(req.model.as_deref());
    info!("Model pull requested: {}", model);

    let outcome = match state.resolve_base_url(req.server_url.as_deref()) {
        Ok(url) => state.client_for(&url).pull(&model).await,
        Err(e) => Err(e),
    };

    Ok(HttpResponse::Ok().json(ResultResponse::from(outcome)))
}
