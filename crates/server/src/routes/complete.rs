use actix_web::{post, web, HttpResponse};
use tracing::info;

use crate::state::AppState;
use crate::types::{CompleteRequest, ResultResponse};

/// Text completion tab
#[post("/api/complete")]
pub async fn complete(
    req: web::Json<CompleteRequest>,
    state: web::Data<std::sync::Arc<AppState>>,
) -> actix_web::Result<HttpResponse> {
    let model = state.resolve_model(req.model.as_deref());
    info!("Completion requested - Model: {}, Prompt length: {}", model, req.prompt.len());

    let outcome = match state.resolve_base_url(req.server_url.as_deref()) {
        Ok(url) => {
            state
                .client_for(&url)
                .complete(&model, &req.prompt, state.config.max_tokens)
                .await
        }
        Err(e) => Err(e),
    };

    Ok(HttpResponse::Ok().json(ResultResponse::from(outcome)))
}
