use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::application::services::runtime_env::render_runtime_script;
use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::error::ApiError;

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/runtime.js", get(runtime_js))
        .with_state(ctx)
}

/// Loaded by `index.html` ahead of the bundle so one build serves every environment.
#[utoipa::path(
    get,
    path = "/api/runtime.js",
    tag = "Runtime",
    responses((status = 200, description = "Client environment script", body = String, content_type = "application/javascript"))
)]
pub async fn runtime_js(State(ctx): State<AppContext>) -> Result<Response, ApiError> {
    let script = render_runtime_script(&ctx.cfg.client_env).map_err(ApiError::internal)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        script,
    )
        .into_response())
}
