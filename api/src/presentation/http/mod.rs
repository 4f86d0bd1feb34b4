use axum::Router;
use axum::extract::MatchedPath;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::bootstrap::app_context::AppContext;

pub mod auth;
pub mod error;
pub mod health;
pub mod runtime;
pub mod static_files;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_up_email,
        auth::sign_in_email,
        auth::sign_out,
        auth::get_session,
        auth::forget_password,
        auth::reset_password_callback,
        auth::reset_password,
        auth::send_verification_email,
        auth::verify_email,
        health::health,
        runtime::runtime_js,
    ),
    components(schemas(
        auth::SignUpRequest,
        auth::SignInRequest,
        auth::ForgetPasswordRequest,
        auth::ResetPasswordRequest,
        auth::SendVerificationEmailRequest,
        auth::UserResponse,
        auth::SessionResponse,
        auth::AuthResponse,
        auth::GetSessionResponse,
        auth::StatusResponse,
        auth::SuccessResponse,
        error::ErrorBody,
        health::HealthResp,
    )),
    tags(
        (name = "Auth", description = "Email and password authentication"),
        (name = "Runtime", description = "Client runtime configuration"),
        (name = "Health", description = "System health checks")
    )
)]
pub struct ApiDoc;

/// Full HTTP surface: API routes first, the static bundle catches the rest.
pub fn router(ctx: AppContext) -> Router {
    let static_dir = ctx.cfg.static_dir.clone();
    Router::new()
        .merge(health::routes())
        .nest("/api", runtime::routes(ctx.clone()))
        .nest("/api/auth", auth::routes(ctx))
        .merge(SwaggerUi::new("/api/auth/docs").url("/api/auth/openapi.json", ApiDoc::openapi()))
        .merge(static_files::router(static_dir))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        )
}
