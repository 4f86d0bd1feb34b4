use crate::application::ports::session_repository::{SessionMeta, SessionRow};
use crate::application::ports::user_repository::UserRow;
use crate::application::ports::verification_repository::VerificationPurpose;
use crate::application::use_cases::auth::get_session::GetSession;
use crate::application::use_cases::auth::request_password_reset::RequestPasswordReset;
use crate::application::use_cases::auth::reset_password::ResetPassword;
use crate::application::use_cases::auth::send_verification_email::SendVerificationEmail;
use crate::application::use_cases::auth::sign_in::{SignIn, SignInRequest as SignInDto};
use crate::application::use_cases::auth::sign_out::SignOut;
use crate::application::use_cases::auth::sign_up::{SignUp, SignUpRequest as SignUpDto, SignedIn};
use crate::application::use_cases::auth::verify_email::VerifyEmail;
use crate::application::use_cases::auth::{AuthError, resolve_token};
use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::Config;
use crate::presentation::http::error::ApiError;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgetPasswordRequest {
    pub email: String,
    #[serde(rename = "redirectTo")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(rename = "newPassword")]
    pub new_password: String,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendVerificationEmailRequest {
    pub email: String,
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
    #[serde(rename = "callbackURL")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(rename = "emailVerified")]
    pub email_verified: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(u: UserRow) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            email_verified: u.email_verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionResponse {
    fn from(s: SessionRow) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            expires_at: s.expires_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GetSessionResponse {
    pub session: SessionResponse,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub sid: String,
    pub exp: usize,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/sign-up/email", post(sign_up_email))
        .route("/sign-in/email", post(sign_in_email))
        .route("/sign-out", post(sign_out))
        .route("/get-session", get(get_session))
        .route("/forget-password", post(forget_password))
        .route("/reset-password", post(reset_password))
        .route("/reset-password/:token", get(reset_password_callback))
        .route("/send-verification-email", post(send_verification_email))
        .route("/verify-email", get(verify_email))
        .with_state(ctx)
}

#[utoipa::path(post, path = "/api/auth/sign-up/email", tag = "Auth", request_body = SignUpRequest, responses(
    (status = 200, body = AuthResponse),
    (status = 400, body = ErrorBody),
    (status = 422, body = ErrorBody)
))]
pub async fn sign_up_email(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<SignUpRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let users = ctx.user_repo();
    let sessions = ctx.session_repo();
    let uc = SignUp {
        users: users.as_ref(),
        sessions: sessions.as_ref(),
        session_ttl_secs: ctx.cfg.session_expires_secs,
    };
    let dto = SignUpDto {
        email: req.email,
        name: req.name,
        password: req.password,
    };
    let signed = uc.execute(&dto, &session_meta(&headers)).await?;
    issue_session(&ctx.cfg, signed)
}

#[utoipa::path(post, path = "/api/auth/sign-in/email", tag = "Auth", request_body = SignInRequest, responses(
    (status = 200, body = AuthResponse),
    (status = 401, body = ErrorBody)
))]
pub async fn sign_in_email(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(req): Json<SignInRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let users = ctx.user_repo();
    let sessions = ctx.session_repo();
    let uc = SignIn {
        users: users.as_ref(),
        sessions: sessions.as_ref(),
        session_ttl_secs: ctx.cfg.session_expires_secs,
    };
    let dto = SignInDto {
        email: req.email,
        password: req.password,
    };
    let signed = uc.execute(&dto, &session_meta(&headers)).await?;
    issue_session(&ctx.cfg, signed)
}

#[utoipa::path(post, path = "/api/auth/sign-out", tag = "Auth", responses((status = 200, body = SuccessResponse)))]
pub async fn sign_out(
    State(ctx): State<AppContext>,
    bearer: Option<Bearer>,
) -> Result<(HeaderMap, Json<SuccessResponse>), ApiError> {
    if let Some(claims) = bearer.and_then(|b| decode_session_token(&ctx.cfg, &b.0).ok()) {
        if let Ok(sid) = Uuid::parse_str(&claims.sid) {
            let sessions = ctx.session_repo();
            let uc = SignOut {
                sessions: sessions.as_ref(),
            };
            uc.execute(sid).await.map_err(ApiError::internal)?;
        }
    }
    let mut headers = HeaderMap::new();
    insert_cookie(&mut headers, &clear_session_cookie(ctx.cfg.cookie_secure()));
    Ok((headers, Json(SuccessResponse { success: true })))
}

#[utoipa::path(get, path = "/api/auth/get-session", tag = "Auth", responses(
    (status = 200, body = GetSessionResponse),
    (status = 401, body = ErrorBody)
))]
pub async fn get_session(
    State(ctx): State<AppContext>,
    bearer: Bearer,
) -> Result<Json<GetSessionResponse>, ApiError> {
    let claims = decode_session_token(&ctx.cfg, &bearer.0)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::unauthorized())?;
    let session_id = Uuid::parse_str(&claims.sid).map_err(|_| ApiError::unauthorized())?;
    let users = ctx.user_repo();
    let sessions = ctx.session_repo();
    let uc = GetSession {
        users: users.as_ref(),
        sessions: sessions.as_ref(),
    };
    let (session, user) = uc
        .execute(session_id, user_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(GetSessionResponse {
        session: session.into(),
        user: user.into(),
    }))
}

#[utoipa::path(post, path = "/api/auth/forget-password", tag = "Auth", request_body = ForgetPasswordRequest, responses(
    (status = 200, body = StatusResponse)
))]
pub async fn forget_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ForgetPasswordRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let users = ctx.user_repo();
    let verifications = ctx.verification_repo();
    let mailer = ctx.mailer();
    let base_url = ctx.cfg.auth_base_url();
    let uc = RequestPasswordReset {
        users: users.as_ref(),
        verifications: verifications.as_ref(),
        mailer: mailer.as_ref(),
        base_url: &base_url,
        token_ttl_secs: ctx.cfg.reset_token_ttl_secs,
    };
    uc.execute(&req.email, req.redirect_to.as_deref()).await?;
    Ok(Json(StatusResponse { status: true }))
}

#[utoipa::path(
    get,
    path = "/api/auth/reset-password/{token}",
    tag = "Auth",
    params(
        ("token" = String, Path, description = "Token from the reset email"),
        ("callbackURL" = Option<String>, Query, description = "Where to send the browser")
    ),
    responses((status = 302, description = "Redirect to callbackURL with token or error"))
)]
pub async fn reset_password_callback(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
    Query(q): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    let callback = safe_callback(&ctx.cfg, q.callback_url.as_deref());
    let verifications = ctx.verification_repo();
    match resolve_token(
        verifications.as_ref(),
        VerificationPurpose::ResetPassword,
        &token,
    )
    .await
    {
        Ok(_) => Ok(redirect(&with_query(
            &callback,
            "token",
            &urlencoding::encode(&token),
        ))),
        Err(AuthError::InvalidToken) => {
            Ok(redirect(&with_query(&callback, "error", "INVALID_TOKEN")))
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(post, path = "/api/auth/reset-password", tag = "Auth", request_body = ResetPasswordRequest, responses(
    (status = 200, body = StatusResponse),
    (status = 400, body = ErrorBody)
))]
pub async fn reset_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let users = ctx.user_repo();
    let sessions = ctx.session_repo();
    let verifications = ctx.verification_repo();
    let uc = ResetPassword {
        users: users.as_ref(),
        sessions: sessions.as_ref(),
        verifications: verifications.as_ref(),
    };
    uc.execute(&req.token, &req.new_password).await?;
    Ok(Json(StatusResponse { status: true }))
}

#[utoipa::path(post, path = "/api/auth/send-verification-email", tag = "Auth", request_body = SendVerificationEmailRequest, responses(
    (status = 200, body = StatusResponse)
))]
pub async fn send_verification_email(
    State(ctx): State<AppContext>,
    Json(req): Json<SendVerificationEmailRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let users = ctx.user_repo();
    let verifications = ctx.verification_repo();
    let mailer = ctx.mailer();
    let base_url = ctx.cfg.auth_base_url();
    let uc = SendVerificationEmail {
        users: users.as_ref(),
        verifications: verifications.as_ref(),
        mailer: mailer.as_ref(),
        base_url: &base_url,
        token_ttl_secs: ctx.cfg.verification_token_ttl_secs,
    };
    uc.execute(&req.email, req.callback_url.as_deref()).await?;
    Ok(Json(StatusResponse { status: true }))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify-email",
    tag = "Auth",
    params(
        ("token" = String, Query, description = "Token from the verification email"),
        ("callbackURL" = Option<String>, Query, description = "Where to send the browser")
    ),
    responses(
        (status = 200, body = StatusResponse),
        (status = 302, description = "Redirect to callbackURL"),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn verify_email(
    State(ctx): State<AppContext>,
    Query(q): Query<VerifyEmailQuery>,
) -> Result<Response, ApiError> {
    let users = ctx.user_repo();
    let verifications = ctx.verification_repo();
    let uc = VerifyEmail {
        users: users.as_ref(),
        verifications: verifications.as_ref(),
    };
    let callback = q
        .callback_url
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|c| safe_callback(&ctx.cfg, Some(c)));
    match (uc.execute(q.token.as_deref().unwrap_or_default()).await, callback) {
        (Ok(_), Some(cb)) => Ok(redirect(&cb)),
        (Ok(_), None) => Ok(Json(StatusResponse { status: true }).into_response()),
        (Err(AuthError::InvalidToken), Some(cb)) => {
            Ok(redirect(&with_query(&cb, "error", "INVALID_TOKEN")))
        }
        (Err(AuthError::InvalidToken), None) => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_TOKEN",
            "invalid or expired token",
        )),
        (Err(e), _) => Err(e.into()),
    }
}

// --- Session token extractor & JWT utils ---
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub struct Bearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Bearer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // 1) Prefer Authorization header if present
        if let Some(auth) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(t) = auth.strip_prefix("Bearer ") {
                return Ok(Bearer(t.trim().to_string()));
            }
        }

        // 2) Fallback to HttpOnly session cookie
        if let Some(cookie_hdr) = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(token) = get_cookie(cookie_hdr, SESSION_COOKIE) {
                return Ok(Bearer(token));
            }
        }

        Err(ApiError::unauthorized())
    }
}

pub fn encode_session_token(cfg: &Config, session: &SessionRow) -> anyhow::Result<String> {
    let claims = Claims {
        sub: session.user_id.to_string(),
        sid: session.id.to_string(),
        exp: session.expires_at.timestamp().max(0) as usize,
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.auth_secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decode_session_token(cfg: &Config, token: &str) -> Result<Claims, ApiError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.auth_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized())?;
    Ok(data.claims)
}

fn issue_session(
    cfg: &Config,
    signed: SignedIn,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let token = encode_session_token(cfg, &signed.session).map_err(ApiError::internal)?;
    let max_age = (signed.session.expires_at - Utc::now()).num_seconds();
    let mut headers = HeaderMap::new();
    insert_cookie(
        &mut headers,
        &build_session_cookie(&token, max_age, cfg.cookie_secure()),
    );
    Ok((
        headers,
        Json(AuthResponse {
            token,
            user: signed.user.into(),
        }),
    ))
}

fn session_meta(headers: &HeaderMap) -> SessionMeta {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    SessionMeta {
        ip_address,
        user_agent,
    }
}

// --- Redirect helpers ---

/// Relative paths and same-origin URLs pass; anything else collapses to `/`.
pub fn safe_callback(cfg: &Config, raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "/".into();
    };
    // Browsers read `\` as `/`, so `/\host` is protocol-relative.
    let plain = !raw.contains('\\') && !raw.chars().any(char::is_control);
    if plain && raw.starts_with('/') && !raw.starts_with("//") {
        return raw.to_string();
    }
    let same_origin = plain
        && match (url::Url::parse(raw), url::Url::parse(&cfg.app_url)) {
            (Ok(target), Ok(app)) => target.origin() == app.origin(),
            _ => false,
        };
    if same_origin {
        raw.to_string()
    } else {
        tracing::warn!(callback = %raw, "rejected_foreign_callback");
        "/".into()
    }
}

fn with_query(base: &str, key: &str, value: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{key}={value}")
}

fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(v) => (StatusCode::FOUND, [(header::LOCATION, v)]).into_response(),
        Err(_) => (StatusCode::FOUND, [(header::LOCATION, HeaderValue::from_static("/"))])
            .into_response(),
    }
}

// --- Cookie helpers ---

fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

fn build_session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly{}; Path=/; Max-Age={}; SameSite=Lax",
        SESSION_COOKIE,
        token,
        secure_attr,
        max_age_secs.max(0)
    )
}

fn clear_session_cookie(secure: bool) -> String {
    build_session_cookie("", 0, secure)
}

fn insert_cookie(headers: &mut HeaderMap, cookie: &str) {
    if let Ok(v) = HeaderValue::from_str(cookie) {
        headers.insert(header::SET_COOKIE, v);
    }
}
