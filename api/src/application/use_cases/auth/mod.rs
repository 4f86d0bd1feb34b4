use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository, VerificationRow,
};
use crate::infrastructure::crypto;

pub mod get_session;
pub mod request_password_reset;
pub mod reset_password;
pub mod send_verification_email;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod verify_email;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("user already exists")]
    UserExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_email(email: &str) -> Result<(), AuthError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::Validation("invalid email".into()))
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation("password too short".into()));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::Validation("password too long".into()));
    }
    Ok(())
}

/// Looks up a live token; expired rows are removed on sight.
pub async fn resolve_token<V: VerificationRepository + ?Sized>(
    repo: &V,
    purpose: VerificationPurpose,
    token: &str,
) -> Result<VerificationRow, AuthError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    let row = repo
        .find_by_hash(purpose, &crypto::hash_token(token))
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if row.expires_at <= chrono::Utc::now() {
        repo.delete(row.id).await?;
        return Err(AuthError::InvalidToken);
    }
    Ok(row)
}

/// Claims a token for single use. The row is gone afterwards whether or not it was still live.
pub async fn consume_token<V: VerificationRepository + ?Sized>(
    repo: &V,
    purpose: VerificationPurpose,
    token: &str,
) -> Result<VerificationRow, AuthError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    let row = repo
        .consume(purpose, &crypto::hash_token(token))
        .await?
        .ok_or(AuthError::InvalidToken)?;
    if row.expires_at <= chrono::Utc::now() {
        return Err(AuthError::InvalidToken);
    }
    Ok(row)
}
