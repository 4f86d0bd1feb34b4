use chrono::{Duration, Utc};

use crate::application::ports::session_repository::{SessionMeta, SessionRepository};
use crate::application::ports::user_repository::UserRepository;
use crate::application::use_cases::auth::sign_up::SignedIn;
use crate::application::use_cases::auth::{AuthError, normalize_email};
use crate::infrastructure::crypto;

pub struct SignIn<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub users: &'a U,
    pub sessions: &'a S,
    pub session_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl<'a, U, S> SignIn<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub async fn execute(
        &self,
        req: &SignInRequest,
        meta: &SessionMeta,
    ) -> Result<SignedIn, AuthError> {
        let email = normalize_email(&req.email);
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = user.password_hash.take().unwrap_or_default();
        if hash.is_empty() || !crypto::verify_password(&req.password, &hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let expires_at = Utc::now() + Duration::seconds(self.session_ttl_secs);
        let session = self
            .sessions
            .create_session(user.id, expires_at, meta)
            .await?;
        Ok(SignedIn { user, session })
    }
}
