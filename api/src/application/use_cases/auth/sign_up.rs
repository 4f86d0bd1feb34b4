use chrono::{Duration, Utc};

use crate::application::ports::session_repository::{SessionMeta, SessionRepository, SessionRow};
use crate::application::ports::user_repository::{UserRepository, UserRow};
use crate::application::use_cases::auth::{
    AuthError, normalize_email, validate_email, validate_password,
};
use crate::infrastructure::crypto;

pub struct SignUp<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub users: &'a U,
    pub sessions: &'a S,
    pub session_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: UserRow,
    pub session: SessionRow,
}

impl<'a, U, S> SignUp<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub async fn execute(
        &self,
        req: &SignUpRequest,
        meta: &SessionMeta,
    ) -> Result<SignedIn, AuthError> {
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("name is required".into()));
        }
        validate_password(&req.password)?;

        let hash = crypto::hash_password(&req.password)?;
        let mut user = self
            .users
            .create_user(&email, name, &hash)
            .await?
            .ok_or(AuthError::UserExists)?;
        user.password_hash = None;

        let expires_at = Utc::now() + Duration::seconds(self.session_ttl_secs);
        let session = self
            .sessions
            .create_session(user.id, expires_at, meta)
            .await?;
        tracing::info!(user_id = %user.id, "user_signed_up");
        Ok(SignedIn { user, session })
    }
}
