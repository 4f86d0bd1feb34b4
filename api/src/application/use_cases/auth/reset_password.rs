use crate::application::ports::session_repository::SessionRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository,
};
use crate::application::use_cases::auth::{AuthError, consume_token, validate_password};
use crate::infrastructure::crypto;

pub struct ResetPassword<'a, U, S, V>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
    V: VerificationRepository + ?Sized,
{
    pub users: &'a U,
    pub sessions: &'a S,
    pub verifications: &'a V,
}

impl<'a, U, S, V> ResetPassword<'a, U, S, V>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
    V: VerificationRepository + ?Sized,
{
    pub async fn execute(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let row = consume_token(self.verifications, VerificationPurpose::ResetPassword, token)
            .await?;

        let hash = crypto::hash_password(new_password)?;
        if !self.users.update_password(row.user_id, &hash).await? {
            return Err(AuthError::InvalidToken);
        }
        let revoked = self.sessions.delete_all_for_user(row.user_id).await?;
        tracing::info!(user_id = %row.user_id, revoked, "password_reset_completed");
        Ok(())
    }
}
