use crate::application::ports::user_repository::{UserRepository, UserRow};
use crate::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository,
};
use crate::application::use_cases::auth::{AuthError, consume_token};

pub struct VerifyEmail<'a, U, V>
where
    U: UserRepository + ?Sized,
    V: VerificationRepository + ?Sized,
{
    pub users: &'a U,
    pub verifications: &'a V,
}

impl<'a, U, V> VerifyEmail<'a, U, V>
where
    U: UserRepository + ?Sized,
    V: VerificationRepository + ?Sized,
{
    pub async fn execute(&self, token: &str) -> Result<UserRow, AuthError> {
        let row =
            consume_token(self.verifications, VerificationPurpose::VerifyEmail, token).await?;
        self.users.mark_email_verified(row.user_id).await?;
        let mut user = self
            .users
            .find_by_id(row.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        user.password_hash = None;
        tracing::info!(user_id = %user.id, "email_verified");
        Ok(user)
    }
}
