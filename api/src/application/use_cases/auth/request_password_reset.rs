use chrono::{Duration, Utc};

use crate::application::ports::mailer::Mailer;
use crate::application::ports::user_repository::UserRepository;
use crate::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository,
};
use crate::application::services::email_templates;
use crate::application::use_cases::auth::{AuthError, normalize_email};
use crate::infrastructure::crypto;

pub struct RequestPasswordReset<'a, U, V, M>
where
    U: UserRepository + ?Sized,
    V: VerificationRepository + ?Sized,
    M: Mailer + ?Sized,
{
    pub users: &'a U,
    pub verifications: &'a V,
    pub mailer: &'a M,
    /// Public auth base URL, e.g. `https://app.example.com/api/auth`.
    pub base_url: &'a str,
    pub token_ttl_secs: i64,
}

impl<'a, U, V, M> RequestPasswordReset<'a, U, V, M>
where
    U: UserRepository + ?Sized,
    V: VerificationRepository + ?Sized,
    M: Mailer + ?Sized,
{
    /// Succeeds silently for unknown emails.
    pub async fn execute(&self, email: &str, redirect_to: Option<&str>) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("password_reset_unknown_email");
            return Ok(());
        };

        let token = crypto::generate_token();
        let expires_at = Utc::now() + Duration::seconds(self.token_ttl_secs);
        self.verifications
            .create(
                user.id,
                VerificationPurpose::ResetPassword,
                &crypto::hash_token(&token),
                expires_at,
            )
            .await?;

        let url = reset_password_url(self.base_url, &token, redirect_to);
        self.mailer
            .send(email_templates::reset_password(&user.email, &url))
            .await?;
        tracing::info!(user_id = %user.id, "password_reset_requested");
        Ok(())
    }
}

pub fn reset_password_url(base_url: &str, token: &str, redirect_to: Option<&str>) -> String {
    let callback = redirect_to.filter(|s| !s.is_empty()).unwrap_or("/");
    format!(
        "{}/reset-password/{}?callbackURL={}",
        base_url.trim_end_matches('/'),
        token,
        urlencoding::encode(callback)
    )
}
