use chrono::{Duration, Utc};

use crate::application::ports::mailer::Mailer;
use crate::application::ports::user_repository::UserRepository;
use crate::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository,
};
use crate::application::services::email_templates;
use crate::application::use_cases::auth::{AuthError, normalize_email};
use crate::infrastructure::crypto;

pub struct SendVerificationEmail<'a, U, V, M>
where
    U: UserRepository + ?Sized,
    V: VerificationRepository + ?Sized,
    M: Mailer + ?Sized,
{
    pub users: &'a U,
    pub verifications: &'a V,
    pub mailer: &'a M,
    pub base_url: &'a str,
    pub token_ttl_secs: i64,
}

impl<'a, U, V, M> SendVerificationEmail<'a, U, V, M>
where
    U: UserRepository + ?Sized,
    V: VerificationRepository + ?Sized,
    M: Mailer + ?Sized,
{
    /// Returns whether an email went out; unknown and already verified users get nothing.
    pub async fn execute(&self, email: &str, callback_url: Option<&str>) -> Result<bool, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            return Ok(false);
        };
        if user.email_verified {
            return Ok(false);
        }

        let token = crypto::generate_token();
        let expires_at = Utc::now() + Duration::seconds(self.token_ttl_secs);
        self.verifications
            .create(
                user.id,
                VerificationPurpose::VerifyEmail,
                &crypto::hash_token(&token),
                expires_at,
            )
            .await?;

        let url = verify_email_url(self.base_url, &token, callback_url);
        self.mailer
            .send(email_templates::verify_email(&user.email, &url))
            .await?;
        Ok(true)
    }
}

pub fn verify_email_url(base_url: &str, token: &str, callback_url: Option<&str>) -> String {
    let callback = callback_url.filter(|s| !s.is_empty()).unwrap_or("/");
    format!(
        "{}/verify-email?token={}&callbackURL={}",
        base_url.trim_end_matches('/'),
        token,
        urlencoding::encode(callback)
    )
}
