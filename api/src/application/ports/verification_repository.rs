use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPurpose {
    ResetPassword,
    VerifyEmail,
}

impl VerificationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationPurpose::ResetPassword => "reset-password",
            VerificationPurpose::VerifyEmail => "verify-email",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: VerificationPurpose,
    pub expires_at: DateTime<Utc>,
}

/// Tokens are only ever handled here by their hash.
#[async_trait]
pub trait VerificationRepository: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        purpose: VerificationPurpose,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<VerificationRow>;
    async fn find_by_hash(
        &self,
        purpose: VerificationPurpose,
        token_hash: &str,
    ) -> anyhow::Result<Option<VerificationRow>>;
    /// Deletes and returns the row in one step; only one caller can win a token.
    async fn consume(
        &self,
        purpose: VerificationPurpose,
        token_hash: &str,
    ) -> anyhow::Result<Option<VerificationRow>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
