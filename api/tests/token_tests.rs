mod common;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use appstack::application::ports::user_repository::UserRepository;
use appstack::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository, VerificationRow,
};
use appstack::application::use_cases::auth::AuthError;
use appstack::application::use_cases::auth::reset_password::ResetPassword;
use appstack::application::use_cases::auth::verify_email::VerifyEmail;
use appstack::infrastructure::crypto;

use common::{MemorySessions, MemoryUsers, MemoryVerifications};

/// Hands control back to the scheduler before every call so concurrent
/// requests interleave at each await point.
#[derive(Default)]
struct InterleavingVerifications(MemoryVerifications);

#[async_trait]
impl VerificationRepository for InterleavingVerifications {
    async fn create(
        &self,
        user_id: Uuid,
        purpose: VerificationPurpose,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<VerificationRow> {
        tokio::task::yield_now().await;
        self.0.create(user_id, purpose, token_hash, expires_at).await
    }

    async fn find_by_hash(
        &self,
        purpose: VerificationPurpose,
        token_hash: &str,
    ) -> anyhow::Result<Option<VerificationRow>> {
        tokio::task::yield_now().await;
        self.0.find_by_hash(purpose, token_hash).await
    }

    async fn consume(
        &self,
        purpose: VerificationPurpose,
        token_hash: &str,
    ) -> anyhow::Result<Option<VerificationRow>> {
        tokio::task::yield_now().await;
        self.0.consume(purpose, token_hash).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        tokio::task::yield_now().await;
        self.0.delete(id).await
    }
}

async fn issue(
    verifications: &InterleavingVerifications,
    user_id: Uuid,
    purpose: VerificationPurpose,
) -> String {
    let token = crypto::generate_token();
    verifications
        .create(
            user_id,
            purpose,
            &crypto::hash_token(&token),
            Utc::now() + Duration::hours(1),
        )
        .await
        .unwrap();
    token
}

fn exactly_one_wins(first: Result<(), AuthError>, second: Result<(), AuthError>) {
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    assert!(matches!(
        first.err().or(second.err()),
        Some(AuthError::InvalidToken)
    ));
}

#[tokio::test]
async fn concurrent_resets_cannot_share_a_token() {
    let users = MemoryUsers::default();
    let sessions = MemorySessions::default();
    let verifications = InterleavingVerifications::default();
    let user = users
        .create_user("jane@example.com", "Jane", "unused")
        .await
        .unwrap()
        .unwrap();
    let token = issue(&verifications, user.id, VerificationPurpose::ResetPassword).await;

    let uc = ResetPassword {
        users: &users,
        sessions: &sessions,
        verifications: &verifications,
    };
    let (first, second) = tokio::join!(
        uc.execute(&token, "password-one"),
        uc.execute(&token, "password-two")
    );
    exactly_one_wins(first, second);
    assert_eq!(verifications.0.count(), 0);
}

#[tokio::test]
async fn concurrent_verifications_cannot_share_a_token() {
    let users = MemoryUsers::default();
    let verifications = InterleavingVerifications::default();
    let user = users
        .create_user("jane@example.com", "Jane", "unused")
        .await
        .unwrap()
        .unwrap();
    let token = issue(&verifications, user.id, VerificationPurpose::VerifyEmail).await;

    let uc = VerifyEmail {
        users: &users,
        verifications: &verifications,
    };
    let (first, second) = tokio::join!(uc.execute(&token), uc.execute(&token));
    exactly_one_wins(first.map(|_| ()), second.map(|_| ()));
}

#[tokio::test]
async fn expired_token_is_spent_on_first_use() {
    let users = MemoryUsers::default();
    let sessions = MemorySessions::default();
    let verifications = InterleavingVerifications::default();
    let user = users
        .create_user("jane@example.com", "Jane", "unused")
        .await
        .unwrap()
        .unwrap();
    let token = issue(&verifications, user.id, VerificationPurpose::ResetPassword).await;
    verifications.0.expire_all();

    let uc = ResetPassword {
        users: &users,
        sessions: &sessions,
        verifications: &verifications,
    };
    let result = uc.execute(&token, "password-one").await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
    assert_eq!(verifications.0.count(), 0);
}
