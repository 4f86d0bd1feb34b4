use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::verification_repository::{
    VerificationPurpose, VerificationRepository, VerificationRow,
};
use crate::infrastructure::db::PgPool;

pub struct SqlxVerificationRepository {
    pub pool: PgPool,
}

impl SqlxVerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow, purpose: VerificationPurpose) -> VerificationRow {
    VerificationRow {
        id: r.get("id"),
        user_id: r.get("user_id"),
        purpose,
        expires_at: r.get("expires_at"),
    }
}

#[async_trait]
impl VerificationRepository for SqlxVerificationRepository {
    async fn create(
        &self,
        user_id: Uuid,
        purpose: VerificationPurpose,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<VerificationRow> {
        let row = sqlx::query(
            r#"INSERT INTO verifications (user_id, purpose, token_hash, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, expires_at"#,
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_row(&row, purpose))
    }

    async fn find_by_hash(
        &self,
        purpose: VerificationPurpose,
        token_hash: &str,
    ) -> anyhow::Result<Option<VerificationRow>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, expires_at FROM verifications
               WHERE token_hash = $1 AND purpose = $2"#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| map_row(&r, purpose)))
    }

    async fn consume(
        &self,
        purpose: VerificationPurpose,
        token_hash: &str,
    ) -> anyhow::Result<Option<VerificationRow>> {
        let row = sqlx::query(
            r#"DELETE FROM verifications
               WHERE token_hash = $1 AND purpose = $2
               RETURNING id, user_id, expires_at"#,
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| map_row(&r, purpose)))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM verifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
