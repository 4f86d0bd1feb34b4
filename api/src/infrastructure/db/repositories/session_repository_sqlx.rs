use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::session_repository::{SessionMeta, SessionRepository, SessionRow};
use crate::infrastructure::db::PgPool;

pub struct SqlxSessionRepository {
    pub pool: PgPool,
}

impl SqlxSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_row(r: &PgRow) -> SessionRow {
    SessionRow {
        id: r.get("id"),
        user_id: r.get("user_id"),
        expires_at: r.get("expires_at"),
        created_at: r.get("created_at"),
        ip_address: r.get("ip_address"),
        user_agent: r.get("user_agent"),
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
        meta: &SessionMeta,
    ) -> anyhow::Result<SessionRow> {
        let row = sqlx::query(
            r#"INSERT INTO sessions (user_id, expires_at, ip_address, user_agent)
               VALUES ($1, $2, $3, $4)
               RETURNING id, user_id, expires_at, created_at, ip_address, user_agent"#,
        )
        .bind(user_id)
        .bind(expires_at)
        .bind(meta.ip_address.as_deref())
        .bind(meta.user_agent.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(map_row(&row))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<SessionRow>> {
        let row = sqlx::query(
            r#"SELECT id, user_id, expires_at, created_at, ip_address, user_agent
               FROM sessions WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_row))
    }

    async fn delete_session(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
