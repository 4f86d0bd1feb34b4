use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::session_repository::{SessionRepository, SessionRow};
use crate::application::ports::user_repository::{UserRepository, UserRow};

pub struct GetSession<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    pub users: &'a U,
    pub sessions: &'a S,
}

impl<'a, U, S> GetSession<'a, U, S>
where
    U: UserRepository + ?Sized,
    S: SessionRepository + ?Sized,
{
    /// `None` when the session was revoked, expired, or belongs to someone else.
    pub async fn execute(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<(SessionRow, UserRow)>> {
        let Some(session) = self.sessions.find_by_id(session_id).await? else {
            return Ok(None);
        };
        if session.user_id != user_id {
            return Ok(None);
        }
        if session.expires_at <= Utc::now() {
            self.sessions.delete_session(session.id).await?;
            return Ok(None);
        }
        let user = self.users.find_by_id(user_id).await?;
        Ok(user.map(|mut u| {
            u.password_hash = None;
            (session, u)
        }))
    }
}
