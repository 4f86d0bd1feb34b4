use uuid::Uuid;

use crate::application::ports::session_repository::SessionRepository;

pub struct SignOut<'a, S: SessionRepository + ?Sized> {
    pub sessions: &'a S,
}

impl<'a, S: SessionRepository + ?Sized> SignOut<'a, S> {
    pub async fn execute(&self, session_id: Uuid) -> anyhow::Result<bool> {
        self.sessions.delete_session(session_id).await
    }
}
