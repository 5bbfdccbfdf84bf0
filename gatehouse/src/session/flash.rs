//! One-shot messages carried from one request to the next.

use super::{
    errors::SessionResult,
    manager::SessionManager,
    models::{FlashMessage, Session},
};

/// Session-scoped message queue.
///
/// A message pushed while handling one request is returned by the next
/// `pop_all` on the same session and then discarded. Push and pop both run
/// inside the session's critical section, so two concurrent pops never hand
/// out the same message and a pop never drops a message pushed concurrently.
#[derive(Clone)]
pub struct FlashChannel {
    sessions: SessionManager,
}

impl FlashChannel {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Queue a message on the session.
    ///
    /// Returns the session to hand back to the client: pushing onto a session
    /// that was not stored yet stores it.
    pub async fn push(&self, session: &Session, message: FlashMessage) -> SessionResult<Session> {
        let (session, ()) = self
            .sessions
            .update(session, |data| data.flash.push(message))
            .await?;
        Ok(session)
    }

    /// Queue an error message
    pub async fn push_error(
        &self,
        session: &Session,
        text: impl Into<String>,
    ) -> SessionResult<Session> {
        self.push(session, FlashMessage::error(text)).await
    }

    /// Take every pending message, oldest first, leaving the queue empty.
    pub async fn pop_all(&self, session: &Session) -> SessionResult<Vec<FlashMessage>> {
        let (_, messages) = self
            .sessions
            .update(session, |data| std::mem::take(&mut data.flash))
            .await?;
        Ok(messages)
    }
}
