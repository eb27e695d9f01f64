//! Session handle owned by the connection manager.

use crate::transport::HostSession;
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

/// An established session and the bookkeeping needed to health-check it
pub struct SessionHandle {
    pub(crate) session: Box<dyn HostSession>,
    session_id: Uuid,
    connected_at: DateTime<Utc>,
    /// `None` once the cached check has been expired
    pub(crate) last_health_check: Option<Instant>,
}

impl SessionHandle {
    pub(crate) fn new(session: Box<dyn HostSession>, checked_at: Instant) -> Self {
        Self {
            session,
            session_id: Uuid::new_v4(),
            connected_at: Utc::now(),
            last_health_check: Some(checked_at),
        }
    }

    /// Identifier used in log fields
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn last_health_check(&self) -> Option<Instant> {
        self.last_health_check
    }

    pub fn user_id(&self) -> &str {
        self.session.user_id()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("user", &self.session.user_id())
            .field("connected_at", &self.connected_at)
            .finish()
    }
}
