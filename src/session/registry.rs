use super::session::Session;
use crate::roster::normalize_phone;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
#[error("a session for call {0} is already registered")]
pub struct DuplicateSessionError(pub String);

/// Process-wide table of active sessions, owned by the server and injected
/// into every handler.
///
/// Sessions are kept in registration order so the phone-number scan has a
/// deterministic tie-break: the oldest session wins. Phone numbers are
/// expected to be active in at most one call at a time; that expectation is
/// a policy assumption, not enforced here.
pub struct SessionRegistry {
    sessions: RwLock<Vec<Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
        }
    }

    /// Insert under the session's call id.
    pub async fn register(&self, session: Arc<Session>) -> Result<(), DuplicateSessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.iter().any(|s| s.call_id() == session.call_id()) {
            return Err(DuplicateSessionError(session.call_id().to_string()));
        }
        debug!("Registering session for call {}", session.call_id());
        sessions.push(session);
        Ok(())
    }

    /// Remove the session for `call_id`; no-op if absent.
    pub async fn unregister(&self, call_id: &str) {
        self.sessions.write().await.retain(|s| s.call_id() != call_id);
    }

    /// Route an inbound phone number to the session tracking it as a member.
    pub async fn find_by_phone_number(&self, tel: &str) -> Option<Arc<Session>> {
        let tn = normalize_phone(tel);
        let sessions: Vec<Arc<Session>> = self.sessions.read().await.clone();

        for session in sessions {
            if session.has_member(tn).await {
                debug!("Found session {} for number {}", session.call_id(), tn);
                return Some(session);
            }
        }

        debug!("No active session tracks number {}", tn);
        None
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
