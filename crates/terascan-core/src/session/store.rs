use super::Session;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-wide session map keyed by operator id.
///
/// Sessions are read as copies and written back with a single atomic
/// replace-by-key; no session is ever mutated in place inside the map.
/// Entries live for the process lifetime, one per distinct operator.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, Session>>,
}

impl SessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the operator's session, creating an empty one on first contact
    pub async fn get_or_create(&self, operator: i64) -> Session {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&operator) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(operator)
            .or_insert_with(|| {
                debug!(operator, "Creating session");
                Session::default()
            })
            .clone()
    }

    /// Copy of the operator's session, if one exists
    pub async fn get(&self, operator: i64) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(&operator).cloned()
    }

    /// Replace the operator's session as a whole
    pub async fn replace(&self, operator: i64, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(operator, session);
    }

    /// Replace the operator's session with an empty one, returning the old one
    pub async fn reset(&self, operator: i64) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .insert(operator, Session::default())
            .unwrap_or_default()
    }

    /// Number of known operators
    pub async fn len(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Check if no operator has interacted yet
    pub async fn is_empty(&self) -> bool {
        let sessions = self.sessions.read().await;
        sessions.is_empty()
    }
}
