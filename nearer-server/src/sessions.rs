//! Client session registry
//!
//! Maps connection ids to display names. Independent of the queue lock:
//! nothing here is part of the queue's consistency domain.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// One connected client
#[derive(Debug, Clone, Serialize)]
pub struct ClientSession {
    pub id: Uuid,
    /// Set by the `user` command
    pub name: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Connected sessions, keyed by id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, ClientSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its id
    pub fn open(&self) -> Uuid {
        let session = ClientSession {
            id: Uuid::new_v4(),
            name: None,
            connected_at: Utc::now(),
        };
        let id = session.id;
        let count = {
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            sessions.insert(id, session);
            sessions.len()
        };
        info!(session_id = %id, connected = count, "Session opened");
        id
    }

    /// Bind a display name to a session
    ///
    /// Returns false if the session is not connected.
    pub fn identify(&self, id: Uuid, name: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(&id) {
            Some(session) => {
                info!(session_id = %id, name, "Session identified");
                session.name = Some(name.to_string());
                true
            }
            None => false,
        }
    }

    /// Display name, if the session has identified itself
    pub fn display_name(&self, id: Uuid) -> Option<String> {
        self.get(id).and_then(|s| s.name)
    }

    pub fn get(&self, id: Uuid) -> Option<ClientSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn close(&self, id: Uuid) {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(session) = removed {
            info!(
                session_id = %id,
                name = session.name.as_deref().unwrap_or("-"),
                "Session closed"
            );
        }
    }

    pub fn count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Closes its session when dropped
///
/// Held by the SSE stream, so a client disconnect (which drops the stream)
/// removes the session.
#[derive(Debug)]
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: Uuid,
}

impl SessionGuard {
    pub fn new(registry: Arc<SessionRegistry>, id: Uuid) -> Self {
        Self { registry, id }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        debug!(session_id = %self.id, "Session stream dropped");
        self.registry.close(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_identify_close() {
        let registry = SessionRegistry::new();
        let id = registry.open();
        assert!(registry.contains(id));
        assert_eq!(registry.display_name(id), None);

        assert!(registry.identify(id, "alice"));
        assert_eq!(registry.display_name(id).as_deref(), Some("alice"));

        registry.close(id);
        assert!(!registry.contains(id));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_identify_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(!registry.identify(Uuid::new_v4(), "bob"));
    }

    #[test]
    fn test_rename_replaces_display_name() {
        let registry = SessionRegistry::new();
        let id = registry.open();
        registry.identify(id, "alice");
        registry.identify(id, "alicia");
        assert_eq!(registry.display_name(id).as_deref(), Some("alicia"));
    }

    #[test]
    fn test_guard_closes_on_drop() {
        let registry = Arc::new(SessionRegistry::new());
        let id = registry.open();
        let other = registry.open();
        {
            let guard = SessionGuard::new(Arc::clone(&registry), id);
            assert_eq!(guard.id(), id);
            assert_eq!(registry.count(), 2);
        }
        assert!(!registry.contains(id));
        assert!(registry.contains(other));
    }
}
