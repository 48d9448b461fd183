use std::sync::Arc;

use dashmap::DashMap;
use metrics::gauge;
use tracing::debug;
use uuid::Uuid;

use crate::application::session::WidgetSession;

/// Live widget sessions, keyed by the id baked into each iframe document.
///
/// Entries exist only while a live stream holds the matching [`SessionLease`].
#[derive(Default, Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, Arc<WidgetSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` under `id`. A reconnecting client replaces its
    /// previous entry; the old lease then leaves the new one alone.
    pub fn open(&self, id: Uuid, session: WidgetSession) -> SessionLease {
        let session = Arc::new(session);
        if let Some(previous) = self.sessions.insert(id, Arc::clone(&session)) {
            previous.unmount();
        }
        self.publish_len();

        SessionLease {
            id,
            session,
            registry: self.clone(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<WidgetSession>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn publish_len(&self) {
        gauge!("mukoko_embed_live_sessions").set(self.sessions.len() as f64);
    }
}

/// Ownership of one live session. Dropping it unmounts the session.
pub struct SessionLease {
    id: Uuid,
    session: Arc<WidgetSession>,
    registry: SessionRegistry,
}

impl SessionLease {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &Arc<WidgetSession> {
        &self.session
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.registry
            .sessions
            .remove_if(&self.id, |_, current| Arc::ptr_eq(current, &self.session));
        self.session.unmount();
        self.registry.publish_len();

        debug!(
            target = "mukoko_embed::http::sessions",
            session_id = %self.id,
            "live session closed"
        );
    }
}
