//! Sesiones activas del panel
//!
//! Objeto explícito con ciclo de vida `create` / `read` / `clear`; no hay
//! estado global de sesión.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AuthMethod, Session};

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Crea una sesión nueva y descarta las vencidas
    pub async fn create(
        &self,
        email: &str,
        method: AuthMethod,
        provider_token: Option<String>,
    ) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            email: email.to_string(),
            method,
            provider_token,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        if sessions.len() < before {
            debug!("{} sesiones vencidas descartadas", before - sessions.len());
        }
        sessions.insert(session.id, session.clone());
        session
    }

    /// Sesión vigente; las vencidas se descartan al leerlas
    pub async fn read(&self, id: Uuid) -> Option<Session> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        if session.is_expired(Utc::now()) {
            debug!("Sesión {} vencida", id);
            self.sessions.write().await.remove(&id);
            return None;
        }
        Some(session)
    }

    pub async fn clear(&self, id: Uuid) -> Option<Session> {
        self.sessions.write().await.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_read_clear() {
        let store = SessionStore::new(Duration::hours(1));
        let session = store
            .create("admin@valpotec.cl", AuthMethod::LocalPassword, None)
            .await;

        assert_eq!(store.read(session.id).await, Some(session.clone()));
        assert_eq!(store.sessions.read().await.len(), 1);
        assert!(store.clear(session.id).await.is_some());
        assert!(store.read(session.id).await.is_none());
        assert!(store.clear(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_returned() {
        let store = SessionStore::new(Duration::seconds(-1));
        let session = store
            .create("admin@valpotec.cl", AuthMethod::LocalPassword, None)
            .await;
        assert!(store.read(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_create_discards_abandoned_expired_sessions() {
        let store = SessionStore::new(Duration::hours(1));
        let abandoned = store
            .create("admin@valpotec.cl", AuthMethod::LocalPassword, None)
            .await;
        if let Some(s) = store.sessions.write().await.get_mut(&abandoned.id) {
            s.expires_at = Utc::now() - Duration::seconds(1);
        }

        let fresh = store
            .create("tecnico@valpotec.cl", AuthMethod::LocalPassword, None)
            .await;

        let sessions = store.sessions.read().await;
        assert!(!sessions.contains_key(&abandoned.id));
        assert!(sessions.contains_key(&fresh.id));
        assert_eq!(sessions.len(), 1);
    }
}
