//! Session storage keyed by session identifier

use crate::session::Session;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use voyage_common::{Result, VoyageError};

/// A session shared between requests; the lock is held for a whole turn
pub type SharedSession = Arc<Mutex<Session>>;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session, creating an empty one for an unknown identifier
    async fn get_or_create(&self, session_id: &str) -> SharedSession;

    async fn get(&self, session_id: &str) -> Result<SharedSession>;

    /// Fails with `SessionNotFound` when there is nothing to remove
    async fn remove(&self, session_id: &str) -> Result<()>;

    async fn session_ids(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_id: &str) -> SharedSession {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", session_id);
                Arc::new(Mutex::new(Session::new(session_id)))
            })
            .clone()
    }

    async fn get(&self, session_id: &str) -> Result<SharedSession> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| VoyageError::SessionNotFound(session_id.to_string()))
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        match self.sessions.write().await.remove(session_id) {
            Some(_) => {
                debug!("Removed session {}", session_id);
                Ok(())
            }
            None => Err(VoyageError::SessionNotFound(session_id.to_string())),
        }
    }

    async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
