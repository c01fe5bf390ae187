//! In-process session storage

use crate::infrastructure::entities::{Session, SessionHandle, Turn};
use crate::infrastructure::traits::SessionRepository;
use async_trait::async_trait;
use di::{inject, injectable};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Sessions live for the lifetime of the process; nothing is ever evicted.
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

#[injectable(SessionRepository)]
impl InMemorySessionRepository {
    #[inject]
    pub fn new() -> InMemorySessionRepository {
        InMemorySessionRepository {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        InMemorySessionRepository::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        self.sessions
            .write()
            .await
            .entry(session_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(Session::default())))
            .clone()
    }

    async fn history(&self, session_id: &str) -> Vec<Turn> {
        let session = self.sessions.read().await.get(session_id).cloned();
        match session {
            Some(session) => session.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }
}
