//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities::{Endpoint, SessionHandle, Turn};
use crate::infrastructure::errors::BridgeError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Returns the session stored under `session_id`, inserting an empty one first if needed.
    async fn get_or_create(&self, session_id: &str) -> SessionHandle;

    /// Appends a turn to the end of the session's history.
    async fn append(&self, session_id: &str, turn: Turn) {
        let session = self.get_or_create(session_id).await;
        session.lock().await.append(turn);
    }

    /// Snapshot of the session's history, empty for unknown sessions.
    async fn history(&self, session_id: &str) -> Vec<Turn>;
}

#[async_trait]
pub trait EndpointLocator: Send + Sync {
    /// The currently active endpoint, if discovery ever succeeded and it was not invalidated since.
    async fn active(&self) -> Option<Endpoint>;

    /// Probes the candidate addresses in order and activates the first live one.
    ///
    /// On failure the previous state is left untouched.
    async fn discover(&self) -> Result<Endpoint, BridgeError>;

    /// Forgets `stale` if it is still the active endpoint.
    async fn invalidate(&self, stale: &Endpoint);

    /// Liveness check against the models-listing path.
    async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> bool;

    /// Active endpoint, or a fresh discovery when there is none.
    async fn resolve(&self) -> Result<Endpoint, BridgeError> {
        match self.active().await {
            Some(endpoint) => Ok(endpoint),
            None => self.discover().await,
        }
    }
}
