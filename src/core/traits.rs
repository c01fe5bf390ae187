//! DI "Interfaces"

use crate::infrastructure::entities::Turn;
use crate::infrastructure::errors::BridgeError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use std::convert::Infallible;

/// Server-sent-event body sent back to the browser.
pub type EventStream = BoxStream<'static, Result<Bytes, Infallible>>;

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Records `user_turn` in the session and relays the model's streamed answer.
    ///
    /// Fails before touching the session if no inference server can be found. Once the stream is
    /// returned every further failure is reported inside it as a final `data: {"error": ...}` frame.
    async fn relay(&self, session_id: &str, user_turn: Turn) -> Result<EventStream, BridgeError>;
}

#[async_trait]
pub trait HealthService: Send + Sync {
    /// Probes the active endpoint. Never triggers discovery.
    async fn check(&self) -> HealthStatus;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Online,
    Offline { reason: Option<String> },
}
