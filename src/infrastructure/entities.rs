//! Bridge entities

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const ASSISTANT_ROLE: &str = "assistant";

/// One message of a conversation. The role is whatever the client sent, or `assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

impl Turn {
    pub fn assistant(content: String) -> Turn {
        Turn {
            role: ASSISTANT_ROLE.to_owned(),
            content,
        }
    }
}

/// Append-only conversation history of one client session.
#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Shared handle to a session. Holding its lock serializes chat exchanges on that session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Base address of a reachable inference server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>) -> Endpoint {
        let base_url: String = base_url.into();
        Endpoint {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

/// Discovery state shared by all requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EndpointState {
    #[default]
    Undiscovered,
    Active(Endpoint),
}

/// Body of the upstream chat-completions call.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub messages: &'a [Turn],
    pub stream: bool,
    pub temperature: f32,
}
