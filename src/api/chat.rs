//! Chat endpoint

use crate::api::chat::schemas::ChatRequest;
use crate::core::traits::{ChatService, EventStream};
use crate::infrastructure::errors::BridgeError;
use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use di_axum::Inject;
use log::debug;

/// `POST /chat`: relays the latest message of the request, with the session's history, to LM
/// Studio and streams the answer back as server-sent events.
///
/// Input errors and a missing inference server are answered with a JSON error instead of a stream.
pub async fn chat(
    Inject(chat_service): Inject<dyn ChatService>,
    body: Bytes,
) -> Result<Response, BridgeError> {
    let request = ChatRequest::parse(&body)?;
    let session_id = request.session_id();
    let user_turn = request.into_latest_turn()?;

    debug!("chat message for session {session_id}");
    let events = chat_service.relay(&session_id, user_turn).await?;

    Ok(event_stream_response(events))
}

fn event_stream_response(events: EventStream) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(events),
    )
        .into_response()
}

pub mod schemas {
    use crate::infrastructure::entities::Turn;
    use crate::infrastructure::errors::BridgeError;
    use crate::infrastructure::settings::DEFAULT_SESSION_ID;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct ChatRequest {
        #[serde(default)]
        pub session_id: Option<String>,
        #[serde(default)]
        pub messages: Vec<Turn>,
    }

    impl ChatRequest {
        pub fn parse(body: &[u8]) -> Result<ChatRequest, BridgeError> {
            serde_json::from_slice(body).map_err(|_| BridgeError::InvalidJson)
        }

        /// Anonymous clients all share one session.
        pub fn session_id(&self) -> String {
            self.session_id
                .clone()
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_owned())
        }

        /// The history is kept server side, so only the last message is new.
        pub fn into_latest_turn(self) -> Result<Turn, BridgeError> {
            self.messages.into_iter().last().ok_or(BridgeError::NoMessages)
        }
    }

}
