//! Implementations for the service the app needs.
//!

use crate::core::relay::{LineSplitter, ReplyAccumulator, data_payload, frame, parse_delta};
use crate::core::traits::{ChatService, EventStream, HealthService, HealthStatus};
use crate::infrastructure::entities::Turn;
use crate::infrastructure::errors::BridgeError;
use crate::infrastructure::inference::InferenceClient;
use crate::infrastructure::settings::HEALTH_PROBE_TIMEOUT;
use crate::infrastructure::traits::{EndpointLocator, SessionRepository};
use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use di::{Ref, inject, injectable};
use futures_util::StreamExt;
use log::{debug, error};
use std::convert::Infallible;

pub struct BridgeChatService {
    locator: Ref<dyn EndpointLocator>,
    sessions: Ref<dyn SessionRepository>,
    client: Ref<InferenceClient>,
}

#[injectable(ChatService)]
impl BridgeChatService {
    #[inject]
    pub fn new(
        locator: Ref<dyn EndpointLocator>,
        sessions: Ref<dyn SessionRepository>,
        client: Ref<InferenceClient>,
    ) -> BridgeChatService {
        BridgeChatService {
            locator,
            sessions,
            client,
        }
    }
}

#[async_trait]
impl ChatService for BridgeChatService {
    async fn relay(&self, session_id: &str, user_turn: Turn) -> Result<EventStream, BridgeError> {
        let endpoint = self.locator.resolve().await?;

        // The lock is held until the stream ends or is dropped, so exchanges on one session never
        // interleave.
        let mut session = self
            .sessions
            .get_or_create(session_id)
            .await
            .lock_owned()
            .await;
        session.append(user_turn);
        let history = session.turns().to_vec();

        let locator = self.locator.clone();
        let client = self.client.clone();
        let mut progress = StreamProgress::new(session_id);

        let events = stream! {
            debug!(
                "relaying {} turns of session {} to {}",
                history.len(),
                progress.session_id,
                endpoint.base_url()
            );

            let mut upstream = match client.stream_chat(&endpoint, &history).await {
                Ok(upstream) => upstream,
                Err(e) => {
                    error!("chat request to {} failed: {e}", endpoint.base_url());
                    if matches!(e, BridgeError::Upstream(_)) {
                        locator.invalidate(&endpoint).await;
                    }
                    progress.finish();
                    yield Bytes::from(e.as_event_frame());
                    return;
                }
            };

            let mut lines = LineSplitter::default();
            let mut reply = ReplyAccumulator::default();

            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(chunk) => {
                        for line in lines.push(&chunk) {
                            if let Some(event) = relay_line(&line, &mut reply) {
                                yield event;
                            }
                        }
                    }
                    Err(e) => {
                        // Whatever arrived so far is dropped; only complete replies are kept.
                        error!("chat stream from {} broke off: {e}", endpoint.base_url());
                        locator.invalidate(&endpoint).await;
                        progress.finish();
                        yield Bytes::from(BridgeError::from(e).as_event_frame());
                        return;
                    }
                }
            }

            if let Some(line) = lines.finish() {
                if let Some(event) = relay_line(&line, &mut reply) {
                    yield event;
                }
            }

            if let Some(text) = reply.finish() {
                session.append(Turn::assistant(text));
            }
            progress.finish();
            debug!(
                "session {} now holds {} turns",
                progress.session_id,
                session.len()
            );
        };

        Ok(events.map(Ok::<_, Infallible>).boxed())
    }
}

/// Forwards data lines unchanged and feeds their payload to the accumulator.
fn relay_line(line: &str, reply: &mut ReplyAccumulator) -> Option<Bytes> {
    let payload = data_payload(line)?;
    reply.accept(parse_delta(payload));
    Some(frame(line))
}

/// Notes when the browser goes away before the reply is complete.
struct StreamProgress {
    session_id: String,
    finished: bool,
}

impl StreamProgress {
    fn new(session_id: &str) -> StreamProgress {
        StreamProgress {
            session_id: session_id.to_owned(),
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for StreamProgress {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                "client of session {} disconnected, cancelling upstream request",
                self.session_id
            );
        }
    }
}

pub struct BridgeHealthService {
    locator: Ref<dyn EndpointLocator>,
}

#[injectable(HealthService)]
impl BridgeHealthService {
    #[inject]
    pub fn new(locator: Ref<dyn EndpointLocator>) -> BridgeHealthService {
        BridgeHealthService { locator }
    }
}

#[async_trait]
impl HealthService for BridgeHealthService {
    async fn check(&self) -> HealthStatus {
        match self.locator.active().await {
            None => HealthStatus::Offline {
                reason: Some("No URL discovery".to_owned()),
            },
            Some(endpoint) => {
                if self.locator.probe(&endpoint, HEALTH_PROBE_TIMEOUT).await {
                    HealthStatus::Online
                } else {
                    HealthStatus::Offline { reason: None }
                }
            }
        }
    }
}
