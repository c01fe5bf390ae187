//! HTTP client for the LM Studio (OpenAI compatible) API

use crate::infrastructure::entities::{ChatCompletionRequest, Endpoint, Turn};
use crate::infrastructure::errors::BridgeError;
use crate::infrastructure::settings::BridgeSettings;
use bytes::Bytes;
use di::{Ref, inject, injectable};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use log::debug;
use std::time::Duration;

pub struct InferenceClient {
    http: reqwest::Client,
    temperature: f32,
}

#[injectable]
impl InferenceClient {
    #[inject]
    pub fn create(settings: Ref<BridgeSettings>) -> InferenceClient {
        InferenceClient::new(&settings)
    }
}

impl InferenceClient {
    /// The client has no overall timeout: a chat stream runs as long as the server keeps it open.
    pub fn new(settings: &BridgeSettings) -> InferenceClient {
        InferenceClient {
            http: reqwest::Client::new(),
            temperature: settings.temperature,
        }
    }

    /// `GET {base}/v1/models`, successful only on a 200 answer within `timeout`.
    pub async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> bool {
        match self
            .http
            .get(endpoint.models_url())
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("probe of {} failed: {e}", endpoint.base_url());
                false
            }
        }
    }

    /// Opens a streaming chat completion over the full history and returns the raw body chunks.
    pub async fn stream_chat(
        &self,
        endpoint: &Endpoint,
        messages: &[Turn],
    ) -> Result<BoxStream<'static, reqwest::Result<Bytes>>, BridgeError> {
        let response = self
            .http
            .post(endpoint.chat_completions_url())
            .json(&ChatCompletionRequest {
                messages,
                stream: true,
                temperature: self.temperature,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BridgeError::UpstreamStatus(response.status()));
        }

        Ok(response.bytes_stream().boxed())
    }
}
