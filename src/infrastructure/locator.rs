//! Discovery of the inference server among a few likely addresses

use crate::infrastructure::entities::{Endpoint, EndpointState};
use crate::infrastructure::errors::BridgeError;
use crate::infrastructure::inference::InferenceClient;
use crate::infrastructure::network;
use crate::infrastructure::settings::{BridgeSettings, DISCOVERY_PROBE_TIMEOUT};
use crate::infrastructure::traits::EndpointLocator;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub struct HttpEndpointLocator {
    settings: Ref<BridgeSettings>,
    client: Ref<InferenceClient>,
    state: RwLock<EndpointState>,
    // Serializes discovery runs so concurrent requests don't probe the same candidates twice.
    discovery: Mutex<()>,
}

#[injectable(EndpointLocator)]
impl HttpEndpointLocator {
    #[inject]
    pub fn new(settings: Ref<BridgeSettings>, client: Ref<InferenceClient>) -> HttpEndpointLocator {
        HttpEndpointLocator {
            settings,
            client,
            state: RwLock::new(EndpointState::Undiscovered),
            discovery: Mutex::new(()),
        }
    }
}

impl HttpEndpointLocator {
    pub async fn state(&self) -> EndpointState {
        self.state.read().await.clone()
    }

    async fn candidates(&self) -> Vec<Endpoint> {
        match &self.settings.candidate_overrides {
            Some(overrides) => overrides.iter().map(Endpoint::new).collect(),
            None => default_candidates(self.settings.lm_port, &network::lan_ip().await),
        }
    }

    /// Callers must hold the discovery lock.
    async fn probe_candidates(&self) -> Result<Endpoint, BridgeError> {
        info!("searching for LM Studio...");
        for candidate in self.candidates().await {
            if self.client.probe(&candidate, DISCOVERY_PROBE_TIMEOUT).await {
                info!("found LM Studio at {}", candidate.base_url());
                *self.state.write().await = EndpointState::Active(candidate.clone());
                return Ok(candidate);
            }
            debug!("no LM Studio at {}", candidate.base_url());
        }

        warn!("LM Studio not found, bridge will retry on next request");
        Err(BridgeError::EndpointNotFound)
    }
}

/// Loopback hostname, loopback literal, then the LAN-facing address.
pub fn default_candidates(port: u16, lan_ip: &str) -> Vec<Endpoint> {
    ["localhost", "127.0.0.1", lan_ip]
        .into_iter()
        .map(|host| Endpoint::new(format!("http://{host}:{port}")))
        .collect()
}

#[async_trait]
impl EndpointLocator for HttpEndpointLocator {
    async fn active(&self) -> Option<Endpoint> {
        match &*self.state.read().await {
            EndpointState::Active(endpoint) => Some(endpoint.clone()),
            EndpointState::Undiscovered => None,
        }
    }

    async fn discover(&self) -> Result<Endpoint, BridgeError> {
        let _discovery = self.discovery.lock().await;
        self.probe_candidates().await
    }

    async fn invalidate(&self, stale: &Endpoint) {
        let mut state = self.state.write().await;
        if *state == EndpointState::Active(stale.clone()) {
            warn!("forgetting unreachable endpoint {}", stale.base_url());
            *state = EndpointState::Undiscovered;
        }
    }

    async fn probe(&self, endpoint: &Endpoint, timeout: Duration) -> bool {
        self.client.probe(endpoint, timeout).await
    }

    async fn resolve(&self) -> Result<Endpoint, BridgeError> {
        if let Some(endpoint) = self.active().await {
            return Ok(endpoint);
        }

        // Someone may have finished discovering while we waited for the lock.
        let _discovery = self.discovery.lock().await;
        if let Some(endpoint) = self.active().await {
            return Ok(endpoint);
        }
        self.probe_candidates().await
    }
}
