//! LAN chat bridge for LM Studio - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod core;
pub mod infrastructure;

use crate::core::services::{BridgeChatService, BridgeHealthService};
use crate::infrastructure::inference::InferenceClient;
use crate::infrastructure::locator::HttpEndpointLocator;
use crate::infrastructure::repositories::InMemorySessionRepository;
use crate::infrastructure::settings::BridgeSettings;
use anyhow::anyhow;
use di::{Injectable, ServiceCollection, ServiceProvider};

/// Registers the bridge services.
///
/// Endpoint state and sessions are singletons and live as long as the provider.
pub fn service_provider() -> anyhow::Result<ServiceProvider> {
    ServiceCollection::new()
        .add(BridgeSettings::singleton())
        .add(InferenceClient::singleton())
        .add(HttpEndpointLocator::singleton())
        .add(InMemorySessionRepository::singleton())
        .add(BridgeChatService::scoped())
        .add(BridgeHealthService::scoped())
        .build_provider()
        .map_err(|e| anyhow!("invalid service configuration: {e:?}"))
}
