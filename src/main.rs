//! LAN chat bridge for LM Studio
//!
//! (c) Softlandia 2025

use lmstudio_chat_bridge::api;
use lmstudio_chat_bridge::infrastructure::network;
use lmstudio_chat_bridge::infrastructure::settings::BridgeSettings;
use lmstudio_chat_bridge::infrastructure::traits::EndpointLocator;

use di_axum::RouterServiceProviderExtensions;
use log::info;
use tokio::runtime::{Builder, Runtime};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = lmstudio_chat_bridge::service_provider()?;
    let settings = provider.get_required::<BridgeSettings>();

    // a failure here is not fatal, the first chat request retries
    let locator = provider.get_required::<dyn EndpointLocator>();
    let _ = locator.discover().await;

    let app = api::router(&settings).with_provider(provider);

    let listener = tokio::net::TcpListener::bind(settings.listen_addr()).await?;
    info!("listening on {}", listener.local_addr()?);
    info!(
        "chat bridge active, open http://{}:{} on any device in the LAN",
        network::lan_ip().await,
        settings.port
    );
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}
