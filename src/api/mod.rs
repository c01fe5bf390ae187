use crate::infrastructure::settings::BridgeSettings;
use axum::Router;
use axum::http::Method;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub mod chat;
pub mod health;
pub mod pages;

/// All bridge routes. The DI provider still has to be attached with `with_provider`.
pub fn router(settings: &BridgeSettings) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .nest_service(
            "/static",
            ServiceBuilder::new().service(ServeDir::new(&settings.static_dir)),
        )
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(Any),
        )
}
