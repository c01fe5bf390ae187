//! Health endpoint

use crate::core::traits::{HealthService, HealthStatus};
use axum::Json;
use di_axum::Inject;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<HealthStatus> for Health {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Online => Health {
                status: "online",
                reason: None,
            },
            HealthStatus::Offline { reason } => Health {
                status: "offline",
                reason,
            },
        }
    }
}

/// `GET /health`: re-probes the active endpoint, so this does network I/O on every call.
pub async fn health(Inject(health_service): Inject<dyn HealthService>) -> Json<Health> {
    Json(health_service.check().await.into())
}
