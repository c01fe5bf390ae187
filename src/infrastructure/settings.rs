//! Bridge configuration, read from the environment

use di::{inject, injectable};
use log::warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LM_PORT: u16 = 1234;
pub const DEFAULT_BRIDGE_PORT: u16 = 8000;
pub const DEFAULT_SESSION_ID: &str = "default_guest";

/// Timeout of a single liveness probe during discovery.
pub const DISCOVERY_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);
/// Timeout of the liveness probe issued by `GET /health`.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeSettings {
    pub lm_port: u16,
    /// Replaces the built-in localhost / loopback / LAN candidates when set.
    pub candidate_overrides: Option<Vec<String>>,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub temperature: f32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        BridgeSettings {
            lm_port: DEFAULT_LM_PORT,
            candidate_overrides: None,
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_BRIDGE_PORT,
            static_dir: "static".to_owned(),
            temperature: 0.7,
        }
    }
}

#[injectable]
impl BridgeSettings {
    #[inject]
    pub fn create() -> BridgeSettings {
        dotenvy::dotenv().ok();
        BridgeSettings::from_env()
    }
}

impl BridgeSettings {
    pub fn from_env() -> BridgeSettings {
        let defaults = BridgeSettings::default();

        BridgeSettings {
            lm_port: parse_var("LM_STUDIO_PORT", defaults.lm_port),
            candidate_overrides: env::var("LM_STUDIO_CANDIDATES")
                .ok()
                .map(|raw| split_candidates(&raw))
                .filter(|candidates| !candidates.is_empty()),
            host: env::var("BRIDGE_HOST").unwrap_or(defaults.host),
            port: parse_var("BRIDGE_PORT", defaults.port),
            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
            temperature: parse_var("LM_STUDIO_TEMPERATURE", defaults.temperature),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => T::from_str(raw.trim()).unwrap_or_else(|_| {
            warn!("ignoring unparseable {name}={raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}

fn split_candidates(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|candidate| candidate.trim().trim_end_matches('/'))
        .filter(|candidate| !candidate.is_empty())
        .map(str::to_owned)
        .collect()
}
