use std::env;
use std::net::SocketAddr;

use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Mqtt,
    /// Logs and records transmissions without touching any hardware.
    Log,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub backend: BackendKind,
    pub default_pin: u8,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            backend: BackendKind::Mqtt,
            default_pin: 4,
            max_body_bytes: 16 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = ServerConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("IRREMOTE_HTTP_ADDR") {
            cfg.http_addr = v.parse().with_context(|| format!("Invalid IRREMOTE_HTTP_ADDR: {}", v))?;
        }
        if let Some(v) = non_empty("IRREMOTE_BACKEND") {
            cfg.backend = match v.as_str() {
                "mqtt" => BackendKind::Mqtt,
                "log" => BackendKind::Log,
                other => return Err(anyhow!("Unknown IRREMOTE_BACKEND '{}' (expected 'mqtt' or 'log')", other)),
            };
        }
        if let Some(v) = non_empty("IRREMOTE_DEFAULT_PIN") {
            cfg.default_pin = v.parse().with_context(|| format!("Invalid IRREMOTE_DEFAULT_PIN: {}", v))?;
        }
        if let Some(v) = non_empty("IRREMOTE_MAX_BODY_BYTES") {
            cfg.max_body_bytes = v.parse().with_context(|| format!("Invalid IRREMOTE_MAX_BODY_BYTES: {}", v))?;
        }

        Ok(cfg)
    }
}
