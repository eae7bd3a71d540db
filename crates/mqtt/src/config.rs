use hostname::get as get_hostname;
use std::env;

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_secs: u16,
    pub clean_session: bool,
    /// Scopes every topic this service publishes to (`irremote/<emitter_id>/...`).
    pub emitter_id: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: default_client_id(),
            username: None,
            password: None,
            keep_alive_secs: 30,
            clean_session: true,
            emitter_id: "emitter".to_string(),
        }
    }
}

impl MqttConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Empty or unparseable values leave the default in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = MqttConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = non_empty("MQTT_BROKER_HOST") {
            cfg.host = v;
        }
        if let Some(p) = non_empty("MQTT_BROKER_PORT").and_then(|v| v.parse::<u16>().ok()) {
            cfg.port = p;
        }
        if let Some(v) = non_empty("MQTT_CLIENT_ID") {
            cfg.client_id = v;
        }
        if let Some(v) = non_empty("MQTT_USERNAME") {
            cfg.username = Some(v);
        }
        if let Some(v) = non_empty("MQTT_PASSWORD") {
            cfg.password = Some(v);
        }
        if let Some(s) = non_empty("MQTT_KEEP_ALIVE_SECS").and_then(|v| v.parse::<u16>().ok()) {
            cfg.keep_alive_secs = s;
        }
        if let Some(v) = non_empty("IRREMOTE_EMITTER_ID") {
            cfg.emitter_id = v;
        }

        cfg
    }
}

fn default_client_id() -> String {
    let host = get_hostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string());
    let pid = std::process::id();
    format!("irremote-{}-{}", host, pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = MqttConfig::from_lookup(|_| None);
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 1883);
        assert_eq!(cfg.emitter_id, "emitter");
        assert!(cfg.client_id.starts_with("irremote-"));
        assert!(cfg.username.is_none());
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = MqttConfig::from_lookup(lookup(&[
            ("MQTT_BROKER_HOST", "broker.lan"),
            ("MQTT_BROKER_PORT", "8883"),
            ("MQTT_USERNAME", "ir"),
            ("MQTT_PASSWORD", "secret"),
            ("IRREMOTE_EMITTER_ID", "sala"),
        ]));
        assert_eq!(cfg.host, "broker.lan");
        assert_eq!(cfg.port, 8883);
        assert_eq!(cfg.username.as_deref(), Some("ir"));
        assert_eq!(cfg.password.as_deref(), Some("secret"));
        assert_eq!(cfg.emitter_id, "sala");
    }

    #[test]
    fn bad_values_keep_defaults() {
        let cfg = MqttConfig::from_lookup(lookup(&[
            ("MQTT_BROKER_HOST", ""),
            ("MQTT_BROKER_PORT", "not-a-port"),
            ("MQTT_KEEP_ALIVE_SECS", "-5"),
        ]));
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 1883);
        assert_eq!(cfg.keep_alive_secs, 30);
    }
}
