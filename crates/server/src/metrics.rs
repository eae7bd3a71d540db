use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub api_requests: IntCounterVec,   // label: status
    pub transmissions: IntCounterVec,  // label: kind
    pub backend_errors: IntCounter,
    pub backend_ready: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let api_requests = IntCounterVec::new(
            Opts::new("irremote_api_requests_total", "Requests handled by /api, by response status"),
            &["status"],
        )?;
        let transmissions = IntCounterVec::new(
            Opts::new("irremote_transmissions_total", "IR commands handed to the backend, by kind"),
            &["kind"],
        )?;
        let backend_errors = IntCounter::new("irremote_backend_errors_total", "Backend calls that failed")?;
        let backend_ready = IntGauge::new("irremote_backend_ready", "Backend readiness (1 ready, 0 otherwise)")?;

        registry.register(Box::new(api_requests.clone()))?;
        registry.register(Box::new(transmissions.clone()))?;
        registry.register(Box::new(backend_errors.clone()))?;
        registry.register(Box::new(backend_ready.clone()))?;

        Ok(Self { registry, api_requests, transmissions, backend_errors, backend_ready })
    }

    pub fn record_status(&self, status: u16) {
        self.api_requests.with_label_values(&[&status.to_string()]).inc();
    }

    pub fn encode(&self) -> Result<(String, Vec<u8>), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        Ok((encoder.format_type().to_string(), buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_recorded_counters() {
        let m = Metrics::new().unwrap();
        m.record_status(200);
        m.record_status(422);
        m.record_status(422);
        m.transmissions.with_label_values(&["raw"]).inc();

        let (_, body) = m.encode().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(r#"irremote_api_requests_total{status="422"} 2"#));
        assert!(text.contains(r#"irremote_transmissions_total{kind="raw"} 1"#));
    }
}
