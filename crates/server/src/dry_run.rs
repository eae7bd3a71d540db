use async_trait::async_trait;
use irremote_core::{BackendCall, BackendError, IrBackend, ProtocolFamily, RecordingBackend};
use tracing::info;

// Backend for running without emitter hardware: logs every call and keeps a record.
#[derive(Debug, Default)]
pub struct LogBackend {
    record: RecordingBackend,
}

impl LogBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.record.calls()
    }
}

#[async_trait]
impl IrBackend for LogBackend {
    async fn configure_output_pin(&self, pin: u8) -> Result<(), BackendError> {
        info!(pin, "[dry-run] output pin set");
        self.record.configure_output_pin(pin).await
    }

    async fn transmit_raw(&self, pulses: &[u16], frequency_khz: u8) -> Result<(), BackendError> {
        info!(frequency_khz, ?pulses, "[dry-run] raw transmission");
        self.record.transmit_raw(pulses, frequency_khz).await
    }

    async fn transmit_encoded(
        &self,
        family: ProtocolFamily,
        address: u16,
        function: u16,
        repeat: u8,
        toggle: Option<bool>,
    ) -> Result<(), BackendError> {
        info!(protocol = %family, address, function, repeat, ?toggle, "[dry-run] encoded transmission");
        self.record.transmit_encoded(family, address, function, repeat, toggle).await
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_while_logging() {
        let backend = LogBackend::new();
        backend.configure_output_pin(4).await.unwrap();
        backend.transmit_raw(&[1, 2], 38).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::ConfigurePin(4),
                BackendCall::Raw { pulses: vec![1, 2], frequency_khz: 38 },
            ]
        );
    }
}
