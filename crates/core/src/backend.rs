//! The IR transmission backend seam.
//!
//! A backend stands for one physical emitter. Its output pin is process-wide
//! state: every caller shares it, and the last pin configured wins.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::ProtocolFamily;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("emitter backend unavailable")]
    Unavailable,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait IrBackend: Send + Sync {
    async fn configure_output_pin(&self, pin: u8) -> Result<(), BackendError>;

    async fn transmit_raw(&self, pulses: &[u16], frequency_khz: u8) -> Result<(), BackendError>;

    async fn transmit_encoded(
        &self,
        family: ProtocolFamily,
        address: u16,
        function: u16,
        repeat: u8,
        toggle: Option<bool>,
    ) -> Result<(), BackendError>;

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

/// One call observed by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ConfigurePin(u8),
    Raw { pulses: Vec<u16>, frequency_khz: u8 },
    Encoded {
        family: ProtocolFamily,
        address: u16,
        function: u16,
        repeat: u8,
        toggle: Option<bool>,
    },
}

// Keeps every call in order. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<BackendCall>>,
    pin: Mutex<Option<u8>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn transmissions(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, BackendCall::ConfigurePin(_)))
            .collect()
    }

    pub fn current_pin(&self) -> Option<u8> {
        self.pin.lock().ok().and_then(|p| *p)
    }

    fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        let mut calls = self.calls.lock().map_err(|_| BackendError::Unavailable)?;
        calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl IrBackend for RecordingBackend {
    async fn configure_output_pin(&self, pin: u8) -> Result<(), BackendError> {
        *self.pin.lock().map_err(|_| BackendError::Unavailable)? = Some(pin);
        self.record(BackendCall::ConfigurePin(pin))
    }

    async fn transmit_raw(&self, pulses: &[u16], frequency_khz: u8) -> Result<(), BackendError> {
        self.record(BackendCall::Raw { pulses: pulses.to_vec(), frequency_khz })
    }

    async fn transmit_encoded(
        &self,
        family: ProtocolFamily,
        address: u16,
        function: u16,
        repeat: u8,
        toggle: Option<bool>,
    ) -> Result<(), BackendError> {
        self.record(BackendCall::Encoded { family, address, function, repeat, toggle })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
