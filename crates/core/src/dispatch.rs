use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backend::{BackendError, IrBackend};
use crate::command::{Command, EncodedCommand, RawCommand};

// Named protocols are always sent once, without repeats.
pub const REPEATS: u8 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub pin: u8,
    pub kind: &'static str,
}

/// Routes validated commands to the emitter backend.
///
/// All clones share the same backend and the same lock, so one request's
/// pin change and transmission never interleave with another's. Callers are
/// sharing one physical emitter; any of them may move it to another pin.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn IrBackend>,
    emitter: Arc<Mutex<()>>,
    // Set once any command has chosen a pin; the boot default must not override it.
    dispatched: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn IrBackend>) -> Self {
        Self {
            backend,
            emitter: Arc::new(Mutex::new(())),
            dispatched: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend(&self) -> &Arc<dyn IrBackend> {
        &self.backend
    }

    pub fn has_dispatched(&self) -> bool {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Applies the boot-time pin unless a command already picked one.
    /// Returns whether the pin was applied.
    pub async fn configure_default_pin(&self, pin: u8) -> Result<bool, BackendError> {
        let _guard = self.emitter.lock().await;
        if self.has_dispatched() {
            return Ok(false);
        }
        self.backend.configure_output_pin(pin).await?;
        Ok(true)
    }

    pub async fn dispatch(&self, cmd: &Command) -> Result<Ack, BackendError> {
        let _guard = self.emitter.lock().await;
        self.dispatched.store(true, Ordering::Relaxed);

        debug!(pin = cmd.pin(), "configuring output pin");
        self.backend.configure_output_pin(cmd.pin()).await?;

        match cmd {
            Command::Raw(raw) => self.send_raw(raw).await?,
            Command::Encoded(enc) => self.send_encoded(enc).await?,
        }

        Ok(Ack { pin: cmd.pin(), kind: cmd.kind() })
    }

    async fn send_raw(&self, cmd: &RawCommand) -> Result<(), BackendError> {
        info!(pin = cmd.pin, frequency_khz = cmd.frequency_khz, pulses = cmd.pulses.len(), "sending raw IR signal");
        self.backend.transmit_raw(&cmd.pulses, cmd.frequency_khz).await
    }

    async fn send_encoded(&self, cmd: &EncodedCommand) -> Result<(), BackendError> {
        let family = cmd.protocol.family();
        info!(
            pin = cmd.pin,
            protocol = %cmd.protocol,
            address = cmd.address,
            function = cmd.function,
            "sending encoded IR signal"
        );
        self.backend
            .transmit_encoded(family, cmd.address, cmd.function, REPEATS, family.toggle())
            .await
    }
}
