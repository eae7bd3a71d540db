use std::sync::Arc;

use irremote_core::{Dispatcher, IrBackend};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub metrics: Arc<Metrics>,
    /// Upper bound for `/api` bodies, read only after method and content type pass.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(backend: Arc<dyn IrBackend>, metrics: Arc<Metrics>, max_body_bytes: usize) -> Self {
        Self { dispatcher: Dispatcher::new(backend), metrics, max_body_bytes }
    }

    pub fn backend(&self) -> &Arc<dyn IrBackend> {
        self.dispatcher.backend()
    }
}
