pub mod client;
pub mod config;
pub mod emitter;

pub use client::{BridgeEvent, MqttService};
pub use config::MqttConfig;
pub use emitter::MqttEmitter;
