use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, ClientError, ConnectionError, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS};
use tokio::sync::{broadcast, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::MqttConfig;

const REQUEST_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Connected,
    Disconnected,
    Publish { topic: String, payload: Vec<u8> },
}

/// Handle to the broker the emitter bridge listens on.
///
/// Cloning is cheap; every clone shares one connection. The connection is
/// driven by a background task that keeps retrying until [`disconnect`]
/// is called, so a handle can exist before the broker is reachable.
///
/// [`disconnect`]: MqttService::disconnect
#[derive(Clone)]
pub struct MqttService {
    client: AsyncClient,
    shared: Arc<Shared>,
}

struct Shared {
    ready: AtomicBool,
    closing: AtomicBool,
    events: broadcast::Sender<BridgeEvent>,
    subscriptions: RwLock<HashMap<String, QoS>>,
}

impl MqttService {
    /// Starts the connection task. Must be called inside a tokio runtime.
    pub fn start(config: MqttConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(mqtt_options(&config), REQUEST_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            ready: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            events,
            subscriptions: RwLock::new(HashMap::new()),
        });

        let session = Session {
            eventloop,
            client: client.clone(),
            shared: shared.clone(),
            broker: format!("{}:{}", config.host, config.port),
            backoff: Backoff::default(),
        };
        tokio::spawn(session.run());

        Self { client, shared }
    }

    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Relaxed)
    }

    pub fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.shared.events.subscribe()
    }

    pub async fn publish<T: Into<Vec<u8>>>(&self, topic: &str, qos: QoS, retain: bool, payload: T) -> Result<(), ClientError> {
        self.client.publish(topic, qos, retain, payload).await
    }

    // Remembered so the session can resubscribe after a reconnect.
    pub async fn subscribe(&self, topic: &str, qos: QoS) -> Result<(), ClientError> {
        self.shared.subscriptions.write().await.insert(topic.to_string(), qos);
        self.client.subscribe(topic, qos).await
    }

    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.shared.closing.store(true, Ordering::Relaxed);
        self.shared.set_ready(false);
        self.client.disconnect().await
    }
}

impl Shared {
    fn set_ready(&self, ready: bool) {
        let was = self.ready.swap(ready, Ordering::Relaxed);
        if was != ready {
            let event = if ready { BridgeEvent::Connected } else { BridgeEvent::Disconnected };
            // No receivers is fine.
            let _ = self.events.send(event);
        }
    }
}

fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut opts = MqttOptions::new(&config.client_id, &config.host, config.port);
    opts.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
    opts.set_clean_session(config.clean_session);
    if let (Some(u), Some(p)) = (&config.username, &config.password) {
        opts.set_credentials(u.clone(), p.clone());
    }
    opts
}

/// Owns the event loop. Polling again after an error makes rumqttc
/// reconnect, so the session only has to pace the retries.
struct Session {
    eventloop: EventLoop,
    client: AsyncClient,
    shared: Arc<Shared>,
    broker: String,
    backoff: Backoff,
}

impl Session {
    async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(event) => {
                    if !self.on_event(event).await {
                        break;
                    }
                }
                Err(err) => {
                    if self.shared.closing.load(Ordering::Relaxed) {
                        break;
                    }
                    self.on_error(err).await;
                }
            }
        }
        self.shared.set_ready(false);
        info!(broker = %self.broker, "MQTT session closed");
    }

    // Returns false once the loop should stop.
    async fn on_event(&mut self, event: Event) -> bool {
        match event {
            Event::Incoming(Incoming::ConnAck(ack)) => {
                info!(broker = %self.broker, session_present = ack.session_present, "MQTT connected");
                self.backoff.reset();
                self.restore_subscriptions().await;
                self.shared.set_ready(true);
            }
            Event::Incoming(Incoming::Publish(p)) => {
                let _ = self.shared.events.send(BridgeEvent::Publish {
                    topic: p.topic.to_string(),
                    payload: p.payload.to_vec(),
                });
            }
            Event::Outgoing(Outgoing::Disconnect) => {
                debug!("MQTT disconnect sent");
                return false;
            }
            other => debug!(?other, "MQTT event"),
        }
        true
    }

    async fn on_error(&mut self, err: ConnectionError) {
        self.shared.set_ready(false);
        let wait = self.backoff.next_delay();
        warn!(broker = %self.broker, error = %err, retry_in = ?wait, "MQTT connection lost");
        sleep(wait).await;
    }

    async fn restore_subscriptions(&mut self) {
        let subs = self.shared.subscriptions.read().await;
        for (topic, qos) in subs.iter() {
            debug!(topic = %topic, "restoring subscription");
            if let Err(err) = self.client.try_subscribe(topic.as_str(), *qos) {
                warn!(error = %err, topic = %topic, "failed to restore subscription");
            }
        }
    }
}

/// Doubling retry delay between `INITIAL` and `MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Backoff {
    next: Duration,
}

impl Backoff {
    const INITIAL: Duration = Duration::from_secs(1);
    const MAX: Duration = Duration::from_secs(30);

    fn next_delay(&mut self) -> Duration {
        let wait = self.next;
        self.next = (self.next * 2).min(Self::MAX);
        wait
    }

    fn reset(&mut self) {
        self.next = Self::INITIAL;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self { next: Self::INITIAL }
    }
}
