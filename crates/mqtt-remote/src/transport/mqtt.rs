//! Blocking MQTT 3.1.1 client built on `rumqttc`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use mqtt_remote_config::{Config, MqttProtocol, TransportKind};
use rumqttc::{
    Client, ConnectReturnCode, Connection, Event, MqttOptions, Outgoing, Packet,
    Publish as PublishPacket, QoS,
};
use tracing::{debug, info, warn};

use super::TRANSPORT_TARGET;
use super::callbacks::CallbackSet;
use super::errors::TransportError;
use super::message::InboundMessage;
use super::publish::Publish;

/// Capacity of the request channel between clients and the event loop.
const REQUEST_CAPACITY: usize = 64;

/// Pause before polling again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Owns the broker connection and drives message delivery.
pub struct MqttTransport {
    connection: Connection,
    session: Session,
    stopping: Arc<AtomicBool>,
}

struct Session {
    client: Client,
    subscriptions: Vec<(String, QoS)>,
    callbacks: CallbackSet,
    log_events: bool,
}

impl MqttTransport {
    /// Prepares a connection described by `config`. Nothing is sent until
    /// [`MqttTransport::run`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the configuration asks for a protocol
    /// revision or transport other than MQTT 3.1.1 over TCP.
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        if config.session.protocol != MqttProtocol::V311 {
            return Err(TransportError::UnsupportedProtocol {
                protocol: config.session.protocol,
            });
        }
        if config.session.transport != TransportKind::Tcp {
            return Err(TransportError::UnsupportedTransport {
                transport: config.session.transport,
            });
        }
        let subscriptions = config
            .effective_subscriptions()
            .into_iter()
            .map(|subscription| Ok((subscription.topic, qos_level(subscription.qos)?)))
            .collect::<Result<Vec<_>, TransportError>>()?;

        let mut options = MqttOptions::new(
            config.session.client_id.as_str(),
            config.broker.host.as_str(),
            config.broker.port,
        );
        options
            .set_keep_alive(Duration::from_secs(config.broker.keepalive_secs))
            .set_clean_session(config.session.clean);
        if !config.broker.user_name.is_empty() {
            options.set_credentials(
                config.broker.user_name.as_str(),
                config.broker.password.as_str(),
            );
        }

        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        Ok(Self {
            connection,
            session: Session {
                client,
                subscriptions,
                callbacks: CallbackSet::new(),
                log_events: config.logging.log_transport,
            },
            stopping: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Callbacks that receive every inbound message.
    pub const fn callbacks_mut(&mut self) -> &mut CallbackSet {
        &mut self.session.callbacks
    }

    /// Returns a publisher sharing this transport's client.
    #[must_use]
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.session.client.clone(),
        }
    }

    /// Returns a handle that ends [`MqttTransport::run`] from another thread.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            client: self.session.client.clone(),
            stopping: Arc::clone(&self.stopping),
        }
    }

    /// Connects and delivers messages until [`StopHandle::stop`] is called.
    ///
    /// Connection failures are logged and retried. Subscriptions are renewed
    /// each time the broker accepts a connection, so they survive reconnects.
    pub fn run(self) {
        let Self {
            mut connection,
            session,
            stopping,
        } = self;
        info!(target: TRANSPORT_TARGET, "connecting to broker");
        for notification in connection.iter() {
            let stop_requested = stopping.load(Ordering::SeqCst);
            match notification {
                Ok(Event::Outgoing(Outgoing::Disconnect)) if stop_requested => break,
                Ok(event) => session.handle(event),
                Err(_) if stop_requested => break,
                Err(error) => {
                    warn!(
                        target: TRANSPORT_TARGET,
                        %error,
                        retry_in_secs = RECONNECT_DELAY.as_secs(),
                        "broker connection error"
                    );
                    thread::sleep(RECONNECT_DELAY);
                }
            }
        }
        info!(target: TRANSPORT_TARGET, "transport stopped");
    }
}

impl fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttTransport")
            .field("subscriptions", &self.session.subscriptions)
            .field("callbacks", &self.session.callbacks)
            .field("stopping", &self.stopping.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    fn handle(&self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) if ack.code == ConnectReturnCode::Success => {
                info!(
                    target: TRANSPORT_TARGET,
                    session_present = ack.session_present,
                    "connected to broker"
                );
                self.subscribe_all();
            }
            Event::Incoming(Packet::ConnAck(ack)) => {
                warn!(target: TRANSPORT_TARGET, code = ?ack.code, "broker refused connection");
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                info!(
                    target: TRANSPORT_TARGET,
                    pkid = ack.pkid,
                    "broker processed subscribe request"
                );
            }
            Event::Incoming(Packet::Publish(publish)) => self.deliver(&publish),
            Event::Incoming(Packet::Disconnect) => {
                warn!(target: TRANSPORT_TARGET, "broker closed the session");
            }
            other if self.log_events => {
                debug!(target: TRANSPORT_TARGET, event = ?other, "transport event");
            }
            _ => {}
        }
    }

    fn subscribe_all(&self) {
        for (topic, qos) in &self.subscriptions {
            match self.client.try_subscribe(topic.as_str(), *qos) {
                Ok(()) => info!(
                    target: TRANSPORT_TARGET,
                    topic = %topic,
                    qos = (*qos as u8),
                    "subscribe requested"
                ),
                Err(error) => warn!(
                    target: TRANSPORT_TARGET,
                    topic = %topic,
                    %error,
                    "failed to request subscription"
                ),
            }
        }
    }

    fn deliver(&self, publish: &PublishPacket) {
        if self.log_events {
            debug!(
                target: TRANSPORT_TARGET,
                topic = %publish.topic,
                bytes = publish.payload.len(),
                "message received"
            );
        }
        let message = InboundMessage::new(
            publish.topic.as_str(),
            publish.payload.to_vec(),
            publish.qos as u8,
            publish.retain,
        );
        self.callbacks.deliver(&message);
    }
}

/// Ends a running transport.
#[derive(Clone)]
pub struct StopHandle {
    client: Client,
    stopping: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the broker connection to close and the transport loop to return.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Disconnect`] when the request cannot be
    /// queued, typically because the event loop has already exited.
    pub fn stop(&self) -> Result<(), TransportError> {
        self.stopping.store(true, Ordering::SeqCst);
        self.client
            .disconnect()
            .map_err(|source| TransportError::Disconnect {
                source: Box::new(source),
            })
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopHandle")
            .field("stopping", &self.stopping.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// [`Publish`] implementation that queues messages on the broker client.
///
/// Publishing never blocks: when the request queue is full the message is
/// dropped with a warning.
#[derive(Clone)]
pub struct MqttPublisher {
    client: Client,
}

impl Publish for MqttPublisher {
    fn publish(&self, topic: &str, payload: &str, qos: u8, retain: bool) {
        let level = match qos_level(qos) {
            Ok(level) => level,
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, topic, %error, "publish dropped");
                return;
            }
        };
        match self
            .client
            .try_publish(topic, level, retain, payload.as_bytes().to_vec())
        {
            Ok(()) => debug!(target: TRANSPORT_TARGET, topic, qos, retain, "publish queued"),
            Err(error) => warn!(target: TRANSPORT_TARGET, topic, %error, "publish dropped"),
        }
    }
}

impl fmt::Debug for MqttPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttPublisher").finish_non_exhaustive()
    }
}

fn qos_level(qos: u8) -> Result<QoS, TransportError> {
    match qos {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        _ => Err(TransportError::InvalidQos { qos }),
    }
}
