use mqtt_remote_config::{MqttProtocol, TransportKind};
use rumqttc::ClientError;
use thiserror::Error;

use super::callbacks::CallbackId;

/// Errors raised while configuring or administering the broker connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The configured protocol version is not spoken by the client.
    #[error("MQTT protocol {protocol} is not supported; use 3.1.1")]
    UnsupportedProtocol {
        /// Protocol requested by the configuration.
        protocol: MqttProtocol,
    },

    /// The configured network transport is not available.
    #[error("transport '{transport}' is not supported; use tcp")]
    UnsupportedTransport {
        /// Transport requested by the configuration.
        transport: TransportKind,
    },

    /// A QoS level outside 0 to 2 was requested.
    #[error("invalid QoS level {qos}")]
    InvalidQos {
        /// Requested level.
        qos: u8,
    },

    /// No callback is registered under the given token.
    #[error("no message callback registered as {id}")]
    UnknownCallback {
        /// Token that was looked up.
        id: CallbackId,
    },

    /// The disconnect request could not be queued.
    #[error("failed to request disconnect: {source}")]
    Disconnect {
        /// Client error.
        #[source]
        source: Box<ClientError>,
    },
}
