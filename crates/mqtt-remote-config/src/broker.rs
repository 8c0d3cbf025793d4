//! Broker, session, and subscription settings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{default_broker_port, default_keepalive_secs, default_true};

/// Connection details for the MQTT broker.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BrokerSettings {
    /// Hostname or IP address of the broker.
    pub host: String,
    /// TCP port of the broker.
    #[serde(default = "default_broker_port")]
    pub port: u16,
    /// Maximum quiet period, in seconds, before the client pings the broker.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// User name presented to the broker. Empty means anonymous.
    #[serde(default)]
    pub user_name: String,
    /// Password presented to the broker.
    #[serde(default)]
    pub password: String,
    /// Prompts for the password at startup when it is left empty.
    #[serde(default)]
    pub password_required: bool,
}

impl BrokerSettings {
    /// Returns `true` when a password must be requested interactively.
    #[must_use]
    pub fn needs_password_prompt(&self) -> bool {
        self.password_required && self.password.is_empty()
    }
}

/// MQTT protocol revision requested for the session.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(try_from = "String", into = "String")]
pub enum MqttProtocol {
    /// MQTT 3.1.
    #[strum(to_string = "3.1")]
    V31,
    /// MQTT 3.1.1.
    #[default]
    #[strum(to_string = "3.1.1")]
    V311,
    /// MQTT 5.
    #[strum(to_string = "5")]
    V5,
}

impl TryFrom<String> for MqttProtocol {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

impl From<MqttProtocol> for String {
    fn from(value: MqttProtocol) -> Self {
        value.to_string()
    }
}

/// Network transport carrying the MQTT session.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TransportKind {
    /// Raw TCP.
    #[default]
    Tcp,
    /// MQTT over WebSockets.
    Websockets,
}

/// Session behaviour for this client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    /// Client identifier. Also the default subscription topic.
    pub client_id: String,
    /// Asks the broker to discard session state on disconnect.
    #[serde(default = "default_true")]
    pub clean: bool,
    /// Protocol revision.
    #[serde(default)]
    pub protocol: MqttProtocol,
    /// Network transport.
    #[serde(default)]
    pub transport: TransportKind,
}

/// A topic filter this client subscribes to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Subscription {
    /// Topic filter.
    pub topic: String,
    /// Requested quality of service (0, 1 or 2).
    #[serde(default)]
    pub qos: u8,
}

impl Subscription {
    /// Builds a subscription.
    #[must_use]
    pub fn new(topic: impl Into<String>, qos: u8) -> Self {
        Self {
            topic: topic.into(),
            qos,
        }
    }
}
