//! Configuration for the MQTT remote command service.
//!
//! The configuration lives in a single YAML document with five sections:
//! `broker`, `session`, `subscriptions`, `logging`, and `handlers`. Loading is
//! strict: unknown keys, unknown enum values, and out-of-range QoS levels are
//! rejected with a [`ConfigError`] naming the offending field. Loading and
//! completion are separate steps so the interactive password prompt can be
//! replaced in tests.
//!
//! ```yaml
//! broker:
//!   host: 192.168.1.10
//!   password_required: true
//! session:
//!   client_id: MyPC
//! logging:
//!   format: compact
//! ```

mod broker;
mod defaults;
mod handlers;
mod logging;
mod password;

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use broker::{BrokerSettings, MqttProtocol, SessionSettings, Subscription, TransportKind};
pub use defaults::{
    CONFIG_PATH_ENV, DEFAULT_BROKER_PORT, DEFAULT_KEEPALIVE_SECS, DEFAULT_LOG_FILTER,
    default_log_filter_string, resolve_config_path,
};
pub use handlers::HandlerSettings;
pub use logging::{LogFormat, LoggingSettings};
pub use password::{
    PASSWORD_PROMPT_MESSAGE, PasswordPrompt, StaticPasswordPrompt, TerminalPasswordPrompt,
};

/// Highest QoS level defined by MQTT.
pub const MAX_QOS: u8 = 2;

/// Errors raised while loading or completing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The YAML document could not be deserialised.
    #[error("failed to parse configuration: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },
    /// A field holds a value outside its permitted range.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
    /// The broker password could not be requested.
    #[error("failed to read broker password: {source}")]
    Password {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Broker connection details.
    pub broker: BrokerSettings,
    /// Session behaviour.
    pub session: SessionSettings,
    /// Topic filters to subscribe to. Empty means the client id at QoS 0.
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    /// Logging behaviour.
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Handler toggles.
    #[serde(default)]
    pub handlers: HandlerSettings,
}

impl Config {
    /// Builds a configuration for `host` and `client_id` with every other
    /// setting at its default.
    #[must_use]
    pub fn new(host: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            broker: BrokerSettings {
                host: host.into(),
                port: DEFAULT_BROKER_PORT,
                keepalive_secs: DEFAULT_KEEPALIVE_SECS,
                user_name: String::new(),
                password: String::new(),
                password_required: false,
            },
            session: SessionSettings {
                client_id: client_id.into(),
                clean: true,
                protocol: MqttProtocol::default(),
                transport: TransportKind::default(),
            },
            subscriptions: Vec::new(),
            logging: LoggingSettings::default(),
            handlers: HandlerSettings::default(),
        }
    }

    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML or schema mismatches
    /// and [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_saphyr::from_str(text).map_err(|error| ConfigError::Parse {
            message: error.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`Config::from_yaml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Checks values that the schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.host.trim().is_empty() {
            return Err(ConfigError::invalid("broker.host", "must not be empty"));
        }
        if self.session.client_id.trim().is_empty() {
            return Err(ConfigError::invalid(
                "session.client_id",
                "must not be empty",
            ));
        }
        for subscription in &self.subscriptions {
            if subscription.topic.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "subscriptions.topic",
                    "must not be empty",
                ));
            }
            if subscription.qos > MAX_QOS {
                return Err(ConfigError::invalid(
                    "subscriptions.qos",
                    format!("{} exceeds the maximum of {MAX_QOS}", subscription.qos),
                ));
            }
        }
        Ok(())
    }

    /// Fills in values that must be supplied at runtime.
    ///
    /// When the broker requires a password and none is configured, the
    /// password is requested through `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Password`] when the prompt fails.
    pub fn complete(mut self, prompt: &dyn PasswordPrompt) -> Result<Self, ConfigError> {
        if self.broker.needs_password_prompt() {
            self.broker.password = prompt
                .prompt(PASSWORD_PROMPT_MESSAGE)
                .map_err(|source| ConfigError::Password { source })?;
        }
        Ok(self)
    }

    /// Returns the subscriptions to request, defaulting to the client id at
    /// QoS 0 when none are configured.
    #[must_use]
    pub fn effective_subscriptions(&self) -> Vec<Subscription> {
        if self.subscriptions.is_empty() {
            vec![Subscription::new(self.session.client_id.clone(), 0)]
        } else {
            self.subscriptions.clone()
        }
    }

    /// Returns the configured log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.logging.filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.logging.format
    }
}
