//! The contract every command handler satisfies.

use std::sync::Arc;

use mqtt_remote_config::Config;

use super::envelope::Envelope;
use crate::transport::SharedPublisher;

/// Slot for the publish capability.
pub trait WantsPublish {
    /// Hands the handler the publisher it should reply through.
    fn set_publisher(&mut self, publisher: SharedPublisher);
}

/// Slot for the service configuration.
pub trait WantsConfig {
    /// Hands the handler the loaded configuration.
    fn set_config(&mut self, config: Arc<Config>);
}

/// A named operation invoked when a command with the same name arrives.
///
/// Handlers that need to publish or read configuration expose the matching
/// slot; discovery fills every exposed slot before asking whether the handler
/// is disabled, so the disabled flag may depend on injected configuration.
pub trait CommandHandler: Send + Sync {
    /// Command name this handler answers to.
    fn name(&self) -> &str;

    /// Runs the handler for `envelope`.
    fn execute(&self, envelope: &Envelope);

    /// Returns `true` when the handler must not be registered.
    fn is_disabled(&self) -> bool {
        false
    }

    /// Publish injection point, if the handler has one.
    fn publish_slot(&mut self) -> Option<&mut dyn WantsPublish> {
        None
    }

    /// Configuration injection point, if the handler has one.
    fn config_slot(&mut self) -> Option<&mut dyn WantsConfig> {
        None
    }
}

/// Builds one handler instance. A manifest is a slice of these.
pub type HandlerConstructor = fn() -> Box<dyn CommandHandler>;

/// Outcome of running discovery over a manifest.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Names registered, in manifest order.
    pub registered: Vec<String>,
    /// Names of disabled handlers that were constructed but not registered.
    pub skipped: Vec<String>,
}
