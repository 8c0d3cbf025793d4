//! Built-in command handlers and the manifest that discovery iterates.

mod public_ip;
mod reverse_string;
mod sum_positive_ints;

use std::fmt;
use std::sync::Arc;

use mqtt_remote_config::Config;

use crate::dispatch::{HandlerConstructor, WantsConfig, WantsPublish};
use crate::transport::{Publish, SharedPublisher};

pub use public_ip::{DEFAULT_LOOKUP_URL, HttpIpLookup, IpLookup, IpLookupError, PublicIp};
pub use reverse_string::ReverseString;
pub use sum_positive_ints::SumPositiveInts;

/// Handlers shipped with the service, in registration order.
pub const BUILTIN_HANDLERS: &[HandlerConstructor] =
    &[SumPositiveInts::boxed, ReverseString::boxed, PublicIp::boxed];

/// Capabilities injected into a built-in handler.
#[derive(Default)]
pub(crate) struct Slots {
    publisher: Option<SharedPublisher>,
    config: Option<Arc<Config>>,
}

impl Slots {
    pub(crate) fn publisher(&self) -> Option<&dyn Publish> {
        self.publisher.as_deref()
    }

    /// Whether the configuration lists `name` as disabled. Handlers without
    /// configuration are enabled.
    pub(crate) fn disables(&self, name: &str) -> bool {
        self.config
            .as_ref()
            .is_some_and(|config| config.handlers.is_disabled(name))
    }
}

impl WantsPublish for Slots {
    fn set_publisher(&mut self, publisher: SharedPublisher) {
        self.publisher = Some(publisher);
    }
}

impl WantsConfig for Slots {
    fn set_config(&mut self, config: Arc<Config>) {
        self.config = Some(config);
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slots")
            .field("publisher", &self.publisher.is_some())
            .field("config", &self.config.is_some())
            .finish()
    }
}
