//! MQTT remote command service.
//!
//! Commands arrive as JSON messages on subscribed topics:
//!
//! ```json
//! {"command": "reverse_string", "attributes": {"string_to_reverse": "abc"}}
//! ```
//!
//! Each message is normalized into an [`dispatch::Envelope`], matched by
//! command name against a [`dispatch::HandlerRegistry`], and handed to the
//! registered handler. Handlers reply through the [`transport::Publish`]
//! capability injected at startup.

pub mod bootstrap;
pub mod dispatch;
pub mod handlers;
pub mod health;
pub mod process;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, FileConfigLoader, Remote, StaticConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{ProcessError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_remote};

#[cfg(test)]
mod tests;
