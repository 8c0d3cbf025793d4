//! Process supervision: wires the transport to the dispatch core and stops it
//! on a termination signal.

mod shutdown;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::Remote;
use crate::dispatch::{Forwarder, JsonNormalizer};
use crate::handlers::BUILTIN_HANDLERS;
use crate::health::HealthReporter;
use crate::transport::{InboundMessage, MqttTransport, SharedPublisher, StopHandle, TransportError};

pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors surfaced while running the service.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The broker connection could not be prepared.
    #[error("failed to prepare broker connection: {source}")]
    Transport {
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },
    /// The shutdown listener thread could not be started.
    #[error("failed to start shutdown listener: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Runs the service until `shutdown` fires.
///
/// Builds the transport from the bootstrapped configuration, registers the
/// built-in handlers with the transport's publisher, and forwards every
/// inbound message through the dispatch core.
///
/// # Errors
///
/// Returns [`ProcessError`] when the transport cannot be prepared or the
/// shutdown listener cannot be started.
pub fn run_remote(remote: &Remote, shutdown: Arc<dyn ShutdownSignal>) -> Result<(), ProcessError> {
    let mut transport =
        MqttTransport::new(remote.config()).map_err(|source| ProcessError::Transport { source })?;
    let publisher: SharedPublisher = Arc::new(transport.publisher());
    let registry = remote.registry(publisher, BUILTIN_HANDLERS);
    let forwarder = Forwarder::for_registry(JsonNormalizer, registry);
    transport
        .callbacks_mut()
        .add(move |message: &InboundMessage| forwarder.forward(message));

    let listener = spawn_shutdown_listener(shutdown, transport.stop_handle(), remote.reporter())?;
    transport.run();
    if listener.is_finished() && listener.join().is_err() {
        warn!(target: PROCESS_TARGET, "shutdown listener panicked");
    }
    info!(target: PROCESS_TARGET, "service stopped");
    Ok(())
}

fn spawn_shutdown_listener(
    shutdown: Arc<dyn ShutdownSignal>,
    stop: StopHandle,
    reporter: Arc<dyn HealthReporter>,
) -> Result<JoinHandle<()>, ProcessError> {
    thread::Builder::new()
        .name("mqtt-remote-shutdown".to_owned())
        .spawn(move || match shutdown.wait() {
            Ok(()) => {
                reporter.shutdown_requested();
                if let Err(error) = stop.stop() {
                    warn!(target: PROCESS_TARGET, %error, "failed to stop transport");
                }
            }
            Err(error) => warn!(
                target: PROCESS_TARGET,
                %error,
                "shutdown listener unavailable, service will run until killed"
            ),
        })
        .map_err(|source| ProcessError::Spawn { source })
}
