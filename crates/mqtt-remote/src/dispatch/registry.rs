//! Name to entry point mapping and synchronous dispatch.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use mqtt_remote_config::Config;
use tracing::{debug, error, warn};

use super::DISPATCH_TARGET;
use super::envelope::Envelope;
use super::errors::DispatchError;
use super::handler::{CommandHandler, DiscoveryReport, HandlerConstructor};
use crate::transport::SharedPublisher;

/// Callable run for a matching command.
pub type EntryPoint = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// Snapshot of the registry contents.
///
/// Later registry changes are not reflected in a snapshot.
#[derive(Clone, Default)]
pub struct Registrations {
    entries: BTreeMap<String, EntryPoint>,
}

impl Registrations {
    /// Registered command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entry point registered for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntryPoint> {
        self.entries.get(name)
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Registry of command handlers.
///
/// Dispatch takes a read lock only long enough to clone the entry point, so
/// handlers run without holding the lock and may themselves register or
/// unregister commands. Writers are serialised by the lock.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: RwLock<HashMap<String, EntryPoint>>,
    publisher: Option<SharedPublisher>,
    config: Option<Arc<Config>>,
}

impl HandlerRegistry {
    /// Creates an empty registry with nothing to inject.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the publisher injected into handlers during discovery.
    #[must_use]
    pub fn with_publisher(mut self, publisher: SharedPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Sets the configuration injected into handlers during discovery.
    #[must_use]
    pub fn with_config(mut self, config: Arc<Config>) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers `entry_point` under `name`, replacing any previous entry.
    ///
    /// Returns the registry contents after the change.
    pub fn register<F>(&self, name: impl Into<String>, entry_point: F) -> Registrations
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.register_entry_point(name, Arc::new(entry_point))
    }

    /// Registers an already shared entry point under `name`.
    pub fn register_entry_point(
        &self,
        name: impl Into<String>,
        entry_point: EntryPoint,
    ) -> Registrations {
        let name = name.into();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = entries.insert(name.clone(), entry_point).is_some();
        debug!(
            target: DISPATCH_TARGET,
            command = %name,
            replaced,
            "handler registered"
        );
        snapshot(&entries)
    }

    /// Removes the entry registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] when `name` is not registered.
    pub fn unregister(&self, name: &str) -> Result<Registrations, DispatchError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(name).is_none() {
            return Err(DispatchError::not_found(name));
        }
        debug!(target: DISPATCH_TARGET, command = name, "handler unregistered");
        Ok(snapshot(&entries))
    }

    /// Returns the current registry contents.
    #[must_use]
    pub fn list(&self) -> Registrations {
        snapshot(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Runs the handler matching the envelope's command.
    ///
    /// An absent envelope, an envelope without a command, an unmatched
    /// command, and a panicking handler are each logged and otherwise
    /// ignored.
    pub fn dispatch(&self, envelope: Option<&Envelope>) {
        let Some(envelope) = envelope else {
            warn!(
                target: DISPATCH_TARGET,
                "unable to call any handler: no command was received"
            );
            return;
        };
        let Some(command) = envelope.command() else {
            warn!(
                target: DISPATCH_TARGET,
                topic = envelope.topic(),
                "unable to call any handler: envelope carries no command"
            );
            return;
        };
        let Some(entry_point) = self.entry_point(command) else {
            warn!(
                target: DISPATCH_TARGET,
                command,
                "no handler registered for command"
            );
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| entry_point(envelope))) {
            Ok(()) => debug!(target: DISPATCH_TARGET, command, "handler called"),
            Err(payload) => error!(
                target: DISPATCH_TARGET,
                command,
                panic = panic_message(&*payload),
                "handler panicked"
            ),
        }
    }

    /// Constructs every handler in `manifest`, fills the capability slots
    /// each one exposes, and registers those that are not disabled.
    pub fn auto_discover_and_register(&self, manifest: &[HandlerConstructor]) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for construct in manifest {
            let mut handler = construct();
            self.inject(handler.as_mut());
            let name = handler.name().to_owned();
            if handler.is_disabled() {
                debug!(
                    target: DISPATCH_TARGET,
                    command = %name,
                    "handler disabled, not registered"
                );
                report.skipped.push(name);
                continue;
            }
            let handler: Arc<dyn CommandHandler> = Arc::from(handler);
            self.register(name.clone(), move |envelope: &Envelope| {
                handler.execute(envelope);
            });
            report.registered.push(name);
        }
        report
    }

    fn inject(&self, handler: &mut dyn CommandHandler) {
        if let (Some(publisher), Some(slot)) = (&self.publisher, handler.publish_slot()) {
            slot.set_publisher(Arc::clone(publisher));
        }
        if let (Some(config), Some(slot)) = (&self.config, handler.config_slot()) {
            slot.set_config(Arc::clone(config));
        }
    }

    fn entry_point(&self, command: &str) -> Option<EntryPoint> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(command)
            .cloned()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("entries", &self.list())
            .field("publisher", &self.publisher.is_some())
            .field("config", &self.config.is_some())
            .finish()
    }
}

fn snapshot(entries: &HashMap<String, EntryPoint>) -> Registrations {
    Registrations {
        entries: entries
            .iter()
            .map(|(name, entry_point)| (name.clone(), Arc::clone(entry_point)))
            .collect(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
