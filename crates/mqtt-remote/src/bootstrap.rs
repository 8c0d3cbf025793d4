//! Service bootstrap orchestration.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use mqtt_remote_config::{Config, ConfigError, PasswordPrompt};

use crate::dispatch::{HandlerConstructor, HandlerRegistry};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::SharedPublisher;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration cannot be produced.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that reads a YAML file, optionally overriding the log filter.
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    path: Utf8PathBuf,
    log_filter: Option<String>,
}

impl FileConfigLoader {
    /// Builds a loader for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            log_filter: None,
        }
    }

    /// Replaces the configured log filter with `filter` when one is given.
    #[must_use]
    pub fn with_log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    /// Path the loader reads.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        let mut config = Config::load(&self.path)?;
        if let Some(filter) = &self.log_filter {
            config.logging.filter.clone_from(filter);
        }
        Ok(config)
    }
}

/// Loader that returns a pre-built configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Builds a loader returning `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load or complete.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying configuration error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Remote {
    config: Arc<Config>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Remote {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Accessor for the health reporter.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Builds a registry populated from `manifest`, injecting `publisher`
    /// and the configuration into the handlers that ask for them.
    #[must_use]
    pub fn registry(
        &self,
        publisher: SharedPublisher,
        manifest: &[HandlerConstructor],
    ) -> Arc<HandlerRegistry> {
        let registry = HandlerRegistry::new()
            .with_publisher(publisher)
            .with_config(Arc::clone(&self.config));
        let report = registry.auto_discover_and_register(manifest);
        self.reporter.handlers_discovered(&report);
        Arc::new(registry)
    }
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("config", &self.config)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the service using the supplied collaborators.
///
/// Loads the configuration, completes it through `prompt`, and installs
/// telemetry.
///
/// # Errors
///
/// Returns [`BootstrapError`] when any step fails. The failure is also
/// reported through `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    prompt: &dyn PasswordPrompt,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Remote, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load().and_then(|config| config.complete(prompt)) {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config.logging) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Remote {
        config: Arc::new(config),
        telemetry,
        reporter,
    })
}
