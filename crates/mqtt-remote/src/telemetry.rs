//! Structured telemetry initialisation for the service.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use mqtt_remote_config::{LogFormat, LoggingSettings};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to open the configured log file.
    #[error("failed to open log file {path}: {source}")]
    LogFile {
        /// Path of the log file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Events always go to stderr. When `settings.file` is set they are also
/// appended to that file. Later calls return a fresh [`TelemetryHandle`]
/// without touching the global state again.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid, the log file cannot
/// be opened, or another subscriber is already installed.
pub fn initialise(settings: &LoggingSettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&settings.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let (writer, ansi) = writer(settings)?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

/// Colour is only used for an interactive stderr with no file attached.
fn writer(settings: &LoggingSettings) -> Result<(BoxMakeWriter, bool), TelemetryError> {
    let Some(path) = &settings.file else {
        return Ok((BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.clone(),
            source,
        })?;
    Ok((BoxMakeWriter::new(io::stderr.and(Mutex::new(file))), false))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_log_directory_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("missing").join("remote.log"))
            .expect("utf-8 path");
        let settings = LoggingSettings {
            file: Some(path.clone()),
            ..LoggingSettings::default()
        };
        match writer(&settings) {
            Err(TelemetryError::LogFile { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected log file error, got {:?}", other.map(|(_, ansi)| ansi)),
        }
    }

    #[test]
    fn log_file_is_created() {
        let dir = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("remote.log")).expect("utf-8 path");
        let settings = LoggingSettings {
            file: Some(path.clone()),
            ..LoggingSettings::default()
        };
        let (_, ansi) = writer(&settings).expect("writer");
        assert!(!ansi);
        assert!(path.exists());
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let settings = LoggingSettings {
            filter: "mqtt_remote=loudest".to_owned(),
            ..LoggingSettings::default()
        };
        assert!(matches!(
            install_subscriber(&settings),
            Err(TelemetryError::Filter(_))
        ));
    }
}
