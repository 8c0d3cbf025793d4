use std::env;

use camino::Utf8PathBuf;

/// Default MQTT broker port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Default keepalive interval in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 60;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "MQTT_REMOTE_CONFIG";

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

pub(crate) const fn default_broker_port() -> u16 {
    DEFAULT_BROKER_PORT
}

pub(crate) const fn default_keepalive_secs() -> u64 {
    DEFAULT_KEEPALIVE_SECS
}

pub(crate) const fn default_true() -> bool {
    true
}

/// Resolves the configuration file path.
///
/// An explicit path wins, then [`CONFIG_PATH_ENV`], then
/// `<config dir>/mqtt-remote/config.yaml`. Falls back to `config.yaml` in the
/// working directory when the platform reports no configuration directory.
#[must_use]
pub fn resolve_config_path(explicit: Option<Utf8PathBuf>) -> Utf8PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).filter(|value| !value.is_empty()) {
        if let Ok(path) = Utf8PathBuf::from_path_buf(path.into()) {
            return path;
        }
    }
    dirs::config_dir()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .map_or_else(
            || Utf8PathBuf::from("config.yaml"),
            |dir| dir.join("mqtt-remote").join("config.yaml"),
        )
}
