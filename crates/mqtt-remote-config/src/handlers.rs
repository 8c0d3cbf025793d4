use serde::{Deserialize, Serialize};

/// The `handlers` section of the configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HandlerSettings {
    /// Names of handlers that are discovered but never registered.
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl HandlerSettings {
    /// Returns `true` when the named handler has been disabled.
    #[must_use]
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|disabled| disabled.trim() == name)
    }
}
