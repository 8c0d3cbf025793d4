//! Interactive completion of broker credentials.
//!
//! Operators who prefer not to keep the broker password in the configuration
//! file set `password_required: true` and leave the password empty. The
//! password is then requested once at startup.

use std::io;

/// Source of a broker password entered at runtime.
pub trait PasswordPrompt {
    /// Requests the broker password.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the password cannot be read.
    fn prompt(&self, message: &str) -> io::Result<String>;
}

/// Prompt that reads the password from the controlling terminal without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPasswordPrompt;

impl PasswordPrompt for TerminalPasswordPrompt {
    fn prompt(&self, message: &str) -> io::Result<String> {
        rpassword::prompt_password(message)
    }
}

/// Prompt that always returns the same password. Useful for tests and for
/// callers that obtain the secret through another channel.
#[derive(Debug, Clone)]
pub struct StaticPasswordPrompt {
    password: String,
}

impl StaticPasswordPrompt {
    /// Builds a prompt answering with `password`.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl PasswordPrompt for StaticPasswordPrompt {
    fn prompt(&self, _message: &str) -> io::Result<String> {
        Ok(self.password.clone())
    }
}

/// Message shown when the password is requested.
pub const PASSWORD_PROMPT_MESSAGE: &str = "Please enter your MQTT broker password and press enter: ";
