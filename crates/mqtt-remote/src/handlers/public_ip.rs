use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::warn;

use super::Slots;
use crate::dispatch::{
    CommandHandler, DISPATCH_TARGET, Envelope, ReturnMessage, WantsConfig, WantsPublish,
    log_wrong_command_form,
};

const NAME: &str = "public_ip";

const FORM: &str = concat!(
    r#"{"command": "public_ip", "attributes": {"return_message": {"topic": <string>, "#,
    r#""qos": <integer 0-2>, "retain": <boolean>}}}"#
);

/// Service answering plain-text requests with the caller's address.
pub const DEFAULT_LOOKUP_URL: &str = "https://api.ipify.org";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while looking up the public address.
#[derive(Debug, Error)]
pub enum IpLookupError {
    /// The HTTP client could not be built or the request failed.
    #[error("public address request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The service answered with something other than an address.
    #[error("public address service returned '{body}'")]
    Malformed {
        /// Response body, trimmed.
        body: String,
    },
}

/// Source of the host's public address.
pub trait IpLookup: Send + Sync {
    /// Returns the address the internet sees for this host.
    ///
    /// # Errors
    ///
    /// Returns an [`IpLookupError`] when the address cannot be determined.
    fn public_ip(&self) -> Result<IpAddr, IpLookupError>;
}

/// Looks the address up over HTTP with a blocking client.
#[derive(Debug)]
pub struct HttpIpLookup {
    url: String,
    client: OnceCell<Client>,
}

impl HttpIpLookup {
    /// Creates a lookup against `url`. The client is built on first use.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: OnceCell::new(),
        }
    }
}

impl Default for HttpIpLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

impl IpLookup for HttpIpLookup {
    fn public_ip(&self) -> Result<IpAddr, IpLookupError> {
        let client = self
            .client
            .get_or_try_init(|| Client::builder().timeout(LOOKUP_TIMEOUT).build())?;
        let body = client.get(&self.url).send()?.error_for_status()?.text()?;
        parse_address(&body)
    }
}

fn parse_address(body: &str) -> Result<IpAddr, IpLookupError> {
    let body = body.trim();
    body.parse().map_err(|_| IpLookupError::Malformed {
        body: body.to_owned(),
    })
}

/// Publishes the host's public address as `Public IP: <address>`.
pub struct PublicIp {
    slots: Slots,
    lookup: Box<dyn IpLookup>,
}

impl PublicIp {
    /// Creates the handler with a custom address source.
    #[must_use]
    pub fn with_lookup(lookup: impl IpLookup + 'static) -> Self {
        Self {
            slots: Slots::default(),
            lookup: Box::new(lookup),
        }
    }

    /// Manifest constructor.
    #[must_use]
    pub fn boxed() -> Box<dyn CommandHandler> {
        Box::new(Self::with_lookup(HttpIpLookup::default()))
    }
}

impl CommandHandler for PublicIp {
    fn name(&self) -> &str {
        NAME
    }

    fn execute(&self, envelope: &Envelope) {
        let Some(reply) = ReturnMessage::from_envelope(envelope) else {
            log_wrong_command_form(NAME, FORM);
            return;
        };
        match self.lookup.public_ip() {
            Ok(address) => reply.send(self.slots.publisher(), &format!("Public IP: {address}")),
            Err(error) => warn!(
                target: DISPATCH_TARGET,
                command = NAME,
                %error,
                "public address lookup failed, no reply sent"
            ),
        }
    }

    fn is_disabled(&self) -> bool {
        self.slots.disables(NAME)
    }

    fn publish_slot(&mut self) -> Option<&mut dyn WantsPublish> {
        Some(&mut self.slots)
    }

    fn config_slot(&mut self) -> Option<&mut dyn WantsConfig> {
        Some(&mut self.slots)
    }
}

impl fmt::Debug for PublicIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicIp")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::sync::{Arc, Mutex};

    use mockall::mock;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;

    mock! {
        Lookup {}
        impl IpLookup for Lookup {
            fn public_ip(&self) -> Result<IpAddr, IpLookupError>;
        }
    }

    type Sent = Arc<Mutex<Vec<(String, String, u8, bool)>>>;

    fn handler(lookup: MockLookup) -> (PublicIp, Sent) {
        let sent: Sent = Arc::default();
        let sink = Arc::clone(&sent);
        let mut handler = PublicIp::with_lookup(lookup);
        handler.slots.set_publisher(Arc::new(
            move |topic: &str, payload: &str, qos: u8, retain: bool| {
                if let Ok(mut sent) = sink.lock() {
                    sent.push((topic.to_owned(), payload.to_owned(), qos, retain));
                }
            },
        ));
        (handler, sent)
    }

    fn command(attributes: Value) -> Envelope {
        Envelope::new(
            "pc",
            json!({"command": NAME, "attributes": attributes}),
            0,
            false,
        )
        .expect("valid envelope")
    }

    #[test]
    fn publishes_the_looked_up_address() {
        let mut lookup = MockLookup::new();
        lookup
            .expect_public_ip()
            .times(1)
            .returning(|| Ok(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7))));
        let (handler, sent) = handler(lookup);

        handler.execute(&command(json!({
            "return_message": {"topic": "replies", "qos": 2, "retain": true}
        })));
        assert_eq!(
            *sent.lock().expect("lock"),
            vec![("replies".to_owned(), "Public IP: 203.0.113.7".to_owned(), 2, true)]
        );
    }

    #[test]
    fn lookup_failure_sends_nothing() {
        let mut lookup = MockLookup::new();
        lookup.expect_public_ip().times(1).returning(|| {
            Err(IpLookupError::Malformed {
                body: "<html>".to_owned(),
            })
        });
        let (handler, sent) = handler(lookup);

        handler.execute(&command(json!({
            "return_message": {"topic": "replies", "qos": 0, "retain": false}
        })));
        assert!(sent.lock().expect("lock").is_empty());
    }

    #[rstest]
    #[case::missing_return_message(json!({}))]
    #[case::string_qos(json!({"return_message": {"topic": "r", "qos": "1", "retain": false}}))]
    fn wrong_form_skips_the_lookup(#[case] attributes: Value) {
        let mut lookup = MockLookup::new();
        lookup.expect_public_ip().never();
        let (handler, sent) = handler(lookup);

        handler.execute(&command(attributes));
        assert!(sent.lock().expect("lock").is_empty());
    }

    #[rstest]
    #[case::ipv4("198.51.100.4\n", "198.51.100.4")]
    #[case::ipv6(" 2001:db8::1 ", "2001:db8::1")]
    fn response_bodies_parse_as_addresses(#[case] body: &str, #[case] expected: &str) {
        let parsed = parse_address(body).expect("address");
        assert_eq!(parsed.to_string(), expected);
    }

    #[test]
    fn non_address_bodies_are_malformed() {
        let error = parse_address(" rate limited ").expect_err("not an address");
        assert!(matches!(error, IpLookupError::Malformed { ref body } if body == "rate limited"));
    }
}
