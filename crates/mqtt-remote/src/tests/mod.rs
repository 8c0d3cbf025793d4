//! Crate-level integration and BDD tests.

use std::sync::Arc;

use mockall::mock;
use mockall::predicate::eq;

use crate::dispatch::{Forwarder, HandlerRegistry, JsonNormalizer};
use crate::handlers::BUILTIN_HANDLERS;
use crate::transport::{CallbackSet, InboundMessage, Publish};

mod behaviour;

mock! {
    Publisher {}
    impl Publish for Publisher {
        fn publish(&self, topic: &str, payload: &str, qos: u8, retain: bool);
    }
}

#[test]
fn inbound_sum_command_publishes_reply() {
    let mut publisher = MockPublisher::new();
    publisher
        .expect_publish()
        .with(eq("replies"), eq("3"), eq(1), eq(true))
        .times(1)
        .return_const(());

    let registry = HandlerRegistry::new().with_publisher(Arc::new(publisher));
    let report = registry.auto_discover_and_register(BUILTIN_HANDLERS);
    assert_eq!(
        report.registered,
        ["sum_positive_ints", "reverse_string", "public_ip"]
    );
    assert!(report.skipped.is_empty());

    let forwarder = Forwarder::for_registry(JsonNormalizer, Arc::new(registry));
    let mut callbacks = CallbackSet::new();
    callbacks.add(move |message: &InboundMessage| forwarder.forward(message));

    let delivered = callbacks.deliver(&InboundMessage::new(
        "pc",
        concat!(
            r#"{"command": "sum_positive_ints", "attributes": {"integer_one": 1, "#,
            r#""integer_two": 2, "return_message": {"topic": "replies", "qos": 1, "retain": true}}}"#
        )
        .as_bytes(),
        0,
        false,
    ));
    assert_eq!(delivered, 1);
}

#[test]
fn malformed_command_publishes_nothing() {
    let mut publisher = MockPublisher::new();
    publisher.expect_publish().never();

    let registry = HandlerRegistry::new().with_publisher(Arc::new(publisher));
    registry.auto_discover_and_register(BUILTIN_HANDLERS);
    let forwarder = Forwarder::for_registry(JsonNormalizer, Arc::new(registry));

    forwarder.forward(&InboundMessage::new(
        "pc",
        r#"{"command": "sum_positive_ints", "attributes": {"integer_one": "1"}}"#,
        0,
        false,
    ));
}
