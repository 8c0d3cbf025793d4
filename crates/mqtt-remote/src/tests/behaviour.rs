//! Behaviour-driven tests for command dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mqtt_remote_config::Config;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use crate::dispatch::{
    DispatchError, Envelope, Forwarder, HandlerRegistry, JsonNormalizer, Registrations,
    payload_value,
};
use crate::handlers::BUILTIN_HANDLERS;
use crate::transport::{InboundMessage, Publish, SharedPublisher};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    registry: Arc<HandlerRegistry>,
    published: Arc<Mutex<Vec<(String, String)>>>,
    invocations: Arc<AtomicUsize>,
    unregistered: Option<Result<Registrations, DispatchError>>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl TestWorld {
    fn publisher(&self) -> SharedPublisher {
        let published = Arc::clone(&self.published);
        Arc::new(move |topic: &str, payload: &str, _qos: u8, _retain: bool| {
            if let Ok(mut published) = published.lock() {
                published.push((topic.to_owned(), payload.to_owned()));
            }
        })
    }

    fn published(&self) -> Vec<(String, String)> {
        self.published.lock().expect("publish log").clone()
    }

    fn use_builtin_handlers(&mut self, config: Config) {
        let registry = HandlerRegistry::new()
            .with_publisher(self.publisher())
            .with_config(Arc::new(config));
        registry.auto_discover_and_register(BUILTIN_HANDLERS);
        self.registry = Arc::new(registry);
    }
}

fn attribute(envelope: &Envelope, key: &str) -> i64 {
    payload_value(envelope.payload(), &["attributes", key])
        .and_then(Value::as_i64)
        .unwrap_or_default()
}

fn payload_for(kind: &str) -> String {
    match kind {
        "sum" => r#"{"command": "sum", "attributes": {"a": 1, "b": 2}}"#.to_owned(),
        "smart-quoted sum" => {
            "{\u{201C}command\u{201D}: \u{201C}sum\u{201D}, \u{201C}attributes\u{201D}: {\u{201C}a\u{201D}: 1, \u{201C}b\u{201D}: 2}}"
                .to_owned()
        }
        "empty" => "{}".to_owned(),
        "unmatched" => r#"{"command": "other", "attributes": {}}"#.to_owned(),
        "reverse" => concat!(
            r#"{"command": "reverse_string", "attributes": {"string_to_reverse": "abc", "#,
            r#""return_message": {"topic": "replies", "qos": 0, "retain": false}}}"#
        )
        .to_owned(),
        other => panic!("unsupported message kind: '{other}'"),
    }
}

fn client_config() -> Config {
    Config::new("localhost", "pc")
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a registry with a summing handler named {name}")]
fn given_summing_handler(world: &mut TestWorld, name: String) {
    let publisher = world.publisher();
    world
        .registry
        .register(name.trim_matches('"'), move |envelope: &Envelope| {
            let sum = attribute(envelope, "a") + attribute(envelope, "b");
            publisher.publish("replies", &sum.to_string(), 0, false);
        });
}

#[given("a registry with a counting handler named {name}")]
fn given_counting_handler(world: &mut TestWorld, name: String) {
    let invocations = Arc::clone(&world.invocations);
    world
        .registry
        .register(name.trim_matches('"'), move |_: &Envelope| {
            invocations.fetch_add(1, Ordering::SeqCst);
        });
}

#[given("the built-in handlers")]
fn given_builtin_handlers(world: &mut TestWorld) {
    world.use_builtin_handlers(client_config());
}

#[given("the built-in handlers with {name} disabled")]
fn given_builtin_handlers_with_disabled(world: &mut TestWorld, name: String) {
    let mut config = client_config();
    config.handlers.disabled = vec![name.trim_matches('"').to_owned()];
    world.use_builtin_handlers(config);
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("the {kind} message arrives")]
fn when_message_arrives(world: &mut TestWorld, kind: String) {
    let payload = payload_for(kind.trim_matches('"'));
    let forwarder = Forwarder::for_registry(JsonNormalizer, Arc::clone(&world.registry));
    forwarder.forward(&InboundMessage::new("pc", payload.as_bytes(), 0, false));
}

#[when("{name} is unregistered")]
fn when_unregistered(world: &mut TestWorld, name: String) {
    world.unregistered = Some(world.registry.unregister(name.trim_matches('"')));
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the publisher received {count} message(s)")]
fn then_published_count(world: &mut TestWorld, count: usize) {
    let published = world.published();
    assert_eq!(published.len(), count, "published: {published:?}");
}

#[then("the last published payload is {payload}")]
fn then_last_payload(world: &mut TestWorld, payload: String) {
    let published = world.published();
    let (topic, last) = published.last().expect("something was published");
    assert_eq!(topic, "replies");
    assert_eq!(last, payload.trim_matches('"'));
}

#[then("the handler ran {count} time(s)")]
fn then_handler_ran(world: &mut TestWorld, count: usize) {
    assert_eq!(world.invocations.load(Ordering::SeqCst), count);
}

#[then("the registry holds {count} command(s)")]
fn then_registry_size(world: &mut TestWorld, count: usize) {
    assert_eq!(world.registry.list().len(), count);
}

#[then("the registry lists {name}")]
fn then_registry_lists(world: &mut TestWorld, name: String) {
    let listed = world.registry.list();
    assert!(listed.contains(name.trim_matches('"')), "listed: {listed:?}");
}

#[then("the registry does not list {name}")]
fn then_registry_omits(world: &mut TestWorld, name: String) {
    let listed = world.registry.list();
    assert!(!listed.contains(name.trim_matches('"')), "listed: {listed:?}");
}

#[then("unregistering fails with not found")]
fn then_unregister_not_found(world: &mut TestWorld) {
    let outcome = world.unregistered.as_ref().expect("unregister was attempted");
    assert!(
        matches!(outcome, Err(DispatchError::NotFound { .. })),
        "expected not found, got {:?}",
        outcome.as_ref().map(Registrations::len)
    );
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(path = "tests/features/command_dispatch.feature")]
fn command_dispatch_behaviour(world: TestWorld) {
    let _ = world;
}
