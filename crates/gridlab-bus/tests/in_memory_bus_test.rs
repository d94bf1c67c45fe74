//! Tests for the in-memory bus transport.

use gridlab_bus::{BusError, BusSession, Headers, InMemoryBus};

fn headers(uuid: &str) -> Headers {
    let mut headers = Headers::new();
    headers.insert("uuid".into(), uuid.into());
    headers
}

#[tokio::test]
async fn exchange_fans_out_to_every_bound_queue() {
    let bus = InMemoryBus::new();
    bus.bind("status", "infrastructure");
    bus.bind("audit", "infrastructure");

    let mut status = bus.subscribe("status").await.unwrap();
    let mut audit = bus.subscribe("audit").await.unwrap();

    bus.publish("infrastructure", b"hello".to_vec(), headers("abc"))
        .await
        .unwrap();

    let a = status.next().await.unwrap();
    let b = audit.next().await.unwrap();
    assert_eq!(a.body, b"hello");
    assert_eq!(a, b);
    assert_eq!(a.headers.get("uuid").map(String::as_str), Some("abc"));
}

#[tokio::test]
async fn messages_published_before_subscribe_are_buffered_in_order() {
    let bus = InMemoryBus::new();
    bus.bind("status", "infrastructure");

    for body in ["one", "two", "three"] {
        bus.publish("infrastructure", body.as_bytes().to_vec(), Headers::new())
            .await
            .unwrap();
    }

    let mut sub = bus.subscribe("status").await.unwrap();
    assert_eq!(sub.queue(), "status");
    for expected in ["one", "two", "three"] {
        assert_eq!(sub.next().await.unwrap().body, expected.as_bytes());
    }
}

#[tokio::test]
async fn publish_is_recorded() {
    let bus = InMemoryBus::new();
    bus.declare_exchange("actions");

    bus.publish("actions", b"{}".to_vec(), headers("x"))
        .await
        .unwrap();

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].exchange, "actions");
    assert_eq!(published[0].headers, headers("x"));
}

#[tokio::test]
async fn unknown_exchange_is_rejected() {
    let bus = InMemoryBus::new();
    let err = bus
        .publish("nowhere", Vec::new(), Headers::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::UnknownExchange(name) if name == "nowhere"));
    assert!(bus.published().is_empty());
}

#[tokio::test]
async fn queue_has_a_single_consumer() {
    let bus = InMemoryBus::new();
    bus.bind("status", "infrastructure");

    let _first = bus.subscribe("status").await.unwrap();
    let err = bus.subscribe("status").await.unwrap_err();
    assert!(matches!(err, BusError::Closed(_)));
}

#[tokio::test]
async fn disconnect_ends_subscriptions_and_rejects_publish() {
    let bus = InMemoryBus::new();
    bus.bind("status", "infrastructure");
    let mut sub = bus.subscribe("status").await.unwrap();

    bus.publish("infrastructure", b"last".to_vec(), Headers::new())
        .await
        .unwrap();
    bus.disconnect();

    assert!(!bus.is_connected());
    assert_eq!(sub.next().await.unwrap().body, b"last");
    assert!(sub.next().await.is_none());

    let err = bus
        .publish("infrastructure", Vec::new(), Headers::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::Disconnected));
    assert!(matches!(
        bus.subscribe("status").await.unwrap_err(),
        BusError::Disconnected
    ));
}

#[tokio::test]
async fn separate_buses_are_isolated() {
    let first = InMemoryBus::new();
    let second = InMemoryBus::new();
    first.bind("status", "infrastructure");
    second.bind("status", "infrastructure");

    first
        .publish("infrastructure", b"only-first".to_vec(), Headers::new())
        .await
        .unwrap();

    assert_eq!(first.published().len(), 1);
    assert!(second.published().is_empty());
}
