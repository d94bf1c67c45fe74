//! The consuming loop over an in-memory bus.

use std::sync::Arc;

use gridlab_bus::{BusSession, Headers, InMemoryBus};
use gridlab_core::repository::{ComponentRepository, Pagination};
use gridlab_db::repository::SurrealComponentRepository;
use gridlab_reconcile::{ActionPublisher, ConsumerExit, Reconciler, run_consumer};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const EXCHANGE: &str = "infrastructure";
const QUEUE: &str = "status";

async fn setup() -> (
    Surreal<Db>,
    Arc<InMemoryBus>,
    Reconciler<SurrealComponentRepository<Db>, InMemoryBus>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gridlab_db::run_migrations(&db).await.unwrap();

    let bus = Arc::new(InMemoryBus::new());
    bus.bind(QUEUE, EXCHANGE);

    let reconciler = Reconciler::new(
        SurrealComponentRepository::new(db.clone()),
        ActionPublisher::new(Arc::clone(&bus), EXCHANGE),
    );
    (db, bus, reconciler)
}

async fn publish(bus: &InMemoryBus, body: Vec<u8>) {
    bus.publish(EXCHANGE, body, Headers::new()).await.unwrap();
}

fn status(uuid: Uuid, state: &str) -> Vec<u8> {
    json!({
        "properties": {"uuid": uuid.to_string(), "category": "gateway", "type": "villas-node"},
        "status": {"state": state}
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn bad_messages_do_not_stop_the_loop() {
    let (db, bus, reconciler) = setup().await;
    let subscription = bus.subscribe(QUEUE).await.unwrap();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    publish(&bus, status(first, "idle")).await;
    publish(&bus, b"garbage".to_vec()).await;
    publish(&bus, br#"{"properties": {"uuid": "nope"}}"#.to_vec()).await;
    publish(&bus, status(second, "running")).await;
    bus.disconnect();

    let exit = run_consumer(&reconciler, subscription, CancellationToken::new()).await;
    assert_eq!(exit, ConsumerExit::Disconnected);

    let components = SurrealComponentRepository::new(db);
    assert_eq!(components.list(Pagination::default()).await.unwrap().total, 2);
    assert_eq!(components.get(second).await.unwrap().state, "running");
}

#[tokio::test]
async fn same_component_last_arrival_wins() {
    let (db, bus, reconciler) = setup().await;
    let subscription = bus.subscribe(QUEUE).await.unwrap();
    let uuid = Uuid::new_v4();

    for state in ["starting", "running", "paused"] {
        publish(&bus, status(uuid, state)).await;
    }
    bus.disconnect();

    run_consumer(&reconciler, subscription, CancellationToken::new()).await;

    let component = SurrealComponentRepository::new(db).get(uuid).await.unwrap();
    assert_eq!(component.state, "paused");
}

#[tokio::test]
async fn own_pings_are_consumed_as_commands() {
    let (db, bus, reconciler) = setup().await;
    let mut subscription = bus.subscribe(QUEUE).await.unwrap();
    let uuid = Uuid::new_v4();

    publish(&bus, status(uuid, "idle")).await;
    let delivery = subscription.next().await.unwrap();
    reconciler.handle_message(&delivery.body).await.unwrap();

    // The ping sent after create lands on the same exchange.
    let ping = subscription.next().await.unwrap();
    assert_eq!(
        ping.headers.get("uuid").map(String::as_str),
        Some(uuid.to_string().as_str())
    );
    let outcome = reconciler.handle_message(&ping.body).await.unwrap();
    assert_eq!(outcome, gridlab_reconcile::Outcome::CommandIgnored);

    let components = SurrealComponentRepository::new(db);
    assert_eq!(components.list(Pagination::default()).await.unwrap().total, 1);
}

#[tokio::test]
async fn cancellation_stops_the_loop() {
    let (_db, bus, reconciler) = setup().await;
    let subscription = bus.subscribe(QUEUE).await.unwrap();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let exit = run_consumer(&reconciler, subscription, shutdown).await;
    assert_eq!(exit, ConsumerExit::Shutdown);
    assert!(bus.is_connected());
}

#[tokio::test]
async fn consumer_runs_as_a_task() {
    let (db, bus, reconciler) = setup().await;
    let subscription = bus.subscribe(QUEUE).await.unwrap();
    let shutdown = CancellationToken::new();
    let reconciler = Arc::new(reconciler);

    let task = {
        let reconciler = Arc::clone(&reconciler);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { run_consumer(&reconciler, subscription, shutdown).await })
    };

    let uuid = Uuid::new_v4();
    publish(&bus, status(uuid, "idle")).await;

    let components = SurrealComponentRepository::new(db);
    let mut attempts = 0;
    while components.get(uuid).await.is_err() {
        attempts += 1;
        assert!(attempts < 200, "component was never created");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    shutdown.cancel();
    assert_eq!(task.await.unwrap(), ConsumerExit::Shutdown);
}
