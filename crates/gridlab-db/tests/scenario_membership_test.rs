//! Integration tests for scenario membership and resource loading.

use gridlab_core::models::dashboard::CreateDashboard;
use gridlab_core::models::resource::{ResourceInstance, ResourceKind};
use gridlab_core::models::scenario::{CreateScenario, UpdateScenario};
use gridlab_core::models::signal::{CreateSignal, SignalDirection};
use gridlab_core::models::user::{CreateUser, UserRole};
use gridlab_core::models::widget::CreateWidget;
use gridlab_core::repository::{
    DashboardRepository, ResourceLoader, ScenarioRepository, SignalRepository, UserRepository,
    WidgetRepository,
};
use gridlab_db::repository::{
    SurrealDashboardRepository, SurrealResourceLoader, SurrealScenarioRepository,
    SurrealSignalRepository, SurrealUserRepository, SurrealWidgetRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (Surreal<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gridlab_db::run_migrations(&db).await.unwrap();

    let user = SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            role: UserRole::User,
            active: true,
        })
        .await
        .unwrap();

    let scenario = SurrealScenarioRepository::new(db.clone())
        .create(CreateScenario {
            name: "Grid study".into(),
            description: "Two-area test system".into(),
            start_parameters: None,
        })
        .await
        .unwrap();

    (db, user.id, scenario.id)
}

#[tokio::test]
async fn member_lookup_follows_access_edges() {
    let (db, user_id, scenario_id) = setup().await;
    let repo = SurrealScenarioRepository::new(db);

    assert!(
        repo.get_member(scenario_id, user_id)
            .await
            .unwrap_err()
            .is_not_found()
    );

    repo.add_user(scenario_id, user_id).await.unwrap();
    let member = repo.get_member(scenario_id, user_id).await.unwrap();
    assert_eq!(member.username, "alice");
    assert_eq!(member.role, UserRole::User);

    repo.remove_user(scenario_id, user_id).await.unwrap();
    assert!(repo.get_member(scenario_id, user_id).await.is_err());
}

#[tokio::test]
async fn add_user_twice_keeps_single_edge() {
    let (db, user_id, scenario_id) = setup().await;
    let repo = SurrealScenarioRepository::new(db);

    repo.add_user(scenario_id, user_id).await.unwrap();
    repo.add_user(scenario_id, user_id).await.unwrap();
    assert!(repo.get_member(scenario_id, user_id).await.is_ok());
}

#[tokio::test]
async fn add_unknown_user_is_not_found() {
    let (db, _, scenario_id) = setup().await;
    let repo = SurrealScenarioRepository::new(db);

    let err = repo.add_user(scenario_id, Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn scenario_update_and_lock() {
    let (db, _, scenario_id) = setup().await;
    let repo = SurrealScenarioRepository::new(db);

    let updated = repo
        .update(
            scenario_id,
            UpdateScenario {
                is_locked: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.is_locked);
    assert_eq!(updated.name, "Grid study");
}

#[tokio::test]
async fn loader_resolves_owned_records() {
    let (db, user_id, scenario_id) = setup().await;
    let loader = SurrealResourceLoader::new(db.clone());

    let dashboard = SurrealDashboardRepository::new(db.clone())
        .create(CreateDashboard {
            scenario_id,
            name: "Overview".into(),
            grid: 15,
        })
        .await
        .unwrap();
    let widget = SurrealWidgetRepository::new(db.clone())
        .create(CreateWidget {
            dashboard_id: dashboard.id,
            name: "Voltage".into(),
            widget_type: "Plot".into(),
            custom_properties: None,
        })
        .await
        .unwrap();

    match loader.load(ResourceKind::Widget, widget.id).await.unwrap() {
        ResourceInstance::Widget(w) => assert_eq!(w.dashboard_id, dashboard.id),
        other => panic!("unexpected instance: {other:?}"),
    }

    let loaded = loader.load(ResourceKind::Dashboard, dashboard.id).await.unwrap();
    assert_eq!(loaded.owner_id(), Some(scenario_id));

    let loaded = loader.load(ResourceKind::User, user_id).await.unwrap();
    assert_eq!(loaded.id(), user_id);

    assert!(
        loader
            .load(ResourceKind::Scenario, Uuid::new_v4())
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn deleting_dashboard_removes_widgets() {
    let (db, _, scenario_id) = setup().await;
    let dashboards = SurrealDashboardRepository::new(db.clone());
    let widgets = SurrealWidgetRepository::new(db);

    let dashboard = dashboards
        .create(CreateDashboard {
            scenario_id,
            name: "Overview".into(),
            grid: 10,
        })
        .await
        .unwrap();
    let widget = widgets
        .create(CreateWidget {
            dashboard_id: dashboard.id,
            name: "Label".into(),
            widget_type: "Label".into(),
            custom_properties: None,
        })
        .await
        .unwrap();

    dashboards.delete(dashboard.id).await.unwrap();
    assert!(widgets.get_by_id(widget.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn signal_round_trips_direction_and_index() {
    let (db, _, _) = setup().await;
    let signals = SurrealSignalRepository::new(db);

    let signal = signals
        .create(CreateSignal {
            config_id: Uuid::new_v4(),
            name: "v_bus1".into(),
            unit: "V".into(),
            index: 3,
            direction: SignalDirection::Out,
            scaling_factor: None,
        })
        .await
        .unwrap();

    let fetched = signals.get_by_id(signal.id).await.unwrap();
    assert_eq!(fetched.index, 3);
    assert_eq!(fetched.direction, SignalDirection::Out);
    assert_eq!(fetched.scaling_factor, 1.0);
}
