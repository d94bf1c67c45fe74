//! Integration tests for the component repository using in-memory SurrealDB.

use gridlab_core::models::component::{CreateComponent, STATE_GONE, UpdateComponent};
use gridlab_core::models::configuration::CreateConfiguration;
use gridlab_core::repository::{ComponentRepository, ConfigurationRepository, Pagination};
use gridlab_db::repository::{SurrealComponentRepository, SurrealConfigurationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gridlab_db::run_migrations(&db).await.unwrap();
    db
}

fn component(uuid: Option<Uuid>, name: &str) -> CreateComponent {
    CreateComponent {
        uuid,
        name: name.into(),
        category: "simulator".into(),
        component_type: "dpsim".into(),
        location: "lab 1".into(),
        description: String::new(),
        websocket_url: String::new(),
        api_url: "https://sim.example.com/api".into(),
        state: None,
        uptime: None,
        managed_externally: true,
        manager: None,
        status_update_raw: None,
        start_parameter_schema: None,
        create_parameter_schema: None,
    }
}

#[tokio::test]
async fn create_with_external_uuid_and_get() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);
    let uuid = Uuid::new_v4();

    let created = repo.create(component(Some(uuid), "Sim1")).await.unwrap();
    assert_eq!(created.uuid, uuid);
    assert_eq!(created.state, "unknown");
    assert_eq!(created.uptime, 0.0);
    assert!(created.managed_externally);

    let fetched = repo.get(uuid).await.unwrap();
    assert_eq!(fetched.name, "Sim1");
    assert_eq!(fetched.api_url, "https://sim.example.com/api");
}

#[tokio::test]
async fn create_generates_uuid_when_absent() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);

    let created = repo.create(component(None, "Generated")).await.unwrap();
    assert!(!created.uuid.is_nil());
    assert_eq!(repo.get(created.uuid).await.unwrap().name, "Generated");
}

#[tokio::test]
async fn create_rejects_blank_category() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);

    let mut input = component(None, "Broken");
    input.category = "  ".into();
    let err = repo.create(input).await.unwrap_err();
    assert!(matches!(
        err,
        gridlab_core::error::GridlabError::Validation { .. }
    ));
}

#[tokio::test]
async fn create_duplicate_uuid_fails() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);
    let uuid = Uuid::new_v4();

    repo.create(component(Some(uuid), "First")).await.unwrap();
    let err = repo.create(component(Some(uuid), "Second")).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);
    let uuid = Uuid::new_v4();
    let created = repo.create(component(Some(uuid), "Sim1")).await.unwrap();

    let manager = Uuid::new_v4();
    let updated = repo
        .update(
            uuid,
            UpdateComponent {
                state: Some("running".into()),
                uptime: Some(42.5),
                manager: Some(Some(manager)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.state, "running");
    assert_eq!(updated.uptime, 42.5);
    assert_eq!(updated.manager, Some(manager));
    assert_eq!(updated.name, "Sim1");
    assert_eq!(updated.location, "lab 1");
    assert!(updated.state_updated_at >= created.state_updated_at);
}

#[tokio::test]
async fn update_missing_component_is_not_found() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);

    let err = repo
        .update(
            Uuid::new_v4(),
            UpdateComponent {
                state: Some("running".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn get_missing_component_is_not_found() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);

    let err = repo.get(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_is_postponed_while_referenced() {
    let db = setup().await;
    let components = SurrealComponentRepository::new(db.clone());
    let configs = SurrealConfigurationRepository::new(db);
    let uuid = Uuid::new_v4();
    components.create(component(Some(uuid), "Sim1")).await.unwrap();

    let config = configs
        .create(CreateConfiguration {
            scenario_id: Uuid::new_v4(),
            ic_id: uuid,
            name: "cfg".into(),
            start_parameters: None,
        })
        .await
        .unwrap();
    assert_eq!(components.count_configurations(uuid).await.unwrap(), 1);

    let err = components.delete(uuid).await.unwrap_err();
    assert!(err.is_deletion_postponed());
    assert!(components.get(uuid).await.is_ok());

    configs.delete(config.id).await.unwrap();
    assert_eq!(components.count_configurations(uuid).await.unwrap(), 0);

    components.delete(uuid).await.unwrap();
    assert!(components.get(uuid).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_missing_component_is_not_found() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);

    let err = repo.delete(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn configuration_requires_existing_component() {
    let db = setup().await;
    let configs = SurrealConfigurationRepository::new(db);

    let err = configs
        .create(CreateConfiguration {
            scenario_id: Uuid::new_v4(),
            ic_id: Uuid::new_v4(),
            name: "orphan".into(),
            start_parameters: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn list_by_state_finds_gone_components() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);
    let gone = Uuid::new_v4();
    repo.create(component(Some(gone), "Old")).await.unwrap();
    repo.create(component(None, "Live")).await.unwrap();

    repo.update(
        gone,
        UpdateComponent {
            state: Some(STATE_GONE.into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let found = repo.list_by_state(STATE_GONE).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].uuid, gone);
    assert!(found[0].is_gone());

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn delete_if_gone_keeps_live_components() {
    let db = setup().await;
    let repo = SurrealComponentRepository::new(db);
    let uuid = Uuid::new_v4();
    repo.create(component(Some(uuid), "Live")).await.unwrap();

    assert!(!repo.delete_if_gone(uuid).await.unwrap());
    assert_eq!(repo.get(uuid).await.unwrap().state, "unknown");
}

#[tokio::test]
async fn delete_if_gone_waits_for_references() {
    let db = setup().await;
    let components = SurrealComponentRepository::new(db.clone());
    let configs = SurrealConfigurationRepository::new(db);
    let uuid = Uuid::new_v4();
    components.create(component(Some(uuid), "Old")).await.unwrap();
    components
        .update(
            uuid,
            UpdateComponent {
                state: Some(STATE_GONE.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let config = configs
        .create(CreateConfiguration {
            scenario_id: Uuid::new_v4(),
            ic_id: uuid,
            name: "cfg".into(),
            start_parameters: None,
        })
        .await
        .unwrap();

    assert!(!components.delete_if_gone(uuid).await.unwrap());
    assert!(components.get(uuid).await.is_ok());

    configs.delete(config.id).await.unwrap();
    assert!(components.delete_if_gone(uuid).await.unwrap());
    assert!(components.get(uuid).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn configuration_for_deleted_component_is_not_created() {
    let db = setup().await;
    let components = SurrealComponentRepository::new(db.clone());
    let configs = SurrealConfigurationRepository::new(db);
    let uuid = Uuid::new_v4();
    let scenario_id = Uuid::new_v4();
    components.create(component(Some(uuid), "Short lived")).await.unwrap();
    components.delete(uuid).await.unwrap();

    let err = configs
        .create(CreateConfiguration {
            scenario_id,
            ic_id: uuid,
            name: "late".into(),
            start_parameters: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(configs.list_by_scenario(scenario_id).await.unwrap().is_empty());
    assert_eq!(components.count_configurations(uuid).await.unwrap(), 0);
}

#[tokio::test]
async fn list_by_scenario_only_returns_that_scenario() {
    let db = setup().await;
    let components = SurrealComponentRepository::new(db.clone());
    let configs = SurrealConfigurationRepository::new(db);
    let uuid = Uuid::new_v4();
    components.create(component(Some(uuid), "Sim1")).await.unwrap();

    let scenario_id = Uuid::new_v4();
    let other_scenario = Uuid::new_v4();
    for (scenario, name) in [
        (scenario_id, "first"),
        (other_scenario, "elsewhere"),
        (scenario_id, "second"),
    ] {
        configs
            .create(CreateConfiguration {
                scenario_id: scenario,
                ic_id: uuid,
                name: name.into(),
                start_parameters: Some(serde_json::json!({ "steps": 10 })),
            })
            .await
            .unwrap();
    }

    let mut names: Vec<String> = configs
        .list_by_scenario(scenario_id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| {
            assert_eq!(c.scenario_id, scenario_id);
            assert_eq!(c.ic_id, uuid);
            assert_eq!(c.start_parameters["steps"], 10);
            c.name
        })
        .collect();
    names.sort();
    assert_eq!(names, ["first", "second"]);

    assert_eq!(configs.list_by_scenario(other_scenario).await.unwrap().len(), 1);
    assert!(configs.list_by_scenario(Uuid::new_v4()).await.unwrap().is_empty());
}
