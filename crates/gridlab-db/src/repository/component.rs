//! SurrealDB implementation of [`ComponentRepository`].
//!
//! Components are keyed by their external UUID. Deletion is guarded by
//! the number of configurations referencing the component; the guard and
//! the delete run as a single statement.

use chrono::{DateTime, Utc};
use gridlab_core::error::{GridlabError, GridlabResult};
use gridlab_core::models::component::{
    CreateComponent, InfrastructureComponent, STATE_GONE, STATE_UNKNOWN, UpdateComponent,
};
use gridlab_core::repository::{ComponentRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ComponentRow {
    name: String,
    category: String,
    component_type: String,
    location: String,
    description: String,
    websocket_url: String,
    api_url: String,
    state: String,
    uptime: f64,
    managed_externally: bool,
    manager: Option<String>,
    status_update_raw: serde_json::Value,
    start_parameter_schema: serde_json::Value,
    create_parameter_schema: serde_json::Value,
    created_at: DateTime<Utc>,
    state_updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ComponentRowWithId {
    record_id: String,
    name: String,
    category: String,
    component_type: String,
    location: String,
    description: String,
    websocket_url: String,
    api_url: String,
    state: String,
    uptime: f64,
    managed_externally: bool,
    manager: Option<String>,
    status_update_raw: serde_json::Value,
    start_parameter_schema: serde_json::Value,
    create_parameter_schema: serde_json::Value,
    created_at: DateTime<Utc>,
    state_updated_at: DateTime<Utc>,
}

impl ComponentRow {
    fn into_component(self, uuid: Uuid) -> Result<InfrastructureComponent, DbError> {
        let manager = self
            .manager
            .as_deref()
            .map(|m| parse_uuid("manager", m))
            .transpose()?;
        Ok(InfrastructureComponent {
            uuid,
            name: self.name,
            category: self.category,
            component_type: self.component_type,
            location: self.location,
            description: self.description,
            websocket_url: self.websocket_url,
            api_url: self.api_url,
            state: self.state,
            uptime: self.uptime,
            managed_externally: self.managed_externally,
            manager,
            status_update_raw: self.status_update_raw,
            start_parameter_schema: self.start_parameter_schema,
            create_parameter_schema: self.create_parameter_schema,
            created_at: self.created_at,
            state_updated_at: self.state_updated_at,
        })
    }
}

impl ComponentRowWithId {
    fn try_into_component(self) -> Result<InfrastructureComponent, DbError> {
        let uuid = parse_uuid("component", &self.record_id)?;
        ComponentRow {
            name: self.name,
            category: self.category,
            component_type: self.component_type,
            location: self.location,
            description: self.description,
            websocket_url: self.websocket_url,
            api_url: self.api_url,
            state: self.state,
            uptime: self.uptime,
            managed_externally: self.managed_externally,
            manager: self.manager,
            status_update_raw: self.status_update_raw,
            start_parameter_schema: self.start_parameter_schema,
            create_parameter_schema: self.create_parameter_schema,
            created_at: self.created_at,
            state_updated_at: self.state_updated_at,
        }
        .into_component(uuid)
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

/// SurrealDB implementation of the infrastructure component repository.
#[derive(Clone)]
pub struct SurrealComponentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealComponentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ComponentRepository for SurrealComponentRepository<C> {
    async fn create(&self, input: CreateComponent) -> GridlabResult<InfrastructureComponent> {
        input.validate()?;

        let uuid = input.uuid.unwrap_or_else(Uuid::new_v4);
        let id_str = uuid.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('component', $id) SET \
                 name = $name, category = $category, \
                 component_type = $component_type, \
                 location = $location, description = $description, \
                 websocket_url = $websocket_url, api_url = $api_url, \
                 state = $state, uptime = $uptime, \
                 managed_externally = $managed_externally, \
                 manager = $manager, \
                 status_update_raw = $status_update_raw, \
                 start_parameter_schema = $start_parameter_schema, \
                 create_parameter_schema = $create_parameter_schema",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("category", input.category))
            .bind(("component_type", input.component_type))
            .bind(("location", input.location))
            .bind(("description", input.description))
            .bind(("websocket_url", input.websocket_url))
            .bind(("api_url", input.api_url))
            .bind((
                "state",
                input.state.unwrap_or_else(|| STATE_UNKNOWN.to_string()),
            ))
            .bind(("uptime", input.uptime.unwrap_or(0.0)))
            .bind(("managed_externally", input.managed_externally))
            .bind(("manager", input.manager.map(|m| m.to_string())))
            .bind((
                "status_update_raw",
                input.status_update_raw.unwrap_or_else(empty_object),
            ))
            .bind((
                "start_parameter_schema",
                input.start_parameter_schema.unwrap_or_else(empty_object),
            ))
            .bind((
                "create_parameter_schema",
                input.create_parameter_schema.unwrap_or_else(empty_object),
            ))
            .await
            .map_err(DbError::from)?;

        // A duplicate record key is the only way CREATE fails on this table
        // once validation has passed.
        let mut result = result.check().map_err(|_| GridlabError::AlreadyExists {
            entity: format!("component {id_str}"),
        })?;

        let rows: Vec<ComponentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("component", &id_str))?;

        Ok(row.into_component(uuid)?)
    }

    async fn get(&self, uuid: Uuid) -> GridlabResult<InfrastructureComponent> {
        let id_str = uuid.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('component', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ComponentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("component", &id_str))?;

        Ok(row.into_component(uuid)?)
    }

    async fn update(
        &self,
        uuid: Uuid,
        input: UpdateComponent,
    ) -> GridlabResult<InfrastructureComponent> {
        input.validate()?;

        let id_str = uuid.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.component_type.is_some() {
            sets.push("component_type = $component_type");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.websocket_url.is_some() {
            sets.push("websocket_url = $websocket_url");
        }
        if input.api_url.is_some() {
            sets.push("api_url = $api_url");
        }
        if input.state.is_some() {
            sets.push("state = $state");
        }
        if input.uptime.is_some() {
            sets.push("uptime = $uptime");
        }
        if input.manager.is_some() {
            sets.push("manager = $manager");
        }
        if input.status_update_raw.is_some() {
            sets.push("status_update_raw = $status_update_raw");
        }
        if input.start_parameter_schema.is_some() {
            sets.push("start_parameter_schema = $start_parameter_schema");
        }
        if input.create_parameter_schema.is_some() {
            sets.push("create_parameter_schema = $create_parameter_schema");
        }
        sets.push("state_updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('component', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(component_type) = input.component_type {
            builder = builder.bind(("component_type", component_type));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(websocket_url) = input.websocket_url {
            builder = builder.bind(("websocket_url", websocket_url));
        }
        if let Some(api_url) = input.api_url {
            builder = builder.bind(("api_url", api_url));
        }
        if let Some(state) = input.state {
            builder = builder.bind(("state", state));
        }
        if let Some(uptime) = input.uptime {
            builder = builder.bind(("uptime", uptime));
        }
        if let Some(manager) = input.manager {
            builder = builder.bind(("manager", manager.map(|m| m.to_string())));
        }
        if let Some(raw) = input.status_update_raw {
            builder = builder.bind(("status_update_raw", raw));
        }
        if let Some(schema) = input.start_parameter_schema {
            builder = builder.bind(("start_parameter_schema", schema));
        }
        if let Some(schema) = input.create_parameter_schema {
            builder = builder.bind(("create_parameter_schema", schema));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ComponentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("component", &id_str))?;

        Ok(row.into_component(uuid)?)
    }

    async fn delete(&self, uuid: Uuid) -> GridlabResult<()> {
        let id_str = uuid.to_string();

        let mut result = self
            .db
            .query(
                "DELETE type::record('component', $id) \
                 WHERE count((SELECT VALUE id FROM component_configuration \
                     WHERE ic_id = $id)) = 0 \
                 RETURN BEFORE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let deleted: Vec<ComponentRow> = result.take(0).map_err(DbError::from)?;
        if !deleted.is_empty() {
            return Ok(());
        }

        // Nothing was deleted: either the record is missing or it is still
        // referenced.
        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM component \
                 WHERE id = type::record('component', $id) GROUP ALL; \
                 SELECT count() AS total FROM component_configuration \
                 WHERE ic_id = $id GROUP ALL;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let existing: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&existing) == 0 {
            return Err(DbError::not_found("component", &id_str).into());
        }

        let references: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        Err(GridlabError::DeletionPostponed {
            entity: "component".into(),
            id: id_str,
            references: total(&references),
        })
    }

    async fn delete_if_gone(&self, uuid: Uuid) -> GridlabResult<bool> {
        let mut result = self
            .db
            .query(
                "DELETE type::record('component', $id) \
                 WHERE state = $gone \
                 AND count((SELECT VALUE id FROM component_configuration \
                     WHERE ic_id = $id)) = 0 \
                 RETURN BEFORE",
            )
            .bind(("id", uuid.to_string()))
            .bind(("gone", STATE_GONE))
            .await
            .map_err(DbError::from)?;

        let deleted: Vec<ComponentRow> = result.take(0).map_err(DbError::from)?;
        Ok(!deleted.is_empty())
    }

    async fn count_configurations(&self, uuid: Uuid) -> GridlabResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM component_configuration \
                 WHERE ic_id = $id GROUP ALL",
            )
            .bind(("id", uuid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total(&rows))
    }

    async fn list(
        &self,
        pagination: Pagination,
    ) -> GridlabResult<PaginatedResult<InfrastructureComponent>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM component GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM component \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ComponentRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_component())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(&count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_state(&self, state: &str) -> GridlabResult<Vec<InfrastructureComponent>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM component \
                 WHERE state = $state",
            )
            .bind(("state", state.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ComponentRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_component())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
