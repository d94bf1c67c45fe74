//! SurrealDB implementation of [`ScenarioRepository`].
//!
//! Scenario access is modelled as a `has_access` edge from user to
//! scenario.

use chrono::{DateTime, Utc};
use gridlab_core::error::GridlabResult;
use gridlab_core::models::scenario::{CreateScenario, Scenario, UpdateScenario};
use gridlab_core::models::user::User;
use gridlab_core::repository::ScenarioRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::user::UserRow;
use super::{CountRow, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ScenarioRow {
    name: String,
    description: String,
    is_locked: bool,
    start_parameters: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ScenarioRow {
    fn into_scenario(self, id: Uuid) -> Scenario {
        Scenario {
            id,
            name: self.name,
            description: self.description,
            is_locked: self.is_locked,
            start_parameters: self.start_parameters,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// SurrealDB implementation of the Scenario repository.
#[derive(Clone)]
pub struct SurrealScenarioRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScenarioRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScenarioRepository for SurrealScenarioRepository<C> {
    async fn create(&self, input: CreateScenario) -> GridlabResult<Scenario> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let start_parameters = input
            .start_parameters
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('scenario', $id) SET \
                 name = $name, description = $description, \
                 is_locked = false, start_parameters = $start_parameters",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("start_parameters", start_parameters))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ScenarioRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("scenario", &id_str))?;

        Ok(row.into_scenario(id))
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<Scenario> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('scenario', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScenarioRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("scenario", &id_str))?;

        Ok(row.into_scenario(id))
    }

    async fn update(&self, id: Uuid, input: UpdateScenario) -> GridlabResult<Scenario> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.is_locked.is_some() {
            sets.push("is_locked = $is_locked");
        }
        if input.start_parameters.is_some() {
            sets.push("start_parameters = $start_parameters");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('scenario', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(is_locked) = input.is_locked {
            builder = builder.bind(("is_locked", is_locked));
        }
        if let Some(start_parameters) = input.start_parameters {
            builder = builder.bind(("start_parameters", start_parameters));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ScenarioRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("scenario", &id_str))?;

        Ok(row.into_scenario(id))
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        let id_str = id.to_string();

        let query = format!(
            "DELETE has_access WHERE out = scenario:`{id_str}`; \
             DELETE type::record('scenario', $id);"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn add_user(&self, scenario_id: Uuid, user_id: Uuid) -> GridlabResult<()> {
        let user_id_str = user_id.to_string();
        let scenario_id_str = scenario_id.to_string();

        // Verify both ends exist and whether the edge is already there.
        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) GROUP ALL; \
                 SELECT count() AS total FROM scenario \
                 WHERE id = type::record('scenario', $scenario_id) GROUP ALL; \
                 SELECT count() AS total FROM has_access \
                 WHERE in = type::record('user', $user_id) \
                 AND out = type::record('scenario', $scenario_id) GROUP ALL;",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("scenario_id", scenario_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let users: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if total(&users) == 0 {
            return Err(DbError::not_found("user", user_id_str).into());
        }

        let scenarios: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if total(&scenarios) == 0 {
            return Err(DbError::not_found("scenario", scenario_id_str).into());
        }

        let edges: Vec<CountRow> = check.take(2).map_err(DbError::from)?;
        if total(&edges) > 0 {
            return Ok(());
        }

        let query =
            format!("RELATE user:`{user_id_str}` -> has_access -> scenario:`{scenario_id_str}`;");

        self.db
            .query(query)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn remove_user(&self, scenario_id: Uuid, user_id: Uuid) -> GridlabResult<()> {
        self.db
            .query(
                "DELETE has_access WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('scenario', $scenario_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("scenario_id", scenario_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get_member(&self, scenario_id: Uuid, user_id: Uuid) -> GridlabResult<User> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM user \
                 WHERE id = type::record('user', $user_id) \
                 AND id IN (\
                     SELECT VALUE in FROM has_access \
                     WHERE out = type::record('scenario', $scenario_id)\
                 )",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("scenario_id", scenario_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: format!("member of scenario {scenario_id}"),
            id: user_id_str,
        })?;

        Ok(row.into_user(user_id)?)
    }
}
