//! SurrealDB implementation of [`ConfigurationRepository`].

use chrono::{DateTime, Utc};
use gridlab_core::error::{GridlabError, GridlabResult};
use gridlab_core::models::configuration::{ComponentConfiguration, CreateConfiguration};
use gridlab_core::repository::ConfigurationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ConfigurationRow {
    scenario_id: String,
    ic_id: String,
    name: String,
    start_parameters: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ConfigurationRowWithId {
    record_id: String,
    scenario_id: String,
    ic_id: String,
    name: String,
    start_parameters: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfigurationRow {
    fn into_configuration(self, id: Uuid) -> Result<ComponentConfiguration, DbError> {
        Ok(ComponentConfiguration {
            id,
            scenario_id: parse_uuid("scenario", &self.scenario_id)?,
            ic_id: parse_uuid("component", &self.ic_id)?,
            name: self.name,
            start_parameters: self.start_parameters,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ConfigurationRowWithId {
    fn try_into_configuration(self) -> Result<ComponentConfiguration, DbError> {
        let id = parse_uuid("configuration", &self.record_id)?;
        ConfigurationRow {
            scenario_id: self.scenario_id,
            ic_id: self.ic_id,
            name: self.name,
            start_parameters: self.start_parameters,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_configuration(id)
    }
}

/// SurrealDB implementation of the component configuration repository.
#[derive(Clone)]
pub struct SurrealConfigurationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealConfigurationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// `NotFound` when the referenced component is missing, otherwise the
    /// statement error itself.
    async fn explain_failed_create(&self, ic_id: &str, reason: String) -> GridlabError {
        let exists = async {
            let mut check = self
                .db
                .query(
                    "SELECT count() AS total FROM component \
                     WHERE id = type::record('component', $ic_id) GROUP ALL",
                )
                .bind(("ic_id", ic_id.to_string()))
                .await?;
            let rows: Vec<CountRow> = check.take(0)?;
            Ok::<_, surrealdb::Error>(total(&rows) > 0)
        };

        match exists.await {
            Ok(false) => DbError::not_found("component", ic_id).into(),
            _ => DbError::Query(reason).into(),
        }
    }
}

impl<C: Connection> ConfigurationRepository for SurrealConfigurationRepository<C> {
    async fn create(&self, input: CreateConfiguration) -> GridlabResult<ComponentConfiguration> {
        let id = Uuid::new_v4();
        let ic_id_str = input.ic_id.to_string();

        let start_parameters = input
            .start_parameters
            .unwrap_or(serde_json::Value::Object(Default::default()));

        // The existence check shares a transaction with the insert, so a
        // concurrent component delete either sees this configuration or
        // makes the insert fail. The scenario check is left to the
        // caller's authorization.
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 IF count((SELECT VALUE id FROM component \
                     WHERE id = type::record('component', $ic_id))) = 0 { \
                     THROW 'referenced component does not exist'; \
                 }; \
                 CREATE type::record('component_configuration', $id) SET \
                     scenario_id = $scenario_id, ic_id = $ic_id, \
                     name = $name, start_parameters = $start_parameters; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("scenario_id", input.scenario_id.to_string()))
            .bind(("ic_id", ic_id_str.clone()))
            .bind(("name", input.name))
            .bind(("start_parameters", start_parameters))
            .await
            .map_err(DbError::from)?;

        if let Err(e) = result.check() {
            return Err(self.explain_failed_create(&ic_id_str, e.to_string()).await);
        }

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<ComponentConfiguration> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('component_configuration', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ConfigurationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("component_configuration", &id_str))?;

        Ok(row.into_configuration(id)?)
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        let id_str = id.to_string();

        // Signals belong to the configuration and go with it.
        self.db
            .query(
                "DELETE signal WHERE config_id = $id; \
                 DELETE type::record('component_configuration', $id);",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_by_scenario(
        &self,
        scenario_id: Uuid,
    ) -> GridlabResult<Vec<ComponentConfiguration>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM component_configuration \
                 WHERE scenario_id = $scenario_id \
                 ORDER BY created_at ASC",
            )
            .bind(("scenario_id", scenario_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ConfigurationRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_configuration())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}
