//! SurrealDB repositories for the plain records hanging off scenarios:
//! signals, dashboards, widgets, files and results.
//!
//! These only need enough surface for the permission cascade to resolve
//! them and for callers to create and remove them.

use chrono::{DateTime, Utc};
use gridlab_core::error::GridlabResult;
use gridlab_core::models::dashboard::{CreateDashboard, Dashboard};
use gridlab_core::models::file::{CreateFile, File};
use gridlab_core::models::result::{CreateSimulationResult, SimulationResult};
use gridlab_core::models::signal::{CreateSignal, Signal, SignalDirection};
use gridlab_core::models::widget::{CreateWidget, Widget};
use gridlab_core::repository::{
    DashboardRepository, FileRepository, ResultRepository, SignalRepository, WidgetRepository,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// Run a `DELETE` batch and surface statement errors.
async fn run_delete<C: Connection>(db: &Surreal<C>, query: &str, id: Uuid) -> GridlabResult<()> {
    db.query(query)
        .bind(("id", id.to_string()))
        .await
        .map_err(DbError::from)?
        .check()
        .map_err(|e| DbError::Query(e.to_string()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct SignalRow {
    config_id: String,
    name: String,
    unit: String,
    signal_index: u32,
    direction: String,
    scaling_factor: f64,
}

impl SignalRow {
    fn into_signal(self, id: Uuid) -> Result<Signal, DbError> {
        let direction = match self.direction.as_str() {
            "In" => SignalDirection::In,
            "Out" => SignalDirection::Out,
            other => {
                return Err(DbError::Conversion(format!(
                    "unknown signal direction: {other}"
                )));
            }
        };
        Ok(Signal {
            id,
            config_id: parse_uuid("configuration", &self.config_id)?,
            name: self.name,
            unit: self.unit,
            index: self.signal_index,
            direction,
            scaling_factor: self.scaling_factor,
        })
    }
}

#[derive(Clone)]
pub struct SurrealSignalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSignalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SignalRepository for SurrealSignalRepository<C> {
    async fn create(&self, input: CreateSignal) -> GridlabResult<Signal> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let direction = match input.direction {
            SignalDirection::In => "In",
            SignalDirection::Out => "Out",
        };

        let result = self
            .db
            .query(
                "CREATE type::record('signal', $id) SET \
                 config_id = $config_id, name = $name, unit = $unit, \
                 signal_index = $signal_index, direction = $direction, \
                 scaling_factor = $scaling_factor",
            )
            .bind(("id", id_str.clone()))
            .bind(("config_id", input.config_id.to_string()))
            .bind(("name", input.name))
            .bind(("unit", input.unit))
            .bind(("signal_index", input.index))
            .bind(("direction", direction.to_string()))
            .bind(("scaling_factor", input.scaling_factor.unwrap_or(1.0)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SignalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("signal", &id_str))?;

        Ok(row.into_signal(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<Signal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('signal', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SignalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("signal", &id_str))?;

        Ok(row.into_signal(id)?)
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        run_delete(&self.db, "DELETE type::record('signal', $id)", id).await
    }
}

// ---------------------------------------------------------------------------
// Dashboards
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct DashboardRow {
    scenario_id: String,
    name: String,
    grid: u32,
}

impl DashboardRow {
    fn into_dashboard(self, id: Uuid) -> Result<Dashboard, DbError> {
        Ok(Dashboard {
            id,
            scenario_id: parse_uuid("scenario", &self.scenario_id)?,
            name: self.name,
            grid: self.grid,
        })
    }
}

#[derive(Clone)]
pub struct SurrealDashboardRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDashboardRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DashboardRepository for SurrealDashboardRepository<C> {
    async fn create(&self, input: CreateDashboard) -> GridlabResult<Dashboard> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('dashboard', $id) SET \
                 scenario_id = $scenario_id, name = $name, grid = $grid",
            )
            .bind(("id", id_str.clone()))
            .bind(("scenario_id", input.scenario_id.to_string()))
            .bind(("name", input.name))
            .bind(("grid", input.grid))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<DashboardRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("dashboard", &id_str))?;

        Ok(row.into_dashboard(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<Dashboard> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('dashboard', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DashboardRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("dashboard", &id_str))?;

        Ok(row.into_dashboard(id)?)
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        run_delete(
            &self.db,
            "DELETE widget WHERE dashboard_id = $id; \
             DELETE type::record('dashboard', $id);",
            id,
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct WidgetRow {
    dashboard_id: String,
    name: String,
    widget_type: String,
    custom_properties: serde_json::Value,
}

impl WidgetRow {
    fn into_widget(self, id: Uuid) -> Result<Widget, DbError> {
        Ok(Widget {
            id,
            dashboard_id: parse_uuid("dashboard", &self.dashboard_id)?,
            name: self.name,
            widget_type: self.widget_type,
            custom_properties: self.custom_properties,
        })
    }
}

#[derive(Clone)]
pub struct SurrealWidgetRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWidgetRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> WidgetRepository for SurrealWidgetRepository<C> {
    async fn create(&self, input: CreateWidget) -> GridlabResult<Widget> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let custom_properties = input
            .custom_properties
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('widget', $id) SET \
                 dashboard_id = $dashboard_id, name = $name, \
                 widget_type = $widget_type, \
                 custom_properties = $custom_properties",
            )
            .bind(("id", id_str.clone()))
            .bind(("dashboard_id", input.dashboard_id.to_string()))
            .bind(("name", input.name))
            .bind(("widget_type", input.widget_type))
            .bind(("custom_properties", custom_properties))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<WidgetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("widget", &id_str))?;

        Ok(row.into_widget(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<Widget> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('widget', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WidgetRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("widget", &id_str))?;

        Ok(row.into_widget(id)?)
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        run_delete(&self.db, "DELETE type::record('widget', $id)", id).await
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct FileRow {
    scenario_id: String,
    name: String,
    content_type: String,
    size: u64,
    updated_at: DateTime<Utc>,
}

impl FileRow {
    fn into_file(self, id: Uuid) -> Result<File, DbError> {
        Ok(File {
            id,
            scenario_id: parse_uuid("scenario", &self.scenario_id)?,
            name: self.name,
            content_type: self.content_type,
            size: self.size,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealFileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FileRepository for SurrealFileRepository<C> {
    async fn create(&self, input: CreateFile) -> GridlabResult<File> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('file', $id) SET \
                 scenario_id = $scenario_id, name = $name, \
                 content_type = $content_type, size = $size",
            )
            .bind(("id", id_str.clone()))
            .bind(("scenario_id", input.scenario_id.to_string()))
            .bind(("name", input.name))
            .bind(("content_type", input.content_type))
            .bind(("size", input.size))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<FileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("file", &id_str))?;

        Ok(row.into_file(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<File> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('file', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("file", &id_str))?;

        Ok(row.into_file(id)?)
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        run_delete(&self.db, "DELETE type::record('file', $id)", id).await
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct ResultRow {
    scenario_id: String,
    description: String,
    config_snapshots: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl ResultRow {
    fn into_result(self, id: Uuid) -> Result<SimulationResult, DbError> {
        Ok(SimulationResult {
            id,
            scenario_id: parse_uuid("scenario", &self.scenario_id)?,
            description: self.description,
            config_snapshots: self.config_snapshots,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealResultRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResultRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResultRepository for SurrealResultRepository<C> {
    async fn create(&self, input: CreateSimulationResult) -> GridlabResult<SimulationResult> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let config_snapshots = input
            .config_snapshots
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('simulation_result', $id) SET \
                 scenario_id = $scenario_id, description = $description, \
                 config_snapshots = $config_snapshots",
            )
            .bind(("id", id_str.clone()))
            .bind(("scenario_id", input.scenario_id.to_string()))
            .bind(("description", input.description))
            .bind(("config_snapshots", config_snapshots))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ResultRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("result", &id_str))?;

        Ok(row.into_result(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> GridlabResult<SimulationResult> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('simulation_result', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResultRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("result", &id_str))?;

        Ok(row.into_result(id)?)
    }

    async fn delete(&self, id: Uuid) -> GridlabResult<()> {
        run_delete(&self.db, "DELETE type::record('simulation_result', $id)", id).await
    }
}
