//! Simulation result domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub description: String,
    /// Snapshot of the scenario's configurations at the time of the run.
    pub config_snapshots: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSimulationResult {
    pub scenario_id: Uuid,
    pub description: String,
    pub config_snapshots: Option<serde_json::Value>,
}
